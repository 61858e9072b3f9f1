use std::io::Write;

use canopy_compiler::{CompileError, compile};
use indoc::indoc;

use crate::test_utils::{assignment_grammar, language, parse, sum_grammar};
use crate::{Language, LoadError};

const SUM_JSON: &str = indoc! {r#"
    {
      "name": "sum",
      "rules": {
        "expr": {
          "type": "SEQ",
          "members": [
            { "type": "SYMBOL", "name": "number" },
            {
              "type": "REPEAT",
              "content": {
                "type": "SEQ",
                "members": [
                  { "type": "STRING", "value": "+" },
                  { "type": "SYMBOL", "name": "number" }
                ]
              }
            }
          ]
        },
        "number": { "type": "PATTERN", "value": "\\d+" }
      }
    }
"#};

#[test]
fn load_from_json() {
    let language = Language::from_grammar_json(SUM_JSON).unwrap();

    assert_eq!(language.name(), "sum");
    assert_eq!(language.symbol_count(), 5);
    assert_eq!(language.symbol_name(3), "expr");
    assert_eq!(language.id_for_node_kind("number", true), Some(1));
    assert_eq!(language.id_for_node_kind("+", false), Some(2));
    assert_eq!(language.id_for_node_kind("+", true), None);
}

#[test]
fn json_and_builder_agree() {
    let from_json = Language::from_grammar_json(SUM_JSON).unwrap();
    let from_builder = language(&sum_grammar());
    assert_eq!(from_json.table(), from_builder.table());
}

#[test]
fn compile_errors_surface() {
    let json = indoc! {r#"
        {
          "name": "broken",
          "rules": { "start": { "type": "SYMBOL", "name": "nowhere" } }
        }
    "#};
    let err = Language::from_grammar_json(json).unwrap_err();

    assert!(matches!(
        err,
        LoadError::Compile(CompileError::UndefinedSymbol { .. })
    ));
    insta::assert_snapshot!(err.to_string(), @"undefined symbol `nowhere` referenced from rule `start`");
}

#[test]
fn load_artifact_bytes() {
    let table = compile(&sum_grammar()).unwrap().table;
    let bytes = table.to_artifact().unwrap();
    let language = Language::from_artifact(&bytes).unwrap();

    assert_eq!(language.table(), &table);
    let tree = parse(&language, "1+2");
    assert_eq!(tree.to_sexp(), "(expr (number) (number))");
}

#[test]
fn load_artifact_file() {
    let bytes = compile(&sum_grammar()).unwrap().table.to_artifact().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();

    let language = Language::load_file(file.path()).unwrap();
    assert_eq!(language.name(), "sum");
}

#[test]
fn corrupted_artifact() {
    let mut bytes = compile(&sum_grammar()).unwrap().table.to_artifact().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    let err = Language::from_artifact(&bytes).unwrap_err();
    assert!(matches!(err, LoadError::Artifact(_)));
    assert!(err.to_string().starts_with("invalid grammar artifact: "));
}

#[test]
fn missing_artifact_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Language::load_file(dir.path().join("absent.canopy")).unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}

#[test]
fn field_names() {
    let language = language(&assignment_grammar());

    let left = language.field_id_for_name("left").unwrap();
    assert_eq!(language.field_name(left), "left");
    assert!(language.field_id_for_name("middle").is_none());
}

#[test]
fn clones_share_the_language() {
    let a = language(&sum_grammar());
    let b = a.clone();
    let c = language(&sum_grammar());

    assert!(Language::ptr_eq(&a, &b));
    assert!(!Language::ptr_eq(&a, &c));
}

#[test]
fn attaching_a_scanner_keeps_the_table() {
    let plain = language(&crate::test_utils::block_grammar());
    let table = plain.table().clone();
    let scanning =
        plain.with_external_scanner(|| Box::new(crate::test_utils::BlockScanner::default()));

    assert_eq!(scanning.table(), &table);
    assert!(format!("{scanning:?}").contains("external_scanner: true"));
}
