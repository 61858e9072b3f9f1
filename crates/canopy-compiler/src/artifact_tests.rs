use crate::test_utils::{compile_ok, sum_grammar};
use crate::{ArtifactError, GrammarTable, HEADER_SIZE, MAGIC, VERSION};

fn artifact() -> (GrammarTable, Vec<u8>) {
    let table = compile_ok(&sum_grammar()).table;
    let bytes = table.to_artifact().unwrap();
    (table, bytes)
}

#[test]
fn header_layout() {
    let (_, bytes) = artifact();

    assert_eq!(&bytes[0..4], &MAGIC);
    assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), VERSION);
    let payload_len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    assert_eq!(payload_len as usize, bytes.len() - HEADER_SIZE);
    let checksum = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    assert_eq!(checksum, crc32fast::hash(&bytes[HEADER_SIZE..]));
}

#[test]
fn load_returns_the_same_table() {
    let (table, bytes) = artifact();
    assert_eq!(GrammarTable::from_artifact(&bytes).unwrap(), table);
}

#[test]
fn too_small() {
    let err = GrammarTable::from_artifact(&[0; 8]).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"file too small: 8 bytes (minimum 16)");
}

#[test]
fn wrong_magic() {
    let (_, mut bytes) = artifact();
    bytes[0] = b'X';
    let err = GrammarTable::from_artifact(&bytes).unwrap_err();
    assert!(matches!(err, ArtifactError::InvalidMagic));
}

#[test]
fn wrong_version() {
    let (_, mut bytes) = artifact();
    bytes[4] = 9;
    let err = GrammarTable::from_artifact(&bytes).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"unsupported version: 9 (expected 1)");
}

#[test]
fn truncated_payload() {
    let (_, mut bytes) = artifact();
    bytes.pop();
    let err = GrammarTable::from_artifact(&bytes).unwrap_err();
    assert!(matches!(err, ArtifactError::SizeMismatch { .. }));
}

#[test]
fn corrupted_payload() {
    let (_, mut bytes) = artifact();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    let err = GrammarTable::from_artifact(&bytes).unwrap_err();
    assert!(matches!(err, ArtifactError::ChecksumMismatch { .. }));
}
