//! Lower lexical rules into regex patterns plus tie-break metadata.

use regex_syntax::hir::Hir;

use crate::error::CompileError;
use crate::rules::{Prec, Rule, Variable};
use crate::table::TokenDef;

pub(crate) fn build_tokens(variables: &[Variable]) -> Result<Vec<TokenDef>, CompileError> {
    variables.iter().map(build_token).collect()
}

fn build_token(variable: &Variable) -> Result<TokenDef, CompileError> {
    let mut pattern = String::new();
    write_regex(&variable.rule, &mut pattern);

    let hir = parse_pattern(&pattern).map_err(|message| CompileError::InvalidPattern {
        token: variable.name.clone(),
        message,
    })?;
    if hir.properties().minimum_len() == Some(0) {
        return Err(CompileError::EmptyToken {
            token: variable.name.clone(),
        });
    }

    Ok(TokenDef {
        pattern,
        precedence: lexical_precedence(&variable.rule),
        is_literal: is_literal(&variable.rule),
        immediate: is_immediate(&variable.rule),
    })
}

fn parse_pattern(pattern: &str) -> Result<Hir, String> {
    regex_syntax::Parser::new()
        .parse(pattern)
        .map_err(|err| err.to_string())
}

fn write_regex(rule: &Rule, out: &mut String) {
    match rule {
        Rule::Blank | Rule::Symbol(_) => {}
        Rule::String(value) => out.push_str(&regex_syntax::escape(value)),
        Rule::Pattern { value, flags } => {
            let flags: String = flags
                .iter()
                .flat_map(|flags| flags.chars())
                .filter(|flag| matches!(flag, 'i' | 's' | 'm'))
                .collect();
            out.push_str("(?");
            out.push_str(&flags);
            out.push(':');
            out.push_str(value);
            out.push(')');
        }
        Rule::Seq(members) => {
            for member in members {
                out.push_str("(?:");
                write_regex(member, out);
                out.push(')');
            }
        }
        Rule::Choice(members) => {
            out.push_str("(?:");
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                write_regex(member, out);
            }
            out.push(')');
        }
        Rule::Repeat(content) => {
            out.push_str("(?:");
            write_regex(content, out);
            out.push_str(")+");
        }
        Rule::Metadata { rule, .. } => write_regex(rule, out),
    }
}

/// The outermost integer precedence wins.
fn lexical_precedence(rule: &Rule) -> i32 {
    match rule {
        Rule::Metadata { params, rule } => match params.precedence {
            Prec::Integer(n) => n,
            _ => lexical_precedence(rule),
        },
        _ => 0,
    }
}

fn is_literal(rule: &Rule) -> bool {
    match rule {
        Rule::String(_) | Rule::Blank => true,
        Rule::Seq(members) | Rule::Choice(members) => members.iter().all(is_literal),
        Rule::Metadata { rule, .. } => is_literal(rule),
        Rule::Pattern { .. } | Rule::Repeat(_) | Rule::Symbol(_) => false,
    }
}

fn is_immediate(rule: &Rule) -> bool {
    match rule {
        Rule::Metadata { params, rule } => params.is_immediate || is_immediate(rule),
        _ => false,
    }
}
