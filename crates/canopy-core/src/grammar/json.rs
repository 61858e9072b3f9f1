//! `grammar.json` decoding.
//!
//! The file format tags every rule object with a `type` field; the raw
//! mirror types below decode that shape and are then lowered into [`Rule`].

use indexmap::IndexMap;
use serde::Deserialize;

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};

/// Error while decoding a grammar.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("invalid grammar.json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid binary grammar: {0}")]
    Binary(#[from] postcard::Error),
}

impl Grammar {
    /// Parse a grammar from `grammar.json` text.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let raw: JsonGrammar = serde_json::from_str(json)?;
        Ok(raw.lower())
    }
}

#[derive(Debug, Deserialize)]
struct JsonGrammar {
    name: String,
    // IndexMap keeps the file order; the first rule is the start rule.
    rules: IndexMap<String, JsonRule>,
    #[serde(default)]
    extras: Vec<JsonRule>,
    #[serde(default)]
    precedences: Vec<Vec<JsonPrecedenceEntry>>,
    #[serde(default)]
    conflicts: Vec<Vec<String>>,
    #[serde(default)]
    externals: Vec<JsonRule>,
    #[serde(default)]
    inline: Vec<String>,
    #[serde(default)]
    supertypes: Vec<String>,
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    reserved: IndexMap<String, Vec<JsonRule>>,
    #[serde(default)]
    inherits: Option<String>,
}

impl JsonGrammar {
    fn lower(self) -> Grammar {
        let lower_all = |rules: Vec<JsonRule>| rules.into_iter().map(JsonRule::lower).collect();

        Grammar {
            name: self.name,
            rules: self
                .rules
                .into_iter()
                .map(|(name, rule)| (name, rule.lower()))
                .collect(),
            extras: lower_all(self.extras),
            precedences: self
                .precedences
                .into_iter()
                .map(|level| level.into_iter().map(JsonPrecedenceEntry::lower).collect())
                .collect(),
            conflicts: self.conflicts,
            externals: lower_all(self.externals),
            inline: self.inline,
            supertypes: self.supertypes,
            word: self.word,
            reserved: self
                .reserved
                .into_iter()
                .map(|(context, words)| (context, lower_all(words)))
                .collect(),
            inherits: self.inherits,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum JsonRule {
    Blank,
    String {
        value: String,
    },
    Pattern {
        value: String,
        #[serde(default)]
        flags: Option<String>,
    },
    Symbol {
        name: String,
    },
    Seq {
        members: Vec<JsonRule>,
    },
    Choice {
        members: Vec<JsonRule>,
    },
    Repeat {
        content: Box<JsonRule>,
    },
    Repeat1 {
        content: Box<JsonRule>,
    },
    Field {
        name: String,
        content: Box<JsonRule>,
    },
    Alias {
        content: Box<JsonRule>,
        value: String,
        named: bool,
    },
    Token {
        content: Box<JsonRule>,
    },
    ImmediateToken {
        content: Box<JsonRule>,
    },
    Prec {
        value: JsonPrecedence,
        content: Box<JsonRule>,
    },
    PrecLeft {
        value: JsonPrecedence,
        content: Box<JsonRule>,
    },
    PrecRight {
        value: JsonPrecedence,
        content: Box<JsonRule>,
    },
    PrecDynamic {
        value: i32,
        content: Box<JsonRule>,
    },
    Reserved {
        context_name: String,
        content: Box<JsonRule>,
    },
}

impl JsonRule {
    fn lower(self) -> Rule {
        let boxed = |content: Box<JsonRule>| Box::new(content.lower());
        let many = |members: Vec<JsonRule>| members.into_iter().map(JsonRule::lower).collect();

        match self {
            JsonRule::Blank => Rule::Blank,
            JsonRule::String { value } => Rule::String(value),
            JsonRule::Pattern { value, flags } => Rule::Pattern { value, flags },
            JsonRule::Symbol { name } => Rule::Symbol(name),
            JsonRule::Seq { members } => Rule::Seq(many(members)),
            JsonRule::Choice { members } => Rule::Choice(many(members)),
            JsonRule::Repeat { content } => Rule::Repeat(boxed(content)),
            JsonRule::Repeat1 { content } => Rule::Repeat1(boxed(content)),
            JsonRule::Field { name, content } => Rule::Field {
                name,
                content: boxed(content),
            },
            JsonRule::Alias {
                content,
                value,
                named,
            } => Rule::Alias {
                content: boxed(content),
                value,
                named,
            },
            JsonRule::Token { content } => Rule::Token(boxed(content)),
            JsonRule::ImmediateToken { content } => Rule::ImmediateToken(boxed(content)),
            JsonRule::Prec { value, content } => Rule::Prec {
                value: value.into(),
                content: boxed(content),
            },
            JsonRule::PrecLeft { value, content } => Rule::PrecLeft {
                value: value.into(),
                content: boxed(content),
            },
            JsonRule::PrecRight { value, content } => Rule::PrecRight {
                value: value.into(),
                content: boxed(content),
            },
            JsonRule::PrecDynamic { value, content } => Rule::PrecDynamic {
                value,
                content: boxed(content),
            },
            JsonRule::Reserved {
                context_name,
                content,
            } => Rule::Reserved {
                context_name,
                content: boxed(content),
            },
        }
    }
}

/// Precedence values are either integers or level names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonPrecedence {
    Integer(i32),
    Name(String),
}

impl From<JsonPrecedence> for Precedence {
    fn from(raw: JsonPrecedence) -> Self {
        match raw {
            JsonPrecedence::Integer(n) => Precedence::Integer(n),
            JsonPrecedence::Name(s) => Precedence::Name(s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum JsonPrecedenceEntry {
    String { value: String },
    Symbol { name: String },
}

impl JsonPrecedenceEntry {
    fn lower(self) -> PrecedenceEntry {
        match self {
            JsonPrecedenceEntry::String { value } => PrecedenceEntry::Name(value),
            JsonPrecedenceEntry::Symbol { name } => PrecedenceEntry::Symbol(name),
        }
    }
}
