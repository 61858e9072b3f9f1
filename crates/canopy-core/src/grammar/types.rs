//! Grammar type definitions.

use serde::{Deserialize, Serialize};

/// Complete tree-sitter style grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    /// Grammar name (e.g., "convex").
    pub name: String,
    /// Production rules, preserving definition order. The first rule is the start rule.
    pub rules: Vec<(String, Rule)>,
    /// Tokens allowed anywhere (comments, whitespace).
    #[serde(default)]
    pub extras: Vec<Rule>,
    /// Precedence orderings, highest level first.
    #[serde(default)]
    pub precedences: Vec<Vec<PrecedenceEntry>>,
    /// Expected conflicts.
    #[serde(default)]
    pub conflicts: Vec<Vec<String>>,
    /// External scanner tokens.
    #[serde(default)]
    pub externals: Vec<Rule>,
    /// Rules substituted at their use sites.
    #[serde(default)]
    pub inline: Vec<String>,
    /// Supertype rules (hidden in the tree).
    #[serde(default)]
    pub supertypes: Vec<String>,
    /// Keyword identifier rule.
    #[serde(default)]
    pub word: Option<String>,
    /// Reserved word contexts.
    #[serde(default)]
    pub reserved: Vec<(String, Vec<Rule>)>,
    /// Parent grammar name (for inheritance).
    #[serde(default)]
    pub inherits: Option<String>,
}

/// Grammar rule variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// Epsilon (empty match).
    Blank,
    /// Literal token.
    String(String),
    /// Regex token.
    Pattern {
        value: String,
        #[serde(default)]
        flags: Option<String>,
    },
    /// Reference to another rule.
    Symbol(String),
    /// Sequence of rules (must match in order).
    Seq(Vec<Rule>),
    /// Alternation.
    Choice(Vec<Rule>),
    /// Zero or more repetitions.
    Repeat(Box<Rule>),
    /// One or more repetitions.
    Repeat1(Box<Rule>),
    /// Named field.
    Field { name: String, content: Box<Rule> },
    /// Rename node.
    Alias {
        content: Box<Rule>,
        value: String,
        named: bool,
    },
    /// Force tokenization.
    Token(Box<Rule>),
    /// Tokenization that forbids preceding extras.
    ImmediateToken(Box<Rule>),
    /// Precedence.
    Prec {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Left-associative precedence.
    PrecLeft {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Right-associative precedence.
    PrecRight {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Dynamic precedence.
    PrecDynamic { value: i32, content: Box<Rule> },
    /// Reserved word context.
    Reserved {
        context_name: String,
        content: Box<Rule>,
    },
}

/// Precedence value (numeric or named).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precedence {
    Integer(i32),
    Name(String),
}

impl From<i32> for Precedence {
    fn from(value: i32) -> Self {
        Precedence::Integer(value)
    }
}

impl From<&str> for Precedence {
    fn from(name: &str) -> Self {
        Precedence::Name(name.to_owned())
    }
}

/// Entry in a precedence ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrecedenceEntry {
    /// Named precedence level.
    Name(String),
    /// Symbol reference.
    Symbol(String),
}
