//! Immutable subtrees with relative lengths.
//!
//! A green node knows its length but not its position, so an untouched
//! subtree can be shared between an old and a new tree no matter how far an
//! edit shifted it.

use std::sync::Arc;

use canopy_core::{ERROR_SYMBOL, ProductionId, StateId, SymbolId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct Flags(u8);

impl Flags {
    pub const MISSING: Flags = Flags(1);
    pub const EXTRA: Flags = Flags(1 << 1);
    pub const ERROR: Flags = Flags(1 << 2);
    pub const HAS_ERROR: Flags = Flags(1 << 3);

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }
}

/// Symbol and length of the first token under a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FirstToken {
    pub symbol: SymbolId,
    pub len: usize,
}

pub(crate) struct GreenNode {
    pub symbol: SymbolId,
    pub len: usize,
    pub flags: Flags,
    /// Production that built this node; `None` for leaves and error nodes.
    pub production: Option<ProductionId>,
    /// Parse state under the node when its first token was shifted.
    pub parse_state: StateId,
    /// Bytes past the end that were examined while building the node.
    pub lookahead: usize,
    pub first_token: Option<FirstToken>,
    /// External scanner state before the first token and after the last.
    pub scanner_before: Option<Arc<[u8]>>,
    pub scanner_after: Option<Arc<[u8]>>,
    /// Reduced on an inserted `MISSING` lookahead, so its shape depends on
    /// recovery context and it must not be reused.
    pub fragile: bool,
    pub children: Vec<Arc<GreenNode>>,
}

impl GreenNode {
    pub fn leaf(symbol: SymbolId, len: usize, flags: Flags, parse_state: StateId) -> Self {
        Self {
            symbol,
            len,
            flags,
            production: None,
            parse_state,
            lookahead: 0,
            first_token: Some(FirstToken { symbol, len }),
            scanner_before: None,
            scanner_after: None,
            fragile: false,
            children: Vec::new(),
        }
    }

    /// Branch node over `children`. Length, error flag and the first/last
    /// token bookkeeping come from the children.
    pub fn branch(
        symbol: SymbolId,
        production: Option<ProductionId>,
        mut flags: Flags,
        parse_state: StateId,
        children: Vec<Arc<GreenNode>>,
    ) -> Self {
        let len = children.iter().map(|c| c.len).sum();
        if children.iter().any(|c| c.is_erroneous()) {
            flags = flags.with(Flags::HAS_ERROR);
        }
        let first = children.iter().find(|c| !c.is_extra());
        let last = children.iter().rev().find(|c| !c.is_extra());
        Self {
            symbol,
            len,
            flags,
            production,
            parse_state,
            lookahead: 0,
            first_token: first.and_then(|c| c.first_token),
            scanner_before: first.and_then(|c| c.scanner_before.clone()),
            scanner_after: last.and_then(|c| c.scanner_after.clone()),
            fragile: false,
            children,
        }
    }

    pub fn error(children: Vec<Arc<GreenNode>>, parse_state: StateId) -> Self {
        Self::branch(
            ERROR_SYMBOL,
            None,
            Flags::ERROR.with(Flags::EXTRA),
            parse_state,
            children,
        )
    }

    pub fn is_extra(&self) -> bool {
        self.flags.contains(Flags::EXTRA)
    }

    pub fn is_missing(&self) -> bool {
        self.flags.contains(Flags::MISSING)
    }

    pub fn is_error(&self) -> bool {
        self.symbol == ERROR_SYMBOL || self.flags.contains(Flags::ERROR)
    }

    pub fn has_error(&self) -> bool {
        self.flags.contains(Flags::HAS_ERROR)
    }

    /// The node is an error, is missing, or contains one.
    pub fn is_erroneous(&self) -> bool {
        self.is_error() || self.is_missing() || self.has_error()
    }

    /// Leaves are tokens: lexed, missing, or unrecognized bytes.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.production.is_none()
    }
}

// Deep trees would overflow the stack with the derived recursive drop.
impl Drop for GreenNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(child) = stack.pop() {
            if let Ok(mut node) = Arc::try_unwrap(child) {
                stack.append(&mut node.children);
            }
        }
    }
}

/// Structural equality: symbol, length, flags, production and children.
/// Parser bookkeeping is not compared.
impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if std::ptr::eq(a, b) {
                continue;
            }
            if a.symbol != b.symbol
                || a.len != b.len
                || a.flags != b.flags
                || a.production != b.production
                || a.children.len() != b.children.len()
            {
                return false;
            }
            stack.extend(a.children.iter().map(|c| &**c).zip(b.children.iter().map(|c| &**c)));
        }
        true
    }
}

impl Eq for GreenNode {}

impl std::fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GreenNode")
            .field("symbol", &self.symbol)
            .field("len", &self.len)
            .field("flags", &self.flags)
            .field("children", &self.children.len())
            .finish()
    }
}
