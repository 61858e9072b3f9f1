//! Table-driven LR parser with error recovery and subtree reuse.

mod driver;
mod invariants;
mod recovery;
mod reuse;
mod stack;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::edit::InputEdit;
use crate::tree::green::GreenNode;
use crate::{Error, Language, Tree};
use driver::ParseRun;
use reuse::ReuseCursor;

/// How many stack entries recovery may pop looking for a state in which
/// the lookahead is valid.
pub const DEFAULT_RECOVERY_DEPTH: usize = 256;

/// Shared flag a caller sets to stop a running parse. The parser polls it
/// once per token.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Parser {
    language: Language,
    cancellation: Option<CancellationFlag>,
    recovery_depth: usize,
}

impl Parser {
    pub fn new(language: &Language) -> Self {
        Self {
            language: language.clone(),
            cancellation: None,
            recovery_depth: DEFAULT_RECOVERY_DEPTH,
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn set_cancellation_flag(&mut self, flag: Option<CancellationFlag>) {
        self.cancellation = flag;
    }

    pub fn set_recovery_depth(&mut self, depth: usize) {
        self.recovery_depth = depth;
    }

    /// Parse `source` from scratch. Syntax errors end up in the tree; the
    /// only failure is cancellation.
    pub fn parse(&self, source: impl Into<Vec<u8>>) -> Result<Tree, Error> {
        let source = source.into();
        let root = self.run(&source, None)?;
        Ok(Tree::new(root, source, self.language.clone()))
    }

    /// Parse `source`, the text of `old` after `edit`, reusing the parts of
    /// `old` the edit did not touch. The result equals a fresh parse.
    pub fn reparse(
        &self,
        old: &Tree,
        edit: &InputEdit,
        source: impl Into<Vec<u8>>,
    ) -> Result<Tree, Error> {
        let source = source.into();
        edit.validate(old.source().len(), source.len())?;
        if old.source() == source.as_slice() {
            return Ok(old.clone());
        }

        let reuse = Language::ptr_eq(old.language(), &self.language)
            .then(|| ReuseCursor::new(old.green(), *edit));
        let root = self.run(&source, reuse)?;
        Ok(Tree::new(root, source, self.language.clone()))
    }

    fn run(
        &self,
        source: &[u8],
        reuse: Option<ReuseCursor<'_>>,
    ) -> Result<Arc<GreenNode>, Error> {
        ParseRun::new(
            &self.language,
            source,
            reuse,
            self.cancellation.as_ref(),
            self.recovery_depth,
        )
        .run()
    }
}
