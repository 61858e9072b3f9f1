//! Builder-pattern printer for a tree's syntax errors.

use std::fmt::Write;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use crate::tree::{SyntaxError, Tree};

pub struct ErrorPrinter<'t> {
    tree: &'t Tree,
    path: Option<&'t str>,
    colored: bool,
}

impl<'t> ErrorPrinter<'t> {
    pub fn new(tree: &'t Tree) -> Self {
        Self {
            tree,
            path: None,
            colored: false,
        }
    }

    pub fn path(mut self, path: &'t str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let errors = self.tree.errors();
        if errors.is_empty() {
            return Ok(());
        }
        let Ok(source) = std::str::from_utf8(self.tree.source()) else {
            return self.format_plain(w, &errors);
        };

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, error) in errors.iter().enumerate() {
            let message = error.message();
            let range = adjust_range(error.range.clone(), source.len());

            let mut snippet = Snippet::source(source).line_start(1).annotation(
                AnnotationKind::Primary.span(range).label(&message),
            );
            if let Some(p) = self.path {
                snippet = snippet.path(p);
            }

            let report = [Level::ERROR.primary_title(&message).element(snippet)];
            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{}", renderer.render(&report))?;
        }
        Ok(())
    }

    fn format_plain(&self, w: &mut impl Write, errors: &[SyntaxError]) -> std::fmt::Result {
        for (i, error) in errors.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{error}")?;
        }
        Ok(())
    }
}

/// Zero-width errors still need one column to point at.
fn adjust_range(range: Range<usize>, limit: usize) -> Range<usize> {
    if range.start == range.end {
        return range.start..(range.start + 1).min(limit);
    }
    range
}

impl Tree {
    pub fn error_printer(&self) -> ErrorPrinter<'_> {
        ErrorPrinter::new(self)
    }

    /// Plain rendering of every syntax error, empty when there are none.
    pub fn render_errors(&self) -> String {
        self.error_printer().render()
    }
}
