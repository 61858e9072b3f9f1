//! Named precedence levels and their partial order.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use canopy_core::PrecedenceEntry;

use crate::error::{CompileError, Warning, Warnings};
use crate::flatten::SyntaxGrammar;
use crate::rules::Prec;

/// Transitive closure of the `precedences` lists. Each list is ordered
/// highest first; levels from different lists are unordered unless a chain
/// of lists connects them.
#[derive(Debug)]
pub(crate) struct PrecedenceOrder {
    levels: HashMap<String, usize>,
    above: Vec<Vec<bool>>,
}

impl PrecedenceOrder {
    pub fn new(grammar: &SyntaxGrammar, warnings: &mut Warnings) -> Result<Self, CompileError> {
        let mut levels = HashMap::new();
        let mut names = Vec::new();
        for ordering in &grammar.precedence_orderings {
            for entry in ordering {
                let name = entry_name(entry);
                if !levels.contains_key(name) {
                    levels.insert(name.to_owned(), names.len());
                    names.push(name.to_owned());
                }
            }
        }

        let n = names.len();
        let mut above = vec![vec![false; n]; n];
        for ordering in &grammar.precedence_orderings {
            for pair in ordering.windows(2) {
                let hi = levels[entry_name(&pair[0])];
                let lo = levels[entry_name(&pair[1])];
                above[hi][lo] = true;
            }
        }
        for k in 0..n {
            for i in 0..n {
                if !above[i][k] {
                    continue;
                }
                for j in 0..n {
                    if above[k][j] {
                        above[i][j] = true;
                    }
                }
            }
        }
        if let Some(i) = (0..n).find(|&i| above[i][i]) {
            return Err(CompileError::AmbiguousPrecedence(format!(
                "precedence `{}` is ordered above itself",
                names[i]
            )));
        }

        let mut used = HashSet::new();
        for variable in &grammar.variables {
            for step in variable.productions.iter().flat_map(|p| &p.steps) {
                if let Prec::Name(name) = &step.precedence {
                    if !levels.contains_key(name) {
                        return Err(CompileError::AmbiguousPrecedence(format!(
                            "precedence `{name}` in rule `{}` is not declared in `precedences`",
                            variable.name
                        )));
                    }
                    used.insert(name.as_str());
                }
            }
        }
        for name in &names {
            if !used.contains(name.as_str()) {
                warnings.push(Warning::UnusedPrecedence { name: name.clone() });
            }
        }

        Ok(Self { levels, above })
    }

    /// `None` means the two precedences are incomparable.
    pub fn compare(&self, a: &Prec, b: &Prec) -> Option<Ordering> {
        match (a, b) {
            (Prec::Name(a), Prec::Name(b)) => {
                if a == b {
                    return Some(Ordering::Equal);
                }
                let (a, b) = (*self.levels.get(a)?, *self.levels.get(b)?);
                if self.above[a][b] {
                    Some(Ordering::Greater)
                } else if self.above[b][a] {
                    Some(Ordering::Less)
                } else {
                    None
                }
            }
            (Prec::Name(_), _) | (_, Prec::Name(_)) => None,
            (a, b) => Some(integer(a).cmp(&integer(b))),
        }
    }
}

fn integer(prec: &Prec) -> i32 {
    match prec {
        Prec::Integer(n) => *n,
        _ => 0,
    }
}

fn entry_name(entry: &PrecedenceEntry) -> &str {
    match entry {
        PrecedenceEntry::Name(name) | PrecedenceEntry::Symbol(name) => name,
    }
}

/// A rule listed by name in `precedences` lends that level to its own
/// productions that carry no explicit precedence.
pub(crate) fn apply_symbol_levels(grammar: &mut SyntaxGrammar) {
    let symbols: HashSet<String> = grammar
        .precedence_orderings
        .iter()
        .flatten()
        .filter_map(|entry| match entry {
            PrecedenceEntry::Symbol(name) => Some(name.clone()),
            PrecedenceEntry::Name(_) => None,
        })
        .collect();
    if symbols.is_empty() {
        return;
    }

    for variable in &mut grammar.variables {
        if !symbols.contains(&variable.name) {
            continue;
        }
        for step in variable.productions.iter_mut().flat_map(|p| &mut p.steps) {
            if step.precedence.is_none() {
                step.precedence = Prec::Name(variable.name.clone());
            }
        }
    }
}
