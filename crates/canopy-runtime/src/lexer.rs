//! Mode-filtered longest-match lexer.
//!
//! Every lexical token is one pattern of a shared anchored DFA. Lexing walks
//! the DFA byte by byte from the token start and keeps, among the patterns
//! valid in the current lex mode, the longest match. Ties go to the higher
//! lexical precedence, then to literals, then to the lower symbol id.
//!
//! When nothing valid matches, the lexer retries with every token so the
//! parser can report what it actually saw. If even that fails, it emits a
//! one-byte `ERROR` token, so lexing always makes progress.

use canopy_compiler::LexMode;
use canopy_core::{END_SYMBOL, ERROR_SYMBOL, LexModeId, SymbolId};
use regex_automata::dfa::{Automaton, dense};
use regex_automata::util::primitives::StateID;
use regex_automata::{Anchored, Input};

use crate::Language;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub symbol: SymbolId,
    pub start: usize,
    pub end: usize,
    /// One past the last byte the lexer looked at. End of input counts as a
    /// byte, so a token touching the end has `lookahead_end == len + 1`.
    pub lookahead_end: usize,
    pub lex_mode: LexModeId,
}

impl Token {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Hand-written tokenizer for a grammar's `externals`.
///
/// `scan` sees which external tokens are valid (indexed like `externals`),
/// consumes input through [`ScanInput`] and reports a token with
/// [`ScanInput::set_result`]. The scanner state must round-trip through
/// `serialize`/`deserialize`; incremental parsing compares it to decide
/// whether an old subtree can be reused.
pub trait ExternalScanner: Send {
    fn scan(&mut self, input: &mut ScanInput<'_>, valid: &[bool]) -> bool;
    fn serialize(&self) -> Vec<u8>;
    fn deserialize(&mut self, state: &[u8]);
}

pub struct ScanInput<'a> {
    source: &'a [u8],
    start: usize,
    position: usize,
    marked_end: Option<usize>,
    examined: usize,
    result: Option<u16>,
}

impl<'a> ScanInput<'a> {
    fn new(source: &'a [u8], start: usize) -> Self {
        Self {
            source,
            start,
            position: start,
            marked_end: None,
            examined: start,
            result: None,
        }
    }

    /// Byte at the current position, `None` at the end of input.
    pub fn lookahead(&mut self) -> Option<u8> {
        self.examined = self.examined.max(self.position + 1);
        self.source.get(self.position).copied()
    }

    pub fn advance(&mut self) {
        if self.position < self.source.len() {
            self.position += 1;
            self.examined = self.examined.max(self.position);
        }
    }

    /// End the token at the current position. Without a mark, the token
    /// ends wherever scanning stopped.
    pub fn mark_end(&mut self) {
        self.marked_end = Some(self.position);
    }

    pub fn set_result(&mut self, external_index: u16) {
        self.result = Some(external_index);
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn token_start(&self) -> usize {
        self.start
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }
}

pub struct Lexer<'a> {
    language: &'a Language,
    source: &'a [u8],
    scanner: Option<Box<dyn ExternalScanner>>,
}

impl<'a> Lexer<'a> {
    pub fn new(language: &'a Language, source: &'a [u8]) -> Self {
        Self {
            language,
            source,
            scanner: language.new_scanner(),
        }
    }

    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    /// Lex one token at `position` in `lex_mode`. `after_extra` rules out
    /// immediate tokens.
    pub fn next_token(&mut self, position: usize, lex_mode: LexModeId, after_extra: bool) -> Token {
        if let Some(token) = self.scan_external(position, lex_mode) {
            return token;
        }
        self.lex_internal(position, lex_mode, after_extra)
    }

    /// Same as [`Self::next_token`] without consulting the external scanner.
    /// Used to look ahead during recovery without disturbing scanner state.
    pub(crate) fn peek_token(&self, position: usize, lex_mode: LexModeId, after_extra: bool) -> Token {
        self.lex_internal(position, lex_mode, after_extra)
    }

    pub fn scanner_state(&self) -> Option<Vec<u8>> {
        self.scanner.as_ref().map(|s| s.serialize())
    }

    pub fn restore_scanner(&mut self, state: &[u8]) {
        if let Some(scanner) = self.scanner.as_mut() {
            scanner.deserialize(state);
        }
    }

    fn mode(&self, lex_mode: LexModeId) -> Option<&'a LexMode> {
        self.language.table().lex_modes.get(lex_mode as usize)
    }

    fn scan_external(&mut self, position: usize, lex_mode: LexModeId) -> Option<Token> {
        let mode = self.mode(lex_mode)?;
        if mode.externals.is_empty() {
            return None;
        }
        let scanner = self.scanner.as_mut()?;
        let table = self.language.table();

        let mut valid = vec![false; table.external_count as usize];
        for &index in &mode.externals {
            valid[index as usize] = true;
        }

        let snapshot = scanner.serialize();
        let mut input = ScanInput::new(self.source, position);
        let found = scanner.scan(&mut input, &valid);
        let end = input.marked_end.unwrap_or(input.position);
        let accepted = match input.result {
            Some(index) if found && valid.get(index as usize) == Some(&true) && end > position => {
                Some(index)
            }
            _ => None,
        };
        let Some(index) = accepted else {
            scanner.deserialize(&snapshot);
            return None;
        };

        Some(Token {
            symbol: table.external_base() + index,
            start: position,
            end,
            lookahead_end: input.examined.max(end),
            lex_mode,
        })
    }

    fn lex_internal(&self, position: usize, lex_mode: LexModeId, after_extra: bool) -> Token {
        let len = self.source.len();
        if position >= len {
            return Token {
                symbol: END_SYMBOL,
                start: len,
                end: len,
                lookahead_end: len + 1,
                lex_mode,
            };
        }

        let table = self.language.table();
        let Some(dfa) = self.language.dfa() else {
            return self.error_token(position, position + 1, lex_mode);
        };
        let allowed = |symbol: SymbolId, in_mode: bool| {
            let Some(def) = table.token(symbol) else {
                return false;
            };
            if def.immediate && after_extra {
                return false;
            }
            !in_mode
                || self
                    .mode(lex_mode)
                    .is_some_and(|mode| mode.tokens.contains(symbol))
        };

        let valid = self.longest_match(dfa, position, |s| allowed(s, true));
        if let Some((symbol, end)) = valid.best {
            return Token {
                symbol,
                start: position,
                end,
                lookahead_end: valid.examined,
                lex_mode,
            };
        }

        let any = self.longest_match(dfa, position, |s| allowed(s, false));
        let examined = valid.examined.max(any.examined);
        match any.best {
            Some((symbol, end)) => Token {
                symbol,
                start: position,
                end,
                lookahead_end: examined,
                lex_mode,
            },
            None => self.error_token(position, examined, lex_mode),
        }
    }

    fn error_token(&self, position: usize, examined: usize, lex_mode: LexModeId) -> Token {
        Token {
            symbol: ERROR_SYMBOL,
            start: position,
            end: position + 1,
            lookahead_end: examined.max(position + 1),
            lex_mode,
        }
    }

    fn longest_match(
        &self,
        dfa: &dense::DFA<Vec<u32>>,
        start: usize,
        accept: impl Fn(SymbolId) -> bool,
    ) -> MatchResult {
        let source = self.source;
        let mut result = MatchResult {
            best: None,
            examined: start + 1,
        };
        let input = Input::new(source).range(start..).anchored(Anchored::Yes);
        let Ok(mut state) = dfa.start_state_forward(&input) else {
            return result;
        };

        // Match states trail the input by one byte: reaching a match state
        // after byte `i` reports matches ending at `i`. Empty matches never
        // become tokens.
        for (i, &byte) in source[start..].iter().enumerate() {
            state = dfa.next_state(state, byte);
            let at = start + i;
            if dfa.is_match_state(state) && at > start {
                self.record_matches(dfa, state, at, &accept, &mut result.best);
            } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                result.examined = at + 1;
                return result;
            }
        }

        state = dfa.next_eoi_state(state);
        if dfa.is_match_state(state) {
            self.record_matches(dfa, state, source.len(), &accept, &mut result.best);
        }
        result.examined = source.len() + 1;
        result
    }

    fn record_matches(
        &self,
        dfa: &dense::DFA<Vec<u32>>,
        state: StateID,
        end: usize,
        accept: &impl Fn(SymbolId) -> bool,
        best: &mut Option<(SymbolId, usize)>,
    ) {
        for k in 0..dfa.match_len(state) {
            let symbol = dfa.match_pattern(state, k).as_usize() as SymbolId + 1;
            if !accept(symbol) {
                continue;
            }
            let better = match *best {
                None => true,
                Some((current, current_end)) => {
                    end > current_end || (end == current_end && self.wins_tie(symbol, current))
                }
            };
            if better {
                *best = Some((symbol, end));
            }
        }
    }

    /// Equal-length matches: higher precedence, then literal, then lower id.
    fn wins_tie(&self, candidate: SymbolId, current: SymbolId) -> bool {
        let table = self.language.table();
        let (Some(a), Some(b)) = (table.token(candidate), table.token(current)) else {
            return false;
        };
        (a.precedence, a.is_literal, std::cmp::Reverse(candidate))
            > (b.precedence, b.is_literal, std::cmp::Reverse(current))
    }
}

struct MatchResult {
    best: Option<(SymbolId, usize)>,
    examined: usize,
}
