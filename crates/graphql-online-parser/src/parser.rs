use crate::grammar::{Matcher, Rule, RuleKind, Update};
use crate::lexer::{lex, TokenKind};
use crate::state::State;
use crate::stream::{is_ignored, CharacterStream};
use crate::style::Style;
use std::ops::ControlFlow;

/// Resumable, error-tolerant GraphQL parser.
///
/// The parser is fed one line at a time through a [`CharacterStream`] and
/// advances a [`State`] token by token. Tokens that fit nowhere in the grammar
/// are styled [`Style::InvalidChar`] and parsing carries on.
#[derive(Debug, Clone, Copy)]
pub struct OnlineParser {
    tab_size: usize,
}

impl Default for OnlineParser {
    fn default() -> Self {
        Self { tab_size: 2 }
    }
}

impl OnlineParser {
    #[must_use]
    pub const fn with_tab_size(tab_size: usize) -> Self {
        Self {
            tab_size: if tab_size == 0 { 1 } else { tab_size },
        }
    }

    #[must_use]
    pub fn start_state(&self) -> State {
        let mut state = State::default();
        state.push_rule(RuleKind::Document);
        state
    }

    /// Consume one token from `stream`, returning its style
    pub fn token(&self, stream: &mut CharacterStream, state: &mut State) -> Style {
        if state.in_block_string {
            match last_block_quote_end(stream.rest()) {
                Some(len) => {
                    stream.consume(len);
                    state.in_block_string = false;
                }
                None => stream.consume(stream.rest().len()),
            }
            return Style::String;
        }

        if matches!(state.rule(), Some(Rule::Sequence(steps)) if steps.is_empty()) {
            state.pop_rule();
        } else if state.needs_advance {
            state.needs_advance = false;
            advance_rule(state, true);
        }

        if stream.sol() {
            state.indent_level = Some(stream.indentation() / self.tab_size);
        }

        if stream.eat_while(is_ignored) {
            return Style::Whitespace;
        }

        let Some(token) = lex(stream) else {
            let len = stream
                .rest()
                .iter()
                .take_while(|ch| !ch.is_whitespace())
                .count();
            stream.consume(len.max(1));
            state.push_rule(RuleKind::Invalid);
            return Style::InvalidChar;
        };

        if token.kind == TokenKind::Comment {
            state.push_rule(RuleKind::Comment);
            return Style::Comment;
        }

        let backup = state.backup();

        if token.kind == TokenKind::Punctuation {
            match token.value.as_str() {
                "{" | "(" | "[" => {
                    if let Some(level) = state.indent_level {
                        state.levels.push(level + 1);
                    }
                }
                "}" | ")" | "]" => {
                    state.levels.pop();
                    if let (Some(level), Some(last)) = (state.indent_level, state.levels.last()) {
                        if level > 0 && *last < level {
                            state.indent_level = Some(*last);
                        }
                    }
                }
                _ => {}
            }
        }

        while let Some(rule) = state.rule() {
            let current = state.current();
            let expected = match rule {
                Rule::Fork(fork) if current.step == 0 && !current.needs_separator => {
                    fork(&token, stream).map(Matcher::Rule)
                }
                Rule::Fork(_) => None,
                Rule::Sequence(steps) => steps.get(current.step).and_then(|step| {
                    if current.needs_separator {
                        step.separator.map(|separator| Matcher::Terminal(separator.terminal))
                    } else {
                        Some(step.matcher)
                    }
                }),
            };

            match expected {
                Some(Matcher::Rule(kind)) => {
                    state.push_rule(kind);
                    continue;
                }
                Some(Matcher::Terminal(terminal)) if terminal.token.matches(&token) => {
                    match terminal.update {
                        Update::None => {}
                        Update::Name => state.current.name = Some(token.value.clone()),
                        Update::NamedType => state.set_named_type(&token.value),
                        Update::BlockString => {
                            if let Some(body) = token.value.strip_prefix("\"\"\"") {
                                state.in_block_string = !body.ends_with("\"\"\"");
                            }
                        }
                    }

                    if token.kind == TokenKind::Punctuation {
                        advance_rule(state, true);
                    } else {
                        state.needs_advance = true;
                    }
                    return terminal.style;
                }
                _ => {}
            }

            unsuccessful(state);
        }

        state.restore(backup);
        state.push_rule(RuleKind::Invalid);
        Style::InvalidChar
    }

    /// Lazily tokenize `text`, continuing from `state` when given
    #[must_use]
    pub fn parse<'a>(&self, text: &'a str, state: Option<State>) -> Tokens<'a> {
        Tokens {
            parser: *self,
            lines: text.split('\n').enumerate(),
            line: 0,
            stream: None,
            state: state.unwrap_or_else(|| self.start_state()),
        }
    }
}

/// Offset just past the last `"""` in `chars`
fn last_block_quote_end(chars: &[char]) -> Option<usize> {
    chars
        .windows(3)
        .rposition(|w| w == ['"', '"', '"'])
        .map(|idx| idx + 3)
}

fn list_step_separator(state: &State) -> Option<Option<crate::grammar::Separator>> {
    state
        .current()
        .current_step()
        .filter(|step| step.list)
        .map(|step| step.separator)
}

fn advance_rule(state: &mut State, successful: bool) {
    if let Some(separator) = list_step_separator(state) {
        if let Some(separator) = separator {
            state.current.needs_separator = !state.current.needs_separator;
            if !state.current.needs_separator && separator.optional {
                return;
            }
        }
        if successful {
            return;
        }
    }

    state.current.needs_separator = false;
    state.current.step += 1;

    loop {
        match state.rule() {
            None => break,
            Some(Rule::Sequence(steps)) if state.current.step < steps.len() => break,
            Some(_) => {}
        }
        if !state.pop_rule() {
            break;
        }
        if state.rule().is_some() {
            match list_step_separator(state) {
                Some(separator) => {
                    if separator.is_some() {
                        state.current.needs_separator = !state.current.needs_separator;
                    }
                }
                None => {
                    state.current.needs_separator = false;
                    state.current.step += 1;
                }
            }
        }
    }
}

/// Unwind to the nearest frame that may skip its current step, then skip it
fn unsuccessful(state: &mut State) {
    loop {
        let skippable = state
            .current()
            .current_step()
            .is_some_and(|step| step.is_skippable());
        if state.rule().is_none() || skippable || !state.pop_rule() {
            break;
        }
    }
    if state.rule().is_some() {
        advance_rule(state, false);
    }
}

/// Indentation for a line whose text after the cursor is `text_after`
#[must_use]
pub fn indent(state: &State, text_after: &str, indent_unit: usize) -> usize {
    let level = match state.levels.last() {
        Some(level) => {
            let closes = text_after
                .trim_start()
                .starts_with(['}', ')', ']']);
            level.saturating_sub(usize::from(closes))
        }
        None => state.indent_level.unwrap_or(0),
    };
    level * indent_unit
}

/// A styled token produced while walking a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub line: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub style: Style,
    pub kind: Option<RuleKind>,
    pub step: usize,
}

/// Lazy token sequence over a document; see [`OnlineParser::parse`]
#[derive(Debug)]
pub struct Tokens<'a> {
    parser: OnlineParser,
    lines: std::iter::Enumerate<std::str::Split<'a, char>>,
    line: usize,
    stream: Option<CharacterStream>,
    state: State,
}

impl Tokens<'_> {
    /// State after the last yielded token; a new parse can resume from it
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }
}

impl Iterator for Tokens<'_> {
    type Item = TokenInfo;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(stream) = self.stream.as_mut() {
                if !stream.eol() {
                    let style = self.parser.token(stream, &mut self.state);
                    return Some(TokenInfo {
                        line: self.line,
                        start: stream.start(),
                        end: stream.pos(),
                        text: stream.current(),
                        style,
                        kind: self.state.kind(),
                        step: self.state.step(),
                    });
                }
                self.stream = None;
                if self.state.kind().is_none() {
                    self.state = self.parser.start_state();
                }
            }

            let (line, text) = self.lines.next()?;
            self.line = line;
            self.stream = Some(CharacterStream::new(text));
        }
    }
}

/// Where the walk ended and what was last seen there
#[derive(Debug, Clone)]
pub struct RunResult {
    pub start: usize,
    pub end: usize,
    pub string: String,
    pub state: State,
    pub style: Option<Style>,
}

/// Walk `text` line by line, calling `callback` after every token and once more
/// at the end of each line (with the last token's style).
///
/// Returning [`ControlFlow::Break`] stops the current line; the walk continues
/// on the next one.
pub fn run_online_parser<F>(text: &str, mut callback: F) -> RunResult
where
    F: FnMut(&CharacterStream, &State, Option<Style>, usize) -> ControlFlow<()>,
{
    let parser = OnlineParser::default();
    let mut state = parser.start_state();
    let mut style = None;
    let mut stream = CharacterStream::new("");

    for (index, line) in text.split('\n').enumerate() {
        stream = CharacterStream::new(line);
        while !stream.eol() {
            style = Some(parser.token(&mut stream, &mut state));
            if callback(&stream, &state, style, index).is_break() {
                break;
            }
        }
        // End-of-line notification; its verdict does not matter
        let _ = callback(&stream, &state, style, index);
        if state.kind().is_none() {
            state = parser.start_state();
        }
    }

    RunResult {
        start: stream.start(),
        end: stream.pos(),
        string: stream.current(),
        state,
        style,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styles(text: &str) -> Vec<(String, &'static str)> {
        OnlineParser::default()
            .parse(text, None)
            .filter(|token| token.style != Style::Whitespace)
            .map(|token| (token.text, token.style.as_str()))
            .collect()
    }

    #[test]
    fn test_operation_styles() {
        let tokens = styles("query Q($id: ID!) { user(id: $id) { ...F } }");
        assert_eq!(
            tokens,
            vec![
                ("query".into(), "keyword"),
                ("Q".into(), "def"),
                ("(".into(), "punctuation"),
                ("$".into(), "variable"),
                ("id".into(), "variable"),
                (":".into(), "punctuation"),
                ("ID".into(), "atom"),
                ("!".into(), "punctuation"),
                (")".into(), "punctuation"),
                ("{".into(), "punctuation"),
                ("user".into(), "property"),
                ("(".into(), "punctuation"),
                ("id".into(), "attribute"),
                (":".into(), "punctuation"),
                ("$".into(), "variable"),
                ("id".into(), "variable"),
                (")".into(), "punctuation"),
                ("{".into(), "punctuation"),
                ("...".into(), "punctuation"),
                ("F".into(), "def"),
                ("}".into(), "punctuation"),
                ("}".into(), "punctuation"),
            ]
        );
    }

    #[test]
    fn test_unknown_top_level_word_is_invalid_and_parsing_recovers() {
        let tokens = styles("garbage\nquery { a }");
        assert_eq!(tokens[0], ("garbage".into(), "invalidchar"));
        assert_eq!(tokens[1], ("query".into(), "keyword"));
        assert_eq!(tokens[3], ("a".into(), "property"));
    }

    #[test]
    fn test_state_inside_selection_set() {
        let mut tokens = OnlineParser::default().parse("{ a ", None);
        let last = tokens.by_ref().last().unwrap();
        assert_eq!(last.style, Style::Whitespace);

        let state = tokens.state();
        assert_eq!(state.kind(), Some(RuleKind::Field));
        assert_eq!(state.name(), Some("a"));
        let kinds: Vec<_> = state.stack().iter().filter_map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RuleKind::Document,
                RuleKind::Definition,
                RuleKind::ShortQuery,
                RuleKind::SelectionSet,
                RuleKind::Selection,
                RuleKind::Field,
            ]
        );
    }

    #[test]
    fn test_block_string_spans_lines() {
        let tokens: Vec<_> = OnlineParser::default()
            .parse("{ a(s: \"\"\"one\ntwo\"\"\") b }", None)
            .filter(|token| token.style != Style::Whitespace)
            .collect();
        assert_eq!(tokens[5].text, "\"\"\"one");
        assert_eq!(tokens[5].style, Style::String);
        assert_eq!(tokens[6].text, "two\"\"\"");
        assert_eq!(tokens[6].style, Style::String);
        assert_eq!(tokens[6].line, 1);
        assert_eq!(tokens[8].text, "b");
        assert_eq!(tokens[8].style, Style::Property);
    }

    #[test]
    fn test_resume_from_saved_state() {
        let parser = OnlineParser::default();
        let mut first = parser.parse("query {", None);
        first.by_ref().for_each(drop);
        let saved = first.state().clone();

        let resumed: Vec<_> = parser
            .parse("  field", Some(saved))
            .filter(|token| token.style != Style::Whitespace)
            .collect();
        assert_eq!(resumed[0].style, Style::Property);
    }

    #[test]
    fn test_indent_follows_open_brackets() {
        let parser = OnlineParser::default();
        let mut tokens = parser.parse("query {\n  a(", None);
        tokens.by_ref().for_each(drop);
        let state = tokens.state();

        assert_eq!(indent(state, "x", 2), 4);
        assert_eq!(indent(state, ")", 2), 2);
        assert_eq!(indent(&parser.start_state(), "", 2), 0);
    }

    #[test]
    fn test_run_online_parser_reports_final_token() {
        let mut lines = Vec::new();
        let result = run_online_parser("{ a }\n{ b", |_, _, _, index| {
            lines.push(index);
            ControlFlow::Continue(())
        });

        assert_eq!(result.string, "b");
        assert_eq!((result.start, result.end), (2, 3));
        assert_eq!(result.style, Some(Style::Property));
        assert_eq!(lines.first(), Some(&0));
        assert_eq!(lines.last(), Some(&1));
    }
}
