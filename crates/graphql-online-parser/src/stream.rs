/// Cursor over a single line of source text.
///
/// Positions are character indices into the line. `start` marks the beginning
/// of the most recently consumed token and `pos` its end.
#[derive(Debug, Clone)]
pub struct CharacterStream {
    chars: Vec<char>,
    start: usize,
    pos: usize,
}

/// Characters GraphQL treats as insignificant between tokens
#[must_use]
pub const fn is_ignored(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t' | ',' | '\n' | '\r' | '\u{FEFF}' | '\u{00A0}'
    )
}

impl CharacterStream {
    #[must_use]
    pub fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            start: 0,
            pos: 0,
        }
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// At the start of the line
    #[must_use]
    pub const fn sol(&self) -> bool {
        self.pos == 0
    }

    /// At the end of the line
    #[must_use]
    pub fn eol(&self) -> bool {
        self.pos >= self.chars.len()
    }

    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn next_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// Unconsumed remainder of the line
    #[must_use]
    pub fn rest(&self) -> &[char] {
        &self.chars[self.pos.min(self.chars.len())..]
    }

    /// Consume a token of `len` characters starting at the cursor
    pub fn consume(&mut self, len: usize) {
        self.start = self.pos;
        self.pos = (self.pos + len).min(self.chars.len());
    }

    /// Consume a run of characters matching `pred`, starting a new token if any match
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> bool {
        let len = self.rest().iter().take_while(|ch| pred(**ch)).count();
        if len == 0 {
            return false;
        }
        self.consume(len);
        true
    }

    /// Width of the leading whitespace, with tabs counting as two columns
    #[must_use]
    pub fn indentation(&self) -> usize {
        self.chars
            .iter()
            .take_while(|ch| ch.is_whitespace())
            .map(|ch| if *ch == '\t' { 2 } else { 1 })
            .sum()
    }

    /// Text of the most recently consumed token
    #[must_use]
    pub fn current(&self) -> String {
        let end = self.pos.min(self.chars.len());
        self.chars[self.start.min(end)..end].iter().collect()
    }

    /// Whether the remainder, after ignored characters, begins with `pred`
    #[must_use]
    pub fn lookahead(&self, pred: impl Fn(&[char]) -> bool) -> bool {
        let rest = self.rest();
        let skipped = rest
            .iter()
            .take_while(|ch| ch.is_whitespace() || **ch == ',' || **ch == '\u{00A0}')
            .count();
        pred(&rest[skipped..])
    }
}

/// Whether `chars` starts with the word `word` followed by a word boundary
#[must_use]
pub fn starts_with_word(chars: &[char], word: &str) -> bool {
    let mut len = 0;
    for expected in word.chars() {
        if chars.get(len) != Some(&expected) {
            return false;
        }
        len += 1;
    }
    !chars
        .get(len)
        .is_some_and(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eat_while_marks_token() {
        let mut stream = CharacterStream::new("  query");
        assert!(stream.sol());
        assert!(stream.eat_while(is_ignored));
        assert_eq!((stream.start(), stream.pos()), (0, 2));
        assert!(!stream.eat_while(is_ignored));
        assert!(stream.eat_while(|ch| ch.is_ascii_alphabetic()));
        assert_eq!(stream.current(), "query");
        assert!(stream.eol());
    }

    #[test]
    fn test_indentation_counts_tabs_twice() {
        assert_eq!(CharacterStream::new("\t  a").indentation(), 4);
        assert_eq!(CharacterStream::new("a").indentation(), 0);
    }

    #[test]
    fn test_lookahead_skips_ignored() {
        let mut stream = CharacterStream::new("...  , on User");
        stream.consume(3);
        assert!(stream.lookahead(|rest| starts_with_word(rest, "on")));

        let mut stream = CharacterStream::new("...onion");
        stream.consume(3);
        assert!(!stream.lookahead(|rest| starts_with_word(rest, "on")));
    }
}
