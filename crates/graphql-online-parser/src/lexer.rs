use crate::stream::CharacterStream;
use serde::Serialize;

/// Lexical class of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Name,
    Punctuation,
    Number,
    String,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

type LexRule = fn(&[char]) -> usize;

/// Tried in order; the first rule matching a non-empty prefix wins
const LEX_RULES: &[(TokenKind, LexRule)] = &[
    (TokenKind::Name, lex_name),
    (TokenKind::Punctuation, lex_punctuation),
    (TokenKind::Number, lex_number),
    (TokenKind::String, lex_string),
    (TokenKind::Comment, lex_comment),
];

/// Consume the next token from the stream, if any rule matches
pub fn lex(stream: &mut CharacterStream) -> Option<Token> {
    let rest = stream.rest();
    let (kind, len) = LEX_RULES.iter().find_map(|(kind, rule)| {
        let len = rule(rest);
        (len > 0).then_some((*kind, len))
    })?;

    stream.consume(len);
    Some(Token {
        kind,
        value: stream.current(),
    })
}

const fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

const fn is_name_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn lex_name(chars: &[char]) -> usize {
    match chars.first() {
        Some(ch) if is_name_start(*ch) => {
            1 + chars[1..].iter().take_while(|ch| is_name_continue(**ch)).count()
        }
        _ => 0,
    }
}

fn lex_punctuation(chars: &[char]) -> usize {
    match chars {
        ['.', '.', '.', ..] => 3,
        [ch, ..] if "!$():=&@[]{|}".contains(*ch) => 1,
        _ => 0,
    }
}

fn count_digits(chars: &[char]) -> usize {
    chars.iter().take_while(|ch| ch.is_ascii_digit()).count()
}

fn lex_number(chars: &[char]) -> usize {
    let mut i = usize::from(chars.first() == Some(&'-'));

    match chars.get(i) {
        Some('0') => i += 1,
        Some('1'..='9') => i += count_digits(&chars[i..]),
        _ => return 0,
    }

    if chars.get(i) == Some(&'.') {
        i += 1 + count_digits(&chars[i + 1..]);
    }

    if matches!(chars.get(i), Some('e' | 'E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+' | '-')) {
            j += 1;
        }
        let exponent = count_digits(chars.get(j..).unwrap_or_default());
        if exponent > 0 {
            i = j + exponent;
        }
    }

    i
}

fn lex_string(chars: &[char]) -> usize {
    if chars.starts_with(&['"', '"', '"']) {
        return lex_block_string(chars);
    }
    if chars.first() != Some(&'"') {
        return 0;
    }

    let mut i = 1;
    while let Some(ch) = chars.get(i) {
        match ch {
            '"' => return i + 1,
            '\\' => match chars.get(i + 1) {
                Some('"' | '/' | '\\' | 'b' | 'f' | 'n' | 'r' | 't') => i += 2,
                Some('u')
                    if chars
                        .get(i + 2..i + 6)
                        .is_some_and(|hex| hex.iter().all(char::is_ascii_hexdigit)) =>
                {
                    i += 6;
                }
                // An invalid escape ends the (unterminated) string
                _ => return i,
            },
            _ => i += 1,
        }
    }
    i
}

fn lex_block_string(chars: &[char]) -> usize {
    let mut i = 3;
    while i < chars.len() {
        let rest = &chars[i..];
        if rest.starts_with(&['\\', '"', '"', '"']) {
            i += 4;
        } else if rest.starts_with(&['"', '"', '"']) {
            return i + 3;
        } else {
            i += 1;
        }
    }
    chars.len()
}

fn lex_comment(chars: &[char]) -> usize {
    if chars.first() == Some(&'#') {
        chars.len()
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(line: &str) -> Vec<(TokenKind, String)> {
        let mut stream = CharacterStream::new(line);
        let mut tokens = Vec::new();
        while !stream.eol() {
            if stream.eat_while(crate::stream::is_ignored) {
                continue;
            }
            let token = lex(&mut stream).unwrap();
            tokens.push((token.kind, token.value));
        }
        tokens
    }

    #[test]
    fn test_lex_names_and_punctuation() {
        assert_eq!(
            lex_all("query Q($id: ID!) { ...F }"),
            vec![
                (TokenKind::Name, "query".into()),
                (TokenKind::Name, "Q".into()),
                (TokenKind::Punctuation, "(".into()),
                (TokenKind::Punctuation, "$".into()),
                (TokenKind::Name, "id".into()),
                (TokenKind::Punctuation, ":".into()),
                (TokenKind::Name, "ID".into()),
                (TokenKind::Punctuation, "!".into()),
                (TokenKind::Punctuation, ")".into()),
                (TokenKind::Punctuation, "{".into()),
                (TokenKind::Punctuation, "...".into()),
                (TokenKind::Name, "F".into()),
                (TokenKind::Punctuation, "}".into()),
            ]
        );
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(lex_number(&['-', '1', '2', '.', '5', 'e', '+', '3']), 8);
        assert_eq!(lex_number(&['0', '1']), 1);
        assert_eq!(lex_number(&['1', '.']), 2);
        assert_eq!(lex_number(&['1', 'e', 'x']), 1);
        assert_eq!(lex_number(&['-', 'a']), 0);
    }

    #[test]
    fn test_lex_strings() {
        let chars: Vec<char> = r#""a\"b" rest"#.chars().collect();
        assert_eq!(lex_string(&chars), 6);

        let unterminated: Vec<char> = r#""abc"#.chars().collect();
        assert_eq!(lex_string(&unterminated), 4);

        let block: Vec<char> = r#""""a \""" b""" c"#.chars().collect();
        assert_eq!(lex_block_string(&block), 14);

        let open_block: Vec<char> = r#""""doc"#.chars().collect();
        assert_eq!(lex_string(&open_block), 6);
    }

    #[test]
    fn test_lex_comment_takes_rest_of_line() {
        assert_eq!(
            lex_all("a # b c"),
            vec![
                (TokenKind::Name, "a".into()),
                (TokenKind::Comment, "# b c".into()),
            ]
        );
    }
}
