use serde::Serialize;
use std::fmt;

/// Highlighting class attached to every token the parser emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    Keyword,
    Def,
    Property,
    Qualifier,
    Attribute,
    Number,
    String,
    Builtin,
    #[serde(rename = "string-2")]
    String2,
    Variable,
    Atom,
    Meta,
    Punctuation,
    Comment,
    #[serde(rename = "ws")]
    Whitespace,
    #[serde(rename = "invalidchar")]
    InvalidChar,
}

impl Style {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Def => "def",
            Self::Property => "property",
            Self::Qualifier => "qualifier",
            Self::Attribute => "attribute",
            Self::Number => "number",
            Self::String => "string",
            Self::Builtin => "builtin",
            Self::String2 => "string-2",
            Self::Variable => "variable",
            Self::Atom => "atom",
            Self::Meta => "meta",
            Self::Punctuation => "punctuation",
            Self::Comment => "comment",
            Self::Whitespace => "ws",
            Self::InvalidChar => "invalidchar",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
