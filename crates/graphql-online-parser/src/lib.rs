//! Error-tolerant, line-resumable GraphQL parser.
//!
//! Unlike a full parser this never fails: it walks text token by token,
//! keeping a stack of grammar frames that describes the syntactic context at
//! every position. Editor features read that context to decide what to offer
//! at the cursor, even while the document is incomplete.

mod grammar;
mod lexer;
mod parser;
mod state;
mod stream;
mod style;

pub use grammar::{Fork, Matcher, Rule, RuleKind, Separator, Step, Terminal, TokenMatch, Update};
pub use lexer::{Token, TokenKind};
pub use parser::{indent, run_online_parser, OnlineParser, RunResult, TokenInfo, Tokens};
pub use state::{Frame, FrameId, State};
pub use stream::{is_ignored, CharacterStream};
pub use style::Style;
