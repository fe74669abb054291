//! Conversions between parser spans and editor positions.

use apollo_compiler::parser::SourceSpan;
use apollo_compiler::Name;
use graphql_extract::{position_from_offset, Position, Range};

/// Range of `span` inside `text`
pub(crate) fn span_range(text: &str, span: SourceSpan) -> Range {
    Range::new(
        position_from_offset(text, span.offset()),
        position_from_offset(text, span.end_offset()),
    )
}

/// Source text covered by `span`
pub(crate) fn span_text(text: &str, span: SourceSpan) -> Option<&str> {
    text.get(span.offset()..span.end_offset())
}

pub(crate) fn name_range(text: &str, name: &Name) -> Option<Range> {
    name.location().map(|span| span_range(text, span))
}

/// Last position of `text`
pub(crate) fn end_position(text: &str) -> Position {
    let line = text.split('\n').count().saturating_sub(1);
    let character = text
        .rsplit('\n')
        .next()
        .map_or(0, |last| last.encode_utf16().count());
    Position::new(line, character)
}
