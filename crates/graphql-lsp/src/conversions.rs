//! Conversions between LSP protocol types and the project's own types.
//!
//! Pure functions, usable from any handler.

use graphql_project::{
    CompletionItem, CompletionItemKind, DefinitionLocation, Diagnostic, DocumentSymbol, HoverInfo,
    Severity, SymbolKind, WorkspaceSymbol,
};
use lsp_types::{
    DiagnosticSeverity, Documentation, Location, MarkupContent, MarkupKind, NumberOrString,
    SymbolInformation, Uri,
};
use std::path::Path;
use tower_lsp_server::UriExt;

pub const fn to_position(pos: lsp_types::Position) -> graphql_project::Position {
    graphql_project::Position::new(pos.line as usize, pos.character as usize)
}

#[allow(clippy::cast_possible_truncation)]
pub const fn to_lsp_position(pos: graphql_project::Position) -> lsp_types::Position {
    lsp_types::Position {
        line: pos.line as u32,
        character: pos.character as u32,
    }
}

pub const fn to_lsp_range(range: graphql_project::Range) -> lsp_types::Range {
    lsp_types::Range {
        start: to_lsp_position(range.start),
        end: to_lsp_position(range.end),
    }
}

pub fn to_lsp_diagnostic(diagnostic: Diagnostic) -> lsp_types::Diagnostic {
    let severity = match diagnostic.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    };

    lsp_types::Diagnostic {
        range: to_lsp_range(diagnostic.range),
        severity: Some(severity),
        code: diagnostic.code.map(NumberOrString::String),
        source: Some(diagnostic.source.as_str().to_string()),
        message: diagnostic.message,
        ..Default::default()
    }
}

pub const fn to_lsp_completion_kind(kind: CompletionItemKind) -> lsp_types::CompletionItemKind {
    match kind {
        CompletionItemKind::Keyword => lsp_types::CompletionItemKind::KEYWORD,
        CompletionItemKind::Field => lsp_types::CompletionItemKind::FIELD,
        CompletionItemKind::Type => lsp_types::CompletionItemKind::CLASS,
        CompletionItemKind::Fragment => lsp_types::CompletionItemKind::SNIPPET,
        CompletionItemKind::Directive => lsp_types::CompletionItemKind::FUNCTION,
        CompletionItemKind::EnumValue => lsp_types::CompletionItemKind::ENUM_MEMBER,
        CompletionItemKind::Argument => lsp_types::CompletionItemKind::PROPERTY,
        CompletionItemKind::Variable => lsp_types::CompletionItemKind::VARIABLE,
        CompletionItemKind::Value => lsp_types::CompletionItemKind::VALUE,
    }
}

pub fn to_lsp_completion_item(item: CompletionItem) -> lsp_types::CompletionItem {
    let documentation = match (item.documentation, item.deprecation_reason) {
        (Some(docs), Some(reason)) => Some(format!("{docs}\n\n_Deprecated: {reason}_")),
        (docs, None) => docs,
        (None, Some(reason)) => Some(format!("_Deprecated: {reason}_")),
    };

    lsp_types::CompletionItem {
        label: item.label,
        kind: Some(to_lsp_completion_kind(item.kind)),
        detail: item.detail,
        documentation: documentation.map(|value| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            })
        }),
        deprecated: Some(item.deprecated),
        insert_text: item.insert_text,
        ..Default::default()
    }
}

pub fn to_lsp_hover(hover: HoverInfo) -> lsp_types::Hover {
    lsp_types::Hover {
        contents: lsp_types::HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover.contents,
        }),
        range: hover.range.map(to_lsp_range),
    }
}

/// `None` when the path cannot be expressed as a `file://` URI
pub fn to_lsp_location(location: &DefinitionLocation) -> Option<Location> {
    Some(Location {
        uri: Uri::from_file_path(&location.file_path)?,
        range: to_lsp_range(location.range),
    })
}

pub const fn to_lsp_symbol_kind(kind: SymbolKind) -> lsp_types::SymbolKind {
    match kind {
        SymbolKind::Class => lsp_types::SymbolKind::CLASS,
        SymbolKind::Field => lsp_types::SymbolKind::FIELD,
        SymbolKind::Enum => lsp_types::SymbolKind::ENUM,
        SymbolKind::EnumMember => lsp_types::SymbolKind::ENUM_MEMBER,
        SymbolKind::Interface => lsp_types::SymbolKind::INTERFACE,
        SymbolKind::Struct => lsp_types::SymbolKind::STRUCT,
        SymbolKind::Namespace => lsp_types::SymbolKind::NAMESPACE,
    }
}

#[allow(deprecated)] // LSP requires deprecated field
pub fn to_symbol_information(path: &Path, symbol: DocumentSymbol) -> Option<SymbolInformation> {
    Some(SymbolInformation {
        name: symbol.name,
        kind: to_lsp_symbol_kind(symbol.kind),
        tags: None,
        deprecated: None,
        location: Location {
            uri: Uri::from_file_path(path)?,
            range: to_lsp_range(symbol.range),
        },
        container_name: symbol.container_name,
    })
}

pub fn to_workspace_symbol(symbol: WorkspaceSymbol) -> Option<SymbolInformation> {
    to_symbol_information(&symbol.file_path, symbol.symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_project::{DiagnosticSource, Position, Range};

    fn range(start: (usize, usize), end: (usize, usize)) -> Range {
        Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
    }

    #[test]
    fn test_position_round_trip() {
        let lsp = lsp_types::Position {
            line: 3,
            character: 14,
        };
        assert_eq!(to_position(lsp), Position::new(3, 14));
        assert_eq!(to_lsp_position(to_position(lsp)), lsp);
    }

    #[test]
    fn test_diagnostic_carries_source_and_code() {
        let diagnostic = Diagnostic::warning(range((1, 2), (1, 7)), "The field User.email is deprecated.")
            .with_code("deprecated_usage")
            .with_source(DiagnosticSource::Deprecation);

        let lsp = to_lsp_diagnostic(diagnostic);
        assert_eq!(lsp.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(lsp.source.as_deref(), Some("GraphQL: Deprecation"));
        assert_eq!(
            lsp.code,
            Some(NumberOrString::String("deprecated_usage".to_string()))
        );
        assert_eq!(lsp.range.start.character, 2);
    }

    #[test]
    fn test_deprecated_completion_mentions_reason() {
        let item = CompletionItem::new("email", CompletionItemKind::Field)
            .with_detail("String")
            .with_documentation(Some("Primary address"))
            .with_deprecation(Some("Use contact".to_string()));

        let lsp = to_lsp_completion_item(item);
        assert_eq!(lsp.kind, Some(lsp_types::CompletionItemKind::FIELD));
        assert_eq!(lsp.deprecated, Some(true));
        let Some(Documentation::MarkupContent(markup)) = lsp.documentation else {
            panic!("expected markdown documentation");
        };
        assert_eq!(markup.value, "Primary address\n\n_Deprecated: Use contact_");
    }

    #[test]
    fn test_location_uses_file_uri() {
        let location = DefinitionLocation::new("/project/schema.graphql".into(), range((4, 2), (4, 6)));
        let lsp = to_lsp_location(&location).unwrap();
        assert_eq!(lsp.uri.as_str(), "file:///project/schema.graphql");
        assert_eq!(lsp.range.start.line, 4);
    }
}
