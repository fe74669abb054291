//! Document outline.

use crate::location::{name_range, span_range};
use apollo_compiler::ast::{self, Definition, Selection};
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::Name;
use graphql_extract::Range;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolKind {
    Class,
    Field,
    Enum,
    EnumMember,
    Interface,
    Struct,
    Namespace,
}

/// One entry of a document outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Whole definition or selection
    pub range: Range,
    /// Just the name
    pub selection_range: Range,
    /// Name of the enclosing symbol
    pub container_name: Option<String>,
}

/// Flattened outline of `text`, parents before their children.
///
/// Definitions that fail to parse are skipped; whatever parsed is listed.
#[must_use]
pub fn document_symbols(text: &str) -> Vec<DocumentSymbol> {
    let document = match ast::Document::parse(text, "document.graphql") {
        Ok(document) => document,
        Err(with_errors) => with_errors.partial,
    };

    let mut outline = Outline {
        text,
        symbols: Vec::new(),
    };
    for definition in &document.definitions {
        outline.definition(definition);
    }
    outline.symbols
}

struct Outline<'a> {
    text: &'a str,
    symbols: Vec<DocumentSymbol>,
}

impl Outline<'_> {
    fn push(
        &mut self,
        name: String,
        kind: SymbolKind,
        span: Option<SourceSpan>,
        name_node: Option<&Name>,
        container: Option<&str>,
    ) {
        let Some(span) = span else {
            return;
        };
        let range = span_range(self.text, span);
        let selection_range = name_node
            .and_then(|name| name_range(self.text, name))
            .unwrap_or(range);
        self.symbols.push(DocumentSymbol {
            name,
            kind,
            range,
            selection_range,
            container_name: container.map(str::to_string),
        });
    }

    fn definition(&mut self, definition: &Definition) {
        match definition {
            Definition::OperationDefinition(operation) => {
                let name = operation.name.as_ref().map_or_else(
                    || operation.operation_type.name().to_string(),
                    ToString::to_string,
                );
                self.push(
                    name.clone(),
                    SymbolKind::Class,
                    operation.location(),
                    operation.name.as_ref(),
                    None,
                );
                self.selections(&operation.selection_set, &name);
            }
            Definition::FragmentDefinition(fragment) => {
                self.push(
                    fragment.name.to_string(),
                    SymbolKind::Class,
                    fragment.location(),
                    Some(&fragment.name),
                    None,
                );
                self.selections(&fragment.selection_set, &fragment.name);
            }
            Definition::ObjectTypeDefinition(object) => {
                self.type_with_fields(&object.name, definition.location(), &object.fields, SymbolKind::Class);
            }
            Definition::ObjectTypeExtension(object) => {
                self.type_with_fields(&object.name, definition.location(), &object.fields, SymbolKind::Class);
            }
            Definition::InterfaceTypeDefinition(interface) => {
                self.type_with_fields(
                    &interface.name,
                    definition.location(),
                    &interface.fields,
                    SymbolKind::Interface,
                );
            }
            Definition::InterfaceTypeExtension(interface) => {
                self.type_with_fields(
                    &interface.name,
                    definition.location(),
                    &interface.fields,
                    SymbolKind::Interface,
                );
            }
            Definition::InputObjectTypeDefinition(input) => {
                self.type_with_inputs(&input.name, definition.location(), &input.fields);
            }
            Definition::InputObjectTypeExtension(input) => {
                self.type_with_inputs(&input.name, definition.location(), &input.fields);
            }
            Definition::EnumTypeDefinition(enum_type) => {
                self.enum_with_values(&enum_type.name, definition.location(), &enum_type.values);
            }
            Definition::EnumTypeExtension(enum_type) => {
                self.enum_with_values(&enum_type.name, definition.location(), &enum_type.values);
            }
            Definition::UnionTypeDefinition(union) => {
                self.push(
                    union.name.to_string(),
                    SymbolKind::Class,
                    definition.location(),
                    Some(&union.name),
                    None,
                );
            }
            Definition::ScalarTypeDefinition(scalar) => {
                self.push(
                    scalar.name.to_string(),
                    SymbolKind::Class,
                    definition.location(),
                    Some(&scalar.name),
                    None,
                );
            }
            _ => {}
        }
    }

    fn type_with_fields(
        &mut self,
        name: &Name,
        span: Option<SourceSpan>,
        fields: &[apollo_compiler::Node<ast::FieldDefinition>],
        kind: SymbolKind,
    ) {
        self.push(name.to_string(), kind, span, Some(name), None);
        for field in fields {
            self.push(
                field.name.to_string(),
                SymbolKind::Field,
                field.location(),
                Some(&field.name),
                Some(name),
            );
        }
    }

    fn type_with_inputs(
        &mut self,
        name: &Name,
        span: Option<SourceSpan>,
        fields: &[apollo_compiler::Node<ast::InputValueDefinition>],
    ) {
        self.push(name.to_string(), SymbolKind::Class, span, Some(name), None);
        for field in fields {
            self.push(
                field.name.to_string(),
                SymbolKind::Field,
                field.location(),
                Some(&field.name),
                Some(name),
            );
        }
    }

    fn enum_with_values(
        &mut self,
        name: &Name,
        span: Option<SourceSpan>,
        values: &[apollo_compiler::Node<ast::EnumValueDefinition>],
    ) {
        self.push(name.to_string(), SymbolKind::Enum, span, Some(name), None);
        for value in values {
            self.push(
                value.value.to_string(),
                SymbolKind::EnumMember,
                value.location(),
                Some(&value.value),
                Some(name),
            );
        }
    }

    fn selections(&mut self, selections: &[Selection], container: &str) {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    let name = field.alias.as_ref().unwrap_or(&field.name).to_string();
                    self.push(
                        name.clone(),
                        SymbolKind::Field,
                        field.location(),
                        Some(&field.name),
                        Some(container),
                    );
                    self.selections(&field.selection_set, &name);
                }
                Selection::FragmentSpread(spread) => {
                    self.push(
                        spread.fragment_name.to_string(),
                        SymbolKind::Struct,
                        spread.location(),
                        Some(&spread.fragment_name),
                        Some(container),
                    );
                }
                Selection::InlineFragment(inline) => {
                    let name = inline
                        .type_condition
                        .as_ref()
                        .map_or_else(|| "...".to_string(), |ty| format!("... on {ty}"));
                    self.push(
                        name,
                        SymbolKind::Namespace,
                        inline.location(),
                        inline.type_condition.as_ref(),
                        Some(container),
                    );
                    self.selections(&inline.selection_set, container);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_extract::Position;

    fn outline(text: &str) -> Vec<(String, SymbolKind, Option<String>)> {
        document_symbols(text)
            .into_iter()
            .map(|symbol| (symbol.name, symbol.kind, symbol.container_name))
            .collect()
    }

    #[test]
    fn test_operation_outline() {
        let symbols = outline("query Q { me: user { id ...F ... on Admin { level } } }");
        assert_eq!(
            symbols,
            vec![
                ("Q".into(), SymbolKind::Class, None),
                ("me".into(), SymbolKind::Field, Some("Q".into())),
                ("id".into(), SymbolKind::Field, Some("me".into())),
                ("F".into(), SymbolKind::Struct, Some("me".into())),
                ("... on Admin".into(), SymbolKind::Namespace, Some("me".into())),
                ("level".into(), SymbolKind::Field, Some("me".into())),
            ]
        );
    }

    #[test]
    fn test_type_system_outline() {
        let symbols = outline("type User { id: ID }\nenum Role { ADMIN }\ninput Filter { q: String }");
        assert_eq!(
            symbols,
            vec![
                ("User".into(), SymbolKind::Class, None),
                ("id".into(), SymbolKind::Field, Some("User".into())),
                ("Role".into(), SymbolKind::Enum, None),
                ("ADMIN".into(), SymbolKind::EnumMember, Some("Role".into())),
                ("Filter".into(), SymbolKind::Class, None),
                ("q".into(), SymbolKind::Field, Some("Filter".into())),
            ]
        );
    }

    #[test]
    fn test_anonymous_operation_and_ranges() {
        let symbols = document_symbols("{\n  a\n}");
        assert_eq!(symbols[0].name, "query");
        assert_eq!(symbols[1].selection_range.start, Position::new(1, 2));
    }

    #[test]
    fn test_broken_document_keeps_parsed_definitions() {
        let symbols = outline("fragment F on T { a }\nquery {");
        assert_eq!(symbols[0].0, "F");
    }
}
