//! Cross-file fragment and type dependencies.
//!
//! A document often spreads fragments or names types that live in other
//! files. Validation and navigation need those definitions, so the resolvers
//! here follow references transitively through a project index.

use crate::location::{span_range, span_text};
use apollo_compiler::ast::{self, Definition, Selection};
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::Node;
use graphql_extract::{position_from_offset, CachedContent, Range};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// A fragment definition and the snippet it was read from
#[derive(Debug, Clone)]
pub struct FragmentInfo {
    pub file_path: PathBuf,
    pub content: CachedContent,
    pub definition: Node<ast::FragmentDefinition>,
}

impl FragmentInfo {
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name.as_str()
    }

    #[must_use]
    pub fn type_condition(&self) -> &str {
        self.definition.type_condition.as_str()
    }

    /// Source text of the definition alone
    #[must_use]
    pub fn text(&self) -> &str {
        definition_text(&self.content, self.definition.location())
    }

    /// Range of the definition in host-file coordinates
    #[must_use]
    pub fn range(&self) -> Range {
        definition_range(&self.content, self.definition.location())
    }
}

/// A named type definition (object, interface, union, enum, input or scalar)
/// and the snippet it was read from
#[derive(Debug, Clone)]
pub struct ObjectTypeInfo {
    pub file_path: PathBuf,
    pub content: CachedContent,
    pub definition: Definition,
}

impl ObjectTypeInfo {
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name().map_or("", |name| name.as_str())
    }

    #[must_use]
    pub fn text(&self) -> &str {
        definition_text(&self.content, self.definition.location())
    }

    #[must_use]
    pub fn range(&self) -> Range {
        definition_range(&self.content, self.definition.location())
    }
}

fn definition_text(content: &CachedContent, span: Option<SourceSpan>) -> &str {
    span.and_then(|span| span_text(&content.query, span))
        .unwrap_or(&content.query)
        .trim()
}

/// Range of the definition without surrounding trivia
pub(crate) fn definition_range(content: &CachedContent, span: Option<SourceSpan>) -> Range {
    let Some(span) = span else {
        return content.range;
    };
    let Some(raw) = span_text(&content.query, span) else {
        return span_range(&content.query, span).offset_lines(content.range.start.line);
    };
    let start = span.offset() + (raw.len() - raw.trim_start().len());
    let end = span.offset() + raw.trim_end().len();
    Range::new(
        position_from_offset(&content.query, start),
        position_from_offset(&content.query, end.max(start)),
    )
    .offset_lines(content.range.start.line)
}

/// Split a parsed snippet into fragment and type index entries
#[must_use]
pub fn index_document(
    file_path: &std::path::Path,
    content: &CachedContent,
    document: &ast::Document,
) -> (Vec<FragmentInfo>, Vec<ObjectTypeInfo>) {
    let mut fragments = Vec::new();
    let mut types = Vec::new();

    for definition in &document.definitions {
        match definition {
            Definition::FragmentDefinition(fragment) => fragments.push(FragmentInfo {
                file_path: file_path.to_path_buf(),
                content: content.clone(),
                definition: fragment.clone(),
            }),
            Definition::ObjectTypeDefinition(_)
            | Definition::InterfaceTypeDefinition(_)
            | Definition::UnionTypeDefinition(_)
            | Definition::EnumTypeDefinition(_)
            | Definition::InputObjectTypeDefinition(_)
            | Definition::ScalarTypeDefinition(_) => types.push(ObjectTypeInfo {
                file_path: file_path.to_path_buf(),
                content: content.clone(),
                definition: definition.clone(),
            }),
            _ => {}
        }
    }

    (fragments, types)
}

/// Fragments from `index` that `document` needs but does not define.
///
/// Follows spreads inside the found fragments too. The result is in discovery
/// order and never contains a fragment the document defines itself.
#[must_use]
pub fn fragment_dependencies(
    document: &ast::Document,
    index: &HashMap<String, FragmentInfo>,
) -> Vec<FragmentInfo> {
    let mut defined = HashSet::new();
    let mut referenced = Vec::new();

    for definition in &document.definitions {
        match definition {
            Definition::OperationDefinition(operation) => {
                collect_spreads(&operation.selection_set, &mut referenced);
            }
            Definition::FragmentDefinition(fragment) => {
                defined.insert(fragment.name.to_string());
                collect_spreads(&fragment.selection_set, &mut referenced);
            }
            _ => {}
        }
    }

    resolve(&defined, referenced, index, |info, out| {
        collect_spreads(&info.definition.selection_set, out);
    })
}

/// Named type definitions from `index` that `document` references but does
/// not define, followed transitively through the found definitions
#[must_use]
pub fn type_dependencies(
    document: &ast::Document,
    index: &HashMap<String, ObjectTypeInfo>,
) -> Vec<ObjectTypeInfo> {
    let mut defined = HashSet::new();
    let mut referenced = Vec::new();

    for definition in &document.definitions {
        if is_type_definition(definition) {
            if let Some(name) = definition.name() {
                defined.insert(name.to_string());
            }
        }
        collect_named_types(definition, &mut referenced);
    }

    resolve(&defined, referenced, index, |info, out| {
        collect_named_types(&info.definition, out);
    })
}

fn resolve<T: Clone>(
    defined: &HashSet<String>,
    referenced: Vec<String>,
    index: &HashMap<String, T>,
    references_of: impl Fn(&T, &mut Vec<String>),
) -> Vec<T> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut queue = Vec::new();

    for name in referenced {
        if !defined.contains(&name) && index.contains_key(&name) && visited.insert(name.clone())
        {
            order.push(name.clone());
            queue.push(name);
        }
    }

    while let Some(name) = queue.pop() {
        let Some(entry) = index.get(&name) else {
            continue;
        };
        let mut found = Vec::new();
        references_of(entry, &mut found);
        for next in found {
            if !defined.contains(&next) && index.contains_key(&next) && visited.insert(next.clone())
            {
                order.push(next.clone());
                queue.push(next);
            }
        }
    }

    order
        .iter()
        .filter_map(|name| index.get(name).cloned())
        .collect()
}

pub(crate) fn collect_spreads(selections: &[Selection], out: &mut Vec<String>) {
    for selection in selections {
        match selection {
            Selection::Field(field) => collect_spreads(&field.selection_set, out),
            Selection::FragmentSpread(spread) => out.push(spread.fragment_name.to_string()),
            Selection::InlineFragment(inline) => collect_spreads(&inline.selection_set, out),
        }
    }
}

pub(crate) const fn is_type_definition(definition: &Definition) -> bool {
    matches!(
        definition,
        Definition::ObjectTypeDefinition(_)
            | Definition::InterfaceTypeDefinition(_)
            | Definition::UnionTypeDefinition(_)
            | Definition::EnumTypeDefinition(_)
            | Definition::InputObjectTypeDefinition(_)
            | Definition::ScalarTypeDefinition(_)
    )
}

fn push_type(ty: &ast::Type, out: &mut Vec<String>) {
    out.push(ty.inner_named_type().to_string());
}

fn collect_input_values(values: &[Node<ast::InputValueDefinition>], out: &mut Vec<String>) {
    for value in values {
        push_type(&value.ty, out);
    }
}

fn collect_field_definitions(fields: &[Node<ast::FieldDefinition>], out: &mut Vec<String>) {
    for field in fields {
        push_type(&field.ty, out);
        collect_input_values(&field.arguments, out);
    }
}

fn collect_type_conditions(selections: &[Selection], out: &mut Vec<String>) {
    for selection in selections {
        match selection {
            Selection::Field(field) => collect_type_conditions(&field.selection_set, out),
            Selection::FragmentSpread(_) => {}
            Selection::InlineFragment(inline) => {
                if let Some(type_condition) = &inline.type_condition {
                    out.push(type_condition.to_string());
                }
                collect_type_conditions(&inline.selection_set, out);
            }
        }
    }
}

/// Every named type `definition` mentions
pub(crate) fn collect_named_types(definition: &Definition, out: &mut Vec<String>) {
    match definition {
        Definition::OperationDefinition(operation) => {
            for variable in &operation.variables {
                push_type(&variable.ty, out);
            }
            collect_type_conditions(&operation.selection_set, out);
        }
        Definition::FragmentDefinition(fragment) => {
            out.push(fragment.type_condition.to_string());
            collect_type_conditions(&fragment.selection_set, out);
        }
        Definition::DirectiveDefinition(directive) => {
            collect_input_values(&directive.arguments, out);
        }
        Definition::ObjectTypeDefinition(object) => {
            out.extend(object.implements_interfaces.iter().map(ToString::to_string));
            collect_field_definitions(&object.fields, out);
        }
        Definition::ObjectTypeExtension(object) => {
            out.extend(object.implements_interfaces.iter().map(ToString::to_string));
            collect_field_definitions(&object.fields, out);
        }
        Definition::InterfaceTypeDefinition(interface) => {
            out.extend(interface.implements_interfaces.iter().map(ToString::to_string));
            collect_field_definitions(&interface.fields, out);
        }
        Definition::InterfaceTypeExtension(interface) => {
            out.extend(interface.implements_interfaces.iter().map(ToString::to_string));
            collect_field_definitions(&interface.fields, out);
        }
        Definition::UnionTypeDefinition(union) => {
            out.extend(union.members.iter().map(ToString::to_string));
        }
        Definition::UnionTypeExtension(union) => {
            out.extend(union.members.iter().map(ToString::to_string));
        }
        Definition::InputObjectTypeDefinition(input) => collect_input_values(&input.fields, out),
        Definition::InputObjectTypeExtension(input) => collect_input_values(&input.fields, out),
        Definition::SchemaDefinition(schema) => {
            out.extend(
                schema
                    .root_operations
                    .iter()
                    .map(|root| root.1.to_string()),
            );
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_extract::Position;

    fn parse(text: &str) -> ast::Document {
        ast::Document::parse(text, "test.graphql").unwrap()
    }

    fn fragment_index(files: &[(&str, &str)]) -> HashMap<String, FragmentInfo> {
        let mut index = HashMap::new();
        for (path, text) in files {
            let content = CachedContent::new(*text, Range::default());
            let (fragments, _) = index_document(std::path::Path::new(path), &content, &parse(text));
            for fragment in fragments {
                index.insert(fragment.name().to_string(), fragment);
            }
        }
        index
    }

    fn names(found: &[FragmentInfo]) -> Vec<&str> {
        let mut names: Vec<&str> = found.iter().map(FragmentInfo::name).collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn test_transitive_fragment_dependencies() {
        let index = fragment_index(&[
            ("a.graphql", "fragment A on User { id ...B }"),
            ("b.graphql", "fragment B on User { name ...C }"),
            ("c.graphql", "fragment C on User { email }"),
            ("d.graphql", "fragment D on User { email }"),
        ]);

        let document = parse("query { me { ...A } }");
        assert_eq!(names(&fragment_dependencies(&document, &index)), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_locally_defined_fragments_are_not_returned() {
        let index = fragment_index(&[
            ("a.graphql", "fragment A on User { id ...B }"),
            ("b.graphql", "fragment B on User { name }"),
        ]);

        let document = parse("query { me { ...A } }\nfragment B on User { other }");
        assert_eq!(names(&fragment_dependencies(&document, &index)), vec!["A"]);
    }

    #[test]
    fn test_cyclic_fragments_terminate() {
        let index = fragment_index(&[
            ("a.graphql", "fragment A on User { ...B }"),
            ("b.graphql", "fragment B on User { ...A }"),
        ]);

        let document = parse("{ me { ...A } }");
        let first = fragment_dependencies(&document, &index);
        let second = fragment_dependencies(&document, &index);
        assert_eq!(names(&first), vec!["A", "B"]);
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_unknown_fragments_are_skipped() {
        let index = fragment_index(&[("a.graphql", "fragment A on User { id }")]);
        let document = parse("{ me { ...Missing ...A } }");
        assert_eq!(names(&fragment_dependencies(&document, &index)), vec!["A"]);
    }

    #[test]
    fn test_type_dependencies() {
        let sdl = "type User implements Node { id: ID! friend: Friend }\ninterface Node { id: ID! }\ntype Friend { since: Date }\nscalar Date\ntype Unused { x: Int }";
        let content = CachedContent::new(sdl, Range::default());
        let (_, types) = index_document(std::path::Path::new("schema.graphql"), &content, &parse(sdl));
        let index: HashMap<String, ObjectTypeInfo> = types
            .into_iter()
            .map(|info| (info.name().to_string(), info))
            .collect();

        let document = parse("query ($id: ID) { node { ... on User { id } } }");
        let mut found: Vec<String> = type_dependencies(&document, &index)
            .iter()
            .map(|info| info.name().to_string())
            .collect();
        found.sort();
        assert_eq!(found, vec!["Date", "Friend", "Node", "User"]);
    }

    #[test]
    fn test_fragment_text_and_range_follow_the_snippet() {
        let query = "\n  fragment A on User { id }\n";
        let content = CachedContent::new(
            query,
            Range::new(Position::new(10, 4), Position::new(12, 0)),
        );
        let (fragments, _) = index_document(std::path::Path::new("a.ts"), &content, &parse(query));
        let fragment = &fragments[0];
        assert_eq!(fragment.text(), "fragment A on User { id }");
        assert_eq!(fragment.range().start, Position::new(11, 2));
    }
}
