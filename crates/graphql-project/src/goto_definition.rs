use crate::dependencies::{
    definition_range, is_type_definition, type_dependencies, FragmentInfo, ObjectTypeInfo,
};
use crate::location::span_range;
use crate::type_info::{context_token, resolve_type_info};
use apollo_compiler::ast::{self, Definition};
use apollo_compiler::Schema;
use graphql_extract::{CachedContent, Position, Range};
use graphql_online_parser::RuleKind;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Location information for go-to-definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionLocation {
    /// File path where the definition is located
    pub file_path: PathBuf,
    /// Range of the definition, in that file's coordinates
    pub range: Range,
}

impl DefinitionLocation {
    #[must_use]
    pub const fn new(file_path: PathBuf, range: Range) -> Self {
        Self { file_path, range }
    }
}

/// What a definition request may resolve against
#[derive(Debug, Clone, Copy)]
pub struct DefinitionIndex<'a> {
    pub schema: Option<&'a Schema>,
    pub fragments: &'a HashMap<String, FragmentInfo>,
    pub types: &'a HashMap<String, ObjectTypeInfo>,
    /// Generated SDL file to point at when a type has no source file of its own
    pub lookup_file: Option<&'a Path>,
}

/// Find where the element under `cursor` is defined.
///
/// `cursor` is relative to `content`; the returned ranges are in host-file
/// coordinates. Handles fragment spreads, named types and fields.
#[must_use]
pub fn goto_definition(
    file_path: &Path,
    content: &CachedContent,
    cursor: Position,
    index: &DefinitionIndex<'_>,
) -> Vec<DefinitionLocation> {
    let token = context_token(&content.query, cursor);
    let state = &token.state;

    match state.kind() {
        Some(RuleKind::FragmentSpread) if state.step() >= 1 => state
            .name()
            .and_then(|name| fragment_definition(file_path, content, name, index))
            .into_iter()
            .collect(),
        Some(RuleKind::NamedType) => state
            .name()
            .and_then(|name| type_definition(file_path, content, name, index))
            .into_iter()
            .collect(),
        Some(RuleKind::Field | RuleKind::AliasedField) => {
            let Some(schema) = index.schema else {
                return Vec::new();
            };
            let info = resolve_type_info(schema, state);
            let (Some(parent), Some(field)) = (info.parent_type, info.field_def) else {
                return Vec::new();
            };
            field_definition(parent.name(), field.name.as_str(), index)
                .into_iter()
                .collect()
        }
        _ => Vec::new(),
    }
}

fn parse_partial(file_path: &Path, content: &CachedContent) -> ast::Document {
    match ast::Document::parse(content.query.as_str(), file_path) {
        Ok(document) => document,
        Err(with_errors) => with_errors.partial,
    }
}

fn fragment_definition(
    file_path: &Path,
    content: &CachedContent,
    name: &str,
    index: &DefinitionIndex<'_>,
) -> Option<DefinitionLocation> {
    let document = parse_partial(file_path, content);
    let local = document.definitions.iter().find_map(|definition| match definition {
        Definition::FragmentDefinition(fragment) if fragment.name.as_str() == name => Some(FragmentInfo {
            file_path: file_path.to_path_buf(),
            content: content.clone(),
            definition: fragment.clone(),
        }),
        _ => None,
    });

    let fragment = local.as_ref().or_else(|| index.fragments.get(name))?;
    Some(DefinitionLocation::new(
        fragment.file_path.clone(),
        fragment.range(),
    ))
}

/// A type defined in the snippet itself, else one the snippet depends on,
/// else its entry in the generated lookup file
fn type_definition(
    file_path: &Path,
    content: &CachedContent,
    name: &str,
    index: &DefinitionIndex<'_>,
) -> Option<DefinitionLocation> {
    let document = parse_partial(file_path, content);
    let defined_here = |definition: &&Definition| {
        is_type_definition(definition)
            && definition.name().is_some_and(|defined| defined.as_str() == name)
    };
    if let Some(definition) = document.definitions.iter().find(defined_here) {
        return Some(DefinitionLocation::new(
            file_path.to_path_buf(),
            definition_range(content, definition.location()),
        ));
    }

    if let Some(info) = type_dependencies(&document, index.types)
        .into_iter()
        .find(|info| info.name() == name)
    {
        let range = info.range();
        return Some(DefinitionLocation::new(info.file_path, range));
    }

    let lookup = index.lookup_file?;
    let text = std::fs::read_to_string(lookup).ok()?;
    let document = ast::Document::parse(text.as_str(), lookup).ok()?;
    document
        .definitions
        .iter()
        .find(|definition| definition.name().is_some_and(|defined| defined.as_str() == name))
        .and_then(Definition::location)
        .map(|span| DefinitionLocation::new(lookup.to_path_buf(), span_range(&text, span)))
}

fn field_definition(
    type_name: &str,
    field_name: &str,
    index: &DefinitionIndex<'_>,
) -> Option<DefinitionLocation> {
    let info = index.types.get(type_name)?;
    let fields = match &info.definition {
        Definition::ObjectTypeDefinition(object) => &object.fields,
        Definition::InterfaceTypeDefinition(interface) => &interface.fields,
        _ => return None,
    };
    let field = fields
        .iter()
        .find(|field| field.name.as_str() == field_name)?;
    Some(DefinitionLocation::new(
        info.file_path.clone(),
        definition_range(&info.content, field.location()),
    ))
}
