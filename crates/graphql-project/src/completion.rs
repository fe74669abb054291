#![allow(clippy::too_many_lines)]

use crate::dependencies::FragmentInfo;
use crate::type_info::{
    context_token, deprecation_reason, is_abstract, is_composite, is_input, is_output,
    possible_types, resolve_type_info, root_type, types_overlap, ContextToken, TypeInfo,
};
use apollo_compiler::ast::{self, DirectiveLocation, InputValueDefinition, OperationType};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::{Node, Schema};
use graphql_extract::Position;
use graphql_online_parser::{run_online_parser, Frame, RuleKind, State};
use std::collections::HashSet;
use std::ops::ControlFlow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum CompletionItemKind {
    Keyword,
    Field,
    Type,
    Fragment,
    Directive,
    EnumValue,
    Argument,
    Variable,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    pub detail: Option<String>,
    pub documentation: Option<String>,
    pub deprecated: bool,
    pub deprecation_reason: Option<String>,
    pub insert_text: Option<String>,
}

impl CompletionItem {
    #[must_use]
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
            deprecated: false,
            deprecation_reason: None,
            insert_text: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn with_documentation(mut self, documentation: Option<impl Into<String>>) -> Self {
        self.documentation = documentation.map(Into::into);
        self
    }

    #[must_use]
    pub fn with_deprecation(mut self, reason: Option<String>) -> Self {
        self.deprecated = reason.is_some();
        self.deprecation_reason = reason;
        self
    }

    #[must_use]
    pub fn with_insert_text(mut self, text: impl Into<String>) -> Self {
        self.insert_text = Some(text.into());
        self
    }
}

/// What kind of definitions a document holds, judged from what parses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentMode {
    Empty,
    Executable,
    TypeSystem,
    Mixed,
}

fn document_mode(text: &str) -> DocumentMode {
    let document = match ast::Document::parse(text, "document.graphql") {
        Ok(document) => document,
        Err(with_errors) => with_errors.partial,
    };
    let executable = document
        .definitions
        .iter()
        .any(ast::Definition::is_executable_definition);
    let type_system = document
        .definitions
        .iter()
        .any(|definition| !definition.is_executable_definition());

    match (executable, type_system) {
        (false, false) => DocumentMode::Empty,
        (true, false) => DocumentMode::Executable,
        (false, true) => DocumentMode::TypeSystem,
        (true, true) => DocumentMode::Mixed,
    }
}

const EXECUTABLE_KEYWORDS: &[(&str, &str)] = &[
    ("query", "Query"),
    ("mutation", "Mutation"),
    ("subscription", "Subscription"),
    ("fragment", "Fragment"),
    ("{", "Anonymous query"),
];

const TYPE_SYSTEM_KEYWORDS: &[(&str, &str)] = &[
    ("extend", "Extend a type or schema"),
    ("type", "Object type"),
    ("interface", "Interface type"),
    ("union", "Union type"),
    ("enum", "Enum type"),
    ("input", "Input object type"),
    ("scalar", "Scalar type"),
    ("schema", "Schema definition"),
    ("directive", "Directive definition"),
];

const EXTENSION_KEYWORDS: &[(&str, &str)] = &[
    ("type", "Extend an object type"),
    ("interface", "Extend an interface"),
    ("union", "Extend a union"),
    ("enum", "Extend an enum"),
    ("input", "Extend an input object"),
    ("scalar", "Extend a scalar"),
    ("schema", "Extend the schema"),
];

fn keywords(list: &[(&str, &str)]) -> Vec<CompletionItem> {
    list.iter()
        .map(|(label, detail)| {
            CompletionItem::new(*label, CompletionItemKind::Keyword).with_detail(*detail)
        })
        .collect()
}

/// Completion candidates for `cursor` in `text`, ranked against the word being typed.
///
/// `fragments` are fragment definitions from elsewhere in the project; the
/// ones defined in `text` are found by scanning it.
#[must_use]
pub fn suggestions(
    schema: &Schema,
    text: &str,
    cursor: Position,
    fragments: &[FragmentInfo],
) -> Vec<CompletionItem> {
    let token = context_token(text, cursor);
    let state = &token.state;

    let mut frame = state.current();
    if frame.kind == Some(RuleKind::Invalid) {
        match state.parent(frame) {
            Some(parent) => frame = parent,
            None => return Vec::new(),
        }
    }
    let Some(kind) = frame.kind else {
        return Vec::new();
    };
    let step = frame.step;
    let prev = state.parent(frame);
    let prev_kind = prev.and_then(|prev| prev.kind);

    let info = resolve_type_info(schema, state);

    if kind == RuleKind::Document {
        let list = match document_mode(text) {
            DocumentMode::Empty | DocumentMode::Executable => keywords(EXECUTABLE_KEYWORDS),
            DocumentMode::TypeSystem => keywords(TYPE_SYSTEM_KEYWORDS),
            DocumentMode::Mixed => {
                let mut list = keywords(EXECUTABLE_KEYWORDS);
                list.extend(keywords(TYPE_SYSTEM_KEYWORDS));
                list
            }
        };
        return hint_list(&token.string, list);
    }

    if kind == RuleKind::ExtendDef {
        return hint_list(&token.string, keywords(EXTENSION_KEYWORDS));
    }

    // `extend type ` names an existing type; past the name there is nothing to offer
    if let Some(extension) = prev_kind.filter(|kind| is_extension(*kind)) {
        if step <= 1 {
            return hint_list(&token.string, extendable_types(schema, extension));
        }
        return Vec::new();
    }

    match kind {
        RuleKind::SelectionSet | RuleKind::Field | RuleKind::AliasedField => {
            return hint_list(&token.string, field_suggestions(&token, &info));
        }
        RuleKind::Arguments => {
            return hint_list(&token.string, argument_suggestions(info.arg_defs));
        }
        RuleKind::Argument if step == 0 => {
            return hint_list(&token.string, argument_suggestions(info.arg_defs));
        }
        RuleKind::ObjectValue | RuleKind::ObjectField
            if info.object_field_defs.is_some()
                && (kind == RuleKind::ObjectValue || step == 0) =>
        {
            let present = written_object_fields(text, cursor);
            let fields = info
                .object_field_defs
                .map(|input| {
                    input
                        .fields
                        .values()
                        .filter(|field| !present.contains(field.name.as_str()))
                        .map(|field| input_value_item(field, CompletionItemKind::Field))
                        .collect()
                })
                .unwrap_or_default();
            return hint_list(&token.string, fields);
        }
        _ => {}
    }

    let in_value = kind == RuleKind::EnumValue
        || (kind == RuleKind::ListValue && step == 1)
        || (kind == RuleKind::ObjectField && step == 2)
        || (kind == RuleKind::Argument && step == 2);
    if in_value {
        return hint_list(&token.string, input_value_suggestions(text, &info));
    }

    if kind == RuleKind::Variable && step == 1 {
        let expected = info.named_input_type().map(|ty| ty.name().to_string());
        let variables = variable_suggestions(text, &token)
            .into_iter()
            .filter(|item| expected.is_none() || item.detail == expected)
            .collect();
        return hint_list(&token.string, variables);
    }

    if (kind == RuleKind::TypeCondition && step == 1)
        || (kind == RuleKind::NamedType && prev_kind == Some(RuleKind::TypeCondition))
    {
        return hint_list(&token.string, type_condition_suggestions(schema, &info));
    }

    if kind == RuleKind::FragmentSpread && step == 1 {
        return hint_list(
            &token.string,
            fragment_spread_suggestions(schema, text, state, &info, fragments),
        );
    }

    let unwrapped = unwrap_type(state, frame);
    if let Some(definition) = unwrapped {
        if definition.kind == Some(RuleKind::FieldDef) && definition.step == 3 {
            return hint_list(&token.string, named_types(schema, is_output));
        }
        if definition.kind == Some(RuleKind::InputValueDef) && definition.step == 2 {
            return hint_list(&token.string, named_types(schema, is_input));
        }
    }

    let variable_type = (kind == RuleKind::VariableDefinition && step == 2)
        || (kind == RuleKind::ListType && step == 1)
        || (kind == RuleKind::NamedType
            && matches!(
                prev_kind,
                Some(RuleKind::VariableDefinition | RuleKind::ListType | RuleKind::NonNullType)
            ));
    if variable_type {
        return hint_list(&token.string, named_types(schema, is_input));
    }

    if kind == RuleKind::Directive {
        let location = prev.and_then(|prev| directive_location(state, prev));
        let directives = schema
            .directive_definitions
            .values()
            .filter(|directive| {
                location.is_some_and(|location| directive.locations.contains(&location))
            })
            .map(|directive| {
                CompletionItem::new(directive.name.as_str(), CompletionItemKind::Directive)
                    .with_documentation(directive.description.as_deref())
            })
            .collect();
        return hint_list(&token.string, directives);
    }

    if kind == RuleKind::DirectiveDef {
        let arguments = frame
            .name
            .as_deref()
            .and_then(|name| schema.directive_definitions.get(name))
            .map(|directive| argument_suggestions(Some(directive.arguments.as_slice())))
            .unwrap_or_default();
        return hint_list(&token.string, arguments);
    }

    Vec::new()
}

const fn is_extension(kind: RuleKind) -> bool {
    matches!(
        kind,
        RuleKind::SchemaExtension
            | RuleKind::ScalarTypeExtension
            | RuleKind::ObjectTypeExtension
            | RuleKind::InterfaceTypeExtension
            | RuleKind::UnionTypeExtension
            | RuleKind::EnumTypeExtension
            | RuleKind::InputObjectTypeExtension
    )
}

/// Existing types an `extend <keyword>` can name
fn extendable_types(schema: &Schema, extension: RuleKind) -> Vec<CompletionItem> {
    let matches_kind = |ty: &ExtendedType| match extension {
        RuleKind::ScalarTypeExtension => matches!(ty, ExtendedType::Scalar(_)),
        RuleKind::ObjectTypeExtension => matches!(ty, ExtendedType::Object(_)),
        RuleKind::InterfaceTypeExtension => matches!(ty, ExtendedType::Interface(_)),
        RuleKind::UnionTypeExtension => matches!(ty, ExtendedType::Union(_)),
        RuleKind::EnumTypeExtension => matches!(ty, ExtendedType::Enum(_)),
        RuleKind::InputObjectTypeExtension => matches!(ty, ExtendedType::InputObject(_)),
        _ => false,
    };
    named_types(schema, matches_kind)
}

fn named_types(schema: &Schema, filter: impl Fn(&ExtendedType) -> bool) -> Vec<CompletionItem> {
    schema
        .types
        .values()
        .filter(|ty| !ty.name().starts_with("__") && filter(ty))
        .map(type_item)
        .collect()
}

fn type_item(ty: &ExtendedType) -> CompletionItem {
    CompletionItem::new(ty.name().as_str(), CompletionItemKind::Type)
        .with_documentation(ty.description().map(|description| description.to_string()))
}

fn field_suggestions(token: &ContextToken, info: &TypeInfo<'_>) -> Vec<CompletionItem> {
    let Some(parent) = info.parent_type else {
        return Vec::new();
    };
    let fields = match parent {
        ExtendedType::Object(object) => Some(&object.fields),
        ExtendedType::Interface(interface) => Some(&interface.fields),
        _ => None,
    };

    let mut items: Vec<CompletionItem> = fields
        .into_iter()
        .flat_map(|fields| fields.values())
        .map(|field| {
            CompletionItem::new(field.name.as_str(), CompletionItemKind::Field)
                .with_detail(field.ty.to_string())
                .with_documentation(field.description.as_deref())
                .with_deprecation(deprecation_reason(&field.directives))
        })
        .collect();

    // Meta fields only surface once the user starts typing them
    if token.string.trim_start().starts_with('_') {
        if is_composite(parent) {
            items.push(
                CompletionItem::new("__typename", CompletionItemKind::Field)
                    .with_detail("String!")
                    .with_documentation(Some("The name of the current Object type at runtime.")),
            );
        }
        if root_type(info.schema, OperationType::Query) == Some(parent.name()) {
            items.push(
                CompletionItem::new("__schema", CompletionItemKind::Field)
                    .with_detail("__Schema!")
                    .with_documentation(Some("Access the current type schema of this server.")),
            );
            items.push(
                CompletionItem::new("__type", CompletionItemKind::Field)
                    .with_detail("__Type")
                    .with_documentation(Some("Request the type information of a single type.")),
            );
        }
    }

    items
}

fn input_value_item(value: &InputValueDefinition, kind: CompletionItemKind) -> CompletionItem {
    CompletionItem::new(value.name.as_str(), kind)
        .with_detail(value.ty.to_string())
        .with_documentation(value.description.as_deref())
        .with_deprecation(deprecation_reason(&value.directives))
}

fn argument_suggestions(arguments: Option<&[Node<InputValueDefinition>]>) -> Vec<CompletionItem> {
    arguments
        .unwrap_or_default()
        .iter()
        .map(|argument| input_value_item(argument, CompletionItemKind::Argument))
        .collect()
}

fn input_value_suggestions(text: &str, info: &TypeInfo<'_>) -> Vec<CompletionItem> {
    let named = info.named_input_type();
    let expected = named.map(|ty| ty.name().to_string());
    let mut items: Vec<CompletionItem> = variable_suggestions_in(text, "$")
        .into_iter()
        .filter(|item| expected.is_none() || item.detail == expected)
        .collect();

    match named {
        Some(ExtendedType::Enum(enum_type)) => {
            let values = enum_type.values.values().map(|value| {
                CompletionItem::new(value.value.as_str(), CompletionItemKind::EnumValue)
                    .with_detail(enum_type.name.as_str())
                    .with_documentation(value.description.as_deref())
                    .with_deprecation(deprecation_reason(&value.directives))
            });
            let mut values: Vec<CompletionItem> = values.collect();
            values.append(&mut items);
            values
        }
        Some(ty) if ty.name() == "Boolean" => {
            items.push(
                CompletionItem::new("true", CompletionItemKind::Value)
                    .with_detail("Boolean")
                    .with_documentation(Some("Not false.")),
            );
            items.push(
                CompletionItem::new("false", CompletionItemKind::Value)
                    .with_detail("Boolean")
                    .with_documentation(Some("Not true.")),
            );
            items
        }
        _ => items,
    }
}

fn variable_suggestions(text: &str, token: &ContextToken) -> Vec<CompletionItem> {
    variable_suggestions_in(text, &token.string)
}

/// Variables declared anywhere in `text`, with their named type as detail
fn variable_suggestions_in(text: &str, typed: &str) -> Vec<CompletionItem> {
    let mut variables: Vec<(String, String)> = Vec::new();
    let mut pending: Option<String> = None;

    run_online_parser(text, |_, state, _, _| {
        let current = state.current();
        match (current.kind, current.name.as_deref()) {
            (Some(RuleKind::Variable), Some(name))
                if state.parent(current).and_then(|parent| parent.kind)
                    == Some(RuleKind::VariableDefinition) =>
            {
                pending = Some(name.to_string());
            }
            (Some(RuleKind::NamedType), Some(type_name)) => {
                if let Some(name) = pending.take() {
                    if !variables.iter().any(|(existing, _)| *existing == name) {
                        variables.push((name, type_name.to_string()));
                    }
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    });

    variables
        .into_iter()
        .map(|(name, type_name)| {
            let label = format!("${name}");
            let insert = if typed == "$" { name } else { label.clone() };
            CompletionItem::new(label, CompletionItemKind::Variable)
                .with_detail(type_name)
                .with_insert_text(insert)
        })
        .collect()
}

fn type_condition_suggestions(schema: &Schema, info: &TypeInfo<'_>) -> Vec<CompletionItem> {
    let Some(parent) = info.parent_type else {
        return named_types(schema, is_composite);
    };
    if !is_abstract(parent) {
        return vec![type_item(parent)];
    }

    let mut names: Vec<&str> = Vec::new();
    for possible in possible_types(schema, parent.name()) {
        if !names.contains(&possible.as_str()) {
            names.push(possible.as_str());
        }
        if let Some(ExtendedType::Object(object)) = schema.types.get(possible.as_str()) {
            for interface in &object.implements_interfaces {
                if !names.contains(&interface.name.as_str()) {
                    names.push(interface.name.as_str());
                }
            }
        }
    }

    names
        .into_iter()
        .filter_map(|name| schema.types.get(name))
        .map(type_item)
        .collect()
}

fn fragment_spread_suggestions(
    schema: &Schema,
    text: &str,
    state: &State,
    info: &TypeInfo<'_>,
    external: &[FragmentInfo],
) -> Vec<CompletionItem> {
    // Do not offer the fragment being written as a spread of itself
    let defining = state
        .stack()
        .into_iter()
        .rev()
        .find(|frame| frame.kind == Some(RuleKind::FragmentDefinition))
        .and_then(|frame| frame.name.clone());

    let mut fragments = local_fragments(text);
    for fragment in external {
        if !fragments.iter().any(|(name, _)| name == fragment.name()) {
            fragments.push((
                fragment.name().to_string(),
                fragment.type_condition().to_string(),
            ));
        }
    }

    let mut seen = HashSet::new();
    fragments
        .into_iter()
        .filter(|(name, _)| Some(name) != defining.as_ref())
        // Without an enclosing type every fragment is a candidate
        .filter(|(_, type_condition)| {
            info.parent_type.is_none_or(|parent| {
                schema.types.contains_key(type_condition.as_str())
                    && types_overlap(schema, parent.name(), type_condition)
            })
        })
        .filter(|(name, _)| seen.insert(name.clone()))
        .map(|(name, type_condition)| {
            CompletionItem::new(name, CompletionItemKind::Fragment).with_detail(type_condition)
        })
        .collect()
}

/// Field names already written in the object literal that encloses `cursor`
fn written_object_fields(text: &str, cursor: Position) -> HashSet<String> {
    let mut before: Vec<char> = Vec::new();
    for (index, line) in text.split('\n').enumerate() {
        if index == cursor.line {
            before.extend(line.chars().take(cursor.character));
            break;
        }
        before.extend(line.chars());
        before.push('\n');
    }

    let mut depth = 0usize;
    let Some(open) = before.iter().rposition(|ch| match ch {
        '}' | ']' | ')' => {
            depth += 1;
            false
        }
        '{' | '[' | '(' if depth > 0 => {
            depth -= 1;
            false
        }
        '{' => true,
        _ => false,
    }) else {
        return HashSet::new();
    };

    let mut present = HashSet::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut in_string = false;
    depth = 0;
    for &ch in &before[open + 1..] {
        match ch {
            '"' if depth == 0 => in_string = !in_string,
            _ if in_string => {}
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            ':' if !word.is_empty() => {
                present.insert(std::mem::take(&mut word));
            }
            ch if ch.is_alphanumeric() || ch == '_' => {
                if !in_word {
                    word.clear();
                }
                word.push(ch);
            }
            ch if ch.is_whitespace() || ch == ',' => {}
            _ => word.clear(),
        }
        in_word = !in_string && (ch.is_alphanumeric() || ch == '_');
    }
    present
}

/// `(name, type condition)` of every fragment defined in `text`
fn local_fragments(text: &str) -> Vec<(String, String)> {
    let mut fragments: Vec<(String, String)> = Vec::new();
    run_online_parser(text, |_, state, _, _| {
        if state.kind() == Some(RuleKind::FragmentDefinition) {
            if let (Some(name), Some(type_name)) = (state.name(), state.type_name()) {
                if !fragments.iter().any(|(existing, _)| existing == name) {
                    fragments.push((name.to_string(), type_name.to_string()));
                }
            }
        }
        ControlFlow::Continue(())
    });
    fragments
}

/// The definition frame around a type reference, skipping the type wrappers
fn unwrap_type<'a>(state: &'a State, frame: &'a Frame) -> Option<&'a Frame> {
    let mut current = Some(frame);
    while let Some(frame) = current {
        match frame.kind {
            Some(
                RuleKind::NamedType | RuleKind::ListType | RuleKind::Type | RuleKind::NonNullType,
            ) => current = state.parent(frame),
            _ => break,
        }
    }
    current
}

/// Where a directive attached under `frame` would be applied
fn directive_location(state: &State, frame: &Frame) -> Option<DirectiveLocation> {
    Some(match frame.kind? {
        RuleKind::Query | RuleKind::ShortQuery => DirectiveLocation::Query,
        RuleKind::Mutation => DirectiveLocation::Mutation,
        RuleKind::Subscription => DirectiveLocation::Subscription,
        RuleKind::Field | RuleKind::AliasedField => DirectiveLocation::Field,
        RuleKind::FragmentDefinition => DirectiveLocation::FragmentDefinition,
        RuleKind::FragmentSpread => DirectiveLocation::FragmentSpread,
        RuleKind::InlineFragment => DirectiveLocation::InlineFragment,
        RuleKind::VariableDefinition => DirectiveLocation::VariableDefinition,
        RuleKind::SchemaDef => DirectiveLocation::Schema,
        RuleKind::ScalarDef => DirectiveLocation::Scalar,
        RuleKind::ObjectTypeDef => DirectiveLocation::Object,
        RuleKind::FieldDef => DirectiveLocation::FieldDefinition,
        RuleKind::InterfaceDef => DirectiveLocation::Interface,
        RuleKind::UnionDef => DirectiveLocation::Union,
        RuleKind::EnumDef => DirectiveLocation::Enum,
        RuleKind::EnumValueDef => DirectiveLocation::EnumValue,
        RuleKind::InputDef => DirectiveLocation::InputObject,
        RuleKind::InputValueDef => match state.parent(frame)?.kind? {
            RuleKind::ArgumentsDef => DirectiveLocation::ArgumentDefinition,
            RuleKind::InputDef => DirectiveLocation::InputFieldDefinition,
            _ => return None,
        },
        _ => return None,
    })
}

/// Filter and rank `list` against the word being typed.
///
/// With nothing typed, deprecated entries are hidden unless nothing else is
/// left. Otherwise entries are scored by edit distance, with a bonus for
/// prefix matches, and anything scoring above 2 is dropped unless that
/// would empty the list.
#[must_use]
pub fn hint_list(token: &str, list: Vec<CompletionItem>) -> Vec<CompletionItem> {
    let text = normalize(token);

    if text.is_empty() {
        return filter_non_empty(list, |item| !item.deprecated);
    }

    let scored: Vec<(f64, CompletionItem)> = list
        .into_iter()
        .map(|item| (proximity(&normalize(&item.label), &text), item))
        .collect();
    let mut scored = filter_non_empty(scored, |(score, _)| *score <= 2.0);

    scored.sort_by(|(a_score, a), (b_score, b)| {
        a.deprecated
            .cmp(&b.deprecated)
            .then(a_score.total_cmp(b_score))
            .then(a.label.len().cmp(&b.label.len()))
    });
    scored.into_iter().map(|(_, item)| item).collect()
}

fn filter_non_empty<T>(list: Vec<T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
    if list.iter().any(&keep) {
        list.into_iter().filter(|item| keep(item)).collect()
    } else {
        list
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn proximity(suggestion: &str, text: &str) -> f64 {
    let mut score = strsim::osa_distance(text, suggestion) as f64;
    let (suggestion_len, text_len) = (suggestion.chars().count(), text.chars().count());
    if suggestion_len > text_len {
        score -= (suggestion_len - text_len - 1) as f64;
        if !suggestion.starts_with(text) {
            score += 0.5;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        type Query {
          a: String
          b: Int @deprecated(reason: "Use a")
          user(id: ID!, role: Role, active: Boolean): User
          node(id: ID!): Node
        }
        interface Node { id: ID! }
        type User implements Node { id: ID! name: String }
        type Bot implements Node { id: ID! }
        union Actor = User | Bot
        enum Role { ADMIN GUEST }
        input Filter { role: Role tags: [String] }
        type Mutation { save(filter: Filter): Boolean }
        directive @tag(label: String) on FIELD | FRAGMENT_SPREAD
        directive @onType on OBJECT
        directive @meta on ARGUMENT_DEFINITION
    "#;

    fn schema() -> Schema {
        Schema::parse_and_validate(SDL, "schema.graphql")
            .unwrap()
            .into_inner()
    }

    fn labels_at(text: &str, line: usize, character: usize) -> Vec<String> {
        let schema = schema();
        suggestions(&schema, text, Position::new(line, character), &[])
            .into_iter()
            .map(|item| item.label)
            .collect()
    }

    fn labels(text: &str) -> Vec<String> {
        let last_line = text.lines().count().saturating_sub(1);
        let character = text.rsplit('\n').next().map_or(0, str::len);
        labels_at(text, last_line, character)
    }

    #[test]
    fn test_empty_document_offers_keywords() {
        assert_eq!(
            labels(""),
            vec!["query", "mutation", "subscription", "fragment", "{"]
        );
    }

    #[test]
    fn test_partial_keyword_is_ranked() {
        assert_eq!(labels("quer").first().map(String::as_str), Some("query"));
    }

    #[test]
    fn test_fields_hide_deprecated_until_typed() {
        assert_eq!(labels("{ "), vec!["a", "user", "node"]);
        let typed = labels("{ b");
        assert!(typed.contains(&"b".to_string()));
        assert_eq!(typed.last().map(String::as_str), Some("b"));
    }

    #[test]
    fn test_meta_fields_need_underscore() {
        assert!(!labels("{ ").contains(&"__typename".to_string()));
        let typed = labels("{ __");
        assert!(typed.contains(&"__typename".to_string()));
        assert!(typed.contains(&"__schema".to_string()));
    }

    #[test]
    fn test_argument_names() {
        assert_eq!(labels("{ user("), vec!["id", "role", "active"]);
    }

    #[test]
    fn test_enum_and_boolean_values() {
        assert_eq!(labels("{ user(role: "), vec!["ADMIN", "GUEST"]);
        assert_eq!(labels("{ user(active: "), vec!["true", "false"]);
    }

    #[test]
    fn test_variables_matching_expected_type() {
        let text = "query Q($r: Role, $n: Int) { user(role: $";
        let schema = schema();
        let items = suggestions(&schema, text, Position::new(0, text.len()), &[]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "$r");
        assert_eq!(items[0].insert_text.as_deref(), Some("r"));
    }

    #[test]
    fn test_type_conditions_for_abstract_parent() {
        let labels = labels("{ node { ... on ");
        assert!(labels.contains(&"User".to_string()));
        assert!(labels.contains(&"Bot".to_string()));
        assert!(labels.contains(&"Node".to_string()));
        assert!(!labels.contains(&"Query".to_string()));
    }

    #[test]
    fn test_fragment_spreads_filtered_by_type() {
        let text = "fragment U on User { id }\nfragment Q on Query { a }\nquery { node { ...";
        assert_eq!(labels(text), vec!["U"]);
    }

    #[test]
    fn test_fragment_spreads_without_parent_type() {
        let text = "fragment U on User { id }\nfragment B on Bot { id }\nquery { nope { ...";
        assert_eq!(labels(text), vec!["U", "B"]);
    }

    #[test]
    fn test_object_value_fields_skip_written_ones() {
        assert_eq!(labels("mutation { save(filter: { "), vec!["role", "tags"]);
        assert_eq!(
            labels("mutation { save(filter: { role: ADMIN, "),
            vec!["tags"]
        );
    }

    #[test]
    fn test_argument_definition_directives() {
        let labels = labels("type T { f(a: Int @");
        assert!(labels.contains(&"meta".to_string()));
        assert!(!labels.contains(&"tag".to_string()));
        assert!(!labels.contains(&"onType".to_string()));
    }

    #[test]
    fn test_directives_by_location() {
        let mut labels = labels("{ a @");
        labels.sort();
        assert_eq!(labels, vec!["include", "skip", "tag"]);
    }

    #[test]
    fn test_extend_offers_matching_types() {
        assert_eq!(labels("extend enum "), vec!["Role"]);
        assert!(labels("extend type Query ").is_empty());
    }

    #[test]
    fn test_variable_definition_types_are_input_types() {
        let labels = labels("query Q($f: ");
        assert!(labels.contains(&"Filter".to_string()));
        assert!(labels.contains(&"Role".to_string()));
        assert!(!labels.contains(&"User".to_string()));
    }

    #[test]
    fn test_hint_list_prefers_prefix_matches() {
        let list = ["name", "user", "username"]
            .into_iter()
            .map(|label| CompletionItem::new(label, CompletionItemKind::Field))
            .collect();
        let ranked: Vec<String> = hint_list("us", list)
            .into_iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(ranked, vec!["user", "username"]);
    }
}
