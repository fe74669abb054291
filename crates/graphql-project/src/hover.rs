use crate::type_info::{context_token, deprecation_reason, resolve_type_info, TypeInfo};
use apollo_compiler::ast::DirectiveList;
use apollo_compiler::Schema;
use graphql_extract::{Position, Range};
use graphql_online_parser::{RuleKind, State, Style};

/// Information to display when hovering over a GraphQL element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    /// Markdown formatted content to display
    pub contents: String,
    /// The token the hover describes
    pub range: Option<Range>,
}

impl HoverInfo {
    #[must_use]
    pub const fn new(contents: String, range: Option<Range>) -> Self {
        Self { contents, range }
    }
}

/// Describe the schema element under `cursor`
#[must_use]
pub fn hover(schema: &Schema, text: &str, cursor: Position) -> Option<HoverInfo> {
    let token = context_token(text, cursor);
    if matches!(token.style, Some(Style::Comment | Style::Whitespace) | None) {
        return None;
    }

    let state = &token.state;
    let info = resolve_type_info(schema, state);
    let contents = describe(state, &info)?;
    let range = Range::new(
        Position::new(cursor.line, token.start),
        Position::new(cursor.line, token.end),
    );
    Some(HoverInfo::new(contents, Some(range)))
}

fn describe(state: &State, info: &TypeInfo<'_>) -> Option<String> {
    let kind = state.kind()?;
    let step = state.step();

    match kind {
        RuleKind::Field | RuleKind::AliasedField
            if (kind == RuleKind::Field && step == 0)
                || (kind == RuleKind::AliasedField && step == 2) =>
        {
            let field = info.field_def?;
            let signature = match info.parent_type {
                Some(parent) if !field.name.starts_with("__") => {
                    format!("{}.{}: {}", parent.name(), field.name, field.ty)
                }
                _ => format!("{}: {}", field.name, field.ty),
            };
            Some(render(
                &signature,
                field.description.as_deref(),
                Some(&field.directives),
            ))
        }
        RuleKind::ObjectField if step == 0 => {
            let field = info.object_field_def?;
            let parent = info.object_field_defs?;
            let signature = format!("{}.{}: {}", parent.name, field.name, field.ty);
            Some(render(
                &signature,
                field.description.as_deref(),
                Some(&field.directives),
            ))
        }
        RuleKind::Directive if step == 1 => {
            let directive = info.directive_def?;
            Some(render(
                &format!("@{}", directive.name),
                directive.description.as_deref(),
                None,
            ))
        }
        RuleKind::Argument if step == 0 => {
            let argument = info.arg_def?;
            let owner = state
                .parent(state.current())
                .and_then(|arguments| state.parent(arguments))
                .and_then(|owner| owner.kind);
            let signature = match owner {
                Some(RuleKind::Directive) => format!(
                    "@{}({}: {})",
                    info.directive_def?.name,
                    argument.name,
                    argument.ty
                ),
                _ => {
                    let field = info.field_def?;
                    let parent = info
                        .parent_type
                        .map(|parent| format!("{}.", parent.name()))
                        .unwrap_or_default();
                    format!("{parent}{}({}: {})", field.name, argument.name, argument.ty)
                }
            };
            Some(render(
                &signature,
                argument.description.as_deref(),
                Some(&argument.directives),
            ))
        }
        RuleKind::EnumValue => {
            let value = info.enum_value?;
            let enum_type = info.named_input_type()?;
            Some(render(
                &format!("{}.{}", enum_type.name(), value.value),
                value.description.as_deref(),
                Some(&value.directives),
            ))
        }
        RuleKind::NamedType => {
            let ty = info.ty.as_ref()?;
            let named = info.schema.types.get(ty.inner_named_type())?;
            let description = named.description().map(|description| description.to_string());
            Some(render(named.name(), description.as_deref(), None))
        }
        RuleKind::Variable => {
            let name = state.name()?;
            let ty = info.ty.as_ref()?;
            Some(render(&format!("${name}: {ty}"), None, None))
        }
        _ => None,
    }
}

fn render(signature: &str, description: Option<&str>, directives: Option<&DirectiveList>) -> String {
    let mut contents = format!("```graphql\n{signature}\n```");
    if let Some(description) = description.filter(|description| !description.is_empty()) {
        contents.push_str("\n\n");
        contents.push_str(description);
    }
    if let Some(reason) = directives.and_then(deprecation_reason) {
        contents.push_str("\n\nDeprecated: ");
        contents.push_str(&reason);
    }
    contents
}
