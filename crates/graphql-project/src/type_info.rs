//! Schema context at a cursor position.
//!
//! The online parser leaves a stack of grammar frames at every token. Folding
//! that stack from the root down against the schema recovers which type,
//! field, argument or directive the cursor is inside, even when the document
//! does not parse.

use apollo_compiler::ast::{
    DirectiveDefinition, DirectiveList, EnumValueDefinition, FieldDefinition,
    InputValueDefinition, OperationType, Type,
};
use apollo_compiler::schema::{ExtendedType, InputObjectType};
use apollo_compiler::{Name, Node, Schema};
use graphql_extract::Position;
use graphql_online_parser::{run_online_parser, RuleKind, State, Style};
use std::ops::ControlFlow;

pub(crate) const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Everything known about the schema at one position.
///
/// Any slot may be empty; that means there is no context of that kind, not
/// that something went wrong.
#[derive(Debug, Clone)]
pub struct TypeInfo<'s> {
    pub schema: &'s Schema,
    /// Type of the innermost field, variable or named type, possibly wrapped
    pub ty: Option<Type>,
    /// Named composite type whose selection set encloses the position
    pub parent_type: Option<&'s ExtendedType>,
    /// Expected type of the value being written, possibly wrapped
    pub input_type: Option<Type>,
    pub field_def: Option<&'s FieldDefinition>,
    pub arg_def: Option<&'s InputValueDefinition>,
    pub arg_defs: Option<&'s [Node<InputValueDefinition>]>,
    pub directive_def: Option<&'s DirectiveDefinition>,
    pub enum_value: Option<&'s EnumValueDefinition>,
    pub object_field_defs: Option<&'s InputObjectType>,
    pub object_field_def: Option<&'s InputValueDefinition>,
    /// Name of the object type being defined in SDL
    pub object_type_def: Option<String>,
    /// Name of the interface being defined in SDL
    pub interface_def: Option<String>,
}

impl<'s> TypeInfo<'s> {
    const fn empty(schema: &'s Schema) -> Self {
        Self {
            schema,
            ty: None,
            parent_type: None,
            input_type: None,
            field_def: None,
            arg_def: None,
            arg_defs: None,
            directive_def: None,
            enum_value: None,
            object_field_defs: None,
            object_field_def: None,
            object_type_def: None,
            interface_def: None,
        }
    }

    /// The named form of `input_type`
    #[must_use]
    pub fn named_input_type(&self) -> Option<&'s ExtendedType> {
        self.input_type
            .as_ref()
            .and_then(|ty| self.schema.types.get(ty.inner_named_type()))
    }
}

/// Replay the frames of `state` against `schema`
#[must_use]
pub fn resolve_type_info<'s>(schema: &'s Schema, state: &State) -> TypeInfo<'s> {
    let mut info = TypeInfo::empty(schema);

    for frame in state.stack() {
        let Some(kind) = frame.kind else {
            continue;
        };
        let name = frame.name.as_deref();

        match kind {
            RuleKind::Query | RuleKind::ShortQuery => {
                info.ty = root_type(schema, OperationType::Query).map(named);
            }
            RuleKind::Mutation => {
                info.ty = root_type(schema, OperationType::Mutation).map(named);
            }
            RuleKind::Subscription => {
                info.ty = root_type(schema, OperationType::Subscription).map(named);
            }
            RuleKind::InlineFragment | RuleKind::FragmentDefinition => {
                if let Some(type_name) = frame.type_name.as_deref() {
                    info.ty = schema
                        .types
                        .get(type_name)
                        .map(|ty| named(ty.name()));
                }
            }
            RuleKind::Field | RuleKind::AliasedField => match (&info.ty, name) {
                (Some(_), Some(name)) => {
                    info.field_def = info
                        .parent_type
                        .and_then(|parent| field_definition(schema, parent.name(), name));
                    info.ty = info.field_def.map(|field| field.ty.clone());
                }
                _ => info.field_def = None,
            },
            RuleKind::SelectionSet => {
                info.parent_type = info
                    .ty
                    .as_ref()
                    .and_then(|ty| schema.types.get(ty.inner_named_type()));
            }
            RuleKind::Directive => {
                info.directive_def = name.and_then(|name| directive_definition(schema, name));
            }
            RuleKind::InterfaceDef => {
                if let Some(name) = name {
                    info.object_type_def = None;
                    info.interface_def = Some(name.to_string());
                }
            }
            RuleKind::ObjectTypeDef => {
                if let Some(name) = name {
                    info.interface_def = None;
                    info.object_type_def = Some(name.to_string());
                }
            }
            RuleKind::Arguments => {
                let parent = state.parent(frame);
                info.arg_defs = match parent.and_then(|parent| parent.kind) {
                    Some(RuleKind::Field) => info.field_def.map(|field| field.arguments.as_slice()),
                    Some(RuleKind::Directive) => info
                        .directive_def
                        .map(|directive| directive.arguments.as_slice()),
                    Some(RuleKind::AliasedField) => parent
                        .and_then(|parent| parent.name.as_deref())
                        .zip(info.parent_type)
                        .and_then(|(field, parent_type)| {
                            field_definition(schema, parent_type.name(), field)
                        })
                        .map(|field| field.arguments.as_slice()),
                    _ => None,
                };
            }
            RuleKind::Argument => {
                info.arg_def = info.arg_defs.and_then(|args| {
                    args.iter()
                        .find(|arg| Some(arg.name.as_str()) == name)
                        .map(|arg| &**arg)
                });
                info.input_type = info.arg_def.map(|arg| Type::clone(&arg.ty));
            }
            RuleKind::VariableDefinition | RuleKind::Variable => {
                info.ty = info.input_type.clone();
            }
            RuleKind::EnumValue => {
                info.enum_value = match info.named_input_type() {
                    Some(ExtendedType::Enum(enum_type)) => name.and_then(|name| {
                        enum_type
                            .values
                            .get(name)
                            .map(|value| -> &EnumValueDefinition { value })
                    }),
                    _ => None,
                };
            }
            RuleKind::ListValue => {
                info.input_type = match &info.input_type {
                    Some(Type::List(item) | Type::NonNullList(item)) => Some(Type::clone(item)),
                    _ => None,
                };
            }
            RuleKind::ObjectValue => {
                info.object_field_defs = match info.named_input_type() {
                    Some(ExtendedType::InputObject(input)) => Some(input),
                    _ => None,
                };
            }
            RuleKind::ObjectField => {
                info.object_field_def = name.zip(info.object_field_defs).and_then(
                    |(name, input)| {
                        input
                            .fields
                            .get(name)
                            .map(|field| -> &InputValueDefinition { field })
                    },
                );
                info.input_type = info.object_field_def.map(|field| Type::clone(&field.ty));
                info.ty = info.input_type.clone();
            }
            RuleKind::NamedType => {
                if let Some(name) = name {
                    info.ty = schema.types.get(name).map(|ty| named(ty.name()));
                }
            }
            _ => {}
        }
    }

    info
}

fn named(name: &Name) -> Type {
    Type::Named(name.clone())
}

/// Name of the root type for `operation`
pub(crate) fn root_type(schema: &Schema, operation: OperationType) -> Option<&Name> {
    let root = match operation {
        OperationType::Query => schema.schema_definition.query.as_ref(),
        OperationType::Mutation => schema.schema_definition.mutation.as_ref(),
        OperationType::Subscription => schema.schema_definition.subscription.as_ref(),
    }?;
    Some(&root.name)
}

/// A field of a composite type, including the introspection meta fields
pub(crate) fn field_definition<'s>(
    schema: &'s Schema,
    type_name: &str,
    field_name: &str,
) -> Option<&'s FieldDefinition> {
    let field: &'s FieldDefinition = schema.type_field(type_name, field_name).ok()?;
    Some(field)
}

pub(crate) fn directive_definition<'s>(
    schema: &'s Schema,
    name: &str,
) -> Option<&'s DirectiveDefinition> {
    let directive: &'s DirectiveDefinition = schema.directive_definitions.get(name)?;
    Some(directive)
}

/// Reason given by `@deprecated`, if the directive is present
pub(crate) fn deprecation_reason(directives: &DirectiveList) -> Option<String> {
    let directive = directives.get("deprecated")?;
    let reason = directive
        .specified_argument_by_name("reason")
        .and_then(|value| value.as_str())
        .unwrap_or(DEFAULT_DEPRECATION_REASON);
    Some(reason.to_string())
}

pub(crate) const fn is_composite(ty: &ExtendedType) -> bool {
    matches!(
        ty,
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_)
    )
}

pub(crate) const fn is_abstract(ty: &ExtendedType) -> bool {
    matches!(ty, ExtendedType::Interface(_) | ExtendedType::Union(_))
}

pub(crate) const fn is_input(ty: &ExtendedType) -> bool {
    matches!(
        ty,
        ExtendedType::Scalar(_) | ExtendedType::Enum(_) | ExtendedType::InputObject(_)
    )
}

pub(crate) const fn is_output(ty: &ExtendedType) -> bool {
    !matches!(ty, ExtendedType::InputObject(_))
}

/// Object types a value of `type_name` can be at runtime
pub(crate) fn possible_types<'s>(schema: &'s Schema, type_name: &str) -> Vec<&'s Name> {
    match schema.types.get(type_name) {
        Some(ExtendedType::Object(object)) => vec![&object.name],
        Some(ExtendedType::Union(union)) => union
            .members
            .iter()
            .filter_map(|member| schema.types.get(member.name.as_str()))
            .map(ExtendedType::name)
            .collect(),
        Some(ExtendedType::Interface(_)) => schema
            .types
            .values()
            .filter_map(|ty| match ty {
                ExtendedType::Object(object)
                    if object
                        .implements_interfaces
                        .iter()
                        .any(|interface| interface.name == type_name) =>
                {
                    Some(&object.name)
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether some object type can be both `a` and `b`
pub(crate) fn types_overlap(schema: &Schema, a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let possible_a = possible_types(schema, a);
    possible_types(schema, b)
        .iter()
        .any(|name| possible_a.contains(name))
}

/// The token under the cursor and the parser state after it
#[derive(Debug, Clone)]
pub struct ContextToken {
    pub start: usize,
    pub end: usize,
    pub string: String,
    pub state: State,
    pub style: Option<Style>,
}

/// Parse `text` up to `cursor` and capture the token that ends at or after it
#[must_use]
pub fn context_token(text: &str, cursor: Position) -> ContextToken {
    let mut captured: Option<ContextToken> = None;

    let last = run_online_parser(text, |stream, state, style, line| {
        if captured.is_some() || line != cursor.line || stream.pos() < cursor.character {
            return ControlFlow::Continue(());
        }
        captured = Some(ContextToken {
            start: stream.start(),
            end: stream.pos(),
            string: stream.current(),
            state: state.clone(),
            style,
        });
        ControlFlow::Break(())
    });

    captured.unwrap_or(ContextToken {
        start: last.start,
        end: last.end,
        string: last.string,
        state: last.state,
        style: last.style,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        type Query {
          user(id: ID!, role: Role): User
          search(filter: Filter): [User!]!
        }
        type User {
          name: String
          friends(first: Int): [User]
        }
        enum Role { ADMIN GUEST @deprecated(reason: "Gone") }
        input Filter { role: Role, tags: [String!] }
        directive @tag(label: String) on FIELD
    "#;

    fn schema() -> Schema {
        Schema::parse_and_validate(SDL, "schema.graphql")
            .unwrap()
            .into_inner()
    }

    fn info_at<'s>(schema: &'s Schema, text: &str) -> TypeInfo<'s> {
        let cursor = Position::new(0, text.len());
        resolve_type_info(schema, &context_token(text, cursor).state)
    }

    #[test]
    fn test_selection_set_parent_type() {
        let schema = schema();
        let info = info_at(&schema, "{ user { ");
        assert_eq!(info.parent_type.map(|ty| ty.name().as_str()), Some("User"));
        assert_eq!(info.field_def.map(|f| f.name.as_str()), Some("user"));
    }

    #[test]
    fn test_aliased_field_uses_field_name() {
        let schema = schema();
        let info = info_at(&schema, "{ me: user { friends(");
        assert_eq!(info.parent_type.map(|ty| ty.name().as_str()), Some("User"));
        let args: Vec<&str> = info
            .arg_defs
            .unwrap_or_default()
            .iter()
            .map(|arg| arg.name.as_str())
            .collect();
        assert_eq!(args, vec!["first"]);
    }

    #[test]
    fn test_argument_input_type() {
        let schema = schema();
        let info = info_at(&schema, "{ user(role: ");
        assert_eq!(info.arg_def.map(|arg| arg.name.as_str()), Some("role"));
        assert_eq!(info.input_type.map(|ty| ty.to_string()), Some("Role".into()));
    }

    #[test]
    fn test_nested_input_object_and_list() {
        let schema = schema();
        let info = info_at(&schema, "{ search(filter: { tags: [");
        assert_eq!(info.input_type.map(|ty| ty.to_string()), Some("String!".into()));

        let info = info_at(&schema, "{ search(filter: { role: ADM");
        assert_eq!(
            info.object_field_def.map(|field| field.name.as_str()),
            Some("role")
        );
    }

    #[test]
    fn test_enum_value_lookup() {
        let schema = schema();
        let info = info_at(&schema, "{ user(role: GUEST");
        let value = info.enum_value.unwrap();
        assert_eq!(value.value.as_str(), "GUEST");
        assert_eq!(
            deprecation_reason(&value.directives).as_deref(),
            Some("Gone")
        );
    }

    #[test]
    fn test_directive_arguments() {
        let schema = schema();
        let info = info_at(&schema, "{ user @tag(");
        assert_eq!(info.directive_def.map(|d| d.name.as_str()), Some("tag"));
        assert_eq!(info.arg_defs.map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_unknown_field_leaves_context_empty() {
        let schema = schema();
        let info = info_at(&schema, "{ nope { ");
        assert!(info.field_def.is_none());
        assert!(info.parent_type.is_none());
    }

    #[test]
    fn test_fragment_type_condition() {
        let schema = schema();
        let info = info_at(&schema, "fragment F on User { ");
        assert_eq!(info.parent_type.map(|ty| ty.name().as_str()), Some("User"));
    }

    #[test]
    fn test_possible_types_and_overlap() {
        let schema = Schema::parse_and_validate(
            "type Query { a: Int } interface Node { id: ID } type A implements Node { id: ID } type B { id: ID } union U = A | B",
            "s.graphql",
        )
        .unwrap()
        .into_inner();
        assert_eq!(possible_types(&schema, "Node").len(), 1);
        assert_eq!(possible_types(&schema, "U").len(), 2);
        assert!(types_overlap(&schema, "Node", "U"));
        assert!(!types_overlap(&schema, "Node", "B"));
    }

    #[test]
    fn test_context_token_at_cursor() {
        let token = context_token("{ user }", Position::new(0, 4));
        assert_eq!(token.string, "user");
        assert_eq!(token.state.kind(), Some(RuleKind::Field));

        let token = context_token("{ user }", Position::new(0, 2));
        assert_eq!(token.string, " ");
        assert_eq!(token.state.kind(), Some(RuleKind::SelectionSet));
    }
}
