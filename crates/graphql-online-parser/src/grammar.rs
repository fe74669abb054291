//! GraphQL grammar as a table of parse rules.
//!
//! A rule is either a sequence of steps or a fork that picks the next rule by
//! looking at the upcoming token. Steps reference other rules by kind or match
//! a single token.

use crate::lexer::{Token, TokenKind};
use crate::stream::{starts_with_word, CharacterStream};
use crate::style::Style;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleKind {
    Document,
    Definition,
    ShortQuery,
    Query,
    Mutation,
    Subscription,
    VariableDefinitions,
    VariableDefinition,
    Variable,
    DefaultValue,
    SelectionSet,
    Selection,
    AliasedField,
    Field,
    Arguments,
    Argument,
    FragmentSpread,
    InlineFragment,
    FragmentDefinition,
    TypeCondition,
    Value,
    NumberValue,
    StringValue,
    BooleanValue,
    NullValue,
    EnumValue,
    ListValue,
    ObjectValue,
    ObjectField,
    Type,
    ListType,
    NonNullType,
    NamedType,
    Directive,
    DirectiveDef,
    DirectiveLocation,
    SchemaDef,
    OperationTypeDef,
    ScalarDef,
    ObjectTypeDef,
    InterfaceDef,
    Implements,
    FieldDef,
    ArgumentsDef,
    InputValueDef,
    UnionDef,
    UnionMember,
    EnumDef,
    EnumValueDef,
    InputDef,
    ExtendDef,
    ExtensionDefinition,
    SchemaExtension,
    ScalarTypeExtension,
    ObjectTypeExtension,
    InterfaceTypeExtension,
    UnionTypeExtension,
    EnumTypeExtension,
    InputObjectTypeExtension,
    Invalid,
    Comment,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Which tokens a terminal accepts
#[derive(Debug, Clone, Copy)]
pub enum TokenMatch {
    /// Any token of the kind
    Kind(TokenKind),
    /// A name with exactly this value
    Word(&'static str),
    /// Punctuation with exactly this value
    Punct(&'static str),
    /// Any name except this one
    NameExcept(&'static str),
}

impl TokenMatch {
    #[must_use]
    pub fn matches(self, token: &Token) -> bool {
        match self {
            Self::Kind(kind) => token.kind == kind,
            Self::Word(word) => token.kind == TokenKind::Name && token.value == word,
            Self::Punct(punct) => token.kind == TokenKind::Punctuation && token.value == punct,
            Self::NameExcept(word) => token.kind == TokenKind::Name && token.value != word,
        }
    }
}

/// State change applied when a terminal matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    None,
    /// Record the token as the frame name
    Name,
    /// Record the token as the frame name and as the type of the frame two levels up
    NamedType,
    /// Enter block-string mode when the token opens `"""` without closing it
    BlockString,
}

#[derive(Debug, Clone, Copy)]
pub struct Terminal {
    pub style: Style,
    pub token: TokenMatch,
    pub update: Update,
}

/// What a step expects: a nested rule or a single token
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    Rule(RuleKind),
    Terminal(Terminal),
}

#[derive(Debug, Clone, Copy)]
pub struct Separator {
    pub terminal: Terminal,
    pub optional: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub matcher: Matcher,
    pub optional: bool,
    pub list: bool,
    pub separator: Option<Separator>,
}

impl Step {
    /// Optional and list steps may be skipped when the token does not fit
    #[must_use]
    pub const fn is_skippable(&self) -> bool {
        self.optional || self.list
    }
}

pub type Fork = fn(&Token, &CharacterStream) -> Option<RuleKind>;

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Sequence(&'static [Step]),
    Fork(Fork),
}

const fn terminal(style: Style, token: TokenMatch, update: Update) -> Terminal {
    Terminal {
        style,
        token,
        update,
    }
}

const fn word(value: &'static str) -> Terminal {
    terminal(Style::Keyword, TokenMatch::Word(value), Update::None)
}

const fn p(value: &'static str) -> Terminal {
    terminal(Style::Punctuation, TokenMatch::Punct(value), Update::None)
}

const fn p_styled(value: &'static str, style: Style) -> Terminal {
    terminal(style, TokenMatch::Punct(value), Update::None)
}

const fn name(style: Style) -> Terminal {
    terminal(style, TokenMatch::Kind(TokenKind::Name), Update::Name)
}

const fn t(kind: TokenKind, style: Style) -> Terminal {
    terminal(style, TokenMatch::Kind(kind), Update::None)
}

const fn step(matcher: Matcher) -> Step {
    Step {
        matcher,
        optional: false,
        list: false,
        separator: None,
    }
}

const fn r(kind: RuleKind) -> Step {
    step(Matcher::Rule(kind))
}

const fn tm(terminal: Terminal) -> Step {
    step(Matcher::Terminal(terminal))
}

const fn opt(mut inner: Step) -> Step {
    inner.optional = true;
    inner
}

const fn list(kind: RuleKind) -> Step {
    let mut inner = r(kind);
    inner.list = true;
    inner
}

const fn list_sep(kind: RuleKind, separator: Terminal) -> Step {
    let mut inner = list(kind);
    inner.separator = Some(Separator {
        terminal: separator,
        optional: false,
    });
    inner
}

use RuleKind as K;

const DOCUMENT: &[Step] = &[list(K::Definition)];
const SHORT_QUERY: &[Step] = &[r(K::SelectionSet)];
const QUERY: &[Step] = &[
    tm(word("query")),
    opt(tm(name(Style::Def))),
    opt(r(K::VariableDefinitions)),
    list(K::Directive),
    r(K::SelectionSet),
];
const MUTATION: &[Step] = &[
    tm(word("mutation")),
    opt(tm(name(Style::Def))),
    opt(r(K::VariableDefinitions)),
    list(K::Directive),
    r(K::SelectionSet),
];
const SUBSCRIPTION: &[Step] = &[
    tm(word("subscription")),
    opt(tm(name(Style::Def))),
    opt(r(K::VariableDefinitions)),
    list(K::Directive),
    r(K::SelectionSet),
];
const VARIABLE_DEFINITIONS: &[Step] = &[tm(p("(")), list(K::VariableDefinition), tm(p(")"))];
const VARIABLE_DEFINITION: &[Step] = &[
    r(K::Variable),
    tm(p(":")),
    r(K::Type),
    opt(r(K::DefaultValue)),
];
const VARIABLE: &[Step] = &[
    tm(p_styled("$", Style::Variable)),
    tm(name(Style::Variable)),
];
const DEFAULT_VALUE: &[Step] = &[tm(p("=")), r(K::Value)];
const SELECTION_SET: &[Step] = &[tm(p("{")), list(K::Selection), tm(p("}"))];
const ALIASED_FIELD: &[Step] = &[
    tm(name(Style::Property)),
    tm(p(":")),
    tm(name(Style::Qualifier)),
    opt(r(K::Arguments)),
    list(K::Directive),
    opt(r(K::SelectionSet)),
];
const FIELD: &[Step] = &[
    tm(name(Style::Property)),
    opt(r(K::Arguments)),
    list(K::Directive),
    opt(r(K::SelectionSet)),
];
const ARGUMENTS: &[Step] = &[tm(p("(")), list(K::Argument), tm(p(")"))];
const ARGUMENT: &[Step] = &[tm(name(Style::Attribute)), tm(p(":")), r(K::Value)];
const FRAGMENT_SPREAD: &[Step] = &[tm(p("...")), tm(name(Style::Def)), list(K::Directive)];
const INLINE_FRAGMENT: &[Step] = &[
    tm(p("...")),
    opt(r(K::TypeCondition)),
    list(K::Directive),
    r(K::SelectionSet),
];
const FRAGMENT_DEFINITION: &[Step] = &[
    tm(word("fragment")),
    opt(tm(terminal(
        Style::Def,
        TokenMatch::NameExcept("on"),
        Update::Name,
    ))),
    r(K::TypeCondition),
    list(K::Directive),
    r(K::SelectionSet),
];
const TYPE_CONDITION: &[Step] = &[tm(word("on")), r(K::NamedType)];
const NUMBER_VALUE: &[Step] = &[tm(t(TokenKind::Number, Style::Number))];
const STRING_VALUE: &[Step] = &[tm(terminal(
    Style::String,
    TokenMatch::Kind(TokenKind::String),
    Update::BlockString,
))];
const BOOLEAN_VALUE: &[Step] = &[tm(t(TokenKind::Name, Style::Builtin))];
const NULL_VALUE: &[Step] = &[tm(t(TokenKind::Name, Style::Keyword))];
const ENUM_VALUE: &[Step] = &[tm(name(Style::String2))];
const LIST_VALUE: &[Step] = &[tm(p("[")), list(K::Value), tm(p("]"))];
const OBJECT_VALUE: &[Step] = &[tm(p("{")), list(K::ObjectField), tm(p("}"))];
const OBJECT_FIELD: &[Step] = &[tm(name(Style::Attribute)), tm(p(":")), r(K::Value)];
const LIST_TYPE: &[Step] = &[tm(p("[")), r(K::Type), tm(p("]")), opt(tm(p("!")))];
const NON_NULL_TYPE: &[Step] = &[r(K::NamedType), opt(tm(p("!")))];
const NAMED_TYPE: &[Step] = &[tm(terminal(
    Style::Atom,
    TokenMatch::Kind(TokenKind::Name),
    Update::NamedType,
))];
const DIRECTIVE: &[Step] = &[
    tm(p_styled("@", Style::Meta)),
    tm(name(Style::Meta)),
    opt(r(K::Arguments)),
];
const DIRECTIVE_DEF: &[Step] = &[
    tm(word("directive")),
    tm(p_styled("@", Style::Meta)),
    tm(name(Style::Meta)),
    opt(r(K::ArgumentsDef)),
    tm(word("on")),
    list_sep(K::DirectiveLocation, p("|")),
];
const DIRECTIVE_LOCATION: &[Step] = &[tm(name(Style::String2))];
const SCHEMA_DEF: &[Step] = &[
    tm(word("schema")),
    list(K::Directive),
    tm(p("{")),
    list(K::OperationTypeDef),
    tm(p("}")),
];
const OPERATION_TYPE_DEF: &[Step] = &[
    tm(name(Style::Keyword)),
    tm(p(":")),
    tm(name(Style::Atom)),
];
const SCALAR_DEF: &[Step] = &[tm(word("scalar")), tm(name(Style::Atom)), list(K::Directive)];
const OBJECT_TYPE_DEF: &[Step] = &[
    tm(word("type")),
    tm(name(Style::Atom)),
    opt(r(K::Implements)),
    list(K::Directive),
    tm(p("{")),
    list(K::FieldDef),
    tm(p("}")),
];
const INTERFACE_DEF: &[Step] = &[
    tm(word("interface")),
    tm(name(Style::Atom)),
    opt(r(K::Implements)),
    list(K::Directive),
    tm(p("{")),
    list(K::FieldDef),
    tm(p("}")),
];
const IMPLEMENTS: &[Step] = &[tm(word("implements")), list_sep(K::NamedType, p("&"))];
const FIELD_DEF: &[Step] = &[
    tm(name(Style::Property)),
    opt(r(K::ArgumentsDef)),
    tm(p(":")),
    r(K::Type),
    list(K::Directive),
];
const ARGUMENTS_DEF: &[Step] = &[tm(p("(")), list(K::InputValueDef), tm(p(")"))];
const INPUT_VALUE_DEF: &[Step] = &[
    tm(name(Style::Attribute)),
    tm(p(":")),
    r(K::Type),
    opt(r(K::DefaultValue)),
    list(K::Directive),
];
const UNION_DEF: &[Step] = &[
    tm(word("union")),
    tm(name(Style::Atom)),
    list(K::Directive),
    tm(p("=")),
    list_sep(K::UnionMember, p("|")),
];
const UNION_MEMBER: &[Step] = &[tm(name(Style::Atom))];
const ENUM_DEF: &[Step] = &[
    tm(word("enum")),
    tm(name(Style::Atom)),
    list(K::Directive),
    tm(p("{")),
    list(K::EnumValueDef),
    tm(p("}")),
];
const ENUM_VALUE_DEF: &[Step] = &[tm(name(Style::String2)), list(K::Directive)];
const INPUT_DEF: &[Step] = &[
    tm(word("input")),
    tm(name(Style::Atom)),
    list(K::Directive),
    tm(p("{")),
    list(K::InputValueDef),
    tm(p("}")),
];
const EXTEND_DEF: &[Step] = &[tm(word("extend")), r(K::ExtensionDefinition)];
const SCHEMA_EXTENSION: &[Step] = &[r(K::SchemaDef)];
const SCALAR_TYPE_EXTENSION: &[Step] = &[r(K::ScalarDef)];
const OBJECT_TYPE_EXTENSION: &[Step] = &[r(K::ObjectTypeDef)];
const INTERFACE_TYPE_EXTENSION: &[Step] = &[r(K::InterfaceDef)];
const UNION_TYPE_EXTENSION: &[Step] = &[r(K::UnionDef)];
const ENUM_TYPE_EXTENSION: &[Step] = &[r(K::EnumDef)];
const INPUT_OBJECT_TYPE_EXTENSION: &[Step] = &[r(K::InputDef)];
const EMPTY: &[Step] = &[];

fn definition(token: &Token, _stream: &CharacterStream) -> Option<RuleKind> {
    Some(match token.value.as_str() {
        "{" => K::ShortQuery,
        "query" => K::Query,
        "mutation" => K::Mutation,
        "subscription" => K::Subscription,
        "fragment" => K::FragmentDefinition,
        "schema" => K::SchemaDef,
        "scalar" => K::ScalarDef,
        "type" => K::ObjectTypeDef,
        "interface" => K::InterfaceDef,
        "union" => K::UnionDef,
        "enum" => K::EnumDef,
        "input" => K::InputDef,
        "extend" => K::ExtendDef,
        "directive" => K::DirectiveDef,
        _ => return None,
    })
}

fn selection(token: &Token, stream: &CharacterStream) -> Option<RuleKind> {
    if token.value == "..." {
        let inline = stream.lookahead(|rest| {
            starts_with_word(rest, "on") || matches!(rest.first(), Some('@' | '{'))
        });
        Some(if inline {
            K::InlineFragment
        } else {
            K::FragmentSpread
        })
    } else if stream.lookahead(|rest| rest.first() == Some(&':')) {
        Some(K::AliasedField)
    } else {
        Some(K::Field)
    }
}

fn value(token: &Token, _stream: &CharacterStream) -> Option<RuleKind> {
    match token.kind {
        TokenKind::Number => Some(K::NumberValue),
        TokenKind::String => Some(K::StringValue),
        TokenKind::Punctuation => match token.value.as_str() {
            "[" => Some(K::ListValue),
            "{" => Some(K::ObjectValue),
            "$" => Some(K::Variable),
            "&" => Some(K::NamedType),
            _ => None,
        },
        TokenKind::Name => Some(match token.value.as_str() {
            "true" | "false" => K::BooleanValue,
            "null" => K::NullValue,
            _ => K::EnumValue,
        }),
        TokenKind::Comment => None,
    }
}

fn type_rule(token: &Token, _stream: &CharacterStream) -> Option<RuleKind> {
    Some(if token.value == "[" {
        K::ListType
    } else {
        K::NonNullType
    })
}

fn extension_definition(token: &Token, _stream: &CharacterStream) -> Option<RuleKind> {
    match token.value.as_str() {
        "schema" => Some(K::SchemaExtension),
        "scalar" => Some(K::ScalarTypeExtension),
        "type" => Some(K::ObjectTypeExtension),
        "interface" => Some(K::InterfaceTypeExtension),
        "union" => Some(K::UnionTypeExtension),
        "enum" => Some(K::EnumTypeExtension),
        "input" => Some(K::InputObjectTypeExtension),
        _ => None,
    }
}

impl RuleKind {
    /// The rule this kind expands to
    #[must_use]
    pub fn rule(self) -> Rule {
        let steps = match self {
            K::Definition => return Rule::Fork(definition),
            K::Selection => return Rule::Fork(selection),
            K::Value => return Rule::Fork(value),
            K::Type => return Rule::Fork(type_rule),
            K::ExtensionDefinition => return Rule::Fork(extension_definition),
            K::Document => DOCUMENT,
            K::ShortQuery => SHORT_QUERY,
            K::Query => QUERY,
            K::Mutation => MUTATION,
            K::Subscription => SUBSCRIPTION,
            K::VariableDefinitions => VARIABLE_DEFINITIONS,
            K::VariableDefinition => VARIABLE_DEFINITION,
            K::Variable => VARIABLE,
            K::DefaultValue => DEFAULT_VALUE,
            K::SelectionSet => SELECTION_SET,
            K::AliasedField => ALIASED_FIELD,
            K::Field => FIELD,
            K::Arguments => ARGUMENTS,
            K::Argument => ARGUMENT,
            K::FragmentSpread => FRAGMENT_SPREAD,
            K::InlineFragment => INLINE_FRAGMENT,
            K::FragmentDefinition => FRAGMENT_DEFINITION,
            K::TypeCondition => TYPE_CONDITION,
            K::NumberValue => NUMBER_VALUE,
            K::StringValue => STRING_VALUE,
            K::BooleanValue => BOOLEAN_VALUE,
            K::NullValue => NULL_VALUE,
            K::EnumValue => ENUM_VALUE,
            K::ListValue => LIST_VALUE,
            K::ObjectValue => OBJECT_VALUE,
            K::ObjectField => OBJECT_FIELD,
            K::ListType => LIST_TYPE,
            K::NonNullType => NON_NULL_TYPE,
            K::NamedType => NAMED_TYPE,
            K::Directive => DIRECTIVE,
            K::DirectiveDef => DIRECTIVE_DEF,
            K::DirectiveLocation => DIRECTIVE_LOCATION,
            K::SchemaDef => SCHEMA_DEF,
            K::OperationTypeDef => OPERATION_TYPE_DEF,
            K::ScalarDef => SCALAR_DEF,
            K::ObjectTypeDef => OBJECT_TYPE_DEF,
            K::InterfaceDef => INTERFACE_DEF,
            K::Implements => IMPLEMENTS,
            K::FieldDef => FIELD_DEF,
            K::ArgumentsDef => ARGUMENTS_DEF,
            K::InputValueDef => INPUT_VALUE_DEF,
            K::UnionDef => UNION_DEF,
            K::UnionMember => UNION_MEMBER,
            K::EnumDef => ENUM_DEF,
            K::EnumValueDef => ENUM_VALUE_DEF,
            K::InputDef => INPUT_DEF,
            K::ExtendDef => EXTEND_DEF,
            K::SchemaExtension => SCHEMA_EXTENSION,
            K::ScalarTypeExtension => SCALAR_TYPE_EXTENSION,
            K::ObjectTypeExtension => OBJECT_TYPE_EXTENSION,
            K::InterfaceTypeExtension => INTERFACE_TYPE_EXTENSION,
            K::UnionTypeExtension => UNION_TYPE_EXTENSION,
            K::EnumTypeExtension => ENUM_TYPE_EXTENSION,
            K::InputObjectTypeExtension => INPUT_OBJECT_TYPE_EXTENSION,
            K::Invalid | K::Comment => EMPTY,
        };
        Rule::Sequence(steps)
    }

    /// Operation definition kinds
    #[must_use]
    pub const fn is_operation(self) -> bool {
        matches!(self, K::ShortQuery | K::Query | K::Mutation | K::Subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, value: &str) -> Token {
        Token {
            kind,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_selection_fork_uses_lookahead() {
        let spread = token(TokenKind::Punctuation, "...");
        let mut stream = CharacterStream::new("... on User");
        stream.consume(3);
        assert_eq!(selection(&spread, &stream), Some(K::InlineFragment));

        let mut stream = CharacterStream::new("...UserFields");
        stream.consume(3);
        assert_eq!(selection(&spread, &stream), Some(K::FragmentSpread));

        let field = token(TokenKind::Name, "alias");
        let mut stream = CharacterStream::new("alias , : name");
        stream.consume(5);
        assert_eq!(selection(&field, &stream), Some(K::AliasedField));
    }

    #[test]
    fn test_value_fork() {
        let stream = CharacterStream::new("");
        assert_eq!(
            value(&token(TokenKind::Name, "true"), &stream),
            Some(K::BooleanValue)
        );
        assert_eq!(
            value(&token(TokenKind::Name, "null"), &stream),
            Some(K::NullValue)
        );
        assert_eq!(
            value(&token(TokenKind::Name, "RED"), &stream),
            Some(K::EnumValue)
        );
        assert_eq!(
            value(&token(TokenKind::Punctuation, ")"), &stream),
            None
        );
    }

    #[test]
    fn test_fragment_name_excludes_on() {
        let Matcher::Terminal(name) = FRAGMENT_DEFINITION[1].matcher else {
            panic!("fragment name should be a terminal");
        };
        assert!(name.token.matches(&token(TokenKind::Name, "UserFields")));
        assert!(!name.token.matches(&token(TokenKind::Name, "on")));
    }
}
