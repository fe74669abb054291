use crate::dependencies::{fragment_dependencies, FragmentInfo};
use crate::location::{end_position, span_range};
use crate::type_info::{deprecation_reason, directive_definition, field_definition, root_type};
use crate::{Diagnostic, DiagnosticSource};
use apollo_compiler::ast::{self, Definition, DirectiveList, Selection, Type};
use apollo_compiler::parser::LineColumn;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use apollo_compiler::{Node, Schema};
use graphql_extract::{CachedContent, Position, Range};
use graphql_online_parser::{run_online_parser, Style};
use std::collections::HashMap;
use std::ops::ControlFlow;

/// Everything a rule may look at
pub struct RuleContext<'a> {
    pub schema: &'a Schema,
    /// The document with its fragment dependencies appended
    pub document: &'a ast::Document,
    /// Source text `document` was parsed from
    pub source: &'a str,
}

/// A check run after the standard GraphQL validation
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule, reported as the diagnostic code
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    fn check(&self, context: &RuleContext<'_>) -> Vec<Diagnostic>;
}

/// Validation engine for GraphQL documents against a schema
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Validator with the built-in rules
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: vec![Box::new(DeprecatedUsageRule)],
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: Box<dyn ValidationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Diagnose one document.
    ///
    /// A syntax error is reported alone. Without a schema only syntax is
    /// checked. Fragments the document spreads but does not define are taken
    /// from `fragments`; problems inside them are not reported here.
    #[must_use]
    pub fn diagnose(
        &self,
        text: &str,
        schema: Option<&Valid<Schema>>,
        fragments: &HashMap<String, FragmentInfo>,
    ) -> Vec<Diagnostic> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let document = match ast::Document::parse(text, "document.graphql") {
            Ok(document) => document,
            Err(with_errors) => {
                return with_errors
                    .errors
                    .iter()
                    .next()
                    .map(|error| {
                        let line = error
                            .line_column_range()
                            .map_or(0, |range| range.start.line.saturating_sub(1));
                        Diagnostic::syntax(syntax_error_range(text, line), error.error.to_string())
                    })
                    .into_iter()
                    .collect();
            }
        };

        let Some(schema) = schema else {
            return Vec::new();
        };

        let mut source = text.to_string();
        for dependency in fragment_dependencies(&document, fragments) {
            source.push('\n');
            source.push_str(dependency.text());
        }
        let Ok(combined) = ast::Document::parse(source.as_str(), "document.graphql") else {
            return Vec::new();
        };

        let mut diagnostics = executable_errors(&combined, schema);

        let context = RuleContext {
            schema,
            document: &combined,
            source: &source,
        };
        for rule in &self.rules {
            diagnostics.extend(
                rule.check(&context)
                    .into_iter()
                    .map(|diagnostic| diagnostic.with_code(rule.name())),
            );
        }

        let end = end_position(text);
        diagnostics.retain(|diagnostic| diagnostic.range.end <= end);
        diagnostics
    }

    /// Diagnose a snippet, reporting ranges in host-file coordinates
    #[must_use]
    pub fn diagnose_content(
        &self,
        content: &CachedContent,
        schema: Option<&Valid<Schema>>,
        fragments: &HashMap<String, FragmentInfo>,
    ) -> Vec<Diagnostic> {
        self.diagnose(&content.query, schema, fragments)
            .into_iter()
            .map(|diagnostic| diagnostic.offset_lines(content.range.start.line))
            .collect()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard validation of the executable definitions in `document`
fn executable_errors(document: &ast::Document, schema: &Valid<Schema>) -> Vec<Diagnostic> {
    let mut executable = document.clone();
    executable
        .definitions
        .retain(Definition::is_executable_definition);
    if executable.definitions.is_empty() {
        return Vec::new();
    }

    let Err(with_errors) = executable.to_executable_validate(schema) else {
        return Vec::new();
    };

    with_errors
        .errors
        .iter()
        .filter_map(|error| {
            let message = error.error.to_string();
            // Fragments may be defined for use from other files
            if message.contains("must be used in an operation") {
                return None;
            }
            let range = error.line_column_range().map_or_else(
                || Range::new(Position::new(0, 0), Position::new(0, 0)),
                |range| Range::new(position(range.start), position(range.end)),
            );
            let message = conventional_message(&message).unwrap_or(message);
            Some(Diagnostic::error(range, message))
        })
        .collect()
}

/// The usual GraphQL phrasing for the most common schema errors
fn conventional_message(message: &str) -> Option<String> {
    let quoted: Vec<&str> = message.split('`').skip(1).step_by(2).collect();
    match quoted.as_slice() {
        [ty, field]
            if message.starts_with("type ") && message.contains("does not have a field") =>
        {
            Some(format!("Cannot query field \"{field}\" on type \"{ty}\"."))
        }
        [name] if message.starts_with("cannot find fragment") => {
            Some(format!("Unknown fragment \"{name}\"."))
        }
        [name] if message.starts_with("cannot find type") => {
            Some(format!("Unknown type \"{name}\"."))
        }
        _ => None,
    }
}

const fn position(location: LineColumn) -> Position {
    Position::new(
        location.line.saturating_sub(1),
        location.column.saturating_sub(1),
    )
}

/// Range of the offending token on `line`: the first invalid token there, or
/// the last token of the line
fn syntax_error_range(text: &str, line: usize) -> Range {
    let mut token = (0, 0);
    let mut stopped = false;
    run_online_parser(text, |stream, _, style, index| {
        if index != line || stopped {
            return ControlFlow::Continue(());
        }
        token = (stream.start(), stream.pos());
        if style == Some(Style::InvalidChar) {
            stopped = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    Range::new(Position::new(line, token.0), Position::new(line, token.1))
}

/// Warns on every use of something marked `@deprecated`
pub struct DeprecatedUsageRule;

impl ValidationRule for DeprecatedUsageRule {
    fn name(&self) -> &'static str {
        "deprecated_usage"
    }

    fn description(&self) -> &'static str {
        "Warns when using fields, arguments, enum values or input fields marked with @deprecated"
    }

    fn check(&self, context: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut walker = DeprecationWalker {
            schema: context.schema,
            source: context.source,
            warnings: Vec::new(),
        };

        for definition in &context.document.definitions {
            match definition {
                Definition::OperationDefinition(operation) => {
                    for variable in &operation.variables {
                        if let Some(default) = &variable.default_value {
                            walker.value(default, &variable.ty);
                        }
                    }
                    walker.directives(&operation.directives);
                    if let Some(root) = root_type(context.schema, operation.operation_type) {
                        walker.selections(&operation.selection_set, root);
                    }
                }
                Definition::FragmentDefinition(fragment) => {
                    walker.directives(&fragment.directives);
                    walker.selections(&fragment.selection_set, &fragment.type_condition);
                }
                _ => {}
            }
        }

        walker.warnings
    }
}

struct DeprecationWalker<'a> {
    schema: &'a Schema,
    source: &'a str,
    warnings: Vec<Diagnostic>,
}

impl DeprecationWalker<'_> {
    fn warn(&mut self, span: Option<apollo_compiler::parser::SourceSpan>, message: String) {
        if let Some(span) = span {
            self.warnings.push(
                Diagnostic::warning(span_range(self.source, span), message)
                    .with_source(DiagnosticSource::Deprecation),
            );
        }
    }

    fn selections(&mut self, selections: &[Selection], parent_type: &str) {
        for selection in selections {
            match selection {
                Selection::Field(field) => self.field(field, parent_type),
                Selection::FragmentSpread(spread) => self.directives(&spread.directives),
                Selection::InlineFragment(inline) => {
                    self.directives(&inline.directives);
                    let type_name = inline
                        .type_condition
                        .as_ref()
                        .map_or(parent_type, |name| name.as_str());
                    self.selections(&inline.selection_set, type_name);
                }
            }
        }
    }

    fn field(&mut self, field: &ast::Field, parent_type: &str) {
        self.directives(&field.directives);

        let schema = self.schema;
        let Some(definition) = field_definition(schema, parent_type, &field.name) else {
            return;
        };

        if let Some(reason) = deprecation_reason(&definition.directives) {
            self.warn(
                field.name.location(),
                format!("The field {parent_type}.{} is deprecated. {reason}", field.name),
            );
        }

        for argument in &field.arguments {
            let Some(argument_def) = definition
                .arguments
                .iter()
                .find(|def| def.name == argument.name)
            else {
                continue;
            };
            if let Some(reason) = deprecation_reason(&argument_def.directives) {
                self.warn(
                    argument.name.location(),
                    format!(
                        "Field \"{parent_type}.{}\" argument \"{}\" is deprecated. {reason}",
                        field.name, argument.name
                    ),
                );
            }
            self.value(&argument.value, &argument_def.ty);
        }

        let field_type = definition.ty.inner_named_type().clone();
        self.selections(&field.selection_set, &field_type);
    }

    fn directives(&mut self, directives: &DirectiveList) {
        let schema = self.schema;
        for directive in directives.iter() {
            let Some(definition) = directive_definition(schema, &directive.name) else {
                continue;
            };
            for argument in &directive.arguments {
                let Some(argument_def) = definition
                    .arguments
                    .iter()
                    .find(|def| def.name == argument.name)
                else {
                    continue;
                };
                if let Some(reason) = deprecation_reason(&argument_def.directives) {
                    self.warn(
                        argument.name.location(),
                        format!(
                            "Directive \"@{}\" argument \"{}\" is deprecated. {reason}",
                            directive.name, argument.name
                        ),
                    );
                }
                self.value(&argument.value, &argument_def.ty);
            }
        }
    }

    fn value(&mut self, value: &Node<ast::Value>, ty: &Type) {
        let schema = self.schema;
        match &**value {
            ast::Value::Enum(name) => {
                let Some(ExtendedType::Enum(enum_type)) =
                    schema.types.get(ty.inner_named_type())
                else {
                    return;
                };
                let Some(definition) = enum_type.values.get(name) else {
                    return;
                };
                if let Some(reason) = deprecation_reason(&definition.directives) {
                    self.warn(
                        value.location(),
                        format!(
                            "The enum value \"{}.{name}\" is deprecated. {reason}",
                            enum_type.name
                        ),
                    );
                }
            }
            ast::Value::List(items) => {
                let item_type = match ty {
                    Type::List(inner) | Type::NonNullList(inner) => inner.as_ref().clone(),
                    _ => ty.clone(),
                };
                for item in items {
                    self.value(item, &item_type);
                }
            }
            ast::Value::Object(fields) => {
                let Some(ExtendedType::InputObject(input)) =
                    schema.types.get(ty.inner_named_type())
                else {
                    return;
                };
                for (name, field_value) in fields {
                    let Some(definition) = input.fields.get(name) else {
                        continue;
                    };
                    if let Some(reason) = deprecation_reason(&definition.directives) {
                        self.warn(
                            name.location(),
                            format!("The input field {}.{name} is deprecated. {reason}", input.name),
                        );
                    }
                    self.value(field_value, &definition.ty);
                }
            }
            _ => {}
        }
    }
}
