//! Schemas described by an introspection result.
//!
//! Remote endpoints and `.json` schema files both come in the shape of the
//! standard introspection query result. They are printed back to SDL so every
//! schema source goes through the same builder.

use crate::{ProjectError, Result};
use serde::Deserialize;
use std::fmt::{self, Write};

/// Standard introspection query, with type references seven levels deep
pub const INTROSPECTION_QUERY: &str = r"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      ...FullType
    }
    directives {
      name
      description
      locations
      args {
        ...InputValue
      }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args {
      ...InputValue
    }
    type {
      ...TypeRef
    }
    isDeprecated
    deprecationReason
  }
  inputFields {
    ...InputValue
  }
  interfaces {
    ...TypeRef
  }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes {
    ...TypeRef
  }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}
";

const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];
const BUILTIN_DIRECTIVES: &[&str] = &["skip", "include", "deprecated", "specifiedBy"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    pub query_type: Option<NamedRef>,
    pub mutation_type: Option<NamedRef>,
    pub subscription_type: Option<NamedRef>,
    #[serde(default)]
    pub types: Vec<IntrospectionType>,
    #[serde(default)]
    pub directives: Vec<IntrospectionDirective>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionType {
    pub kind: TypeKind,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<IntrospectionField>>,
    #[serde(default)]
    pub input_fields: Option<Vec<IntrospectionInputValue>>,
    #[serde(default)]
    pub interfaces: Option<Vec<TypeRef>>,
    #[serde(default)]
    pub enum_values: Option<Vec<IntrospectionEnumValue>>,
    #[serde(default)]
    pub possible_types: Option<Vec<TypeRef>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionField {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<IntrospectionInputValue>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionInputValue {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionEnumValue {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionDirective {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub args: Vec<IntrospectionInputValue>,
}

/// A possibly wrapped type reference
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    pub name: Option<String>,
    pub of_type: Option<Box<TypeRef>>,
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.of_type) {
            (TypeKind::NonNull, Some(inner)) => write!(f, "{inner}!"),
            (TypeKind::List, Some(inner)) => write!(f, "[{inner}]"),
            _ => f.write_str(self.name.as_deref().unwrap_or_default()),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<SchemaHolder>,
    #[serde(rename = "__schema")]
    schema: Option<IntrospectionSchema>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct SchemaHolder {
    #[serde(rename = "__schema")]
    schema: IntrospectionSchema,
}

impl IntrospectionSchema {
    /// Read an introspection result, with or without the `data` wrapper
    pub fn from_json(json: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(json)?;
        if let Some(holder) = envelope.data {
            return Ok(holder.schema);
        }
        if let Some(schema) = envelope.schema {
            return Ok(schema);
        }
        let reason = envelope
            .errors
            .first()
            .and_then(|error| error.get("message"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("missing __schema");
        Err(ProjectError::Introspection(reason.to_string()))
    }

    /// Print the schema as SDL, leaving out built-in scalars, directives and
    /// introspection types
    #[must_use]
    pub fn to_sdl(&self) -> String {
        self.to_string()
    }

    fn needs_schema_definition(&self) -> bool {
        let differs = |root: &Option<NamedRef>, default: &str| {
            root.as_ref().is_some_and(|root| root.name != default)
        };
        differs(&self.query_type, "Query")
            || differs(&self.mutation_type, "Mutation")
            || differs(&self.subscription_type, "Subscription")
    }
}

/// Execute the introspection query against `url` and return the schema
pub async fn fetch_introspection(url: &str) -> Result<IntrospectionSchema> {
    tracing::info!(url, "Fetching schema via introspection");

    let response = reqwest::Client::new()
        .post(url)
        .json(&serde_json::json!({ "query": INTROSPECTION_QUERY }))
        .send()
        .await?
        .error_for_status()?;
    let body = response.text().await?;

    IntrospectionSchema::from_json(&body)
}

fn write_description(f: &mut impl Write, description: Option<&String>, indent: &str) -> fmt::Result {
    let Some(description) = description.filter(|d| !d.is_empty()) else {
        return Ok(());
    };
    if description.contains('\n') || description.contains('"') {
        writeln!(f, "{indent}\"\"\"")?;
        for line in description.lines() {
            writeln!(f, "{indent}{}", line.replace("\"\"\"", "\\\"\"\""))?;
        }
        writeln!(f, "{indent}\"\"\"")
    } else {
        writeln!(f, "{indent}\"{description}\"")
    }
}

fn write_deprecation(f: &mut impl Write, is_deprecated: bool, reason: Option<&String>) -> fmt::Result {
    if !is_deprecated {
        return Ok(());
    }
    match reason {
        Some(reason) => write!(f, " @deprecated(reason: {})", serde_json::Value::from(reason.as_str())),
        None => f.write_str(" @deprecated"),
    }
}

fn write_arguments(f: &mut impl Write, args: &[IntrospectionInputValue]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    f.write_char('(')?;
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {}", arg.name, arg.type_ref)?;
        if let Some(default) = &arg.default_value {
            write!(f, " = {default}")?;
        }
    }
    f.write_char(')')
}

fn write_implements(f: &mut impl Write, interfaces: Option<&Vec<TypeRef>>) -> fmt::Result {
    let names: Vec<&str> = interfaces
        .into_iter()
        .flatten()
        .filter_map(|interface| interface.name.as_deref())
        .collect();
    if names.is_empty() {
        return Ok(());
    }
    write!(f, " implements {}", names.join(" & "))
}

fn write_type(f: &mut impl Write, ty: &IntrospectionType) -> fmt::Result {
    write_description(f, ty.description.as_ref(), "")?;
    match ty.kind {
        TypeKind::Scalar => writeln!(f, "scalar {}", ty.name),
        TypeKind::Object | TypeKind::Interface => {
            let keyword = if ty.kind == TypeKind::Object {
                "type"
            } else {
                "interface"
            };
            write!(f, "{keyword} {}", ty.name)?;
            write_implements(f, ty.interfaces.as_ref())?;
            f.write_str(" {\n")?;
            for field in ty.fields.iter().flatten() {
                write_description(f, field.description.as_ref(), "  ")?;
                write!(f, "  {}", field.name)?;
                write_arguments(f, &field.args)?;
                write!(f, ": {}", field.type_ref)?;
                write_deprecation(f, field.is_deprecated, field.deprecation_reason.as_ref())?;
                f.write_char('\n')?;
            }
            f.write_str("}\n")
        }
        TypeKind::Union => {
            let members: Vec<&str> = ty
                .possible_types
                .iter()
                .flatten()
                .filter_map(|member| member.name.as_deref())
                .collect();
            writeln!(f, "union {} = {}", ty.name, members.join(" | "))
        }
        TypeKind::Enum => {
            writeln!(f, "enum {} {{", ty.name)?;
            for value in ty.enum_values.iter().flatten() {
                write_description(f, value.description.as_ref(), "  ")?;
                write!(f, "  {}", value.name)?;
                write_deprecation(f, value.is_deprecated, value.deprecation_reason.as_ref())?;
                f.write_char('\n')?;
            }
            f.write_str("}\n")
        }
        TypeKind::InputObject => {
            writeln!(f, "input {} {{", ty.name)?;
            for field in ty.input_fields.iter().flatten() {
                write_description(f, field.description.as_ref(), "  ")?;
                write!(f, "  {}: {}", field.name, field.type_ref)?;
                if let Some(default) = &field.default_value {
                    write!(f, " = {default}")?;
                }
                f.write_char('\n')?;
            }
            f.write_str("}\n")
        }
        TypeKind::List | TypeKind::NonNull => Ok(()),
    }
}

impl fmt::Display for IntrospectionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut blocks = Vec::new();

        if self.needs_schema_definition() {
            let mut block = String::from("schema {\n");
            for (operation, root) in [
                ("query", &self.query_type),
                ("mutation", &self.mutation_type),
                ("subscription", &self.subscription_type),
            ] {
                if let Some(root) = root {
                    writeln!(block, "  {operation}: {}", root.name)?;
                }
            }
            block.push_str("}\n");
            blocks.push(block);
        }

        for directive in &self.directives {
            if BUILTIN_DIRECTIVES.contains(&directive.name.as_str()) {
                continue;
            }
            let mut block = String::new();
            write_description(&mut block, directive.description.as_ref(), "")?;
            write!(block, "directive @{}", directive.name)?;
            write_arguments(&mut block, &directive.args)?;
            writeln!(block, " on {}", directive.locations.join(" | "))?;
            blocks.push(block);
        }

        for ty in &self.types {
            if ty.name.starts_with("__") || BUILTIN_SCALARS.contains(&ty.name.as_str()) {
                continue;
            }
            let mut block = String::new();
            write_type(&mut block, ty)?;
            blocks.push(block);
        }

        f.write_str(blocks.join("\n").trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    const RESULT: &str = r#"{
      "data": {
        "__schema": {
          "queryType": { "name": "Query" },
          "mutationType": null,
          "subscriptionType": null,
          "types": [
            {
              "kind": "OBJECT",
              "name": "Query",
              "description": "Root query",
              "fields": [
                {
                  "name": "user",
                  "description": null,
                  "args": [
                    {
                      "name": "id",
                      "description": null,
                      "type": { "kind": "NON_NULL", "name": null, "ofType": { "kind": "SCALAR", "name": "ID", "ofType": null } },
                      "defaultValue": null
                    }
                  ],
                  "type": { "kind": "OBJECT", "name": "User", "ofType": null },
                  "isDeprecated": false,
                  "deprecationReason": null
                },
                {
                  "name": "tags",
                  "description": null,
                  "args": [],
                  "type": { "kind": "LIST", "name": null, "ofType": { "kind": "NON_NULL", "name": null, "ofType": { "kind": "SCALAR", "name": "String", "ofType": null } } },
                  "isDeprecated": true,
                  "deprecationReason": "Use labels"
                }
              ],
              "inputFields": null,
              "interfaces": [],
              "enumValues": null,
              "possibleTypes": null
            },
            {
              "kind": "OBJECT",
              "name": "User",
              "description": null,
              "fields": [
                {
                  "name": "role",
                  "description": null,
                  "args": [],
                  "type": { "kind": "ENUM", "name": "Role", "ofType": null },
                  "isDeprecated": false,
                  "deprecationReason": null
                }
              ],
              "inputFields": null,
              "interfaces": [],
              "enumValues": null,
              "possibleTypes": null
            },
            {
              "kind": "ENUM",
              "name": "Role",
              "description": null,
              "fields": null,
              "inputFields": null,
              "interfaces": null,
              "enumValues": [
                { "name": "ADMIN", "description": null, "isDeprecated": false, "deprecationReason": null }
              ],
              "possibleTypes": null
            },
            { "kind": "SCALAR", "name": "String", "description": null },
            { "kind": "SCALAR", "name": "ID", "description": null },
            { "kind": "OBJECT", "name": "__Type", "description": null, "fields": [] }
          ],
          "directives": [
            { "name": "skip", "description": null, "locations": ["FIELD"], "args": [] },
            {
              "name": "cached",
              "description": null,
              "locations": ["FIELD_DEFINITION", "OBJECT"],
              "args": [
                {
                  "name": "ttl",
                  "description": null,
                  "type": { "kind": "SCALAR", "name": "Int", "ofType": null },
                  "defaultValue": "60"
                }
              ]
            }
          ]
        }
      }
    }"#;

    #[test]
    fn test_introspection_to_sdl() {
        let schema = IntrospectionSchema::from_json(RESULT).unwrap();
        assert_snapshot!(schema.to_sdl(), @r#"
        directive @cached(ttl: Int = 60) on FIELD_DEFINITION | OBJECT

        "Root query"
        type Query {
          user(id: ID!): User
          tags: [String!] @deprecated(reason: "Use labels")
        }

        type User {
          role: Role
        }

        enum Role {
          ADMIN
        }
        "#);
    }

    #[test]
    fn test_unwrapped_result_is_accepted() {
        let json = r#"{ "__schema": { "queryType": { "name": "Root" }, "types": [
            { "kind": "OBJECT", "name": "Root", "fields": [
                { "name": "ok", "args": [], "type": { "kind": "SCALAR", "name": "Boolean" } }
            ] }
        ] } }"#;
        let sdl = IntrospectionSchema::from_json(json).unwrap().to_sdl();
        assert!(sdl.starts_with("schema {\n  query: Root\n}"));
        assert!(sdl.contains("type Root {\n  ok: Boolean\n}"));
    }

    #[test]
    fn test_errors_are_reported() {
        let json = r#"{ "errors": [{ "message": "introspection disabled" }] }"#;
        let err = IntrospectionSchema::from_json(json).unwrap_err();
        assert!(err.to_string().contains("introspection disabled"));
    }
}
