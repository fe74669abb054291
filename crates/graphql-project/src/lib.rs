//! Language intelligence for GraphQL projects: completion, hover, navigation,
//! outlines and diagnostics over a cached project of schema and documents.

mod completion;
mod dependencies;
mod diagnostics;
mod error;
mod goto_definition;
mod hover;
mod introspection;
mod location;
mod lookup_file;
mod project;
mod schema;
mod symbols;
mod type_info;
mod validation;

pub use completion::{hint_list, suggestions, CompletionItem, CompletionItemKind};
pub use dependencies::{
    fragment_dependencies, index_document, type_dependencies, FragmentInfo, ObjectTypeInfo,
};
pub use diagnostics::{Diagnostic, DiagnosticSource, Severity};
pub use error::{ProjectError, Result};
pub use goto_definition::{goto_definition, DefinitionIndex, DefinitionLocation};
pub use hover::{hover, HoverInfo};
pub use introspection::{fetch_introspection, IntrospectionSchema, INTROSPECTION_QUERY};
pub use lookup_file::{lookup_file_path, write_lookup_file, LOOKUP_FILE_HEADER};
pub use project::{GraphQLProject, WorkspaceSymbol};
pub use schema::{build_schema, read_schema_file, SchemaLoader, SchemaSource};
pub use symbols::{document_symbols, DocumentSymbol, SymbolKind};
pub use type_info::{context_token, resolve_type_info, ContextToken, TypeInfo};
pub use validation::{DeprecatedUsageRule, RuleContext, ValidationRule, Validator};

// Re-export common types from dependencies
pub use graphql_config::{GraphQLConfig, ProjectConfig};
pub use graphql_extract::{CachedContent, Position, Range};
