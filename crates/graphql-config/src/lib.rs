mod config;
mod error;
mod loader;

pub use config::{
    expand_braces, pattern_matches, DocumentsConfig, GraphQLConfig, ProjectConfig, SchemaConfig,
    DEFAULT_PROJECT_NAME,
};
pub use error::{ConfigError, Result};
pub use loader::{
    find_config, is_config_file_name, load_config, load_config_from_str,
    package_json_has_graphql_key,
};
