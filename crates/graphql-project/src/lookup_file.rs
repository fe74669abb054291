//! Generated schema file used as a go-to-definition target.
//!
//! Schemas built from introspection have no source file an editor could open,
//! so the fully extended schema is printed to a per-project file in the
//! system temp directory.

use crate::Result;
use apollo_compiler::Schema;
use std::path::{Path, PathBuf};

pub const LOOKUP_FILE_HEADER: &str = "# This is an automatically generated representation of your schema.\n\
# Any changes to this file will be overwritten and will not be\n\
# reflected in the resulting GraphQL schema\n\n";

const LOOKUP_FILE_NAME: &str = "generated-schema.graphql";

/// Where the lookup file for `project` in `workspace` lives
#[must_use]
pub fn lookup_file_path(workspace: &Path, project: &str) -> PathBuf {
    let workspace_name = workspace
        .file_name()
        .map_or_else(|| "workspace".to_string(), |name| name.to_string_lossy().into_owned());

    std::env::temp_dir()
        .join("graphql-language-service")
        .join(workspace_name)
        .join("projects")
        .join(project)
        .join(LOOKUP_FILE_NAME)
}

/// Print `schema` to `path`, replacing any previous contents
pub fn write_lookup_file(path: &Path, schema: &Schema) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format!("{LOOKUP_FILE_HEADER}{schema}"))?;
    tracing::debug!(path = %path.display(), "Wrote schema lookup file");
    Ok(())
}
