pub mod autocomplete;
pub mod outline;
pub mod validate;

use anyhow::{Context, Result};
use graphql_config::{find_config, load_config, GraphQLConfig};
use graphql_project::GraphQLProject;
use std::path::{Path, PathBuf};

/// A loaded config and the directory its globs are relative to
pub struct Workspace {
    pub config: GraphQLConfig,
    pub config_dir: PathBuf,
}

impl Workspace {
    /// Load `config_path`, or the first config found walking up from `start_dir`
    pub fn load(config_path: Option<PathBuf>, start_dir: &Path) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => find_config(start_dir)
                .context("Failed to search for config")?
                .context("No GraphQL config file found")?,
        };

        let config = load_config(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;
        let config_dir = config_path
            .parent()
            .context("Failed to get config directory")?
            .to_path_buf();

        Ok(Self { config, config_dir })
    }

    /// Every project, or just `name` when given
    pub fn projects(&self, name: Option<&str>) -> Result<Vec<GraphQLProject>> {
        let projects: Vec<GraphQLProject> = GraphQLProject::from_config(&self.config, &self.config_dir)
            .into_iter()
            .filter(|project| name.is_none_or(|name| project.name() == name))
            .collect();

        if let (Some(name), true) = (name, projects.is_empty()) {
            anyhow::bail!("Project '{name}' not found");
        }
        Ok(projects)
    }

    /// The indexed project that owns `file`, with the file's current text loaded
    pub async fn project_for_file(&self, file: &Path, name: Option<&str>) -> Result<GraphQLProject> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self
                .config
                .find_project_for_document(file, &self.config_dir)
                .map(|(name, _)| name.to_string())
                .with_context(|| format!("No project includes {}", file.display()))?,
        };

        let mut project = self
            .projects(Some(&name))?
            .into_iter()
            .next()
            .with_context(|| format!("Project '{name}' not found"))?;
        project.initialize().await;

        let text = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        project.update_file(file, &text, None);
        Ok(project)
    }
}

/// Absolute form of a path given on the command line
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}
