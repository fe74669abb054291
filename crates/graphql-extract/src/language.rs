use std::path::Path;

/// Host languages a GraphQL snippet can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Raw GraphQL files (.graphql, .gql, .gqls)
    GraphQL,
    /// TypeScript (.ts, .tsx, .mts, .cts)
    TypeScript,
    /// JavaScript (.js, .jsx, .mjs, .cjs)
    JavaScript,
    /// Vue Single File Components (.vue)
    Vue,
    /// Svelte components (.svelte)
    Svelte,
    /// Astro components (.astro)
    Astro,
}

/// Every file extension with a known host language.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "graphql", "gql", "gqls", "ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs", "vue",
    "svelte", "astro",
];

impl Language {
    /// Detect language from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension()?.to_str()?)
    }

    /// Detect language from a URI or path string.
    ///
    /// Query strings and fragments are ignored, so `file:///a.ts?x=1` is TypeScript.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let without_suffix = uri.split(['?', '#']).next().unwrap_or(uri);
        let file_name = without_suffix.rsplit('/').next()?;
        let (_, extension) = file_name.rsplit_once('.')?;
        Self::from_extension(extension)
    }

    fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "graphql" | "gql" | "gqls" => Some(Self::GraphQL),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "vue" => Some(Self::Vue),
            "svelte" => Some(Self::Svelte),
            "astro" => Some(Self::Astro),
            _ => None,
        }
    }

    /// Whether GraphQL lives inside template literals rather than being the whole file
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        !matches!(self, Self::GraphQL)
    }
}
