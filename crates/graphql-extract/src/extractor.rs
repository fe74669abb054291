use crate::{position_from_offset, ExtractError, Language, Position, Range, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops;
use std::path::Path;
use swc_common::comments::{CommentKind, Comments, SingleThreadedComments};
use swc_common::{sync::Lrc, BytePos, FileName, SourceMap, Span, Spanned};
use swc_core::ecma::ast::{CallExpr, Callee, EsVersion, Expr, ExprOrSpread, MemberProp, TaggedTpl, Tpl};
use swc_core::ecma::parser::{parse_file_as_program, EsSyntax, Syntax, TsSyntax};
use swc_core::ecma::visit::{Visit, VisitWith};

/// Configuration for GraphQL extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Magic comment to look for (default: "GraphQL")
    /// Matches comments like: /* GraphQL */ `query { ... }`
    pub magic_comment: String,

    /// Tag identifiers to extract (default: ["gql", "graphql", "graphql.experimental"])
    /// Matches: gql`query { ... }`, graphql`query { ... }` or gql(`query { ... }`)
    pub tag_identifiers: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            magic_comment: "GraphQL".to_string(),
            tag_identifiers: vec![
                "gql".to_string(),
                "graphql".to_string(),
                "graphql.experimental".to_string(),
            ],
        }
    }
}

/// One GraphQL document extracted from a host file.
///
/// `query` is laid out so that a position inside it maps to the host file by
/// adding `range.start.line` to the line. The first line is padded with spaces
/// up to the column where the snippet starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedContent {
    pub query: String,
    pub range: Range,
}

impl CachedContent {
    #[must_use]
    pub fn new(query: impl Into<String>, range: Range) -> Self {
        Self {
            query: query.into(),
            range,
        }
    }
}

/// Turns host-file text into GraphQL snippets.
///
/// Returns `None` when the file is not something this parser understands.
pub trait SourceParser: Send + Sync {
    fn extract(&self, text: &str, uri: &str) -> Option<Vec<CachedContent>>;
}

/// Source parser picking the host language from the URI extension
#[derive(Debug, Clone, Default)]
pub struct DefaultSourceParser {
    config: ExtractConfig,
}

impl DefaultSourceParser {
    #[must_use]
    pub const fn new(config: ExtractConfig) -> Self {
        Self { config }
    }
}

impl SourceParser for DefaultSourceParser {
    fn extract(&self, text: &str, uri: &str) -> Option<Vec<CachedContent>> {
        let language = Language::from_uri(uri)?;
        Some(extract_from_source(text, language, &self.config))
    }
}

/// Extract GraphQL from a file
pub fn extract_from_file(path: &Path, config: &ExtractConfig) -> Result<Vec<CachedContent>> {
    let language = Language::from_path(path)
        .ok_or_else(|| ExtractError::UnsupportedFileType(path.to_path_buf()))?;

    let source = fs::read_to_string(path)?;
    Ok(extract_from_source(&source, language, config))
}

/// Extract GraphQL from source code string
#[must_use]
pub fn extract_from_source(
    source: &str,
    language: Language,
    config: &ExtractConfig,
) -> Vec<CachedContent> {
    let mut snippets = Vec::new();
    match language {
        Language::GraphQL => {
            // Raw GraphQL file - the whole document is one snippet
            snippets.push(CachedContent::new(
                source,
                Range::new(
                    Position::new(0, 0),
                    position_from_offset(source, source.len()),
                ),
            ));
        }
        Language::TypeScript | Language::JavaScript => {
            snippets.extend(extract_from_script(source, 0..source.len(), language, config));
        }
        Language::Vue | Language::Svelte | Language::Astro => {
            for region in script_regions(source, language) {
                snippets.extend(extract_from_script(source, region, language, config));
            }
        }
    }
    snippets
}

/// Byte ranges of the script portions of a component file
fn script_regions(source: &str, language: Language) -> Vec<ops::Range<usize>> {
    let mut regions = Vec::new();

    if language == Language::Astro {
        let leading = source.len() - source.trim_start().len();
        if source[leading..].starts_with("---") {
            let body_start = leading + 3;
            let body_end = source[body_start..]
                .find("\n---")
                .map_or(source.len(), |idx| body_start + idx);
            regions.push(body_start..body_end);
        }
    }

    let mut cursor = 0;
    while let Some(open) = source[cursor..].find("<script") {
        let open = cursor + open;
        let Some(tag_end) = source[open..].find('>') else {
            break;
        };
        let body_start = open + tag_end + 1;
        let body_end = source[body_start..]
            .find("</script")
            .map_or(source.len(), |idx| body_start + idx);
        regions.push(body_start..body_end);
        cursor = body_end;
    }

    regions
}

fn syntax_for(language: Language) -> Syntax {
    match language {
        Language::JavaScript => Syntax::Es(EsSyntax {
            jsx: true,
            decorators: true,
            ..Default::default()
        }),
        // Component scripts are parsed as TypeScript, which accepts plain JS too
        _ => Syntax::Typescript(TsSyntax {
            tsx: language == Language::TypeScript,
            decorators: true,
            ..Default::default()
        }),
    }
}

/// Parse one script region with swc and collect its GraphQL templates.
///
/// A region swc cannot parse yields no snippets.
fn extract_from_script(
    source: &str,
    region: ops::Range<usize>,
    language: Language,
    config: &ExtractConfig,
) -> Vec<CachedContent> {
    let script = &source[region.clone()];
    let source_map: Lrc<SourceMap> = Lrc::default();
    let file = source_map.new_source_file(Lrc::new(FileName::Anon), script.to_owned());
    let comments = SingleThreadedComments::default();

    let mut recovered = Vec::new();
    let program = match parse_file_as_program(
        &file,
        syntax_for(language),
        EsVersion::latest(),
        Some(&comments),
        &mut recovered,
    ) {
        Ok(program) => program,
        Err(err) => {
            tracing::debug!(error = ?err, "Failed to parse script; no GraphQL extracted");
            return Vec::new();
        }
    };

    let mut collector = TemplateCollector {
        config,
        comments: &comments,
        templates: Vec::new(),
    };
    program.visit_with(&mut collector);

    let offset = |pos: BytePos| region.start + source_map.lookup_byte_offset(pos).pos.0 as usize;
    collector
        .templates
        .iter()
        .map(|found| {
            // The template span includes both backticks
            let body = offset(found.span.lo) + 1..offset(found.span.hi) - 1;
            let holes: Vec<_> = found
                .exprs
                .iter()
                .filter_map(|expr| hole_range(source, &body, offset(expr.lo), offset(expr.hi)))
                .collect();
            build_snippet(source, body, &holes)
        })
        .collect()
}

/// The `${...}` span around an interpolated expression
fn hole_range(
    source: &str,
    body: &ops::Range<usize>,
    expr_start: usize,
    expr_end: usize,
) -> Option<ops::Range<usize>> {
    let start = body.start + source[body.start..expr_start].rfind("${")?;
    let end = expr_end + source[expr_end..body.end].find('}')? + 1;
    Some(start..end)
}

struct FoundTemplate {
    span: Span,
    /// Spans of the interpolated expressions
    exprs: Vec<Span>,
}

/// Collects the templates that hold GraphQL, in source order
struct TemplateCollector<'a> {
    config: &'a ExtractConfig,
    comments: &'a SingleThreadedComments,
    templates: Vec<FoundTemplate>,
}

impl TemplateCollector<'_> {
    fn is_graphql_tag(&self, tag: &Expr) -> bool {
        tag_name(tag).is_some_and(|name| self.config.tag_identifiers.contains(&name))
    }

    fn has_magic_comment(&self, tpl: &Tpl) -> bool {
        self.comments.get_leading(tpl.span.lo).is_some_and(|comments| {
            comments.iter().any(|comment| {
                comment.kind == CommentKind::Block
                    && comment.text.trim() == self.config.magic_comment
            })
        })
    }

    /// Record `tpl` and keep looking for templates nested in its interpolations
    fn collect(&mut self, tpl: &Tpl) {
        self.templates.push(FoundTemplate {
            span: tpl.span,
            exprs: tpl.exprs.iter().map(|expr| expr.span()).collect(),
        });
        for expr in &tpl.exprs {
            expr.visit_with(self);
        }
    }
}

impl Visit for TemplateCollector<'_> {
    fn visit_tagged_tpl(&mut self, node: &TaggedTpl) {
        if self.is_graphql_tag(&node.tag) {
            self.collect(&node.tpl);
        } else {
            node.visit_children_with(self);
        }
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        let template = match (&node.callee, node.args.first()) {
            (Callee::Expr(callee), Some(ExprOrSpread { spread: None, expr })) => match &**expr {
                Expr::Tpl(tpl) if self.is_graphql_tag(callee) => Some(tpl),
                _ => None,
            },
            _ => None,
        };

        match template {
            Some(tpl) => {
                self.collect(tpl);
                for arg in &node.args[1..] {
                    arg.visit_with(self);
                }
            }
            None => node.visit_children_with(self),
        }
    }

    fn visit_tpl(&mut self, node: &Tpl) {
        if self.has_magic_comment(node) {
            self.collect(node);
        } else {
            node.visit_children_with(self);
        }
    }
}

/// Dotted name of a tag expression, such as `gql` or `graphql.experimental`
fn tag_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(prop) => Some(format!("{}.{}", tag_name(&member.obj)?, prop.sym)),
            _ => None,
        },
        _ => None,
    }
}

fn build_snippet(
    source: &str,
    body: ops::Range<usize>,
    holes: &[ops::Range<usize>],
) -> CachedContent {
    let start_position = position_from_offset(source, body.start);
    let end_position = position_from_offset(source, body.end);

    let mut query = " ".repeat(start_position.character);
    let mut cursor = body.start;
    for hole in holes {
        query.push_str(&source[cursor..hole.start]);
        for ch in source[hole.clone()].chars() {
            if matches!(ch, '\n' | '\r') {
                query.push(ch);
            } else {
                query.extend(std::iter::repeat(' ').take(ch.len_utf16()));
            }
        }
        cursor = hole.end;
    }
    query.push_str(&source[cursor..body.end]);

    CachedContent::new(query, Range::new(start_position, end_position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn extract_ts(source: &str) -> Vec<CachedContent> {
        extract_from_source(source, Language::TypeScript, &ExtractConfig::default())
    }

    #[test]
    fn test_extract_raw_graphql() {
        let source = "query GetUser {\n  user {\n    id\n  }\n}";
        let result = extract_from_source(source, Language::GraphQL, &ExtractConfig::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].query, source);
        assert_eq!(result[0].range.start, Position::new(0, 0));
        assert_eq!(result[0].range.end, Position::new(4, 1));
    }

    #[test]
    fn test_extract_tagged_template() {
        let source = "import gql from 'graphql-tag';\n\nconst Q = gql`\n  query { user { id } }\n`;\n";
        let result = extract_ts(source);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].range.start, Position::new(2, 14));
        assert_eq!(result[0].range.end, Position::new(4, 0));
        assert_eq!(
            result[0].query,
            format!("{}\n  query {{ user {{ id }} }}\n", " ".repeat(14))
        );
    }

    #[test]
    fn test_first_line_padding_keeps_columns() {
        let source = "const Q = graphql`query { a }`;";
        let result = extract_ts(source);

        assert_eq!(result.len(), 1);
        let snippet = &result[0];
        let column = source.find("query").unwrap();
        assert_eq!(snippet.query.find("query"), Some(column));
        assert_eq!(snippet.range.start, Position::new(0, column));
    }

    #[test]
    fn test_interpolations_are_blanked() {
        let source = "const Q = gql`\n  query { ...UserFields }\n  ${USER_FIELDS}\n`;";
        let result = extract_ts(source);

        assert_eq!(result.len(), 1);
        let lines: Vec<&str> = result[0].query.split('\n').collect();
        assert_eq!(lines[1], "  query { ...UserFields }");
        assert_eq!(lines[2], " ".repeat("  ${USER_FIELDS}".len()));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_untagged_templates_and_strings_are_skipped() {
        let source = r#"
const a = `query { notGraphQL }`;
const b = "gql`query { inString }`";
// gql`query { inComment }`
/* gql`query { inBlockComment }` */
const c = gql`query { real }`;
"#;
        let result = extract_ts(source);

        assert_eq!(result.len(), 1);
        assert!(result[0].query.contains("real"));
        assert_eq!(result[0].range.start.line, 5);
    }

    #[test]
    fn test_magic_comment_and_call_form() {
        let source = "const a = /* GraphQL */ `query { a }`;\nconst b = gql(`query { b }`);\nconst c = graphql.experimental`query { c }`;\nconst d = /* SQL */ `select 1`;";
        let result = extract_ts(source);

        let lines: Vec<usize> = result.iter().map(|s| s.range.start.line).collect();
        assert_eq!(lines, vec![0, 1, 2]);
    }

    #[test]
    fn test_tag_must_be_whole_identifier() {
        let result = extract_ts("const a = notgql`query { a }`;");
        assert!(result.is_empty());
    }

    #[test]
    fn test_nested_template_in_interpolation() {
        let source = "const Q = gql`query { a } ${cond ? `x` : `y`}`;\nconst R = gql`query { r }`;";
        let result = extract_ts(source);

        assert_eq!(result.len(), 2);
        assert!(result[0].query.trim_end().ends_with("query { a }"));
        assert_eq!(result[1].range.start.line, 1);
    }

    #[test]
    fn test_jsx_in_typescript_component() {
        let source = "export const Q = gql`query { a }`;\nexport const C = () => <div title={`gql`}>{Q}</div>;\n";
        let result = extract_ts(source);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].range.start, Position::new(0, 21));
    }

    #[test]
    fn test_unparseable_script_yields_nothing() {
        let result = extract_ts("const Q = gql`query { a }`;\nif (\n");
        assert!(result.is_empty());
    }

    #[test]
    fn test_interpolation_with_braces_and_comment_tag() {
        let source = "const Q = /* GraphQL */ `{ a ${fn({ x: 1 })} }`;";
        let result = extract_from_source(source, Language::JavaScript, &ExtractConfig::default());

        assert_eq!(result.len(), 1);
        let expected = format!("{}{{ a {} }}", " ".repeat(25), " ".repeat("${fn({ x: 1 })}".len()));
        assert_eq!(result[0].query, expected);
    }

    #[test]
    fn test_vue_only_scans_script_blocks() {
        let source = "<template>\n  <p>don't `gql` me</p>\n</template>\n<script>\nexport const Q = gql`query { vue }`;\n</script>\n";
        let result = extract_from_source(source, Language::Vue, &ExtractConfig::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].range.start.line, 4);
    }

    #[test]
    fn test_astro_frontmatter() {
        let source = "---\nconst Q = gql`query { astro }`;\n---\n<div>`gql`</div>\n";
        let result = extract_from_source(source, Language::Astro, &ExtractConfig::default());

        assert_eq!(result.len(), 1);
        assert!(result[0].query.contains("astro"));
    }

    #[test]
    fn test_default_source_parser_by_uri() {
        let parser = DefaultSourceParser::default();
        assert!(parser.extract("query { a }", "file:///notes.txt").is_none());

        let snippets = parser
            .extract("query { a }", "file:///app/query.graphql")
            .unwrap();
        assert_eq!(snippets.len(), 1);

        let snippets = parser.extract("const x = 1;", "file:///app/index.ts").unwrap();
        assert!(snippets.is_empty());
    }

    #[test]
    fn test_extract_from_file() {
        let mut file = tempfile::Builder::new().suffix(".ts").tempfile().unwrap();
        write!(file, "export const Q = gql`query {{ a }}`;").unwrap();

        let result = extract_from_file(file.path(), &ExtractConfig::default()).unwrap();
        assert_eq!(result.len(), 1);

        let unsupported = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = extract_from_file(unsupported.path(), &ExtractConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFileType(_)));
    }
}
