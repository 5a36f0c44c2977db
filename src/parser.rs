use crate::annotations::parser::{AnnotationParser, DocBlockParser};
use crate::annotations::{Annotation, Model, Resource};
use crate::diagnostics::Diagnostics;
use crate::lexer::Lexer;
use crate::registry::Registry;
use crate::router::CommentRouter;
use crate::walker::Walker;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Extracts Swagger annotations from PHP source files.
///
/// Each file is tokenized, walked for doc-comments, and every comment is
/// handed to the configured [`AnnotationParser`]. The resulting annotations
/// end up in a per-file [`Registry`].
///
/// # Example
///
/// ```no_run
/// use swagger_from_phpdoc::parser::SourceParser;
/// use std::path::Path;
///
/// let parser = SourceParser::new();
/// let mut parsed = parser.parse_file(Path::new("src/UserController.php")).unwrap();
/// println!("Found {} resources", parsed.resources().len());
/// ```
pub struct SourceParser {
    annotations: Box<dyn AnnotationParser + Send + Sync>,
}

/// The annotations extracted from one PHP file.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    registry: Registry,
}

impl ParsedFile {
    /// Valid resources, in declaration order.
    pub fn resources(&mut self) -> &[Resource] {
        self.registry.resources()
    }

    /// Valid models, in declaration order.
    pub fn models(&mut self) -> &[Model] {
        self.registry.models()
    }

    /// Partials by id.
    pub fn partials(&self) -> &BTreeMap<String, Annotation> {
        self.registry.partials()
    }

    /// Warnings and notices recorded so far, including those from validation.
    pub fn diagnostics(&self) -> &Diagnostics {
        self.registry.diagnostics()
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::with_annotation_parser(DocBlockParser)
    }
}

impl SourceParser {
    /// Creates a parser using the built-in [`DocBlockParser`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that reads doc-comments with a custom annotation parser.
    pub fn with_annotation_parser<P>(parser: P) -> Self
    where
        P: AnnotationParser + Send + Sync + 'static,
    {
        Self {
            annotations: Box::new(parser),
        }
    }

    /// Extracts annotations from PHP source text.
    ///
    /// `path` only labels diagnostics; nothing is read from disk. Problems in
    /// individual doc-comments are recorded as diagnostics and never abort the scan.
    pub fn parse_source(&self, path: &Path, source: &str) -> ParsedFile {
        let label = path.display().to_string();
        let mut registry = Registry::new(label.as_str());

        let attachments = Walker::walk(Lexer::new(source));
        debug!("{}: {} doc-comment(s)", label, attachments.len());

        let mut router = CommentRouter::new(self.annotations.as_ref(), &mut registry);
        for attachment in attachments {
            router.route(attachment);
        }

        ParsedFile {
            path: path.to_path_buf(),
            registry,
        }
    }

    /// Reads and parses a single PHP source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read as UTF-8 text.
    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(self.parse_source(path, &content))
    }

    /// Parses multiple files, continuing past the ones that cannot be read.
    pub fn parse_files(&self, paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| {
                self.parse_file(path).map_err(|e| {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    e
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}
