//! Swagger from PHPDoc - Swagger metadata extracted from PHP doc-comment annotations.
//!
//! PHP projects document their HTTP APIs with `@SWG\...` annotations inside
//! `/** ... */` doc-comments. This library walks PHP source, pairs every
//! doc-comment with the class, property or method it documents, parses the
//! annotations and builds a graph of resources, apis, operations, models,
//! properties and reusable partials. Values left out of an annotation are
//! derived from the code it sits on.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively finds `.php` files
//! 2. [`lexer`] - Splits PHP source into tokens
//! 3. [`walker`] - Tracks namespace, imports and class members; attaches doc-comments
//! 4. [`annotations`] - Annotation types, the annotation parser seam and validation
//! 5. [`router`] - Applies [`defaults`] and files annotations into a [`registry`]
//! 6. [`parser`] - Runs the pipeline for one file
//! 7. [`document`] - Merges files into one document
//! 8. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use swagger_from_phpdoc::{
//!     document::DocumentBuilder,
//!     parser::SourceParser,
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//! };
//! use std::path::PathBuf;
//!
//! let scan_result = FileScanner::new(PathBuf::from("./my-php-app")).scan().unwrap();
//!
//! let parser = SourceParser::new();
//! let mut builder = DocumentBuilder::new();
//! for parsed in parser.parse_files(&scan_result.php_files).into_iter().flatten() {
//!     for diagnostic in parsed.diagnostics().entries() {
//!         eprintln!("{}", diagnostic);
//!     }
//!     builder.add_file(parsed);
//! }
//!
//! println!("{}", serialize_yaml(&builder.build()).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotations;
pub mod cli;
pub mod context;
pub mod defaults;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod router;
pub mod scanner;
pub mod serializer;
pub mod walker;
