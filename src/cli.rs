use crate::document::DocumentBuilder;
use crate::error::Error;
use crate::parser::{ParsedFile, SourceParser};
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Swagger from PHPDoc - Extract Swagger resources and models from @SWG annotations in PHP code
#[derive(Parser, Debug)]
#[command(name = "swagger-from-phpdoc")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to a PHP project directory or a single PHP file
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Directory name to skip while scanning (repeatable, default: vendor)
    #[arg(short = 'e', long = "exclude", value_name = "DIR")]
    pub exclude: Vec<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        return Err(Error::InvalidArgument(format!(
            "Project path does not exist: {}",
            args.project_path.display()
        ))
        .into());
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }
    if !args.exclude.is_empty() {
        info!("Excluded directories: {:?}", args.exclude);
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting Swagger extraction...");

    // Step 1: Scan for PHP files
    info!("Scanning project...");
    let mut scanner = FileScanner::new(args.project_path.clone());
    if !args.exclude.is_empty() {
        scanner = scanner.with_excludes(args.exclude.clone());
    }
    let scan_result = scanner.scan()?;

    info!("Found {} PHP files", scan_result.php_files.len());
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }

    if scan_result.php_files.is_empty() {
        return Err(Error::NoSourceFiles.into());
    }

    // Step 2: Extract annotations from every file
    info!("Parsing PHP files...");
    let parser = SourceParser::new();
    let mut parsed_files: Vec<ParsedFile> = parser
        .parse_files(&scan_result.php_files)
        .into_iter()
        .filter_map(|r| match r {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping file due to read error: {}", e);
                None
            }
        })
        .collect();

    info!("Successfully parsed {} files", parsed_files.len());

    // Step 3: Validate per file and count what survived
    let mut resource_count = 0;
    let mut model_count = 0;
    let mut diagnostic_count = 0;
    for parsed in &mut parsed_files {
        resource_count += parsed.resources().len();
        model_count += parsed.models().len();
        diagnostic_count += parsed.diagnostics().len();
    }

    if resource_count == 0 && model_count == 0 {
        warn!("No Swagger resources or models found in the project");
    }

    // Step 4: Merge into one document
    info!("Building document...");
    let mut builder = DocumentBuilder::new();
    for parsed in parsed_files {
        builder.add_file(parsed);
    }
    let document = builder.build();

    // Step 5: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    // Step 6: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
    } else {
        println!("{}", content);
    }

    info!("Extraction complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", scan_result.php_files.len());
    info!("  - Resources: {}", document.resources.len());
    info!("  - Models: {}", document.models.len());
    info!("  - Partials: {}", document.partials.len());
    info!("  - Diagnostics: {}", diagnostic_count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(project_path: PathBuf, output_path: Option<PathBuf>) -> CliArgs {
        CliArgs {
            project_path,
            output_format: OutputFormat::Json,
            output_path,
            exclude: Vec::new(),
            verbose: false,
        }
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::try_parse_from([
            "swagger-from-phpdoc",
            "app",
            "-f",
            "json",
            "-o",
            "out.json",
            "-e",
            "vendor",
            "--exclude",
            "cache",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.project_path, PathBuf::from("app"));
        assert!(matches!(args.output_format, OutputFormat::Json));
        assert_eq!(args.output_path, Some(PathBuf::from("out.json")));
        assert_eq!(args.exclude, vec!["vendor", "cache"]);
        assert!(args.verbose);
    }

    #[test]
    fn test_missing_project_path_is_rejected() {
        let result = parse_args_from_parsed(args(PathBuf::from("/nonexistent/project"), None));

        let message = result.unwrap_err().to_string();
        assert!(message.contains("/nonexistent/project"));
    }

    #[test]
    fn test_run_fails_without_php_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("readme.md"), "# README").unwrap();

        let err = run(args(temp_dir.path().to_path_buf(), None)).unwrap_err();

        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoSourceFiles)));
    }

    #[test]
    fn test_run_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("UserController.php"),
            r#"<?php
/** @SWG\Resource */
class UserController {
    /** @SWG\Api(@SWG\Operation(method="GET")) */
    public function listAction() {}
}
"#,
        )
        .unwrap();
        let output = temp_dir.path().join("out/swagger.json");

        run(args(temp_dir.path().to_path_buf(), Some(output.clone()))).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(json["resources"][0]["resourcePath"], "/user");
        assert_eq!(json["resources"][0]["apis"][0]["path"], "/user/list");
    }
}
