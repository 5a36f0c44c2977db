//! Swagger from PHPDoc - command-line tool extracting Swagger metadata from PHP projects.
//!
//! Scans a PHP project for `@SWG\...` annotations in doc-comments and prints the
//! extracted resources, models and partials as YAML or JSON.
//!
//! # Usage
//!
//! ```bash
//! swagger-from-phpdoc [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Write YAML to a file:
//! ```bash
//! swagger-from-phpdoc ./my-php-app -o swagger.yaml
//! ```
//!
//! JSON, skipping generated code:
//! ```bash
//! swagger-from-phpdoc ./my-php-app -f json -e vendor -e cache
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_from_phpdoc::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Swagger from PHPDoc starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("Swagger extraction completed successfully");

    Ok(())
}
