use anyhow::Result;
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Directory names skipped unless the caller overrides the list.
const DEFAULT_EXCLUDES: &[&str] = &["vendor"];

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks a project directory to find all PHP
/// source files. Hidden directories (those starting with `.`) and excluded
/// directory names are skipped. A root that is itself a file is returned as-is.
///
/// # Example
///
/// ```no_run
/// use swagger_from_phpdoc::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} PHP files", result.php_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    excludes: Vec<String>,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Paths of all discovered `.php` files, sorted
    pub php_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root, skipping `vendor`.
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the excluded directory names.
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Scans the directory tree and collects all `.php` files.
    ///
    /// Entries that cannot be accessed are logged and added to the result as
    /// warnings, but scanning continues.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut php_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root itself
                if e.path() == self.root_path {
                    return true;
                }
                if !e.file_type().is_dir() {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && !self.excludes.iter().any(|x| *x == file_name)
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let is_php = path
                        .extension()
                        .and_then(|s| s.to_str())
                        .map_or(false, |ext| ext.eq_ignore_ascii_case("php"));
                    if entry.file_type().is_file() && is_php {
                        php_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        php_files.sort();
        Ok(ScanResult {
            php_files,
            warnings,
        })
    }
}
