//! Serialization of the extracted [`Document`] to YAML or JSON.

use crate::document::Document;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a document to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &Document) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize document to YAML")
}

/// Serializes a document to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &Document) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize document to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// Overwrites the file if it already exists.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentBuilder;
    use crate::parser::SourceParser;
    use tempfile::TempDir;

    const SOURCE: &str = r#"<?php
/**
 * @SWG\Resource(resourcePath="/pet", basePath="http://petstore.example")
 */
class PetController
{
    /**
     * @SWG\Api(
     *   @SWG\Operation(method="GET", summary="Find pets", responseClass="Pet")
     * )
     */
    public function findAction() {}
}

/**
 * @SWG\Model(id="Pet")
 */
class Pet
{
    /**
     * @SWG\Property
     * @var int
     */
    public $id;
}
"#;

    /// Helper function to create a small document for testing
    fn create_test_document() -> Document {
        let parsed = SourceParser::new().parse_source(Path::new("Pet.php"), SOURCE);
        let mut builder = DocumentBuilder::new().with_info(
            "Test API".to_string(),
            "1.0.0".to_string(),
            Some("A test API".to_string()),
        );
        builder.add_file(parsed);
        builder.build()
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("resourcePath: /pet"));
        assert!(yaml.contains("path: /pet/find"));
        assert!(yaml.contains("nickname: findAction"));
        assert!(yaml.contains("responseClass: Pet"));

        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["models"][0]["id"], serde_yaml::Value::from("Pet"));
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["info"]["title"], "Test API");
        assert_eq!(parsed["resources"][0]["resourcePath"], "/pet");
        assert_eq!(parsed["resources"][0]["basePath"], "http://petstore.example");
        assert_eq!(parsed["resources"][0]["apis"][0]["operations"][0]["method"], "GET");
        assert_eq!(parsed["models"][0]["properties"][0]["name"], "id");
        assert_eq!(parsed["models"][0]["properties"][0]["type"], "int");
        assert_eq!(parsed["models"][0]["sourceType"], "Pet");
        assert!(parsed.get("partials").is_none());
    }

    #[test]
    fn test_serialize_json_pretty_format() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("  "));
        assert!(json.lines().count() > 5, "Pretty printed JSON should have multiple lines");
    }

    #[test]
    fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.yaml");

        write_to_file("test content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "test content");
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("test.yaml");

        write_to_file("test content", &file_path).unwrap();

        assert!(file_path.exists());
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.yaml");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }

    #[test]
    fn test_write_json_file_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("swagger.json");

        let json = serialize_json(&create_test_document()).unwrap();
        write_to_file(&json, &file_path).unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["info"]["title"], "Test API");
    }
}
