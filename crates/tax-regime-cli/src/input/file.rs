use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

/// Read a JSON or YAML file into a typed struct.
pub fn read_document<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let value = read_document_value(path)?;
    serde_json::from_value(value).map_err(|e| format!("Invalid content in '{}': {}", path, e).into())
}

/// Read a JSON or YAML file as a generic `serde_json::Value`.
///
/// The format follows the extension; files without a known extension are
/// tried as JSON first, then YAML.
pub fn read_document_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    parse_document(&contents, DocumentFormat::from_path(&resolved))
        .map_err(|e| format!("Failed to parse '{}': {}", resolved.display(), e).into())
}

pub fn parse_document(
    contents: &str,
    format: Option<DocumentFormat>,
) -> Result<Value, Box<dyn std::error::Error>> {
    match format {
        Some(DocumentFormat::Json) => Ok(serde_json::from_str(contents)?),
        Some(DocumentFormat::Yaml) => Ok(serde_yaml::from_str(contents)?),
        None => match serde_json::from_str(contents) {
            Ok(value) => Ok(value),
            Err(json_err) => serde_yaml::from_str(contents)
                .map_err(|_| format!("neither valid JSON nor YAML ({json_err})").into()),
        },
    }
}

fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !resolved.exists() {
        return Err(format!("File not found: {}", resolved.display()).into());
    }
    if !resolved.is_file() {
        return Err(format!("Not a file: {}", resolved.display()).into());
    }
    Ok(resolved)
}
