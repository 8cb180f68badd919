use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::catalog::{Catalog, CatalogError};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed catalog: {0}")]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

pub fn parse_document<T: DeserializeOwned>(text: &str, format: DocumentFormat) -> Result<T, SourceError> {
    let document = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text)?,
        DocumentFormat::Json => serde_json::from_str(text)?,
    };
    Ok(document)
}

pub fn parse_catalog(text: &str, format: DocumentFormat) -> Result<Catalog, SourceError> {
    let raw: serde_json::Value = parse_document(text, format)?;
    Ok(Catalog::build(raw)?)
}

pub async fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let text = fs::read_to_string(path).await.map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&text, DocumentFormat::from_path(path))
}

pub async fn load_catalog(path: &Path) -> Result<Catalog, SourceError> {
    debug!(path = %path.display(), "loading catalog");
    let raw: serde_json::Value = load_document(path).await?;
    Ok(Catalog::build(raw)?)
}
