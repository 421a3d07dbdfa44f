use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File path to description, in file order.
pub type Catalog = Map<String, Value>;

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("catalog {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog {} must be a JSON object, found {found}", .path.display())]
    NotAnObject { path: PathBuf, found: &'static str },
}

/// Reads catalogs from a data directory. Nothing is cached: every call goes
/// back to disk so edits to the index are visible on the next invocation.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    data_dir: PathBuf,
}

impl CatalogStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, catalog_file: &str) -> PathBuf {
        self.data_dir.join(catalog_file)
    }

    pub fn load(&self, catalog_file: &str) -> Result<Catalog, CatalogLoadError> {
        load_catalog(&self.path_for(catalog_file))
    }
}

pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_str(&contents).map_err(|source| CatalogLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    match value {
        Value::Object(entries) => {
            debug!(path = %path.display(), entries = entries.len(), "catalog loaded");
            Ok(entries)
        }
        other => Err(CatalogLoadError::NotAnObject {
            path: path.to_path_buf(),
            found: value_kind(&other),
        }),
    }
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
