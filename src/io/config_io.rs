use std::fs;
use std::path::{Path, PathBuf};

use crate::io::document_io::DocumentError;
use crate::model::config::Config;

/// Config file looked for next to the task document
pub const CONFIG_FILE_NAME: &str = ".taskit.toml";

/// Where the config for `document` lives: the explicit path if given,
/// otherwise `.taskit.toml` in the document's directory.
pub fn config_path(explicit: Option<&Path>, document: &Path) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => document
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .join(CONFIG_FILE_NAME),
    }
}

/// Load the config for `document`. A missing implicit config means defaults;
/// a missing explicit one is an error.
pub fn load_config(explicit: Option<&Path>, document: &Path) -> Result<Config, DocumentError> {
    let path = config_path(explicit, document);
    if explicit.is_none() && !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| DocumentError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}
