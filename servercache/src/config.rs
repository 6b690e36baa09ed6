use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "servercache.yaml";

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub prefs_path: Option<PathBuf>,
    pub busy_timeout_ms: Option<u64>,
    pub synchronous: Option<String>,
    pub log_level: Option<String>,
}

/// Reads `path`, or `./servercache.yaml` when no path is given and that file exists.
/// An explicit path that is missing, or any file that does not parse, is an error.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG_FILE);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg = serde_yaml::from_str(&s).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(Some(cfg))
}
