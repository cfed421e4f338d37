// src/store.rs
//
// Local file layout: raw HTML snapshots under data/raw, normalized JSON
// under data/normalized. Everything is relative to the working directory.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{NORMALIZED_DIR, RAW_DIR};

pub fn raw_path(name: &str) -> PathBuf {
    PathBuf::from(RAW_DIR).join(name)
}

pub fn normalized_path(name: &str) -> PathBuf {
    PathBuf::from(NORMALIZED_DIR).join(name)
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Snapshot the raw page for diffing and offline re-parses.
pub fn save_raw_html(name: &str, html: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = raw_path(name);
    ensure_parent(&path)?;
    fs::write(&path, html)?;
    logf!("store: wrote {}", path.display());
    Ok(path)
}

pub fn save_json<T: Serialize>(name: &str, value: &T) -> Result<PathBuf, Box<dyn Error>> {
    let path = normalized_path(name);
    ensure_parent(&path)?;
    fs::write(&path, serde_json::to_string_pretty(value)?)?;
    logf!("store: wrote {}", path.display());
    Ok(path)
}

pub fn load_json<T: DeserializeOwned>(name: &str) -> Result<T, Box<dyn Error>> {
    let path = normalized_path(name);
    let text = fs::read_to_string(&path)
        .map_err(|e| format!("read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}
