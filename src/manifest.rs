use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

/// The subset of a `package.json` this tool cares about. Every other field is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct PackageManifest {
    pub scripts: Option<IndexMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub name: String,
    pub command: String,
}

impl ScriptEntry {
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.command)
    }
}

impl PackageManifest {
    /// Scripts in document order. Empty when the manifest declares none.
    pub fn script_entries(&self) -> Vec<ScriptEntry> {
        self.scripts
            .iter()
            .flatten()
            .map(|(name, command)| ScriptEntry {
                name: name.clone(),
                command: command.clone(),
            })
            .collect()
    }
}

/// Result of reading one manifest. Callers must branch on it before touching scripts.
#[derive(Debug)]
pub enum ManifestLoad {
    Parsed(PackageManifest),
    NotFound,
    Unreadable(io::Error),
    ParseError(serde_json::Error),
}

impl ManifestLoad {
    pub fn describe_failure(&self) -> Option<String> {
        match self {
            ManifestLoad::Parsed(_) => None,
            ManifestLoad::NotFound => Some("file not found".to_string()),
            ManifestLoad::Unreadable(err) => Some(format!("could not read file: {err}")),
            ManifestLoad::ParseError(err) => Some(format!("invalid JSON: {err}")),
        }
    }
}

pub fn load_manifest(path: &Path) -> ManifestLoad {
    let resolved = resolve(path);
    tracing::debug!(path = %resolved.display(), "loading manifest");

    let outcome = match fs::read_to_string(&resolved) {
        Ok(data) => parse_manifest(&data),
        Err(err) if err.kind() == io::ErrorKind::NotFound => ManifestLoad::NotFound,
        Err(err) => ManifestLoad::Unreadable(err),
    };

    if let Some(reason) = outcome.describe_failure() {
        // The caller reports the failure to the operator.
        tracing::debug!(path = %resolved.display(), %reason, "failed to load manifest");
    }
    outcome
}

pub fn parse_manifest(data: &str) -> ManifestLoad {
    match serde_json::from_str(data) {
        Ok(manifest) => ManifestLoad::Parsed(manifest),
        Err(err) => ManifestLoad::ParseError(err),
    }
}

fn resolve(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
