//! Vault settings: built-in defaults deep-merged with YAML overlays.
//!
//! Order (later wins):
//! 1) built-in defaults
//! 2) `<vault>/.omni-vault.yaml`
//! 3) file named by `OMNI_VAULT_CONFIG`
//! 4) explicit file (CLI `--conf`)

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

use crate::analysis::OrphanPolicy;
use crate::chunker::ChunkerConfig;
use crate::error::{Result, VaultError};

/// Environment variable naming an extra settings file.
pub const VAULT_CONFIG_ENV: &str = "OMNI_VAULT_CONFIG";
/// Settings file looked up at the vault root.
pub const VAULT_CONFIG_FILE: &str = ".omni-vault.yaml";

const DEFAULT_SENTINEL_DIR: &str = ".obsidian";
const DEFAULT_NOTE_EXTENSION: &str = "md";
/// Directory names never walked, in addition to hidden directories.
pub const DEFAULT_EXCLUDED_DIR_NAMES: &[&str] = &[".git", ".trash", "node_modules", "target"];
const DEFAULT_ATTACHMENT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "svg", "webp", "avif", "tiff", "ico", "mp3", "wav", "ogg",
    "m4a", "flac", "3gp", "webm", "mp4", "mov", "mkv", "avi", "ogv", "pdf",
];

/// All settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// Layout of the vault on disk.
    pub vault: VaultLayoutSettings,
    /// Graph analysis knobs.
    pub analysis: AnalysisSettings,
    /// Content chunking.
    pub chunking: ChunkerConfig,
    /// Semantic hand-off.
    pub semantic: SemanticSettings,
}

/// Layout of the vault on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultLayoutSettings {
    /// Subdirectory that marks a directory as a vault.
    pub sentinel_dir: String,
    /// Note file extension without the dot.
    pub note_extension: String,
    /// Extra directory names to skip while walking.
    pub excluded_dirs: Vec<String>,
    /// Link target extensions treated as attachments (lowercase, no dot).
    pub attachment_extensions: Vec<String>,
}

/// Graph analysis knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Shared keyword count needed for a keyword suggestion.
    pub keyword_min_overlap: usize,
    /// Minimum keyword length in characters.
    pub keyword_min_length: usize,
    /// How attachment links count toward orphan detection.
    pub orphan_policy: OrphanPolicy,
    /// Window for "recent" notes in the summary.
    pub recent_days: u32,
    /// Number of hub notes listed in the summary.
    pub top_hubs: usize,
}

/// Semantic hand-off settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticSettings {
    /// Notes per embedding batch.
    pub batch_size: usize,
}

impl Default for VaultLayoutSettings {
    fn default() -> Self {
        Self {
            sentinel_dir: DEFAULT_SENTINEL_DIR.to_string(),
            note_extension: DEFAULT_NOTE_EXTENSION.to_string(),
            excluded_dirs: Vec::new(),
            attachment_extensions: DEFAULT_ATTACHMENT_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            keyword_min_overlap: 5,
            keyword_min_length: 4,
            orphan_policy: OrphanPolicy::default(),
            recent_days: 7,
            top_hubs: 5,
        }
    }
}

impl Default for SemanticSettings {
    fn default() -> Self {
        Self { batch_size: 32 }
    }
}

impl VaultLayoutSettings {
    /// Built-in plus configured excluded directory names.
    #[must_use]
    pub fn all_excluded_dirs(&self) -> Vec<String> {
        let mut out: Vec<String> = DEFAULT_EXCLUDED_DIR_NAMES
            .iter()
            .map(|name| (*name).to_string())
            .collect();
        for name in &self.excluded_dirs {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        out
    }
}

fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    deep_merge(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (_, Value::Null) => {}
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn read_yaml_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        VaultError::InvalidConfig(format!("cannot read '{}': {err}", path.display()))
    })?;
    serde_yaml::from_str::<Value>(&content)
        .map_err(|err| VaultError::InvalidConfig(format!("'{}': {err}", path.display())))
}

fn normalize_extension(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_start_matches('.').to_lowercase();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

impl VaultSettings {
    /// Load settings for a vault, honoring `OMNI_VAULT_CONFIG` and an explicit file.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] when a named file is unreadable,
    /// not YAML, or the merged values fail validation.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let env_file = std::env::var(VAULT_CONFIG_ENV)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
        Self::load_from_sources(root, env_file.as_deref(), explicit)
    }

    /// [`VaultSettings::load`] with the environment file passed in.
    ///
    /// # Errors
    ///
    /// See [`VaultSettings::load`].
    pub fn load_from_sources(
        root: &Path,
        env_file: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<Self> {
        let mut overlays = Vec::new();
        let vault_file = root.join(VAULT_CONFIG_FILE);
        if vault_file.is_file() {
            overlays.push(read_yaml_file(&vault_file)?);
        }
        if let Some(path) = env_file {
            overlays.push(read_yaml_file(path)?);
        }
        if let Some(path) = explicit {
            overlays.push(read_yaml_file(path)?);
        }
        Self::from_overlays(overlays)
    }

    /// Merge one YAML document onto the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] on malformed YAML or invalid values.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let overlay = serde_yaml::from_str::<Value>(text)
            .map_err(|err| VaultError::InvalidConfig(err.to_string()))?;
        Self::from_overlays(vec![overlay])
    }

    fn from_overlays(overlays: Vec<Value>) -> Result<Self> {
        let mut merged = serde_yaml::to_value(Self::default())
            .map_err(|err| VaultError::InvalidConfig(err.to_string()))?;
        for overlay in overlays {
            if !matches!(overlay, Value::Mapping(_) | Value::Null) {
                return Err(VaultError::InvalidConfig(
                    "settings document must be a mapping".to_string(),
                ));
            }
            deep_merge(&mut merged, overlay);
        }
        let mut settings: Self = serde_yaml::from_value(merged)
            .map_err(|err| VaultError::InvalidConfig(err.to_string()))?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    fn normalize(&mut self) {
        let mut extensions: Vec<String> = self
            .vault
            .attachment_extensions
            .iter()
            .filter_map(|ext| normalize_extension(ext))
            .collect();
        extensions.sort();
        extensions.dedup();
        self.vault.attachment_extensions = extensions;
        if let Some(ext) = normalize_extension(&self.vault.note_extension) {
            self.vault.note_extension = ext;
        }
        self.vault.sentinel_dir = self.vault.sentinel_dir.trim().to_string();
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.vault.sentinel_dir.is_empty() {
            return Err(VaultError::InvalidConfig(
                "vault.sentinel_dir must not be empty".to_string(),
            ));
        }
        if self.vault.note_extension.trim().is_empty() {
            return Err(VaultError::InvalidConfig(
                "vault.note_extension must not be empty".to_string(),
            ));
        }
        if self.analysis.keyword_min_length == 0 {
            return Err(VaultError::InvalidConfig(
                "analysis.keyword_min_length must be positive".to_string(),
            ));
        }
        if self.semantic.batch_size == 0 {
            return Err(VaultError::InvalidConfig(
                "semantic.batch_size must be positive".to_string(),
            ));
        }
        self.chunking.validate()
    }
}
