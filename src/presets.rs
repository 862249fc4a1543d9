use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::PresetError;
use crate::settings::IconSettings;

/// Named icon settings, optionally mirrored to `<dir>/<name>.json`.
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    presets: BTreeMap<String, IconSettings>,
    directory: Option<PathBuf>,
}

impl PresetStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a directory backed store, creating the directory if needed.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, PresetError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        let mut presets = BTreeMap::new();
        for entry in fs::read_dir(&directory)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read_preset(&path) {
                Ok(settings) => {
                    debug!("loaded preset {} from {}", settings.name, path.display());
                    let name = settings.name.clone();
                    if presets.insert(name.clone(), settings).is_some() {
                        warn!(
                            "preset {name} is defined more than once; {} replaces the earlier file",
                            path.display()
                        );
                    }
                }
                Err(err) => warn!("skipping preset {}: {err}", path.display()),
            }
        }

        Ok(Self {
            presets,
            directory: Some(directory),
        })
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Preset names in sorted order.
    pub fn list(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&IconSettings> {
        self.presets.get(name)
    }

    pub fn load(&self, name: &str) -> Result<IconSettings, PresetError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    /// Inserts or replaces the preset named `settings.name`.
    pub fn save(&mut self, settings: IconSettings) -> Result<(), PresetError> {
        validate_name(&settings.name)?;
        if let Some(directory) = &self.directory {
            let json = serde_json::to_string_pretty(&settings)?;
            fs::write(preset_path(directory, &settings.name), json)?;
        }
        self.presets.insert(settings.name.clone(), settings);
        Ok(())
    }

    /// Removes a preset; returns whether it existed.
    pub fn delete(&mut self, name: &str) -> Result<bool, PresetError> {
        validate_name(name)?;
        let existed = self.presets.remove(name).is_some();
        if let Some(directory) = &self.directory {
            let path = preset_path(directory, name);
            if path.exists() {
                fs::remove_file(path)?;
                return Ok(true);
            }
        }
        Ok(existed)
    }
}

fn read_preset(path: &Path) -> Result<IconSettings, PresetError> {
    let json = fs::read_to_string(path)?;
    let mut settings: IconSettings = serde_json::from_str(&json)?;
    if settings.name.is_empty() {
        settings.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    validate_name(&settings.name)?;
    Ok(settings)
}

fn preset_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{name}.json"))
}

fn validate_name(name: &str) -> Result<(), PresetError> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.chars().any(|c| matches!(c, '/' | '\\') || c.is_control());
    if invalid {
        Err(PresetError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
