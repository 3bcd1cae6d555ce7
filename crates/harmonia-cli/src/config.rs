use std::path::PathBuf;

use harmonia_core::{Mode, DEFAULT_TEMPO_BPM};

#[derive(serde::Serialize, serde::Deserialize, Default)]
pub(crate) struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub notation: NotationConfig,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub(crate) struct PlaybackConfig {
    #[serde(default = "default_tempo")]
    pub tempo_bpm: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: default_tempo(),
        }
    }
}

fn default_tempo() -> u32 {
    DEFAULT_TEMPO_BPM
}

#[derive(serde::Serialize, serde::Deserialize, Default)]
pub(crate) struct NotationConfig {
    #[serde(default)]
    pub use_flats: bool,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub(crate) struct FieldConfig {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default)]
    pub mode: Mode,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            mode: Mode::default(),
        }
    }
}

fn default_root() -> String {
    "C".to_string()
}

#[derive(serde::Serialize, serde::Deserialize, Default)]
pub(crate) struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    pub fn store_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("harmonia")
                .join("progressions.json")
        })
    }
}

pub(crate) fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("harmonia")
        .join("config.toml")
}

pub(crate) fn load_config() -> AppConfig {
    let path = config_path();
    std::fs::read_to_string(&path)
        .ok()
        .and_then(|s| toml::from_str(&s).ok())
        .unwrap_or_default()
}

/// Write `config` to the default location, returning the path written
pub(crate) fn save_config(config: &AppConfig) -> anyhow::Result<PathBuf> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(config)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = toml::from_str("[notation]\nuse_flats = true\n[field]\nmode = \"minor\"\n").unwrap();
        assert!(config.notation.use_flats);
        assert_eq!(config.field.mode, Mode::Minor);
        assert_eq!(config.field.root, "C");
        assert_eq!(config.playback.tempo_bpm, DEFAULT_TEMPO_BPM);
        assert!(config.store_path().ends_with("harmonia/progressions.json"));
    }

    #[test]
    fn test_empty_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.playback.tempo_bpm, 120);
        assert!(!config.notation.use_flats);
    }
}
