// User configuration and best-time records
// Persisted as TOML in the platform config directory

use chrono::Local;
use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

/// Difficulty presets and custom settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,                        // 9x9, 10 mines
    Medium,                      // 15x15, 111 mines
    Hard,                        // 20x20, 150 mines
    Custom(usize, usize, usize), // width, height, mines
}

impl Serialize for Difficulty {
    /// Stored by name; custom sizes live in their own fields
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Difficulty, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Difficulty::PRESETS
            .iter()
            .chain(std::iter::once(&Difficulty::Custom(0, 0, 0)))
            .find(|d| d.name() == s)
            .copied()
            .ok_or_else(|| serde::de::Error::custom(format!("unknown difficulty \"{s}\"")))
    }
}

impl Difficulty {
    pub const PRESETS: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Board dimensions (width, height, mine count)
    pub fn params(&self) -> (usize, usize, usize) {
        match self {
            Difficulty::Easy => (9, 9, 10),
            Difficulty::Medium => (15, 15, 111),
            Difficulty::Hard => (20, 20, 150),
            Difficulty::Custom(w, h, n) => (*w, *h, *n),
        }
    }

    /// Stable identifier used in the config file
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Custom(_, _, _) => "Custom",
        }
    }

    pub fn to_index(&self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
            Difficulty::Custom(_, _, _) => 3,
        }
    }

    pub fn from_index(i: usize, custom: (usize, usize, usize)) -> Difficulty {
        match i {
            0 => Difficulty::Easy,
            1 => Difficulty::Medium,
            2 => Difficulty::Hard,
            _ => Difficulty::Custom(custom.0, custom.1, custom.2),
        }
    }

    /// Preset matching a board size, Custom otherwise
    pub fn from_params(w: usize, h: usize, n: usize) -> Difficulty {
        Difficulty::PRESETS
            .into_iter()
            .find(|d| d.params() == (w, h, n))
            .unwrap_or(Difficulty::Custom(w, h, n))
    }
}

/// Best completion time
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub secs: u64,
    pub date: String, // YYYY-MM-DD
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,

    pub best_easy: Option<Record>,
    pub best_medium: Option<Record>,
    pub best_hard: Option<Record>,

    pub custom_w: usize,
    pub custom_h: usize,
    pub custom_n: usize,

    pub ascii_icons: bool,
    pub language: String,           // "en" or "zh"
    pub save_dir: Option<PathBuf>,  // Overrides the platform data directory
}

impl Default for Config {
    fn default() -> Self {
        let system_lang = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
        let language = if system_lang.to_lowercase().starts_with("zh") {
            "zh"
        } else {
            "en"
        };
        Config {
            difficulty: Difficulty::Easy,
            best_easy: None,
            best_medium: None,
            best_hard: None,
            custom_w: 30,
            custom_h: 16,
            custom_n: 99,
            ascii_icons: false,
            language: language.to_string(),
            save_dir: None,
        }
    }
}

impl Config {
    fn record_slot(&mut self, d: &Difficulty) -> Option<&mut Option<Record>> {
        match d {
            Difficulty::Easy => Some(&mut self.best_easy),
            Difficulty::Medium => Some(&mut self.best_medium),
            Difficulty::Hard => Some(&mut self.best_hard),
            Difficulty::Custom(_, _, _) => None,
        }
    }

    /// Best time for a preset; Custom has no records
    pub fn get_record(&self, d: &Difficulty) -> Option<&Record> {
        match d {
            Difficulty::Easy => self.best_easy.as_ref(),
            Difficulty::Medium => self.best_medium.as_ref(),
            Difficulty::Hard => self.best_hard.as_ref(),
            Difficulty::Custom(_, _, _) => None,
        }
    }

    /// Keep `secs` if it beats the stored record. Returns true on a new record.
    pub fn set_record(&mut self, d: &Difficulty, secs: u64) -> bool {
        let Some(slot) = self.record_slot(d) else {
            return false;
        };
        if slot.as_ref().is_some_and(|r| r.secs <= secs) {
            return false;
        }
        *slot = Some(Record {
            secs,
            date: Local::now().format("%Y-%m-%d").to_string(),
        });
        true
    }

    pub fn custom_params(&self) -> (usize, usize, usize) {
        (self.custom_w, self.custom_h, self.custom_n)
    }

    /// Parse TOML text, rebuilding Custom from the stored sizes
    pub fn from_toml(s: &str) -> Result<Config, toml::de::Error> {
        let mut cfg: Config = toml::from_str(s)?;
        if matches!(cfg.difficulty, Difficulty::Custom(_, _, _)) {
            cfg.difficulty = Difficulty::Custom(cfg.custom_w, cfg.custom_h, cfg.custom_n);
        }
        Ok(cfg)
    }

    /// Directory used when saving games
    pub fn save_dir(&self) -> PathBuf {
        self.save_dir
            .clone()
            .or_else(crate::swp_state::default_save_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "xhbl", "swpr")
}

/// Config file location, e.g. ~/.config/swpr/swpr.toml on Linux
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.config_dir().join("swpr.toml"))
}

/// Directory for the log file
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|p| p.data_dir().to_path_buf())
}

/// Load configuration from disk, or write and return the defaults
pub fn load_or_create_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(s) => match Config::from_toml(&s) {
                Ok(cfg) => return cfg,
                Err(e) => warn!("ignoring malformed config {}: {e}", path.display()),
            },
            Err(e) => warn!("cannot read config {}: {e}", path.display()),
        }
    }
    let cfg = Config::default();
    write_config(&path, &cfg);
    cfg
}

/// Save configuration to disk as TOML
pub fn save_config(cfg: &Config) {
    if let Some(path) = config_path() {
        write_config(&path, cfg);
    }
}

fn write_config(path: &Path, cfg: &Config) {
    let text = match toml::to_string(cfg) {
        Ok(s) => s,
        Err(e) => {
            warn!("cannot serialize config: {e}");
            return;
        }
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match fs::write(path, text) {
        Ok(()) => debug!("config written to {}", path.display()),
        Err(e) => warn!("cannot write config {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swp_board::validate;

    fn sample() -> Config {
        Config {
            language: "en".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn presets_match_documented_sizes() {
        assert_eq!(Difficulty::Easy.params(), (9, 9, 10));
        assert_eq!(Difficulty::Medium.params(), (15, 15, 111));
        assert_eq!(Difficulty::Hard.params(), (20, 20, 150));
        for d in Difficulty::PRESETS {
            let (w, h, n) = d.params();
            assert!(validate(w, h, n).is_ok(), "{}", d.name());
        }
    }

    #[test]
    fn toml_round_trip_keeps_custom() {
        let mut cfg = sample();
        cfg.custom_w = 12;
        cfg.custom_h = 8;
        cfg.custom_n = 20;
        cfg.difficulty = Difficulty::Custom(12, 8, 20);
        cfg.best_easy = Some(Record {
            secs: 31,
            date: "2026-01-02".to_string(),
        });

        let text = toml::to_string(&cfg).unwrap();
        assert!(text.contains("difficulty = \"Custom\""));
        let back = Config::from_toml(&text).unwrap();

        assert_eq!(back, cfg);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = Config::from_toml("difficulty = \"Hard\"\n").unwrap();
        assert_eq!(cfg.difficulty, Difficulty::Hard);
        assert_eq!(cfg.custom_params(), (30, 16, 99));
        assert!(cfg.best_hard.is_none());
    }

    #[test]
    fn unknown_difficulty_is_rejected() {
        assert!(Config::from_toml("difficulty = \"Nightmare\"\n").is_err());
    }

    #[test]
    fn record_only_improves() {
        let mut cfg = sample();
        assert!(cfg.set_record(&Difficulty::Medium, 120));
        assert!(!cfg.set_record(&Difficulty::Medium, 150));
        assert!(!cfg.set_record(&Difficulty::Medium, 120));
        assert!(cfg.set_record(&Difficulty::Medium, 99));
        assert_eq!(cfg.get_record(&Difficulty::Medium).map(|r| r.secs), Some(99));
        assert!(!cfg.set_record(&Difficulty::Custom(5, 5, 3), 1));
    }

    #[test]
    fn index_and_params_lookup() {
        assert_eq!(Difficulty::from_index(1, (0, 0, 0)), Difficulty::Medium);
        assert_eq!(
            Difficulty::from_index(3, (4, 5, 6)),
            Difficulty::Custom(4, 5, 6)
        );
        assert_eq!(Difficulty::from_params(20, 20, 150), Difficulty::Hard);
        assert_eq!(
            Difficulty::from_params(9, 9, 11),
            Difficulty::Custom(9, 9, 11)
        );
    }
}
