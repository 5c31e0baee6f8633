//! Startup configuration
//!
//! Read once from TOML. Individual malformed entries never fail the load:
//! they are dropped with a warning and the built-in default stands in.
//!
//! ```toml
//! [app]
//! title = "BeoplayRemote"
//!
//! [sources]
//! enabled = true
//! hide_types = ["LINE IN", "BLUETOOTH"]
//!
//! [hotkeys]
//! enabled = true
//! volume_step = 4
//!
//! [hotkeys.keys]
//! VolumeUp = "111"
//! Mute = 109
//!
//! [tune_in]
//! enabled = true
//! stations = [{ id = "s24861", name = "DR P3" }]
//!
//! [volume]
//! debounce_ms = 1000
//!
//! [connection]
//! connect_timeout_ms = 5000
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::hotkeys::{Command, HotkeyBindings};
use crate::radio::RadioPreset;

pub const DEFAULT_TITLE: &str = "BeoplayRemote";
pub const DEFAULT_VOLUME_STEP: u8 = 4;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcesConfig {
    /// Fetch and show the source catalog at all
    pub enabled: bool,
    /// Lower-cased source types to hide
    pub hide_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyConfig {
    pub enabled: bool,
    /// Delta applied by VolumeUp/VolumeDown
    pub volume_step: u8,
    /// Validated per-command key overrides
    pub keys: BTreeMap<Command, u16>,
}

impl HotkeyConfig {
    pub fn bindings(&self) -> HotkeyBindings {
        HotkeyBindings::with_overrides(&self.keys)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuneInConfig {
    pub enabled: bool,
    pub stations: Vec<RadioPreset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub title: String,
    pub sources: SourcesConfig,
    pub hotkeys: HotkeyConfig,
    pub tune_in: TuneInConfig,
    /// Quiet period after the last slider move before remote volume is
    /// trusted again
    pub debounce: Duration,
    pub connect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            sources: SourcesConfig {
                enabled: true,
                hide_types: Vec::new(),
            },
            hotkeys: HotkeyConfig {
                enabled: true,
                volume_step: DEFAULT_VOLUME_STEP,
                keys: BTreeMap::new(),
            },
            tune_in: TuneInConfig {
                enabled: true,
                stations: Vec::new(),
            },
            debounce: DEFAULT_DEBOUNCE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Parse a TOML document
    ///
    /// Fails only if the document itself is not valid TOML. A section or key
    /// with the wrong shape falls back to its default without touching the
    /// rest of the file.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let document: toml::Table = toml::from_str(s)?;
        Ok(Self::from_document(&document))
    }

    /// Read and parse the file at `path`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Default location: `<config dir>/beoremote/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("beoremote").join("config.toml"))
    }

    /// Load from the default location, or defaults if that fails
    pub fn load_or_default() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("{}; using defaults", e);
                Self::default()
            }),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    fn from_document(document: &toml::Table) -> Self {
        let defaults = Self::default();

        let app = Section::get(document, "app");
        let sources = Section::get(document, "sources");
        let hotkeys = Section::get(document, "hotkeys");
        let tune_in = Section::get(document, "tune_in");
        let volume = Section::get(document, "volume");
        let connection = Section::get(document, "connection");

        let hide_types = sources
            .array("hide_types")
            .iter()
            .filter_map(|value| match value {
                toml::Value::String(s) => Some(s.trim().to_lowercase()),
                other => {
                    tracing::warn!("sources.hide_types: ignoring non-string entry {}", other);
                    None
                }
            })
            .collect();

        let mut keys = BTreeMap::new();
        for (name, value) in hotkeys.table("keys").into_iter().flatten() {
            let Some(command) = Command::from_name(name) else {
                tracing::warn!("hotkeys.keys: unknown command {:?}, ignoring", name);
                continue;
            };
            match parse_key_code(value) {
                Some(code) => {
                    keys.insert(command, code);
                }
                None => tracing::warn!(
                    "hotkeys.{}: invalid key code {}, using default {}",
                    command,
                    value,
                    command.default_key_code()
                ),
            }
        }

        let volume_step = match hotkeys.value("volume_step") {
            None => DEFAULT_VOLUME_STEP,
            Some(value) => positive_integer(value)
                .and_then(|step| u8::try_from(step).ok())
                .unwrap_or_else(|| {
                    tracing::warn!(
                        "hotkeys.volume_step: invalid value {}, using default {}",
                        value,
                        DEFAULT_VOLUME_STEP
                    );
                    DEFAULT_VOLUME_STEP
                }),
        };

        let stations = tune_in
            .array("stations")
            .iter()
            .filter_map(|value| match value.clone().try_into::<RadioPreset>() {
                Ok(preset) => Some(preset),
                Err(e) => {
                    tracing::warn!("tune_in.stations: ignoring entry {}: {}", value, e);
                    None
                }
            })
            .collect();

        Self {
            title: app.string("title").unwrap_or(defaults.title),
            sources: SourcesConfig {
                enabled: sources.flag("enabled", defaults.sources.enabled),
                hide_types,
            },
            hotkeys: HotkeyConfig {
                enabled: hotkeys.flag("enabled", defaults.hotkeys.enabled),
                volume_step,
                keys,
            },
            tune_in: TuneInConfig {
                enabled: tune_in.flag("enabled", defaults.tune_in.enabled),
                stations,
            },
            debounce: millis(volume.value("debounce_ms"), "volume.debounce_ms", defaults.debounce),
            connect_timeout: millis(
                connection.value("connect_timeout_ms"),
                "connection.connect_timeout_ms",
                defaults.connect_timeout,
            ),
        }
    }
}

/// One top-level table of the document
///
/// Every accessor checks the shape of a single key and logs and returns
/// nothing on a mismatch, so one bad value never costs its neighbours.
struct Section<'a> {
    name: &'static str,
    table: Option<&'a toml::Table>,
}

impl<'a> Section<'a> {
    fn get(document: &'a toml::Table, name: &'static str) -> Self {
        let table = match document.get(name) {
            None => None,
            Some(toml::Value::Table(table)) => Some(table),
            Some(other) => {
                tracing::warn!(
                    "[{}]: expected a table, found {}, using defaults",
                    name,
                    other.type_str()
                );
                None
            }
        };
        Self { name, table }
    }

    fn value(&self, key: &str) -> Option<&'a toml::Value> {
        self.table?.get(key)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.value(key) {
            None => default,
            Some(toml::Value::Boolean(b)) => *b,
            Some(other) => {
                tracing::warn!(
                    "{}.{}: expected a boolean, found {}, using default {}",
                    self.name,
                    key,
                    other,
                    default
                );
                default
            }
        }
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            toml::Value::String(s) => Some(s.clone()),
            other => {
                tracing::warn!("{}.{}: expected a string, found {}", self.name, key, other);
                None
            }
        }
    }

    fn array(&self, key: &str) -> &'a [toml::Value] {
        match self.value(key) {
            None => &[],
            Some(toml::Value::Array(items)) => items.as_slice(),
            Some(other) => {
                tracing::warn!("{}.{}: expected a list, found {}", self.name, key, other);
                &[]
            }
        }
    }

    fn table(&self, key: &str) -> Option<&'a toml::Table> {
        match self.value(key)? {
            toml::Value::Table(table) => Some(table),
            other => {
                tracing::warn!("{}.{}: expected a table, found {}", self.name, key, other);
                None
            }
        }
    }
}

/// Base-10 key code given as a string ("111") or an integer (111)
fn parse_key_code(value: &toml::Value) -> Option<u16> {
    match value {
        toml::Value::String(s) => s.trim().parse::<u16>().ok(),
        toml::Value::Integer(i) => u16::try_from(*i).ok(),
        _ => None,
    }
}

fn positive_integer(value: &toml::Value) -> Option<u64> {
    match value {
        toml::Value::Integer(i) if *i > 0 => u64::try_from(*i).ok(),
        _ => None,
    }
}

fn millis(value: Option<&toml::Value>, key: &str, default: Duration) -> Duration {
    match value {
        None => default,
        Some(value) => match positive_integer(value) {
            Some(ms) => Duration::from_millis(ms),
            None => {
                tracing::warn!("{}: invalid value {}, using default {:?}", key, value, default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_full_document() {
        let config = SessionConfig::from_toml_str(
            r#"
            [app]
            title = "Remote"

            [sources]
            enabled = false
            hide_types = ["LINE IN", "Bluetooth"]

            [hotkeys]
            enabled = false
            volume_step = 6

            [hotkeys.keys]
            VolumeUp = "126"
            VolumeDown = 125

            [tune_in]
            enabled = false
            stations = [{ id = "s24861", name = "DR P3" }, { id = "s1", name = "One" }]

            [volume]
            debounce_ms = 250

            [connection]
            connect_timeout_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.title, "Remote");
        assert!(!config.sources.enabled);
        assert_eq!(config.sources.hide_types, vec!["line in", "bluetooth"]);
        assert!(!config.hotkeys.enabled);
        assert_eq!(config.hotkeys.volume_step, 6);
        assert_eq!(config.hotkeys.keys.get(&Command::VolumeUp), Some(&126));
        assert_eq!(config.hotkeys.keys.get(&Command::VolumeDown), Some(&125));
        assert!(!config.tune_in.enabled);
        assert_eq!(config.tune_in.stations.len(), 2);
        assert_eq!(config.tune_in.stations[0], RadioPreset::new("s24861", "DR P3"));
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[rstest]
    #[case("\"abc\"")]
    #[case("\"-1\"")]
    #[case("70000")]
    #[case("true")]
    #[case("\"0x6f\"")]
    fn test_unparsable_hotkey_falls_back_to_default(#[case] value: &str) {
        let config =
            SessionConfig::from_toml_str(&format!("[hotkeys.keys]\nVolumeUp = {}\n", value))
                .unwrap();

        assert!(config.hotkeys.keys.is_empty());
        let bindings = config.hotkeys.bindings();
        assert_eq!(
            bindings.key_code_for(Command::VolumeUp),
            Some(Command::VolumeUp.default_key_code())
        );
        assert_eq!(bindings.get(111), Some(Command::VolumeUp));
    }

    #[test]
    fn test_unknown_hotkey_command_ignored() {
        let config = SessionConfig::from_toml_str("[hotkeys.keys]\nShuffle = \"1\"\n").unwrap();
        assert!(config.hotkeys.keys.is_empty());
    }

    #[rstest]
    #[case("0")]
    #[case("-3")]
    #[case("\"four\"")]
    #[case("300")]
    fn test_invalid_volume_step_uses_default(#[case] value: &str) {
        let config =
            SessionConfig::from_toml_str(&format!("[hotkeys]\nvolume_step = {}\n", value)).unwrap();
        assert_eq!(config.hotkeys.volume_step, DEFAULT_VOLUME_STEP);
    }

    #[test]
    fn test_malformed_entries_dropped() {
        let config = SessionConfig::from_toml_str(
            r#"
            [sources]
            hide_types = ["LINE IN", 3, "TUNEIN"]

            [tune_in]
            stations = [{ id = "s1", name = "One" }, { id = "s2" }, "s3"]

            [volume]
            debounce_ms = "soon"
            "#,
        )
        .unwrap();

        assert_eq!(config.sources.hide_types, vec!["line in", "tunein"]);
        assert_eq!(config.tune_in.stations, vec![RadioPreset::new("s1", "One")]);
        assert_eq!(config.debounce, DEFAULT_DEBOUNCE);
    }

    #[rstest]
    #[case::hide_types_not_a_list("[sources]\nhide_types = \"LINE IN\"\n")]
    #[case::sources_enabled_not_a_bool("[sources]\nenabled = \"yes\"\n")]
    #[case::hotkeys_enabled_not_a_bool("[hotkeys]\nenabled = \"yes\"\n")]
    #[case::keys_not_a_table("[hotkeys]\nkeys = 111\n")]
    #[case::stations_not_a_list("[tune_in]\nstations = \"s1\"\n")]
    #[case::tune_in_enabled_not_a_bool("[tune_in]\nenabled = 1\n")]
    #[case::title_not_a_string("[app]\ntitle = 5\n")]
    #[case::section_not_a_table("sources = [\"LINE IN\"]\n")]
    fn test_wrong_shape_resets_only_that_key(#[case] bad: &str) {
        // the bad key goes first so the good ones follow in their own tables
        let document = format!(
            "{}\n[volume]\ndebounce_ms = 250\n\n[connection]\nconnect_timeout_ms = 2000\n",
            bad
        );
        let config = SessionConfig::from_toml_str(&document).unwrap();
        let defaults = SessionConfig::default();

        assert_eq!(config.sources, defaults.sources);
        assert_eq!(config.hotkeys, defaults.hotkeys);
        assert_eq!(config.tune_in, defaults.tune_in);
        assert_eq!(config.title, defaults.title);
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_bad_hide_types_keeps_rest_of_file() {
        let config = SessionConfig::from_toml_str(
            r#"
            [app]
            title = "Mine"

            [sources]
            hide_types = "LINE IN"
            enabled = false

            [hotkeys]
            enabled = "yes"
            volume_step = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.title, "Mine");
        assert!(config.sources.hide_types.is_empty());
        assert!(!config.sources.enabled);
        assert!(config.hotkeys.enabled);
        assert_eq!(config.hotkeys.volume_step, 10);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            SessionConfig::from_toml_str("[sources"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[app]\ntitle = \"From File\"").unwrap();

        let config = SessionConfig::load_from(file.path()).unwrap();
        assert_eq!(config.title, "From File");
    }

    #[test]
    fn test_load_missing_file() {
        let result = SessionConfig::load_from(Path::new("/nonexistent/beoremote/config.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
