use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DxConfig {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub keys: KeysConfig,
}

/// [watch] section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// [diff] section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiffConfig {
    /// Similarity percentage passed to `--find-renames`
    #[serde(default = "default_rename_threshold")]
    pub rename_threshold: u8,
    #[serde(default)]
    pub ignore_whitespace: bool,
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,
}

/// [keys] section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeysConfig {
    /// How long a pending `g` waits for its second key
    #[serde(default = "default_chord_timeout_ms")]
    pub chord_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_rename_threshold() -> u8 {
    50
}

fn default_tab_width() -> usize {
    4
}

fn default_chord_timeout_ms() -> u64 {
    1000
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            rename_threshold: default_rename_threshold(),
            ignore_whitespace: false,
            tab_width: default_tab_width(),
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            chord_timeout_ms: default_chord_timeout_ms(),
        }
    }
}

impl KeysConfig {
    pub fn chord_timeout(&self) -> Duration {
        Duration::from_millis(self.chord_timeout_ms)
    }
}

/// Load config by merging global defaults with per-repo overrides.
/// Priority: per-repo `.diff-explore.toml` > global `<config dir>/diff-explore/config.toml` > built-in defaults.
/// Merging is deep: individual fields within sections (e.g. `[diff]`) override independently.
pub fn load_config(repo_root: &Path) -> DxConfig {
    let global_path = dirs::config_dir().map(|d| d.join("diff-explore").join("config.toml"));
    let local_path = repo_root.join(".diff-explore.toml");
    load_from(global_path.as_deref(), &local_path)
}

fn load_from(global_path: Option<&Path>, local_path: &Path) -> DxConfig {
    let global_table = global_path.and_then(read_table);
    let local_table = read_table(local_path);

    let merged = match (global_table, local_table) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            toml::Value::Table(global)
        }
        (Some(global), None) => toml::Value::Table(global),
        (None, Some(local)) => toml::Value::Table(local),
        (None, None) => return DxConfig::default(),
    };

    merged.try_into().unwrap_or_else(|e| {
        tracing::warn!("ignoring invalid config: {}", e);
        DxConfig::default()
    })
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<toml::Table>(&content) {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::warn!("could not parse {}: {}", path.display(), e);
            None
        }
    }
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(
    base: &mut toml::map::Map<String, toml::Value>,
    overlay: toml::map::Map<String, toml::Value>,
) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
