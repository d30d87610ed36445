// Configuration loading and validation (config/dugout.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use dugout_core::query::WeightBy;
use dugout_scrape::{CatalogEntry, LeagueCatalog, PassOptions, RetryPolicy};

pub const CONFIG_FILE: &str = "dugout.toml";

/// Shipped defaults, written out when no project directory is available.
const DEFAULT_CONFIG: &str = include_str!("../defaults/dugout.toml");

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// dugout.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub fetch: FetchConfig,
    pub stats: StatsConfig,
    /// The season's league catalog.
    #[serde(default)]
    pub leagues: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub backup_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub concurrency: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    pub min_plate_appearances: u32,
    pub weight: WeightBy,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}

impl Config {
    pub fn pass_options(&self) -> PassOptions {
        PassOptions {
            retry: self.fetch.retry_policy(),
            concurrency: self.fetch.concurrency,
        }
    }

    pub fn catalog(&self) -> LeagueCatalog {
        LeagueCatalog::new(self.leagues.clone())
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/dugout.toml` relative to `base_dir`.
///
/// Does not copy defaults; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    load_config_file(&base_dir.join("config").join(CONFIG_FILE))
}

/// Load and validate one config file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Give a project directory its `config/dugout.toml`, copied from
/// `defaults/dugout.toml` when missing. Returns the path written, if any.
///
/// A project with `config/` but no defaults is left for the loader to report.
pub fn ensure_project_config(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let shipped = base_dir.join("defaults").join(CONFIG_FILE);
    if !shipped.is_file() {
        if config_dir.exists() {
            return Ok(None);
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no config/{CONFIG_FILE} or defaults/{CONFIG_FILE} in {}; \
                 run from the project root or pass --config",
                base_dir.display()
            ),
        });
    }

    let content = std::fs::read(&shipped).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read {}: {e}", shipped.display()),
    })?;
    seed(&config_dir, &content).map(|written| written.then_some(target))
}

/// Resolve and load the configuration.
///
/// An explicit `path` is loaded as-is. Otherwise the working directory is used
/// when it holds `config/` or `defaults/`, falling back to the per-user config
/// directory, which is seeded with the shipped defaults on first use.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return load_config_file(path);
    }

    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if cwd.join("config").exists() || cwd.join("defaults").exists() {
        ensure_project_config(&cwd)?;
        return load_config_from(&cwd);
    }

    let dir = user_config_dir().ok_or_else(|| ConfigError::DefaultsCopyError {
        message: "no home directory to hold the user config".into(),
    })?;
    let path = seed_user_config(&dir)?;
    load_config_file(&path)
}

/// Platform config directory for dugout (e.g. `~/.config/dugout`).
pub fn user_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dugout").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Write the shipped defaults into `dir` unless a config is already there.
pub fn seed_user_config(dir: &Path) -> Result<PathBuf, ConfigError> {
    seed(dir, DEFAULT_CONFIG.as_bytes())?;
    Ok(dir.join(CONFIG_FILE))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Write `content` as `dir/dugout.toml` unless that file exists. Returns
/// whether it was written.
fn seed(dir: &Path, content: &[u8]) -> Result<bool, ConfigError> {
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", dir.display()),
    })?;
    write_new(&dir.join(CONFIG_FILE), content)
}

/// Create `target` with `content`. Returns false if it already existed.
fn write_new(target: &Path, content: &[u8]) -> Result<bool, ConfigError> {
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, content).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.store.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "store.path".into(),
            message: "must not be empty".into(),
        });
    }

    let fetch = &config.fetch;
    let positive: &[(&str, u64)] = &[
        ("fetch.timeout_secs", fetch.timeout_secs),
        ("fetch.max_attempts", u64::from(fetch.max_attempts)),
        ("fetch.concurrency", fetch.concurrency as u64),
    ];
    for (name, val) in positive {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if fetch.base_backoff_ms > fetch.max_backoff_ms {
        return Err(ConfigError::ValidationError {
            field: "fetch.base_backoff_ms".into(),
            message: format!(
                "must not exceed fetch.max_backoff_ms ({} > {})",
                fetch.base_backoff_ms, fetch.max_backoff_ms
            ),
        });
    }

    for (i, league) in config.leagues.iter().enumerate() {
        if league.label.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("leagues[{i}].label"),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    /// A base dir whose config/dugout.toml is the shipped default with
    /// `from` replaced by `to`.
    fn base_with(from: &str, to: &str) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        assert!(DEFAULT_CONFIG.contains(from), "default config lacks `{from}`");
        fs::write(config_dir.join(CONFIG_FILE), DEFAULT_CONFIG.replace(from, to)).unwrap();
        tmp
    }

    fn expect_validation(base: &Path, expected_field: &str) {
        match load_config_from(base).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_project_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults = tmp.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            defaults.join(CONFIG_FILE),
        )
        .unwrap();

        ensure_project_config(tmp.path()).expect("should copy default config");
        let config = load_config_from(tmp.path()).expect("should load valid config");

        assert_eq!(config.store.path, PathBuf::from("data/season.json"));
        assert_eq!(config.store.backup_dir, PathBuf::from("data/backups"));
        assert_eq!(config.fetch.timeout(), Duration::from_secs(20));
        assert_eq!(config.fetch.concurrency, 4);
        assert_eq!(config.stats.min_plate_appearances, 10);
        assert_eq!(config.stats.weight, WeightBy::PlateAppearances);

        let catalog = config.catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.find("thursday coed").map(|e| e.url.as_str()), Some(""));

        let options = config.pass_options();
        assert_eq!(options.concurrency, 4);
        assert_eq!(options.retry.max_attempts, 3);
        assert_eq!(options.retry.backoff(1), Duration::from_millis(500));
    }

    #[test]
    fn leagues_table_is_optional() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        let without_leagues = DEFAULT_CONFIG
            .split("[[leagues]]")
            .next()
            .unwrap()
            .to_string();
        fs::write(&path, without_leagues).unwrap();

        let config = load_config_file(&path).unwrap();
        assert!(config.catalog().is_empty());
    }

    #[test]
    fn weight_accepts_each_variant() {
        let tmp = base_with("weight = \"plate_appearances\"", "weight = \"uniform\"");
        let config = load_config_from(tmp.path()).unwrap();
        assert_eq!(config.stats.weight, WeightBy::Uniform);
    }

    #[test]
    fn rejects_zero_attempts() {
        let tmp = base_with("max_attempts = 3", "max_attempts = 0");
        expect_validation(tmp.path(), "fetch.max_attempts");
    }

    #[test]
    fn rejects_zero_concurrency() {
        let tmp = base_with("concurrency = 4", "concurrency = 0");
        expect_validation(tmp.path(), "fetch.concurrency");
    }

    #[test]
    fn rejects_zero_timeout() {
        let tmp = base_with("timeout_secs = 20", "timeout_secs = 0");
        expect_validation(tmp.path(), "fetch.timeout_secs");
    }

    #[test]
    fn rejects_backoff_base_above_max() {
        let tmp = base_with("base_backoff_ms = 500", "base_backoff_ms = 9000");
        expect_validation(tmp.path(), "fetch.base_backoff_ms");
    }

    #[test]
    fn rejects_empty_store_path() {
        let tmp = base_with("path = \"data/season.json\"", "path = \"\"");
        expect_validation(tmp.path(), "store.path");
    }

    #[test]
    fn rejects_blank_league_label() {
        let tmp = base_with("label = \"Wednesday Mens\"", "label = \" \"");
        expect_validation(tmp.path(), "leagues[1].label");
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with("config/dugout.toml"));
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = base_with("[stats]", "[stats");
        assert!(matches!(
            load_config_from(tmp.path()).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
    }

    #[test]
    fn parse_error_for_unknown_weight() {
        let tmp = base_with("weight = \"plate_appearances\"", "weight = \"at_bats\"");
        assert!(matches!(
            load_config_from(tmp.path()).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
    }

    #[test]
    fn project_config_is_copied_once_from_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults = tmp.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join(CONFIG_FILE), DEFAULT_CONFIG).unwrap();

        let target = tmp.path().join("config").join(CONFIG_FILE);
        assert_eq!(ensure_project_config(tmp.path()).unwrap(), Some(target.clone()));

        // An edited config is never overwritten.
        fs::write(&target, "edited").unwrap();
        assert_eq!(ensure_project_config(tmp.path()).unwrap(), None);
        assert_eq!(fs::read_to_string(&target).unwrap(), "edited");
    }

    #[test]
    fn config_dir_without_defaults_is_left_to_the_loader() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        assert_eq!(ensure_project_config(tmp.path()).unwrap(), None);
        assert!(matches!(
            load_config_from(tmp.path()).unwrap_err(),
            ConfigError::FileNotFound { .. }
        ));
    }

    #[test]
    fn project_without_config_or_defaults_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            ensure_project_config(tmp.path()).unwrap_err(),
            ConfigError::DefaultsCopyError { .. }
        ));
    }

    #[test]
    fn seed_user_config_writes_defaults_once() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("user");
        let path = seed_user_config(&dir).unwrap();
        assert!(load_config_file(&path).is_ok());

        fs::write(&path, "kept").unwrap();
        seed_user_config(&dir).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");
    }
}
