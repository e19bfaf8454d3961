use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{builder::DefaultState, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use url::Url;

pub use duration::Duration;

mod duration;

/// The bundled default configuration, always loaded first.
pub const DEFAULT_CONFIG: &str = include_str!("../../config.toml");

/// Colon separated list of additional config files layered on top of the
/// defaults.
pub const CONFIG_PATHS_ENV: &str = "FOLIO_CONFIG";

const ENV_PREFIX: &str = "FOLIO";
const ENV_SEPARATOR: &str = "__";

/// Loads the configuration from the defaults, the files listed in
/// `FOLIO_CONFIG` and `FOLIO__*` environment variables (in this order).
pub fn load() -> anyhow::Result<Config> {
    let paths = std::env::var_os(CONFIG_PATHS_ENV)
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    builder(&paths, &[])?
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

/// Loads the configuration from the defaults, the given files and inline
/// TOML `overrides`, ignoring the environment.
pub fn load_with_override(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
) -> anyhow::Result<Config> {
    builder(paths, overrides)?
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

fn builder(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
) -> anyhow::Result<ConfigBuilder<DefaultState>> {
    let builder = config::Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    let builder = paths.iter().try_fold(builder, |builder, path| {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let source = File::from_str(&content, FileFormat::Toml);
        anyhow::Ok(builder.add_source(source))
    })?;

    Ok(overrides.iter().fold(builder, |builder, &content| {
        builder.add_source(File::from_str(content, FileFormat::Toml))
    }))
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub contact: ContactConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
    pub recaptcha: Option<RecaptchaConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub relay_endpoint: Option<String>,
    pub relay_base_url_override: Option<Url>,
    pub fallback_email: String,
    pub subject_tag: String,
    pub soft_limit: usize,
    pub hard_limit: usize,
    pub cooldown: Duration,
    pub success_notice: Duration,
    pub draft_debounce: Duration,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
pub struct RecaptchaConfig {
    pub sitekey: String,
    pub token_endpoint: Url,
    #[serde(default = "default_recaptcha_action")]
    pub action: String,
}

fn default_recaptcha_action() -> String {
    "submit".into()
}
