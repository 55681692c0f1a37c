//! Configuration loader for the subler-tag toolkit.
//!
//! Settings resolve through a fixed precedence stack:
//! built-in defaults → working-directory `.subler-tag.toml` → override file →
//! `SUBLER_CLI_PATH` (executable only).
//! Parsed layers are merged and validated into a typed [`Config`].

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use subler_tag_core::{CommandFlags, MediaKind, DEFAULT_EXECUTABLE, EXECUTABLE_ENV_VAR};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".subler-tag.toml";

const NO_MEDIA_KIND: &str = "none";

/// Complete configuration resolved from defaults, files and environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub executable: PathBuf,
    pub media_kind: Option<MediaKind>,
    pub strict_tags: bool,
    pub flags: CommandFlags,
    pub sources: ConfigSources,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/local/override/environment).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn environment(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Environment,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn is_file(&self) -> bool {
        self.path.is_some()
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (ConfigSourceKind::Environment, _) => format!("environment {EXECUTABLE_ENV_VAR}"),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    Local,
    Override,
    Environment,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
            ConfigSourceKind::Environment => "environment",
        };
        f.write_str(label)
    }
}

/// Where the executable override variable is read from.
#[derive(Clone, Debug, Default)]
pub enum EnvOverride {
    /// Read `SUBLER_CLI_PATH` from the process environment.
    #[default]
    Process,
    /// Use this value as if it were the variable's contents.
    Value(OsString),
    /// Ignore the environment.
    Disabled,
}

impl EnvOverride {
    fn executable(&self) -> Option<OsString> {
        let value = match self {
            EnvOverride::Process => env::var_os(EXECUTABLE_ENV_VAR),
            EnvOverride::Value(value) => Some(value.clone()),
            EnvOverride::Disabled => None,
        };
        value.filter(|value| !value.is_empty())
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub env: EnvOverride,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvOverride) -> Self {
        self.env = env;
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = defaults_layer(default_source.clone());
        let mut source_layers = vec![default_source];

        let local_config_path = working_dir.join(CONFIG_FILE_NAME);
        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(value) = options.env.executable() {
            let source = ConfigSource::environment(working_dir.clone());
            merged.executable = Some(Located::new(PathBuf::from(value), source.clone()));
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        debug!(
            executable = %resolved.executable.display(),
            layers = source_layers.len(),
            "loaded configuration"
        );

        Ok(Config {
            executable: resolved.executable,
            media_kind: resolved.media_kind,
            strict_tags: resolved.strict_tags,
            flags: resolved.flags,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    let flags = CommandFlags::default();
    PartialConfig {
        executable: Some(Located::new(PathBuf::from(DEFAULT_EXECUTABLE), source.clone())),
        media_kind: Some(Located::new(
            MediaKind::default().label().to_string(),
            source.clone(),
        )),
        strict_tags: Some(Located::new(false, source.clone())),
        chapters_preview: Some(Located::new(flags.chapters_preview, source.clone())),
        optimize: Some(Located::new(flags.optimize, source.clone())),
        organize_groups: Some(Located::new(flags.organize_groups, source.clone())),
        chunk_64bit: Some(Located::new(flags.chunk_64bit, source)),
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    executable: Option<Located<PathBuf>>,
    media_kind: Option<Located<String>>,
    strict_tags: Option<Located<bool>>,
    chapters_preview: Option<Located<bool>>,
    optimize: Option<Located<bool>>,
    organize_groups: Option<Located<bool>>,
    chunk_64bit: Option<Located<bool>>,
}

struct ResolvedConfig {
    executable: PathBuf,
    media_kind: Option<MediaKind>,
    strict_tags: bool,
    flags: CommandFlags,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        fn take<T>(slot: &mut Option<Located<T>>, other: Option<Located<T>>) {
            if other.is_some() {
                *slot = other;
            }
        }

        take(&mut self.executable, other.executable);
        take(&mut self.media_kind, other.media_kind);
        take(&mut self.strict_tags, other.strict_tags);
        take(&mut self.chapters_preview, other.chapters_preview);
        take(&mut self.optimize, other.optimize);
        take(&mut self.organize_groups, other.organize_groups);
        take(&mut self.chunk_64bit, other.chunk_64bit);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let defaults = CommandFlags::default();

        let executable = match self.executable {
            Some(located) if located.value.as_os_str().is_empty() => {
                errors.push(ConfigValidationError::new(
                    Some(located.source),
                    "executable cannot be empty".into(),
                ));
                PathBuf::new()
            }
            Some(located) => resolve_executable(&located),
            None => PathBuf::from(DEFAULT_EXECUTABLE),
        };

        let media_kind = match self.media_kind {
            Some(located) => parse_media_kind(located, &mut errors),
            None => Some(MediaKind::default()),
        };

        let flag = |value: Option<Located<bool>>, fallback: bool| {
            value.map(|located| located.value).unwrap_or(fallback)
        };
        let flags = CommandFlags {
            chapters_preview: flag(self.chapters_preview, defaults.chapters_preview),
            optimize: flag(self.optimize, defaults.optimize),
            organize_groups: flag(self.organize_groups, defaults.organize_groups),
            chunk_64bit: flag(self.chunk_64bit, defaults.chunk_64bit),
        };

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            executable,
            media_kind,
            strict_tags: flag(self.strict_tags, false),
            flags,
        })
    }
}

/// Relative paths with a directory component are taken relative to the file
/// that declared them; bare program names are left for `PATH` lookup.
fn resolve_executable(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    let bare = path.components().count() == 1;
    if path.is_absolute() || bare || !located.source.is_file() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

fn parse_media_kind(
    located: Located<String>,
    errors: &mut Vec<ConfigValidationError>,
) -> Option<MediaKind> {
    if located.value.eq_ignore_ascii_case(NO_MEDIA_KIND) {
        return None;
    }

    match located.value.parse::<MediaKind>() {
        Ok(kind) => Some(kind),
        Err(err) => {
            errors.push(
                ConfigValidationError::new(
                    Some(located.source),
                    format!("{err} (expected one of: {})", MediaKind::labels().join(", ")),
                )
                .with_context("media_kind"),
            );
            None
        }
    }
}

/// Aggregated validation failures.
#[derive(Clone, Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    executable: Option<PathBuf>,
    #[serde(default)]
    media_kind: Option<String>,
    #[serde(default)]
    strict_tags: Option<bool>,
    #[serde(default)]
    flags: Option<RawFlags>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFlags {
    #[serde(default)]
    chapters_preview: Option<bool>,
    #[serde(default)]
    optimize: Option<bool>,
    #[serde(default)]
    organize_groups: Option<bool>,
    #[serde(default)]
    chunk_64bit: Option<bool>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let locate = |value: Option<bool>| value.map(|value| Located::new(value, source.clone()));
        let flags = self.flags.unwrap_or_default();
        PartialConfig {
            executable: self
                .executable
                .map(|value| Located::new(value, source.clone())),
            media_kind: self
                .media_kind
                .map(|value| Located::new(value, source.clone())),
            strict_tags: locate(self.strict_tags),
            chapters_preview: locate(flags.chapters_preview),
            optimize: locate(flags.optimize),
            organize_groups: locate(flags.organize_groups),
            chunk_64bit: locate(flags.chunk_64bit),
        }
    }
}
