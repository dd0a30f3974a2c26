//! Configuration primitives and loader for the markdown-template toolkit.
//!
//! Settings are resolved from a stack of layers:
//! override flag → working directory → git root → built-in defaults.
//! Each layer is parsed from TOML into partial settings that remember where
//! every value came from, so relative paths resolve against the file that
//! declared them and validation messages can name the offending file.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".markdown-template.toml";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub templates: TemplateSettings,
    pub output: OutputSettings,
    pub render: RenderSettings,
    pub sources: ConfigSources,
}

/// Where template definitions live.
#[derive(Clone, Debug)]
pub struct TemplateSettings {
    pub dir: PathBuf,
}

/// Where saved documents go and in which format by default.
#[derive(Clone, Debug)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub format: OutputFormat,
}

/// Defaults applied to render requests that leave them unspecified.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub locale: Locale,
    pub max_words: Option<usize>,
    pub expand: bool,
    pub enhanced: bool,
}

/// Serialisation target for generated documents.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "md")]
    Markdown,
    Html,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }

    /// File extension conventionally used for the format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            _ => Err(()),
        }
    }
}

/// Language used for default placeholder text, metadata labels and padding.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Zh => "zh",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Locale {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "zh" | "zh-CN" => Ok(Locale::Zh),
            "en" | "en-US" => Ok(Locale::En),
            _ => Err(()),
        }
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
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

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
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
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

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

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            templates: resolved.templates,
            output: resolved.output,
            render: resolved.render,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Built-in defaults rooted at `base_dir`, without reading any files.
    pub fn defaults_in(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let source = ConfigSource::default(base_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(source.clone()));
        let resolved = merged
            .finalize()
            .unwrap_or_else(|err| panic!("built-in defaults are invalid: {err}"));
        Config {
            templates: resolved.templates,
            output: resolved.output,
            render: resolved.render,
            sources: ConfigSources {
                working_directory: base_dir,
                layers: vec![source],
            },
        }
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
    PartialConfig {
        templates_dir: Some(Located::new(PathBuf::from("templates"), source.clone())),
        output_dir: Some(Located::new(PathBuf::from("output"), source.clone())),
        output_format: Some(Located::new("markdown".into(), source.clone())),
        locale: Some(Located::new("zh".into(), source.clone())),
        max_words: None,
        expand: Some(Located::new(false, source.clone())),
        enhanced: Some(Located::new(false, source)),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

struct ResolvedConfig {
    templates: TemplateSettings,
    output: OutputSettings,
    render: RenderSettings,
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    templates_dir: Option<Located<PathBuf>>,
    output_dir: Option<Located<PathBuf>>,
    output_format: Option<Located<String>>,
    locale: Option<Located<String>>,
    max_words: Option<Located<i64>>,
    expand: Option<Located<bool>>,
    enhanced: Option<Located<bool>>,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        if other.templates_dir.is_some() {
            self.templates_dir = other.templates_dir;
        }
        if other.output_dir.is_some() {
            self.output_dir = other.output_dir;
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.locale.is_some() {
            self.locale = other.locale;
        }
        if other.max_words.is_some() {
            self.max_words = other.max_words;
        }
        if other.expand.is_some() {
            self.expand = other.expand;
        }
        if other.enhanced.is_some() {
            self.enhanced = other.enhanced;
        }
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let fallback = || ConfigSource::default(PathBuf::from("."));

        let templates_dir = self
            .templates_dir
            .unwrap_or_else(|| Located::new(PathBuf::from("templates"), fallback()));
        check_path(&templates_dir, "templates.dir", &mut errors);

        let output_dir = self
            .output_dir
            .unwrap_or_else(|| Located::new(PathBuf::from("output"), fallback()));
        check_path(&output_dir, "output.dir", &mut errors);

        let format = self
            .output_format
            .map(|located| {
                parse_choice::<OutputFormat>(
                    located,
                    "output.format",
                    "markdown, html, json",
                    &mut errors,
                )
            })
            .unwrap_or_default();

        let locale = self
            .locale
            .map(|located| parse_choice::<Locale>(located, "render.locale", "zh, en", &mut errors))
            .unwrap_or_default();

        let max_words = self.max_words.and_then(|located| {
            if located.value <= 0 {
                errors.push(
                    ConfigValidationError::new(
                        Some(located.source.clone()),
                        format!("must be greater than 0 (received {})", located.value),
                    )
                    .with_context("render.max_words"),
                );
                None
            } else {
                Some(located.value as usize)
            }
        });

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            templates: TemplateSettings {
                dir: resolve_path(&templates_dir),
            },
            output: OutputSettings {
                dir: resolve_path(&output_dir),
                format,
            },
            render: RenderSettings {
                locale,
                max_words,
                expand: self.expand.map(|located| located.value).unwrap_or(false),
                enhanced: self.enhanced.map(|located| located.value).unwrap_or(false),
            },
        })
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

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

fn check_path(
    located: &Located<PathBuf>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) {
    if located.value.as_os_str().is_empty() {
        errors.push(
            ConfigValidationError::new(Some(located.source.clone()), "cannot be empty".into())
                .with_context(context),
        );
    }
}

fn parse_choice<T>(
    located: Located<String>,
    context: &str,
    expected: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> T
where
    T: std::str::FromStr + Default,
{
    match located.value.parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            errors.push(
                ConfigValidationError::new(
                    Some(located.source),
                    format!("unknown value '{}' (expected one of {expected})", located.value),
                )
                .with_context(context),
            );
            T::default()
        }
    }
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
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

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
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
struct RawConfig {
    #[serde(default)]
    templates: Option<RawTemplates>,
    #[serde(default)]
    output: Option<RawOutput>,
    #[serde(default)]
    render: Option<RawRender>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let mut partial = PartialConfig::default();
        if let Some(templates) = self.templates {
            partial.templates_dir = templates
                .dir
                .map(|value| Located::new(value, source.clone()));
        }
        if let Some(output) = self.output {
            partial.output_dir = output.dir.map(|value| Located::new(value, source.clone()));
            partial.output_format = output
                .format
                .map(|value| Located::new(value, source.clone()));
        }
        if let Some(render) = self.render {
            partial.locale = render.locale.map(|value| Located::new(value, source.clone()));
            partial.max_words = render
                .max_words
                .map(|value| Located::new(value, source.clone()));
            partial.expand = render.expand.map(|value| Located::new(value, source.clone()));
            partial.enhanced = render.enhanced.map(|value| Located::new(value, source));
        }
        partial
    }
}

#[derive(Debug, Deserialize)]
struct RawTemplates {
    #[serde(default)]
    dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    #[serde(default)]
    dir: Option<PathBuf>,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRender {
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    max_words: Option<i64>,
    #[serde(default)]
    expand: Option<bool>,
    #[serde(default)]
    enhanced: Option<bool>,
}
