use std::path::{
  Path,
  PathBuf
};
use std::{
  env,
  fmt,
  fs
};

use anyhow::{
  Context,
  Result
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};
use tracing_subscriber::filter::LevelFilter;

use crate::cleaner::CleaningConfig;

pub const DEFAULT_CONFIG_FILE: &str =
  "cleantext.toml";
pub const CONFIG_ENV: &str =
  "CLEANTEXT_CONFIG";

#[derive(
  Clone,
  Debug,
  Default,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Config {
  #[serde(default)]
  pub rules:   CleaningConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
  #[serde(default)]
  pub sources: SourcesConfig
}

impl Config {
  pub fn load<P: AsRef<Path>>(
    path: P
  ) -> Result<Self> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
      let contents =
        fs::read_to_string(path_ref)
          .with_context(|| {
            format!(
              "read config {:?}",
              path_ref
            )
          })?;
      toml::from_str(&contents)
        .with_context(|| {
          format!(
            "parse config {:?}",
            path_ref
          )
        })
    } else {
      Ok(Self::default())
    }
  }

  pub fn save<P: AsRef<Path>>(
    &self,
    path: P
  ) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)
        .with_context(|| {
          format!(
            "create config directory \
             {:?}",
            parent
          )
        })?;
    }
    let serialized =
      self.to_toml()?;
    fs::write(path, serialized)
      .with_context(|| {
        format!(
          "write config to {:?}",
          path
        )
      })?;
    Ok(())
  }

  pub fn to_toml(
    &self
  ) -> Result<String> {
    toml::to_string_pretty(self)
      .context(
        "serialize cleantext config"
      )
  }
}

/// `--config` beats `CLEANTEXT_CONFIG`,
/// which beats `./cleantext.toml`.
pub fn resolve_path(
  explicit: Option<&Path>
) -> PathBuf {
  resolve_path_with(
    explicit,
    env::var_os(CONFIG_ENV)
      .map(PathBuf::from)
  )
}

fn resolve_path_with(
  explicit: Option<&Path>,
  from_env: Option<PathBuf>
) -> PathBuf {
  if let Some(path) = explicit {
    path.to_path_buf()
  } else if let Some(path) = from_env
    .filter(|p| {
      !p.as_os_str().is_empty()
    })
  {
    path
  } else {
    PathBuf::from(DEFAULT_CONFIG_FILE)
  }
}

#[derive(
  Clone,
  Debug,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct LoggingConfig {
  #[serde(default = "default_level")]
  pub level: LogLevel
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_level()
    }
  }
}

#[derive(
  Clone, Copy, Debug, PartialEq, Eq,
)]
pub enum LogLevel {
  Off,
  Error,
  Warn,
  Info,
  Debug,
  Trace
}

impl LogLevel {
  const ALL: [LogLevel; 6] = [
    LogLevel::Off,
    LogLevel::Error,
    LogLevel::Warn,
    LogLevel::Info,
    LogLevel::Debug,
    LogLevel::Trace
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | LogLevel::Off => "off",
      | LogLevel::Error => "error",
      | LogLevel::Warn => "warn",
      | LogLevel::Info => "info",
      | LogLevel::Debug => "debug",
      | LogLevel::Trace => "trace"
    }
  }

  /// Each `-v` moves one step towards
  /// `trace`.
  pub fn raised_by(
    self,
    steps: u8
  ) -> Self {
    let current = Self::ALL
      .iter()
      .position(|level| *level == self)
      .unwrap_or_default();
    let raised = (current
      + usize::from(steps))
    .min(Self::ALL.len() - 1);
    Self::ALL[raised]
  }

  pub fn filter(self) -> LevelFilter {
    match self {
      | LogLevel::Off => {
        LevelFilter::OFF
      }
      | LogLevel::Error => {
        LevelFilter::ERROR
      }
      | LogLevel::Warn => {
        LevelFilter::WARN
      }
      | LogLevel::Info => {
        LevelFilter::INFO
      }
      | LogLevel::Debug => {
        LevelFilter::DEBUG
      }
      | LogLevel::Trace => {
        LevelFilter::TRACE
      }
    }
  }
}

impl Serialize for LogLevel {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      self.as_str()
    )
  }
}

impl<'de> Deserialize<'de> for LogLevel {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    struct LogLevelVisitor;

    impl<'de> serde::de::Visitor<'de>
      for LogLevelVisitor
    {
      type Value = LogLevel;

      fn expecting(
        &self,
        formatter: &mut fmt::Formatter<
          '_
        >
      ) -> fmt::Result {
        formatter.write_str(
          "off, error, warn, info, \
           debug, or trace"
        )
      }

      fn visit_str<E>(
        self,
        value: &str
      ) -> Result<Self::Value, E>
      where
        E: serde::de::Error
      {
        let normalized =
          value.trim().to_lowercase();
        let normalized =
          match normalized.as_str() {
            | "warning" => "warn",
            | other => other
          };
        LogLevel::ALL
          .into_iter()
          .find(|level| {
            level.as_str() == normalized
          })
          .ok_or_else(|| {
            serde::de::Error::custom(
              format!(
                "unknown log level \
                 '{}'",
                value
              )
            )
          })
      }
    }

    deserializer.deserialize_str(
      LogLevelVisitor
    )
  }
}

#[derive(
  Clone,
  Debug,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct SourcesConfig {
  #[serde(
    default = "default_extensions"
  )]
  pub extensions: Vec<String>
}

impl Default for SourcesConfig {
  fn default() -> Self {
    Self {
      extensions: default_extensions()
    }
  }
}

impl SourcesConfig {
  pub fn accepts(
    &self,
    path: &Path
  ) -> bool {
    let Some(ext) = path.extension()
    else {
      return false;
    };
    let ext =
      ext.to_string_lossy().to_lowercase();
    self.extensions.iter().any(|allowed| {
      allowed
        .trim_start_matches('.')
        .eq_ignore_ascii_case(&ext)
    })
  }
}

fn default_level() -> LogLevel {
  LogLevel::Warn
}

fn default_extensions() -> Vec<String> {
  vec!["txt".into(), "md".into()]
}
