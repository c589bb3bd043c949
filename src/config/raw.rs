use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ::config::{FileFormat, Map};
use serde::Deserialize;
use serde_with::serde_as;

use crate::Result;
use crate::error::ConfigError;
use crate::types::{Position, ToastKind};

use super::defaults::{
    default_channel_bound, default_drain_on_eof, default_kind, default_position, default_timeout,
};
use super::env::EnvSource;
use super::{
    AppSettings, CHANNEL_BOUND_MAX, Config, HumantimeDuration, TIMEOUT_BOUNDS, ToastDefaults,
};

/// Reads `path` and the `TOASTS__SECTION__KEY` variables, taken from `env`
/// when given and from the process otherwise.
pub(super) fn load(
    path: impl AsRef<Path>,
    env: Option<Map<String, String>>,
) -> std::result::Result<RawConfig, ConfigError> {
    let path = path.as_ref();
    let builder = ::config::Config::builder()
        .add_source(::config::File::from(path).required(false))
        .add_source(
            ::config::Environment::with_prefix("TOASTS")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );
    finish(builder)
}

pub(super) fn load_str(source: &str) -> std::result::Result<RawConfig, ConfigError> {
    let builder =
        ::config::Config::builder().add_source(::config::File::from_str(source, FileFormat::Toml));
    finish(builder)
}

fn finish(
    builder: ::config::ConfigBuilder<::config::builder::DefaultState>,
) -> std::result::Result<RawConfig, ConfigError> {
    builder
        .build()
        .map_err(|err| ConfigError::Parse(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) toast: RawToast,
    #[serde(default)]
    pub(super) app: RawApp,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawToast {
    #[serde(default = "default_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) default_timeout: Duration,
    #[serde(default = "default_kind")]
    pub(super) default_kind: String,
    #[serde(default = "default_position")]
    pub(super) default_position: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawApp {
    #[serde(default = "default_channel_bound")]
    pub(super) channel_bound: usize,
    #[serde(default = "default_drain_on_eof")]
    pub(super) drain_on_eof: bool,
}

impl Default for RawToast {
    fn default() -> Self {
        Self {
            default_timeout: default_timeout(),
            default_kind: default_kind(),
            default_position: default_position(),
        }
    }
}

impl Default for RawApp {
    fn default() -> Self {
        Self {
            channel_bound: default_channel_bound(),
            drain_on_eof: default_drain_on_eof(),
        }
    }
}

impl RawConfig {
    pub(super) fn apply_env_overrides(
        &mut self,
        env: &impl EnvSource,
    ) -> std::result::Result<(), ConfigError> {
        if let Some(timeout) = env.duration("TOAST_TIMEOUT")? {
            self.toast.default_timeout = timeout;
        }
        if let Some(kind) = env.string("TOAST_KIND")? {
            self.toast.default_kind = kind;
        }
        if let Some(position) = env.string("TOAST_POSITION")? {
            self.toast.default_position = position;
        }
        if let Some(bound) = env.parse::<usize>("TOAST_CHANNEL_BOUND")? {
            self.app.channel_bound = bound;
        }
        if let Some(drain) = env.flag("TOAST_DRAIN_ON_EOF")? {
            self.app.drain_on_eof = drain;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        if !TIMEOUT_BOUNDS.contains(&self.toast.default_timeout) {
            return Err(ConfigError::InvalidField {
                field: "toast.default_timeout",
                message: format!(
                    "expected between {}ms and {}s, got {}ms",
                    TIMEOUT_BOUNDS.start().as_millis(),
                    TIMEOUT_BOUNDS.end().as_secs(),
                    self.toast.default_timeout.as_millis()
                ),
            }
            .into());
        }

        let kind = ToastKind::from_str(&self.toast.default_kind).map_err(|err| {
            ConfigError::InvalidField {
                field: "toast.default_kind",
                message: err,
            }
        })?;
        let position = Position::from_str(&self.toast.default_position).map_err(|err| {
            ConfigError::InvalidField {
                field: "toast.default_position",
                message: err,
            }
        })?;

        if self.app.channel_bound == 0 || self.app.channel_bound > CHANNEL_BOUND_MAX {
            return Err(ConfigError::InvalidField {
                field: "app.channel_bound",
                message: format!(
                    "expected between 1 and {CHANNEL_BOUND_MAX}, got {}",
                    self.app.channel_bound
                ),
            }
            .into());
        }

        Ok(Config {
            toast: ToastDefaults {
                timeout: self.toast.default_timeout,
                kind,
                position,
            },
            app: AppSettings {
                channel_bound: self.app.channel_bound,
                drain_on_eof: self.app.drain_on_eof,
            },
        })
    }
}
