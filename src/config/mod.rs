use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use crate::Result;
use crate::error::Error;
use crate::toast::{ToastData, ToastId, ToastInput};
use crate::types::{Position, ToastKind};

mod defaults;
mod env;
mod raw;
mod serde;

pub(crate) use self::serde::HumantimeDuration;

const TIMEOUT_BOUNDS: RangeInclusive<Duration> =
    Duration::from_millis(1)..=Duration::from_secs(3600);
const CHANNEL_BOUND_MAX: usize = 65_536;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub toast: ToastDefaults,
    pub app: AppSettings,
}

/// Values applied to toasts whose command line leaves them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastDefaults {
    pub timeout: Duration,
    pub kind: ToastKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub channel_bound: usize,
    pub drain_on_eof: bool,
}

impl Config {
    /// Load configuration from a file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be parsed, when
    /// environment overrides are invalid, or when the resulting values fail
    /// validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path, None).map_err(Error::from)?;
        raw.apply_env_overrides(&env::ProcessEnv)
            .map_err(Error::from)?;
        raw.validate_and_build()
    }

    /// Parse a TOML document without consulting the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is malformed or fails validation.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        raw::load_str(source)
            .map_err(Error::from)?
            .validate_and_build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            toast: ToastDefaults {
                timeout: defaults::default_timeout(),
                kind: ToastKind::default(),
                position: Position::default(),
            },
            app: AppSettings {
                channel_bound: defaults::default_channel_bound(),
                drain_on_eof: defaults::default_drain_on_eof(),
            },
        }
    }
}

impl ToastDefaults {
    /// Builds an input, filling every field the caller left out.
    pub fn input(
        &self,
        id: ToastId,
        kind: Option<ToastKind>,
        position: Option<Position>,
        timeout: Option<Duration>,
        data: ToastData,
    ) -> ToastInput {
        ToastInput::new(id, timeout.unwrap_or(self.timeout), data)
            .kind(kind.unwrap_or(self.kind))
            .position(position.unwrap_or(self.position))
    }
}
