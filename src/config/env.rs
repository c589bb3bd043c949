use std::time::Duration;

use ::config::Map;
use humantime::parse_duration;

use crate::error::ConfigError;

type EnvResult<T> = std::result::Result<Option<T>, ConfigError>;

/// Where the flat `TOAST_*` overrides come from.
pub(super) trait EnvSource {
    fn raw_var(&self, key: &'static str) -> EnvResult<String>;

    /// Trimmed value. Blank values count as unset.
    fn string(&self, key: &'static str) -> EnvResult<String> {
        Ok(self
            .raw_var(key)?
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }

    fn parse<T>(&self, key: &'static str) -> EnvResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        parsed(key, self.string(key)?, str::parse::<T>)
    }

    /// Accepts `1/0`, `yes/no` and `on/off` besides `true/false`.
    fn flag(&self, key: &'static str) -> EnvResult<bool> {
        parsed(key, self.string(key)?, parse_flag)
    }

    fn duration(&self, key: &'static str) -> EnvResult<Duration> {
        parsed(key, self.string(key)?, parse_duration)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(super) struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn raw_var(&self, key: &'static str) -> EnvResult<String> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(ConfigError::Other(format!("{key}: {err}"))),
        }
    }
}

impl EnvSource for Map<String, String> {
    fn raw_var(&self, key: &'static str) -> EnvResult<String> {
        Ok(self.get(key).cloned())
    }
}

fn parsed<T, E>(
    key: &'static str,
    value: Option<String>,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> EnvResult<T>
where
    E: std::fmt::Display,
{
    value
        .map(|value| {
            parse(&value).map_err(|err| ConfigError::InvalidField {
                field: key,
                message: err.to_string(),
            })
        })
        .transpose()
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{EnvSource, parse_flag};
    use ::config::Map;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("YES"), Ok(true));
        assert_eq!(parse_flag("off"), Ok(false));
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let vars: Map<String, String> = [("TOAST_KIND".to_string(), "   ".to_string())]
            .into_iter()
            .collect();
        assert!(matches!(vars.string("TOAST_KIND"), Ok(None)));
        assert!(matches!(vars.string("TOAST_POSITION"), Ok(None)));
    }
}
