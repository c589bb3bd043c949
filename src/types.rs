use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl ToastKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToastKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" | "ok" => Ok(Self::Success),
            "error" | "err" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "info" | "information" => Ok(Self::Info),
            other => Err(format!("unknown toast kind: {other}")),
        }
    }
}

/// Screen corner a toast is anchored to.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

impl Position {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopRight => "top-right",
            Self::TopLeft => "top-left",
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "top-right" => Ok(Self::TopRight),
            "top-left" => Ok(Self::TopLeft),
            "bottom-right" => Ok(Self::BottomRight),
            "bottom-left" => Ok(Self::BottomLeft),
            other => Err(format!("unknown position: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{Position, ToastKind};
    use std::str::FromStr;

    #[test]
    fn kind_from_str_accepts_aliases() {
        assert_eq!(ToastKind::from_str("warn"), Ok(ToastKind::Warning));
        assert_eq!(ToastKind::from_str("SUCCESS"), Ok(ToastKind::Success));
        assert_eq!(ToastKind::from_str("info"), Ok(ToastKind::Info));
        assert!(ToastKind::from_str("fatal").is_err());
    }

    #[test]
    fn position_from_str_accepts_underscores() {
        assert_eq!(Position::from_str("bottom_left"), Ok(Position::BottomLeft));
        assert_eq!(Position::from_str("Top-Right"), Ok(Position::TopRight));
        assert!(Position::from_str("center").is_err());
    }

    #[test]
    fn display_matches_serde_names() {
        let json = serde_json::to_string(&Position::BottomRight).unwrap();
        assert_eq!(json, format!("\"{}\"", Position::BottomRight));
        let json = serde_json::to_string(&ToastKind::Error).unwrap();
        assert_eq!(json, format!("\"{}\"", ToastKind::Error));
    }
}
