//! Toast entity model.
//!
//! A [`Toast`] is an immutable value: state transitions produce a new value
//! rather than mutating one that a published snapshot may still reference.

use std::fmt::{self, Display};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::types::{Position, ToastKind};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ToastId(pub u64);

impl From<u64> for ToastId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Profile {
    pub picture: String,
    pub name: String,
}

/// Payload rendered by the UI layer. The store never looks inside it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ToastData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ToastData {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// What a caller hands to [`ToastStore::add_toast`](crate::store::ToastStore::add_toast).
/// Timing fields are filled in by the store.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ToastInput {
    pub id: ToastId,
    #[serde(rename = "type", default)]
    pub kind: ToastKind,
    #[serde(default)]
    pub position: Position,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
    pub data: ToastData,
}

impl ToastInput {
    pub fn new(id: ToastId, timeout: Duration, data: ToastData) -> Self {
        Self {
            id,
            kind: ToastKind::default(),
            position: Position::default(),
            timeout,
            data,
        }
    }

    #[must_use]
    pub const fn kind(mut self, kind: ToastKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub const fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: ToastId,
    #[serde(rename = "type")]
    pub kind: ToastKind,
    pub position: Position,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    remaining: Duration,
    #[serde(skip)]
    started_at: Instant,
    hovered: bool,
    pub data: ToastData,
}

impl Toast {
    pub(crate) fn start(input: ToastInput, now: Instant) -> Self {
        let ToastInput {
            id,
            kind,
            position,
            timeout,
            data,
        } = input;
        Self {
            id,
            kind,
            position,
            timeout,
            remaining: timeout,
            started_at: now,
            hovered: false,
            data,
        }
    }

    /// Freezes the countdown, charging the time spent active since `started_at`.
    pub(crate) fn paused_at(&self, now: Instant) -> Self {
        Self {
            remaining: self.remaining_at(now),
            hovered: true,
            ..self.clone()
        }
    }

    pub(crate) fn resumed_at(&self, now: Instant) -> Self {
        Self {
            started_at: now,
            hovered: false,
            ..self.clone()
        }
    }

    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Live time left. Counts down while active, frozen while paused.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        if self.hovered {
            return self.remaining;
        }
        self.remaining
            .saturating_sub(now.saturating_duration_since(self.started_at))
    }

    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    pub const fn is_paused(&self) -> bool {
        self.hovered
    }
}
