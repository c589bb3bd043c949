#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod clock;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod telemetry;
pub mod toast;
pub mod types;

pub use store::{Snapshot, ToastStore};
pub use toast::{Toast, ToastData, ToastId, ToastInput};
pub use types::{Position, ToastKind};

pub type Result<T> = std::result::Result<T, error::Error>;
