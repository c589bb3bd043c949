use std::time::Duration;

pub(super) const fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

pub(super) fn default_kind() -> String {
    "info".to_string()
}

pub(super) fn default_position() -> String {
    "top-right".to_string()
}

pub(super) const fn default_channel_bound() -> usize {
    64
}

pub(super) const fn default_drain_on_eof() -> bool {
    true
}
