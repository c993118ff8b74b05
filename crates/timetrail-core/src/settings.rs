//! User-facing settings replicated across devices.

use serde::{Deserialize, Serialize};

/// Decimal separator used when rendering fractional work hours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparator {
    /// Follow the host locale. Renders with a dot at this layer.
    System,
    Dot,
    Comma,
}

impl Default for DecimalSeparator {
    fn default() -> Self {
        DecimalSeparator::System
    }
}

/// Sync mode selected by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Changes only leave the device on an explicit push/pull/merge.
    Manual,
    /// A live listener plus debounced push keep devices converged.
    Automatic,
}

impl Default for SyncMode {
    fn default() -> Self {
        SyncMode::Manual
    }
}

/// Settings carried inside the backup payload alongside the task list.
///
/// These replicate across devices; device-local preferences belong in
/// [`crate::storage::AppConfig`] instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncedSettings {
    #[serde(default)]
    pub decimal_separator: DecimalSeparator,
}
