//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (converters, outputs, event sinks, storage) implement
//! these traits.  The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches hardware directly.
//!
//! ## Notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **SettingsPort** persists the register image; it never interprets it.
//! - All port errors are typed; callers handle every variant explicitly.

use crate::channel::OutputId;
use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::store::StateStore;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: converters → domain)
// ───────────────────────────────────────────────────────────────

/// Raw converter access for the acquisition engine.
pub trait SensorPort {
    /// One conversion from the dedicated chemistry converter (12-bit counts).
    fn read_chemistry(&mut self) -> Result<u16, SensorError>;

    /// One conversion of multi-channel converter input `input` (12-bit counts).
    fn read_channel(&mut self, input: u8) -> Result<u16, SensorError>;

    /// Route the multiplexer to `input` so it settles before its turn.
    fn preselect(&mut self, input: u8) -> Result<(), SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → relays / digital outputs)
// ───────────────────────────────────────────────────────────────

pub trait OutputPort {
    fn set_output(&mut self, output: OutputId, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent tuning)
// ───────────────────────────────────────────────────────────────

/// Loads and persists engine tuning.
///
/// Implementations MUST validate config values before persisting and reject
/// out-of-range values with [`ConfigError::ValidationFailed`] rather than
/// clamping them.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Settings port (driven adapter: register image ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Persistence of the addressable settings.
pub trait SettingsPort {
    /// Restore every persisted register and flag into `store`.
    /// [`ConfigError::NotFound`] on first boot.
    fn load_all(&self, store: &mut StateStore) -> Result<(), ConfigError>;

    /// Persist every register and flag.
    fn save_all(&mut self, store: &StateStore) -> Result<(), ConfigError>;

    /// Persist the single float at `addr` (calibration offset or gain).
    fn save_calibration(&mut self, store: &StateStore, addr: u16) -> Result<(), ConfigError>;

    /// Persist network credentials.
    fn save_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Namespaced key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Writes MUST be atomic; ESP-IDF NVS commits guarantee this natively.
/// - Secrets belong in the credential namespace.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] and [`SettingsPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Nothing stored yet (first boot).
    NotFound,
    /// Stored blob failed deserialization or has the wrong version.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "settings not found"),
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::Full => Self::StorageFull,
            StorageError::IoError => Self::IoError,
        }
    }
}
