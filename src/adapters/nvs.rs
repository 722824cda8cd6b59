//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`], [`SettingsPort`] and [`StoragePort`].
//!
//! Layout:
//!
//! | Namespace  | Key        | Contents                                  |
//! |------------|------------|-------------------------------------------|
//! | `symbctrl` | `tuning`   | postcard [`SystemConfig`]                 |
//! | `symbctrl` | `image`    | postcard register/flag image (no secrets) |
//! | `auth`     | `ssid`     | network name                              |
//! | `auth`     | `password` | network password                          |
//!
//! On ESP32 the `auth` namespace lives on the encrypted NVS partition.  The
//! host backend is a plaintext in-memory map for tests and simulation.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, ConfigPort, SettingsPort, StorageError, StoragePort};
use crate::config::SystemConfig;
use crate::store::StateStore;
use crate::store::addr::{DATA_CLEAR_SIZE, WIFI_PASSWORD, WIFI_SSID};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const SETTINGS_NAMESPACE: &str = "symbctrl";
const TUNING_KEY: &str = "tuning";
const IMAGE_KEY: &str = "image";

const CRED_NAMESPACE: &str = "auth";
const SSID_KEY: &str = "ssid";
const PASSWORD_KEY: &str = "password";

/// Bumped whenever the register map moves.
const IMAGE_VERSION: u16 = 1;

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const MAX_BLOB_SIZE: usize = 4000;

/// Persisted register image.  Registers from [`DATA_CLEAR_SIZE`] up hold
/// credentials and are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SettingsImage {
    version: u16,
    data: Vec<u16>,
    status: Vec<bool>,
}

impl SettingsImage {
    fn capture(store: &StateStore) -> Self {
        Self {
            version: IMAGE_VERSION,
            data: store.data()[..DATA_CLEAR_SIZE as usize].to_vec(),
            status: store.status().to_vec(),
        }
    }
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blobs: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised; any other failure is `ConfigError::IoError`.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK
                {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NVS: ESP-IDF backend ready");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NVS: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blobs: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// Stored network credentials, if any.
    pub fn credentials(&self) -> Option<(String, String)> {
        let ssid = self.get_blob(CRED_NAMESPACE, SSID_KEY).ok()?;
        let password = self.get_blob(CRED_NAMESPACE, PASSWORD_KEY).unwrap_or_default();
        Some((
            String::from_utf8(ssid).ok()?,
            String::from_utf8(password).ok()?,
        ))
    }

    /// Erase the whole credential namespace (factory reset).
    pub fn erase_credentials(&mut self) -> Result<(), StorageError> {
        self.erase(CRED_NAMESPACE, SSID_KEY)?;
        self.erase(CRED_NAMESPACE, PASSWORD_KEY)
    }

    fn load_image(&self) -> Result<SettingsImage, ConfigError> {
        let bytes = self.get_blob(SETTINGS_NAMESPACE, IMAGE_KEY)?;
        let image: SettingsImage =
            postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        if image.version != IMAGE_VERSION {
            warn!(
                "NVS: image version {} (expected {IMAGE_VERSION})",
                image.version
            );
            return Err(ConfigError::Corrupted);
        }
        Ok(image)
    }

    fn store_image(&self, image: &SettingsImage) -> Result<(), ConfigError> {
        let bytes = postcard::to_allocvec(image).map_err(|_| ConfigError::IoError)?;
        self.set_blob(SETTINGS_NAMESPACE, IMAGE_KEY, &bytes)?;
        info!("NVS: settings image saved ({} bytes)", bytes.len());
        Ok(())
    }

    // ── Backend primitives ────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }

    #[cfg(not(target_os = "espidf"))]
    fn get_blob(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .borrow()
            .get(&Self::composite_key(namespace, key))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_blob(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .borrow_mut()
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn erase(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.blobs
            .borrow_mut()
            .remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn has(&self, namespace: &str, key: &str) -> bool {
        self.blobs
            .borrow()
            .contains_key(&Self::composite_key(namespace, key))
    }

    /// NUL-terminated copy of an NVS name (15 characters at most).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let len = name.len().min(15);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        buf
    }

    /// Open a namespace, run `f` with the handle, then close it.
    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        namespace: &str,
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, i32>,
    ) -> Result<T, i32> {
        let ns = Self::c_name(namespace);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        // SAFETY: `handle` was opened above and is not used afterwards.
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn map_err(ret: i32) -> StorageError {
        if ret == ESP_ERR_NVS_NOT_FOUND {
            StorageError::NotFound
        } else if ret == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
            StorageError::Full
        } else {
            StorageError::IoError
        }
    }

    #[cfg(target_os = "espidf")]
    fn get_blob(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let key = Self::c_name(key);
        Self::with_handle(namespace, false, |handle| {
            let mut size: usize = 0;
            // SAFETY: a null buffer asks NVS for the stored length only.
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr().cast(), core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size > MAX_BLOB_SIZE {
                return Err(ESP_FAIL);
            }
            let mut buf = vec![0u8; size];
            // SAFETY: `buf` holds exactly `size` bytes.
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        })
        .map_err(Self::map_err)
    }

    #[cfg(target_os = "espidf")]
    fn set_blob(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = Self::c_name(key);
        Self::with_handle(namespace, true, |handle| {
            // SAFETY: `data` is valid for `data.len()` bytes.
            let ret = unsafe {
                nvs_set_blob(handle, key.as_ptr().cast(), data.as_ptr().cast(), data.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            match unsafe { nvs_commit(handle) } {
                ESP_OK => Ok(()),
                e => Err(e),
            }
        })
        .map_err(|e| {
            warn!("NVS: write to '{namespace}' failed ({e})");
            Self::map_err(e)
        })
    }

    #[cfg(target_os = "espidf")]
    fn erase(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let key = Self::c_name(key);
        Self::with_handle(namespace, true, |handle| {
            let ret = unsafe { nvs_erase_key(handle, key.as_ptr().cast()) };
            if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                return Err(ret);
            }
            match unsafe { nvs_commit(handle) } {
                ESP_OK => Ok(()),
                e => Err(e),
            }
        })
        .map_err(Self::map_err)
    }

    #[cfg(target_os = "espidf")]
    fn has(&self, namespace: &str, key: &str) -> bool {
        let key = Self::c_name(key);
        Self::with_handle(namespace, false, |handle| {
            let ret =
                unsafe { nvs_find_key(handle, key.as_ptr().cast(), core::ptr::null_mut()) };
            Ok(ret == ESP_OK)
        })
        .unwrap_or(false)
    }
}

// ───────────────────────────────────────────────────────────────
// Tuning validation
// ───────────────────────────────────────────────────────────────

pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(1..=100).contains(&cfg.sample_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "sample_interval_ms must be 1-100",
        ));
    }
    if !(50..=5000).contains(&cfg.control_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "control_interval_ms must be 50-5000",
        ));
    }
    if !(100..=60_000).contains(&cfg.merge_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "merge_interval_ms must be 100-60000",
        ));
    }
    if !(100..=60_000).contains(&cfg.frequency_window_ms) {
        return Err(ConfigError::ValidationFailed(
            "frequency_window_ms must be 100-60000",
        ));
    }
    if cfg.startup_delay_secs > 600 {
        return Err(ConfigError::ValidationFailed(
            "startup_delay_secs must be 0-600",
        ));
    }
    if !(1..=168).contains(&cfg.time_valid_hours) {
        return Err(ConfigError::ValidationFailed(
            "time_valid_hours must be 1-168",
        ));
    }
    let f = &cfg.filter;
    if f.slow_factor < 1.0 || f.medium_factor < 1.0 || f.fast_factor < 1.0 {
        return Err(ConfigError::ValidationFailed(
            "filter factors must be at least 1",
        ));
    }
    if f.medium_threshold >= f.fast_threshold {
        return Err(ConfigError::ValidationFailed(
            "filter medium_threshold must be below fast_threshold",
        ));
    }
    if cfg.digital_threshold >= 4096 {
        return Err(ConfigError::ValidationFailed(
            "digital_threshold must be below 4096",
        ));
    }
    if cfg.supply_low_v >= cfg.supply_high_v {
        return Err(ConfigError::ValidationFailed(
            "supply_low_v must be < supply_high_v",
        ));
    }
    if !(20.0..=120.0).contains(&cfg.internal_temp_high_c) {
        return Err(ConfigError::ValidationFailed(
            "internal_temp_high_c must be 20-120",
        ));
    }
    if !(5..=3600).contains(&cfg.telemetry_interval_secs) {
        return Err(ConfigError::ValidationFailed(
            "telemetry_interval_secs must be 5-3600",
        ));
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Port implementations
// ───────────────────────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        match self.get_blob(SETTINGS_NAMESPACE, TUNING_KEY) {
            Ok(bytes) => {
                let cfg: SystemConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                validate_config(&cfg)?;
                info!("NVS: tuning loaded ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Err(StorageError::NotFound) => {
                info!("NVS: no stored tuning, using defaults");
                Ok(SystemConfig::default())
            }
            Err(e) => {
                warn!("NVS: tuning read failed ({e}), using defaults");
                Ok(SystemConfig::default())
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.set_blob(SETTINGS_NAMESPACE, TUNING_KEY, &bytes)?;
        info!("NVS: tuning saved ({} bytes)", bytes.len());
        Ok(())
    }
}

impl SettingsPort for NvsAdapter {
    fn load_all(&self, store: &mut StateStore) -> Result<(), ConfigError> {
        let image = self.load_image()?;
        store.restore(&image.data, &image.status);
        if let Some((ssid, password)) = self.credentials() {
            store.set_string(WIFI_SSID, &ssid);
            store.set_string(WIFI_PASSWORD, &password);
        }
        info!("NVS: settings restored");
        Ok(())
    }

    fn save_all(&mut self, store: &StateStore) -> Result<(), ConfigError> {
        self.store_image(&SettingsImage::capture(store))
    }

    fn save_calibration(&mut self, store: &StateStore, addr: u16) -> Result<(), ConfigError> {
        if addr >= DATA_CLEAR_SIZE - 1 {
            return Err(ConfigError::ValidationFailed("calibration address out of image"));
        }
        let mut image = match self.load_image() {
            Ok(image) => image,
            Err(ConfigError::NotFound) => SettingsImage::capture(store),
            Err(e) => return Err(e),
        };
        let at = addr as usize;
        image.data[at] = store.u16(addr);
        image.data[at + 1] = store.u16(addr + 1);
        self.store_image(&image)
    }

    fn save_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConfigError> {
        self.set_blob(CRED_NAMESPACE, SSID_KEY, ssid.as_bytes())?;
        self.set_blob(CRED_NAMESPACE, PASSWORD_KEY, password.as_bytes())?;
        info!("NVS: credentials saved for '{ssid}'");
        Ok(())
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self.get_blob(namespace, key)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.set_blob(namespace, key, data)
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.erase(namespace, key)
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.has(namespace, key)
    }
}
