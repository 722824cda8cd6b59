//! SymbCtrl firmware entry point.
//!
//! Hexagonal architecture driven by a cooperative 1 ms loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    LogEventSink   NvsAdapter   Esp32Time      │
//! │  (Sensor+Output)    (EventSink)    (Config+     (uptime, wall  │
//! │                                     Settings)    time, SNTP)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Acquisition · Control · Arbitration · Auxiliaries     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::gpio::{AnyOutputPin, Output, OutputPin as _, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriverConfig, config::Config as SpiConfig};
use esp_idf_svc::sntp::{EspSntp, SyncStatus};
use log::{info, warn};

use symbctrl::adapters::hardware::HardwareAdapter;
use symbctrl::adapters::log_sink::LogEventSink;
use symbctrl::adapters::nvs::NvsAdapter;
use symbctrl::adapters::time::Esp32TimeAdapter;
use symbctrl::app::ports::ConfigPort;
use symbctrl::app::service::AppService;
use symbctrl::config::SystemConfig;
use symbctrl::drivers::watchdog::Watchdog;
use symbctrl::pins;
use symbctrl::store::addr;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;

fn output_pin(pin: AnyOutputPin) -> Result<OutPin> {
    Ok(PinDriver::output(pin)?)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SymbCtrl v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let watchdog = Watchdog::default();

    // ── 2. Tuning from NVS (or defaults) ──────────────────────
    let mut nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Main: tuning load failed ({e}), using defaults");
            SystemConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let p = Peripherals::take()?;

    let i2c = I2cDriver::new(
        p.i2c0,
        p.pins.gpio35,
        p.pins.gpio36,
        &I2cConfig::new().baudrate(pins::I2C_BAUD_HZ.Hz()),
    )?;

    let spi = SpiDeviceDriver::new_single(
        p.spi2,
        p.pins.gpio16,
        p.pins.gpio34,
        Some(p.pins.gpio18),
        Some(p.pins.gpio38),
        &SpiDriverConfig::new(),
        &SpiConfig::new().baudrate(pins::SPI_BAUD_HZ.Hz()),
    )?;

    let outputs = [
        output_pin(p.pins.gpio14.downgrade_output())?,
        output_pin(p.pins.gpio9.downgrade_output())?,
        output_pin(p.pins.gpio33.downgrade_output())?,
        output_pin(p.pins.gpio37.downgrade_output())?,
    ];

    let mut hw = HardwareAdapter::new(i2c, spi, outputs);
    let mut sink = LogEventSink::new();
    let time = Esp32TimeAdapter::new();

    // ── 4. Application core ───────────────────────────────────
    let mut app = AppService::new(config);
    if let Err(e) = app.load_settings(&nvs) {
        warn!("Main: running on factory settings ({e})");
    }
    app.start(&mut sink);

    let sntp = EspSntp::new_default()?;
    info!(
        "Main: SNTP started, outputs on GPIO {:?}, entering control loop",
        pins::OUTPUT_GPIOS
    );

    // ── 5. Cooperative loop ───────────────────────────────────
    loop {
        let now = time.uptime_ms();

        if sntp.get_sync_status() == SyncStatus::Completed {
            app.note_time_sync(now);
            app.state_mut().network_connected = true;
        }

        let tz = app.state().store.i16(addr::TIMEZONE);
        app.tick(now, time.local_time(tz), &mut hw, &mut sink);

        if let Err(e) = app.service_persistence(&mut nvs, &mut sink) {
            warn!("Main: persistence: {e}");
        }

        watchdog.feed();
        esp_idf_hal::delay::FreeRtos::delay_ms(1);
    }
}
