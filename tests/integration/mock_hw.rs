//! Mock adapters for integration tests.
//!
//! Records every output and persistence call so tests can assert on the
//! full history without touching real converters, GPIO or flash.

#![allow(dead_code)]

use symbctrl::app::events::AppEvent;
use symbctrl::app::ports::{ConfigError, EventSink, OutputPort, SensorPort, SettingsPort};
use symbctrl::app::service::AppService;
use symbctrl::channel::OutputId;
use symbctrl::clock::WallTime;
use symbctrl::config::SystemConfig;
use symbctrl::error::SensorError;
use symbctrl::store::StateStore;

// ── Raw counts for common physical values ─────────────────────

/// Temperature amplifier count for `c` °C.
pub fn temp_counts(c: f32) -> u16 {
    (1200.0 + c / 0.048_17).round() as u16
}

/// Analog input count for `v` volts.
pub fn analog_counts(v: f32) -> u16 {
    (v / 0.002_639).round() as u16
}

/// Chemistry count at pH 7 (zero probe volts).
pub const NEUTRAL_COUNTS: u16 = 442;

// ── MockHardware ──────────────────────────────────────────────

/// Multi-channel converter inputs, in MCP3208 order.
pub mod input {
    pub const TEMP1: usize = 0;
    pub const TEMP2: usize = 1;
    pub const ANALOG2: usize = 2;
    pub const ANALOG1: usize = 3;
    pub const SUPPLY: usize = 4;
    pub const INTERNAL: usize = 5;
}

pub struct MockHardware {
    pub chemistry: u16,
    pub mux: [u16; 6],
    pub fail_chemistry: bool,
    /// Every `set_output` call in order.
    pub output_calls: Vec<(OutputId, bool)>,
    pub outputs: [bool; 4],
    pub preselects: Vec<u8>,
}

impl MockHardware {
    /// Healthy board: pH 7, 25 °C on both probes, 12 V supply, 25 °C inside.
    pub fn new() -> Self {
        Self {
            chemistry: NEUTRAL_COUNTS,
            mux: [
                temp_counts(25.0),
                temp_counts(25.0),
                0,
                0,
                (12.0 / 0.004_378_f32).round() as u16,
                // Thermistor count for about 25 °C.
                2525,
            ],
            fail_chemistry: false,
            output_calls: Vec::new(),
            outputs: [false; 4],
            preselects: Vec::new(),
        }
    }

    pub fn output(&self, out: OutputId) -> bool {
        self.outputs[out.index()]
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_chemistry(&mut self) -> Result<u16, SensorError> {
        if self.fail_chemistry {
            Err(SensorError::NotResponding)
        } else {
            Ok(self.chemistry)
        }
    }

    fn read_channel(&mut self, input: u8) -> Result<u16, SensorError> {
        self.mux
            .get(input as usize)
            .copied()
            .ok_or(SensorError::InvalidInput(input))
    }

    fn preselect(&mut self, input: u8) -> Result<(), SensorError> {
        self.preselects.push(input);
        Ok(())
    }
}

impl OutputPort for MockHardware {
    fn set_output(&mut self, output: OutputId, on: bool) {
        self.output_calls.push((output, on));
        self.outputs[output.index()] = on;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockSettings ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockSettings {
    pub image: Option<(Vec<u16>, Vec<bool>)>,
    pub calibration_saves: Vec<u16>,
    pub credentials: Option<(String, String)>,
    pub save_count: usize,
    pub fail: bool,
}

impl MockSettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsPort for MockSettings {
    fn load_all(&self, store: &mut StateStore) -> Result<(), ConfigError> {
        match &self.image {
            Some((data, status)) => {
                store.restore(data, status);
                Ok(())
            }
            None => Err(ConfigError::NotFound),
        }
    }

    fn save_all(&mut self, store: &StateStore) -> Result<(), ConfigError> {
        if self.fail {
            return Err(ConfigError::IoError);
        }
        self.image = Some((store.data().to_vec(), store.status().to_vec()));
        self.save_count += 1;
        Ok(())
    }

    fn save_calibration(&mut self, _store: &StateStore, addr: u16) -> Result<(), ConfigError> {
        if self.fail {
            return Err(ConfigError::IoError);
        }
        self.calibration_saves.push(addr);
        Ok(())
    }

    fn save_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConfigError> {
        if self.fail {
            return Err(ConfigError::IoError);
        }
        self.credentials = Some((ssid.to_string(), password.to_string()));
        Ok(())
    }
}

// ── Simulation helpers ────────────────────────────────────────

/// Wall time on 2024-06-15 at `hour:minute`.
pub fn wall(hour: u8, minute: u8) -> WallTime {
    WallTime {
        year: 2024,
        month: 6,
        day: 15,
        hour,
        minute,
        second: 0,
        millis: 0,
    }
}

/// Tick every millisecond over `from..to`.
pub fn run(
    app: &mut AppService,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
    from: u32,
    to: u32,
    wall_time: Option<WallTime>,
) {
    for now in from..to {
        app.tick(now, wall_time, hw, sink);
    }
}

/// Started service with factory settings on a healthy board.
pub fn make_app() -> (AppService, MockHardware, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    let hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, hw, sink)
}
