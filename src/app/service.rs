//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the [`SystemState`] aggregate and every engine, and
//! services them in a fixed order each tick.  All I/O flows through port
//! traits injected at call sites, making the entire service testable with
//! mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────────┐ ──▶ EventSink
//!                 │            AppService            │
//!  OutputPort ◀── │ clock · limits · analog · merge  │ ◀── AppCommand
//!                 │ control · logic · tod · timed    │
//! SettingsPort ◀─▶│ counter · safety · outputs       │
//!                 └──────────────────────────────────┘
//! ```

use heapless::Vec;
use log::{info, warn};

use crate::channel::{Channel, OutputId};
use crate::clock::{TimeKeeper, WallTime};
use crate::config::SystemConfig;
use crate::control::ControlEngine;
use crate::counter::EventCounter;
use crate::error::{Error, Result};
use crate::logic::LogicGate;
use crate::merge::MergeEngine;
use crate::outputs::OutputDriver;
use crate::protocol;
use crate::safety::SafetySupervisor;
use crate::scheduler::{TimeLimitedCommand, TimeOfDayGate};
use crate::sensors::AnalogEngine;
use crate::settings;
use crate::state::SystemState;
use crate::store::addr::{self, flag, CALIBRATED_CHANNELS, LOOP_COUNT};
use crate::timing::IntervalGuard;

use super::commands::AppCommand;
use super::events::{AppEvent, ChannelTelemetry, LoopTelemetry, TelemetryData};
use super::ports::{ConfigError, EventSink, OutputPort, SensorPort, SettingsPort};

/// Analog channels in telemetry order.
const TELEMETRY_ORDER: [Channel; 8] = [
    Channel::WqAmp,
    Channel::Temp1,
    Channel::Temp2,
    Channel::Analog1,
    Channel::Analog2,
    Channel::InternalTemp,
    Channel::SupplyVoltage,
    Channel::ProcessedReading,
];

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    state: SystemState,
    clock: TimeKeeper,
    analog: AnalogEngine,
    merge: MergeEngine,
    control: ControlEngine,
    logic: LogicGate,
    tod: TimeOfDayGate,
    timed: TimeLimitedCommand,
    counter: EventCounter,
    safety: SafetySupervisor,
    outputs: OutputDriver,
    telemetry: IntervalGuard,
    /// Calibration registers waiting for a persistence pass.
    pending_calibration: Vec<u16, { 2 * CALIBRATED_CHANNELS }>,
    credentials_dirty: bool,
    last_faults: u8,
    last_tick_ms: u32,
    tick_count: u64,
}

impl AppService {
    /// Construct the service with factory settings.
    ///
    /// Stored settings are applied with [`load_settings`](Self::load_settings).
    pub fn new(config: SystemConfig) -> Self {
        let mut state = SystemState::new();
        settings::load_defaults(&mut state.store, &config);
        settings::enforce_limits(&mut state);

        Self {
            clock: TimeKeeper::new(&config),
            analog: AnalogEngine::new(&config),
            merge: MergeEngine::new(&config),
            control: ControlEngine::new(&config),
            logic: LogicGate::new(),
            tod: TimeOfDayGate::new(),
            timed: TimeLimitedCommand::new(),
            counter: EventCounter::new(&config),
            safety: SafetySupervisor::new(&config),
            outputs: OutputDriver::new(),
            telemetry: IntervalGuard::new(config.telemetry_interval_secs.saturating_mul(1000)),
            pending_calibration: Vec::new(),
            credentials_dirty: false,
            last_faults: 0,
            last_tick_ms: 0,
            tick_count: 0,
            state,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started);
        info!(
            "AppService: started, model {} serial {}",
            self.config.model_number, self.config.serial_number
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one pass over every engine.
    ///
    /// `hw` satisfies **both** [`SensorPort`] and [`OutputPort`]; this
    /// avoids a double mutable borrow while keeping the port boundary
    /// explicit.  `wall` is the local wall time when the clock adapter has
    /// one.
    pub fn tick(
        &mut self,
        now_ms: u32,
        wall: Option<WallTime>,
        hw: &mut (impl SensorPort + OutputPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        self.last_tick_ms = now_ms;
        let state = &mut self.state;

        // 1. Clock, startup lockout, time validity
        self.clock.service(now_ms, wall, state);

        // 2. Deferred limit check after remote writes
        if state.store.take_limit_check() {
            let n = settings::enforce_limits(state);
            if n > 0 {
                sink.emit(&AppEvent::LimitsCorrected(n));
            }
        }

        // 3. Acquisition, then the processed reading
        self.analog.service(now_ms, hw, state);
        self.merge.service(now_ms, state);

        // 4. Control loops
        if let Some(report) = self.control.service(now_ms, state) {
            if report.alarm_changed {
                sink.emit(&AppEvent::LoopAlarm {
                    index: report.index,
                    alarms: report.alarms,
                });
            }
        }

        // 5. Auxiliary sources
        self.logic.service(state);
        self.tod.service(state);
        self.timed.service(now_ms, state);
        self.counter.service(now_ms, state);

        // 6. Supervision
        let faults = self.safety.evaluate(state);
        if faults != self.last_faults {
            if faults & !self.last_faults != 0 {
                warn!("AppService: faults 0b{faults:08b}");
                sink.emit(&AppEvent::FaultDetected(faults));
            } else if faults == 0 {
                sink.emit(&AppEvent::FaultCleared);
            }
            self.last_faults = faults;
        }

        // 7. Physical outputs
        for change in self.outputs.service(state, hw) {
            sink.emit(&AppEvent::OutputChanged {
                output: change.output,
                on: change.on,
            });
        }

        // 8. Telemetry
        if self.telemetry.ready(now_ms) {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Settings changed by the command are
    /// limit-checked before this returns.
    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> Result<()> {
        let store = &mut self.state.store;
        match cmd {
            AppCommand::WriteRegister { addr, value } => {
                protocol::write_holding(store, addr, value)?;
            }
            AppCommand::WriteCoil { addr, raw } => {
                protocol::write_coil(store, addr, raw)?;
            }
            AppCommand::Calibrate {
                channel,
                calibration,
            } => {
                let (offset, gain) = addr::calibration_addrs(channel)
                    .ok_or(Error::Config("channel has no calibration"))?;
                store.set_f32(offset, calibration.offset);
                store.set_f32(gain, calibration.gain);
                for at in [offset, gain] {
                    if !self.pending_calibration.contains(&at) {
                        // Capacity covers every calibration register.
                        let _ = self.pending_calibration.push(at);
                    }
                }
                info!("AppService: {channel:?} calibrated {calibration:?}");
            }
            AppCommand::SetLoopEnabled { index, enabled } => {
                Self::check_loop(index)?;
                store.set_flag(flag::loop_flag(flag::LOOP_ENABLE_BASE, index), enabled);
            }
            AppCommand::SilenceAlarms(on) => store.set_flag(flag::SILENCE, on),
            AppCommand::ResetMinMax(index) => {
                Self::check_loop(index)?;
                store.set_flag(flag::loop_flag(flag::LOOP_RESET_MINMAX_BASE, index), true);
            }
            AppCommand::ResetCounter => store.set_flag(flag::RESET_COUNTER, true),
            AppCommand::ResetTimer => store.set_flag(flag::RESET_TIMER, true),
            AppCommand::TriggerTimedCommand => store.set_flag(flag::TLC_TRIGGER, true),
            AppCommand::SetOutputRequest { output, on } => {
                store.set_flag(flag::output_request(output), on);
            }
            AppCommand::SaveSettings => store.set_flag(flag::SAVE_REQUEST, true),
            AppCommand::LoadDefaults => store.set_flag(flag::DEFAULTS_REQUEST, true),
            AppCommand::SetCredentials { ssid, password } => {
                store.set_string(addr::WIFI_SSID, &ssid);
                store.set_string(addr::WIFI_PASSWORD, &password);
                self.credentials_dirty = true;
            }
        }

        if self.state.store.take_limit_check() {
            let n = settings::enforce_limits(&mut self.state);
            if n > 0 {
                sink.emit(&AppEvent::LimitsCorrected(n));
            }
        }
        Ok(())
    }

    fn check_loop(index: usize) -> Result<()> {
        if index < LOOP_COUNT {
            Ok(())
        } else {
            Err(Error::Config("no such control loop"))
        }
    }

    // ── Persistence ───────────────────────────────────────────

    /// Restore stored settings over the factory defaults.  Nothing stored
    /// yet is not an error.
    pub fn load_settings(&mut self, port: &impl SettingsPort) -> core::result::Result<(), ConfigError> {
        match port.load_all(&mut self.state.store) {
            Ok(()) => info!("AppService: stored settings restored"),
            Err(ConfigError::NotFound) => info!("AppService: no stored settings, using defaults"),
            Err(e) => {
                warn!("AppService: stored settings unusable: {e}");
                return Err(e);
            }
        }
        // Identity always reflects the running firmware.
        let store = &mut self.state.store;
        store.set_u16(addr::MODEL_NUMBER, self.config.model_number);
        store.set_u16(addr::SERIAL_NUMBER, self.config.serial_number);
        store.set_u16(addr::FIRMWARE_REV, settings::firmware_rev());
        settings::enforce_limits(&mut self.state);
        Ok(())
    }

    /// Serve save/defaults requests and flush pending calibration and
    /// credential writes.  Returns the first failure; later steps still run.
    pub fn service_persistence(
        &mut self,
        port: &mut impl SettingsPort,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), ConfigError> {
        let mut result = Ok(());
        let mut note = |r: core::result::Result<(), ConfigError>, what: &str| match r {
            Ok(()) => true,
            Err(e) => {
                warn!("AppService: {what} failed: {e}");
                if result.is_ok() {
                    result = Err(e);
                }
                false
            }
        };

        if self.state.store.take_flag(flag::SAVE_REQUEST) {
            settings::enforce_limits(&mut self.state);
            if note(port.save_all(&self.state.store), "settings save") {
                sink.emit(&AppEvent::SettingsSaved);
            }
        }

        if self.state.store.take_flag(flag::DEFAULTS_REQUEST) {
            settings::load_defaults(&mut self.state.store, &self.config);
            settings::enforce_limits(&mut self.state);
            self.pending_calibration.clear();
            sink.emit(&AppEvent::DefaultsLoaded);
            if note(port.save_all(&self.state.store), "defaults save") {
                sink.emit(&AppEvent::SettingsSaved);
            }
        }

        while let Some(at) = self.pending_calibration.pop() {
            note(port.save_calibration(&self.state.store, at), "calibration save");
        }

        if core::mem::take(&mut self.credentials_dirty) {
            let ssid = self.state.store.string(addr::WIFI_SSID);
            let password = self.state.store.string(addr::WIFI_PASSWORD);
            note(port.save_credentials(&ssid, &password), "credential save");
        }

        result
    }

    /// Record a successful network time synchronisation.
    pub fn note_time_sync(&mut self, now_ms: u32) {
        self.clock.note_sync(now_ms);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        let st = &self.state;
        let mut channels = Vec::new();
        for ch in TELEMETRY_ORDER {
            let r = st.reading(ch);
            // Capacity equals the channel list length.
            let _ = channels.push(ChannelTelemetry {
                channel: ch,
                value: r.value,
                units: st.units(ch),
                valid: r.valid,
            });
        }
        let loops = core::array::from_fn(|i| {
            let f = |base| st.store.flag(flag::loop_flag(base, i));
            LoopTelemetry {
                enabled: f(flag::LOOP_ENABLE_BASE),
                active: f(flag::LOOP_ACTIVE_BASE),
                alarm_low: f(flag::LOOP_ALARM_LOW_BASE),
                alarm_high: f(flag::LOOP_ALARM_HIGH_BASE),
            }
        });
        let outputs = OutputId::ALL.map(|o| st.store.flag(flag::output_status(o)));
        TelemetryData {
            uptime_ms: self.last_tick_ms,
            channels,
            loops,
            outputs,
            fault_flags: self.safety.faults(),
            time_valid: st.time_valid(),
            startup: st.startup(),
        }
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    /// Direct access for local UI edits.  Call
    /// [`StateStore::request_limit_check`](crate::store::StateStore::request_limit_check)
    /// after changing settings.
    pub fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn analog(&self) -> &AnalogEngine {
        &self.analog
    }

    pub fn control(&self) -> &ControlEngine {
        &self.control
    }

    /// Current system fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.safety.faults()
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
