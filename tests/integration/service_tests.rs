//! AppService lifecycle: commands, faults, persistence and telemetry.

use symbctrl::app::commands::AppCommand;
use symbctrl::app::events::AppEvent;
use symbctrl::app::ports::ConfigError;
use symbctrl::app::service::AppService;
use symbctrl::channel::{Channel, OutputId, Units};
use symbctrl::config::SystemConfig;
use symbctrl::error::{Error, ProtocolError, SystemFault};
use symbctrl::protocol::{COIL_ON, bool_to_coil};
use symbctrl::sensors::conversion::Calibration;
use symbctrl::store::RegString;
use symbctrl::store::addr::{self, flag, loop_addr, loop_reg};

use crate::mock_hw::{MockSettings, input, make_app, run};

fn reg_string(s: &str) -> RegString {
    let mut out = RegString::new();
    out.push_str(s).unwrap();
    out
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn start_emits_started() {
    let (_app, _hw, sink) = make_app();
    assert!(matches!(sink.events.as_slice(), [AppEvent::Started]));
}

#[test]
fn time_invalid_fault_after_startup_without_sync() {
    let (mut app, mut hw, mut sink) = make_app();
    run(&mut app, &mut hw, &mut sink, 0, 25_000, None);
    assert_eq!(app.fault_flags() & SystemFault::TimeInvalid.mask(), 0);

    run(&mut app, &mut hw, &mut sink, 25_000, 31_000, None);
    let faults = app.fault_flags();
    assert_ne!(faults & SystemFault::TimeInvalid.mask(), 0);
    assert_eq!(app.state().store.u16(addr::STATUS_CODE), u16::from(faults));
    assert!(sink.count(|e| matches!(e, AppEvent::FaultDetected(m) if m & SystemFault::TimeInvalid.mask() != 0)) >= 1);
}

#[test]
fn supply_fault_sets_and_clears() {
    let (mut app, mut hw, mut sink) = make_app();
    app.note_time_sync(0);
    let noon = Some(crate::mock_hw::wall(12, 0));
    run(&mut app, &mut hw, &mut sink, 0, 15_000, noon);
    assert_eq!(app.fault_flags(), 0, "healthy once the filters settle");

    hw.mux[input::SUPPLY] = (6.0 / 0.004_378_f32).round() as u16;
    run(&mut app, &mut hw, &mut sink, 15_000, 30_000, noon);
    assert_eq!(app.fault_flags(), SystemFault::SupplyLow.mask());

    sink.clear();
    hw.mux[input::SUPPLY] = (12.0 / 0.004_378_f32).round() as u16;
    run(&mut app, &mut hw, &mut sink, 30_000, 45_000, noon);
    assert_eq!(app.fault_flags(), 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultCleared)), 1);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn protocol_rejects_read_only_and_unknown_addresses() {
    let (mut app, _hw, mut sink) = make_app();
    let err = app
        .handle_command(AppCommand::WriteRegister { addr: addr::FIRMWARE_REV, value: 1 }, &mut sink)
        .unwrap_err();
    assert_eq!(err, Error::Protocol(ProtocolError::NotPermitted(addr::FIRMWARE_REV)));

    let err = app
        .handle_command(AppCommand::WriteRegister { addr: 400, value: 1 }, &mut sink)
        .unwrap_err();
    assert_eq!(err, Error::Protocol(ProtocolError::IllegalAddress(400)));

    let err = app
        .handle_command(AppCommand::WriteCoil { addr: flag::SILENCE, raw: 1 }, &mut sink)
        .unwrap_err();
    assert_eq!(err, Error::Protocol(ProtocolError::IllegalValue(1)));
    assert!(!app.state().store.flag(flag::SILENCE));

    app.handle_command(AppCommand::WriteCoil { addr: flag::SILENCE, raw: COIL_ON }, &mut sink)
        .unwrap();
    assert!(app.state().silenced());
}

#[test]
fn out_of_category_selector_is_corrected() {
    let (mut app, _hw, mut sink) = make_app();
    let at = loop_addr(1, loop_reg::INPUT);
    // A relay is not a loop input.
    app.handle_command(AppCommand::WriteRegister { addr: at, value: Channel::Relay1.raw() }, &mut sink)
        .unwrap();
    assert_eq!(app.state().store.channel(at), Channel::None);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::LimitsCorrected(1))), 1);

    // Unknown unit codes clamp.
    app.handle_command(AppCommand::WriteRegister { addr: addr::UNITS_BASE + 3, value: 999 }, &mut sink)
        .unwrap();
    assert_eq!(app.state().store.u16(addr::UNITS_BASE + 3), Units::MAX_SENSOR);
}

#[test]
fn command_errors_leave_state_untouched() {
    let (mut app, _hw, mut sink) = make_app();
    let before = app.state().store.data().to_vec();
    assert!(matches!(
        app.handle_command(AppCommand::SetLoopEnabled { index: 4, enabled: true }, &mut sink),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        app.handle_command(
            AppCommand::Calibrate {
                channel: Channel::InternalTemp,
                calibration: Calibration::IDENTITY,
            },
            &mut sink,
        ),
        Err(Error::Config(_))
    ));
    assert_eq!(app.state().store.data(), before.as_slice());
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn save_request_writes_the_whole_store() {
    let (mut app, _hw, mut sink) = make_app();
    let mut nvs = MockSettings::new();
    app.state_mut()
        .store
        .set_f32(loop_addr(0, loop_reg::SETPOINT), 7.5);

    app.service_persistence(&mut nvs, &mut sink).unwrap();
    assert_eq!(nvs.save_count, 0, "nothing requested");

    app.handle_command(AppCommand::WriteCoil { addr: flag::SAVE_REQUEST, raw: bool_to_coil(true) }, &mut sink)
        .unwrap();
    app.service_persistence(&mut nvs, &mut sink).unwrap();
    assert_eq!(nvs.save_count, 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SettingsSaved)), 1);
    assert!(!app.state().store.flag(flag::SAVE_REQUEST), "request consumed");

    // A fresh service restores the saved setpoint.
    let mut fresh = AppService::new(SystemConfig::default());
    fresh.load_settings(&nvs).unwrap();
    assert_eq!(fresh.state().store.f32(loop_addr(0, loop_reg::SETPOINT)), 7.5);
}

#[test]
fn defaults_request_restores_and_persists_factory_settings() {
    let (mut app, _hw, mut sink) = make_app();
    let mut nvs = MockSettings::new();
    let at = loop_addr(2, loop_reg::SETPOINT);
    app.state_mut().store.set_f32(at, 99.0);
    app.state_mut().store.set_string(addr::WIFI_SSID, "pond-net");

    app.handle_command(AppCommand::LoadDefaults, &mut sink).unwrap();
    app.service_persistence(&mut nvs, &mut sink).unwrap();

    assert_eq!(app.state().store.f32(at), 1.0);
    assert_eq!(app.state().store.string(addr::WIFI_SSID).as_str(), "pond-net");
    assert_eq!(nvs.save_count, 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::DefaultsLoaded)), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SettingsSaved)), 1);
}

#[test]
fn calibration_is_saved_register_by_register() {
    let (mut app, _hw, mut sink) = make_app();
    let mut nvs = MockSettings::new();
    app.handle_command(
        AppCommand::Calibrate {
            channel: Channel::Temp1,
            calibration: Calibration { offset: -0.5, gain: 1.02 },
        },
        &mut sink,
    )
    .unwrap();
    app.service_persistence(&mut nvs, &mut sink).unwrap();

    let (offset, gain) = addr::calibration_addrs(Channel::Temp1).unwrap();
    let mut saved = nvs.calibration_saves.clone();
    saved.sort_unstable();
    assert_eq!(saved, vec![offset, gain]);
    assert_eq!(nvs.save_count, 0, "no full save for a calibration");

    app.service_persistence(&mut nvs, &mut sink).unwrap();
    assert_eq!(nvs.calibration_saves.len(), 2, "queue drained");
}

#[test]
fn credentials_are_stored_once() {
    let (mut app, _hw, mut sink) = make_app();
    let mut nvs = MockSettings::new();
    app.handle_command(
        AppCommand::SetCredentials {
            ssid: reg_string("farm"),
            password: reg_string("s3cret"),
        },
        &mut sink,
    )
    .unwrap();
    app.service_persistence(&mut nvs, &mut sink).unwrap();
    assert_eq!(nvs.credentials, Some(("farm".to_string(), "s3cret".to_string())));

    nvs.credentials = None;
    app.service_persistence(&mut nvs, &mut sink).unwrap();
    assert_eq!(nvs.credentials, None);
}

#[test]
fn persistence_failure_is_reported_but_requests_are_consumed() {
    let (mut app, _hw, mut sink) = make_app();
    let mut nvs = MockSettings {
        fail: true,
        ..MockSettings::new()
    };
    app.handle_command(AppCommand::SaveSettings, &mut sink).unwrap();
    assert_eq!(app.service_persistence(&mut nvs, &mut sink), Err(ConfigError::IoError));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SettingsSaved)), 0);
    assert!(!app.state().store.flag(flag::SAVE_REQUEST));
}

#[test]
fn load_settings_keeps_defaults_when_nothing_is_stored() {
    let mut app = AppService::new(SystemConfig::default());
    assert_eq!(app.load_settings(&MockSettings::new()), Ok(()));
    assert_eq!(app.state().store.i16(addr::TIMEZONE), -10);
}

#[test]
fn load_settings_refreshes_identity_and_limits() {
    let mut config = SystemConfig::default();
    config.serial_number = 4242;
    let mut donor = AppService::new(SystemConfig::default());
    {
        let s = &mut donor.state_mut().store;
        s.set_u16(addr::SERIAL_NUMBER, 1);
        // Saved images can predate a limit change.
        s.set_channel(loop_addr(0, loop_reg::INPUT), Channel::DigitalIn1);
    }
    let nvs = MockSettings {
        image: Some((
            donor.state().store.data().to_vec(),
            donor.state().store.status().to_vec(),
        )),
        ..MockSettings::new()
    };

    let mut app = AppService::new(config);
    app.load_settings(&nvs).unwrap();
    assert_eq!(app.state().store.u16(addr::SERIAL_NUMBER), 4242);
    assert_eq!(app.state().store.channel(loop_addr(0, loop_reg::INPUT)), Channel::None);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_is_emitted_each_interval() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(AppCommand::SetOutputRequest { output: OutputId::Relay2, on: true }, &mut sink)
        .unwrap();
    run(&mut app, &mut hw, &mut sink, 0, 125_000, None);

    let snapshots: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(t.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(snapshots.len(), 2);

    let t = &snapshots[1];
    assert_eq!(t.uptime_ms, 120_000);
    assert_eq!(t.channels.len(), 8);
    assert_eq!(t.channels[1].channel, Channel::Temp1);
    assert!(t.channels[1].valid);
    assert!(t.outputs[OutputId::Relay2.index()]);
    assert!(!t.startup);
    assert!(!t.time_valid);
}
