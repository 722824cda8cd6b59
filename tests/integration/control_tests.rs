//! End-to-end control loop behaviour: probe counts in, relay state out.

use symbctrl::app::commands::AppCommand;
use symbctrl::app::events::AppEvent;
use symbctrl::app::service::AppService;
use symbctrl::channel::{Channel, OutputId};
use symbctrl::error::SystemFault;
use symbctrl::store::addr::{flag, loop_addr, loop_reg};

use crate::mock_hw::{analog_counts, input, make_app, run, temp_counts};

/// Loop 1: Temp1 → Relay1, high acting.
fn configure_loop1(app: &mut AppService, setpoint: f32, hysteresis: f32, low: f32, high: f32) {
    let s = &mut app.state_mut().store;
    s.set_channel(loop_addr(0, loop_reg::INPUT), Channel::Temp1);
    s.set_channel(loop_addr(0, loop_reg::OUTPUT), Channel::Relay1);
    s.set_f32(loop_addr(0, loop_reg::SETPOINT), setpoint);
    s.set_f32(loop_addr(0, loop_reg::HYSTERESIS), hysteresis);
    s.set_f32(loop_addr(0, loop_reg::ALARM_LOW), low);
    s.set_f32(loop_addr(0, loop_reg::ALARM_HIGH), high);
    s.set_flag(flag::loop_flag(flag::LOOP_ENABLE_BASE, 0), true);
    s.request_limit_check();
}

fn alarm_events(sink: &crate::mock_hw::RecordingSink, raised: bool) -> usize {
    sink.count(|e| matches!(e, AppEvent::LoopAlarm { index: 0, alarms } if alarms.any() == raised))
}

// ── Hysteresis band ───────────────────────────────────────────

#[test]
fn relay_follows_temperature_through_the_band() {
    let (mut app, mut hw, mut sink) = make_app();
    configure_loop1(&mut app, 30.0, 2.0, 10.0, 40.0);

    // 25 °C: below the band, relay off once the filter settles.
    run(&mut app, &mut hw, &mut sink, 0, 15_000, None);
    assert!(!hw.output(OutputId::Relay1));

    // 35 °C: above setpoint + h/2.
    hw.mux[input::TEMP1] = temp_counts(35.0);
    run(&mut app, &mut hw, &mut sink, 15_000, 20_000, None);
    assert!(hw.output(OutputId::Relay1));
    assert!(app.state().store.flag(flag::loop_flag(flag::LOOP_ACTIVE_BASE, 0)));
    assert!(app.state().digital(Channel::Loop1));

    // Inside the band the relay holds its state.
    hw.mux[input::TEMP1] = temp_counts(30.5);
    run(&mut app, &mut hw, &mut sink, 20_000, 30_000, None);
    assert!(hw.output(OutputId::Relay1));

    // Back below setpoint - h/2.
    hw.mux[input::TEMP1] = temp_counts(25.0);
    run(&mut app, &mut hw, &mut sink, 30_000, 40_000, None);
    assert!(!hw.output(OutputId::Relay1));
    assert!(sink.count(|e| matches!(
        e,
        AppEvent::OutputChanged { output: OutputId::Relay1, on: false }
    )) >= 1);
}

#[test]
fn low_acting_loop_inverts_the_band() {
    let (mut app, mut hw, mut sink) = make_app();
    configure_loop1(&mut app, 30.0, 2.0, 10.0, 40.0);
    app.state_mut()
        .store
        .set_flag(flag::loop_flag(flag::LOOP_HIGH_ACTING_BASE, 0), false);

    run(&mut app, &mut hw, &mut sink, 0, 15_000, None);
    assert!(hw.output(OutputId::Relay1), "25 °C is below the band");

    hw.mux[input::TEMP1] = temp_counts(35.0);
    run(&mut app, &mut hw, &mut sink, 15_000, 20_000, None);
    assert!(!hw.output(OutputId::Relay1));
}

#[test]
fn setpoint_written_over_the_register_protocol() {
    let (mut app, mut hw, mut sink) = make_app();
    configure_loop1(&mut app, 30.0, 2.0, 10.0, 40.0);
    run(&mut app, &mut hw, &mut sink, 0, 15_000, None);
    assert!(!hw.output(OutputId::Relay1));

    // 20.0 as an IEEE-754 pair, low word first.
    let bits = 20.0_f32.to_bits();
    let at = loop_addr(0, loop_reg::SETPOINT);
    app.handle_command(
        AppCommand::WriteRegister { addr: at, value: bits as u16 },
        &mut sink,
    )
    .unwrap();
    app.handle_command(
        AppCommand::WriteRegister { addr: at + 1, value: (bits >> 16) as u16 },
        &mut sink,
    )
    .unwrap();
    assert_eq!(app.state().store.f32(at), 20.0);

    run(&mut app, &mut hw, &mut sink, 15_000, 18_000, None);
    assert!(hw.output(OutputId::Relay1), "25 °C is now above 20 + 1");
}

// ── Dwell ─────────────────────────────────────────────────────

#[test]
fn minimum_on_time_delays_switching() {
    let (mut app, mut hw, mut sink) = make_app();
    configure_loop1(&mut app, 30.0, 2.0, 10.0, 40.0);
    app.state_mut()
        .store
        .set_u16(loop_addr(0, loop_reg::MIN_ON_TIME), 10);

    run(&mut app, &mut hw, &mut sink, 0, 15_000, None);
    assert!(!hw.output(OutputId::Relay1));

    hw.mux[input::TEMP1] = temp_counts(35.0);
    run(&mut app, &mut hw, &mut sink, 15_000, 20_000, None);
    assert!(!hw.output(OutputId::Relay1), "held by the dwell");
    assert!(app.control().control_loop(0).unwrap().dwell().is_holding());

    run(&mut app, &mut hw, &mut sink, 20_000, 30_000, None);
    assert!(hw.output(OutputId::Relay1));
}

// ── Enable ────────────────────────────────────────────────────

#[test]
fn external_enable_follows_digital_input() {
    let (mut app, mut hw, mut sink) = make_app();
    configure_loop1(&mut app, 30.0, 2.0, 10.0, 40.0);
    {
        let s = &mut app.state_mut().store;
        s.set_flag(flag::loop_flag(flag::LOOP_ENABLE_BASE, 0), false);
        s.set_channel(loop_addr(0, loop_reg::ENABLE_SOURCE), Channel::DigitalIn1);
    }
    hw.mux[input::TEMP1] = temp_counts(35.0);

    run(&mut app, &mut hw, &mut sink, 0, 15_000, None);
    assert!(!hw.output(OutputId::Relay1), "input 1 is low");

    hw.mux[input::ANALOG1] = analog_counts(9.0);
    run(&mut app, &mut hw, &mut sink, 15_000, 17_000, None);
    assert!(app.state().digital(Channel::DigitalIn1));
    assert!(hw.output(OutputId::Relay1));

    hw.mux[input::ANALOG1] = 0;
    run(&mut app, &mut hw, &mut sink, 17_000, 19_000, None);
    assert!(!hw.output(OutputId::Relay1));
}

#[test]
fn disabling_a_loop_turns_its_output_off() {
    let (mut app, mut hw, mut sink) = make_app();
    configure_loop1(&mut app, 30.0, 2.0, 10.0, 40.0);
    hw.mux[input::TEMP1] = temp_counts(35.0);
    run(&mut app, &mut hw, &mut sink, 0, 15_000, None);
    assert!(hw.output(OutputId::Relay1));

    app.handle_command(
        AppCommand::SetLoopEnabled { index: 0, enabled: false },
        &mut sink,
    )
    .unwrap();
    run(&mut app, &mut hw, &mut sink, 15_000, 17_000, None);
    assert!(!hw.output(OutputId::Relay1));
}

// ── Alarms ────────────────────────────────────────────────────

#[test]
fn alarms_wait_for_startup_lockout_then_silence_clears_them() {
    let (mut app, mut hw, mut sink) = make_app();
    configure_loop1(&mut app, 30.0, 2.0, 10.0, 30.0);
    hw.mux[input::TEMP1] = temp_counts(35.0);

    run(&mut app, &mut hw, &mut sink, 0, 29_000, None);
    assert_eq!(alarm_events(&sink, true), 0, "startup lockout");

    run(&mut app, &mut hw, &mut sink, 29_000, 33_000, None);
    assert_eq!(alarm_events(&sink, true), 1);
    let s = &app.state().store;
    assert!(s.flag(flag::loop_flag(flag::LOOP_ALARM_HIGH_BASE, 0)));
    assert!(!s.flag(flag::loop_flag(flag::LOOP_ALARM_LOW_BASE, 0)));
    assert!(s.flag(flag::ANY_ALARM));
    assert!(app.fault_flags() & SystemFault::ControlAlarm.mask() != 0);

    app.handle_command(AppCommand::SilenceAlarms(true), &mut sink)
        .unwrap();
    run(&mut app, &mut hw, &mut sink, 33_000, 35_000, None);
    assert_eq!(alarm_events(&sink, false), 1);
    assert!(!app.state().store.flag(flag::ANY_ALARM));
    assert!(app.fault_flags() & SystemFault::ControlAlarm.mask() == 0);
}

#[test]
fn converter_failure_raises_both_alarms() {
    let (mut app, mut hw, mut sink) = make_app();
    {
        let s = &mut app.state_mut().store;
        s.set_channel(loop_addr(1, loop_reg::INPUT), Channel::WqAmp);
        s.set_channel(loop_addr(1, loop_reg::OUTPUT), Channel::Relay2);
        s.set_f32(loop_addr(1, loop_reg::SETPOINT), 6.0);
        s.set_f32(loop_addr(1, loop_reg::ALARM_LOW), 5.0);
        s.set_f32(loop_addr(1, loop_reg::ALARM_HIGH), 9.0);
        s.set_flag(flag::loop_flag(flag::LOOP_ENABLE_BASE, 1), true);
        s.request_limit_check();
    }
    run(&mut app, &mut hw, &mut sink, 0, 35_000, None);
    assert!(hw.output(OutputId::Relay2), "pH 7 is above 6 + 0.5");
    assert!(!app.state().store.flag(flag::loop_flag(flag::LOOP_ALARM_BASE, 1)));

    hw.fail_chemistry = true;
    run(&mut app, &mut hw, &mut sink, 35_000, 37_000, None);
    let s = &app.state().store;
    assert!(s.flag(flag::loop_flag(flag::LOOP_ALARM_LOW_BASE, 1)));
    assert!(s.flag(flag::loop_flag(flag::LOOP_ALARM_HIGH_BASE, 1)));
    assert!(!hw.output(OutputId::Relay2), "invalid input forces demand off");
}

// ── Min / max ─────────────────────────────────────────────────

#[test]
fn min_max_track_after_startup_and_reset_on_request() {
    let (mut app, mut hw, mut sink) = make_app();
    configure_loop1(&mut app, 30.0, 2.0, 10.0, 40.0);

    run(&mut app, &mut hw, &mut sink, 0, 31_000, None);
    hw.mux[input::TEMP1] = temp_counts(35.0);
    run(&mut app, &mut hw, &mut sink, 31_000, 45_000, None);
    hw.mux[input::TEMP1] = temp_counts(25.0);
    run(&mut app, &mut hw, &mut sink, 45_000, 60_000, None);

    let min_at = loop_addr(0, loop_reg::MINIMUM);
    let max_at = loop_addr(0, loop_reg::MAXIMUM);
    assert!(app.state().store.f32(max_at) > 34.0);
    assert!((app.state().store.f32(min_at) - 25.0).abs() < 0.5);

    app.handle_command(AppCommand::ResetMinMax(0), &mut sink)
        .unwrap();
    run(&mut app, &mut hw, &mut sink, 60_000, 62_000, None);
    assert!(app.state().store.f32(max_at) < 26.0);
}
