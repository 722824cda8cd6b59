//! Output ownership and matrix arbitration through the full service.

use symbctrl::app::commands::AppCommand;
use symbctrl::app::events::AppEvent;
use symbctrl::channel::{Channel, OutputId};
use symbctrl::matrix::Source;
use symbctrl::store::addr::{self, flag, loop_addr, loop_reg};

use crate::mock_hw::{input, make_app, run, temp_counts, wall};

#[test]
fn every_output_starts_off() {
    let (mut app, mut hw, mut sink) = make_app();
    run(&mut app, &mut hw, &mut sink, 0, 10, None);
    assert_eq!(hw.outputs, [false; 4]);
    // The first pass drives every pin once without reporting a change.
    assert_eq!(hw.output_calls.len(), OutputId::ALL.len());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::OutputChanged { .. })), 0);
}

#[test]
fn unowned_output_follows_manual_request() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(
        AppCommand::SetOutputRequest { output: OutputId::DigitalOut2, on: true },
        &mut sink,
    )
    .unwrap();
    run(&mut app, &mut hw, &mut sink, 0, 10, None);
    assert!(hw.output(OutputId::DigitalOut2));
    assert!(app.state().digital(Channel::DigitalOut2));
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::OutputChanged { output: OutputId::DigitalOut2, on: true }
        )),
        0,
        "initial drive is not a change"
    );

    app.handle_command(
        AppCommand::SetOutputRequest { output: OutputId::DigitalOut2, on: false },
        &mut sink,
    )
    .unwrap();
    run(&mut app, &mut hw, &mut sink, 10, 20, None);
    assert!(!hw.output(OutputId::DigitalOut2));
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::OutputChanged { output: OutputId::DigitalOut2, on: false }
        )),
        1
    );
}

#[test]
fn manual_request_is_ignored_once_owned() {
    let (mut app, mut hw, mut sink) = make_app();
    {
        let s = &mut app.state_mut().store;
        s.set_flag(flag::output_request(OutputId::Relay2), true);
        s.set_channel(addr::TLC_OUTPUT, Channel::Relay2);
        s.request_limit_check();
    }
    run(&mut app, &mut hw, &mut sink, 0, 100, None);
    assert_eq!(app.state().ownership.owner(OutputId::Relay2), Some(Source::TimeLimited));
    assert!(!hw.output(OutputId::Relay2), "timed command is idle");
}

#[test]
fn second_claimant_is_reset_and_reported() {
    let (mut app, mut hw, mut sink) = make_app();
    let first = loop_addr(0, loop_reg::OUTPUT);
    let second = loop_addr(2, loop_reg::OUTPUT);
    app.handle_command(
        AppCommand::WriteRegister { addr: first, value: Channel::Relay1.raw() },
        &mut sink,
    )
    .unwrap();
    app.handle_command(
        AppCommand::WriteRegister { addr: second, value: Channel::Relay1.raw() },
        &mut sink,
    )
    .unwrap();

    assert_eq!(app.state().store.channel(first), Channel::Relay1);
    assert_eq!(app.state().store.channel(second), Channel::None);
    assert_eq!(app.state().ownership.owner(OutputId::Relay1), Some(Source::Loop1));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::LimitsCorrected(1))), 1);
}

#[test]
fn loop_wins_over_time_of_day_for_the_same_output() {
    let (mut app, mut hw, mut sink) = make_app();
    {
        let s = &mut app.state_mut().store;
        s.set_channel(addr::TOD_OUTPUT_BASE, Channel::DigitalOut1);
        s.set_channel(loop_addr(3, loop_reg::OUTPUT), Channel::DigitalOut1);
        s.request_limit_check();
    }
    run(&mut app, &mut hw, &mut sink, 0, 10, None);
    assert_eq!(app.state().ownership.owner(OutputId::DigitalOut1), Some(Source::Loop4));
    assert_eq!(app.state().store.channel(addr::TOD_OUTPUT_BASE), Channel::None);
}

#[test]
fn time_of_day_drives_every_listed_output() {
    let (mut app, mut hw, mut sink) = make_app();
    {
        let s = &mut app.state_mut().store;
        s.set_flag(flag::TOD_ENABLE, true);
        s.set_channel(addr::TOD_OUTPUT_BASE, Channel::Relay2);
        s.set_channel(addr::TOD_OUTPUT_BASE + 1, Channel::DigitalOut1);
        s.set_channel(addr::TOD_OUTPUT_BASE + 2, Channel::VirtualState1);
        s.request_limit_check();
    }
    app.note_time_sync(0);

    // Inside 06:00-18:00 but still in the startup lockout.
    run(&mut app, &mut hw, &mut sink, 0, 20_000, Some(wall(12, 0)));
    assert!(!hw.output(OutputId::Relay2));

    run(&mut app, &mut hw, &mut sink, 20_000, 31_000, Some(wall(12, 0)));
    assert!(hw.output(OutputId::Relay2));
    assert!(hw.output(OutputId::DigitalOut1));
    assert!(app.state().digital(Channel::VirtualState1));
    assert!(app.state().digital(Channel::TimeOfDay));

    run(&mut app, &mut hw, &mut sink, 31_000, 32_000, Some(wall(18, 0)));
    assert!(!hw.output(OutputId::Relay2));
    assert!(!hw.output(OutputId::DigitalOut1));
    assert!(!app.state().digital(Channel::VirtualState1));
}

#[test]
fn loop_output_through_virtual_state_feeds_the_logic_gate() {
    let (mut app, mut hw, mut sink) = make_app();
    {
        let s = &mut app.state_mut().store;
        s.set_channel(loop_addr(0, loop_reg::INPUT), Channel::Temp1);
        s.set_channel(loop_addr(0, loop_reg::OUTPUT), Channel::VirtualState2);
        s.set_f32(loop_addr(0, loop_reg::SETPOINT), 30.0);
        s.set_flag(flag::loop_flag(flag::LOOP_ENABLE_BASE, 0), true);
        s.set_channel(addr::LOGIC_IN_A, Channel::VirtualState2);
        s.set_channel(addr::LOGIC_IN_B, Channel::DigitalIn1);
        // Echo passes input A straight through.
        s.set_u16(addr::LOGIC_FUNCTION, symbctrl::channel::LogicFn::Echo as u16);
        s.set_channel(addr::LOGIC_OUTPUT, Channel::Relay2);
        s.request_limit_check();
    }
    hw.mux[input::TEMP1] = temp_counts(35.0);
    run(&mut app, &mut hw, &mut sink, 0, 15_000, None);

    assert!(app.state().digital(Channel::VirtualState2));
    assert_eq!(app.state().ownership.owner(OutputId::Relay2), Some(Source::Logic));
    assert!(hw.output(OutputId::Relay2));
    // Nobody claims Relay1.
    assert!(!hw.output(OutputId::Relay1));
}

#[test]
fn disabled_time_of_day_target_stays_off() {
    let (mut app, mut hw, mut sink) = make_app();
    {
        let s = &mut app.state_mut().store;
        s.set_flag(flag::TOD_ENABLE, false);
        s.set_channel(addr::TOD_OUTPUT_BASE, Channel::Relay2);
        s.request_limit_check();
    }
    app.note_time_sync(0);
    // Noon is inside the default 06:00-18:00 window.
    run(&mut app, &mut hw, &mut sink, 0, 35_000, Some(wall(12, 0)));

    assert_eq!(app.state().ownership.owner(OutputId::Relay2), Some(Source::TimeOfDay));
    assert!(!hw.output(OutputId::Relay2));
    assert!(!hw.output_calls.contains(&(OutputId::Relay2, true)));
    assert!(!app.state().digital(Channel::TimeOfDay));
}

#[test]
fn disabled_loop_claim_never_pulses_its_relay() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(
        AppCommand::WriteRegister {
            addr: loop_addr(3, loop_reg::OUTPUT),
            value: Channel::Relay1.raw(),
        },
        &mut sink,
    )
    .unwrap();
    run(&mut app, &mut hw, &mut sink, 0, 2_000, None);

    assert_eq!(app.state().ownership.owner(OutputId::Relay1), Some(Source::Loop4));
    assert!(!hw.output_calls.contains(&(OutputId::Relay1, true)));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::OutputChanged { .. })), 0);
}

#[test]
fn new_claim_is_off_until_the_owner_turns_it_on() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.mux[input::TEMP1] = temp_counts(35.0);
    {
        let s = &mut app.state_mut().store;
        s.set_channel(loop_addr(0, loop_reg::INPUT), Channel::Temp1);
        s.set_f32(loop_addr(0, loop_reg::SETPOINT), 30.0);
        s.set_u16(loop_addr(0, loop_reg::MIN_ON_TIME), 5);
        s.request_limit_check();
    }
    run(&mut app, &mut hw, &mut sink, 0, 15_000, None);

    // Take the relay and enable the loop together.  The loop demands on
    // straight away, but the minimum on/off time holds the change back.
    app.handle_command(
        AppCommand::WriteRegister {
            addr: loop_addr(0, loop_reg::OUTPUT),
            value: Channel::Relay1.raw(),
        },
        &mut sink,
    )
    .unwrap();
    app.handle_command(AppCommand::SetLoopEnabled { index: 0, enabled: true }, &mut sink)
        .unwrap();

    let mut first_on = None;
    for now in 15_000..25_000 {
        app.tick(now, None, &mut hw, &mut sink);
        let on = hw.output(OutputId::Relay1);
        assert!(!on || app.state().digital(Channel::Loop1), "on at {now} before the loop published");
        if on && first_on.is_none() {
            first_on = Some(now);
        }
    }
    let first_on = first_on.expect("loop never switched the relay on");
    assert!(first_on >= 20_000, "switched on at {first_on}");
}
