//! Acquisition sweep against a mock converter board.

use symbctrl::channel::{Channel, Units};
use symbctrl::config::SystemConfig;
use symbctrl::sensors::{AnalogEngine, Position};
use symbctrl::settings::load_defaults;
use symbctrl::state::SystemState;
use symbctrl::store::addr::{self, flag};

use crate::mock_hw::{analog_counts, input, temp_counts, MockHardware, NEUTRAL_COUNTS};

fn engine() -> (AnalogEngine, SystemState) {
    let config = SystemConfig::default();
    let mut st = SystemState::new();
    load_defaults(&mut st.store, &config);
    (AnalogEngine::new(&config), st)
}

/// Enough sweeps for every filter to settle within a count.
fn settle(engine: &mut AnalogEngine, hw: &mut MockHardware, st: &mut SystemState) {
    for _ in 0..1000 {
        engine.sweep(hw, st);
    }
}

#[test]
fn healthy_board_reads_neutral_and_room_temperature() {
    let (mut engine, mut st) = engine();
    let mut hw = MockHardware::new();
    settle(&mut engine, &mut hw, &mut st);

    let ph = st.reading(Channel::WqAmp);
    assert!(ph.valid);
    assert!((ph.value - 7.0).abs() < 0.05, "pH {}", ph.value);
    assert_eq!(st.units(Channel::WqAmp), Units::Ph);

    for ch in [Channel::Temp1, Channel::Temp2] {
        let t = st.reading(ch);
        assert!(t.valid);
        assert!((t.value - 25.0).abs() < 0.1, "{ch:?} {}", t.value);
    }

    let supply = st.reading(Channel::SupplyVoltage);
    assert!(supply.valid);
    assert!((supply.value - 12.0).abs() < 0.05);

    let internal = st.reading(Channel::InternalTemp);
    assert!(internal.valid);
    assert!((15.0..35.0).contains(&internal.value), "board {}", internal.value);

    let raw = engine.reading(Channel::WqAmp).unwrap().raw_average;
    assert!((raw - f32::from(NEUTRAL_COUNTS)).abs() < 1.0);
}

#[test]
fn fahrenheit_units_convert_temperature() {
    let (mut engine, mut st) = engine();
    st.store.set_units(addr::units_addr(Channel::Temp1).unwrap(), Units::DegF);
    let mut hw = MockHardware::new();
    hw.mux[input::TEMP1] = temp_counts(100.0);
    settle(&mut engine, &mut hw, &mut st);

    let t = st.reading(Channel::Temp1);
    assert!(t.valid);
    assert!((t.value - 212.0).abs() < 0.2, "{}", t.value);
}

#[test]
fn calibration_applies_offset_then_gain() {
    let (mut engine, mut st) = engine();
    let (offset, gain) = addr::calibration_addrs(Channel::Temp2).unwrap();
    st.store.set_f32(offset, 1.0);
    st.store.set_f32(gain, 2.0);
    let mut hw = MockHardware::new();
    settle(&mut engine, &mut hw, &mut st);

    let t = st.reading(Channel::Temp2);
    assert!((t.value - 52.0).abs() < 0.2, "{}", t.value);
}

#[test]
fn chemistry_failure_invalidates_only_that_channel() {
    let (mut engine, mut st) = engine();
    let mut hw = MockHardware::new();
    settle(&mut engine, &mut hw, &mut st);
    assert!(st.reading(Channel::WqAmp).valid);

    hw.fail_chemistry = true;
    engine.sweep(&mut hw, &mut st);
    assert!(!st.reading(Channel::WqAmp).valid);
    assert!(!st.store.flag(addr::valid_flag(Channel::WqAmp).unwrap()));
    assert!(st.reading(Channel::Temp1).valid);

    hw.fail_chemistry = false;
    engine.sweep(&mut hw, &mut st);
    assert!(st.reading(Channel::WqAmp).valid);
}

#[test]
fn open_temperature_probe_reads_invalid() {
    let (mut engine, mut st) = engine();
    let mut hw = MockHardware::new();
    // A full-scale count is far above the probe's range.
    hw.mux[input::TEMP2] = 4095;
    settle(&mut engine, &mut hw, &mut st);
    assert!(!st.reading(Channel::Temp2).valid);
    assert!(st.reading(Channel::Temp1).valid);
}

#[test]
fn analog_inputs_double_as_digital_inputs() {
    let (mut engine, mut st) = engine();
    let mut hw = MockHardware::new();
    hw.mux[input::ANALOG1] = analog_counts(9.0);
    engine.sweep(&mut hw, &mut st);
    assert!(st.store.flag(flag::DIGITAL_IN_1));
    assert!(!st.store.flag(flag::DIGITAL_IN_2));

    // The digital state follows the raw sample, not the filtered value.
    hw.mux[input::ANALOG1] = 0;
    hw.mux[input::ANALOG2] = 4000;
    engine.sweep(&mut hw, &mut st);
    assert!(!st.digital(Channel::DigitalIn1));
    assert!(st.digital(Channel::DigitalIn2));
}

#[test]
fn sweep_visits_positions_in_order_with_preselect() {
    let config = SystemConfig::default();
    let mut engine = AnalogEngine::new(&config);
    let mut st = SystemState::new();
    load_defaults(&mut st.store, &config);
    let mut hw = MockHardware::new();

    let mut visited = Vec::new();
    for now in 0..=(config.sample_interval_ms * 7) {
        if let Some(pos) = engine.service(now, &mut hw, &mut st) {
            visited.push(pos);
        }
    }
    assert_eq!(visited, Position::SWEEP.to_vec());
    // Each mux read selects the next input, wrapping after the last.
    assert_eq!(hw.preselects, vec![1, 2, 3, 4, 5, 0]);
}
