//! Demo test binary.
//!
//! Registers a few suites at link time and runs them through the ktest CLI:
//!
//! ```text
//! ktest-demo                 # every suite
//! ktest-demo sensor          # one suite
//! ktest-demo math add -v     # one case, detailed report
//! ```

use std::cell::Cell;
use std::process::ExitCode;

use ktest::{kassert, kassert_eq, kassert_ne, mock, register_test};

// -- math --

fn add() {
    kassert_eq!(2 + 3, 5);
}

fn sub() {
    kassert_eq!(7u32.wrapping_sub(9), u32::MAX - 1);
    kassert_ne!(7 - 2, 4);
}

register_test!(math, add, add);
register_test!(math, sub, sub);

// -- sensor: code under test plus its stubbed driver --

/// Stub for the driver call the averaging code depends on.
fn read_sensor(channel: usize) -> usize {
    mock::check_expected_value("read_sensor", "channel", channel);
    mock::get_return_value("read_sensor")
}

fn average_reading(channels: &[usize]) -> usize {
    if channels.is_empty() {
        return 0;
    }
    let total: usize = channels.iter().map(|&channel| read_sensor(channel)).sum();
    total / channels.len()
}

fn averages_two_channels() {
    mock::expect_value("read_sensor", "channel", 0);
    mock::expect_value("read_sensor", "channel", 1);
    mock::returns_value("read_sensor", 10);
    mock::returns_value("read_sensor", 30);

    kassert_eq!(average_reading(&[0, 1]), 20);
}

fn empty_average_reads_nothing() {
    kassert_eq!(average_reading(&[]), 0);
    kassert!(mock::pending() == 0, "no stub entries expected");
}

/// Stub that fills a caller buffer.
fn read_serial(buffer: &mut [u8]) {
    mock::copy_return_data("read_serial", "buffer", Some(buffer));
}

fn serial_frame_is_copied() {
    mock::return_data("read_serial", "buffer", b"OK\r\n");

    let mut frame = [0xFF; 6];
    read_serial(&mut frame);
    kassert_eq!(frame, *b"OK\r\n\0\0");
}

register_test!(sensor, averages_two_channels, averages_two_channels);
register_test!(sensor, empty_average_reads_nothing, empty_average_reads_nothing);
register_test!(sensor, serial_frame_is_copied, serial_frame_is_copied);

// -- fixture: setup and teardown around the body --

thread_local! {
    static DEVICE_OPEN: Cell<bool> = const { Cell::new(false) };
}

fn open_device() {
    tracing::debug!("opening device");
    DEVICE_OPEN.with(|open| open.set(true));
}

fn close_device() {
    kassert!(DEVICE_OPEN.with(Cell::get), "device closed twice");
    DEVICE_OPEN.with(|open| open.set(false));
    tracing::debug!("device closed");
}

fn device_is_open() {
    kassert!(DEVICE_OPEN.with(Cell::get));
}

register_test!(
    fixture,
    device_is_open,
    device_is_open,
    setup = open_device,
    teardown = close_device
);

// -- skip --

fn needs_hardware() {
    if std::env::var_os("KTEST_DEMO_HARDWARE").is_none() {
        ktest::skip();
    }
    kassert_eq!(average_reading(&[]), 0);
}

register_test!(hardware, needs_hardware, needs_hardware);

fn main() -> ExitCode {
    ktest::cli::main()
}
