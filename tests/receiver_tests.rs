//! Receive-side dispatch tests.

mod common;

use common::*;
use rust_espnow_relay::logging::LogLevel;
use rust_espnow_relay::peer::PeerAddress;
use rust_espnow_relay::protocol::{encode, Command};
use rust_espnow_relay::receiver::dispatch;
use rust_espnow_relay::{LoggingActionHandler, RadioSession, SessionRole};

#[test]
fn test_each_named_command_reaches_handler() {
    let log = leak_log();
    let mut seen = vec![];
    let mut handler = |src: PeerAddress, cmd: Command| seen.push((src, cmd));

    for command in [Command::Open, Command::Close, Command::Alarm] {
        let frame = encode(&command);
        assert_eq!(dispatch(log, station(3), frame.as_bytes(), &mut handler), command);
    }

    assert_eq!(
        seen,
        vec![
            (station(3), Command::Open),
            (station(3), Command::Close),
            (station(3), Command::Alarm)
        ]
    );
}

#[test]
fn test_unrecognized_dropped_with_error_log() {
    let log = leak_log();
    let mut calls = 0;
    let mut handler = |_: PeerAddress, _: Command| calls += 1;

    for frame in [&b"OPEN\0"[..], &b"Open\0\0"[..], &b""[..], &b"\xff\xfe"[..]] {
        assert!(!dispatch(log, station(3), frame, &mut handler).is_recognized());
    }
    assert_eq!(calls, 0);

    let entries = drain_log(log);
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|(level, _)| *level == LogLevel::Error));
    assert!(entries[0].1.contains("OPEN"));
}

#[test]
fn test_recognized_logged_with_source() {
    let log = leak_log();
    let mut handler = |_: PeerAddress, _: Command| {};

    dispatch(log, station(0x0a), b"Open\0", &mut handler);

    let entries = drain_log(log);
    assert_eq!(
        entries,
        vec![(
            LogLevel::Info,
            "Data received: 24:6f:28:00:00:0a Open".to_string()
        )]
    );
}

#[test]
fn test_logging_handler_logs_command_name() {
    let log = leak_log();
    let mut handler = LoggingActionHandler::new(log);

    dispatch(log, PeerAddress::BROADCAST, b"Alarm\0", &mut handler);

    let entries = drain_log(log);
    assert_eq!(entries.last().unwrap(), &(LogLevel::Info, "Alarm".to_string()));
}

#[test]
fn test_radio_to_handler_path() {
    let trace = new_trace();
    let (transport, radio) = MockTransport::new(&trace);
    let log = leak_log();
    let mut session = RadioSession::initialize(
        transport,
        SessionRole::Receiver,
        TEST_CHANNEL,
        None,
        leak_queue(),
        log,
    )
    .unwrap();

    radio.deliver(station(1), b"Close\0");
    radio.deliver(station(2), b"Close");

    let mut seen = vec![];
    let mut handler = |src: PeerAddress, cmd: Command| seen.push((src, cmd));
    session.service(
        |_, _| {},
        |src, payload| {
            dispatch(log, src, payload.as_bytes(), &mut handler);
        },
    );

    assert_eq!(
        seen,
        vec![(station(1), Command::Close), (station(2), Command::Close)]
    );
}
