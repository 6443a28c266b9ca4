//! Continuous trigger poll loop tests.

mod common;

use common::*;
use rust_espnow_relay::config::board;
use rust_espnow_relay::hal::{IoError, Level, SendOutcome, TransportError};
use rust_espnow_relay::peer::PeerAddress;
use rust_espnow_relay::protocol::Command;
use rust_espnow_relay::{
    InputPollLoop, NodeConfig, NodeError, NodeRole, RadioSession, SendErrorPolicy, SessionRole,
    TickOutcome,
};

const HELD: Level = Level::Low;
const RELEASED: Level = Level::High;

struct Rig {
    trace: Trace,
    radio: RadioHandle,
    session: RadioSession<MockTransport>,
    delay: MockDelay,
    received: Vec<(PeerAddress, Command)>,
}

fn rig() -> Rig {
    let trace = new_trace();
    let (transport, radio) = MockTransport::new(&trace);
    let mut session = RadioSession::initialize(
        transport,
        SessionRole::Transceiver,
        TEST_CHANNEL,
        None,
        leak_queue(),
        leak_log(),
    )
    .unwrap();
    session
        .register_peer(PeerAddress::BROADCAST, TEST_CHANNEL)
        .unwrap();
    let delay = MockDelay::new(&trace);
    Rig {
        trace,
        radio,
        session,
        delay,
        received: Vec::new(),
    }
}

fn poll_loop(policy: SendErrorPolicy) -> InputPollLoop {
    let config = NodeConfig::for_role(NodeRole::ContinuousTrigger).poll;
    InputPollLoop::new(config, PeerAddress::BROADCAST, policy)
}

fn tick(
    r: &mut Rig,
    lp: &mut InputPollLoop,
    io: &mut MockIo,
) -> Result<TickOutcome, NodeError> {
    let received = &mut r.received;
    let mut handler = |src: PeerAddress, cmd: Command| received.push((src, cmd));
    lp.tick(&mut r.session, io, &mut r.delay, &mut handler)
}

fn sends(trace: &Trace) -> usize {
    count(trace, |c| matches!(c, Call::Send { .. }))
}

fn delays(trace: &Trace) -> Vec<u32> {
    trace
        .borrow()
        .iter()
        .filter_map(|c| match c {
            Call::DelayMs(ms) => Some(*ms),
            _ => None,
        })
        .collect()
}

#[test]
fn test_held_input_sends_every_debounce_interval() {
    let mut r = rig();
    let mut io = MockIo::new(&r.trace).with_idle_level(HELD);
    let mut lp = poll_loop(SendErrorPolicy::Fatal);

    for _ in 0..5 {
        assert_eq!(tick(&mut r, &mut lp, &mut io), Ok(TickOutcome::Sent));
    }

    assert_eq!(sends(&r.trace), 5);
    assert_eq!(delays(&r.trace), vec![200; 5]);
    assert_eq!(lp.sends(), 5);

    // Each send is followed by its debounce sleep before the next read
    let trace = r.trace.borrow();
    for (i, call) in trace.iter().enumerate() {
        if matches!(call, Call::Send { .. }) {
            assert_eq!(trace[i + 1], Call::DelayMs(200));
        }
    }
}

#[test]
fn test_released_input_suppresses_send() {
    let mut r = rig();
    let mut io = MockIo::new(&r.trace).with_idle_level(RELEASED);
    let mut lp = poll_loop(SendErrorPolicy::Fatal);

    for _ in 0..3 {
        assert_eq!(tick(&mut r, &mut lp, &mut io), Ok(TickOutcome::Idle));
    }

    assert_eq!(sends(&r.trace), 0);
    assert_eq!(delays(&r.trace), vec![10; 3]);
}

#[test]
fn test_press_release_press() {
    let mut r = rig();
    let mut io = MockIo::new(&r.trace)
        .with_reads(&[HELD, RELEASED, RELEASED, HELD])
        .with_idle_level(RELEASED);
    let mut lp = poll_loop(SendErrorPolicy::Fatal);

    let outcomes: Vec<_> = (0..5)
        .map(|_| tick(&mut r, &mut lp, &mut io).unwrap())
        .collect();

    assert_eq!(
        outcomes,
        vec![
            TickOutcome::Sent,
            TickOutcome::Idle,
            TickOutcome::Idle,
            TickOutcome::Sent,
            TickOutcome::Idle
        ]
    );
    assert_eq!(sends(&r.trace), 2);
    assert_eq!(delays(&r.trace), vec![200, 10, 10, 200, 10]);
    assert_eq!(lp.ticks(), 5);
}

#[test]
fn test_reads_configured_trigger_pin() {
    let mut r = rig();
    let mut io = MockIo::new(&r.trace);
    let mut lp = poll_loop(SendErrorPolicy::Fatal);
    tick(&mut r, &mut lp, &mut io).unwrap();

    assert!(r.trace.borrow().contains(&Call::ReadLevel {
        pin: board::TRIGGER_PIN
    }));
}

#[test]
fn test_sends_open_frame() {
    let mut r = rig();
    let mut io = MockIo::new(&r.trace).with_reads(&[HELD]);
    let mut lp = poll_loop(SendErrorPolicy::Fatal);
    tick(&mut r, &mut lp, &mut io).unwrap();

    assert!(r.trace.borrow().contains(&Call::Send {
        address: PeerAddress::BROADCAST,
        payload: b"Open\0".to_vec()
    }));
}

#[test]
fn test_send_error_terminates_run() {
    let mut r = rig();
    r.radio.fail_send(TransportError::OutOfMemory);
    let mut io = MockIo::new(&r.trace).with_idle_level(HELD);
    let mut lp = poll_loop(SendErrorPolicy::Fatal);

    let received = &mut r.received;
    let mut handler = |src: PeerAddress, cmd: Command| received.push((src, cmd));
    let result = lp.run(&mut r.session, &mut io, &mut r.delay, &mut handler);

    assert_eq!(
        result.err(),
        Some(NodeError::SendRequest(TransportError::OutOfMemory))
    );
    assert_eq!(sends(&r.trace), 1);
    // No debounce sleep after the fatal error
    assert!(delays(&r.trace).is_empty());
}

#[test]
fn test_send_error_absorbed_by_log_policy() {
    let mut r = rig();
    r.radio.fail_send(TransportError::Driver(-1));
    let mut io = MockIo::new(&r.trace).with_idle_level(HELD);
    let mut lp = poll_loop(SendErrorPolicy::LogAndContinue);

    assert_eq!(tick(&mut r, &mut lp, &mut io), Ok(TickOutcome::SendRejected));
    r.radio.accept_sends();
    assert_eq!(tick(&mut r, &mut lp, &mut io), Ok(TickOutcome::Sent));

    assert_eq!(delays(&r.trace), vec![200, 200]);
    assert_eq!(lp.sends(), 1);
}

#[test]
fn test_read_failure_is_fatal() {
    let mut r = rig();
    let mut io = MockIo::new(&r.trace).with_read_failure(IoError::Driver(-2));
    let mut lp = poll_loop(SendErrorPolicy::Fatal);

    assert_eq!(
        tick(&mut r, &mut lp, &mut io),
        Err(NodeError::Hardware(IoError::Driver(-2)))
    );
    assert_eq!(sends(&r.trace), 0);
}

#[test]
fn test_tick_services_outcomes_and_inbound_frames() {
    let mut r = rig();
    let mut io = MockIo::new(&r.trace).with_reads(&[HELD]);
    let mut lp = poll_loop(SendErrorPolicy::Fatal);

    tick(&mut r, &mut lp, &mut io).unwrap();
    assert!(r.session.outcome_pending());

    r.radio.complete_send(PeerAddress::BROADCAST, SendOutcome::Success);
    r.radio.deliver(station(9), b"Alarm\0");
    r.radio.deliver(station(9), b"garbage");

    tick(&mut r, &mut lp, &mut io).unwrap();

    assert!(!r.session.outcome_pending());
    assert_eq!(r.session.last_outcome(), Some(SendOutcome::Success));
    assert_eq!(r.received, vec![(station(9), Command::Alarm)]);
}
