//! RustEspNowRelay firmware entry point.
//!
//! 1. Initialize ESP-IDF and the logger
//! 2. Start the log drain thread
//! 3. Start the node for the compiled-in role and run it
//! 4. Latch any fatal error in the fault state and idle

#[cfg(target_os = "espidf")]
fn main() {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::{error, info, warn};

    use rust_espnow_relay::hal::esp::{EspHardwareIo, EspNowTransport};
    use rust_espnow_relay::hal::TransportError;
    use rust_espnow_relay::log_drain::LogDrain;
    use rust_espnow_relay::logging::timestamp_us;
    use rust_espnow_relay::{
        LoggingActionHandler, Node, NodeError, NodeExit, CONFIG, FAULT, NODE_LOG, RADIO_EVENTS,
    };

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("{}", env!("VERSION_STRING"));
    info!("role {:?} on {}, peer {}", CONFIG.role, CONFIG.channel, CONFIG.peer);

    // Single consumer of NODE_LOG
    let drain = std::thread::Builder::new()
        .stack_size(4096)
        .spawn(|| {
            let mut drain = LogDrain::new();
            loop {
                drain.poll(&NODE_LOG, timestamp_us());
                FreeRtos::delay_ms(20);
            }
        });
    if let Err(e) = drain {
        warn!("log drain thread not started: {}", e);
    }

    let fatal = |e: NodeError| {
        FAULT.record(&e);
        error!("FATAL: {} (fault {:?}, code {})", e, e.fault_code(), e.driver_code());
    };

    let platform = || -> Result<_, NodeError> {
        let driver = |e: esp_idf_svc::sys::EspError| {
            NodeError::TransportInit(TransportError::Driver(e.code()))
        };
        let peripherals = Peripherals::take().map_err(driver)?;
        let sysloop = EspSystemEventLoop::take().map_err(driver)?;
        let nvs = EspDefaultNvsPartition::take().ok();
        let transport = EspNowTransport::new(peripherals.modem, sysloop, nvs);
        let io = EspHardwareIo::for_board(peripherals.pins, peripherals.adc1)?;
        Ok((transport, io))
    };

    let started = platform().and_then(|(transport, io)| {
        Node::start(
            CONFIG,
            transport,
            io,
            FreeRtos,
            LoggingActionHandler::new(&NODE_LOG),
            &RADIO_EVENTS,
            &NODE_LOG,
        )
    });

    let mut node = match started {
        Ok(node) => Some(node),
        Err(e) => {
            fatal(e);
            None
        }
    };

    if let Some(node) = node.as_mut() {
        match node.run() {
            Ok(NodeExit::OneShotComplete(report)) => {
                info!("cycle complete, {} samples", report.samples.len());
                if let Some(e) = report.send_error {
                    warn!("cycle completed with send error: {}", e);
                }
            }
            Ok(NodeExit::AlreadyComplete) => {}
            Err(e) => fatal(e),
        }
    }

    // Idle: keep reporting late send outcomes
    loop {
        if let Some(node) = node.as_mut() {
            node.session_mut().service(|_, _| {}, |_, _| {});
        }
        FreeRtos::delay_ms(100);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!("This binary requires an ESP-IDF target (target_os = \"espidf\").");
    println!("Use 'cargo test' for host testing.");
}
