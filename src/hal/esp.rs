//! ESP-IDF implementations of the capability traits.
//!
//! - [`EspNowTransport`]: Wi-Fi station bring-up + ESP-NOW
//! - [`EspHardwareIo`]: `PinDriver` GPIO + ADC1 oneshot channel drivers
//!
//! Only built for `target_os = "espidf"`.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::borrow::Borrow;

use esp_idf_svc::espnow::{EspNow, PeerInfo, ReceiveInfo, SendStatus};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::adc::attenuation::DB_12;
use esp_idf_svc::hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_svc::hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_svc::hal::adc::ADC1;
use esp_idf_svc::hal::gpio::{self, ADCPin, AnyIOPin, IOPin, Input, Output, PinDriver, Pins};
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{self, esp, EspError};
use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};
use heapless::Vec;

use super::io::{AdcChannel, HardwareIo, IoError, Level, PinDirection, PinId, Pull};
use super::radio::{Interface, RadioTransport, SendOutcome, TransportError};
use crate::config::board;
use crate::peer::{Channel, PeerAddress};
use crate::sequencer::MAX_SAMPLE_CHANNELS;

fn transport_error(e: EspError) -> TransportError {
    let code = e.code();
    match code {
        c if c == sys::ESP_ERR_ESPNOW_NOT_INIT as i32 => TransportError::NotInitialized,
        c if c == sys::ESP_ERR_ESPNOW_FULL as i32 => TransportError::PeerTableFull,
        c if c == sys::ESP_ERR_ESPNOW_EXIST as i32 => TransportError::PeerExists,
        c if c == sys::ESP_ERR_ESPNOW_NOT_FOUND as i32 => TransportError::PeerNotFound,
        c if c == sys::ESP_ERR_ESPNOW_NO_MEM as i32 => TransportError::OutOfMemory,
        c if c == sys::ESP_ERR_ESPNOW_ARG as i32 => TransportError::InvalidPeer,
        c if c == sys::ESP_ERR_ESPNOW_IF as i32 => TransportError::InvalidPeer,
        c => TransportError::Driver(c),
    }
}

fn io_error(e: EspError, pin: PinId) -> IoError {
    if e.code() == sys::ESP_ERR_INVALID_ARG as i32 {
        IoError::InvalidPin(pin)
    } else {
        IoError::Driver(e.code())
    }
}

/// ESP-NOW over the Wi-Fi station interface.
pub struct EspNowTransport {
    modem: Option<Modem>,
    sysloop: EspSystemEventLoop,
    nvs: Option<EspDefaultNvsPartition>,
    wifi: Option<EspWifi<'static>>,
    espnow: Option<EspNow<'static>>,
}

impl EspNowTransport {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Self {
        Self {
            modem: Some(modem),
            sysloop,
            nvs,
            wifi: None,
            espnow: None,
        }
    }

    fn espnow(&self) -> Result<&EspNow<'static>, TransportError> {
        self.espnow.as_ref().ok_or(TransportError::NotInitialized)
    }
}

impl RadioTransport for EspNowTransport {
    fn init(
        &mut self,
        channel: Channel,
        station_address: Option<PeerAddress>,
    ) -> Result<(), TransportError> {
        let modem = self.modem.take().ok_or(TransportError::AlreadyInitialized)?;

        let mut wifi = EspWifi::new(modem, self.sysloop.clone(), self.nvs.take())
            .map_err(transport_error)?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(transport_error)?;

        if let Some(mac) = station_address {
            let octets = mac.octets();
            // SAFETY: station mode is set and the interface is not started yet
            esp!(unsafe { sys::esp_wifi_set_mac(sys::wifi_interface_t_WIFI_IF_STA, octets.as_ptr()) })
                .map_err(transport_error)?;
        }

        wifi.start().map_err(transport_error)?;

        // SAFETY: Wi-Fi driver is started
        esp!(unsafe {
            sys::esp_wifi_set_channel(channel.get(), sys::wifi_second_chan_t_WIFI_SECOND_CHAN_NONE)
        })
        .map_err(transport_error)?;

        let espnow = EspNow::take().map_err(transport_error)?;

        self.wifi = Some(wifi);
        self.espnow = Some(espnow);
        Ok(())
    }

    fn register_send_callback<F>(&mut self, mut callback: F) -> Result<(), TransportError>
    where
        F: FnMut(PeerAddress, SendOutcome) + Send + 'static,
    {
        self.espnow()?
            .register_send_cb(move |mac: &[u8], status: SendStatus| {
                let Some(peer) = PeerAddress::from_slice(mac) else {
                    return;
                };
                let outcome = match status {
                    SendStatus::SUCCESS => SendOutcome::Success,
                    SendStatus::FAIL => SendOutcome::Failure,
                };
                callback(peer, outcome);
            })
            .map_err(transport_error)
    }

    fn register_receive_callback<F>(&mut self, mut callback: F) -> Result<(), TransportError>
    where
        F: FnMut(PeerAddress, &[u8]) + Send + 'static,
    {
        self.espnow()?
            .register_recv_cb(move |info: &ReceiveInfo, data: &[u8]| {
                if let Some(source) = PeerAddress::from_slice(info.src_addr) {
                    callback(source, data);
                }
            })
            .map_err(transport_error)
    }

    fn add_peer(
        &mut self,
        address: PeerAddress,
        channel: Channel,
        interface: Interface,
    ) -> Result<(), TransportError> {
        let ifidx = match interface {
            Interface::Station => sys::wifi_interface_t_WIFI_IF_STA,
            Interface::AccessPoint => sys::wifi_interface_t_WIFI_IF_AP,
        };

        self.espnow()?
            .add_peer(PeerInfo {
                peer_addr: address.octets(),
                channel: channel.get(),
                ifidx,
                encrypt: false,
                ..Default::default()
            })
            .map_err(transport_error)
    }

    fn send(&mut self, address: PeerAddress, payload: &[u8]) -> Result<(), TransportError> {
        self.espnow()?
            .send(address.octets(), payload)
            .map_err(transport_error)
    }
}

/// Pin ownership inside [`EspHardwareIo`].
enum PinSlot {
    Free(AnyIOPin),
    Input(PinDriver<'static, AnyIOPin, Input>),
    Output(PinDriver<'static, AnyIOPin, Output>),
    /// A mode switch failed and the driver was lost.
    Broken,
}

/// One configured ADC1 channel, erased over its GPIO type.
trait AnalogInput {
    fn sample(&mut self) -> Result<u16, EspError>;
}

impl<T, M> AnalogInput for AdcChannelDriver<'static, T, M>
where
    T: ADCPin,
    M: Borrow<AdcDriver<'static, T::Adc>>,
{
    fn sample(&mut self) -> Result<u16, EspError> {
        self.read_raw()
    }
}

/// Pins the node drives or reads.
pub const MAX_PINS: usize = 4;

/// GPIO through `PinDriver`, ADC1 through the oneshot channel drivers.
///
/// Pins and channels are handed over once with [`EspHardwareIo::with_pin`]
/// and [`EspHardwareIo::with_adc_channel`]; any other number is rejected.
pub struct EspHardwareIo {
    pins: Vec<(PinId, PinSlot), MAX_PINS>,
    channels: Vec<(AdcChannel, Box<dyn AnalogInput>), MAX_SAMPLE_CHANNELS>,
}

impl EspHardwareIo {
    pub fn new() -> Self {
        Self {
            pins: Vec::new(),
            channels: Vec::new(),
        }
    }

    /// Wire the board pins and ADC1 channels 0-3 (GPIO0-3, ESP32-C3).
    pub fn for_board(pins: Pins, adc1: ADC1) -> Result<Self, IoError> {
        let adc = Arc::new(AdcDriver::new(adc1).map_err(|e| IoError::Driver(e.code()))?);

        Self::new()
            .with_pin(board::POWER_PIN, pins.gpio5.downgrade())?
            .with_pin(board::SHUTDOWN_PIN, pins.gpio18.downgrade())?
            .with_pin(board::TRIGGER_PIN, pins.gpio14.downgrade())?
            .with_adc_channel(&adc, board::ADC_CHANNELS[0], pins.gpio0)?
            .with_adc_channel(&adc, board::ADC_CHANNELS[1], pins.gpio1)?
            .with_adc_channel(&adc, board::ADC_CHANNELS[2], pins.gpio2)?
            .with_adc_channel(&adc, board::ADC_CHANNELS[3], pins.gpio3)
    }

    /// Hand a GPIO over under its board number.
    pub fn with_pin(mut self, id: PinId, pin: AnyIOPin) -> Result<Self, IoError> {
        if self.slot(id).is_ok() {
            return Err(IoError::InvalidPin(id));
        }
        self.pins
            .push((id, PinSlot::Free(pin)))
            .map_err(|_| IoError::InvalidPin(id))?;
        Ok(self)
    }

    /// Attach an ADC pin as `channel`, 12 bit at 12 dB.
    pub fn with_adc_channel<T>(
        mut self,
        adc: &Arc<AdcDriver<'static, T::Adc>>,
        channel: AdcChannel,
        pin: T,
    ) -> Result<Self, IoError>
    where
        T: ADCPin + 'static,
    {
        let config = AdcChannelConfig {
            attenuation: DB_12,
            ..Default::default()
        };
        let driver = AdcChannelDriver::new(adc.clone(), pin, &config)
            .map_err(|_| IoError::InvalidChannel(channel))?;

        self.channels
            .push((channel, Box::new(driver)))
            .map_err(|_| IoError::InvalidChannel(channel))?;
        Ok(self)
    }

    fn slot(&mut self, id: PinId) -> Result<&mut PinSlot, IoError> {
        self.pins
            .iter_mut()
            .find(|(pin, _)| *pin == id)
            .map(|(_, slot)| slot)
            .ok_or(IoError::InvalidPin(id))
    }
}

impl Default for EspHardwareIo {
    fn default() -> Self {
        Self::new()
    }
}

fn gpio_pull(pull: Pull) -> gpio::Pull {
    match pull {
        Pull::None => gpio::Pull::Floating,
        Pull::Up => gpio::Pull::Up,
        Pull::Down => gpio::Pull::Down,
    }
}

impl HardwareIo for EspHardwareIo {
    fn configure_pin(
        &mut self,
        pin: PinId,
        direction: PinDirection,
        pull: Pull,
    ) -> Result<(), IoError> {
        let slot = self.slot(pin)?;

        let next = match (core::mem::replace(slot, PinSlot::Broken), direction) {
            (PinSlot::Free(p), PinDirection::Input) => PinDriver::input(p).map(PinSlot::Input),
            (PinSlot::Free(p), PinDirection::Output) => PinDriver::output(p).map(PinSlot::Output),
            (PinSlot::Input(d), PinDirection::Input) => Ok(PinSlot::Input(d)),
            (PinSlot::Input(d), PinDirection::Output) => d.into_output().map(PinSlot::Output),
            (PinSlot::Output(d), PinDirection::Output) => Ok(PinSlot::Output(d)),
            (PinSlot::Output(d), PinDirection::Input) => d.into_input().map(PinSlot::Input),
            (PinSlot::Broken, _) => return Err(IoError::InvalidPin(pin)),
        };
        *slot = next.map_err(|e| io_error(e, pin))?;

        // Pulls only apply to inputs
        if let PinSlot::Input(driver) = slot {
            driver.set_pull(gpio_pull(pull)).map_err(|e| io_error(e, pin))?;
        }
        Ok(())
    }

    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), IoError> {
        let PinSlot::Output(driver) = self.slot(pin)? else {
            return Err(IoError::InvalidPin(pin));
        };
        let level = match level {
            Level::Low => gpio::Level::Low,
            Level::High => gpio::Level::High,
        };
        driver.set_level(level).map_err(|e| io_error(e, pin))
    }

    fn read_level(&mut self, pin: PinId) -> Result<Level, IoError> {
        let PinSlot::Input(driver) = self.slot(pin)? else {
            return Err(IoError::InvalidPin(pin));
        };
        Ok(match driver.get_level() {
            gpio::Level::Low => Level::Low,
            gpio::Level::High => Level::High,
        })
    }

    fn sample_analog(&mut self, channel: AdcChannel) -> Result<u16, IoError> {
        let (_, input) = self
            .channels
            .iter_mut()
            .find(|(ch, _)| *ch == channel)
            .ok_or(IoError::InvalidChannel(channel))?;

        input.sample().map_err(|e| IoError::Driver(e.code()))
    }
}

// Board numbers must match the GPIOs `for_board` hands over
const _: () = assert!(board::POWER_PIN == 5);
const _: () = assert!(board::SHUTDOWN_PIN == 18);
const _: () = assert!(board::TRIGGER_PIN == 14);
