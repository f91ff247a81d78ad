//! In-memory board.
//!
//! Stands in for real hardware on development machines and in tests. Every
//! driver call is appended to an event log so callers can check what was
//! touched and in which order. Buses can be marked unavailable to exercise
//! initialization failures.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::controller::drivers::{
    AdcDriver, Board, DriverError, GpioBank, Level, Peripheral, PwmDriver, ADC_MAX_VALUE,
    MAX_ADC_CHANNELS, MAX_PWM_CHANNELS, MAX_RELAY_CHANNELS,
};

/// Value returned by ADC channels that were never set.
const DEFAULT_ADC_READING: u16 = 512;

/// A driver call observed by the simulated board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    Opened(Peripheral),
    Closed(Peripheral),
    PinWritten { pin: u8, level: Level },
    DutySet { channel: u8, percent: u8 },
    AdcSampled { channel: u8 },
}

#[derive(Debug, Default)]
struct SimState {
    unavailable: HashSet<Peripheral>,
    failing_close: HashSet<Peripheral>,
    faulty: HashSet<(Peripheral, u8)>,
    open: HashSet<Peripheral>,
    pins: HashMap<u8, Level>,
    duty: HashMap<u8, u8>,
    adc: HashMap<u8, u16>,
    events: Vec<BoardEvent>,
}

/// Simulated board. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBoard {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make opening `peripheral` fail with [`DriverError::BusUnavailable`].
    pub fn with_unavailable(self, peripheral: Peripheral) -> Self {
        self.lock().unavailable.insert(peripheral);
        self
    }

    /// Make closing `peripheral` fail.
    pub fn with_failing_close(self, peripheral: Peripheral) -> Self {
        self.lock().failing_close.insert(peripheral);
        self
    }

    /// Make every later write to `channel` of `peripheral` fail.
    pub fn fail_channel(&self, peripheral: Peripheral, channel: u8) {
        self.lock().faulty.insert((peripheral, channel));
    }

    /// Set the raw value an ADC channel reports.
    pub fn set_adc_value(&self, channel: u8, value: u16) {
        self.lock().adc.insert(channel, value.min(ADC_MAX_VALUE));
    }

    pub fn pin_level(&self, pin: u8) -> Option<Level> {
        self.lock().pins.get(&pin).copied()
    }

    pub fn duty(&self, channel: u8) -> Option<u8> {
        self.lock().duty.get(&channel).copied()
    }

    pub fn is_open(&self, peripheral: Peripheral) -> bool {
        self.lock().open.contains(&peripheral)
    }

    /// Snapshot of every driver call so far.
    pub fn events(&self) -> Vec<BoardEvent> {
        self.lock().events.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self, peripheral: Peripheral, requested: u8, max: u8) -> Result<(), DriverError> {
        let mut state = self.lock();
        if state.unavailable.contains(&peripheral) {
            return Err(DriverError::BusUnavailable(peripheral));
        }
        if requested > max {
            return Err(DriverError::TooManyChannels {
                peripheral,
                requested,
                max,
            });
        }
        state.open.insert(peripheral);
        state.events.push(BoardEvent::Opened(peripheral));
        Ok(())
    }
}

impl Board for SimulatedBoard {
    fn name(&self) -> &str {
        "simulated"
    }

    fn open_gpio(&self, channels: u8) -> Result<Box<dyn GpioBank>, DriverError> {
        self.open(Peripheral::Gpio, channels, MAX_RELAY_CHANNELS)?;
        Ok(Box::new(SimHandle {
            board: self.clone(),
            channels,
        }))
    }

    fn open_pwm(&self, channels: u8) -> Result<Box<dyn PwmDriver>, DriverError> {
        self.open(Peripheral::Pwm, channels, MAX_PWM_CHANNELS)?;
        Ok(Box::new(SimHandle {
            board: self.clone(),
            channels,
        }))
    }

    fn open_adc(&self, channels: u8) -> Result<Box<dyn AdcDriver>, DriverError> {
        self.open(Peripheral::Adc, channels, MAX_ADC_CHANNELS)?;
        Ok(Box::new(SimHandle {
            board: self.clone(),
            channels,
        }))
    }
}

/// Driver handle handed out by [`SimulatedBoard`].
struct SimHandle {
    board: SimulatedBoard,
    channels: u8,
}

impl SimHandle {
    fn check(&self, channel: u8) -> Result<(), DriverError> {
        if channel >= self.channels {
            return Err(DriverError::NoSuchChannel(channel));
        }
        Ok(())
    }

    fn close_as(&self, peripheral: Peripheral) -> Result<(), DriverError> {
        let mut state = self.board.lock();
        state.open.remove(&peripheral);
        state.events.push(BoardEvent::Closed(peripheral));
        if state.failing_close.contains(&peripheral) {
            return Err(DriverError::Io(std::io::Error::other(format!(
                "{peripheral} refused to release"
            ))));
        }
        Ok(())
    }
}

fn write_fault(peripheral: Peripheral, channel: u8) -> DriverError {
    DriverError::Io(std::io::Error::other(format!(
        "{peripheral} channel {channel} write failed"
    )))
}

impl GpioBank for SimHandle {
    fn write(&mut self, pin: u8, level: Level) -> Result<(), DriverError> {
        self.check(pin)?;
        let mut state = self.board.lock();
        if state.faulty.contains(&(Peripheral::Gpio, pin)) {
            return Err(write_fault(Peripheral::Gpio, pin));
        }
        state.pins.insert(pin, level);
        state.events.push(BoardEvent::PinWritten { pin, level });
        Ok(())
    }

    fn read(&self, pin: u8) -> Result<Level, DriverError> {
        self.check(pin)?;
        Ok(self
            .board
            .lock()
            .pins
            .get(&pin)
            .copied()
            .unwrap_or(Level::Low))
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.close_as(Peripheral::Gpio)
    }
}

impl PwmDriver for SimHandle {
    fn set_duty(&mut self, channel: u8, percent: u8) -> Result<(), DriverError> {
        self.check(channel)?;
        let mut state = self.board.lock();
        if state.faulty.contains(&(Peripheral::Pwm, channel)) {
            return Err(write_fault(Peripheral::Pwm, channel));
        }
        state.duty.insert(channel, percent);
        state.events.push(BoardEvent::DutySet { channel, percent });
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.close_as(Peripheral::Pwm)
    }
}

impl AdcDriver for SimHandle {
    fn read(&mut self, channel: u8) -> Result<u16, DriverError> {
        self.check(channel)?;
        let mut state = self.board.lock();
        state.events.push(BoardEvent::AdcSampled { channel });
        Ok(state
            .adc
            .get(&channel)
            .copied()
            .unwrap_or(DEFAULT_ADC_READING))
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.close_as(Peripheral::Adc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_bus_fails_to_open() {
        let board = SimulatedBoard::new().with_unavailable(Peripheral::Pwm);
        assert!(matches!(
            board.open_pwm(16),
            Err(DriverError::BusUnavailable(Peripheral::Pwm))
        ));
        assert!(board.events().is_empty());
    }

    #[test]
    fn too_many_channels_rejected() {
        let board = SimulatedBoard::new();
        assert!(matches!(
            board.open_adc(9),
            Err(DriverError::TooManyChannels { max: 8, .. })
        ));
    }

    #[test]
    fn handles_share_state() {
        let board = SimulatedBoard::new();
        let mut gpio = board.open_gpio(4).unwrap();
        gpio.write(2, Level::High).unwrap();
        assert_eq!(board.pin_level(2), Some(Level::High));
        assert!(matches!(
            gpio.write(4, Level::High),
            Err(DriverError::NoSuchChannel(4))
        ));
        gpio.close().unwrap();
        assert!(!board.is_open(Peripheral::Gpio));
    }

    #[test]
    fn adc_values_clamped_to_ten_bits() {
        let board = SimulatedBoard::new();
        board.set_adc_value(0, 5000);
        let mut adc = board.open_adc(8).unwrap();
        assert_eq!(adc.read(0).unwrap(), ADC_MAX_VALUE);
        assert_eq!(adc.read(1).unwrap(), DEFAULT_ADC_READING);
    }
}
