//! Board-backed controller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::controller::drivers::{
    AdcDriver, Board, DriverError, GpioBank, Level, Peripheral, PwmDriver,
};
use crate::controller::{
    ChannelLayout, Controller, ControllerError, HardwareCapabilities, LifecycleState,
};

/// Controller driving relays, PWM and ADC through a [`Board`].
pub struct HardwareController {
    capabilities: HardwareCapabilities,
    layout: ChannelLayout,
    board: Arc<dyn Board>,
    inner: Mutex<Inner>,
}

struct Inner {
    state: LifecycleState,
    peripherals: Option<Peripherals>,
}

/// Open driver handles, present only while Running.
struct Peripherals {
    gpio: Box<dyn GpioBank>,
    pwm: Option<Box<dyn PwmDriver>>,
    adc: Option<Box<dyn AdcDriver>>,
}

impl HardwareController {
    pub fn new(
        capabilities: HardwareCapabilities,
        board: Arc<dyn Board>,
        layout: ChannelLayout,
    ) -> Self {
        Self {
            capabilities,
            layout,
            board,
            inner: Mutex::new(Inner {
                state: LifecycleState::Uninitialized,
                peripherals: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn inactive_level(&self) -> Level {
        self.relay_level(false)
    }

    fn relay_level(&self, on: bool) -> Level {
        match (on, self.capabilities.relay_active_high) {
            (true, true) | (false, false) => Level::High,
            (true, false) | (false, true) => Level::Low,
        }
    }

    /// Open and park every enabled peripheral.
    ///
    /// On failure, handles opened so far are dropped through `release`.
    fn open_peripherals(&self) -> Result<Peripherals, ControllerError> {
        let mut gpio = self
            .board
            .open_gpio(self.layout.relays)
            .map_err(init(Peripheral::Gpio))?;
        tracing::debug!(channels = self.layout.relays, "GPIO bank opened");

        let parked = (0..self.layout.relays)
            .try_for_each(|pin| gpio.write(pin, self.inactive_level()));
        if let Err(source) = parked {
            release(Peripherals { gpio, pwm: None, adc: None });
            return Err(init(Peripheral::Gpio)(source));
        }

        let mut peripherals = Peripherals { gpio, pwm: None, adc: None };

        if self.capabilities.pwm_enabled {
            let opened = self.board.open_pwm(self.layout.pwm).and_then(|mut pwm| {
                (0..self.layout.pwm).try_for_each(|channel| pwm.set_duty(channel, 0))?;
                Ok(pwm)
            });
            match opened {
                Ok(pwm) => {
                    tracing::debug!(channels = self.layout.pwm, "PWM driver opened");
                    peripherals.pwm = Some(pwm);
                }
                Err(source) => {
                    release(peripherals);
                    return Err(init(Peripheral::Pwm)(source));
                }
            }
        }

        if self.capabilities.adc_enabled {
            match self.board.open_adc(self.layout.adc) {
                Ok(adc) => {
                    tracing::debug!(channels = self.layout.adc, "ADC driver opened");
                    peripherals.adc = Some(adc);
                }
                Err(source) => {
                    release(peripherals);
                    return Err(init(Peripheral::Adc)(source));
                }
            }
        }

        Ok(peripherals)
    }

    /// Run `f` against the open peripherals, or fail if not Running.
    fn with_peripherals<T>(
        &self,
        f: impl FnOnce(&mut Peripherals) -> Result<T, ControllerError>,
    ) -> Result<T, ControllerError> {
        let mut inner = self.lock();
        match (inner.state, inner.peripherals.as_mut()) {
            (LifecycleState::Running, Some(peripherals)) => f(peripherals),
            _ => Err(ControllerError::NotRunning),
        }
    }

    /// Narrow `channel` to a driver channel below `available`.
    fn check_channel(
        peripheral: Peripheral,
        channel: u32,
        available: u8,
    ) -> Result<u8, ControllerError> {
        u8::try_from(channel)
            .ok()
            .filter(|c| *c < available)
            .ok_or(ControllerError::InvalidChannel {
                peripheral,
                channel,
                available,
            })
    }
}

/// Best-effort close used when start has to roll back.
fn release(peripherals: Peripherals) {
    let Peripherals { gpio, pwm, adc } = peripherals;
    if let Some(adc) = adc {
        if let Err(e) = adc.close() {
            tracing::warn!(error = %e, "Failed to release ADC during rollback");
        }
    }
    if let Some(pwm) = pwm {
        if let Err(e) = pwm.close() {
            tracing::warn!(error = %e, "Failed to release PWM during rollback");
        }
    }
    if let Err(e) = gpio.close() {
        tracing::warn!(error = %e, "Failed to release GPIO during rollback");
    }
}

fn init(peripheral: Peripheral) -> impl FnOnce(DriverError) -> ControllerError {
    move |source| ControllerError::Init { peripheral, source }
}

fn driver(peripheral: Peripheral) -> impl FnOnce(DriverError) -> ControllerError {
    move |source| ControllerError::Driver { peripheral, source }
}

impl Controller for HardwareController {
    fn start(&self) -> Result<(), ControllerError> {
        let mut inner = self.lock();
        if inner.state != LifecycleState::Uninitialized {
            return Err(ControllerError::InvalidTransition {
                operation: "start",
                state: inner.state,
            });
        }

        tracing::info!(
            board = self.board.name(),
            pwm = self.capabilities.pwm_enabled,
            adc = self.capabilities.adc_enabled,
            relay_active_high = self.capabilities.relay_active_high,
            "Starting controller"
        );

        let peripherals = self.open_peripherals()?;
        inner.peripherals = Some(peripherals);
        inner.state = LifecycleState::Running;

        tracing::info!("Controller running");
        Ok(())
    }

    fn stop(&self) -> Result<(), ControllerError> {
        let mut inner = self.lock();
        if inner.state != LifecycleState::Running {
            return Err(ControllerError::InvalidTransition {
                operation: "stop",
                state: inner.state,
            });
        }
        inner.state = LifecycleState::Stopped;

        let Some(Peripherals { mut gpio, pwm, adc }) = inner.peripherals.take() else {
            return Ok(());
        };
        let mut failures = Vec::new();

        if let Some(mut pwm) = pwm {
            for channel in 0..self.layout.pwm {
                if let Err(e) = pwm.set_duty(channel, 0) {
                    failures.push((Peripheral::Pwm, e));
                }
            }
            if let Err(e) = pwm.close() {
                failures.push((Peripheral::Pwm, e));
            }
        }

        if let Some(adc) = adc {
            if let Err(e) = adc.close() {
                failures.push((Peripheral::Adc, e));
            }
        }

        let level = self.inactive_level();
        for pin in 0..self.layout.relays {
            if let Err(e) = gpio.write(pin, level) {
                failures.push((Peripheral::Gpio, e));
            }
        }
        if let Err(e) = gpio.close() {
            failures.push((Peripheral::Gpio, e));
        }

        if failures.is_empty() {
            tracing::info!("Controller stopped");
            Ok(())
        } else {
            Err(ControllerError::Shutdown(failures))
        }
    }

    fn state(&self) -> LifecycleState {
        self.lock().state
    }

    fn capabilities(&self) -> HardwareCapabilities {
        self.capabilities
    }

    fn layout(&self) -> ChannelLayout {
        self.layout
    }

    fn relay(&self, channel: u32) -> Result<bool, ControllerError> {
        let active = self.relay_level(true);
        self.with_peripherals(|p| {
            let pin = Self::check_channel(Peripheral::Gpio, channel, self.layout.relays)?;
            let level = p.gpio.read(pin).map_err(driver(Peripheral::Gpio))?;
            Ok(level == active)
        })
    }

    fn set_relay(&self, channel: u32, on: bool) -> Result<(), ControllerError> {
        let level = self.relay_level(on);
        self.with_peripherals(|p| {
            let pin = Self::check_channel(Peripheral::Gpio, channel, self.layout.relays)?;
            p.gpio.write(pin, level).map_err(driver(Peripheral::Gpio))?;
            tracing::debug!(channel = pin, on, ?level, "Relay switched");
            Ok(())
        })
    }

    fn set_pwm(&self, channel: u32, percent: u32) -> Result<(), ControllerError> {
        self.with_peripherals(|p| {
            let pwm = p
                .pwm
                .as_mut()
                .ok_or(ControllerError::Disabled(Peripheral::Pwm))?;
            let channel = Self::check_channel(Peripheral::Pwm, channel, self.layout.pwm)?;
            let duty = u8::try_from(percent)
                .ok()
                .filter(|d| *d <= 100)
                .ok_or(ControllerError::InvalidDuty(percent))?;
            pwm.set_duty(channel, duty).map_err(driver(Peripheral::Pwm))?;
            tracing::debug!(channel, percent = duty, "PWM duty set");
            Ok(())
        })
    }

    fn read_adc(&self, channel: u32) -> Result<u16, ControllerError> {
        self.with_peripherals(|p| {
            let adc = p
                .adc
                .as_mut()
                .ok_or(ControllerError::Disabled(Peripheral::Adc))?;
            let channel = Self::check_channel(Peripheral::Adc, channel, self.layout.adc)?;
            adc.read(channel).map_err(driver(Peripheral::Adc))
        })
    }
}
