use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, OutputPin};

/// Level at which the power control line switches the strong pull-up on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    ActiveLow,
    ActiveHigh,
}

/// Placeholder for buses without a power control MOSFET
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPowerPin;

impl ErrorType for NoPowerPin {
    type Error = Infallible;
}

impl OutputPin for NoPowerPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Output line switching an external strong pull-up onto the bus
#[derive(Debug)]
pub struct PowerPin<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: OutputPin> PowerPin<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        PowerPin { pin, polarity }
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn enable(&mut self) -> Result<(), P::Error> {
        match self.polarity {
            Polarity::ActiveHigh => self.pin.set_high(),
            Polarity::ActiveLow => self.pin.set_low(),
        }
    }

    pub fn disable(&mut self) -> Result<(), P::Error> {
        match self.polarity {
            Polarity::ActiveHigh => self.pin.set_low(),
            Polarity::ActiveLow => self.pin.set_high(),
        }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}
