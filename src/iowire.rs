use embedded_hal::digital::{Error, ErrorType, InputPin, OutputPin};

/// The single data line of the bus, seen as an open-drain pin
pub trait IoWire {
    type Error: Error;

    /// Is the line high?
    fn is_high(&mut self) -> Result<bool, Self::Error>;

    /// Is the line low?
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }

    /// Pulls the line low
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Stops pulling the line, letting the pull-up bring it high
    ///
    /// *NOTE* the actual electrical state of the line may stay low while any device holds it
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Actively drives the line high to feed parasite powered devices
    ///
    /// Open-drain outputs cannot do better than releasing the line, which is the default.
    fn drive_high(&mut self) -> Result<(), Self::Error> {
        self.release()
    }
}

/// Single open-drain line config wrapper
impl<IO> IoWire for (IO,)
where
    IO: ErrorType + OutputPin + InputPin,
{
    type Error = IO::Error;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}

/// Dual line config wrapper: sense on the input, pull down through the output
impl<E, I, O> IoWire for (I, O)
where
    E: Error,
    I: ErrorType<Error = E> + InputPin,
    O: ErrorType<Error = E> + OutputPin,
{
    type Error = E;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.1.set_low()
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.1.set_high()
    }
}

/// Swaps both levels of a pin, for a data line behind an inverting transistor stage
///
/// Use as `(Inverted(pin),)` or `(Inverted(input), Inverted(output))`.
#[derive(Debug, Clone, Copy)]
pub struct Inverted<P>(pub P);

impl<P> Inverted<P> {
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<I: ErrorType> ErrorType for Inverted<I> {
    type Error = I::Error;
}

impl<I: InputPin> InputPin for Inverted<I> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }
}

impl<O: OutputPin> OutputPin for Inverted<O> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }
}
