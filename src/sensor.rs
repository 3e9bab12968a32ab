use crate::{Driver, Error, IoWire};
use embedded_hal::{delay::DelayNs, digital::OutputPin};

/// Device that measures on request and is read back once the measurement is done
pub trait Sensor {
    /// Starts a measurement and returns the milliseconds until its result can be read
    ///
    /// Returns `0` when the driver already waited, e.g. while feeding a parasite
    /// powered bus.
    fn start_measurement<W: IoWire, P: OutputPin, const N: usize>(
        &self,
        driver: &mut Driver<W, P, N>,
        delay: &mut impl DelayNs,
    ) -> Result<u16, Error<W::Error>>;

    /// Reads the finished measurement, scaled to its unit
    fn read_measurement<W: IoWire, P: OutputPin, const N: usize>(
        &self,
        driver: &mut Driver<W, P, N>,
        delay: &mut impl DelayNs,
    ) -> Result<f32, Error<W::Error>>;

    /// Reads the finished measurement as the device reports it
    fn read_measurement_raw<W: IoWire, P: OutputPin, const N: usize>(
        &self,
        driver: &mut Driver<W, P, N>,
        delay: &mut impl DelayNs,
    ) -> Result<i16, Error<W::Error>>;
}
