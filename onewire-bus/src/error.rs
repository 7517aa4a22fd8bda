use thiserror::Error;

/// One wire communication error type.
#[derive(Debug, Error)]
pub enum OneWireError<E> {
    /// Encapsulates the error type from the underlying hardware.
    #[error("bus master error: {0:?}")]
    Other(E),
    /// No device answered the reset/select sequence.
    ///
    /// Returned both for the initial select of a transaction and for a reselect in the
    /// middle of one. Data read before the failure is discarded.
    #[error("no device present")]
    NoDevicePresent,
    /// Indicates that a short circuit was detected on the bus.
    #[error("short circuit detected on the bus")]
    ShortCircuit,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Other(other)
    }
}

impl<E> OneWireError<E> {
    /// Whether this error means the addressed slave did not respond.
    pub fn is_device_absent(&self) -> bool {
        matches!(self, Self::NoDevicePresent)
    }
}
