//! Signal source port trait.

use crate::domain::error::SignalPulseError;
use crate::domain::signal::SignalSnapshot;

pub trait SignalPort {
    /// Load the most recent signal set.
    ///
    /// Fails with [`SignalPulseError::NoSignalFiles`] when nothing is
    /// available. Rows with missing fields are already dropped.
    fn load_latest(&self) -> Result<SignalSnapshot, SignalPulseError>;
}
