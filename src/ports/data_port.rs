//! Bar data access port trait.

use crate::domain::error::SweepError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// Load a chronologically ordered bar sequence.
    ///
    /// Fails with [`SweepError::Data`] when a required price column is absent
    /// or unparseable.
    fn load_bars(&self, source: &str) -> Result<Vec<OhlcvBar>, SweepError>;
}
