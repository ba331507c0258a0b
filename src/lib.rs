//! Decaying windowed average: a fixed-capacity moving average whose oldest
//! samples are zeroed, one per elapsed decay period, when nothing new is
//! recorded.

pub mod clock;
pub mod error;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ConfigError;
pub use window::{DecayingWindowAverage, Snapshot};
