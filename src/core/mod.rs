pub mod clock;
pub mod ensured;
pub mod error;
pub mod money;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ensured::Ensured;
pub use error::{AppError, Result};
