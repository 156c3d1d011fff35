mod rate;
mod shutdown;

pub mod prelude {
    pub use crate::rate::{Rate, RateParseError};
    pub use crate::shutdown::{DelegatedShutdownListener, ShutdownHandle, ShutdownSignalError};
}
