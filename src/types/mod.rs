pub mod constants;
pub mod envelope;
pub mod error;

pub use constants::*;
pub use envelope::Envelope;
pub use error::{ConnectionError, ErrorInfo, RealtimeError, Result};
