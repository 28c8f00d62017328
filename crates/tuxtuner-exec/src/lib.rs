pub mod contracts;
pub mod dispatcher;
pub mod error;
pub mod probe;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use contracts::*;
pub use dispatcher::*;
pub use error::*;
pub use probe::*;
