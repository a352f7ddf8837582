//! Built-in middleware
//!
//! - [`GrepMiddleware`]: runs only cases whose name matches a [`NamePattern`]
//! - [`ProfileMiddleware`]: captures a [`Profile`] around matching cases
//! - [`ReporterMiddleware`]: forwards start/finish events to a [`Reporter`](crate::Reporter)

mod grep;
mod profile;
mod reporter;

pub use grep::{GrepMiddleware, NamePattern};
pub use profile::{Profile, ProfileMiddleware, ProfileSession, ProfileSink, WallClockSession};
pub use reporter::ReporterMiddleware;
