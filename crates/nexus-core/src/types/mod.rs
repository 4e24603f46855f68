//! Core types for nexus.

mod candidate;
mod cycle;
mod message;
mod period;
mod record;
mod remote;

pub use candidate::*;
pub use cycle::*;
pub use message::*;
pub use period::*;
pub use record::*;
pub use remote::*;
