//! Generate systemd hwdb entries which remap keyboard scancodes for a single
//! input device.

mod error;
pub mod hwdb;
pub mod inputdev;
pub mod scancodes;

pub use error::Error;
