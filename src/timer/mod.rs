//! Countdown timer module
//!
//! The controller couples a pausable countdown to the lifetime of one
//! supervised application.

pub mod controller;
pub mod notice;
pub mod units;

pub use controller::{CountdownController, NotifyCallback, TickCallback, TimerConfig};
pub use notice::Notice;
pub use units::TimeUnit;

pub(crate) use controller::{call_guarded, Advance, EndReason};
