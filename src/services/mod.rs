//! External process management module
//!
//! This module contains the process supervisor that launches and kills the
//! timed application, desktop notification delivery, and host checks.

pub mod notifier;
pub mod supervisor;
pub mod system;

// Re-export main types and functions
pub use notifier::DesktopNotifier;
pub use supervisor::{OsSupervisor, ProcessSupervisor, SupervisedProcess};
pub use system::*;
