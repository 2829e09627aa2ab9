//! App Timer - launch an application and close it when its time runs out
//!
//! The core is a countdown controller coupled to a process supervisor: a run
//! launches one application, ticks down once per second, and terminates the
//! application on expiry or when stopped. Pause and resume freeze and continue
//! the countdown without touching the application. An HTTP control API drives
//! the controller from outside.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod services;
mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::TimerError;
pub use state::{AppState, TimerState, TimerStatus};
pub use services::{OsSupervisor, ProcessSupervisor, SupervisedProcess};
pub use timer::{CountdownController, Notice, TimeUnit, TimerConfig};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
