//! State management module
//!
//! This module contains the timer status types and the server-wide state.

pub mod app_state;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, NoticeRecord};
pub use timer_state::{TimerState, TimerStatus};
