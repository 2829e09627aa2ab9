//! Background tasks module
//!
//! This module contains the countdown loop that runs alongside the controller.

pub mod countdown;

pub(crate) use countdown::countdown_task;
