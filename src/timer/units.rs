//! Duration units accepted from the front-end

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimerError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    pub fn multiplier(self) -> u64 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => 60,
            TimeUnit::Hours => 3600,
        }
    }

    /// Convert `amount` of this unit to a positive number of seconds
    pub fn to_seconds(self, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Err(TimerError::invalid_input("duration must be greater than zero"));
        }
        amount
            .checked_mul(self.multiplier())
            .ok_or_else(|| TimerError::invalid_input(format!("duration of {} {:?} is too large", amount, self)))
    }
}
