// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Arria 10 clock manager.
//!
//! The clock manager generates every clock of the hard processor system from
//! two PLLs. After a cold reset both PLLs are in bypass and the whole system
//! runs from the boot clock. [ClockManager::basic_init] brings the tree to
//! the frequencies a [BoardConfig] asks for:
//!
//! + [pll] locks the main and the peripheral PLL
//! + [divider] derives the MPU, NOC and peripheral clocks from them
//! + [ramp] walks the MPU and NOC clocks up in steps when their targets are
//!   above the frequency they may be switched to directly
//! + [manager] runs the whole sequence once and keeps the result
//!
//! # Usage
//!
//! ```rust,ignore
//! let clocks = ClockManager::new(registers::CLKMGR_BASE);
//!
//! clocks.basic_init(&config::SOCDK_BOARD)?;
//! let uart_clock_hz = clocks.l4_peripheral_clock_hz()?;
//! ```

use core::fmt;

pub mod config;
pub mod divider;
pub mod manager;
pub mod pll;
pub mod ramp;
pub mod registers;

#[cfg(test)]
pub(crate) mod fake;

pub use self::config::{BoardConfig, ClockSource, PeripheralClock, PllConfig, PllSelect};
pub use self::divider::DerivedClock;
pub use self::manager::{ClockFrequencies, ClockManager};

/// Failures of the clock bring-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockError {
    /// A PLL did not report a stable lock within the polling window.
    LockTimeout { pll: PllSelect },
    /// No divider brings `clock` within tolerance of `target_hz`.
    /// `achieved_hz` is the closest frequency available.
    UnreachableFrequency {
        clock: DerivedClock,
        target_hz: u32,
        achieved_hz: u32,
    },
    /// The board configuration can not be applied. Reported before any
    /// register is written.
    InvalidConfiguration { reason: &'static str },
    /// The clock manager state machine stayed busy.
    StateMachineTimeout,
    /// `basic_init` was already called.
    AlreadyConfigured,
    /// The clock tree has not been brought up yet.
    NotConfigured,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClockError::LockTimeout { pll } => write!(f, "{:?} PLL failed to lock", pll),
            ClockError::UnreachableFrequency {
                clock,
                target_hz,
                achieved_hz,
            } => write!(
                f,
                "{:?} clock cannot reach {} Hz (closest {} Hz)",
                clock, target_hz, achieved_hz
            ),
            ClockError::InvalidConfiguration { reason } => {
                write!(f, "invalid clock configuration: {}", reason)
            }
            ClockError::StateMachineTimeout => f.write_str("clock manager stayed busy"),
            ClockError::AlreadyConfigured => f.write_str("clocks already configured"),
            ClockError::NotConfigured => f.write_str("clocks not configured"),
        }
    }
}
