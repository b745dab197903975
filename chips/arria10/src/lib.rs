// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Peripheral implementations for the Intel Arria 10 SoC FPGA hard
//! processor system.
//!
//! Only the clock manager is implemented. It runs in the first boot stage,
//! before any console exists, and leaves the clock tree locked at the board's
//! requested frequencies for whatever runs next.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod clocks;
pub mod static_ref;

pub use crate::clocks::{ClockError, ClockManager};
