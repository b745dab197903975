// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Heap backed register block for host tests.
//!
//! Writes are stored as plain memory, so set and clear registers read back
//! the last value written to them. Status bits only change when a test sets
//! them.

use core::mem::size_of;
use core::ptr::NonNull;
use std::boxed::Box;
use std::vec::Vec;

use super::config::PllSelect;
use super::registers::ClockManagerRegisters;
use crate::static_ref::StaticRef;

pub(crate) const CTRL: usize = 0x000;
pub(crate) const INTR: usize = 0x004;
pub(crate) const STAT: usize = 0x01C;
pub(crate) const MAIN_VCO0: usize = 0x040;
pub(crate) const MAIN_VCO1: usize = 0x044;
pub(crate) const MAIN_ENS: usize = 0x04C;
pub(crate) const MAIN_BYPASSS: usize = 0x058;
pub(crate) const MAIN_BYPASSR: usize = 0x05C;
pub(crate) const MPUCLK: usize = 0x060;
pub(crate) const NOCCLK: usize = 0x064;
pub(crate) const MAIN_CNTR2: usize = 0x068;
pub(crate) const MAIN_CNTR15: usize = 0x09C;
pub(crate) const NOCDIV: usize = 0x0A8;
pub(crate) const PERI_VCO0: usize = 0x0C0;
pub(crate) const PERI_VCO1: usize = 0x0C4;
pub(crate) const PERI_ENS: usize = 0x0CC;
pub(crate) const PERI_BYPASSS: usize = 0x0D8;
pub(crate) const PERI_BYPASSR: usize = 0x0DC;
pub(crate) const PERI_CNTR2: usize = 0x0E8;
pub(crate) const EMACCTL: usize = 0x128;
pub(crate) const GPIODIV: usize = 0x12C;
pub(crate) const ALTR_MPUCLK: usize = 0x140;
pub(crate) const ALTR_NOCCLK: usize = 0x144;

const MAIN_LOCKED: u32 = 1 << 8;
const PERI_LOCKED: u32 = 1 << 9;

pub(crate) struct FakeClockManager {
    block: NonNull<ClockManagerRegisters>,
}

impl FakeClockManager {
    /// All registers zero and neither PLL locked.
    pub(crate) fn new() -> FakeClockManager {
        // SAFETY: the register block only contains integers.
        let block = Box::new(unsafe { core::mem::zeroed::<ClockManagerRegisters>() });
        FakeClockManager {
            block: NonNull::from(Box::leak(block)),
        }
    }

    /// Both PLLs report lock as soon as they are polled.
    pub(crate) fn with_locking_plls() -> FakeClockManager {
        let fake = FakeClockManager::new();
        fake.set_locked(PllSelect::Main, true);
        fake.set_locked(PllSelect::Peripheral, true);
        fake
    }

    /// The returned reference must not outlive `self`.
    pub(crate) fn registers(&self) -> StaticRef<ClockManagerRegisters> {
        // SAFETY: the block stays allocated until `self` is dropped.
        unsafe { StaticRef::new(self.block.as_ptr()) }
    }

    pub(crate) fn word(&self, offset: usize) -> u32 {
        assert!(offset < size_of::<ClockManagerRegisters>());
        // SAFETY: in bounds of the live, aligned block.
        unsafe {
            self.block
                .as_ptr()
                .cast::<u32>()
                .add(offset / 4)
                .read_volatile()
        }
    }

    pub(crate) fn set_word(&self, offset: usize, value: u32) {
        assert!(offset < size_of::<ClockManagerRegisters>());
        // SAFETY: in bounds of the live, aligned block.
        unsafe {
            self.block
                .as_ptr()
                .cast::<u32>()
                .add(offset / 4)
                .write_volatile(value);
        }
    }

    pub(crate) fn set_locked(&self, pll: PllSelect, locked: bool) {
        let bit = match pll {
            PllSelect::Main => MAIN_LOCKED,
            PllSelect::Peripheral => PERI_LOCKED,
        };
        let stat = self.word(STAT);
        self.set_word(STAT, if locked { stat | bit } else { stat & !bit });
    }

    pub(crate) fn snapshot(&self) -> Vec<u32> {
        (0..size_of::<ClockManagerRegisters>())
            .step_by(4)
            .map(|offset| self.word(offset))
            .collect()
    }
}

impl Drop for FakeClockManager {
    fn drop(&mut self) {
        // SAFETY: allocated by `Box::leak` in `new` and not freed before.
        drop(unsafe { Box::from_raw(self.block.as_ptr()) });
    }
}
