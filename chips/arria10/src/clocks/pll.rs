// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! PLL bring-up sequencer.
//!
//! Both PLLs of the clock manager are brought up the same way:
//!
//! 1. bypass the outputs and power the VCO down
//! 2. program the feedback ratio and the reference clock
//! 3. power the VCO up with every output counter held in reset
//! 4. wait for a stable lock
//! 5. release the output counters and the bypass
//!
//! Outputs never see the VCO while it is slewing: they are bypassed to the
//! boot clock until lock, and they are released from reset before the bypass
//! goes away.
//!
//! A PLL referenced from the FPGA has no reference until the FPGA is
//! configured. It behaves exactly like a PLL that does not lock and the
//! sequence ends with [ClockError::LockTimeout].
//!
//! Once locked, a PLL can be moved to another numerator with
//! [PllSequencer::retune], which the ramp controller uses to change the VCO
//! frequency in steps.

use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use super::config::{vco_hz, PllConfig, PllSelect, PllSource};
use super::registers::{ClockManagerRegisters, STAT, VCO0, VCO1, VCO_NUMERATOR_MAX};
use super::ClockError;

/// Status reads before a PLL that never reports lock is given up on.
pub const LOCK_POLL_LIMIT: usize = 1_000_000;
/// Consecutive locked reads needed before the lock is trusted.
pub const LOCK_STABLE_READS: usize = 10;
/// Status reads before a busy clock manager state machine is given up on.
pub const FSM_POLL_LIMIT: usize = 1_000_000;

/// Progress of one PLL through a bring-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllState {
    Reset,
    Configuring,
    AwaitingLock,
    BypassReleased,
    Locked,
    Failed,
}

impl PllState {
    /// Transitions only go forward one step at a time. Any state that has
    /// not finished may fail.
    pub fn can_advance_to(self, next: PllState) -> bool {
        match (self, next) {
            (PllState::Locked, _) | (PllState::Failed, _) => false,
            (_, PllState::Failed) => true,
            (PllState::Reset, PllState::Configuring)
            | (PllState::Configuring, PllState::AwaitingLock)
            | (PllState::AwaitingLock, PllState::BypassReleased)
            | (PllState::BypassReleased, PllState::Locked) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PllState::Locked | PllState::Failed)
    }
}

/// Result of a successful bring-up or retune.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockedFrequency {
    pub pll: PllSelect,
    pub reference_hz: u32,
    pub numerator: u16,
    pub denominator: u8,
    pub vco_hz: u32,
}

impl LockedFrequency {
    /// Where `pll` locks when brought up at `config` from `reference_hz`.
    pub fn expected(
        pll: PllSelect,
        config: &PllConfig,
        reference_hz: u32,
    ) -> Result<LockedFrequency, ClockError> {
        config.validate(pll)?;
        if reference_hz == 0 {
            return Err(ClockError::InvalidConfiguration {
                reason: "PLL reference frequency is zero",
            });
        }
        let vco_hz = config
            .vco_hz(reference_hz)
            .ok_or(ClockError::InvalidConfiguration {
                reason: "PLL VCO frequency overflows",
            })?;
        Ok(LockedFrequency {
            pll,
            reference_hz,
            numerator: config.numerator,
            denominator: config.denominator,
            vco_hz,
        })
    }

    /// Largest numerator that keeps the VCO at or below `target_vco_hz`,
    /// never above this lock's own numerator and never below one.
    pub fn numerator_below(&self, target_vco_hz: u64) -> u16 {
        let reference = u64::from(self.reference_hz).max(1);
        let below = target_vco_hz * u64::from(self.denominator) / reference;
        below.clamp(1, u64::from(self.numerator)) as u16
    }

    /// Same PLL, same reference, other numerator.
    fn with_numerator(&self, numerator: u16) -> Option<LockedFrequency> {
        Some(LockedFrequency {
            numerator,
            vco_hz: vco_hz(self.reference_hz, numerator, self.denominator)?,
            ..*self
        })
    }
}

pub struct PllSequencer<'a> {
    registers: &'a ClockManagerRegisters,
}

impl<'a> PllSequencer<'a> {
    pub fn new(registers: &'a ClockManagerRegisters) -> Self {
        Self { registers }
    }

    /// Bring `pll` from any state to locked at `config`.
    ///
    /// # Errors
    ///
    /// + [Err]\([ClockError::InvalidConfiguration]\): `config` does not fit
    ///   the hardware fields or `reference_hz` is zero. Nothing is written.
    /// + [Err]\([ClockError::LockTimeout]\): the PLL did not lock. It is left
    ///   powered with its outputs bypassed to the boot clock.
    /// + [Err]\([ClockError::StateMachineTimeout]\): a bypass change was never
    ///   applied.
    pub fn bring_up(
        &self,
        pll: PllSelect,
        config: &PllConfig,
        reference_hz: u32,
    ) -> Result<LockedFrequency, ClockError> {
        let locked = LockedFrequency::expected(pll, config, reference_hz)?;

        let mut state = PllState::Reset;
        match self.sequence(pll, config, &mut state) {
            Ok(()) => {
                advance(pll, &mut state, PllState::Locked);
                log::info!("{:?} PLL locked at {} Hz", pll, locked.vco_hz);
                Ok(locked)
            }
            Err(error) => {
                advance(pll, &mut state, PllState::Failed);
                Err(error)
            }
        }
    }

    fn sequence(
        &self,
        pll: PllSelect,
        config: &PllConfig,
        state: &mut PllState,
    ) -> Result<(), ClockError> {
        let group = self.registers.group(pll);

        advance(pll, state, PllState::Configuring);
        self.bypass(pll)?;
        group.vco0.write(VCO0::BGPWRDN::SET + VCO0::PWRDN::SET);

        group.vco1.write(
            VCO1::NUMER.val(u32::from(config.numerator) - 1)
                + VCO1::DENOM.val(u32::from(config.denominator) - 1),
        );
        group
            .vco0
            .modify(VCO0::PSRC.val(psrc_field(config.source)));

        group
            .vco0
            .modify(VCO0::BGPWRDN::CLEAR + VCO0::PWRDN::CLEAR);
        group.vco0.modify(VCO0::EN::SET + VCO0::OUTRSTALL::SET);

        advance(pll, state, PllState::AwaitingLock);
        self.wait_for_lock(pll)?;

        group.vco0.modify(VCO0::OUTRSTALL::CLEAR);
        group.bypassr.set(pll.bypass_mask());
        self.wait_for_idle()?;
        advance(pll, state, PllState::BypassReleased);
        Ok(())
    }

    /// Switch every output of `pll` to the boot clock.
    pub fn bypass(&self, pll: PllSelect) -> Result<(), ClockError> {
        self.registers.group(pll).bypasss.set(pll.bypass_mask());
        self.wait_for_idle()
    }

    /// Move a locked PLL to `numerator` and wait for it to lock again.
    ///
    /// Only the feedback divider changes. The outputs stay connected, so the
    /// caller is responsible for the downstream clocks staying in range.
    pub fn retune(
        &self,
        locked: &LockedFrequency,
        numerator: u16,
    ) -> Result<LockedFrequency, ClockError> {
        if numerator == 0 || numerator > VCO_NUMERATOR_MAX {
            return Err(ClockError::InvalidConfiguration {
                reason: "PLL numerator out of range",
            });
        }
        let relocked = locked
            .with_numerator(numerator)
            .ok_or(ClockError::InvalidConfiguration {
                reason: "PLL VCO frequency overflows",
            })?;

        self.registers
            .group(locked.pll)
            .vco1
            .modify(VCO1::NUMER.val(u32::from(numerator) - 1));
        self.wait_for_lock(locked.pll)?;
        log::trace!("{:?} PLL retuned to {} Hz", locked.pll, relocked.vco_hz);
        Ok(relocked)
    }

    /// Lock described by the VCO registers as they are now.
    pub fn read_lock(&self, pll: PllSelect, reference_hz: u32) -> Option<LockedFrequency> {
        let vco1 = &self.registers.group(pll).vco1;
        let numerator = vco1.read(VCO1::NUMER) as u16 + 1;
        let denominator = vco1.read(VCO1::DENOM) as u8 + 1;
        Some(LockedFrequency {
            pll,
            reference_hz,
            numerator,
            denominator,
            vco_hz: vco_hz(reference_hz, numerator, denominator)?,
        })
    }

    /// Poll until `pll` reports lock on [LOCK_STABLE_READS] consecutive
    /// reads.
    pub fn wait_for_lock(&self, pll: PllSelect) -> Result<(), ClockError> {
        let lock = pll.lock_field();
        let mut stable = 0;
        for _ in 0..LOCK_POLL_LIMIT {
            if self.registers.stat.is_set(lock) {
                stable += 1;
                if stable >= LOCK_STABLE_READS {
                    return Ok(());
                }
            } else {
                stable = 0;
            }
        }
        log::error!("{:?} PLL did not lock", pll);
        Err(ClockError::LockTimeout { pll })
    }

    pub(crate) fn wait_for_idle(&self) -> Result<(), ClockError> {
        for _ in 0..FSM_POLL_LIMIT {
            if !self.registers.stat.is_set(STAT::BUSY) {
                return Ok(());
            }
        }
        Err(ClockError::StateMachineTimeout)
    }
}

fn psrc_field(source: PllSource) -> u32 {
    source as u32
}

fn advance(pll: PllSelect, state: &mut PllState, next: PllState) {
    debug_assert!(state.can_advance_to(next));
    log::trace!("{:?} PLL: {:?} -> {:?}", pll, *state, next);
    *state = next;
}
