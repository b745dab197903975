// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Frequency ramp controller.
//!
//! The MPU and the NOC may not be switched straight to a frequency above a
//! safe threshold: the supply can not follow the load step. Above the
//! threshold the clock is brought up in fixed increments, each step letting
//! the PLL lock before the next one starts.
//!
//! A ramped clock gets its final divider while its PLL is still bypassed,
//! and the PLL is locked at an entry numerator that keeps the clock at or
//! below its threshold. The ramp then only ever raises the PLL numerator: each
//! step puts the VCO at the largest value not above `step * divider`, and the
//! last step restores the configured numerator, so the ramp ends exactly where
//! a direct bring-up would have.
//!
//! Intermediate steps are bounded by the plan, not by the board tolerance.
//! Only the final frequency has to be within tolerance of the target.

use super::config::ClockSource;
use super::divider::{DerivedClock, DividerProgrammer, SourceFrequencies};
use super::pll::{LockedFrequency, PllSequencer};
use super::ClockError;

/// Where a clock starts ramping and by how much each step goes up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RampPolicy {
    pub threshold_hz: u32,
    pub increment_hz: u32,
}

pub const MPU_RAMP: RampPolicy = RampPolicy {
    threshold_hz: 900_000_000,
    increment_hz: 100_000_000,
};

pub const NOC_RAMP: RampPolicy = RampPolicy {
    threshold_hz: 300_000_000,
    increment_hz: 33_000_000,
};

/// Intermediate targets `start, start + step, ...` ending exactly at
/// `target`.
///
/// Strictly increasing and never above `target`. A plan starting at or above
/// its target only contains the target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RampPlan {
    next: Option<u32>,
    target_hz: u32,
    step_hz: u32,
}

impl RampPlan {
    pub fn new(start_hz: u32, target_hz: u32, step_hz: u32) -> Result<RampPlan, ClockError> {
        if step_hz == 0 {
            return Err(ClockError::InvalidConfiguration {
                reason: "ramp increment is zero",
            });
        }
        Ok(RampPlan {
            next: Some(start_hz.min(target_hz)),
            target_hz,
            step_hz,
        })
    }
}

impl Iterator for RampPlan {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let current = self.next?;
        self.next = if current < self.target_hz {
            Some(current.saturating_add(self.step_hz).min(self.target_hz))
        } else {
            None
        };
        Some(current)
    }
}

impl core::iter::FusedIterator for RampPlan {}

/// A clock held at a fixed divider while its source PLL is walked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RampedClock {
    pub clock: DerivedClock,
    pub source: ClockSource,
    pub target_hz: u32,
    pub divider: u32,
    pub policy: RampPolicy,
}

impl RampedClock {
    /// `None` when `clock` may be switched to `target_hz` directly.
    pub fn new(
        clock: DerivedClock,
        source: ClockSource,
        target_hz: u32,
        divider: u32,
    ) -> Option<RampedClock> {
        source.pll()?;
        let policy = clock
            .ramp_policy()
            .filter(|policy| target_hz > policy.threshold_hz)?;
        Some(RampedClock {
            clock,
            source,
            target_hz,
            divider: divider.max(1),
            policy,
        })
    }

    /// Numerator of `final_lock` that keeps this clock at or below its
    /// threshold.
    pub fn entry_numerator(&self, final_lock: &LockedFrequency) -> u16 {
        final_lock.numerator_below(u64::from(self.policy.threshold_hz) * u64::from(self.divider))
    }

    /// VCO change that moves this clock by one increment.
    fn vco_increment(&self) -> u64 {
        u64::from(self.policy.increment_hz) * u64::from(self.divider)
    }

    /// Of two clocks on the same PLL, the one that must drive the ramp so
    /// that neither moves by more than its increment per step.
    pub fn finer(self, other: RampedClock) -> RampedClock {
        if other.vco_increment() < self.vco_increment() {
            other
        } else {
            self
        }
    }
}

/// State after one ramp step, reported while the next one has not started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RampStep {
    pub numerator: u16,
    pub clock_hz: u32,
}

/// What a ramp did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RampOutcome {
    pub achieved_hz: u32,
    /// Number of times the clock was programmed
    pub steps: u32,
}

pub struct RampController<'a> {
    sequencer: &'a PllSequencer<'a>,
    programmer: &'a DividerProgrammer<'a>,
}

impl<'a> RampController<'a> {
    pub fn new(sequencer: &'a PllSequencer<'a>, programmer: &'a DividerProgrammer<'a>) -> Self {
        Self {
            sequencer,
            programmer,
        }
    }

    /// Walk the PLL feeding `driver` from its current lock up to
    /// `final_lock`, one [RampPlan] step of `driver` at a time.
    ///
    /// `driver` must already be at its divider. `sources` follows the PLL
    /// through every retune and holds `final_lock` on success. `on_step` runs
    /// after each step has locked and been programmed.
    pub fn ramp<F: FnMut(RampStep)>(
        &self,
        sources: &mut SourceFrequencies,
        final_lock: &LockedFrequency,
        driver: &RampedClock,
        mut on_step: F,
    ) -> Result<RampOutcome, ClockError> {
        let pll = final_lock.pll;
        let entry = sources
            .pll(pll)
            .ok_or(ClockError::InvalidConfiguration {
                reason: "clock source is not running",
            })?;
        let start_hz = entry.vco_hz / driver.divider;
        let end_hz = final_lock.vco_hz / driver.divider;
        log::debug!(
            "{:?} clock ramps from {} Hz to {} Hz in {} Hz steps",
            driver.clock,
            start_hz,
            end_hz,
            driver.policy.increment_hz
        );

        let mut outcome = RampOutcome {
            achieved_hz: start_hz,
            steps: 0,
        };
        let mut current = entry.numerator;
        for step_hz in RampPlan::new(start_hz, end_hz, driver.policy.increment_hz)? {
            let numerator = if step_hz == end_hz {
                final_lock.numerator
            } else {
                final_lock.numerator_below(u64::from(step_hz) * u64::from(driver.divider))
            }
            .max(current);
            if numerator != current {
                sources.set_pll(self.sequencer.retune(final_lock, numerator)?);
                current = numerator;
            }
            self.programmer
                .write_divider(driver.clock, driver.source, driver.divider);
            outcome.achieved_hz = self.programmer.current_hz(sources, driver.clock)?;
            outcome.steps += 1;
            on_step(RampStep {
                numerator,
                clock_hz: outcome.achieved_hz,
            });
        }
        Ok(outcome)
    }
}
