// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Derived clock programmer.
//!
//! Every derived clock is a source mux followed by an integer counter. The
//! divider for a target frequency is always computed against the frequency
//! its source actually runs at, never against a nominal value.
//!
//! Where the divider lives depends on the source:
//!
//! | clock       | PLL source                   | other source       |
//! |-------------|------------------------------|--------------------|
//! | MPU, NOC    | `ALTR_*CLK` main/peri count  | `*CLK.CNT`         |
//! | C2 to C9    | counter in that PLL's group  | none, divide by 1  |
//! | C15         | `MAINPLL.CNTR15`             | n/a                |
//!
//! When the divider and the mux share a register they are written together.
//! Otherwise the divider is written first.

use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::ReadWrite;

use super::config::{
    BoardConfig, ClockSource, EmacClockSelect, NocDividers, PeripheralClock, PllSelect,
    PllSource, Tolerance,
};
use super::pll::LockedFrequency;
use super::ramp::{RampPolicy, MPU_RAMP, NOC_RAMP};
use super::registers::{
    ClockManagerRegisters, ALTR_CNT, CLKSEL, CNTR, COUNTER_DIVIDER_MAX, EMACCTL, NOCDIV,
};
use super::ClockError;

/// A clock generated from a source mux and a counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DerivedClock {
    Mpu,
    Noc,
    /// Main PLL counter C15, reference of the peripheral PLL
    PeriphRef,
    Peripheral(PeripheralClock),
}

impl DerivedClock {
    /// How the clock must be walked up to high targets, if it must.
    pub fn ramp_policy(self) -> Option<RampPolicy> {
        match self {
            DerivedClock::Mpu => Some(MPU_RAMP),
            DerivedClock::Noc => Some(NOC_RAMP),
            DerivedClock::PeriphRef | DerivedClock::Peripheral(_) => None,
        }
    }

    fn accepts(self, source: ClockSource) -> bool {
        match self {
            DerivedClock::PeriphRef => source == ClockSource::MainPll,
            _ => true,
        }
    }

    fn max_divider(self, source: ClockSource) -> u32 {
        match (self, source.pll()) {
            (DerivedClock::Peripheral(_), None) => 1,
            _ => COUNTER_DIVIDER_MAX,
        }
    }
}

/// Divider in `1..=max_divider` whose output is nearest to `target_hz`.
///
/// Ties go to the larger divider. `target_hz` must not be zero.
pub fn select_divider(source_hz: u32, target_hz: u32, max_divider: u32) -> u32 {
    let max_divider = max_divider.max(1);
    let target_hz = target_hz.max(1);
    let below = (source_hz / target_hz).clamp(1, max_divider);
    let above = (below + 1).min(max_divider);
    if above == below {
        return below;
    }
    // |S/b - T| <= |S/a - T|  <=>  |S - T*b| * a <= |S - T*a| * b
    let error = |divider: u32| {
        u128::from(u64::from(source_hz).abs_diff(u64::from(target_hz) * u64::from(divider)))
    };
    if error(above) * u128::from(below) <= error(below) * u128::from(above) {
        above
    } else {
        below
    }
}

/// Frequencies of every mux input as they are right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceFrequencies {
    pub osc1_hz: u32,
    pub intosc_hz: u32,
    pub f2s_hz: Option<u32>,
    /// Output of main counter C15 once programmed
    pub periph_ref_hz: Option<u32>,
    pub main_pll: Option<LockedFrequency>,
    pub peripheral_pll: Option<LockedFrequency>,
}

impl SourceFrequencies {
    /// Oscillators of `board`, both PLLs not running yet.
    pub fn from_board(board: &BoardConfig) -> SourceFrequencies {
        SourceFrequencies {
            osc1_hz: board.osc1_hz,
            intosc_hz: board.intosc_hz,
            f2s_hz: board.f2s_free_hz,
            periph_ref_hz: None,
            main_pll: None,
            peripheral_pll: None,
        }
    }

    pub fn hz(&self, source: ClockSource) -> Option<u32> {
        match source {
            ClockSource::MainPll => self.main_pll.map(|lock| lock.vco_hz),
            ClockSource::PeripheralPll => self.peripheral_pll.map(|lock| lock.vco_hz),
            ClockSource::Osc1 => Some(self.osc1_hz),
            ClockSource::IntOsc => Some(self.intosc_hz),
            ClockSource::Fpga => self.f2s_hz,
        }
    }

    pub fn reference_hz(&self, source: PllSource) -> Result<u32, ClockError> {
        match source {
            PllSource::Eosc1 => Some(self.osc1_hz),
            PllSource::IntOsc => Some(self.intosc_hz),
            PllSource::F2s => self.f2s_hz,
            PllSource::MainPeriphRef => self.periph_ref_hz,
        }
        .ok_or(ClockError::InvalidConfiguration {
            reason: "PLL reference clock is not running",
        })
    }

    pub fn pll(&self, pll: PllSelect) -> Option<LockedFrequency> {
        match pll {
            PllSelect::Main => self.main_pll,
            PllSelect::Peripheral => self.peripheral_pll,
        }
    }

    pub fn set_pll(&mut self, lock: LockedFrequency) {
        match lock.pll {
            PllSelect::Main => self.main_pll = Some(lock),
            PllSelect::Peripheral => self.peripheral_pll = Some(lock),
        }
    }
}

const SOURCE_NOT_RUNNING: ClockError = ClockError::InvalidConfiguration {
    reason: "clock source is not running",
};

pub struct DividerProgrammer<'a> {
    registers: &'a ClockManagerRegisters,
    tolerance: Tolerance,
}

impl<'a> DividerProgrammer<'a> {
    pub fn new(registers: &'a ClockManagerRegisters, tolerance: Tolerance) -> Self {
        Self {
            registers,
            tolerance,
        }
    }

    /// Switch `clock` to `source` with the divider nearest to `target_hz`.
    ///
    /// Returns the frequency the clock runs at afterwards.
    ///
    /// # Errors
    ///
    /// + [Err]\([ClockError::UnreachableFrequency]\): the nearest divider is
    ///   outside the tolerance. Nothing is written.
    /// + [Err]\([ClockError::InvalidConfiguration]\): zero target, a source
    ///   the clock can not select, or a source that is not running.
    pub fn program(
        &self,
        sources: &SourceFrequencies,
        clock: DerivedClock,
        source: ClockSource,
        target_hz: u32,
    ) -> Result<u32, ClockError> {
        let source_hz = sources.hz(source).ok_or(SOURCE_NOT_RUNNING)?;
        let divider = self.divider_for(source_hz, clock, source, target_hz)?;
        self.write_divider(clock, source, divider);
        let achieved_hz = source_hz / divider;
        log::debug!(
            "{:?} clock from {:?}: {} Hz / {} = {} Hz",
            clock,
            source,
            source_hz,
            divider,
            achieved_hz
        );
        Ok(achieved_hz)
    }

    /// Divider [DividerProgrammer::program] would write for `target_hz` when
    /// `source` runs at `source_hz`. Nothing is written.
    pub fn divider_for(
        &self,
        source_hz: u32,
        clock: DerivedClock,
        source: ClockSource,
        target_hz: u32,
    ) -> Result<u32, ClockError> {
        if target_hz == 0 {
            return Err(ClockError::InvalidConfiguration {
                reason: "target frequency is zero",
            });
        }
        if !clock.accepts(source) {
            return Err(ClockError::InvalidConfiguration {
                reason: "clock cannot select this source",
            });
        }
        let divider = select_divider(source_hz, target_hz, clock.max_divider(source));
        let achieved_hz = source_hz / divider;
        if !self.tolerance.allows(target_hz, achieved_hz) {
            return Err(ClockError::UnreachableFrequency {
                clock,
                target_hz,
                achieved_hz,
            });
        }
        Ok(divider)
    }

    /// Switch `clock` to `source` divided by `divider`, whether or not the
    /// source runs yet.
    pub fn write_divider(&self, clock: DerivedClock, source: ClockSource, divider: u32) {
        let count = divider.clamp(1, clock.max_divider(source)) - 1;
        let registers = self.registers;
        match clock {
            DerivedClock::Mpu => {
                write_core_clock(&registers.altr_mpuclk, &registers.mpuclk, source, count)
            }
            DerivedClock::Noc => {
                write_core_clock(&registers.altr_nocclk, &registers.nocclk, source, count)
            }
            DerivedClock::PeriphRef => registers.main_cntr15.modify(CNTR::CNT.val(count)),
            DerivedClock::Peripheral(peripheral) => {
                let mux_group = peripheral.mux_group();
                let mux = self.counter(mux_group, peripheral);
                let select = CNTR::SRC.val(source as u32);
                match source.pll() {
                    Some(pll) if pll == mux_group => mux.modify(CNTR::CNT.val(count) + select),
                    Some(pll) => {
                        self.counter(pll, peripheral)
                            .modify(CNTR::CNT.val(count));
                        mux.modify(select);
                    }
                    None => mux.modify(select),
                }
            }
        }
    }

    fn counter(
        &self,
        pll: PllSelect,
        peripheral: PeripheralClock,
    ) -> &'a ReadWrite<u32, CNTR::Register> {
        let registers = self.registers;
        match pll {
            PllSelect::Main => &registers.main_cntr[peripheral.index()],
            PllSelect::Peripheral => &registers.peri_cntr[peripheral.index()],
        }
    }

    /// Frequency `clock` runs at according to its registers.
    pub fn current_hz(
        &self,
        sources: &SourceFrequencies,
        clock: DerivedClock,
    ) -> Result<u32, ClockError> {
        let registers = self.registers;
        match clock {
            DerivedClock::Mpu => current_core_hz(sources, &registers.altr_mpuclk, &registers.mpuclk),
            DerivedClock::Noc => current_core_hz(sources, &registers.altr_nocclk, &registers.nocclk),
            DerivedClock::PeriphRef => {
                let vco_hz = sources.hz(ClockSource::MainPll).ok_or(SOURCE_NOT_RUNNING)?;
                Ok(vco_hz / (registers.main_cntr15.read(CNTR::CNT) + 1))
            }
            DerivedClock::Peripheral(peripheral) => {
                let mux = self.counter(peripheral.mux_group(), peripheral);
                let source = ClockSource::from_mux(mux.read(CNTR::SRC)).ok_or(SOURCE_NOT_RUNNING)?;
                let source_hz = sources.hz(source).ok_or(SOURCE_NOT_RUNNING)?;
                Ok(match source.pll() {
                    Some(pll) => source_hz / (self.counter(pll, peripheral).read(CNTR::CNT) + 1),
                    None => source_hz,
                })
            }
        }
    }

    /// Program the L4 bus and CoreSight dividers of the NOC clock.
    pub fn set_noc_dividers(&self, dividers: &NocDividers) {
        self.registers.nocdiv.write(
            NOCDIV::L4MAINCLK.val(dividers.l4_main as u32)
                + NOCDIV::L4MPCLK.val(dividers.l4_mp as u32)
                + NOCDIV::L4SPCLK.val(dividers.l4_sp as u32)
                + NOCDIV::CSATCLK.val(dividers.cs_at as u32)
                + NOCDIV::CSTRACECLK.val(dividers.cs_trace as u32)
                + NOCDIV::CSPDBGCLK.val(dividers.cs_pdbg as u32),
        );
    }

    /// Select the EMAC counter clock of each Ethernet controller.
    pub fn set_emac_select(&self, select: &[EmacClockSelect; 3]) {
        self.registers.emacctl.modify(
            EMACCTL::EMAC0SEL.val(select[0] as u32)
                + EMACCTL::EMAC1SEL.val(select[1] as u32)
                + EMACCTL::EMAC2SEL.val(select[2] as u32),
        );
    }
}

fn write_core_clock(
    counters: &ReadWrite<u32, ALTR_CNT::Register>,
    select: &ReadWrite<u32, CLKSEL::Register>,
    source: ClockSource,
    count: u32,
) {
    let mux = CLKSEL::SRC.val(source as u32);
    match source.pll() {
        Some(PllSelect::Main) => {
            counters.modify(ALTR_CNT::MAINCNT.val(count));
            select.write(CLKSEL::CNT.val(0) + mux);
        }
        Some(PllSelect::Peripheral) => {
            counters.modify(ALTR_CNT::PERICNT.val(count));
            select.write(CLKSEL::CNT.val(0) + mux);
        }
        None => select.write(CLKSEL::CNT.val(count) + mux),
    }
}

fn current_core_hz(
    sources: &SourceFrequencies,
    counters: &ReadWrite<u32, ALTR_CNT::Register>,
    select: &ReadWrite<u32, CLKSEL::Register>,
) -> Result<u32, ClockError> {
    let source = ClockSource::from_mux(select.read(CLKSEL::SRC)).ok_or(SOURCE_NOT_RUNNING)?;
    let source_hz = sources.hz(source).ok_or(SOURCE_NOT_RUNNING)?;
    let counter = match source.pll() {
        Some(PllSelect::Main) => counters.read(ALTR_CNT::MAINCNT) + 1,
        Some(PllSelect::Peripheral) => counters.read(ALTR_CNT::PERICNT) + 1,
        None => 1,
    };
    Ok(source_hz / counter / (select.read(CLKSEL::CNT) + 1))
}
