// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Clock tree bring-up.
//!
//! [ClockManager::basic_init] applies a [BoardConfig] exactly once, in a fixed
//! order: main PLL, peripheral PLL, NOC and MPU, the peripheral clocks, and
//! finally the clock gates and the exit from boot mode. The first failure
//! stops the sequence and is returned unchanged.
//!
//! The NOC and MPU take their final dividers while their PLL is still
//! bypassed, and the PLL first locks at a numerator that keeps both at or
//! below their ramp thresholds. Each PLL is then ramped up to its configured
//! numerator. Retrying without a
//! reset is not supported, so a failed bring-up also counts as the one call.
//!
//! On success every frequency is read back from the registers and kept for
//! the consumers that need them, such as the UART baud rate setup.

use core::cell::Cell;

use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use super::config::{
    BoardConfig, ClockRequest, ClockSource, NocDivider, PeripheralClock, PllConfig, PllSelect,
    PllSource,
};
use super::divider::{DerivedClock, DividerProgrammer, SourceFrequencies};
use super::pll::{LockedFrequency, PllSequencer};
use super::ramp::{RampController, RampedClock};
use super::registers::{ClockManagerRegisters, CTRL, GPIODIV, NOCDIV};
use super::ClockError;
use crate::static_ref::StaticRef;

/// Every clock frequency after a successful bring-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockFrequencies {
    pub main_vco_hz: u32,
    pub peripheral_vco_hz: u32,
    pub mpu_hz: u32,
    pub noc_hz: u32,
    pub l4_main_hz: u32,
    pub l4_mp_hz: u32,
    pub l4_sp_hz: u32,
    pub cs_at_hz: u32,
    pub cs_trace_hz: u32,
    pub cs_pdbg_hz: u32,
    /// Indexed by [PeripheralClock::index], `None` when not programmed
    pub peripherals: [Option<u32>; 8],
}

pub struct ClockManager {
    registers: StaticRef<ClockManagerRegisters>,
    attempted: Cell<bool>,
    frequencies: Cell<Option<ClockFrequencies>>,
}

impl ClockManager {
    pub const fn new(registers: StaticRef<ClockManagerRegisters>) -> Self {
        Self {
            registers,
            attempted: Cell::new(false),
            frequencies: Cell::new(None),
        }
    }

    /// Bring the clock tree from reset to `board`.
    ///
    /// # Errors
    ///
    /// + [Err]\([ClockError::AlreadyConfigured]\): called before, whatever
    ///   the outcome was. No register is touched.
    /// + [Err]\([ClockError::InvalidConfiguration]\): `board` can not be
    ///   applied. No register is touched.
    /// + any error of the PLL sequencer, the divider programmer or the ramp
    ///   controller, after which the clock tree is in an undefined state.
    pub fn basic_init(&self, board: &BoardConfig) -> Result<(), ClockError> {
        if self.attempted.replace(true) {
            return Err(ClockError::AlreadyConfigured);
        }
        match self.configure(board) {
            Ok(frequencies) => {
                log::info!(
                    "clocks: MPU {} Hz, NOC {} Hz, L4 SP {} Hz",
                    frequencies.mpu_hz,
                    frequencies.noc_hz,
                    frequencies.l4_sp_hz
                );
                self.frequencies.set(Some(frequencies));
                Ok(())
            }
            Err(error) => {
                log::error!("clock bring-up failed: {}", error);
                Err(error)
            }
        }
    }

    fn configure(&self, board: &BoardConfig) -> Result<ClockFrequencies, ClockError> {
        board.validate()?;

        let registers = &*self.registers;
        let sequencer = PllSequencer::new(registers);
        let programmer = DividerProgrammer::new(registers, board.tolerance);
        let mut sources = SourceFrequencies::from_board(board);
        let core = core_clocks(board);

        // Gate everything that gets enabled again at the end.
        registers.main_pll.enr.set(board.main_clock_enables);
        registers.peripheral_pll.en.set(0);
        clear_pll_status(registers);

        let main = start_pll(
            &sequencer,
            &programmer,
            &mut sources,
            PllSelect::Main,
            &board.main_pll,
            &core,
        )?;
        if board.peripheral_pll.source == PllSource::MainPeriphRef {
            // Divided against the final main VCO, the peripheral PLL reaches
            // its reference once the main PLL has ramped.
            let mut ramped = sources;
            ramped.set_pll(main.final_lock);
            let hz = programmer.program(
                &ramped,
                DerivedClock::PeriphRef,
                ClockSource::MainPll,
                board.periph_ref_hz.unwrap_or(0),
            )?;
            sources.periph_ref_hz = Some(hz);
        }
        let peripheral = start_pll(
            &sequencer,
            &programmer,
            &mut sources,
            PllSelect::Peripheral,
            &board.peripheral_pll,
            &core,
        )?;

        programmer.set_noc_dividers(&board.noc_dividers);
        ramp_core_clocks(&sequencer, &programmer, &mut sources, board, &main, &peripheral)?;
        for (clock, request) in core {
            programmer.program(&sources, clock, request.source, request.target_hz)?;
        }

        let mut programmed = [false; 8];
        for request in board.peripherals {
            let clock = DerivedClock::Peripheral(request.clock);
            match programmer.program(&sources, clock, request.source, request.target_hz) {
                Ok(_) => programmed[request.clock.index()] = true,
                Err(error @ ClockError::UnreachableFrequency { .. }) if !request.required => {
                    log::warn!("{}, left at reset", error);
                }
                Err(error) => return Err(error),
            }
        }
        programmer.set_emac_select(&board.emac_select);
        registers
            .gpiodiv
            .write(GPIODIV::GPIODBCLK.val(board.gpio_debounce_div));

        registers.main_pll.ens.set(board.main_clock_enables);
        registers
            .peripheral_pll
            .ens
            .set(board.peripheral_clock_enables);
        clear_pll_status(registers);
        leave_boot_mode(registers, &sequencer)?;

        self.read_frequencies(board, &sources, &programmed)
    }

    /// Frequencies as the registers describe them, using the PLL references
    /// in `sources`.
    fn read_frequencies(
        &self,
        board: &BoardConfig,
        sources: &SourceFrequencies,
        programmed: &[bool; 8],
    ) -> Result<ClockFrequencies, ClockError> {
        let registers = &*self.registers;
        let sequencer = PllSequencer::new(registers);
        let programmer = DividerProgrammer::new(registers, board.tolerance);

        let mut readback = *sources;
        for (pll, source) in [
            (PllSelect::Main, board.main_pll.source),
            (PllSelect::Peripheral, board.peripheral_pll.source),
        ] {
            let lock = sequencer
                .read_lock(pll, sources.reference_hz(source)?)
                .ok_or(ClockError::InvalidConfiguration {
                    reason: "PLL VCO frequency overflows",
                })?;
            readback.set_pll(lock);
        }

        let noc_hz = programmer.current_hz(&readback, DerivedClock::Noc)?;
        let noc_divided = |field: Field<u32, NOCDIV::Register>| {
            NocDivider::from_field(registers.nocdiv.read(field)).divide(noc_hz)
        };

        let mut peripherals = [None; 8];
        for clock in PeripheralClock::ALL {
            if programmed[clock.index()] {
                peripherals[clock.index()] =
                    Some(programmer.current_hz(&readback, DerivedClock::Peripheral(clock))?);
            }
        }

        Ok(ClockFrequencies {
            main_vco_hz: readback.hz(ClockSource::MainPll).unwrap_or(0),
            peripheral_vco_hz: readback.hz(ClockSource::PeripheralPll).unwrap_or(0),
            mpu_hz: programmer.current_hz(&readback, DerivedClock::Mpu)?,
            noc_hz,
            l4_main_hz: noc_divided(NOCDIV::L4MAINCLK),
            l4_mp_hz: noc_divided(NOCDIV::L4MPCLK),
            l4_sp_hz: noc_divided(NOCDIV::L4SPCLK),
            cs_at_hz: noc_divided(NOCDIV::CSATCLK),
            cs_trace_hz: noc_divided(NOCDIV::CSTRACECLK),
            cs_pdbg_hz: noc_divided(NOCDIV::CSPDBGCLK),
            peripherals,
        })
    }

    /// Clock of the L4 slow peripheral bus, which the UART divisors are
    /// computed from.
    pub fn l4_peripheral_clock_hz(&self) -> Result<u32, ClockError> {
        self.frequencies().map(|frequencies| frequencies.l4_sp_hz)
    }

    pub fn frequencies(&self) -> Result<ClockFrequencies, ClockError> {
        self.frequencies.get().ok_or(ClockError::NotConfigured)
    }

    /// `None` when the board did not ask for `clock` or it was left at reset.
    pub fn peripheral_clock_hz(&self, clock: PeripheralClock) -> Result<Option<u32>, ClockError> {
        self.frequencies()
            .map(|frequencies| frequencies.peripherals[clock.index()])
    }
}

/// NOC and MPU, in the order they are programmed.
fn core_clocks(board: &BoardConfig) -> [(DerivedClock, ClockRequest); 2] {
    [(DerivedClock::Noc, board.noc), (DerivedClock::Mpu, board.mpu)]
}

/// A PLL running at its entry numerator and where it ramps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PllStart {
    final_lock: LockedFrequency,
    /// Ramped clock that sets the pace, `None` when nothing on this PLL is
    /// ramped and it already runs at `final_lock`
    driver: Option<RampedClock>,
}

/// Lock `pll` low enough that every core clock it feeds is at or below its
/// ramp threshold.
///
/// The core clocks fed by `pll` get their final dividers while its outputs
/// are bypassed, so releasing the bypass never puts them above threshold.
fn start_pll(
    sequencer: &PllSequencer,
    programmer: &DividerProgrammer,
    sources: &mut SourceFrequencies,
    pll: PllSelect,
    config: &PllConfig,
    core: &[(DerivedClock, ClockRequest)],
) -> Result<PllStart, ClockError> {
    let reference_hz = sources.reference_hz(config.source)?;
    let final_lock = LockedFrequency::expected(pll, config, reference_hz)?;
    for (clock, request) in core {
        if request.source.pll() == Some(pll) {
            programmer.divider_for(final_lock.vco_hz, *clock, request.source, request.target_hz)?;
        }
    }

    sequencer.bypass(pll)?;
    let mut entry = *config;
    let mut driver: Option<RampedClock> = None;
    for (clock, request) in core {
        if request.source.pll() != Some(pll) {
            continue;
        }
        let divider =
            programmer.divider_for(final_lock.vco_hz, *clock, request.source, request.target_hz)?;
        programmer.write_divider(*clock, request.source, divider);
        if let Some(ramped) = RampedClock::new(*clock, request.source, request.target_hz, divider) {
            entry.numerator = entry.numerator.min(ramped.entry_numerator(&final_lock));
            driver = Some(driver.map_or(ramped, |driver| driver.finer(ramped)));
        }
    }

    sources.set_pll(sequencer.bring_up(pll, &entry, reference_hz)?);
    Ok(PllStart { final_lock, driver })
}

/// Ramp the main PLL, then the peripheral PLL.
fn ramp_core_clocks(
    sequencer: &PllSequencer,
    programmer: &DividerProgrammer,
    sources: &mut SourceFrequencies,
    board: &BoardConfig,
    main: &PllStart,
    peripheral: &PllStart,
) -> Result<(), ClockError> {
    let ramp = RampController::new(sequencer, programmer);
    ramp_pll(&ramp, sources, main)?;
    if board.peripheral_pll.source == PllSource::MainPeriphRef && main.driver.is_some() {
        // Its reference moved with the main VCO.
        sequencer.wait_for_lock(PllSelect::Peripheral)?;
    }
    ramp_pll(&ramp, sources, peripheral)
}

fn ramp_pll(
    ramp: &RampController,
    sources: &mut SourceFrequencies,
    start: &PllStart,
) -> Result<(), ClockError> {
    if let Some(driver) = start.driver {
        ramp.ramp(sources, &start.final_lock, &driver, |step| {
            log::trace!("{:?} clock at {} Hz", driver.clock, step.clock_hz)
        })?;
    }
    Ok(())
}

fn leave_boot_mode(
    registers: &ClockManagerRegisters,
    sequencer: &PllSequencer,
) -> Result<(), ClockError> {
    registers.ctrl.modify(CTRL::BOOTMOD::CLEAR);
    sequencer.wait_for_idle()
}

/// Clear the sticky lost-lock and slip bits of both PLLs.
fn clear_pll_status(registers: &ClockManagerRegisters) {
    registers
        .intr
        .set(PllSelect::Main.status_bits() | PllSelect::Peripheral.status_bits());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clocks::config::{PeripheralClockRequest, SOCDK_BOARD};
    use crate::clocks::fake::{self, FakeClockManager};
    use crate::clocks::ramp::{MPU_RAMP, NOC_RAMP};

    fn manager(fake: &FakeClockManager) -> ClockManager {
        ClockManager::new(fake.registers())
    }

    #[test]
    fn socdk_bring_up() {
        let fake = FakeClockManager::with_locking_plls();
        fake.set_word(fake::CTRL, 1);
        let clocks = manager(&fake);

        clocks.basic_init(&SOCDK_BOARD).unwrap();
        let frequencies = clocks.frequencies().unwrap();
        assert_eq!(frequencies.main_vco_hz, 2_400_000_000);
        assert_eq!(frequencies.peripheral_vco_hz, 1_000_000_000);
        assert_eq!(frequencies.mpu_hz, 1_200_000_000);
        assert_eq!(frequencies.noc_hz, 400_000_000);
        assert_eq!(frequencies.l4_main_hz, 400_000_000);
        assert_eq!(frequencies.l4_mp_hz, 200_000_000);
        assert_eq!(frequencies.l4_sp_hz, 100_000_000);
        assert_eq!(frequencies.cs_trace_hz, 200_000_000);
        assert_eq!(clocks.l4_peripheral_clock_hz(), Ok(100_000_000));

        assert_eq!(
            clocks.peripheral_clock_hz(PeripheralClock::EmacA),
            Ok(Some(250_000_000))
        );
        assert_eq!(
            clocks.peripheral_clock_hz(PeripheralClock::GpioDebounce),
            Ok(Some(25_000_000))
        );
        assert_eq!(
            clocks.peripheral_clock_hz(PeripheralClock::HmcPllRef),
            Ok(Some(100_000_000))
        );
        assert_eq!(clocks.peripheral_clock_hz(PeripheralClock::S2fUser0), Ok(None));

        // Out of boot mode, gates enabled, lock loss bits cleared.
        assert_eq!(fake.word(fake::CTRL) & 1, 0);
        assert_eq!(fake.word(fake::MAIN_ENS), 0x3F);
        assert_eq!(fake.word(fake::PERI_ENS), 0xF7F);
        assert_eq!(fake.word(fake::INTR), 0xF0C);
        assert_eq!(fake.word(fake::GPIODIV), 0x1E84);
        assert_eq!(fake.word(fake::PERI_BYPASSR), 0xFF);
    }

    #[test]
    fn direct_noc_and_ramped_mpu() {
        let fake = FakeClockManager::with_locking_plls();
        let clocks = manager(&fake);
        let mut board = SOCDK_BOARD;
        board.noc.target_hz = 300_000_000;

        clocks.basic_init(&board).unwrap();
        let frequencies = clocks.frequencies().unwrap();
        assert_eq!(frequencies.noc_hz, 300_000_000);
        assert_eq!(frequencies.mpu_hz, 1_200_000_000);
        assert_eq!(frequencies.l4_sp_hz, 75_000_000);
        assert_eq!(fake.word(fake::ALTR_NOCCLK), 7);
        assert_eq!(fake.word(fake::ALTR_MPUCLK), 1);
        assert_eq!(fake.word(fake::MAIN_VCO1), 95);
    }

    #[test]
    fn second_call_is_rejected_without_writes() {
        let fake = FakeClockManager::with_locking_plls();
        let clocks = manager(&fake);
        clocks.basic_init(&SOCDK_BOARD).unwrap();

        let before = fake.snapshot();
        assert_eq!(
            clocks.basic_init(&SOCDK_BOARD),
            Err(ClockError::AlreadyConfigured)
        );
        assert_eq!(fake.snapshot(), before);
        assert_eq!(clocks.l4_peripheral_clock_hz(), Ok(100_000_000));
    }

    #[test]
    fn query_before_bring_up_fails() {
        let fake = FakeClockManager::with_locking_plls();
        let clocks = manager(&fake);
        assert_eq!(
            clocks.l4_peripheral_clock_hz(),
            Err(ClockError::NotConfigured)
        );
        assert_eq!(
            clocks.peripheral_clock_hz(PeripheralClock::Sdmmc),
            Err(ClockError::NotConfigured)
        );
    }

    #[test]
    fn invalid_board_touches_nothing() {
        let fake = FakeClockManager::with_locking_plls();
        let clocks = manager(&fake);
        let before = fake.snapshot();
        let mut board = SOCDK_BOARD;
        board.main_pll = PllConfig::new(PllSource::Eosc1, 9000, 1);

        assert!(matches!(
            clocks.basic_init(&board),
            Err(ClockError::InvalidConfiguration { .. })
        ));
        assert_eq!(fake.snapshot(), before);
        assert_eq!(clocks.basic_init(&SOCDK_BOARD), Err(ClockError::AlreadyConfigured));
    }

    #[test]
    fn fpga_referenced_pll_without_fpga_stops_bring_up() {
        let fake = FakeClockManager::new();
        fake.set_locked(PllSelect::Main, true);
        let clocks = manager(&fake);
        let mut board = SOCDK_BOARD;
        board.f2s_free_hz = Some(50_000_000);
        board.peripheral_pll = PllConfig::new(PllSource::F2s, 20, 1);

        assert_eq!(
            clocks.basic_init(&board),
            Err(ClockError::LockTimeout {
                pll: PllSelect::Peripheral
            })
        );
        // No peripheral clock was programmed.
        assert_eq!(fake.word(fake::NOCDIV), 0);
        for index in 0..8 {
            assert_eq!(fake.word(fake::PERI_CNTR2 + 4 * index), 0);
            assert_eq!(fake.word(fake::MAIN_CNTR2 + 4 * index), 0);
        }
        assert_eq!(fake.word(fake::PERI_ENS), 0);
        assert_eq!(clocks.frequencies(), Err(ClockError::NotConfigured));
    }

    #[test]
    fn optional_peripheral_may_miss_its_target() {
        static PERIPHERALS: [PeripheralClockRequest; 2] = [
            PeripheralClockRequest {
                clock: PeripheralClock::EmacPtp,
                source: ClockSource::Osc1,
                target_hz: 100_000_000,
                required: false,
            },
            PeripheralClockRequest {
                clock: PeripheralClock::Sdmmc,
                source: ClockSource::PeripheralPll,
                target_hz: 200_000_000,
                required: true,
            },
        ];
        let fake = FakeClockManager::with_locking_plls();
        let clocks = manager(&fake);
        let mut board = SOCDK_BOARD;
        board.peripherals = &PERIPHERALS;

        clocks.basic_init(&board).unwrap();
        assert_eq!(clocks.peripheral_clock_hz(PeripheralClock::EmacPtp), Ok(None));
        assert_eq!(
            clocks.peripheral_clock_hz(PeripheralClock::Sdmmc),
            Ok(Some(200_000_000))
        );
    }

    #[test]
    fn required_peripheral_must_reach_its_target() {
        static PERIPHERALS: [PeripheralClockRequest; 1] = [PeripheralClockRequest {
            clock: PeripheralClock::Sdmmc,
            source: ClockSource::Osc1,
            target_hz: 200_000_000,
            required: true,
        }];
        let fake = FakeClockManager::with_locking_plls();
        let clocks = manager(&fake);
        let mut board = SOCDK_BOARD;
        board.peripherals = &PERIPHERALS;

        assert_eq!(
            clocks.basic_init(&board),
            Err(ClockError::UnreachableFrequency {
                clock: DerivedClock::Peripheral(PeripheralClock::Sdmmc),
                target_hz: 200_000_000,
                achieved_hz: 25_000_000,
            })
        );
    }

    #[test]
    fn peripheral_pll_from_main_reference() {
        let fake = FakeClockManager::with_locking_plls();
        let clocks = manager(&fake);
        let mut board = SOCDK_BOARD;
        board.periph_ref_hz = Some(100_000_000);
        board.peripheral_pll = PllConfig::new(PllSource::MainPeriphRef, 10, 1);

        clocks.basic_init(&board).unwrap();
        assert_eq!(fake.word(fake::MAIN_CNTR15), 23);
        assert_eq!(fake.word(fake::PERI_VCO0) >> 8 & 0b11, 3);
        assert_eq!(clocks.frequencies().unwrap().peripheral_vco_hz, 1_000_000_000);
    }

    #[test]
    fn core_clocks_stay_at_threshold_until_ramped() {
        let fake = FakeClockManager::with_locking_plls();
        let registers = fake.registers();
        let sequencer = PllSequencer::new(&registers);
        let programmer = DividerProgrammer::new(&registers, SOCDK_BOARD.tolerance);
        let mut sources = SourceFrequencies::from_board(&SOCDK_BOARD);

        let main = start_pll(
            &sequencer,
            &programmer,
            &mut sources,
            PllSelect::Main,
            &SOCDK_BOARD.main_pll,
            &core_clocks(&SOCDK_BOARD),
        )
        .unwrap();
        assert_eq!(main.final_lock.vco_hz, 2_400_000_000);
        assert_eq!(main.driver.map(|driver| driver.clock), Some(DerivedClock::Noc));

        // Bypass released at 1800 MHz with the final dividers in place.
        assert_eq!(fake.word(fake::MAIN_BYPASSR), 0x3F);
        assert_eq!(fake.word(fake::MAIN_VCO1), 71);
        assert_eq!(fake.word(fake::ALTR_MPUCLK), 1);
        assert_eq!(fake.word(fake::ALTR_NOCCLK), 5);
        let mpu_hz = programmer.current_hz(&sources, DerivedClock::Mpu).unwrap();
        let noc_hz = programmer.current_hz(&sources, DerivedClock::Noc).unwrap();
        assert!(mpu_hz <= MPU_RAMP.threshold_hz);
        assert!(noc_hz <= NOC_RAMP.threshold_hz);
        assert_eq!((mpu_hz, noc_hz), (900_000_000, 300_000_000));
    }

    #[test]
    fn exact_targets_on_small_dividers() {
        let fake = FakeClockManager::with_locking_plls();
        let clocks = manager(&fake);
        let mut board = SOCDK_BOARD;
        board.main_pll = PllConfig::new(PllSource::Eosc1, 32, 1);
        board.mpu.target_hz = 800_000_000;
        board.noc.target_hz = 400_000_000;

        clocks.basic_init(&board).unwrap();
        let frequencies = clocks.frequencies().unwrap();
        assert_eq!(frequencies.main_vco_hz, 800_000_000);
        assert_eq!(frequencies.mpu_hz, 800_000_000);
        assert_eq!(frequencies.noc_hz, 400_000_000);
        assert_eq!(fake.word(fake::ALTR_NOCCLK), 1);
        assert_eq!(fake.word(fake::MAIN_VCO1), 31);
    }

    #[test]
    fn peripheral_pll_relocks_after_main_ramp() {
        let fake = FakeClockManager::with_locking_plls();
        let registers = fake.registers();
        let sequencer = PllSequencer::new(&registers);
        let programmer = DividerProgrammer::new(&registers, SOCDK_BOARD.tolerance);
        let mut board = SOCDK_BOARD;
        board.periph_ref_hz = Some(100_000_000);
        board.peripheral_pll = PllConfig::new(PllSource::MainPeriphRef, 10, 1);
        let core = core_clocks(&board);
        let mut sources = SourceFrequencies::from_board(&board);

        let main = start_pll(
            &sequencer,
            &programmer,
            &mut sources,
            PllSelect::Main,
            &board.main_pll,
            &core,
        )
        .unwrap();
        sources.periph_ref_hz = board.periph_ref_hz;
        let peripheral = start_pll(
            &sequencer,
            &programmer,
            &mut sources,
            PllSelect::Peripheral,
            &board.peripheral_pll,
            &core,
        )
        .unwrap();

        fake.set_locked(PllSelect::Peripheral, false);
        assert_eq!(
            ramp_core_clocks(&sequencer, &programmer, &mut sources, &board, &main, &peripheral),
            Err(ClockError::LockTimeout {
                pll: PllSelect::Peripheral
            })
        );
        // The main PLL finished its ramp first.
        assert_eq!(fake.word(fake::MAIN_VCO1), 95);

        // Referenced from the oscillator it is not waited on again.
        board.peripheral_pll = SOCDK_BOARD.peripheral_pll;
        assert_eq!(
            ramp_core_clocks(&sequencer, &programmer, &mut sources, &board, &main, &peripheral),
            Ok(())
        );
    }

    #[test]
    fn leaving_boot_mode_waits_for_state_machine() {
        let fake = FakeClockManager::new();
        fake.set_word(fake::CTRL, 1);
        fake.set_word(fake::STAT, 1);
        let registers = fake.registers();
        let sequencer = PllSequencer::new(&registers);

        assert_eq!(
            leave_boot_mode(&registers, &sequencer),
            Err(ClockError::StateMachineTimeout)
        );
        assert_eq!(fake.word(fake::CTRL) & 1, 0);

        fake.set_word(fake::STAT, 0);
        assert_eq!(leave_boot_mode(&registers, &sequencer), Ok(()));
    }
}
