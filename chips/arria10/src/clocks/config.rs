// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Board-supplied clock tree description.
//!
//! A board describes the whole clock tree it wants as one constant
//! [BoardConfig]. Nothing in it is applied until
//! [ClockManager::basic_init](super::ClockManager::basic_init) has checked
//! every field with [BoardConfig::validate], so a malformed table never
//! reaches the hardware.
//!
//! PLLs are described by their VCO ratio ([PllConfig]). Every clock derived
//! from them is described by the frequency it should run at and the source
//! it should be taken from; the dividers are computed at bring-up time from
//! the frequency the PLL actually locked at.

use super::registers::{MAINPLL_EN_HW_MANAGED, VCO_DENOMINATOR_MAX, VCO_NUMERATOR_MAX};
use super::ClockError;

/// One of the two PLLs of the clock manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllSelect {
    /// Feeds the MPU and the NOC interconnect
    Main,
    /// Feeds the I/O peripherals
    Peripheral,
}

/// Reference clock of a PLL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllSource {
    /// External oscillator on the OSC1 pin
    Eosc1 = 0,
    /// Internal oscillator
    IntOsc = 1,
    /// Free running clock from the FPGA fabric
    F2s = 2,
    /// Main PLL counter C15, peripheral PLL only
    MainPeriphRef = 3,
}

/// Target state of one PLL.
///
/// The VCO runs at `reference * numerator / denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllConfig {
    pub source: PllSource,
    /// Feedback divider, 1 to 8192
    pub numerator: u16,
    /// Reference divider, 1 to 64
    pub denominator: u8,
}

impl PllConfig {
    pub const fn new(source: PllSource, numerator: u16, denominator: u8) -> Self {
        Self {
            source,
            numerator,
            denominator,
        }
    }

    /// Check that the ratio fits the VCO fields and that `pll` can take its
    /// reference from `self.source`.
    pub fn validate(&self, pll: PllSelect) -> Result<(), ClockError> {
        if self.numerator == 0 || self.numerator > VCO_NUMERATOR_MAX {
            return Err(ClockError::InvalidConfiguration {
                reason: "PLL numerator out of range",
            });
        }
        if self.denominator == 0 || self.denominator > VCO_DENOMINATOR_MAX {
            return Err(ClockError::InvalidConfiguration {
                reason: "PLL denominator out of range",
            });
        }
        if pll == PllSelect::Main && self.source == PllSource::MainPeriphRef {
            return Err(ClockError::InvalidConfiguration {
                reason: "main PLL cannot reference itself",
            });
        }
        Ok(())
    }

    /// VCO frequency for a given reference, if it fits in 32 bits.
    pub fn vco_hz(&self, reference_hz: u32) -> Option<u32> {
        vco_hz(reference_hz, self.numerator, self.denominator)
    }
}

pub(crate) fn vco_hz(reference_hz: u32, numerator: u16, denominator: u8) -> Option<u32> {
    if denominator == 0 {
        return None;
    }
    let hz = u64::from(reference_hz) * u64::from(numerator) / u64::from(denominator);
    u32::try_from(hz).ok()
}

/// Input of a clock mux.
///
/// The discriminants are the values of the `SRC` fields of the counter and
/// clock select registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockSource {
    MainPll = 0,
    PeripheralPll = 1,
    Osc1 = 2,
    IntOsc = 3,
    Fpga = 4,
}

impl ClockSource {
    /// The PLL behind this source, if any.
    pub fn pll(self) -> Option<PllSelect> {
        match self {
            ClockSource::MainPll => Some(PllSelect::Main),
            ClockSource::PeripheralPll => Some(PllSelect::Peripheral),
            ClockSource::Osc1 | ClockSource::IntOsc | ClockSource::Fpga => None,
        }
    }

    pub(crate) fn from_mux(value: u32) -> Option<ClockSource> {
        match value {
            0 => Some(ClockSource::MainPll),
            1 => Some(ClockSource::PeripheralPll),
            2 => Some(ClockSource::Osc1),
            3 => Some(ClockSource::IntOsc),
            4 => Some(ClockSource::Fpga),
            _ => None,
        }
    }
}

/// Peripheral clocks generated by the C2 to C9 counters.
///
/// Each has a counter in both PLL groups and one source mux.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeripheralClock {
    EmacA = 2,
    EmacB = 3,
    EmacPtp = 4,
    GpioDebounce = 5,
    Sdmmc = 6,
    S2fUser0 = 7,
    S2fUser1 = 8,
    HmcPllRef = 9,
}

impl PeripheralClock {
    pub const ALL: [PeripheralClock; 8] = [
        PeripheralClock::EmacA,
        PeripheralClock::EmacB,
        PeripheralClock::EmacPtp,
        PeripheralClock::GpioDebounce,
        PeripheralClock::Sdmmc,
        PeripheralClock::S2fUser0,
        PeripheralClock::S2fUser1,
        PeripheralClock::HmcPllRef,
    ];

    /// Position in the counter arrays and in [PeripheralClock::ALL].
    pub fn index(self) -> usize {
        self as usize - 2
    }

    /// PLL group holding the source mux of this counter.
    pub fn mux_group(self) -> PllSelect {
        match self {
            PeripheralClock::S2fUser0 | PeripheralClock::HmcPllRef => PllSelect::Main,
            _ => PllSelect::Peripheral,
        }
    }
}

/// Power of two divider of the NOC derived clocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NocDivider {
    DivideBy1 = 0,
    DivideBy2 = 1,
    DivideBy4 = 2,
    DivideBy8 = 3,
}

impl NocDivider {
    pub fn divide(self, hz: u32) -> u32 {
        hz >> (self as u32)
    }

    pub(crate) fn from_field(value: u32) -> NocDivider {
        match value & 0b11 {
            0 => NocDivider::DivideBy1,
            1 => NocDivider::DivideBy2,
            2 => NocDivider::DivideBy4,
            _ => NocDivider::DivideBy8,
        }
    }
}

/// Dividers from the NOC clock to the L4 buses and the CoreSight clocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NocDividers {
    pub l4_main: NocDivider,
    pub l4_mp: NocDivider,
    /// Slow peripheral bus, clocks the UARTs and timers
    pub l4_sp: NocDivider,
    pub cs_at: NocDivider,
    pub cs_trace: NocDivider,
    pub cs_pdbg: NocDivider,
}

/// Which EMAC counter clock an Ethernet controller runs from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmacClockSelect {
    EmacA = 0,
    EmacB = 1,
}

/// Requested frequency of the MPU or NOC clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockRequest {
    pub source: ClockSource,
    pub target_hz: u32,
}

/// Requested frequency of a peripheral counter clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeripheralClockRequest {
    pub clock: PeripheralClock,
    pub source: ClockSource,
    pub target_hz: u32,
    /// When false, an unreachable frequency is reported and the clock is
    /// left at its reset state instead of failing the bring-up.
    pub required: bool,
}

/// Accepted deviation of an achieved frequency from its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tolerance {
    ppm: u32,
}

impl Tolerance {
    /// 1%
    pub const DEFAULT: Tolerance = Tolerance::from_ppm(10_000);
    pub const EXACT: Tolerance = Tolerance::from_ppm(0);

    pub const fn from_ppm(ppm: u32) -> Tolerance {
        Tolerance { ppm }
    }

    pub fn ppm(self) -> u32 {
        self.ppm
    }

    pub fn allows(self, target_hz: u32, achieved_hz: u32) -> bool {
        let deviation = u64::from(target_hz.abs_diff(achieved_hz));
        deviation * 1_000_000 <= u64::from(target_hz) * u64::from(self.ppm)
    }
}

/// The complete clock tree of a board.
#[derive(Clone, Copy, Debug)]
pub struct BoardConfig {
    /// External oscillator frequency
    pub osc1_hz: u32,
    /// Internal oscillator frequency
    pub intosc_hz: u32,
    /// FPGA free running clock, `None` when the FPGA does not provide one
    pub f2s_free_hz: Option<u32>,
    pub main_pll: PllConfig,
    pub peripheral_pll: PllConfig,
    /// Output of main counter C15, needed when the peripheral PLL is
    /// referenced from the main PLL
    pub periph_ref_hz: Option<u32>,
    pub mpu: ClockRequest,
    pub noc: ClockRequest,
    pub noc_dividers: NocDividers,
    pub peripherals: &'static [PeripheralClockRequest],
    pub emac_select: [EmacClockSelect; 3],
    pub gpio_debounce_div: u32,
    /// Main PLL gates to enable once the tree is configured
    pub main_clock_enables: u32,
    /// Peripheral PLL gates to enable once the tree is configured
    pub peripheral_clock_enables: u32,
    pub tolerance: Tolerance,
}

const fn invalid(reason: &'static str) -> ClockError {
    ClockError::InvalidConfiguration { reason }
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), ClockError> {
        if self.osc1_hz == 0 || self.intosc_hz == 0 || self.f2s_free_hz == Some(0) {
            return Err(invalid("oscillator frequency is zero"));
        }
        self.main_pll.validate(PllSelect::Main)?;
        self.peripheral_pll.validate(PllSelect::Peripheral)?;

        for (pll, config) in [
            (PllSelect::Main, &self.main_pll),
            (PllSelect::Peripheral, &self.peripheral_pll),
        ] {
            let reference_hz = match config.source {
                PllSource::Eosc1 => Some(self.osc1_hz),
                PllSource::IntOsc => Some(self.intosc_hz),
                PllSource::F2s => self.f2s_free_hz,
                PllSource::MainPeriphRef => self.periph_ref_hz,
            }
            .filter(|hz| *hz != 0)
            .ok_or(invalid("PLL reference clock is not provided"))?;
            if config.vco_hz(reference_hz).is_none() {
                return Err(invalid("PLL VCO frequency overflows"));
            }
            log::trace!("{:?} PLL reference {} Hz", pll, reference_hz);
        }

        for request in [&self.mpu, &self.noc] {
            self.check_request(request.source, request.target_hz)?;
        }

        for (position, request) in self.peripherals.iter().enumerate() {
            self.check_request(request.source, request.target_hz)?;
            if self.peripherals[..position]
                .iter()
                .any(|earlier| earlier.clock == request.clock)
            {
                return Err(invalid("peripheral clock requested twice"));
            }
        }

        if self.gpio_debounce_div > 0x00FF_FFFF {
            return Err(invalid("GPIO debounce divider out of range"));
        }
        if self.main_clock_enables & MAINPLL_EN_HW_MANAGED != 0 {
            return Err(invalid("main PLL gate is hardware managed"));
        }
        if self.tolerance.ppm() > 1_000_000 {
            return Err(invalid("tolerance above 100%"));
        }
        Ok(())
    }

    fn check_request(&self, source: ClockSource, target_hz: u32) -> Result<(), ClockError> {
        if target_hz == 0 {
            return Err(invalid("target frequency is zero"));
        }
        if source == ClockSource::Fpga && self.f2s_free_hz.is_none() {
            return Err(invalid("FPGA clock source is not provided"));
        }
        Ok(())
    }
}

const SOCDK_PERIPHERALS: [PeripheralClockRequest; 7] = [
    PeripheralClockRequest {
        clock: PeripheralClock::EmacA,
        source: ClockSource::PeripheralPll,
        target_hz: 250_000_000,
        required: true,
    },
    PeripheralClockRequest {
        clock: PeripheralClock::EmacB,
        source: ClockSource::PeripheralPll,
        target_hz: 50_000_000,
        required: false,
    },
    PeripheralClockRequest {
        clock: PeripheralClock::EmacPtp,
        source: ClockSource::PeripheralPll,
        target_hz: 100_000_000,
        required: false,
    },
    PeripheralClockRequest {
        clock: PeripheralClock::GpioDebounce,
        source: ClockSource::Osc1,
        target_hz: 25_000_000,
        required: false,
    },
    PeripheralClockRequest {
        clock: PeripheralClock::Sdmmc,
        source: ClockSource::PeripheralPll,
        target_hz: 200_000_000,
        required: true,
    },
    PeripheralClockRequest {
        clock: PeripheralClock::S2fUser1,
        source: ClockSource::PeripheralPll,
        target_hz: 100_000_000,
        required: false,
    },
    PeripheralClockRequest {
        clock: PeripheralClock::HmcPllRef,
        source: ClockSource::MainPll,
        target_hz: 100_000_000,
        required: true,
    },
];

/// Clock tree of the Arria 10 SoC development kit.
///
/// Main VCO 2400 MHz, MPU 1200 MHz, NOC 400 MHz, L4 SP 100 MHz, peripheral
/// VCO 1000 MHz.
pub const SOCDK_BOARD: BoardConfig = BoardConfig {
    osc1_hz: 25_000_000,
    intosc_hz: 60_000_000,
    f2s_free_hz: None,
    main_pll: PllConfig::new(PllSource::Eosc1, 96, 1),
    peripheral_pll: PllConfig::new(PllSource::Eosc1, 40, 1),
    periph_ref_hz: None,
    mpu: ClockRequest {
        source: ClockSource::MainPll,
        target_hz: 1_200_000_000,
    },
    noc: ClockRequest {
        source: ClockSource::MainPll,
        target_hz: 400_000_000,
    },
    noc_dividers: NocDividers {
        l4_main: NocDivider::DivideBy1,
        l4_mp: NocDivider::DivideBy2,
        l4_sp: NocDivider::DivideBy4,
        cs_at: NocDivider::DivideBy1,
        cs_trace: NocDivider::DivideBy2,
        cs_pdbg: NocDivider::DivideBy2,
    },
    peripherals: &SOCDK_PERIPHERALS,
    emac_select: [EmacClockSelect::EmacA; 3],
    gpio_debounce_div: 0x1E84,
    main_clock_enables: 0x3F,
    peripheral_clock_enables: super::registers::PERPLL_EN_RESET,
    tolerance: Tolerance::DEFAULT,
};
