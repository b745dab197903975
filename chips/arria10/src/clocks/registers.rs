// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Clock manager register map.
//!
//! The whole block lives at a single fixed physical address. Offsets and
//! field positions follow the Arria 10 hard processor system technical
//! reference manual.

use tock_registers::fields::Field;
use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

use crate::static_ref::StaticRef;

use super::config::PllSelect;

register_structs! {
    /// Registers shared in layout by the main and peripheral PLL groups
    pub PllGroupRegisters {
        /// VCO control register 0
        (0x00 => pub vco0: ReadWrite<u32, VCO0::Register>),
        /// VCO control register 1
        (0x04 => pub vco1: ReadWrite<u32, VCO1::Register>),
        /// Clock gate enables
        (0x08 => pub en: ReadWrite<u32>),
        /// Clock gate enable set
        (0x0C => pub ens: WriteOnly<u32>),
        /// Clock gate enable reset
        (0x10 => pub enr: WriteOnly<u32>),
        /// Bypass control
        (0x14 => pub bypass: ReadWrite<u32>),
        /// Bypass set
        (0x18 => pub bypasss: WriteOnly<u32>),
        /// Bypass reset
        (0x1C => pub bypassr: WriteOnly<u32>),
        (0x20 => @END),
    }
}

register_structs! {
    /// Clock Manager
    pub ClockManagerRegisters {
        /// Control register
        (0x000 => pub ctrl: ReadWrite<u32, CTRL::Register>),
        /// Interrupt status, write one to clear
        (0x004 => pub intr: ReadWrite<u32, INTR::Register>),
        (0x008 => _reserved0),
        /// Status register
        (0x01C => pub stat: ReadOnly<u32, STAT::Register>),
        (0x020 => _reserved1),
        /// Main PLL group
        (0x040 => pub main_pll: PllGroupRegisters),
        /// MPU clock source select and post divider
        (0x060 => pub mpuclk: ReadWrite<u32, CLKSEL::Register>),
        /// NOC clock source select and post divider
        (0x064 => pub nocclk: ReadWrite<u32, CLKSEL::Register>),
        /// Main PLL counters C2 to C9
        (0x068 => pub main_cntr: [ReadWrite<u32, CNTR::Register>; 8]),
        (0x088 => _reserved2),
        /// Main PLL counter C15, peripheral PLL reference
        (0x09C => pub main_cntr15: ReadWrite<u32, CNTR::Register>),
        (0x0A0 => _reserved3),
        /// NOC derived clock dividers
        (0x0A8 => pub nocdiv: ReadWrite<u32, NOCDIV::Register>),
        (0x0AC => _reserved4),
        /// Peripheral PLL group
        (0x0C0 => pub peripheral_pll: PllGroupRegisters),
        (0x0E0 => _reserved5),
        /// Peripheral PLL counters C2 to C9
        (0x0E8 => pub peri_cntr: [ReadWrite<u32, CNTR::Register>; 8]),
        (0x108 => _reserved6),
        /// EMAC clock selects
        (0x128 => pub emacctl: ReadWrite<u32, EMACCTL::Register>),
        /// GPIO debounce divider
        (0x12C => pub gpiodiv: ReadWrite<u32, GPIODIV::Register>),
        (0x130 => _reserved7),
        /// MPU counter dividers for each PLL
        (0x140 => pub altr_mpuclk: ReadWrite<u32, ALTR_CNT::Register>),
        /// NOC counter dividers for each PLL
        (0x144 => pub altr_nocclk: ReadWrite<u32, ALTR_CNT::Register>),
        (0x148 => @END),
    }
}

register_bitfields![u32,
    pub CTRL [
        /// Boot (safe) mode, all clocks run from the boot clock
        BOOTMOD OFFSET(0) NUMBITS(1) [],
        /// Boot clock source
        BOOTCLK OFFSET(8) NUMBITS(2) []
    ],
    pub INTR [
        MAINPLLACHIEVED OFFSET(0) NUMBITS(1) [],
        PERPLLACHIEVED OFFSET(1) NUMBITS(1) [],
        MAINPLLLOST OFFSET(2) NUMBITS(1) [],
        PERPLLLOST OFFSET(3) NUMBITS(1) [],
        MAINPLLRFSLIP OFFSET(8) NUMBITS(1) [],
        PERPLLRFSLIP OFFSET(9) NUMBITS(1) [],
        MAINPLLFBSLIP OFFSET(10) NUMBITS(1) [],
        PERPLLFBSLIP OFFSET(11) NUMBITS(1) []
    ],
    pub STAT [
        /// Clock manager state machine is applying a change
        BUSY OFFSET(0) NUMBITS(1) [],
        MAINPLLLOCKED OFFSET(8) NUMBITS(1) [],
        PERPLLLOCKED OFFSET(9) NUMBITS(1) [],
        BOOTCLKSRC OFFSET(17) NUMBITS(1) []
    ],
    pub VCO0 [
        /// Bandgap power down
        BGPWRDN OFFSET(0) NUMBITS(1) [],
        PWRDN OFFSET(1) NUMBITS(1) [],
        EN OFFSET(2) NUMBITS(1) [],
        /// Reset all PLL output counters
        OUTRSTALL OFFSET(3) NUMBITS(1) [],
        /// External regulator select
        REGEXTSEL OFFSET(4) NUMBITS(1) [],
        /// Reference clock source
        PSRC OFFSET(8) NUMBITS(2) [
            Eosc1 = 0,
            IntOsc = 1,
            F2s = 2,
            MainPeriphRef = 3
        ]
    ],
    pub VCO1 [
        /// Feedback divider, numerator minus one
        NUMER OFFSET(0) NUMBITS(13) [],
        /// Reference divider, denominator minus one
        DENOM OFFSET(16) NUMBITS(6) []
    ],
    pub CLKSEL [
        /// Post divider minus one, applies to non PLL sources
        CNT OFFSET(0) NUMBITS(10) [],
        SRC OFFSET(16) NUMBITS(3) [
            MainPll = 0,
            PeripheralPll = 1,
            Osc1 = 2,
            IntOsc = 3,
            Fpga = 4
        ]
    ],
    pub CNTR [
        /// Counter divider minus one
        CNT OFFSET(0) NUMBITS(10) [],
        /// Source mux, only present on some counters
        SRC OFFSET(16) NUMBITS(3) [
            MainPll = 0,
            PeripheralPll = 1,
            Osc1 = 2,
            IntOsc = 3,
            Fpga = 4
        ]
    ],
    pub ALTR_CNT [
        /// Divider minus one when sourced from the main PLL
        MAINCNT OFFSET(0) NUMBITS(10) [],
        /// Divider minus one when sourced from the peripheral PLL
        PERICNT OFFSET(16) NUMBITS(10) []
    ],
    pub NOCDIV [
        L4MAINCLK OFFSET(0) NUMBITS(2) [],
        L4MPCLK OFFSET(8) NUMBITS(2) [],
        L4SPCLK OFFSET(16) NUMBITS(2) [],
        CSATCLK OFFSET(24) NUMBITS(2) [],
        CSTRACECLK OFFSET(26) NUMBITS(2) [],
        CSPDBGCLK OFFSET(28) NUMBITS(2) []
    ],
    pub EMACCTL [
        EMAC0SEL OFFSET(26) NUMBITS(1) [],
        EMAC1SEL OFFSET(27) NUMBITS(1) [],
        EMAC2SEL OFFSET(28) NUMBITS(1) []
    ],
    pub GPIODIV [
        /// GPIO debounce clock divider
        GPIODBCLK OFFSET(0) NUMBITS(24) []
    ]
];

pub const CLKMGR_BASE: StaticRef<ClockManagerRegisters> =
    unsafe { StaticRef::new(0xFFD0_4000 as *const ClockManagerRegisters) };

/// All main PLL output counters held in bypass.
pub const MAINPLL_BYPASS_ALL: u32 = 0x3F;
/// All peripheral PLL output counters held in bypass.
pub const PERPLL_BYPASS_ALL: u32 = 0xFF;

/// Main PLL gates owned by hardware, never touched by software.
pub const MAINPLL_EN_HW_MANAGED: u32 = (1 << 6) | (1 << 7);
/// Peripheral PLL gate enables after reset.
pub const PERPLL_EN_RESET: u32 = 0xF7F;

/// Largest value of the 10-bit counter dividers.
pub const COUNTER_DIVIDER_MAX: u32 = 1 << 10;
/// Largest VCO numerator (13-bit field, stored minus one).
pub const VCO_NUMERATOR_MAX: u16 = 1 << 13;
/// Largest VCO denominator (6-bit field, stored minus one).
pub const VCO_DENOMINATOR_MAX: u8 = 1 << 6;

impl ClockManagerRegisters {
    pub(crate) fn group(&self, pll: PllSelect) -> &PllGroupRegisters {
        match pll {
            PllSelect::Main => &self.main_pll,
            PllSelect::Peripheral => &self.peripheral_pll,
        }
    }
}

impl PllSelect {
    pub(crate) fn lock_field(self) -> Field<u32, STAT::Register> {
        match self {
            PllSelect::Main => STAT::MAINPLLLOCKED,
            PllSelect::Peripheral => STAT::PERPLLLOCKED,
        }
    }

    pub(crate) fn bypass_mask(self) -> u32 {
        match self {
            PllSelect::Main => MAINPLL_BYPASS_ALL,
            PllSelect::Peripheral => PERPLL_BYPASS_ALL,
        }
    }

    /// Sticky lost-lock and slip bits for this PLL.
    pub(crate) fn status_bits(self) -> u32 {
        match self {
            PllSelect::Main => (INTR::MAINPLLLOST::SET
                + INTR::MAINPLLRFSLIP::SET
                + INTR::MAINPLLFBSLIP::SET)
                .value,
            PllSelect::Peripheral => (INTR::PERPLLLOST::SET
                + INTR::PERPLLRFSLIP::SET
                + INTR::PERPLLFBSLIP::SET)
                .value,
        }
    }
}
