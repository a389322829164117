// Common test utilities for integration tests
//
// Integration tests build iNES images in memory instead of shipping ROM
// files. `RomBuilder` lays out a header, PRG pages and CHR pages, and lets a
// test drop 6502 code and vectors at CPU addresses.

#![allow(dead_code)]

use nes_machine::{Emulator, EmulatorConfig};

pub const PRG_PAGE: usize = 16 * 1024;
pub const CHR_PAGE: usize = 8 * 1024;

/// In-memory iNES image builder
pub struct RomBuilder {
    mapper: u8,
    flags6: u8,
    prg: Vec<u8>,
    chr: Vec<u8>,
}

impl RomBuilder {
    /// `prg_pages` 16KB pages filled with NOP and `chr_pages` 8KB pages
    /// (0 selects CHR-RAM)
    pub fn new(mapper: u8, prg_pages: usize, chr_pages: usize) -> Self {
        RomBuilder {
            mapper,
            flags6: 0,
            prg: vec![0xEA; prg_pages * PRG_PAGE],
            chr: vec![0; chr_pages * CHR_PAGE],
        }
    }

    pub fn vertical(mut self) -> Self {
        self.flags6 |= 0x01;
        self
    }

    pub fn with_prg_ram(mut self) -> Self {
        self.flags6 |= 0x02;
        self
    }

    /// Fill every byte of a PRG page with `value`
    pub fn fill_prg_page(mut self, page: usize, value: u8) -> Self {
        self.prg[page * PRG_PAGE..(page + 1) * PRG_PAGE].fill(value);
        self
    }

    /// Fill every byte of a CHR page with `value`
    pub fn fill_chr_page(mut self, page: usize, value: u8) -> Self {
        self.chr[page * CHR_PAGE..(page + 1) * CHR_PAGE].fill(value);
        self
    }

    /// Write bytes at an offset into PRG data
    pub fn prg_at(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.prg[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Write bytes at an offset into CHR data
    pub fn chr_at(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.chr[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Place code in the last 16KB PRG page, which every supported mapper
    /// keeps at $C000 at power-on
    pub fn code_at(self, address: u16, bytes: &[u8]) -> Self {
        assert!(address >= 0xC000, "fixed page code must live at $C000-$FFFF");
        let offset = self.prg.len() - PRG_PAGE + (address - 0xC000) as usize;
        self.prg_at(offset, bytes)
    }

    /// Set NMI, RESET and IRQ vectors
    pub fn vectors(self, nmi: u16, reset: u16, irq: u16) -> Self {
        let mut bytes = Vec::with_capacity(6);
        for vector in [nmi, reset, irq] {
            bytes.extend_from_slice(&vector.to_le_bytes());
        }
        self.code_at(0xFFFA, &bytes)
    }

    pub fn build(&self) -> Vec<u8> {
        let prg_pages = (self.prg.len() / PRG_PAGE) as u8;
        let chr_pages = (self.chr.len() / CHR_PAGE) as u8;
        let mut rom = vec![
            b'N',
            b'E',
            b'S',
            0x1A,
            prg_pages,
            chr_pages,
            ((self.mapper & 0x0F) << 4) | self.flags6,
            self.mapper & 0xF0,
        ];
        rom.resize(16, 0);
        rom.extend_from_slice(&self.prg);
        rom.extend_from_slice(&self.chr);
        rom
    }
}

/// Emulator with default configuration running `rom`
pub fn boot(rom: &[u8]) -> Emulator {
    let mut emulator = Emulator::with_config(EmulatorConfig::default());
    emulator.load_rom(rom, None).expect("ROM loads");
    emulator
}

/// Run whole instructions until `cycles` CPU cycles have elapsed
pub fn run_cycles(emulator: &mut Emulator, cycles: u64) {
    let target = emulator.cpu().cycles + cycles;
    while emulator.cpu().cycles < target {
        emulator.step().expect("step succeeds");
    }
}
