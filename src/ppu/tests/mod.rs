//! PPU unit tests
//!
//! Organized by functionality. Every test drives the PPU through a `Rig`
//! that owns 8KB of CHR-RAM standing in for the cartridge.

use super::*;

// ========================================
// Test Constants (PPU Register Addresses)
// ========================================

/// PPU Control Register ($2000) - Write only
pub(crate) const PPUCTRL: u16 = 0x2000;
/// PPU Mask Register ($2001) - Write only
pub(crate) const PPUMASK: u16 = 0x2001;
/// PPU Status Register ($2002) - Read only
pub(crate) const PPUSTATUS: u16 = 0x2002;
/// OAM Address Port ($2003) - Write only
pub(crate) const OAMADDR: u16 = 0x2003;
/// OAM Data Port ($2004) - Read/Write
pub(crate) const OAMDATA: u16 = 0x2004;
/// Scroll Position Register ($2005) - Write×2
pub(crate) const PPUSCROLL: u16 = 0x2005;
/// PPU Address Register ($2006) - Write×2
pub(crate) const PPUADDR: u16 = 0x2006;
/// PPU Data Port ($2007) - Read/Write
pub(crate) const PPUDATA: u16 = 0x2007;

// ========================================
// Test Helpers
// ========================================

/// 8KB of CHR-RAM with a scanline counter that fires every `irq_every` ticks
pub(crate) struct ChrRam {
    pub data: Vec<u8>,
    pub ticks: u32,
    pub irq_every: Option<u32>,
}

impl ChrRam {
    pub fn new() -> Self {
        ChrRam {
            data: vec![0; 0x2000],
            ticks: 0,
            irq_every: None,
        }
    }
}

impl ChrBus for ChrRam {
    fn chr_read(&self, address: u16) -> Result<u8, MapperError> {
        Ok(self.data[(address & 0x1FFF) as usize])
    }

    fn chr_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        self.data[(address & 0x1FFF) as usize] = value;
        Ok(())
    }

    fn scanline_tick(&mut self) -> bool {
        self.ticks += 1;
        matches!(self.irq_every, Some(n) if self.ticks.is_multiple_of(n))
    }
}

/// PPU plus cartridge stand-in and an interrupt log
pub(crate) struct Rig {
    pub ppu: Ppu,
    pub chr: ChrRam,
    pub interrupts: Vec<Interrupt>,
}

impl Rig {
    pub fn new() -> Self {
        Rig {
            ppu: Ppu::new(),
            chr: ChrRam::new(),
            interrupts: Vec::new(),
        }
    }

    pub fn write(&mut self, address: u16, data: u8) {
        self.ppu
            .write_register(address, data, &mut self.chr)
            .expect("CHR-RAM write");
    }

    pub fn read(&mut self, address: u16) -> u8 {
        self.ppu
            .read_register(address, &self.chr)
            .expect("CHR-RAM read")
    }

    /// Point v at `address` through PPUADDR
    pub fn set_address(&mut self, address: u16) {
        self.write(PPUADDR, (address >> 8) as u8);
        self.write(PPUADDR, address as u8);
    }

    /// Write a run of bytes through PPUDATA starting at `address`
    pub fn poke(&mut self, address: u16, bytes: &[u8]) {
        self.set_address(address);
        for &byte in bytes {
            self.write(PPUDATA, byte);
        }
    }

    /// Advance one dot; returns whether a frame completed
    pub fn step(&mut self) -> bool {
        let interrupts = &mut self.interrupts;
        self.ppu
            .step(&mut self.chr, &mut |kind| interrupts.push(kind))
            .expect("CHR-RAM step")
    }

    pub fn run(&mut self, dots: u32) -> u32 {
        let mut frames = 0;
        for _ in 0..dots {
            if self.step() {
                frames += 1;
            }
        }
        frames
    }

    /// Step until the PPU sits at the given position
    pub fn run_to(&mut self, scanline: i16, cycle: u16) {
        let mut guard = 0;
        while self.ppu.scanline() != scanline || self.ppu.cycle() != cycle {
            self.step();
            guard += 1;
            assert!(guard <= CYCLES_PER_FRAME, "position never reached");
        }
    }

    /// Step through one whole frame, ending back at the pre-render line
    pub fn run_frame(&mut self) {
        self.run(CYCLES_PER_FRAME);
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.ppu.frame_buffer()[y * SCREEN_WIDTH + x]
    }

    /// Define tile `tile` of pattern table `table` as a solid block of `color_index`
    pub fn solid_tile(&mut self, table: u16, tile: u8, color_index: u8) {
        let base = (table + tile as u16 * 16) as usize;
        let low = if color_index & 1 != 0 { 0xFF } else { 0x00 };
        let high = if color_index & 2 != 0 { 0xFF } else { 0x00 };
        self.chr.data[base..base + 8].fill(low);
        self.chr.data[base + 8..base + 16].fill(high);
    }

    /// Place a sprite in OAM
    pub fn sprite(&mut self, index: usize, y: u8, tile: u8, attributes: u8, x: u8) {
        self.ppu.oam[index * 4..index * 4 + 4].copy_from_slice(&[y, tile, attributes, x]);
    }
}

// ========================================
// Test Modules
// ========================================
