// PPU module - Picture Processing Unit (2C02) emulation
//
// The PPU is driven one dot at a time by the emulator loop. Pattern-table
// accesses go through a `ChrBus` (the cartridge mapper), everything else
// lives in PPU-owned memory: 2-4KB of nametable VRAM, 32 bytes of palette
// RAM and 256 bytes of OAM.

mod constants;
mod memory;
pub mod palette;
mod registers;
mod rendering;

#[cfg(test)]
mod tests;

pub use constants::{
    CYCLES_PER_FRAME, CYCLES_PER_SCANLINE, SCANLINES_PER_FRAME, SCREEN_HEIGHT, SCREEN_WIDTH,
};

use crate::cartridge::{Mapper, MapperError, Mirroring};
use crate::cpu::Interrupt;
use constants::*;
use serde::{Deserialize, Serialize};

/// Pattern-table side of the cartridge as seen by the PPU
///
/// The PPU never owns the mapper; the bus lends it for each access so that
/// mapper bank switches made by the CPU are visible on the next fetch.
pub trait ChrBus {
    /// Read CHR memory at $0000-$1FFF
    fn chr_read(&self, address: u16) -> Result<u8, MapperError>;

    /// Write CHR memory at $0000-$1FFF
    fn chr_write(&mut self, address: u16, value: u8) -> Result<(), MapperError>;

    /// Per-scanline clock; true raises an IRQ
    fn scanline_tick(&mut self) -> bool {
        false
    }
}

impl ChrBus for Mapper {
    fn chr_read(&self, address: u16) -> Result<u8, MapperError> {
        self.ppu_read(address)
    }

    fn chr_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        self.ppu_write(address, value)
    }

    fn scanline_tick(&mut self) -> bool {
        self.tick()
    }
}

/// An empty cartridge slot reads as zero and ignores writes
impl ChrBus for Option<Mapper> {
    fn chr_read(&self, address: u16) -> Result<u8, MapperError> {
        match self {
            Some(mapper) => mapper.chr_read(address),
            None => Ok(0),
        }
    }

    fn chr_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        match self {
            Some(mapper) => mapper.chr_write(address, value),
            None => Ok(()),
        }
    }

    fn scanline_tick(&mut self) -> bool {
        match self {
            Some(mapper) => mapper.scanline_tick(),
            None => false,
        }
    }
}

/// Serializable snapshot of every piece of PPU state except the frame buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpuState {
    pub ctrl: u8,
    pub mask: u8,
    pub status: u8,
    pub oam_addr: u8,
    pub v: u16,
    pub t: u16,
    pub fine_x: u8,
    pub write_latch: bool,
    pub read_buffer: u8,
    pub open_bus: u8,
    pub nmi_pending: bool,
    pub cycle: u16,
    pub scanline: i16,
    pub frame: u64,
    pub vram: Vec<u8>,
    pub palette: Vec<u8>,
    pub oam: Vec<u8>,
    pub mirroring: Mirroring,
}

impl PpuState {
    /// Whether the memory blocks have the sizes the PPU expects
    pub fn sizes_valid(&self) -> bool {
        self.vram.len() == VRAM_SIZE
            && self.palette.len() == PALETTE_SIZE
            && self.oam.len() == OAM_SIZE
    }
}

/// PPU structure representing the Picture Processing Unit state
pub struct Ppu {
    // ========================================
    // CPU-visible registers
    // ========================================
    /// $2000 PPUCTRL
    pub(crate) ctrl: u8,
    /// $2001 PPUMASK
    pub(crate) mask: u8,
    /// $2002 PPUSTATUS (only bits 5-7 are meaningful)
    pub(crate) status: u8,
    /// $2003 OAMADDR
    pub(crate) oam_addr: u8,

    // ========================================
    // Internal scroll registers (loopy)
    // ========================================
    /// Current VRAM address (15 bits)
    pub(crate) v: u16,
    /// Temporary VRAM address (15 bits)
    pub(crate) t: u16,
    /// Fine X scroll (3 bits)
    pub(crate) fine_x: u8,
    /// Shared first/second write toggle for $2005/$2006
    pub(crate) write_latch: bool,

    /// PPUDATA read buffer
    read_buffer: u8,
    /// Last value driven on the PPU data bus
    open_bus: u8,
    /// NMI enabled while VBlank was already set; delivered on the next step
    nmi_pending: bool,

    // ========================================
    // Memory
    // ========================================
    vram: [u8; VRAM_SIZE],
    palette: [u8; PALETTE_SIZE],
    pub(crate) oam: [u8; OAM_SIZE],
    mirroring: Mirroring,

    // ========================================
    // Timing
    // ========================================
    cycle: u16,
    scanline: i16,
    frame: u64,

    // ========================================
    // Output
    // ========================================
    frame_buffer: Vec<u32>,
    /// Forces grayscale regardless of PPUMASK bit 0
    grayscale_override: bool,
}

impl Ppu {
    /// Create a new PPU instance positioned at the start of the pre-render line
    pub fn new() -> Self {
        Ppu {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            write_latch: false,
            read_buffer: 0,
            open_bus: 0,
            nmi_pending: false,
            vram: [0; VRAM_SIZE],
            palette: [0; PALETTE_SIZE],
            oam: [0; OAM_SIZE],
            mirroring: Mirroring::Horizontal,
            cycle: 0,
            scanline: PRERENDER_SCANLINE,
            frame: 0,
            frame_buffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            grayscale_override: false,
        }
    }

    /// Return the PPU to its power-on register state
    ///
    /// VRAM, palette and OAM contents survive, as they do on hardware.
    pub fn reset(&mut self) {
        self.ctrl = 0;
        self.mask = 0;
        self.status = 0;
        self.v = 0;
        self.t = 0;
        self.fine_x = 0;
        self.write_latch = false;
        self.read_buffer = 0;
        self.nmi_pending = false;
        self.cycle = 0;
        self.scanline = PRERENDER_SCANLINE;
    }

    // ========================================
    // Timing
    // ========================================

    /// Advance the PPU by one dot
    ///
    /// # Arguments
    ///
    /// * `chr` - Pattern-table memory and scanline counter of the cartridge
    /// * `on_interrupt` - Receives NMI at the start of VBlank and IRQ from
    ///   the mapper's scanline counter
    ///
    /// # Returns
    ///
    /// `true` when this dot completed a frame
    ///
    /// # Errors
    ///
    /// Propagates mapper errors from pattern-table fetches.
    pub fn step(
        &mut self,
        chr: &mut dyn ChrBus,
        on_interrupt: &mut dyn FnMut(Interrupt),
    ) -> Result<bool, MapperError> {
        if self.nmi_pending {
            self.nmi_pending = false;
            on_interrupt(Interrupt::Nmi);
        }

        let mut frame_complete = false;
        self.cycle += 1;
        if self.cycle >= CYCLES_PER_SCANLINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline > LAST_SCANLINE {
                self.scanline = PRERENDER_SCANLINE;
                self.frame = self.frame.wrapping_add(1);
                frame_complete = true;
            }
        }

        match self.scanline {
            PRERENDER_SCANLINE => self.step_prerender(),
            0..=LAST_VISIBLE_SCANLINE => self.step_visible(chr)?,
            FIRST_VBLANK_SCANLINE if self.cycle == 1 => {
                self.status |= status::VBLANK;
                if self.ctrl & ctrl::NMI_ENABLE != 0 {
                    on_interrupt(Interrupt::Nmi);
                }
            }
            _ => {}
        }

        if self.cycle == MAPPER_TICK_CYCLE
            && (PRERENDER_SCANLINE..=LAST_VISIBLE_SCANLINE).contains(&self.scanline)
            && chr.scanline_tick()
        {
            on_interrupt(Interrupt::Irq);
        }

        Ok(frame_complete)
    }

    fn step_prerender(&mut self) {
        if !self.rendering_enabled() {
            return;
        }
        if self.cycle == 1 {
            self.status &= !(status::VBLANK | status::SPRITE_OVERFLOW | status::SPRITE_ZERO_HIT);
        } else if self.cycle == COPY_HORIZONTAL_CYCLE {
            self.copy_horizontal_bits();
        } else if COPY_VERTICAL_CYCLES.contains(&self.cycle) {
            self.copy_vertical_bits();
        }
    }

    fn step_visible(&mut self, chr: &mut dyn ChrBus) -> Result<(), MapperError> {
        match self.cycle {
            0 => self.render_scanline(&*chr)?,
            INCREMENT_Y_CYCLE if self.rendering_enabled() => self.increment_y(),
            COPY_HORIZONTAL_CYCLE if self.rendering_enabled() => self.copy_horizontal_bits(),
            _ => {}
        }
        Ok(())
    }

    /// Whether background or sprite rendering is on
    pub fn rendering_enabled(&self) -> bool {
        self.mask & (mask::SHOW_BACKGROUND | mask::SHOW_SPRITES) != 0
    }

    /// Get the current scanline (-1 to 260)
    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    /// Get the current dot within the scanline (0-340)
    pub fn cycle(&self) -> u16 {
        self.cycle
    }

    /// Get the number of completed frames
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether the VBlank flag is currently set
    pub fn in_vblank(&self) -> bool {
        self.status & status::VBLANK != 0
    }

    /// Get the frame buffer as 0x00RRGGBB pixels, row-major
    pub fn frame_buffer(&self) -> &[u32] {
        &self.frame_buffer
    }

    pub fn set_grayscale_override(&mut self, enabled: bool) {
        self.grayscale_override = enabled;
    }

    // ========================================
    // Mirroring
    // ========================================

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Change the nametable arrangement
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        if self.mirroring != mirroring {
            log::debug!("PPU mirroring {:?} -> {:?}", self.mirroring, mirroring);
            self.mirroring = mirroring;
        }
    }

    // ========================================
    // Snapshot
    // ========================================

    pub fn state(&self) -> PpuState {
        PpuState {
            ctrl: self.ctrl,
            mask: self.mask,
            status: self.status,
            oam_addr: self.oam_addr,
            v: self.v,
            t: self.t,
            fine_x: self.fine_x,
            write_latch: self.write_latch,
            read_buffer: self.read_buffer,
            open_bus: self.open_bus,
            nmi_pending: self.nmi_pending,
            cycle: self.cycle,
            scanline: self.scanline,
            frame: self.frame,
            vram: self.vram.to_vec(),
            palette: self.palette.to_vec(),
            oam: self.oam.to_vec(),
            mirroring: self.mirroring,
        }
    }

    /// Restore a snapshot taken with [`Ppu::state`]
    ///
    /// Callers check [`PpuState::sizes_valid`] first.
    pub fn restore_state(&mut self, state: &PpuState) {
        debug_assert!(state.sizes_valid());
        self.ctrl = state.ctrl;
        self.mask = state.mask;
        self.status = state.status;
        self.oam_addr = state.oam_addr;
        self.v = state.v;
        self.t = state.t;
        self.fine_x = state.fine_x;
        self.write_latch = state.write_latch;
        self.read_buffer = state.read_buffer;
        self.open_bus = state.open_bus;
        self.nmi_pending = state.nmi_pending;
        self.cycle = state.cycle;
        self.scanline = state.scanline;
        self.frame = state.frame;
        self.vram.copy_from_slice(&state.vram);
        self.palette.copy_from_slice(&state.palette);
        self.oam.copy_from_slice(&state.oam);
        self.mirroring = state.mirroring;
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
