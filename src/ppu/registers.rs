// PPU register handling

use super::constants::{ctrl, status, PPU_REGISTER_MASK};
use super::{ChrBus, Ppu};
use crate::cartridge::MapperError;

impl Ppu {
    /// Read from a PPU register
    ///
    /// # Arguments
    ///
    /// * `address` - Any CPU address in $2000-$3FFF; only the low 3 bits matter
    /// * `chr` - Pattern-table memory for PPUDATA reads below $2000
    ///
    /// # Register Behaviors
    ///
    /// - PPUSTATUS ($2002): Returns status, clears VBlank flag and address latch
    /// - OAMDATA ($2004): Returns OAM data at current OAM address (no increment)
    /// - PPUDATA ($2007): Returns buffered PPU data (palette reads are immediate)
    /// - Write-only registers: Return the open-bus latch
    pub fn read_register(&mut self, address: u16, chr: &dyn ChrBus) -> Result<u8, MapperError> {
        let value = match address & PPU_REGISTER_MASK {
            2 => {
                // Low 5 bits are not driven by PPUSTATUS
                let value = (self.status & 0xE0) | (self.open_bus & 0x1F);
                self.status &= !status::VBLANK;
                self.write_latch = false;
                value
            }
            4 => self.oam[self.oam_addr as usize],
            7 => {
                let addr = self.v & 0x3FFF;
                let value = if addr >= 0x3F00 {
                    // The buffer picks up the nametable byte "underneath" the palette
                    self.read_buffer = self.read_memory(addr & 0x2FFF, chr)?;
                    self.read_memory(addr, chr)?
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.read_memory(addr, chr)?;
                    buffered
                };
                self.increment_vram_address();
                value
            }
            _ => self.open_bus,
        };

        self.open_bus = value;
        Ok(value)
    }

    /// Write to a PPU register
    ///
    /// # Register Behaviors
    ///
    /// - PPUCTRL ($2000): Stores control flags and updates nametable select in t
    /// - PPUMASK ($2001): Stores mask flags
    /// - OAMADDR ($2003): Sets OAM address
    /// - OAMDATA ($2004): Writes to OAM and increments address
    /// - PPUSCROLL ($2005): Sets scroll position (two writes, updates t and x)
    /// - PPUADDR ($2006): Sets PPU address (two writes, updates t then v)
    /// - PPUDATA ($2007): Writes to PPU memory and increments v
    /// - PPUSTATUS ($2002): Read-only, writes only reach the open-bus latch
    pub fn write_register(
        &mut self,
        address: u16,
        data: u8,
        chr: &mut dyn ChrBus,
    ) -> Result<(), MapperError> {
        self.open_bus = data;

        match address & PPU_REGISTER_MASK {
            0 => {
                let was_enabled = self.ctrl & ctrl::NMI_ENABLE != 0;
                self.ctrl = data;

                // t: ...GH.. ........ <- d: ......GH
                self.t = (self.t & 0xF3FF) | (((data & ctrl::NAMETABLE) as u16) << 10);

                // Enabling NMI during VBlank raises one immediately
                let enabled = data & ctrl::NMI_ENABLE != 0;
                if !was_enabled && enabled && self.in_vblank() {
                    self.nmi_pending = true;
                } else if !enabled {
                    self.nmi_pending = false;
                }
            }
            1 => self.mask = data,
            2 => {}
            3 => self.oam_addr = data,
            4 => self.write_oam_dma(data),
            5 => {
                if !self.write_latch {
                    // t: ....... ...ABCDE <- d: ABCDEFGH
                    // x:              FGH <- d: ABCDEFGH
                    self.t = (self.t & 0xFFE0) | ((data as u16) >> 3);
                    self.fine_x = data & 0x07;
                } else {
                    // t: FGH..AB CDE..... <- d: ABCDEFGH
                    self.t = (self.t & 0x8FFF) | (((data as u16) & 0x07) << 12);
                    self.t = (self.t & 0xFC1F) | (((data as u16) & 0xF8) << 2);
                }
                self.write_latch = !self.write_latch;
            }
            6 => {
                if !self.write_latch {
                    // t: .CDEFGH ........ <- d: ..CDEFGH
                    // t: X...... ........ <- 0
                    self.t = (self.t & 0x80FF) | (((data as u16) & 0x3F) << 8);
                } else {
                    // t: ....... ABCDEFGH <- d: ABCDEFGH
                    // v: <...all bits...> <- t: <...all bits...>
                    self.t = (self.t & 0xFF00) | (data as u16);
                    self.v = self.t;
                }
                self.write_latch = !self.write_latch;
            }
            7 => {
                self.write_memory(self.v & 0x3FFF, data, chr)?;
                self.increment_vram_address();
            }
            _ => unreachable!("register index is masked to 3 bits"),
        }

        Ok(())
    }

    /// Store one OAM byte at OAMADDR and advance it
    ///
    /// Used by OAMDATA writes and by the bus during OAM DMA.
    pub fn write_oam_dma(&mut self, data: u8) {
        self.oam[self.oam_addr as usize] = data;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    fn increment_vram_address(&mut self) {
        let increment = if self.ctrl & ctrl::INCREMENT_32 != 0 {
            32
        } else {
            1
        };
        self.v = self.v.wrapping_add(increment) & 0x3FFF;
    }

    // ========================================
    // Loopy scroll updates used while rendering
    // ========================================

    /// Advance coarse X, switching horizontal nametable on wrap
    pub(super) fn increment_coarse_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= !0x001F;
            self.v ^= 0x0400;
        } else {
            self.v += 1;
        }
    }

    /// Advance fine Y, carrying into coarse Y and the vertical nametable
    pub(super) fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }

        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        if coarse_y == 29 {
            coarse_y = 0;
            self.v ^= 0x0800;
        } else if coarse_y == 31 {
            // Rows 30-31 hold attributes; wrapping from them skips the table switch
            coarse_y = 0;
        } else {
            coarse_y += 1;
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    /// v: ....A.. ...BCDEF <- t: ....A.. ...BCDEF
    pub(super) fn copy_horizontal_bits(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    /// v: GHIA.BC DEF..... <- t: GHIA.BC DEF.....
    pub(super) fn copy_vertical_bits(&mut self) {
        self.v = (self.v & !0x7BE0) | (self.t & 0x7BE0);
    }
}
