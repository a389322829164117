// PPU memory access methods

use super::constants::NAMETABLE_SIZE;
use super::{ChrBus, Ppu};
use crate::cartridge::MapperError;

impl Ppu {
    /// Map a nametable address to its VRAM offset
    ///
    /// The four logical tables at $2000/$2400/$2800/$2C00 are looked up in
    /// the current mirroring's table map. $3000-$3EFF aliases $2000-$2EFF.
    pub(super) fn mirror_nametable_addr(&self, addr: u16) -> usize {
        let addr = (addr & 0x0FFF) as usize;
        let table = addr / NAMETABLE_SIZE;
        let offset = addr % NAMETABLE_SIZE;

        self.mirroring.nametable_map()[table] * NAMETABLE_SIZE + offset
    }

    /// Mirror palette address
    ///
    /// Palette RAM repeats every 32 bytes, and $3F10/$3F14/$3F18/$3F1C alias
    /// $3F00/$3F04/$3F08/$3F0C.
    pub(super) fn mirror_palette_addr(&self, addr: u16) -> usize {
        let addr = (addr & 0x001F) as usize;
        if addr >= 16 && addr.is_multiple_of(4) {
            addr - 16
        } else {
            addr
        }
    }

    /// Read from PPU address space ($0000-$3FFF)
    pub(super) fn read_memory(&self, addr: u16, chr: &dyn ChrBus) -> Result<u8, MapperError> {
        let addr = addr & 0x3FFF;
        let value = match addr {
            0x0000..=0x1FFF => chr.chr_read(addr)?,
            0x2000..=0x3EFF => self.vram[self.mirror_nametable_addr(addr)],
            _ => self.palette[self.mirror_palette_addr(addr)],
        };
        Ok(value)
    }

    /// Write to PPU address space ($0000-$3FFF)
    pub(super) fn write_memory(
        &mut self,
        addr: u16,
        data: u8,
        chr: &mut dyn ChrBus,
    ) -> Result<(), MapperError> {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => chr.chr_write(addr, data)?,
            0x2000..=0x3EFF => {
                let index = self.mirror_nametable_addr(addr);
                self.vram[index] = data;
            }
            _ => {
                // Palette entries are 6 bits wide
                let index = self.mirror_palette_addr(addr);
                self.palette[index] = data & 0x3F;
            }
        }
        Ok(())
    }

    /// Palette entry as used by the renderers
    #[inline]
    pub(super) fn palette_entry(&self, index: usize) -> u8 {
        self.palette[self.mirror_palette_addr(index as u16)]
    }

    /// Direct nametable byte read, bypassing the CHR bus
    #[inline]
    pub(super) fn nametable_byte(&self, addr: u16) -> u8 {
        self.vram[self.mirror_nametable_addr(addr)]
    }
}
