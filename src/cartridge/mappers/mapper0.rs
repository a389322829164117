// Mapper 0 (NROM) - fixed PRG and CHR, no registers
//
// Memory Layout:
// - CPU $8000-$BFFF: PRG page 0
// - CPU $C000-$FFFF: PRG page 1 (mirror of page 0 on 16KB carts)
// - PPU $0000-$1FFF: 8KB CHR-ROM or CHR-RAM

use super::{CartridgeMemory, MapperError, DEFAULT_CHR_PAGE_SIZE, DEFAULT_PRG_PAGE_SIZE};
use crate::cartridge::Cartridge;

/// NROM-128 / NROM-256 board
#[derive(Debug, Clone)]
pub struct Nrom {
    pub(crate) memory: CartridgeMemory,
}

impl Nrom {
    pub const NAME: &'static str = "NROM";

    pub fn new(cartridge: Cartridge) -> Self {
        Nrom {
            memory: CartridgeMemory::new(cartridge, false),
        }
    }

    pub fn cpu_read(&self, address: u16) -> Result<u8, MapperError> {
        match address {
            0x8000..=0xBFFF => Ok(self.memory.read_prg(
                0,
                DEFAULT_PRG_PAGE_SIZE,
                (address - 0x8000) as usize,
            )),
            // A single page wraps back onto itself
            0xC000..=0xFFFF => Ok(self.memory.read_prg(
                1,
                DEFAULT_PRG_PAGE_SIZE,
                (address - 0xC000) as usize,
            )),
            _ => Err(MapperError::UnmappedCpuRead {
                mapper: Self::NAME,
                address,
            }),
        }
    }

    /// NROM decodes no writes
    pub fn cpu_write(&mut self, _address: u16, _value: u8) -> Result<(), MapperError> {
        Ok(())
    }

    pub fn ppu_read(&self, address: u16) -> Result<u8, MapperError> {
        match address {
            0x0000..=0x1FFF => Ok(self
                .memory
                .read_chr(0, DEFAULT_CHR_PAGE_SIZE, address as usize)),
            _ => Err(MapperError::UnmappedPpuRead {
                mapper: Self::NAME,
                address,
            }),
        }
    }

    pub fn ppu_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        self.memory.write_chr(
            Self::NAME,
            address,
            0,
            DEFAULT_CHR_PAGE_SIZE,
            (address & 0x1FFF) as usize,
            value,
        )
    }
}
