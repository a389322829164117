// Mapper 3 (CNROM) - fixed 32KB PRG with switchable CHR
//
// Memory Layout:
// - CPU $8000-$FFFF: one 32KB PRG page (16KB images are mirrored)
// - PPU $0000-$1FFF: 8KB CHR page selected by writes to $8000-$FFFF (bits 0-1)

use super::{CartridgeMemory, MapperError, MapperState, DEFAULT_CHR_PAGE_SIZE};
use crate::cartridge::Cartridge;

/// CNROM board
#[derive(Debug, Clone)]
pub struct Cnrom {
    pub(crate) memory: CartridgeMemory,
    /// CHR page mapped at $0000
    page: u8,
}

impl Cnrom {
    pub const NAME: &'static str = "CNROM";
    pub const PRG_PAGE_SIZE: usize = 32 * 1024;

    pub fn new(cartridge: Cartridge) -> Self {
        Cnrom {
            memory: CartridgeMemory::new(cartridge, false),
            page: 0,
        }
    }

    pub fn cpu_read(&self, address: u16) -> Result<u8, MapperError> {
        match address {
            0x8000..=0xFFFF => Ok(self.memory.read_prg(
                0,
                Self::PRG_PAGE_SIZE,
                (address - 0x8000) as usize,
            )),
            _ => Err(MapperError::UnmappedCpuRead {
                mapper: Self::NAME,
                address,
            }),
        }
    }

    pub fn cpu_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        match address {
            0x8000..=0xFFFF => {
                self.page = value & 0x03;
                Ok(())
            }
            _ => Err(MapperError::UnmappedCpuWrite {
                mapper: Self::NAME,
                address,
            }),
        }
    }

    pub fn ppu_read(&self, address: u16) -> Result<u8, MapperError> {
        match address {
            0x0000..=0x1FFF => Ok(self.memory.read_chr(
                self.page as usize,
                DEFAULT_CHR_PAGE_SIZE,
                address as usize,
            )),
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
            self.page as usize,
            DEFAULT_CHR_PAGE_SIZE,
            (address & 0x1FFF) as usize,
            value,
        )
    }

    pub(crate) fn export_state(&self, state: &mut MapperState) {
        state.put_byte("page", self.page);
    }

    pub(crate) fn import_state(&mut self, state: &MapperState) {
        if let Some(page) = state.byte("page") {
            self.page = page & 0x03;
        }
    }
}
