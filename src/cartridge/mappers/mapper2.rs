// Mapper 2 (UxROM) - switchable low PRG page, fixed CHR
//
// Memory Layout:
// - CPU $8000-$BFFF: 16KB switchable PRG page
// - CPU $C000-$FFFF: 16KB PRG page fixed to the last page
// - PPU $0000-$1FFF: 8KB CHR (usually RAM)
//
// Bank Switching:
// - Any write to $8000-$FFFF selects the page for $8000-$BFFF
// - Reads of $4020-$7FFF return 0 and writes there are ignored

use super::{CartridgeMemory, MapperError, MapperState, DEFAULT_CHR_PAGE_SIZE, DEFAULT_PRG_PAGE_SIZE};
use crate::cartridge::Cartridge;

/// UNROM / UOROM board
#[derive(Debug, Clone)]
pub struct Uxrom {
    pub(crate) memory: CartridgeMemory,
    /// Page mapped at $8000
    page: u8,
}

impl Uxrom {
    pub const NAME: &'static str = "UxROM";

    pub fn new(cartridge: Cartridge) -> Self {
        Uxrom {
            memory: CartridgeMemory::new(cartridge, false),
            page: 0,
        }
    }

    fn last_page(&self) -> usize {
        self.memory.prg_page_count(DEFAULT_PRG_PAGE_SIZE) - 1
    }

    pub fn cpu_read(&self, address: u16) -> Result<u8, MapperError> {
        match address {
            0x4020..=0x7FFF => Ok(0),
            0x8000..=0xBFFF => Ok(self.memory.read_prg(
                self.page as usize,
                DEFAULT_PRG_PAGE_SIZE,
                (address - 0x8000) as usize,
            )),
            0xC000..=0xFFFF => Ok(self.memory.read_prg(
                self.last_page(),
                DEFAULT_PRG_PAGE_SIZE,
                (address - 0xC000) as usize,
            )),
            _ => Err(MapperError::UnmappedCpuRead {
                mapper: Self::NAME,
                address,
            }),
        }
    }

    pub fn cpu_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        if address >= 0x8000 {
            if self.page != value {
                log::debug!("UxROM: PRG page {} -> {}", self.page, value);
            }
            self.page = value;
        }
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

    pub(crate) fn export_state(&self, state: &mut MapperState) {
        state.put_byte("page", self.page);
    }

    pub(crate) fn import_state(&mut self, state: &MapperState) {
        if let Some(page) = state.byte("page") {
            self.page = page;
        }
    }
}
