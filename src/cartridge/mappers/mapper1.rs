// Mapper 1 (MMC1) - serial-loaded bank registers
//
// Memory Layout:
// - CPU $6000-$7FFF: 8KB PRG-RAM (only when the header declares it)
// - CPU $8000-$BFFF: 16KB PRG page (switchable or fixed depending on mode)
// - CPU $C000-$FFFF: 16KB PRG page (switchable or fixed depending on mode)
// - PPU $0000-$0FFF: 4KB CHR page 0
// - PPU $1000-$1FFF: 4KB CHR page 1
//
// Register Interface:
// Writes to $8000-$FFFF feed a 5-bit shift register, one bit per write,
// filled from bit 0 upward. A write with bit 7 set clears the shift register
// and forces PRG mode 3. The fifth write stores the value into the register
// selected by the address of that write:
//
// Control ($8000-$9FFF):
//   Bits 0-1: Mirroring (0=one-screen lower, 1=one-screen upper, 2=vertical, 3=horizontal)
//   Bits 2-3: PRG bank mode
//   Bit 4: CHR bank mode
// CHR bank 0 ($A000-$BFFF), CHR bank 1 ($C000-$DFFF)
// PRG bank ($E000-$FFFF): bits 0-3

use super::{CartridgeMemory, MapperError, MapperState, DEFAULT_PRG_PAGE_SIZE};
use crate::bits;
use crate::cartridge::{Cartridge, Mirroring};

/// PRG bank mode from control bits 2-3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrgBankMode {
    /// Switch 32KB at $8000 in 16KB halves, ignoring the low bank bit
    Switch32KB,
    /// Fix the first page at $8000, switch $C000
    FixFirst,
    /// Switch $8000, fix the last page at $C000
    FixLast,
}

impl From<u8> for PrgBankMode {
    fn from(control: u8) -> Self {
        match bits::get_bits(control, 2, 2) {
            0 | 1 => PrgBankMode::Switch32KB,
            2 => PrgBankMode::FixFirst,
            _ => PrgBankMode::FixLast,
        }
    }
}

/// Mirroring encoded in control bits 0-1
fn control_mirroring(control: u8) -> Mirroring {
    match control & 0b11 {
        0 => Mirroring::SingleScreenLower,
        1 => Mirroring::SingleScreenUpper,
        2 => Mirroring::Vertical,
        _ => Mirroring::Horizontal,
    }
}

/// MMC1 (SxROM boards)
#[derive(Debug, Clone)]
pub struct Mmc1 {
    pub(crate) memory: CartridgeMemory,

    /// Bits collected so far, bit 0 first
    shift_register: u8,
    /// Number of bits collected (0-4)
    write_count: u8,

    control: u8,
    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,

    /// Mirroring last written through the control register
    mirroring: Option<Mirroring>,
}

impl Mmc1 {
    pub const NAME: &'static str = "MMC1";
    pub const CHR_PAGE_SIZE: usize = 4 * 1024;

    pub fn new(cartridge: Cartridge) -> Self {
        let has_prg_ram = cartridge.header.has_prg_ram;
        let mut mapper = Mmc1 {
            memory: CartridgeMemory::new(cartridge, has_prg_ram),
            shift_register: 0,
            write_count: 0,
            control: 0,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
            mirroring: None,
        };
        mapper.reset();
        mapper
    }

    fn reset_shift(&mut self) {
        self.shift_register = 0;
        self.write_count = 0;
    }

    /// Clear the shift register and force PRG mode 3
    fn reset(&mut self) {
        self.reset_shift();
        self.control = bits::set_bits(self.control, 2, 2, 3);
    }

    fn write_register(&mut self, address: u16, value: u8) {
        match address {
            0x8000..=0x9FFF => {
                self.control = value;
                let mirroring = control_mirroring(value);
                if self.mirroring != Some(mirroring) {
                    log::debug!("MMC1: mirroring -> {:?}", mirroring);
                }
                self.mirroring = Some(mirroring);
            }
            0xA000..=0xBFFF => self.chr_bank_0 = value,
            0xC000..=0xDFFF => self.chr_bank_1 = value,
            _ => self.prg_bank = value & 0x0F,
        }
    }

    /// PRG page mapped at $8000 (`high == false`) or $C000
    fn prg_page(&self, high: bool) -> usize {
        let bank = self.prg_bank as usize;
        match PrgBankMode::from(self.control) {
            PrgBankMode::Switch32KB => (bank & !1) + high as usize,
            PrgBankMode::FixFirst => {
                if high {
                    bank
                } else {
                    0
                }
            }
            PrgBankMode::FixLast => {
                if high {
                    self.memory.prg_page_count(DEFAULT_PRG_PAGE_SIZE) - 1
                } else {
                    bank
                }
            }
        }
    }

    /// 4KB CHR page mapped at $0000 (`high == false`) or $1000
    fn chr_page(&self, high: bool) -> usize {
        if bits::get_bit(self.control, 4) {
            if high {
                self.chr_bank_1 as usize
            } else {
                self.chr_bank_0 as usize
            }
        } else {
            (self.chr_bank_0 as usize & !1) + high as usize
        }
    }

    pub fn cpu_read(&self, address: u16) -> Result<u8, MapperError> {
        match address {
            0x6000..=0x7FFF if self.memory.prg_ram.is_some() => Ok(self
                .memory
                .prg_ram
                .as_ref()
                .map_or(0, |ram| ram[(address - 0x6000) as usize])),
            0x8000..=0xBFFF => Ok(self.memory.read_prg(
                self.prg_page(false),
                DEFAULT_PRG_PAGE_SIZE,
                (address - 0x8000) as usize,
            )),
            0xC000..=0xFFFF => Ok(self.memory.read_prg(
                self.prg_page(true),
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
        match address {
            0x6000..=0x7FFF => match self.memory.prg_ram.as_mut() {
                Some(ram) => {
                    ram[(address - 0x6000) as usize] = value;
                    Ok(())
                }
                None => Err(MapperError::UnmappedCpuWrite {
                    mapper: Self::NAME,
                    address,
                }),
            },
            0x8000..=0xFFFF => {
                if bits::get_bit(value, 7) {
                    self.reset();
                    return Ok(());
                }

                self.shift_register =
                    bits::set_bit(self.shift_register, self.write_count, bits::get_bit(value, 0));
                self.write_count += 1;

                if self.write_count == 5 {
                    self.write_register(address, self.shift_register);
                    self.reset_shift();
                }
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
            0x0000..=0x0FFF => Ok(self.memory.read_chr(
                self.chr_page(false),
                Self::CHR_PAGE_SIZE,
                address as usize,
            )),
            0x1000..=0x1FFF => Ok(self.memory.read_chr(
                self.chr_page(true),
                Self::CHR_PAGE_SIZE,
                (address - 0x1000) as usize,
            )),
            _ => Err(MapperError::UnmappedPpuRead {
                mapper: Self::NAME,
                address,
            }),
        }
    }

    pub fn ppu_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        let high = address & 0x1000 != 0;
        let page = self.chr_page(high);
        self.memory.write_chr(
            Self::NAME,
            address,
            page,
            Self::CHR_PAGE_SIZE,
            (address & 0x0FFF) as usize,
            value,
        )
    }

    pub fn mirroring(&self) -> Option<Mirroring> {
        self.mirroring
    }

    pub(crate) fn export_state(&self, state: &mut MapperState) {
        state.put_byte("shift_register", self.shift_register);
        state.put_byte("write_count", self.write_count);
        state.put_byte("control", self.control);
        state.put_byte("prg_bank", self.prg_bank);
        state.put_byte("chr_bank_0", self.chr_bank_0);
        state.put_byte("chr_bank_1", self.chr_bank_1);
        state.put_flag("mirroring_set", self.mirroring.is_some());
    }

    pub(crate) fn import_state(&mut self, state: &MapperState) {
        if let Some(v) = state.byte("shift_register") {
            self.shift_register = v;
        }
        if let Some(v) = state.byte("write_count") {
            self.write_count = v.min(4);
        }
        if let Some(v) = state.byte("control") {
            self.control = v;
        }
        // Until the control register is written the header mirroring stands
        self.mirroring = match state.flag("mirroring_set") {
            Some(true) => Some(control_mirroring(self.control)),
            _ => None,
        };
        if let Some(v) = state.byte("prg_bank") {
            self.prg_bank = v;
        }
        if let Some(v) = state.byte("chr_bank_0") {
            self.chr_bank_0 = v;
        }
        if let Some(v) = state.byte("chr_bank_1") {
            self.chr_bank_1 = v;
        }
    }
}
