// Mapper 4 (MMC3) - 8KB PRG / 1KB CHR banking with a scanline IRQ counter
//
// Memory Layout:
// - CPU $6000-$7FFF: 8KB PRG-RAM
// - CPU $8000-$9FFF: R6 or second-to-last page (PRG mode bit)
// - CPU $A000-$BFFF: R7
// - CPU $C000-$DFFF: second-to-last page or R6 (PRG mode bit)
// - CPU $E000-$FFFF: last page
// - PPU $0000-$1FFF: eight 1KB windows built from R0-R5
//
// Registers (even/odd address pairs):
// - $8000 even: bank select (bits 0-2 target, bit 6 PRG mode, bit 7 CHR inversion)
// - $8001 odd:  bank data for the selected register
// - $A000 even: mirroring (0=vertical, 1=horizontal)
// - $A001 odd:  PRG-RAM protect (not modelled)
// - $C000 even: IRQ latch
// - $C001 odd:  IRQ reload (clears the counter so the next clock reloads it)
// - $E000 even: IRQ disable
// - $E001 odd:  IRQ enable

use super::{CartridgeMemory, MapperError, MapperState};
use crate::bits;
use crate::cartridge::{Cartridge, Mirroring};

/// MMC3 (TxROM boards)
#[derive(Debug, Clone)]
pub struct Mmc3 {
    pub(crate) memory: CartridgeMemory,

    bank_select: u8,
    /// R0-R7
    bank_data: [u8; 8],

    irq_latch: u8,
    irq_counter: u8,
    irq_enabled: bool,

    mirroring: Option<Mirroring>,
    /// Four-screen boards wire the nametables directly; $A000 has no effect
    four_screen: bool,
}

impl Mmc3 {
    pub const NAME: &'static str = "MMC3";
    pub const PRG_PAGE_SIZE: usize = 8 * 1024;
    pub const CHR_PAGE_SIZE: usize = 1024;

    pub fn new(cartridge: Cartridge) -> Self {
        let four_screen = cartridge.header.mirroring == Mirroring::FourScreen;
        Mmc3 {
            memory: CartridgeMemory::new(cartridge, true),
            bank_select: 0,
            bank_data: [0; 8],
            irq_latch: 0,
            irq_counter: 0,
            irq_enabled: false,
            mirroring: None,
            four_screen,
        }
    }

    fn prg_mode(&self) -> bool {
        bits::get_bit(self.bank_select, 6)
    }

    fn chr_inverted(&self) -> bool {
        bits::get_bit(self.bank_select, 7)
    }

    /// PRG page for the 8KB window at `address`
    fn prg_page(&self, address: u16) -> usize {
        let count = self.memory.prg_page_count(Self::PRG_PAGE_SIZE);
        let second_last = count.saturating_sub(2);
        let switchable = self.bank_data[6] as usize;

        match (address >> 13) & 0b11 {
            0 if self.prg_mode() => second_last,
            0 => switchable,
            1 => self.bank_data[7] as usize,
            2 if self.prg_mode() => switchable,
            2 => second_last,
            _ => count - 1,
        }
    }

    /// CHR page for the 1KB window at `address`
    fn chr_page(&self, address: u16) -> usize {
        let mut slot = (address >> 10) as usize & 0x07;
        if self.chr_inverted() {
            slot ^= 0x04;
        }
        match slot {
            0 => (self.bank_data[0] & !1) as usize,
            1 => (self.bank_data[0] & !1) as usize + 1,
            2 => (self.bank_data[1] & !1) as usize,
            3 => (self.bank_data[1] & !1) as usize + 1,
            n => self.bank_data[n - 2] as usize,
        }
    }

    pub fn cpu_read(&self, address: u16) -> Result<u8, MapperError> {
        match (address, self.memory.prg_ram.as_ref()) {
            (0x6000..=0x7FFF, Some(ram)) => Ok(ram[(address - 0x6000) as usize]),
            (0x8000..=0xFFFF, _) => Ok(self.memory.read_prg(
                self.prg_page(address),
                Self::PRG_PAGE_SIZE,
                (address & 0x1FFF) as usize,
            )),
            _ => Err(MapperError::UnmappedCpuRead {
                mapper: Self::NAME,
                address,
            }),
        }
    }

    pub fn cpu_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        let even = address & 1 == 0;
        match address {
            0x6000..=0x7FFF => {
                if let Some(ram) = self.memory.prg_ram.as_mut() {
                    ram[(address - 0x6000) as usize] = value;
                }
            }
            0x8000..=0x9FFF if even => self.bank_select = value,
            0x8000..=0x9FFF => {
                let register = (self.bank_select & 0x07) as usize;
                self.bank_data[register] = value;
                log::debug!("MMC3: R{} = {:#04X}", register, value);
            }
            0xA000..=0xBFFF if even && self.four_screen => {}
            0xA000..=0xBFFF if even => {
                self.mirroring = Some(if bits::get_bit(value, 0) {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                });
            }
            0xA000..=0xBFFF => {}
            0xC000..=0xDFFF if even => self.irq_latch = value,
            0xC000..=0xDFFF => self.irq_counter = 0,
            0xE000..=0xFFFF => self.irq_enabled = !even,
            _ => {
                return Err(MapperError::UnmappedCpuWrite {
                    mapper: Self::NAME,
                    address,
                })
            }
        }
        Ok(())
    }

    pub fn ppu_read(&self, address: u16) -> Result<u8, MapperError> {
        match address {
            0x0000..=0x1FFF => Ok(self.memory.read_chr(
                self.chr_page(address),
                Self::CHR_PAGE_SIZE,
                (address & 0x03FF) as usize,
            )),
            _ => Err(MapperError::UnmappedPpuRead {
                mapper: Self::NAME,
                address,
            }),
        }
    }

    pub fn ppu_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        let page = self.chr_page(address);
        self.memory.write_chr(
            Self::NAME,
            address,
            page,
            Self::CHR_PAGE_SIZE,
            (address & 0x03FF) as usize,
            value,
        )
    }

    /// Scanline clock
    ///
    /// A zero counter reloads from the latch. Otherwise the counter
    /// decrements and an IRQ is requested when it reaches zero while enabled.
    pub fn tick(&mut self) -> bool {
        if self.irq_counter == 0 {
            self.irq_counter = self.irq_latch;
            return false;
        }
        self.irq_counter -= 1;
        self.irq_counter == 0 && self.irq_enabled
    }

    pub fn mirroring(&self) -> Option<Mirroring> {
        self.mirroring
    }

    pub(crate) fn export_state(&self, state: &mut MapperState) {
        state.put_byte("bank_select", self.bank_select);
        state.put_bytes("bank_data", &self.bank_data);
        state.put_byte("irq_latch", self.irq_latch);
        state.put_byte("irq_counter", self.irq_counter);
        state.put_flag("irq_enabled", self.irq_enabled);
        state.put_flag("mirroring_set", self.mirroring.is_some());
        state.put_flag("horizontal", self.mirroring == Some(Mirroring::Horizontal));
    }

    pub(crate) fn import_state(&mut self, state: &MapperState) {
        if let Some(v) = state.byte("bank_select") {
            self.bank_select = v;
        }
        if let Some(data) = state.bytes("bank_data") {
            if data.len() == self.bank_data.len() {
                self.bank_data.copy_from_slice(data);
            }
        }
        if let Some(v) = state.byte("irq_latch") {
            self.irq_latch = v;
        }
        if let Some(v) = state.byte("irq_counter") {
            self.irq_counter = v;
        }
        if let Some(v) = state.flag("irq_enabled") {
            self.irq_enabled = v;
        }
        self.mirroring = match (state.flag("mirroring_set"), state.flag("horizontal")) {
            (Some(true), Some(true)) => Some(Mirroring::Horizontal),
            (Some(true), _) => Some(Mirroring::Vertical),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::mappers::test_support::cartridge;

    /// 8 x 16KB PRG = 16 x 8KB pages, 8 x 8KB CHR = 64 x 1KB pages
    fn mmc3() -> Mmc3 {
        Mmc3::new(cartridge(8, 8, 4, 0))
    }

    /// Value stored in 8KB PRG page `page` by the synthetic ROM
    fn prg_marker(page: usize) -> u8 {
        (page / 2) as u8
    }

    #[test]
    fn test_irq_fires_on_eleventh_tick() {
        let mut mapper = mmc3();
        mapper.cpu_write(0xC000, 10).unwrap();
        mapper.cpu_write(0xC001, 0).unwrap();
        mapper.cpu_write(0xE001, 0).unwrap();

        let fired: Vec<usize> = (1..=11).filter(|_| mapper.tick()).collect();
        assert_eq!(fired.len(), 1, "exactly one IRQ in 11 ticks");

        let mut mapper = mmc3();
        mapper.cpu_write(0xC000, 10).unwrap();
        mapper.cpu_write(0xC001, 0).unwrap();
        mapper.cpu_write(0xE001, 0).unwrap();
        for tick in 1..=10 {
            assert!(!mapper.tick(), "no IRQ on tick {}", tick);
        }
        assert!(mapper.tick(), "IRQ on tick 11");
    }

    #[test]
    fn test_disabled_irq_still_counts() {
        let mut mapper = mmc3();
        mapper.cpu_write(0xC000, 2).unwrap();
        mapper.cpu_write(0xE000, 0).unwrap();
        assert!(!mapper.tick());
        assert!(!mapper.tick());
        assert!(!mapper.tick());
        assert_eq!(mapper.irq_counter, 0);
        // Next tick reloads
        assert!(!mapper.tick());
        assert_eq!(mapper.irq_counter, 2);
    }

    #[test]
    fn test_prg_mode_0() {
        let mut mapper = mmc3();
        mapper.cpu_write(0x8000, 6).unwrap();
        mapper.cpu_write(0x8001, 4).unwrap();
        mapper.cpu_write(0x8000, 7).unwrap();
        mapper.cpu_write(0x8001, 9).unwrap();

        assert_eq!(mapper.cpu_read(0x8000).unwrap(), prg_marker(4));
        assert_eq!(mapper.cpu_read(0xA000).unwrap(), prg_marker(9));
        assert_eq!(mapper.cpu_read(0xC000).unwrap(), prg_marker(14));
        assert_eq!(mapper.cpu_read(0xE000).unwrap(), prg_marker(15));
    }

    #[test]
    fn test_prg_mode_1_swaps_fixed_window() {
        let mut mapper = mmc3();
        mapper.cpu_write(0x8000, 0x46).unwrap();
        mapper.cpu_write(0x8001, 4).unwrap();

        assert_eq!(mapper.cpu_read(0x8000).unwrap(), prg_marker(14));
        assert_eq!(mapper.cpu_read(0xC000).unwrap(), prg_marker(4));
        assert_eq!(mapper.cpu_read(0xE000).unwrap(), prg_marker(15));
    }

    #[test]
    fn test_chr_windows_and_inversion() {
        let mut mapper = mmc3();
        // R0 = 9 (2KB, low bit dropped) and R2 = 17
        mapper.cpu_write(0x8000, 0).unwrap();
        mapper.cpu_write(0x8001, 9).unwrap();
        mapper.cpu_write(0x8000, 2).unwrap();
        mapper.cpu_write(0x8001, 17).unwrap();

        // 1KB page p lives in 8KB CHR page p / 8
        assert_eq!(mapper.ppu_read(0x0000).unwrap(), 0x80 | (8 / 8));
        assert_eq!(mapper.ppu_read(0x0400).unwrap(), 0x80 | (9 / 8));
        assert_eq!(mapper.ppu_read(0x1000).unwrap(), 0x80 | (17 / 8));

        mapper.cpu_write(0x8000, 0x80).unwrap();
        assert_eq!(mapper.ppu_read(0x0000).unwrap(), 0x80 | (17 / 8));
        assert_eq!(mapper.ppu_read(0x1000).unwrap(), 0x80 | (8 / 8));
    }

    #[test]
    fn test_mirroring_register() {
        let mut mapper = mmc3();
        assert_eq!(mapper.mirroring(), None);
        mapper.cpu_write(0xA000, 1).unwrap();
        assert_eq!(mapper.mirroring(), Some(Mirroring::Horizontal));
        mapper.cpu_write(0xA000, 0).unwrap();
        assert_eq!(mapper.mirroring(), Some(Mirroring::Vertical));
    }

    #[test]
    fn test_prg_ram_always_present() {
        let mut mapper = mmc3();
        mapper.cpu_write(0x7FFF, 0x3C).unwrap();
        assert_eq!(mapper.cpu_read(0x7FFF).unwrap(), 0x3C);
    }

    #[test]
    fn test_snapshot_reproduces_irq_timing() {
        let mut mapper = mmc3();
        mapper.cpu_write(0xC000, 5).unwrap();
        mapper.cpu_write(0xE001, 0).unwrap();
        mapper.tick();
        mapper.tick();

        let mut state = MapperState::new();
        mapper.export_state(&mut state);
        let mut restored = mmc3();
        restored.import_state(&state);

        for _ in 0..20 {
            assert_eq!(mapper.tick(), restored.tick());
        }
    }

    #[test]
    fn test_snapshot_round_trips_mirroring_choice() {
        let untouched = mmc3();
        let mut horizontal = mmc3();
        horizontal.cpu_write(0xA000, 1).unwrap();

        for source in [&untouched, &horizontal] {
            let mut state = MapperState::new();
            source.export_state(&mut state);

            // Start from the opposite choice so stale values would show
            let mut restored = mmc3();
            restored.cpu_write(0xA000, 0).unwrap();
            restored.import_state(&state);

            assert_eq!(restored.mirroring(), source.mirroring());
        }
    }

    #[test]
    fn test_four_screen_ignores_mirroring_register() {
        let mut mapper = Mmc3::new(cartridge(8, 8, 4, 0x08));
        mapper.cpu_write(0xA000, 1).unwrap();
        mapper.cpu_write(0xA000, 0).unwrap();
        assert_eq!(mapper.mirroring(), None);
    }
}
