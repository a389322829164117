// Bus module - Memory bus implementation
//
// This module implements the main memory bus that connects the CPU to all memory-mapped
// components in the NES system. It handles address routing, memory mirroring, OAM DMA
// and owns the cartridge slot.
//
// # NES Memory Map (CPU Address Space)
//
// ```text
// $0000-$07FF: 2KB Internal RAM
// $0800-$1FFF: Mirrors of RAM (3 times)
// $2000-$2007: PPU Registers
// $2008-$3FFF: Mirrors of PPU Registers (repeating every 8 bytes)
// $4000-$4013: APU channel registers
// $4014:       OAM DMA
// $4015:       APU status
// $4016:       Controller strobe (W) / Controller 1 (R)
// $4017:       APU frame counter (W) / Controller 2 (R)
// $4018-$FFFF: Cartridge space (PRG-ROM, PRG-RAM, and mapper registers)
// ```

use crate::apu::Apu;
use crate::cartridge::{Mapper, MapperError, Mirroring};
use crate::cpu::Interrupt;
use crate::input::ControllerIO;
use crate::ppu::Ppu;

/// Size of the internal work RAM
pub const RAM_SIZE: usize = 2048;

/// CPU cycles an OAM DMA transfer stalls the CPU for
pub const OAM_DMA_CYCLES: u16 = 513;

/// Main memory bus structure
///
/// The Bus connects the CPU to all memory-mapped components in the NES system.
/// It handles address decoding, memory mirroring, and routes read/write operations
/// to the appropriate components. Every address is decodable: with no cartridge
/// inserted, cartridge space reads as 0 and ignores writes.
pub struct Bus {
    /// Internal RAM: 2KB, mirrored 3 times at $0800-$1FFF
    ram: [u8; RAM_SIZE],

    /// PPU registers at $2000-$2007, mirrored throughout $2000-$3FFF
    ppu: Ppu,

    /// APU registers at $4000-$4013, $4015 and $4017 (writes)
    apu: Apu,

    /// Controller ports at $4016 and $4017 (reads)
    controller_io: ControllerIO,

    /// Cartridge slot: PRG space for the CPU, CHR space for the PPU
    mapper: Option<Mapper>,

    /// CPU cycles owed to OAM DMA transfers since the last `take_stall_cycles`
    stall_cycles: u16,
}

impl Bus {
    /// Create a new bus instance with zero-initialized memory and no cartridge
    pub fn new() -> Self {
        Bus {
            ram: [0; RAM_SIZE],
            ppu: Ppu::new(),
            apu: Apu::default(),
            controller_io: ControllerIO::new(),
            mapper: None,
            stall_cycles: 0,
        }
    }

    /// Read a byte from the bus
    ///
    /// Routes the read operation to the appropriate memory region or device
    /// based on the address. Handles mirroring for RAM and PPU registers.
    ///
    /// # Errors
    ///
    /// Mapper errors for cartridge addresses the mapper does not decode, and
    /// for PPUDATA reads that reach an undecoded CHR address.
    pub fn read(&mut self, addr: u16) -> Result<u8, MapperError> {
        let value = match addr {
            // Mirror using mask: only keep lowest 11 bits (0x07FF = 2KB)
            _ if addr & 0xE000 == 0 => self.ram[(addr & 0x07FF) as usize],
            0x4016 | 0x4017 => self.controller_io.read(addr),
            0x2000..=0x3FFF => self.ppu.read_register(addr, &self.mapper)?,
            // $4014 is write-only
            0x4000..=0x4015 => self.apu.read(addr),
            _ => match &self.mapper {
                Some(mapper) => mapper.cpu_read(addr)?,
                None => 0,
            },
        };
        Ok(value)
    }

    /// Write a byte to the bus
    ///
    /// # Note on ROM writes
    /// Writes to ROM addresses ($8000-$FFFF) don't modify ROM data but can
    /// trigger mapper functionality (bank switching, mirroring changes, IRQ
    /// configuration). A mirroring change is forwarded to the PPU immediately.
    pub fn write(&mut self, addr: u16, data: u8) -> Result<(), MapperError> {
        match addr {
            _ if addr & 0xE000 == 0 => self.ram[(addr & 0x07FF) as usize] = data,
            0x4016 => self.controller_io.write(data),
            0x2000..=0x3FFF => self.ppu.write_register(addr, data, &mut self.mapper)?,
            0x4014 => self.oam_dma(data)?,
            0x4000..=0x4017 => self.apu.write(addr, data),
            _ => {
                if let Some(mapper) = &mut self.mapper {
                    mapper.cpu_write(addr, data)?;
                    if let Some(mirroring) = mapper.mirroring() {
                        self.ppu.set_mirroring(mirroring);
                    }
                }
            }
        }
        Ok(())
    }

    /// Read a 16-bit word from the bus (little-endian)
    ///
    /// The high byte comes from `addr + 1` with plain 16-bit wraparound; no
    /// page wrapping is applied.
    pub fn read_u16(&mut self, addr: u16) -> Result<u16, MapperError> {
        let lo = self.read(addr)? as u16;
        let hi = self.read(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    /// Side-effect free read for tracing and debugging
    ///
    /// RAM and cartridge space are read normally; I/O registers and undecoded
    /// cartridge addresses read as 0.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            _ if addr & 0xE000 == 0 => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x4017 => 0,
            _ => self
                .mapper
                .as_ref()
                .and_then(|mapper| mapper.cpu_read(addr).ok())
                .unwrap_or(0),
        }
    }

    // ========================================
    // OAM DMA
    // ========================================

    /// Copy $XX00-$XXFF into OAM starting at OAMADDR
    ///
    /// The transfer happens at once; the CPU is charged for it through
    /// [`Bus::take_stall_cycles`].
    fn oam_dma(&mut self, page: u8) -> Result<(), MapperError> {
        log::debug!("OAM DMA from ${:02X}00", page);
        let base = (page as u16) << 8;
        for offset in 0..256u16 {
            let data = self.read(base | offset)?;
            self.ppu.write_oam_dma(data);
        }
        self.stall_cycles += OAM_DMA_CYCLES;
        Ok(())
    }

    /// Cycles the CPU owes for DMA since the last call
    pub fn take_stall_cycles(&mut self) -> u16 {
        std::mem::take(&mut self.stall_cycles)
    }

    // ========================================
    // Cartridge slot
    // ========================================

    /// Insert a cartridge, replacing any previous one
    ///
    /// The PPU adopts the mapper's mirroring if it has selected one, the
    /// header's otherwise.
    pub fn insert_cartridge(&mut self, mapper: Mapper, header_mirroring: Mirroring) {
        self.ppu
            .set_mirroring(mapper.mirroring().unwrap_or(header_mirroring));
        self.mapper = Some(mapper);
    }

    pub fn mapper(&self) -> Option<&Mapper> {
        self.mapper.as_ref()
    }

    pub fn mapper_mut(&mut self) -> Option<&mut Mapper> {
        self.mapper.as_mut()
    }

    pub fn has_cartridge(&self) -> bool {
        self.mapper.is_some()
    }

    // ========================================
    // PPU Synchronization
    // ========================================

    /// Run one PPU dot against the inserted cartridge
    ///
    /// # Returns
    ///
    /// `true` when the dot completed a frame
    pub fn step_ppu(
        &mut self,
        on_interrupt: &mut dyn FnMut(Interrupt),
    ) -> Result<bool, MapperError> {
        self.ppu.step(&mut self.mapper, on_interrupt)
    }

    // ========================================
    // Component access
    // ========================================

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    pub fn apu_mut(&mut self) -> &mut Apu {
        &mut self.apu
    }

    pub fn controllers(&self) -> &ControllerIO {
        &self.controller_io
    }

    pub fn controllers_mut(&mut self) -> &mut ControllerIO {
        &mut self.controller_io
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Bus;
    use crate::cartridge::test_support::program_rom;
    use crate::cartridge::{create_mapper, Cartridge};

    /// Bus holding a 32KB NROM cartridge with `program` at $8000 and the
    /// given RESET, NMI and IRQ vectors
    pub fn bus_with_program(program: &[u8], reset: u16, nmi: u16, irq: u16) -> Bus {
        let cartridge = Cartridge::from_bytes(&program_rom(program, reset, nmi, irq))
            .expect("synthetic ROM parses");
        let mirroring = cartridge.mirroring();
        let mut bus = Bus::new();
        bus.insert_cartridge(create_mapper(cartridge).expect("NROM"), mirroring);
        bus
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::bus_with_program;
    use super::*;
    use crate::cartridge::create_mapper;
    use crate::cartridge::mappers::test_support::cartridge;
    use crate::input::Button;

    // ========================================
    // Bus Initialization Tests
    // ========================================

    #[test]
    fn test_bus_initialization() {
        let mut bus = Bus::new();
        assert_eq!(bus.read(0x0000).unwrap(), 0);
        assert_eq!(bus.read(0x07FF).unwrap(), 0);
        assert!(!bus.has_cartridge());
    }

    // ========================================
    // RAM Tests ($0000-$1FFF)
    // ========================================

    #[test]
    fn test_ram_read_write() {
        let mut bus = Bus::new();
        bus.write(0x0000, 0x42).unwrap();
        assert_eq!(bus.read(0x0000).unwrap(), 0x42);
    }

    #[test]
    fn test_ram_mirroring_all_regions() {
        let mut bus = Bus::new();
        bus.write(0x0123, 0x55).unwrap();

        for base in [0x0000, 0x0800, 0x1000, 0x1800] {
            assert_eq!(
                bus.read(base + 0x0123).unwrap(),
                0x55,
                "RAM should be mirrored at ${:04X}",
                base + 0x0123
            );
        }
    }

    #[test]
    fn test_ram_mirroring_bidirectional() {
        let mut bus = Bus::new();
        bus.write(0x1FFF, 0xAB).unwrap();
        assert_eq!(bus.read(0x07FF).unwrap(), 0xAB);
    }

    // ========================================
    // PPU Register Tests ($2000-$3FFF)
    // ========================================

    #[test]
    fn test_ppu_register_mirroring() {
        let mut bus = Bus::new();
        // $3456 & 7 = 6: PPUADDR
        bus.write(0x3456, 0x21).unwrap();
        bus.write(0x2006, 0x08).unwrap();
        bus.write(0x2007, 0x99).unwrap();

        bus.write(0x2006, 0x21).unwrap();
        bus.write(0x200E, 0x08).unwrap();
        bus.read(0x2007).unwrap();
        assert_eq!(bus.read(0x3FFF).unwrap(), 0x99, "$3FFF mirrors PPUDATA");
    }

    #[test]
    fn test_ppustatus_read_through_bus() {
        let mut bus = Bus::new();
        bus.ppu_mut().status = 0x80;
        assert_eq!(bus.read(0x2002).unwrap() & 0x80, 0x80);
        assert_eq!(bus.read(0x2002).unwrap() & 0x80, 0x00);
    }

    // ========================================
    // OAM DMA
    // ========================================

    #[test]
    fn test_oam_dma_copies_page() {
        let mut bus = Bus::new();
        for i in 0..256u16 {
            bus.write(0x0200 + i, i as u8).unwrap();
        }

        bus.write(0x4014, 0x02).unwrap();

        assert_eq!(bus.ppu().oam[0x00], 0x00);
        assert_eq!(bus.ppu().oam[0x7F], 0x7F);
        assert_eq!(bus.ppu().oam[0xFF], 0xFF);
        assert_eq!(bus.take_stall_cycles(), 513);
        assert_eq!(bus.take_stall_cycles(), 0, "stall is consumed once");
    }

    #[test]
    fn test_oam_dma_starts_at_oamaddr() {
        let mut bus = Bus::new();
        bus.write(0x0300, 0xAA).unwrap();
        bus.write(0x03FF, 0xBB).unwrap();
        bus.write(0x2003, 0x10).unwrap();

        bus.write(0x4014, 0x03).unwrap();

        assert_eq!(bus.ppu().oam[0x10], 0xAA);
        assert_eq!(bus.ppu().oam[0x0F], 0xBB, "OAMADDR wraps");
    }

    #[test]
    fn test_oam_dma_from_cartridge_space() {
        let mut bus = bus_with_program(&[], 0x8000, 0x9000, 0xA000);
        bus.write(0x4014, 0xFF).unwrap();
        // $FFFA-$FFFF vectors land at the end of OAM
        assert_eq!(bus.ppu().oam[0xFC], 0x00);
        assert_eq!(bus.ppu().oam[0xFD], 0x80);
    }

    // ========================================
    // APU and I/O Tests ($4000-$4017)
    // ========================================

    #[test]
    fn test_apu_status_round_trip() {
        let mut bus = Bus::new();
        bus.write(0x4015, 0x0F).unwrap();
        assert_eq!(bus.read(0x4015).unwrap(), 0x0F);
    }

    #[test]
    fn test_4017_write_goes_to_apu() {
        let mut bus = Bus::new();
        bus.write(0x4017, 0xC0).unwrap();
        assert_eq!(bus.apu().state().frame_counter, 0xC0);
    }

    #[test]
    fn test_controller_ports() {
        let mut bus = Bus::new();
        bus.controllers_mut().set_button(1, Button::A, true);
        bus.controllers_mut().set_button(2, Button::B, true);

        bus.write(0x4016, 1).unwrap();
        bus.write(0x4016, 0).unwrap();

        assert_eq!(bus.read(0x4016).unwrap(), 0x41);
        assert_eq!(bus.read(0x4016).unwrap(), 0x40);
        assert_eq!(bus.read(0x4017).unwrap(), 0x40);
        assert_eq!(bus.read(0x4017).unwrap(), 0x41);
    }

    // ========================================
    // Cartridge Space Tests ($4018-$FFFF)
    // ========================================

    #[test]
    fn test_empty_slot_reads_zero() {
        let mut bus = Bus::new();
        assert_eq!(bus.read(0x8000).unwrap(), 0);
        assert_eq!(bus.read(0x4020).unwrap(), 0);
        bus.write(0xC000, 0x12).unwrap();
        assert_eq!(bus.read(0xC000).unwrap(), 0);
    }

    #[test]
    fn test_mapper_routing() {
        let mut bus = Bus::new();
        let cart = cartridge(1, 1, 0, 0);
        let mirroring = cart.mirroring();
        bus.insert_cartridge(create_mapper(cart).unwrap(), mirroring);

        // Single 16KB page mirrored at $C000
        assert_eq!(bus.read(0x8000).unwrap(), bus.read(0xC000).unwrap());
    }

    #[test]
    fn test_unmapped_cartridge_read_is_error() {
        let mut bus = Bus::new();
        let cart = cartridge(1, 1, 0, 0);
        let mirroring = cart.mirroring();
        bus.insert_cartridge(create_mapper(cart).unwrap(), mirroring);

        assert!(bus.read(0x6000).is_err(), "NROM does not decode $6000");
        assert!(bus.read(0x4018).is_err());
    }

    #[test]
    fn test_read_u16_is_little_endian() {
        let mut bus = Bus::new();
        bus.write(0x0010, 0x34).unwrap();
        bus.write(0x0011, 0x12).unwrap();
        assert_eq!(bus.read_u16(0x0010).unwrap(), 0x1234);
    }

    #[test]
    fn test_read_u16_crosses_page_literally() {
        let mut bus = Bus::new();
        bus.write(0x00FF, 0x34).unwrap();
        bus.write(0x0100, 0x12).unwrap();
        bus.write(0x0000, 0x99).unwrap();
        assert_eq!(bus.read_u16(0x00FF).unwrap(), 0x1234);
    }

    #[test]
    fn test_vectors_from_cartridge() {
        let mut bus = bus_with_program(&[], 0x8123, 0x9000, 0xA000);
        assert_eq!(bus.read_u16(0xFFFA).unwrap(), 0x9000);
        assert_eq!(bus.read_u16(0xFFFC).unwrap(), 0x8123);
        assert_eq!(bus.read_u16(0xFFFE).unwrap(), 0xA000);
    }

    // ========================================
    // Mirroring synchronization
    // ========================================

    #[test]
    fn test_header_mirroring_applied_on_insert() {
        let mut bus = Bus::new();
        let cart = cartridge(1, 1, 0, 0x01);
        bus.insert_cartridge(create_mapper(cart).unwrap(), Mirroring::Vertical);
        assert_eq!(bus.ppu().mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn test_mapper_mirroring_forwarded_to_ppu() {
        let mut bus = Bus::new();
        let cart = cartridge(2, 0, 4, 0);
        bus.insert_cartridge(create_mapper(cart).unwrap(), Mirroring::Vertical);

        // MMC3 $A000 even: 1 selects horizontal
        bus.write(0xA000, 0x01).unwrap();
        assert_eq!(bus.ppu().mirroring(), Mirroring::Horizontal);
    }

    // ========================================
    // Peek
    // ========================================

    #[test]
    fn test_peek_has_no_side_effects() {
        let mut bus = bus_with_program(&[0xA9, 0x42], 0x8000, 0x9000, 0xA000);
        bus.ppu_mut().status = 0x80;
        bus.write(0x0005, 0x77).unwrap();

        assert_eq!(bus.peek(0x0805), 0x77);
        assert_eq!(bus.peek(0x8001), 0x42);
        assert_eq!(bus.peek(0x2002), 0x00);
        assert_eq!(bus.peek(0x6000), 0x00, "undecoded cartridge address");
        assert!(bus.ppu().in_vblank(), "VBlank untouched by peek");
    }
}
