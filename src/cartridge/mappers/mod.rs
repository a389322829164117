// Mappers module - bank-switching hardware carried on the cartridge
//
// The supported mapper set is closed, so `Mapper` is an enum and every access
// is a `match` over the variant. Each variant lives in its own file and shares
// the PRG/CHR storage helpers defined here.

pub mod mapper0;
pub mod mapper1;
pub mod mapper2;
pub mod mapper3;
pub mod mapper4;

pub use mapper0::Nrom;
pub use mapper1::Mmc1;
pub use mapper2::Uxrom;
pub use mapper3::Cnrom;
pub use mapper4::Mmc3;

use super::{Cartridge, Mirroring};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default PRG-ROM switching granularity
pub const DEFAULT_PRG_PAGE_SIZE: usize = 16 * 1024;

/// Default CHR-ROM switching granularity
pub const DEFAULT_CHR_PAGE_SIZE: usize = 8 * 1024;

/// Size of the optional PRG-RAM window at $6000-$7FFF
pub const PRG_RAM_SIZE: usize = 8 * 1024;

/// Fatal mapper conditions
///
/// These signal an address the cartridge hardware does not decode, or a
/// cartridge the emulator cannot drive. None of them are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapperError {
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u8),

    #[error("invalid mapper configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{mapper}: unmapped CPU read at ${address:04X}")]
    UnmappedCpuRead { mapper: &'static str, address: u16 },

    #[error("{mapper}: unmapped CPU write at ${address:04X}")]
    UnmappedCpuWrite { mapper: &'static str, address: u16 },

    #[error("{mapper}: unmapped PPU read at ${address:04X}")]
    UnmappedPpuRead { mapper: &'static str, address: u16 },

    #[error("{mapper}: write to CHR-ROM at ${address:04X}")]
    ChrRomWrite { mapper: &'static str, address: u16 },
}

// ========================================
// Snapshot
// ========================================

/// A single field of a mapper snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Flag(bool),
    Byte(u8),
    Word(u16),
    Bytes(Vec<u8>),
}

/// Flat key/value export of a mapper's registers and RAM
///
/// Missing keys are left untouched on import, so a snapshot taken by an older
/// build still restores the registers it knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapperState(BTreeMap<String, StateValue>);

impl MapperState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &str, value: StateValue) {
        self.0.insert(key.to_string(), value);
    }

    pub fn put_byte(&mut self, key: &str, value: u8) {
        self.put(key, StateValue::Byte(value));
    }

    pub fn put_flag(&mut self, key: &str, value: bool) {
        self.put(key, StateValue::Flag(value));
    }

    pub fn put_bytes(&mut self, key: &str, value: &[u8]) {
        self.put(key, StateValue::Bytes(value.to_vec()));
    }

    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.0.get(key)
    }

    pub fn byte(&self, key: &str) -> Option<u8> {
        match self.0.get(key)? {
            StateValue::Byte(v) => Some(*v),
            StateValue::Word(v) => u8::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            StateValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.0.get(key)? {
            StateValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Copy `src` into `dst` only when the lengths agree
fn restore_bytes(dst: &mut [u8], src: Option<&[u8]>) {
    if let Some(src) = src {
        if src.len() == dst.len() {
            dst.copy_from_slice(src);
        } else {
            log::warn!(
                "Ignoring snapshot block of {} bytes (expected {})",
                src.len(),
                dst.len()
            );
        }
    }
}

// ========================================
// Shared cartridge storage
// ========================================

/// PRG/CHR storage and optional PRG-RAM owned by a mapper
#[derive(Debug, Clone)]
pub struct CartridgeMemory {
    pub(crate) prg_rom: Vec<u8>,
    pub(crate) chr: Vec<u8>,
    pub(crate) chr_is_ram: bool,
    pub(crate) prg_ram: Option<Vec<u8>>,
}

impl CartridgeMemory {
    fn new(cartridge: Cartridge, with_prg_ram: bool) -> Self {
        CartridgeMemory {
            chr_is_ram: cartridge.header.uses_chr_ram(),
            prg_rom: cartridge.prg_rom,
            chr: cartridge.chr_rom,
            prg_ram: with_prg_ram.then(|| vec![0; PRG_RAM_SIZE]),
        }
    }

    /// Number of PRG pages of `page_size` bytes (at least one)
    pub fn prg_page_count(&self, page_size: usize) -> usize {
        (self.prg_rom.len() / page_size).max(1)
    }

    /// Number of CHR pages of `page_size` bytes (at least one)
    pub fn chr_page_count(&self, page_size: usize) -> usize {
        (self.chr.len() / page_size).max(1)
    }

    /// Index into PRG-ROM for `offset` within `page`
    ///
    /// The page is reduced modulo the page count so every selectable value
    /// lands on real data; images smaller than one page wrap around.
    fn prg_index(&self, page: usize, page_size: usize, offset: usize) -> usize {
        let page = page % self.prg_page_count(page_size);
        (page * page_size + offset) % self.prg_rom.len()
    }

    fn chr_index(&self, page: usize, page_size: usize, offset: usize) -> usize {
        let page = page % self.chr_page_count(page_size);
        (page * page_size + offset) % self.chr.len()
    }

    pub fn read_prg(&self, page: usize, page_size: usize, offset: usize) -> u8 {
        self.prg_rom[self.prg_index(page, page_size, offset)]
    }

    pub fn read_chr(&self, page: usize, page_size: usize, offset: usize) -> u8 {
        self.chr[self.chr_index(page, page_size, offset)]
    }

    /// Write to pattern memory; only CHR-RAM accepts writes
    pub fn write_chr(
        &mut self,
        mapper: &'static str,
        address: u16,
        page: usize,
        page_size: usize,
        offset: usize,
        value: u8,
    ) -> Result<(), MapperError> {
        if !self.chr_is_ram {
            return Err(MapperError::ChrRomWrite { mapper, address });
        }
        let index = self.chr_index(page, page_size, offset);
        self.chr[index] = value;
        Ok(())
    }

    fn export(&self, state: &mut MapperState) {
        if let Some(ram) = &self.prg_ram {
            state.put_bytes("prg_ram", ram);
        }
        if self.chr_is_ram {
            state.put_bytes("chr_ram", &self.chr);
        }
    }

    fn import(&mut self, state: &MapperState) {
        if let Some(ram) = self.prg_ram.as_mut() {
            restore_bytes(ram, state.bytes("prg_ram"));
        }
        if self.chr_is_ram {
            restore_bytes(&mut self.chr, state.bytes("chr_ram"));
        }
    }
}

// ========================================
// Mapper dispatch
// ========================================

/// Cartridge mapper hardware
#[derive(Debug, Clone)]
pub enum Mapper {
    Nrom(Nrom),
    Mmc1(Mmc1),
    Uxrom(Uxrom),
    Cnrom(Cnrom),
    Mmc3(Mmc3),
}

impl Mapper {
    /// iNES mapper number of this variant
    pub fn id(&self) -> u8 {
        match self {
            Mapper::Nrom(_) => 0,
            Mapper::Mmc1(_) => 1,
            Mapper::Uxrom(_) => 2,
            Mapper::Cnrom(_) => 3,
            Mapper::Mmc3(_) => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mapper::Nrom(_) => Nrom::NAME,
            Mapper::Mmc1(_) => Mmc1::NAME,
            Mapper::Uxrom(_) => Uxrom::NAME,
            Mapper::Cnrom(_) => Cnrom::NAME,
            Mapper::Mmc3(_) => Mmc3::NAME,
        }
    }

    /// Read from CPU space $4020-$FFFF
    pub fn cpu_read(&self, address: u16) -> Result<u8, MapperError> {
        match self {
            Mapper::Nrom(m) => m.cpu_read(address),
            Mapper::Mmc1(m) => m.cpu_read(address),
            Mapper::Uxrom(m) => m.cpu_read(address),
            Mapper::Cnrom(m) => m.cpu_read(address),
            Mapper::Mmc3(m) => m.cpu_read(address),
        }
    }

    /// Write to CPU space $4020-$FFFF
    pub fn cpu_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        match self {
            Mapper::Nrom(m) => m.cpu_write(address, value),
            Mapper::Mmc1(m) => m.cpu_write(address, value),
            Mapper::Uxrom(m) => m.cpu_write(address, value),
            Mapper::Cnrom(m) => m.cpu_write(address, value),
            Mapper::Mmc3(m) => m.cpu_write(address, value),
        }
    }

    /// Read from PPU pattern space $0000-$1FFF
    pub fn ppu_read(&self, address: u16) -> Result<u8, MapperError> {
        match self {
            Mapper::Nrom(m) => m.ppu_read(address),
            Mapper::Mmc1(m) => m.ppu_read(address),
            Mapper::Uxrom(m) => m.ppu_read(address),
            Mapper::Cnrom(m) => m.ppu_read(address),
            Mapper::Mmc3(m) => m.ppu_read(address),
        }
    }

    /// Write to PPU pattern space $0000-$1FFF
    pub fn ppu_write(&mut self, address: u16, value: u8) -> Result<(), MapperError> {
        match self {
            Mapper::Nrom(m) => m.ppu_write(address, value),
            Mapper::Mmc1(m) => m.ppu_write(address, value),
            Mapper::Uxrom(m) => m.ppu_write(address, value),
            Mapper::Cnrom(m) => m.ppu_write(address, value),
            Mapper::Mmc3(m) => m.ppu_write(address, value),
        }
    }

    /// Scanline clock from the PPU; returns true when an IRQ is raised
    pub fn tick(&mut self) -> bool {
        match self {
            Mapper::Mmc3(m) => m.tick(),
            _ => false,
        }
    }

    pub fn prg_rom_page_size(&self) -> usize {
        match self {
            Mapper::Cnrom(_) => Cnrom::PRG_PAGE_SIZE,
            Mapper::Mmc3(_) => Mmc3::PRG_PAGE_SIZE,
            _ => DEFAULT_PRG_PAGE_SIZE,
        }
    }

    pub fn chr_rom_page_size(&self) -> usize {
        match self {
            Mapper::Mmc1(_) => Mmc1::CHR_PAGE_SIZE,
            Mapper::Mmc3(_) => Mmc3::CHR_PAGE_SIZE,
            _ => DEFAULT_CHR_PAGE_SIZE,
        }
    }

    /// Mirroring selected by mapper registers, if the mapper has set one
    pub fn mirroring(&self) -> Option<Mirroring> {
        match self {
            Mapper::Mmc1(m) => m.mirroring(),
            Mapper::Mmc3(m) => m.mirroring(),
            _ => None,
        }
    }

    fn memory(&self) -> &CartridgeMemory {
        match self {
            Mapper::Nrom(m) => &m.memory,
            Mapper::Mmc1(m) => &m.memory,
            Mapper::Uxrom(m) => &m.memory,
            Mapper::Cnrom(m) => &m.memory,
            Mapper::Mmc3(m) => &m.memory,
        }
    }

    fn memory_mut(&mut self) -> &mut CartridgeMemory {
        match self {
            Mapper::Nrom(m) => &mut m.memory,
            Mapper::Mmc1(m) => &mut m.memory,
            Mapper::Uxrom(m) => &mut m.memory,
            Mapper::Cnrom(m) => &mut m.memory,
            Mapper::Mmc3(m) => &mut m.memory,
        }
    }

    /// PRG-RAM contents, for battery save files
    pub fn prg_ram(&self) -> Option<&[u8]> {
        self.memory().prg_ram.as_deref()
    }

    pub fn prg_ram_mut(&mut self) -> Option<&mut [u8]> {
        self.memory_mut().prg_ram.as_deref_mut()
    }

    /// Export registers, IRQ state and cartridge RAM
    pub fn export_state(&self) -> MapperState {
        let mut state = MapperState::new();
        self.memory().export(&mut state);
        match self {
            Mapper::Nrom(_) => {}
            Mapper::Mmc1(m) => m.export_state(&mut state),
            Mapper::Uxrom(m) => m.export_state(&mut state),
            Mapper::Cnrom(m) => m.export_state(&mut state),
            Mapper::Mmc3(m) => m.export_state(&mut state),
        }
        state
    }

    /// Restore a snapshot produced by `export_state`
    pub fn import_state(&mut self, state: &MapperState) {
        self.memory_mut().import(state);
        match self {
            Mapper::Nrom(_) => {}
            Mapper::Mmc1(m) => m.import_state(state),
            Mapper::Uxrom(m) => m.import_state(state),
            Mapper::Cnrom(m) => m.import_state(state),
            Mapper::Mmc3(m) => m.import_state(state),
        }
    }
}

/// Build the mapper named by the cartridge header
///
/// # Errors
/// Returns `MapperError::UnsupportedMapper` for mapper numbers outside 0-4,
/// and `MapperError::InvalidConfiguration` for an image without PRG-ROM.
pub fn create_mapper(cartridge: Cartridge) -> Result<Mapper, MapperError> {
    if cartridge.prg_rom.is_empty() {
        return Err(MapperError::InvalidConfiguration(
            "cartridge has no PRG-ROM".to_string(),
        ));
    }

    let mapper = match cartridge.mapper_id() {
        0 => Mapper::Nrom(Nrom::new(cartridge)),
        1 => Mapper::Mmc1(Mmc1::new(cartridge)),
        2 => Mapper::Uxrom(Uxrom::new(cartridge)),
        3 => Mapper::Cnrom(Cnrom::new(cartridge)),
        4 => Mapper::Mmc3(Mmc3::new(cartridge)),
        id => return Err(MapperError::UnsupportedMapper(id)),
    };

    log::info!("Mapper {} ({})", mapper.id(), mapper.name());
    Ok(mapper)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::cartridge::test_support::build_rom;
    use crate::cartridge::Cartridge;

    /// Parse a synthetic image built by `build_rom`
    pub fn cartridge(prg_pages: u8, chr_pages: u8, mapper: u8, flags6_low: u8) -> Cartridge {
        Cartridge::from_bytes(&build_rom(prg_pages, chr_pages, mapper, flags6_low))
            .expect("synthetic ROM parses")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::cartridge;
    use super::*;

    #[test]
    fn test_create_supported_mappers() {
        for id in 0..=4 {
            let mapper = create_mapper(cartridge(2, 1, id, 0)).unwrap();
            assert_eq!(mapper.id(), id);
        }
    }

    #[test]
    fn test_unsupported_mapper() {
        let result = create_mapper(cartridge(1, 1, 99, 0));
        assert!(matches!(result, Err(MapperError::UnsupportedMapper(99))));
    }

    #[test]
    fn test_empty_prg_is_rejected() {
        let result = create_mapper(cartridge(0, 1, 0, 0));
        assert!(matches!(result, Err(MapperError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_page_sizes() {
        let mmc1 = create_mapper(cartridge(2, 1, 1, 0)).unwrap();
        assert_eq!(mmc1.prg_rom_page_size(), 16 * 1024);
        assert_eq!(mmc1.chr_rom_page_size(), 4 * 1024);

        let cnrom = create_mapper(cartridge(2, 1, 3, 0)).unwrap();
        assert_eq!(cnrom.prg_rom_page_size(), 32 * 1024);

        let mmc3 = create_mapper(cartridge(2, 1, 4, 0)).unwrap();
        assert_eq!(mmc3.prg_rom_page_size(), 8 * 1024);
        assert_eq!(mmc3.chr_rom_page_size(), 1024);
    }

    #[test]
    fn test_page_index_wraps_to_page_count() {
        let memory = CartridgeMemory::new(cartridge(4, 1, 2, 0), false);
        assert_eq!(memory.prg_page_count(16 * 1024), 4);
        assert_eq!(memory.read_prg(5, 16 * 1024, 0), 1);
        assert_eq!(memory.read_prg(3, 16 * 1024, 0x3FFF), 3);
    }

    #[test]
    fn test_chr_rom_rejects_writes() {
        let mut memory = CartridgeMemory::new(cartridge(1, 1, 0, 0), false);
        let result = memory.write_chr("NROM", 0x0010, 0, 8192, 0x10, 0xFF);
        assert!(matches!(result, Err(MapperError::ChrRomWrite { .. })));
    }

    #[test]
    fn test_state_value_json_shape() {
        let mut state = MapperState::new();
        state.put_byte("bank", 3);
        state.put_flag("enabled", true);
        state.put_bytes("ram", &[1, 2]);

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"bank":3,"enabled":true,"ram":[1,2]}"#);

        let restored: MapperState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.byte("bank"), Some(3));
        assert_eq!(restored.flag("enabled"), Some(true));
        assert_eq!(restored.bytes("ram"), Some(&[1u8, 2][..]));
    }
}
