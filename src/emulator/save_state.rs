// Save state functionality
//
// Serializes the complete machine state to JSON so a session can be resumed
// later with bit-identical behaviour. Slot files live under
// `<save_directory>/<rom stem>/slot_<n>.state`.

use super::Emulator;
use crate::apu::ApuState;
use crate::bus::RAM_SIZE;
use crate::cartridge::MapperState;
use crate::cpu::CpuState;
use crate::input::ControllerIO;
use crate::ppu::PpuState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current save state format version
pub const SAVE_STATE_VERSION: u32 = 1;

/// Errors that can occur during save state operations
#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("State belongs to {found}, but {expected} is loaded")]
    RomMismatch { expected: String, found: String },

    #[error("No ROM loaded")]
    NoRomLoaded,

    #[error("Invalid save slot {slot} (have {slots})")]
    InvalidSlot { slot: u8, slots: u8 },

    #[error("Save state memory size mismatch: {0}")]
    SizeMismatch(String),
}

/// Complete emulator save state
///
/// Contains all the state needed to restore the emulator to an exact point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    /// Timestamp when the save state was created (RFC 3339)
    pub timestamp: String,

    /// ROM identifier (file name for validation)
    pub rom_name: Option<String>,

    pub cpu: CpuState,
    pub ppu: PpuState,
    pub apu: ApuState,

    /// Fraction of an APU cycle owed by the emulator loop
    pub apu_remainder: f64,

    /// Work RAM contents
    pub ram: Vec<u8>,

    pub controllers: ControllerIO,

    /// Mapper registers, IRQ state and cartridge RAM
    pub mapper: MapperState,
}

impl SaveState {
    /// Capture the emulator's current state
    ///
    /// # Errors
    ///
    /// `NoRomLoaded` when no cartridge is inserted
    pub fn from_emulator(emulator: &Emulator) -> Result<Self, SaveStateError> {
        let bus = emulator.bus();
        let mapper = bus.mapper().ok_or(SaveStateError::NoRomLoaded)?;

        Ok(SaveState {
            version: SAVE_STATE_VERSION,
            timestamp: chrono::Local::now().to_rfc3339(),
            rom_name: emulator.rom_name().map(str::to_string),
            cpu: emulator.cpu().state(),
            ppu: bus.ppu().state(),
            apu: bus.apu().state(),
            apu_remainder: emulator.apu_remainder(),
            ram: bus.ram().to_vec(),
            controllers: bus.controllers().clone(),
            mapper: mapper.export_state(),
        })
    }

    /// Restore emulator state from this save state
    ///
    /// Everything is validated before the emulator is touched, so a rejected
    /// state leaves the running session intact.
    pub fn restore_to_emulator(&self, emulator: &mut Emulator) -> Result<(), SaveStateError> {
        if self.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::VersionMismatch {
                expected: SAVE_STATE_VERSION,
                found: self.version,
            });
        }

        if let (Some(expected), Some(found)) = (emulator.rom_name(), self.rom_name.as_deref()) {
            if expected != found {
                return Err(SaveStateError::RomMismatch {
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }

        // Validate array sizes before copying to prevent panics
        if self.ram.len() != RAM_SIZE || !self.ppu.sizes_valid() {
            return Err(SaveStateError::SizeMismatch(format!(
                "ram={} (expected {}), vram={}, palette={}, oam={}",
                self.ram.len(),
                RAM_SIZE,
                self.ppu.vram.len(),
                self.ppu.palette.len(),
                self.ppu.oam.len()
            )));
        }

        if !emulator.bus().has_cartridge() {
            return Err(SaveStateError::NoRomLoaded);
        }

        emulator.cpu_mut().restore_state(&self.cpu);
        emulator.set_apu_remainder(self.apu_remainder);

        let bus = emulator.bus_mut();
        bus.ram_mut().copy_from_slice(&self.ram);
        bus.ppu_mut().restore_state(&self.ppu);
        bus.apu_mut().restore_state(&self.apu);
        *bus.controllers_mut() = self.controllers.clone();
        if let Some(mapper) = bus.mapper_mut() {
            mapper.import_state(&self.mapper);
        }

        Ok(())
    }

    /// Save this save state to a slot file
    ///
    /// # Returns
    ///
    /// The path of the written file
    pub fn save_to_file(
        &self,
        save_directory: &Path,
        slot: u8,
        rom_path: Option<&Path>,
    ) -> Result<PathBuf, SaveStateError> {
        let save_dir = Self::get_save_directory(save_directory, rom_path);
        fs::create_dir_all(&save_dir)?;

        let file_path = save_dir.join(format!("slot_{}.state", slot));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&file_path, json)?;

        Ok(file_path)
    }

    /// Load a save state from a slot file
    pub fn load_from_file(
        save_directory: &Path,
        slot: u8,
        rom_path: Option<&Path>,
    ) -> Result<Self, SaveStateError> {
        let file_path = Self::get_save_directory(save_directory, rom_path)
            .join(format!("slot_{}.state", slot));

        let json = fs::read_to_string(file_path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Creates a directory structure like: saves/<rom_name>/
    fn get_save_directory(base_dir: &Path, rom_path: Option<&Path>) -> PathBuf {
        match rom_path.and_then(|p| p.file_stem()) {
            Some(rom_name) => base_dir.join(rom_name),
            None => base_dir.join("default"),
        }
    }
}
