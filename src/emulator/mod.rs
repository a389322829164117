// Emulator module - Main emulator coordinator
//
// This module provides the main emulator interface that owns the CPU and the
// bus (and through it the PPU, APU, controllers and cartridge), drives them in
// lockstep, and implements save states, screenshots and configuration.
//
// # Clocking
//
// The CPU is the master. Each instruction's cycle count is turned into three
// PPU dots per cycle and half an APU cycle per cycle. Interrupts the PPU or
// mapper raise during those dots are dispatched to the CPU straight away, and
// the cycles they cost are clocked into the PPU and APU as well.

mod config;
mod save_state;
mod screenshot;

pub use config::{
    AudioConfig, EmulationConfig, EmulatorConfig, SaveStateConfig, ScreenshotConfig, SpeedMode,
    VideoConfig, CONFIG_FILE,
};
pub use save_state::{SaveState, SaveStateError, SAVE_STATE_VERSION};
pub use screenshot::{encode_png, save_screenshot, ScreenshotError};

use crate::bus::Bus;
use crate::cartridge::{create_mapper, Cartridge};
use crate::cpu::{Cpu, Interrupt};
use crate::error::EmuError;
use crate::input::Button;
use std::path::{Path, PathBuf};

/// PPU dots per CPU cycle (NTSC)
pub const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;

/// APU cycles per CPU cycle
pub const APU_CYCLES_PER_CPU_CYCLE: f64 = 0.5;

/// Main emulator structure
///
/// Coordinates all NES components and provides high-level functionality
/// for running games, saving/loading states, and managing configuration.
pub struct Emulator {
    /// CPU (6502 processor)
    cpu: Cpu,

    /// Bus (connects all components)
    bus: Bus,

    /// Configuration
    config: EmulatorConfig,

    /// Currently loaded ROM path
    rom_path: Option<PathBuf>,

    /// Name checked against save states
    rom_name: Option<String>,

    /// Fractional APU cycles carried between steps
    apu_remainder: f64,

    /// Samples produced and not yet collected
    samples: Vec<f32>,

    /// Interrupts raised by the PPU or mapper during the current step
    raised: Vec<Interrupt>,

    /// Paused state
    paused: bool,

    /// Speed mode
    speed_mode: SpeedMode,
}

impl Emulator {
    /// Create a new emulator instance
    ///
    /// The configuration is read from `emulator_config.toml` (and written
    /// there if missing). No cartridge is loaded.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nes_machine::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// ```
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::load_or_default())
    }

    /// Create an emulator with an explicit configuration
    pub fn with_config(config: EmulatorConfig) -> Self {
        let speed_mode = config.emulation.speed;
        let mut emulator = Emulator {
            cpu: Cpu::new(),
            bus: Bus::new(),
            config,
            rom_path: None,
            rom_name: None,
            apu_remainder: 0.0,
            samples: Vec::new(),
            raised: Vec::with_capacity(2),
            paused: false,
            speed_mode,
        };
        emulator.apply_config();
        emulator
    }

    /// Push configuration values into the components that use them
    fn apply_config(&mut self) {
        self.bus
            .ppu_mut()
            .set_grayscale_override(self.config.video.grayscale_override);
        self.bus
            .apu_mut()
            .set_sample_rate(self.config.audio.sample_rate);
    }

    // ========================================
    // Cartridge loading
    // ========================================

    /// Load an iNES image
    ///
    /// Builds the mapper, installs it with fresh RAM, PPU, APU and
    /// controllers, and runs the RESET sequence. `save_file` holds
    /// battery-backed PRG-RAM contents from an earlier [`Emulator::save_file`].
    ///
    /// # Errors
    ///
    /// Malformed images and unsupported mappers. The previous cartridge is
    /// kept when loading fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nes_machine::Emulator;
    ///
    /// let rom = std::fs::read("game.nes").unwrap();
    /// let mut emulator = Emulator::new();
    /// emulator.load_rom(&rom, None).expect("Failed to load ROM");
    /// ```
    pub fn load_rom(&mut self, rom: &[u8], save_file: Option<&[u8]>) -> Result<(), EmuError> {
        let cartridge = Cartridge::from_bytes(rom)?;
        let mirroring = cartridge.mirroring();
        log::info!(
            "Loaded ROM: mapper {}, {}x16KB PRG, {}x8KB CHR{}, {:?} mirroring",
            cartridge.mapper_id(),
            cartridge.header.prg_pages,
            cartridge.header.chr_pages,
            if cartridge.header.uses_chr_ram() { " (RAM)" } else { "" },
            mirroring
        );

        let mut mapper = create_mapper(cartridge)?;
        if let Some(save) = save_file {
            match mapper.prg_ram_mut() {
                Some(ram) if ram.len() == save.len() => ram.copy_from_slice(save),
                Some(ram) => log::warn!(
                    "ignoring save file of {} bytes (PRG-RAM is {} bytes)",
                    save.len(),
                    ram.len()
                ),
                None => log::warn!("ignoring save file: cartridge has no PRG-RAM"),
            }
        }

        self.bus = Bus::new();
        self.bus.insert_cartridge(mapper, mirroring);
        self.cpu = Cpu::new();
        self.apu_remainder = 0.0;
        self.samples.clear();
        self.rom_path = None;
        self.rom_name = None;
        self.apply_config();

        self.cpu.reset(&mut self.bus)?;
        Ok(())
    }

    /// Load an iNES file from disk
    ///
    /// Save states for this session are filed under the ROM's stem.
    pub fn load_rom_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        save_file: Option<&[u8]>,
    ) -> Result<(), EmuError> {
        let path = path.as_ref();
        let rom = std::fs::read(path).map_err(crate::cartridge::CartridgeError::from)?;
        self.load_rom(&rom, save_file)?;

        self.rom_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        self.rom_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Battery-backed PRG-RAM contents, if the cartridge has PRG-RAM
    pub fn save_file(&self) -> Option<&[u8]> {
        self.bus.mapper()?.prg_ram()
    }

    /// Reset the emulator
    ///
    /// Acts like the console's reset button: the CPU runs its RESET sequence
    /// and the PPU and APU registers are cleared. Memory is kept.
    pub fn reset(&mut self) -> Result<(), EmuError> {
        if !self.bus.has_cartridge() {
            return Err(EmuError::NoCartridge);
        }
        self.bus.ppu_mut().reset();
        self.bus.apu_mut().reset();
        self.apu_remainder = 0.0;
        self.cpu.reset(&mut self.bus)?;
        self.paused = false;
        Ok(())
    }

    // ========================================
    // Running
    // ========================================

    /// Execute one CPU instruction and the PPU/APU cycles it covers
    ///
    /// # Returns
    ///
    /// CPU cycles consumed, including any interrupt dispatched along the way
    pub fn step(&mut self) -> Result<u32, EmuError> {
        if !self.bus.has_cartridge() {
            return Err(EmuError::NoCartridge);
        }

        let mut cycles = self.cpu.step(&mut self.bus)? as u32;
        let mut dots = cycles * PPU_DOTS_PER_CPU_CYCLE;
        self.raised.clear();

        while dots > 0 {
            dots -= 1;
            let raised = &mut self.raised;
            self.bus.step_ppu(&mut |kind: Interrupt| raised.push(kind))?;

            for kind in self.raised.drain(..) {
                let extra = self.cpu.interrupt(&mut self.bus, kind)? as u32;
                cycles += extra;
                dots += extra * PPU_DOTS_PER_CPU_CYCLE;
            }
        }

        self.clock_apu(cycles);
        Ok(cycles)
    }

    fn clock_apu(&mut self, cpu_cycles: u32) {
        self.apu_remainder += cpu_cycles as f64 * APU_CYCLES_PER_CPU_CYCLE;
        while self.apu_remainder >= 1.0 {
            self.apu_remainder -= 1.0;
            if let Some(sample) = self.bus.apu_mut().step() {
                self.samples.push(sample);
            }
        }

        // Keep at most one second of audio nobody collected
        let limit = self.config.audio.sample_rate.max(1) as usize;
        if self.samples.len() > limit {
            let excess = self.samples.len() - limit;
            self.samples.drain(..excess);
        }
    }

    /// Run until the PPU completes a frame
    pub fn frame(&mut self) -> Result<(), EmuError> {
        let start = self.bus.ppu().frame();
        while self.bus.ppu().frame() == start {
            self.step()?;
        }
        Ok(())
    }

    /// Run until the PPU moves to another scanline
    pub fn scanline(&mut self) -> Result<(), EmuError> {
        let start = (self.bus.ppu().frame(), self.bus.ppu().scanline());
        while (self.bus.ppu().frame(), self.bus.ppu().scanline()) == start {
            self.step()?;
        }
        Ok(())
    }

    /// Run until `count` audio samples were produced and return them
    ///
    /// Samples already buffered are returned first. Produced samples are
    /// moved out after every step, so `count` is not bounded by the
    /// one-second buffer cap.
    pub fn samples(&mut self, count: usize) -> Result<Vec<f32>, EmuError> {
        let mut collected = Vec::with_capacity(count);
        loop {
            let available = (count - collected.len()).min(self.samples.len());
            collected.extend(self.samples.drain(..available));
            if collected.len() == count {
                return Ok(collected);
            }
            self.step()?;
        }
    }

    /// Take every sample produced so far
    pub fn take_samples(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }

    /// Current frame as `0x00RRGGBB` pixels, 256x240
    pub fn frame_buffer(&self) -> &[u32] {
        self.bus.ppu().frame_buffer()
    }

    /// Press or release a button on controller 1 or 2
    pub fn set_button(&mut self, player: u8, button: Button, pressed: bool) {
        self.bus
            .controllers_mut()
            .set_button(player, button, pressed);
    }

    // ========================================
    // Save states
    // ========================================

    /// Capture the complete machine state
    pub fn snapshot(&self) -> Result<SaveState, SaveStateError> {
        SaveState::from_emulator(self)
    }

    /// Restore a state taken with [`Emulator::snapshot`]
    pub fn restore(&mut self, state: &SaveState) -> Result<(), SaveStateError> {
        state.restore_to_emulator(self)
    }

    /// Save state to a file slot
    ///
    /// # Returns
    ///
    /// The path of the written slot file
    pub fn save_state(&self, slot: u8) -> Result<PathBuf, SaveStateError> {
        self.check_slot(slot)?;
        let save_state = self.snapshot()?;
        let path = save_state.save_to_file(
            &self.config.save_state.save_directory,
            slot,
            self.rom_path.as_deref(),
        )?;
        log::info!("Saved state to {}", path.display());
        Ok(path)
    }

    /// Quick save to slot 0
    pub fn quick_save(&self) -> Result<PathBuf, SaveStateError> {
        self.save_state(0)
    }

    /// Load state from a file slot
    pub fn load_state(&mut self, slot: u8) -> Result<(), SaveStateError> {
        self.check_slot(slot)?;
        let save_state = SaveState::load_from_file(
            &self.config.save_state.save_directory,
            slot,
            self.rom_path.as_deref(),
        )?;
        self.restore(&save_state)?;
        log::info!("Loaded state from slot {}", slot);
        Ok(())
    }

    /// Quick load from slot 0
    pub fn quick_load(&mut self) -> Result<(), SaveStateError> {
        self.load_state(0)
    }

    fn check_slot(&self, slot: u8) -> Result<(), SaveStateError> {
        let slots = self.config.save_state.slots;
        if slot >= slots {
            return Err(SaveStateError::InvalidSlot { slot, slots });
        }
        Ok(())
    }

    // ========================================
    // Screenshots
    // ========================================

    /// Save the current frame buffer as a PNG file
    ///
    /// # Returns
    ///
    /// The path to the saved screenshot
    pub fn screenshot(&self) -> Result<PathBuf, ScreenshotError> {
        save_screenshot(
            self.frame_buffer(),
            &self.config.screenshot.screenshot_directory,
            self.rom_path.as_deref(),
            self.config.screenshot.include_timestamp,
        )
    }

    // ========================================
    // Speed and pause
    // ========================================

    pub fn set_speed_mode(&mut self, mode: SpeedMode) {
        self.speed_mode = mode;
    }

    pub fn speed_mode(&self) -> SpeedMode {
        self.speed_mode
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ========================================
    // Accessors
    // ========================================

    /// Get reference to CPU
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Get mutable reference to CPU
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Get reference to Bus
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Get mutable reference to Bus
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Replace the configuration and apply it
    pub fn set_config(&mut self, config: EmulatorConfig) {
        self.config = config;
        self.apply_config();
    }

    /// Get the currently loaded ROM path
    pub fn rom_path(&self) -> Option<&Path> {
        self.rom_path.as_deref()
    }

    pub fn rom_name(&self) -> Option<&str> {
        self.rom_name.as_deref()
    }

    /// Name recorded in and checked against save states
    pub fn set_rom_name(&mut self, name: &str) {
        self.rom_name = Some(name.to_string());
    }

    pub(crate) fn apu_remainder(&self) -> f64 {
        self.apu_remainder
    }

    pub(crate) fn set_apu_remainder(&mut self, remainder: f64) {
        self.apu_remainder = remainder;
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::with_config(EmulatorConfig::default())
    }
}
