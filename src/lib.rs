// NES Emulator Library
// Core library: 6502 CPU, PPU, cartridge mappers and the emulator loop

// Public modules
pub mod apu;
pub mod bits;
pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod emulator;
pub mod error;
pub mod input;
pub mod ppu;

// Re-export main types for convenience
pub use apu::Apu;
pub use bus::Bus;
pub use cartridge::{Cartridge, CartridgeError, INesHeader, Mapper, MapperError, Mirroring};
pub use cpu::{Cpu, CpuState, Interrupt};
pub use emulator::{Emulator, EmulatorConfig, SaveState, SaveStateError, SpeedMode};
pub use error::EmuError;
pub use input::{Button, Controller, ControllerIO};
pub use ppu::{Ppu, PpuState};
