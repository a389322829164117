// Error types shared across the emulation core
//
// Every fatal condition surfaces through `EmuError`, which `Cpu::step` and the
// emulator loop return to the caller. Nothing in the core retries.

use crate::cartridge::{CartridgeError, MapperError};
use thiserror::Error;

/// Fatal emulation errors
#[derive(Debug, Error)]
pub enum EmuError {
    /// The CPU fetched an opcode with no defined behaviour
    #[error("invalid opcode ${opcode:02X} at ${address:04X}")]
    InvalidOpcode { opcode: u8, address: u16 },

    /// A bus access reached a mapper address the cartridge does not decode
    #[error(transparent)]
    Mapper(#[from] MapperError),

    /// The ROM image could not be parsed
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),

    /// An operation needing a cartridge ran before one was loaded
    #[error("no cartridge loaded")]
    NoCartridge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_opcode_reports_location() {
        let err = EmuError::InvalidOpcode {
            opcode: 0x02,
            address: 0xC123,
        };
        assert_eq!(err.to_string(), "invalid opcode $02 at $C123");
    }

    #[test]
    fn test_mapper_error_is_transparent() {
        let err: EmuError = MapperError::UnmappedCpuRead {
            mapper: "CNROM",
            address: 0x6000,
        }
        .into();
        assert_eq!(err.to_string(), "CNROM: unmapped CPU read at $6000");
    }
}
