// Instructions module for 6502 CPU
// This module organizes CPU instructions by semantic grouping

pub mod arithmetic;
pub mod branch;
pub mod compare;
pub mod flags;
pub mod jump_subroutine;
pub mod load_store;
pub mod logic;
pub mod miscellaneous;
pub mod shift_rotate;
pub mod stack;
pub mod transfer;

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::error::EmuError;

impl crate::cpu::Cpu {
    // ========================================
    // Helper Functions
    // ========================================

    /// Read the operand named by an addressing result
    ///
    /// Immediate and accumulator modes carry their value; every other mode
    /// reads the effective address through the bus.
    #[inline]
    pub(crate) fn read_operand(
        &self,
        bus: &mut Bus,
        addr_result: &AddressingResult,
    ) -> Result<u8, EmuError> {
        match addr_result.value {
            Some(value) => Ok(value),
            None => Ok(bus.read(addr_result.address)?),
        }
    }

    /// Store a read-modify-write result back to A or memory
    #[inline]
    pub(crate) fn write_operand(
        &mut self,
        bus: &mut Bus,
        addr_result: &AddressingResult,
        is_accumulator: bool,
        value: u8,
    ) -> Result<(), EmuError> {
        if is_accumulator {
            self.a = value;
        } else {
            bus.write(addr_result.address, value)?;
        }
        Ok(())
    }
}
