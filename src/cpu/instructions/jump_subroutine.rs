// Jump and subroutine instructions for 6502 CPU

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::Cpu;
use crate::error::EmuError;

impl Cpu {
    // ========================================
    // Jump Instructions
    // ========================================

    /// JMP - Jump
    ///
    /// Sets PC to the effective address (absolute or indirect). Flags are
    /// not affected.
    pub fn jmp(&mut self, addr_result: &AddressingResult) {
        self.pc = addr_result.address;
    }

    // ========================================
    // Subroutine Instructions
    // ========================================

    /// JSR - Jump to Subroutine
    ///
    /// Pushes the address of the last byte of the JSR instruction (PC - 1)
    /// and jumps. RTS adds the 1 back.
    ///
    /// Stack operation:
    /// 1. Push (PC - 1) high byte
    /// 2. Push (PC - 1) low byte
    /// 3. Set PC to target address
    ///
    /// Cycles: 6
    pub fn jsr(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        self.stack_push_u16(bus, self.pc.wrapping_sub(1))?;
        self.pc = addr_result.address;
        Ok(())
    }

    /// RTS - Return from Subroutine
    ///
    /// Pops the return address and adds 1.
    ///
    /// Cycles: 6
    pub fn rts(&mut self, bus: &mut Bus) -> Result<(), EmuError> {
        self.pc = self.stack_pop_u16(bus)?.wrapping_add(1);
        Ok(())
    }
}
