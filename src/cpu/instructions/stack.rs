// Stack instructions for 6502 CPU

use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::error::EmuError;

impl Cpu {
    // ========================================
    // Stack Instructions
    // ========================================

    /// PHA - Push Accumulator
    pub fn pha(&mut self, bus: &mut Bus) -> Result<(), EmuError> {
        self.stack_push(bus, self.a)
    }

    /// PLA - Pull Accumulator
    ///
    /// Flags affected: Z, N
    pub fn pla(&mut self, bus: &mut Bus) -> Result<(), EmuError> {
        self.a = self.stack_pop(bus)?;
        self.update_zero_and_negative_flags(self.a);
        Ok(())
    }

    /// PHP - Push Processor Status
    ///
    /// The pushed copy has B and bit 5 set.
    pub fn php(&mut self, bus: &mut Bus) -> Result<(), EmuError> {
        self.stack_push(bus, self.status_for_push(true))
    }

    /// PLP - Pull Processor Status
    ///
    /// B is discarded and bit 5 stays set.
    pub fn plp(&mut self, bus: &mut Bus) -> Result<(), EmuError> {
        let value = self.stack_pop(bus)?;
        self.set_status_from_stack(value);
        Ok(())
    }
}
