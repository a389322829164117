// Arithmetic instructions for 6502 CPU

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::Cpu;
use crate::error::EmuError;

impl Cpu {
    // ========================================
    // Arithmetic Instructions
    // ========================================

    /// Binary add of `value` and the carry into A
    ///
    /// The Overflow (V) flag is set when the operand has the same sign as the
    /// old accumulator but the result does not. Decimal mode is ignored: the
    /// 2A03 has no BCD unit.
    fn add_with_carry(&mut self, value: u8) {
        let sum = self.a as u16 + value as u16 + self.get_carry() as u16;
        let result = sum as u8;

        self.set_carry(sum > 0xFF);
        self.set_overflow((self.a ^ value) & 0x80 == 0 && (self.a ^ result) & 0x80 != 0);

        self.a = result;
        self.update_zero_and_negative_flags(result);
    }

    /// ADC - Add with Carry
    ///
    /// Formula: A = A + M + C
    ///
    /// Flags affected: C, Z, V, N
    pub fn adc(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        self.add_with_carry(value);
        Ok(())
    }

    /// SBC - Subtract with Carry
    ///
    /// Formula: A = A - M - (1 - C), computed as ADC with 255 - M.
    ///
    /// Flags affected: C, Z, V, N
    pub fn sbc(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        self.add_with_carry(255 - value);
        Ok(())
    }

    /// INC - Increment Memory
    ///
    /// Flags affected: Z, N
    pub fn inc(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        let result = bus.read(addr_result.address)?.wrapping_add(1);
        bus.write(addr_result.address, result)?;
        self.update_zero_and_negative_flags(result);
        Ok(())
    }

    /// DEC - Decrement Memory
    ///
    /// Flags affected: Z, N
    pub fn dec(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        let result = bus.read(addr_result.address)?.wrapping_sub(1);
        bus.write(addr_result.address, result)?;
        self.update_zero_and_negative_flags(result);
        Ok(())
    }

    /// INX - Increment X Register (Z, N)
    pub fn inx(&mut self) {
        self.x = self.x.wrapping_add(1);
        self.update_zero_and_negative_flags(self.x);
    }

    /// INY - Increment Y Register (Z, N)
    pub fn iny(&mut self) {
        self.y = self.y.wrapping_add(1);
        self.update_zero_and_negative_flags(self.y);
    }

    /// DEX - Decrement X Register (Z, N)
    pub fn dex(&mut self) {
        self.x = self.x.wrapping_sub(1);
        self.update_zero_and_negative_flags(self.x);
    }

    /// DEY - Decrement Y Register (Z, N)
    pub fn dey(&mut self) {
        self.y = self.y.wrapping_sub(1);
        self.update_zero_and_negative_flags(self.y);
    }
}
