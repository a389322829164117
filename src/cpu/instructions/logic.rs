// Logical instructions for 6502 CPU

use crate::bits;
use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::Cpu;
use crate::error::EmuError;

impl Cpu {
    // ========================================
    // Logical Instructions
    // ========================================

    /// AND - Logical AND with the accumulator
    ///
    /// Flags affected: Z, N
    pub fn and(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        self.a &= self.read_operand(bus, addr_result)?;
        self.update_zero_and_negative_flags(self.a);
        Ok(())
    }

    /// ORA - Logical inclusive OR with the accumulator
    ///
    /// Flags affected: Z, N
    pub fn ora(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        self.a |= self.read_operand(bus, addr_result)?;
        self.update_zero_and_negative_flags(self.a);
        Ok(())
    }

    /// EOR - Exclusive OR with the accumulator
    ///
    /// Flags affected: Z, N
    pub fn eor(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        self.a ^= self.read_operand(bus, addr_result)?;
        self.update_zero_and_negative_flags(self.a);
        Ok(())
    }

    /// BIT - Bit Test
    ///
    /// Z reflects `A & M`; N and V are copied from bits 7 and 6 of the
    /// memory operand. A is unchanged.
    ///
    /// Flags affected: Z, V, N
    pub fn bit(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        self.set_zero(self.a & value == 0);
        self.set_overflow(bits::get_bit(value, 6));
        self.set_negative(bits::get_bit(value, 7));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::addressing::AddressingResult;
    use crate::cpu::instructions::test_support::setup;

    #[test]
    fn test_and_masks_accumulator() {
        let (mut cpu, mut bus) = setup();
        cpu.a = 0b1100_1100;
        cpu.and(&mut bus, &AddressingResult::immediate(0b1010_1010)).unwrap();
        assert_eq!(cpu.a, 0b1000_1000);
        assert!(cpu.get_negative());
    }

    #[test]
    fn test_ora_and_eor() {
        let (mut cpu, mut bus) = setup();
        cpu.a = 0x0F;
        cpu.ora(&mut bus, &AddressingResult::immediate(0x30)).unwrap();
        assert_eq!(cpu.a, 0x3F);

        cpu.eor(&mut bus, &AddressingResult::immediate(0x3F)).unwrap();
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.get_zero());
    }

    #[test]
    fn test_bit_copies_high_bits_from_memory() {
        let (mut cpu, mut bus) = setup();
        bus.write(0x0040, 0xC0).unwrap();
        cpu.a = 0x01;

        cpu.bit(&mut bus, &AddressingResult::new(0x0040)).unwrap();

        assert!(cpu.get_zero());
        assert!(cpu.get_negative());
        assert!(cpu.get_overflow());
        assert_eq!(cpu.a, 0x01);
    }

    #[test]
    fn test_bit_nonzero_clears_zero() {
        let (mut cpu, mut bus) = setup();
        bus.write(0x0040, 0x01).unwrap();
        cpu.a = 0x01;
        cpu.set_overflow(true);

        cpu.bit(&mut bus, &AddressingResult::new(0x0040)).unwrap();

        assert!(!cpu.get_zero());
        assert!(!cpu.get_overflow());
    }
}
