// Compare instructions for 6502 CPU

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::Cpu;
use crate::error::EmuError;

impl Cpu {
    // ========================================
    // Compare Instructions
    // ========================================
    // Compare a register with memory by subtraction without storing the
    // result:
    // - C set when register >= memory (unsigned)
    // - Z set when register == memory
    // - N from bit 7 of (register - memory)

    #[inline]
    fn compare(&mut self, register: u8, value: u8) {
        self.set_carry(register >= value);
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    /// CMP - Compare Accumulator
    pub fn cmp(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        self.compare(self.a, value);
        Ok(())
    }

    /// CPX - Compare X Register
    pub fn cpx(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        self.compare(self.x, value);
        Ok(())
    }

    /// CPY - Compare Y Register
    pub fn cpy(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        self.compare(self.y, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::addressing::AddressingResult;
    use crate::cpu::instructions::test_support::setup;

    #[test]
    fn test_cmp_equal() {
        let (mut cpu, mut bus) = setup();
        cpu.a = 0x42;
        cpu.cmp(&mut bus, &AddressingResult::immediate(0x42)).unwrap();
        assert!(cpu.get_carry());
        assert!(cpu.get_zero());
        assert!(!cpu.get_negative());
    }

    #[test]
    fn test_cmp_less_than() {
        let (mut cpu, mut bus) = setup();
        cpu.a = 0x10;
        cpu.cmp(&mut bus, &AddressingResult::immediate(0x20)).unwrap();
        assert!(!cpu.get_carry());
        assert!(!cpu.get_zero());
        assert!(cpu.get_negative());
    }

    #[test]
    fn test_cpx_cpy_greater_than() {
        let (mut cpu, mut bus) = setup();
        bus.write(0x0050, 0x01).unwrap();
        cpu.x = 0x80;
        cpu.y = 0x02;

        cpu.cpx(&mut bus, &AddressingResult::new(0x0050)).unwrap();
        assert!(cpu.get_carry());
        assert!(!cpu.get_negative(), "0x80 - 0x01 = 0x7F");

        cpu.cpy(&mut bus, &AddressingResult::new(0x0050)).unwrap();
        assert!(cpu.get_carry());
        assert!(!cpu.get_zero());
    }

    #[test]
    fn test_compare_does_not_touch_overflow() {
        let (mut cpu, mut bus) = setup();
        cpu.set_overflow(true);
        cpu.a = 0x00;
        cpu.cmp(&mut bus, &AddressingResult::immediate(0x80)).unwrap();
        assert!(cpu.get_overflow());
    }
}
