// Shift and rotate instructions for 6502 CPU
//
// Each operates on A (accumulator mode) or on memory (read-modify-write).

use crate::bits;
use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::Cpu;
use crate::error::EmuError;

impl Cpu {
    /// ASL - Arithmetic Shift Left
    ///
    /// Bit 7 goes to carry, bit 0 becomes 0.
    ///
    /// Flags affected: C, Z, N
    pub fn asl(
        &mut self,
        bus: &mut Bus,
        addr_result: &AddressingResult,
        is_accumulator: bool,
    ) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        let result = value << 1;
        self.set_carry(bits::get_bit(value, 7));
        self.update_zero_and_negative_flags(result);
        self.write_operand(bus, addr_result, is_accumulator, result)
    }

    /// LSR - Logical Shift Right
    ///
    /// Bit 0 goes to carry, bit 7 becomes 0.
    ///
    /// Flags affected: C, Z, N (N always cleared)
    pub fn lsr(
        &mut self,
        bus: &mut Bus,
        addr_result: &AddressingResult,
        is_accumulator: bool,
    ) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        let result = value >> 1;
        self.set_carry(bits::get_bit(value, 0));
        self.update_zero_and_negative_flags(result);
        self.write_operand(bus, addr_result, is_accumulator, result)
    }

    /// ROL - Rotate Left through carry
    ///
    /// Flags affected: C, Z, N
    pub fn rol(
        &mut self,
        bus: &mut Bus,
        addr_result: &AddressingResult,
        is_accumulator: bool,
    ) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        let result = bits::set_bit(value << 1, 0, self.get_carry());
        self.set_carry(bits::get_bit(value, 7));
        self.update_zero_and_negative_flags(result);
        self.write_operand(bus, addr_result, is_accumulator, result)
    }

    /// ROR - Rotate Right through carry
    ///
    /// Flags affected: C, Z, N
    pub fn ror(
        &mut self,
        bus: &mut Bus,
        addr_result: &AddressingResult,
        is_accumulator: bool,
    ) -> Result<(), EmuError> {
        let value = self.read_operand(bus, addr_result)?;
        let result = bits::set_bit(value >> 1, 7, self.get_carry());
        self.set_carry(bits::get_bit(value, 0));
        self.update_zero_and_negative_flags(result);
        self.write_operand(bus, addr_result, is_accumulator, result)
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::addressing::AddressingResult;
    use crate::cpu::instructions::test_support::setup;

    #[test]
    fn test_asl_accumulator() {
        let (mut cpu, mut bus) = setup();
        cpu.a = 0x81;
        let addr = cpu.addr_accumulator();

        cpu.asl(&mut bus, &addr, true).unwrap();

        assert_eq!(cpu.a, 0x02);
        assert!(cpu.get_carry());
        assert!(!cpu.get_negative());
    }

    #[test]
    fn test_lsr_memory() {
        let (mut cpu, mut bus) = setup();
        bus.write(0x0020, 0x01).unwrap();

        cpu.lsr(&mut bus, &AddressingResult::new(0x0020), false).unwrap();

        assert_eq!(bus.read(0x0020).unwrap(), 0x00);
        assert!(cpu.get_carry());
        assert!(cpu.get_zero());
    }

    #[test]
    fn test_rol_shifts_carry_in() {
        let (mut cpu, mut bus) = setup();
        cpu.a = 0x40;
        cpu.set_carry(true);
        let addr = cpu.addr_accumulator();

        cpu.rol(&mut bus, &addr, true).unwrap();

        assert_eq!(cpu.a, 0x81);
        assert!(!cpu.get_carry());
        assert!(cpu.get_negative());
    }

    #[test]
    fn test_ror_memory_carry_round_trip() {
        let (mut cpu, mut bus) = setup();
        bus.write(0x0021, 0x01).unwrap();
        cpu.set_carry(false);

        cpu.ror(&mut bus, &AddressingResult::new(0x0021), false).unwrap();
        assert_eq!(bus.read(0x0021).unwrap(), 0x00);
        assert!(cpu.get_carry());

        cpu.ror(&mut bus, &AddressingResult::new(0x0021), false).unwrap();
        assert_eq!(bus.read(0x0021).unwrap(), 0x80);
        assert!(!cpu.get_carry());
    }
}
