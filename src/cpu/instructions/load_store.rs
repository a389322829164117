// Load and store instructions for 6502 CPU

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::Cpu;
use crate::error::EmuError;

impl Cpu {
    // ========================================
    // Load Instructions
    // ========================================
    // Load instructions read a value into a register
    // and update the Zero (Z) and Negative (N) flags.

    /// LDA - Load Accumulator
    ///
    /// Flags affected: Z, N
    pub fn lda(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        self.a = self.read_operand(bus, addr_result)?;
        self.update_zero_and_negative_flags(self.a);
        Ok(())
    }

    /// LDX - Load X Register
    ///
    /// Flags affected: Z, N
    pub fn ldx(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        self.x = self.read_operand(bus, addr_result)?;
        self.update_zero_and_negative_flags(self.x);
        Ok(())
    }

    /// LDY - Load Y Register
    ///
    /// Flags affected: Z, N
    pub fn ldy(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        self.y = self.read_operand(bus, addr_result)?;
        self.update_zero_and_negative_flags(self.y);
        Ok(())
    }

    // ========================================
    // Store Instructions
    // ========================================
    // Stores never touch flags.

    /// STA - Store Accumulator
    pub fn sta(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        Ok(bus.write(addr_result.address, self.a)?)
    }

    /// STX - Store X Register
    pub fn stx(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        Ok(bus.write(addr_result.address, self.x)?)
    }

    /// STY - Store Y Register
    pub fn sty(&mut self, bus: &mut Bus, addr_result: &AddressingResult) -> Result<(), EmuError> {
        Ok(bus.write(addr_result.address, self.y)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::addressing::AddressingResult;
    use crate::cpu::instructions::test_support::setup;

    #[test]
    fn test_lda_immediate_flags() {
        let (mut cpu, mut bus) = setup();

        cpu.lda(&mut bus, &AddressingResult::immediate(0x00)).unwrap();
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.get_zero());
        assert!(!cpu.get_negative());

        cpu.lda(&mut bus, &AddressingResult::immediate(0x80)).unwrap();
        assert!(!cpu.get_zero());
        assert!(cpu.get_negative());
    }

    #[test]
    fn test_ldx_ldy_from_memory() {
        let (mut cpu, mut bus) = setup();
        bus.write(0x0042, 0x37).unwrap();

        cpu.ldx(&mut bus, &AddressingResult::new(0x0042)).unwrap();
        cpu.ldy(&mut bus, &AddressingResult::new(0x0042)).unwrap();

        assert_eq!(cpu.x, 0x37);
        assert_eq!(cpu.y, 0x37);
    }

    #[test]
    fn test_stores_leave_flags_alone() {
        let (mut cpu, mut bus) = setup();
        cpu.a = 0x00;
        cpu.x = 0x81;
        cpu.y = 0x7F;
        let status = cpu.status;

        cpu.sta(&mut bus, &AddressingResult::new(0x0010)).unwrap();
        cpu.stx(&mut bus, &AddressingResult::new(0x0011)).unwrap();
        cpu.sty(&mut bus, &AddressingResult::new(0x0812)).unwrap();

        assert_eq!(bus.read(0x0010).unwrap(), 0x00);
        assert_eq!(bus.read(0x0011).unwrap(), 0x81);
        assert_eq!(bus.read(0x0012).unwrap(), 0x7F, "RAM mirrors every 2KB");
        assert_eq!(cpu.status, status);
    }
}
