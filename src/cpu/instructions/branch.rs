// Branch instructions for 6502 CPU

use crate::cpu::addressing::AddressingResult;
use crate::cpu::Cpu;

impl Cpu {
    // ========================================
    // Branch Instructions
    // ========================================
    // All branches use relative addressing. Timing:
    // - Not taken: base cycles only
    // - Taken, same page: +1
    // - Taken, crossing a page: +2

    /// BCC - Branch if Carry Clear
    pub fn bcc(&mut self, addr_result: &AddressingResult) {
        self.branch(!self.get_carry(), addr_result);
    }

    /// BCS - Branch if Carry Set
    pub fn bcs(&mut self, addr_result: &AddressingResult) {
        self.branch(self.get_carry(), addr_result);
    }

    /// BEQ - Branch if Equal (Z set)
    pub fn beq(&mut self, addr_result: &AddressingResult) {
        self.branch(self.get_zero(), addr_result);
    }

    /// BNE - Branch if Not Equal (Z clear)
    pub fn bne(&mut self, addr_result: &AddressingResult) {
        self.branch(!self.get_zero(), addr_result);
    }

    /// BMI - Branch if Minus (N set)
    pub fn bmi(&mut self, addr_result: &AddressingResult) {
        self.branch(self.get_negative(), addr_result);
    }

    /// BPL - Branch if Plus (N clear)
    pub fn bpl(&mut self, addr_result: &AddressingResult) {
        self.branch(!self.get_negative(), addr_result);
    }

    /// BVC - Branch if Overflow Clear
    pub fn bvc(&mut self, addr_result: &AddressingResult) {
        self.branch(!self.get_overflow(), addr_result);
    }

    /// BVS - Branch if Overflow Set
    pub fn bvs(&mut self, addr_result: &AddressingResult) {
        self.branch(self.get_overflow(), addr_result);
    }

    /// Take the branch when `condition` holds, charging the extra cycles
    #[inline]
    fn branch(&mut self, condition: bool, addr_result: &AddressingResult) {
        if !condition {
            return;
        }

        self.extra_cycles += 1;
        if addr_result.page_crossed {
            self.extra_cycles += 1;
        }
        self.pc = addr_result.address;
    }
}
