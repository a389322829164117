// Flag instructions for 6502 CPU

use crate::cpu::Cpu;

impl Cpu {
    pub fn clc(&mut self) {
        self.set_carry(false);
    }

    pub fn sec(&mut self) {
        self.set_carry(true);
    }

    pub fn cli(&mut self) {
        self.set_interrupt_disable(false);
    }

    pub fn sei(&mut self) {
        self.set_interrupt_disable(true);
    }

    pub fn clv(&mut self) {
        self.set_overflow(false);
    }

    /// CLD - Clear Decimal. The flag is stored but arithmetic stays binary.
    pub fn cld(&mut self) {
        self.set_decimal(false);
    }

    pub fn sed(&mut self) {
        self.set_decimal(true);
    }
}
