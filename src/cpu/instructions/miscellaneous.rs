// Miscellaneous instructions for 6502 CPU: BRK, RTI, NOP

use crate::bus::Bus;
use crate::cpu::{Cpu, Interrupt};
use crate::error::EmuError;

impl Cpu {
    /// BRK - Force Interrupt
    ///
    /// Software interrupt through the IRQ vector. The byte after BRK is a
    /// padding byte, so the pushed return address is PC + 1.
    ///
    /// Stack operation:
    /// 1. Push (PC + 1) high byte, then low byte
    /// 2. Push P with B and bit 5 set
    /// 3. Set I and load PC from $FFFE-$FFFF
    ///
    /// Cycles: 7 (charged by the opcode table)
    pub fn brk(&mut self, bus: &mut Bus) -> Result<(), EmuError> {
        self.stack_push_u16(bus, self.pc.wrapping_add(1))?;
        self.stack_push(bus, self.status_for_push(true))?;
        self.set_interrupt_disable(true);
        self.pc = bus.read_u16(Interrupt::Irq.vector())?;
        Ok(())
    }

    /// RTI - Return from Interrupt
    ///
    /// Pulls P (dropping B) and then PC. Unlike RTS there is no +1.
    pub fn rti(&mut self, bus: &mut Bus) -> Result<(), EmuError> {
        let status = self.stack_pop(bus)?;
        self.set_status_from_stack(status);
        self.pc = self.stack_pop_u16(bus)?;
        Ok(())
    }

    pub fn nop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use crate::bus::test_support::bus_with_program;
    use crate::cpu::{flags, Cpu, Interrupt};

    #[test]
    fn test_brk_pushes_pc_plus_one_and_break_flag() {
        let mut bus = bus_with_program(&[], 0x8000, 0x9000, 0xA000);
        let mut cpu = Cpu::new();
        cpu.sp = 0xFD;
        cpu.pc = 0x8001; // past the BRK opcode
        cpu.status = flags::UNUSED | flags::CARRY;

        cpu.brk(&mut bus).unwrap();

        assert_eq!(cpu.pc, 0xA000);
        assert_eq!(bus.read(0x01FD).unwrap(), 0x80);
        assert_eq!(bus.read(0x01FC).unwrap(), 0x02);
        assert_eq!(bus.read(0x01FB).unwrap(), 0x31);
        assert!(cpu.get_interrupt_disable());
    }

    #[test]
    fn test_rti_restores_after_interrupt() {
        let mut bus = bus_with_program(&[], 0x8000, 0x9000, 0xA000);
        let mut cpu = Cpu::new();
        cpu.sp = 0xFD;
        cpu.pc = 0x8123;
        cpu.status = flags::UNUSED | flags::NEGATIVE;

        cpu.interrupt(&mut bus, Interrupt::Nmi).unwrap();
        assert_eq!(cpu.pc, 0x9000);

        cpu.rti(&mut bus).unwrap();
        assert_eq!(cpu.pc, 0x8123);
        assert_eq!(cpu.status, flags::UNUSED | flags::NEGATIVE);
        assert_eq!(cpu.sp, 0xFD);
    }

    #[test]
    fn test_nop_changes_nothing() {
        let mut cpu = Cpu::new();
        cpu.a = 0x12;
        let before = cpu.state();
        cpu.nop();
        assert_eq!(cpu.state(), before);
    }
}
