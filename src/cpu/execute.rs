// CPU execution and trace logging module

use crate::bus::Bus;
use crate::cpu::addressing::{AddressingMode, AddressingResult};
use crate::cpu::opcodes::{decode, Instruction};
use crate::cpu::Cpu;
use crate::error::EmuError;

impl Cpu {
    /// Execute one CPU instruction
    ///
    /// Fetches the opcode at PC, resolves its addressing mode, executes it
    /// and charges base cycles plus page-cross and branch penalties. Any
    /// DMA stall the instruction triggered on the bus is added as well.
    ///
    /// # Returns
    /// The number of cycles consumed by this instruction
    ///
    /// # Errors
    /// `InvalidOpcode` for bytes outside the official set, or a mapper
    /// error from an unmapped cartridge access.
    pub fn step(&mut self, bus: &mut Bus) -> Result<u16, EmuError> {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{}", self.trace(bus));
        }

        let address = self.pc;
        let opcode = bus.read(address)?;
        let info = decode(opcode).ok_or(EmuError::InvalidOpcode { opcode, address })?;
        self.pc = self.pc.wrapping_add(1);

        let addr_result = self.resolve_address(bus, info.mode)?;
        debug_assert_eq!(
            self.pc,
            address.wrapping_add(info.byte_len() as u16),
            "operand width mismatch for ${:02X}",
            opcode
        );

        if info.page_cycle && addr_result.page_crossed {
            self.extra_cycles += 1;
        }

        self.execute_instruction(info.instruction, info.mode, &addr_result, bus)?;

        let cycles = info.cycles as u16 + self.extra_cycles as u16 + bus.take_stall_cycles();
        self.extra_cycles = 0;
        self.cycles = self.cycles.wrapping_add(cycles as u64);

        Ok(cycles)
    }

    /// Dispatch a decoded instruction
    fn execute_instruction(
        &mut self,
        instruction: Instruction,
        mode: AddressingMode,
        addr_result: &AddressingResult,
        bus: &mut Bus,
    ) -> Result<(), EmuError> {
        let is_accumulator = mode == AddressingMode::Accumulator;

        match instruction {
            // Load/Store instructions
            Instruction::Lda => self.lda(bus, addr_result)?,
            Instruction::Ldx => self.ldx(bus, addr_result)?,
            Instruction::Ldy => self.ldy(bus, addr_result)?,
            Instruction::Sta => self.sta(bus, addr_result)?,
            Instruction::Stx => self.stx(bus, addr_result)?,
            Instruction::Sty => self.sty(bus, addr_result)?,

            // Transfer instructions
            Instruction::Tax => self.tax(),
            Instruction::Tay => self.tay(),
            Instruction::Txa => self.txa(),
            Instruction::Tya => self.tya(),
            Instruction::Tsx => self.tsx(),
            Instruction::Txs => self.txs(),

            // Arithmetic instructions
            Instruction::Adc => self.adc(bus, addr_result)?,
            Instruction::Sbc => self.sbc(bus, addr_result)?,
            Instruction::Inc => self.inc(bus, addr_result)?,
            Instruction::Dec => self.dec(bus, addr_result)?,
            Instruction::Inx => self.inx(),
            Instruction::Iny => self.iny(),
            Instruction::Dex => self.dex(),
            Instruction::Dey => self.dey(),

            // Logical instructions
            Instruction::And => self.and(bus, addr_result)?,
            Instruction::Ora => self.ora(bus, addr_result)?,
            Instruction::Eor => self.eor(bus, addr_result)?,
            Instruction::Bit => self.bit(bus, addr_result)?,

            // Shift/Rotate instructions
            Instruction::Asl => self.asl(bus, addr_result, is_accumulator)?,
            Instruction::Lsr => self.lsr(bus, addr_result, is_accumulator)?,
            Instruction::Rol => self.rol(bus, addr_result, is_accumulator)?,
            Instruction::Ror => self.ror(bus, addr_result, is_accumulator)?,

            // Compare instructions
            Instruction::Cmp => self.cmp(bus, addr_result)?,
            Instruction::Cpx => self.cpx(bus, addr_result)?,
            Instruction::Cpy => self.cpy(bus, addr_result)?,

            // Branch instructions
            Instruction::Bcc => self.bcc(addr_result),
            Instruction::Bcs => self.bcs(addr_result),
            Instruction::Beq => self.beq(addr_result),
            Instruction::Bne => self.bne(addr_result),
            Instruction::Bmi => self.bmi(addr_result),
            Instruction::Bpl => self.bpl(addr_result),
            Instruction::Bvc => self.bvc(addr_result),
            Instruction::Bvs => self.bvs(addr_result),

            // Jump/Subroutine instructions
            Instruction::Jmp => self.jmp(addr_result),
            Instruction::Jsr => self.jsr(bus, addr_result)?,
            Instruction::Rts => self.rts(bus)?,

            // Stack instructions
            Instruction::Pha => self.pha(bus)?,
            Instruction::Pla => self.pla(bus)?,
            Instruction::Php => self.php(bus)?,
            Instruction::Plp => self.plp(bus)?,

            // Flag instructions
            Instruction::Clc => self.clc(),
            Instruction::Sec => self.sec(),
            Instruction::Cli => self.cli(),
            Instruction::Sei => self.sei(),
            Instruction::Clv => self.clv(),
            Instruction::Cld => self.cld(),
            Instruction::Sed => self.sed(),

            // Miscellaneous instructions
            Instruction::Brk => self.brk(bus)?,
            Instruction::Rti => self.rti(bus)?,
            Instruction::Nop => self.nop(),
        }

        Ok(())
    }

    /// Generate a trace log line in Nestest format
    ///
    /// Format: PC  OP OP OP  DISASSEMBLY  A:XX X:XX Y:XX P:XX SP:XX CYC:N
    /// Example: C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7
    ///
    /// Reads go through `Bus::peek`, so tracing never disturbs PPU or
    /// controller state.
    pub fn trace(&self, bus: &Bus) -> String {
        let pc = self.pc;
        let opcode = bus.peek(pc);
        let len = decode(opcode).map_or(1, |info| info.byte_len());

        let operands: Vec<u8> = (1..len as u16)
            .map(|i| bus.peek(pc.wrapping_add(i)))
            .collect();

        let hex_bytes = std::iter::once(opcode)
            .chain(operands.iter().copied())
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");

        let mut disassembly = disassemble(opcode, &operands);
        if let Some(info) = decode(opcode) {
            if info.mode == AddressingMode::Relative {
                let offset = operands.first().copied().unwrap_or(0) as i8;
                let target = pc.wrapping_add(2).wrapping_add_signed(offset as i16);
                disassembly = format!("{} ${:04X}", info.mnemonic(), target);
            }
        }

        format!(
            "{:04X}  {:<8}  {:<32}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            pc, hex_bytes, disassembly, self.a, self.x, self.y, self.status, self.sp, self.cycles
        )
    }
}

/// Disassemble one instruction into assembler syntax
///
/// `operands` holds the bytes following the opcode; missing bytes read as 0.
/// Relative operands are shown as a signed offset from the next instruction.
/// Opcodes outside the official set render as a `.DB` directive.
pub fn disassemble(opcode: u8, operands: &[u8]) -> String {
    let Some(info) = decode(opcode) else {
        return format!(".DB ${:02X}", opcode);
    };

    let mnemonic = info.mnemonic();
    let lo = operands.first().copied().unwrap_or(0);
    let word = u16::from_le_bytes([lo, operands.get(1).copied().unwrap_or(0)]);

    match info.mode {
        AddressingMode::Implied => mnemonic.to_string(),
        AddressingMode::Accumulator => format!("{} A", mnemonic),
        AddressingMode::Immediate => format!("{} #${:02X}", mnemonic, lo),
        AddressingMode::ZeroPage => format!("{} ${:02X}", mnemonic, lo),
        AddressingMode::ZeroPageX => format!("{} ${:02X},X", mnemonic, lo),
        AddressingMode::ZeroPageY => format!("{} ${:02X},Y", mnemonic, lo),
        AddressingMode::Relative => {
            let offset = lo as i8 as i16 + 2;
            if offset < 0 {
                format!("{} *-{}", mnemonic, -offset)
            } else {
                format!("{} *+{}", mnemonic, offset)
            }
        }
        AddressingMode::Absolute => format!("{} ${:04X}", mnemonic, word),
        AddressingMode::AbsoluteX => format!("{} ${:04X},X", mnemonic, word),
        AddressingMode::AbsoluteY => format!("{} ${:04X},Y", mnemonic, word),
        AddressingMode::Indirect => format!("{} (${:04X})", mnemonic, word),
        AddressingMode::IndexedIndirect => format!("{} (${:02X},X)", mnemonic, lo),
        AddressingMode::IndirectIndexed => format!("{} (${:02X}),Y", mnemonic, lo),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::test_support::bus_with_program;

    /// Run a program placed at $8000 until `steps` instructions have executed
    fn run(program: &[u8], steps: usize) -> (Cpu, Bus, Vec<u16>) {
        let mut bus = bus_with_program(program, 0x8000, 0x9000, 0xA000);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();

        let cycles = (0..steps).map(|_| cpu.step(&mut bus).unwrap()).collect();
        (cpu, bus, cycles)
    }

    // ========================================
    // Fetch/Decode/Execute Tests
    // ========================================

    #[test]
    fn test_lda_sta_program() {
        // LDA #$42; STA $0200; LDX $0200
        let program = [0xA9, 0x42, 0x8D, 0x00, 0x02, 0xAE, 0x00, 0x02];
        let (cpu, mut bus, cycles) = run(&program, 3);

        assert_eq!(cpu.a, 0x42);
        assert_eq!(cpu.x, 0x42);
        assert_eq!(bus.read(0x0200).unwrap(), 0x42);
        assert_eq!(cycles, vec![2, 4, 4]);
        assert_eq!(cpu.pc, 0x8008);
    }

    #[test]
    fn test_invalid_opcode_is_fatal() {
        let mut bus = bus_with_program(&[0xEA, 0x02], 0x8000, 0x9000, 0xA000);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();

        cpu.step(&mut bus).unwrap();
        let err = cpu.step(&mut bus).unwrap_err();

        assert!(matches!(
            err,
            EmuError::InvalidOpcode {
                opcode: 0x02,
                address: 0x8001
            }
        ));
    }

    #[test]
    fn test_page_cross_penalty_only_when_flagged() {
        // LDX #$01; LDA $02FF,X (crosses); STA $02FF,X (no penalty)
        let program = [0xA2, 0x01, 0xBD, 0xFF, 0x02, 0x9D, 0xFF, 0x02];
        let (_, _, cycles) = run(&program, 3);
        assert_eq!(cycles, vec![2, 5, 5]);
    }

    #[test]
    fn test_zero_page_indexed_never_pays_penalty() {
        // LDX #$FF; LDA $80,X
        let program = [0xA2, 0xFF, 0xB5, 0x80];
        let (_, _, cycles) = run(&program, 2);
        assert_eq!(cycles[1], 4);
    }

    #[test]
    fn test_bne_across_page_from_ram() {
        // BNE +$20 placed so the next instruction is at $1FF0
        let mut bus = Bus::new();
        bus.write(0x1FEE, 0xD0).unwrap();
        bus.write(0x1FEF, 0x20).unwrap();

        let mut cpu = Cpu::new();
        cpu.pc = 0x1FEE;
        cpu.set_zero(false);

        let cycles = cpu.step(&mut bus).unwrap();

        assert_eq!(cpu.pc, 0x2010);
        assert_eq!(cycles, 4, "base 2 + taken + page cross");
    }

    #[test]
    fn test_branch_not_taken_costs_base() {
        // LDA #$00 sets Z; BNE +$10 falls through
        let program = [0xA9, 0x00, 0xD0, 0x10];
        let (cpu, _, cycles) = run(&program, 2);
        assert_eq!(cycles[1], 2);
        assert_eq!(cpu.pc, 0x8004);
    }

    #[test]
    fn test_extra_cycles_reset_between_steps() {
        // LDA #$01; BNE +0 (taken, same page); NOP
        let program = [0xA9, 0x01, 0xD0, 0x00, 0xEA];
        let (_, _, cycles) = run(&program, 3);
        assert_eq!(cycles, vec![2, 3, 2]);
    }

    #[test]
    fn test_oam_dma_stall_is_charged() {
        // LDA #$02; STA $4014
        let program = [0xA9, 0x02, 0x8D, 0x14, 0x40];
        let (_, _, cycles) = run(&program, 2);
        assert_eq!(cycles[1], 4 + 513);
    }

    #[test]
    fn test_cycle_counter_accumulates() {
        let program = [0xEA, 0xEA, 0xEA];
        let (cpu, _, _) = run(&program, 3);
        assert_eq!(cpu.cycles, 7 + 6, "RESET plus three NOPs");
    }

    #[test]
    fn test_jmp_indirect_through_step() {
        // JMP ($0010) with pointer $9000 in zero page
        let mut bus = bus_with_program(&[0x6C, 0x10, 0x00], 0x8000, 0x9000, 0xA000);
        bus.write(0x0010, 0x00).unwrap();
        bus.write(0x0011, 0x90).unwrap();
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();

        assert_eq!(cpu.step(&mut bus).unwrap(), 5);
        assert_eq!(cpu.pc, 0x9000);
    }

    // ========================================
    // Disassembly and Trace Tests
    // ========================================

    #[test]
    fn test_disassemble_modes() {
        assert_eq!(disassemble(0xA9, &[0x42]), "LDA #$42");
        assert_eq!(disassemble(0x0A, &[]), "ASL A");
        assert_eq!(disassemble(0xB1, &[0x40]), "LDA ($40),Y");
        assert_eq!(disassemble(0x6C, &[0xFC, 0xFF]), "JMP ($FFFC)");
        assert_eq!(disassemble(0x96, &[0x10]), "STX $10,Y");
        assert_eq!(disassemble(0xD0, &[0xFE]), "BNE *+0");
        assert_eq!(disassemble(0x02, &[]), ".DB $02");
    }

    #[test]
    fn test_trace_line_format() {
        let bus = bus_with_program(&[0x4C, 0xF5, 0xC5], 0x8000, 0x9000, 0xA000);
        let mut cpu = Cpu::new();
        cpu.pc = 0x8000;
        cpu.sp = 0xFD;
        cpu.status = 0x24;
        cpu.cycles = 7;

        let line = cpu.trace(&bus);

        assert!(line.starts_with("8000  4C F5 C5  JMP $C5F5"), "got {line}");
        assert!(line.ends_with("A:00 X:00 Y:00 P:24 SP:FD CYC:7"), "got {line}");
    }

    #[test]
    fn test_trace_resolves_branch_target() {
        let bus = bus_with_program(&[0xD0, 0x10], 0x8000, 0x9000, 0xA000);
        let mut cpu = Cpu::new();
        cpu.pc = 0x8000;
        assert!(cpu.trace(&bus).contains("BNE $8012"));
    }
}
