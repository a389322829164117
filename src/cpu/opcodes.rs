// Opcode table for the 151 official 6502 opcodes
//
// Each defined entry names the instruction, its addressing mode, the base
// cycle count and whether an indexed page crossing costs one more cycle.
// Undefined opcodes are `None` and stop the CPU with `InvalidOpcode`.

use super::addressing::AddressingMode;

/// The 56 official 6502 instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

impl Instruction {
    /// Upper-case assembler mnemonic
    pub const fn mnemonic(self) -> &'static str {
        use Instruction::*;
        match self {
            Adc => "ADC",
            And => "AND",
            Asl => "ASL",
            Bcc => "BCC",
            Bcs => "BCS",
            Beq => "BEQ",
            Bit => "BIT",
            Bmi => "BMI",
            Bne => "BNE",
            Bpl => "BPL",
            Brk => "BRK",
            Bvc => "BVC",
            Bvs => "BVS",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Clv => "CLV",
            Cmp => "CMP",
            Cpx => "CPX",
            Cpy => "CPY",
            Dec => "DEC",
            Dex => "DEX",
            Dey => "DEY",
            Eor => "EOR",
            Inc => "INC",
            Inx => "INX",
            Iny => "INY",
            Jmp => "JMP",
            Jsr => "JSR",
            Lda => "LDA",
            Ldx => "LDX",
            Ldy => "LDY",
            Lsr => "LSR",
            Nop => "NOP",
            Ora => "ORA",
            Pha => "PHA",
            Php => "PHP",
            Pla => "PLA",
            Plp => "PLP",
            Rol => "ROL",
            Ror => "ROR",
            Rti => "RTI",
            Rts => "RTS",
            Sbc => "SBC",
            Sec => "SEC",
            Sed => "SED",
            Sei => "SEI",
            Sta => "STA",
            Stx => "STX",
            Sty => "STY",
            Tax => "TAX",
            Tay => "TAY",
            Tsx => "TSX",
            Txa => "TXA",
            Txs => "TXS",
            Tya => "TYA",
        }
    }
}

/// Decoded opcode metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub instruction: Instruction,
    pub mode: AddressingMode,
    /// Base cycle count
    pub cycles: u8,
    /// +1 cycle when the indexed address crosses a page
    pub page_cycle: bool,
}

impl OpcodeInfo {
    const fn new(instruction: Instruction, mode: AddressingMode, cycles: u8, page_cycle: bool) -> Self {
        OpcodeInfo {
            instruction,
            mode,
            cycles,
            page_cycle,
        }
    }

    /// Instruction length in bytes, opcode included
    pub const fn byte_len(&self) -> u8 {
        1 + self.mode.operand_len()
    }

    pub const fn mnemonic(&self) -> &'static str {
        self.instruction.mnemonic()
    }
}

/// Decode table indexed by opcode byte
pub static OPCODE_TABLE: [Option<OpcodeInfo>; 256] = build_table();

/// Look up an opcode
#[inline]
pub fn decode(opcode: u8) -> Option<&'static OpcodeInfo> {
    OPCODE_TABLE[opcode as usize].as_ref()
}

macro_rules! op {
    ($t:ident; $code:literal => $ins:ident, $mode:ident, $cycles:literal) => {
        $t[$code] = Some(OpcodeInfo::new(Instruction::$ins, AddressingMode::$mode, $cycles, false));
    };
    ($t:ident; $code:literal => $ins:ident, $mode:ident, $cycles:literal, page) => {
        $t[$code] = Some(OpcodeInfo::new(Instruction::$ins, AddressingMode::$mode, $cycles, true));
    };
}

const fn build_table() -> [Option<OpcodeInfo>; 256] {
    let mut t: [Option<OpcodeInfo>; 256] = [None; 256];

    // Load/Store
    op!(t; 0xA9 => Lda, Immediate, 2);
    op!(t; 0xA5 => Lda, ZeroPage, 3);
    op!(t; 0xB5 => Lda, ZeroPageX, 4);
    op!(t; 0xAD => Lda, Absolute, 4);
    op!(t; 0xBD => Lda, AbsoluteX, 4, page);
    op!(t; 0xB9 => Lda, AbsoluteY, 4, page);
    op!(t; 0xA1 => Lda, IndexedIndirect, 6);
    op!(t; 0xB1 => Lda, IndirectIndexed, 5, page);

    op!(t; 0xA2 => Ldx, Immediate, 2);
    op!(t; 0xA6 => Ldx, ZeroPage, 3);
    op!(t; 0xB6 => Ldx, ZeroPageY, 4);
    op!(t; 0xAE => Ldx, Absolute, 4);
    op!(t; 0xBE => Ldx, AbsoluteY, 4, page);

    op!(t; 0xA0 => Ldy, Immediate, 2);
    op!(t; 0xA4 => Ldy, ZeroPage, 3);
    op!(t; 0xB4 => Ldy, ZeroPageX, 4);
    op!(t; 0xAC => Ldy, Absolute, 4);
    op!(t; 0xBC => Ldy, AbsoluteX, 4, page);

    op!(t; 0x85 => Sta, ZeroPage, 3);
    op!(t; 0x95 => Sta, ZeroPageX, 4);
    op!(t; 0x8D => Sta, Absolute, 4);
    op!(t; 0x9D => Sta, AbsoluteX, 5);
    op!(t; 0x99 => Sta, AbsoluteY, 5);
    op!(t; 0x81 => Sta, IndexedIndirect, 6);
    op!(t; 0x91 => Sta, IndirectIndexed, 6);

    op!(t; 0x86 => Stx, ZeroPage, 3);
    op!(t; 0x96 => Stx, ZeroPageY, 4);
    op!(t; 0x8E => Stx, Absolute, 4);

    op!(t; 0x84 => Sty, ZeroPage, 3);
    op!(t; 0x94 => Sty, ZeroPageX, 4);
    op!(t; 0x8C => Sty, Absolute, 4);

    // Transfer
    op!(t; 0xAA => Tax, Implied, 2);
    op!(t; 0xA8 => Tay, Implied, 2);
    op!(t; 0x8A => Txa, Implied, 2);
    op!(t; 0x98 => Tya, Implied, 2);
    op!(t; 0xBA => Tsx, Implied, 2);
    op!(t; 0x9A => Txs, Implied, 2);

    // Stack
    op!(t; 0x48 => Pha, Implied, 3);
    op!(t; 0x08 => Php, Implied, 3);
    op!(t; 0x68 => Pla, Implied, 4);
    op!(t; 0x28 => Plp, Implied, 4);

    // Arithmetic
    op!(t; 0x69 => Adc, Immediate, 2);
    op!(t; 0x65 => Adc, ZeroPage, 3);
    op!(t; 0x75 => Adc, ZeroPageX, 4);
    op!(t; 0x6D => Adc, Absolute, 4);
    op!(t; 0x7D => Adc, AbsoluteX, 4, page);
    op!(t; 0x79 => Adc, AbsoluteY, 4, page);
    op!(t; 0x61 => Adc, IndexedIndirect, 6);
    op!(t; 0x71 => Adc, IndirectIndexed, 5, page);

    op!(t; 0xE9 => Sbc, Immediate, 2);
    op!(t; 0xE5 => Sbc, ZeroPage, 3);
    op!(t; 0xF5 => Sbc, ZeroPageX, 4);
    op!(t; 0xED => Sbc, Absolute, 4);
    op!(t; 0xFD => Sbc, AbsoluteX, 4, page);
    op!(t; 0xF9 => Sbc, AbsoluteY, 4, page);
    op!(t; 0xE1 => Sbc, IndexedIndirect, 6);
    op!(t; 0xF1 => Sbc, IndirectIndexed, 5, page);

    op!(t; 0xE6 => Inc, ZeroPage, 5);
    op!(t; 0xF6 => Inc, ZeroPageX, 6);
    op!(t; 0xEE => Inc, Absolute, 6);
    op!(t; 0xFE => Inc, AbsoluteX, 7);
    op!(t; 0xE8 => Inx, Implied, 2);
    op!(t; 0xC8 => Iny, Implied, 2);

    op!(t; 0xC6 => Dec, ZeroPage, 5);
    op!(t; 0xD6 => Dec, ZeroPageX, 6);
    op!(t; 0xCE => Dec, Absolute, 6);
    op!(t; 0xDE => Dec, AbsoluteX, 7);
    op!(t; 0xCA => Dex, Implied, 2);
    op!(t; 0x88 => Dey, Implied, 2);

    // Logic
    op!(t; 0x29 => And, Immediate, 2);
    op!(t; 0x25 => And, ZeroPage, 3);
    op!(t; 0x35 => And, ZeroPageX, 4);
    op!(t; 0x2D => And, Absolute, 4);
    op!(t; 0x3D => And, AbsoluteX, 4, page);
    op!(t; 0x39 => And, AbsoluteY, 4, page);
    op!(t; 0x21 => And, IndexedIndirect, 6);
    op!(t; 0x31 => And, IndirectIndexed, 5, page);

    op!(t; 0x09 => Ora, Immediate, 2);
    op!(t; 0x05 => Ora, ZeroPage, 3);
    op!(t; 0x15 => Ora, ZeroPageX, 4);
    op!(t; 0x0D => Ora, Absolute, 4);
    op!(t; 0x1D => Ora, AbsoluteX, 4, page);
    op!(t; 0x19 => Ora, AbsoluteY, 4, page);
    op!(t; 0x01 => Ora, IndexedIndirect, 6);
    op!(t; 0x11 => Ora, IndirectIndexed, 5, page);

    op!(t; 0x49 => Eor, Immediate, 2);
    op!(t; 0x45 => Eor, ZeroPage, 3);
    op!(t; 0x55 => Eor, ZeroPageX, 4);
    op!(t; 0x4D => Eor, Absolute, 4);
    op!(t; 0x5D => Eor, AbsoluteX, 4, page);
    op!(t; 0x59 => Eor, AbsoluteY, 4, page);
    op!(t; 0x41 => Eor, IndexedIndirect, 6);
    op!(t; 0x51 => Eor, IndirectIndexed, 5, page);

    op!(t; 0x24 => Bit, ZeroPage, 3);
    op!(t; 0x2C => Bit, Absolute, 4);

    // Shift/Rotate
    op!(t; 0x0A => Asl, Accumulator, 2);
    op!(t; 0x06 => Asl, ZeroPage, 5);
    op!(t; 0x16 => Asl, ZeroPageX, 6);
    op!(t; 0x0E => Asl, Absolute, 6);
    op!(t; 0x1E => Asl, AbsoluteX, 7);

    op!(t; 0x4A => Lsr, Accumulator, 2);
    op!(t; 0x46 => Lsr, ZeroPage, 5);
    op!(t; 0x56 => Lsr, ZeroPageX, 6);
    op!(t; 0x4E => Lsr, Absolute, 6);
    op!(t; 0x5E => Lsr, AbsoluteX, 7);

    op!(t; 0x2A => Rol, Accumulator, 2);
    op!(t; 0x26 => Rol, ZeroPage, 5);
    op!(t; 0x36 => Rol, ZeroPageX, 6);
    op!(t; 0x2E => Rol, Absolute, 6);
    op!(t; 0x3E => Rol, AbsoluteX, 7);

    op!(t; 0x6A => Ror, Accumulator, 2);
    op!(t; 0x66 => Ror, ZeroPage, 5);
    op!(t; 0x76 => Ror, ZeroPageX, 6);
    op!(t; 0x6E => Ror, Absolute, 6);
    op!(t; 0x7E => Ror, AbsoluteX, 7);

    // Compare
    op!(t; 0xC9 => Cmp, Immediate, 2);
    op!(t; 0xC5 => Cmp, ZeroPage, 3);
    op!(t; 0xD5 => Cmp, ZeroPageX, 4);
    op!(t; 0xCD => Cmp, Absolute, 4);
    op!(t; 0xDD => Cmp, AbsoluteX, 4, page);
    op!(t; 0xD9 => Cmp, AbsoluteY, 4, page);
    op!(t; 0xC1 => Cmp, IndexedIndirect, 6);
    op!(t; 0xD1 => Cmp, IndirectIndexed, 5, page);

    op!(t; 0xE0 => Cpx, Immediate, 2);
    op!(t; 0xE4 => Cpx, ZeroPage, 3);
    op!(t; 0xEC => Cpx, Absolute, 4);

    op!(t; 0xC0 => Cpy, Immediate, 2);
    op!(t; 0xC4 => Cpy, ZeroPage, 3);
    op!(t; 0xCC => Cpy, Absolute, 4);

    // Branch (taken/page penalties are added by the branch itself)
    op!(t; 0x90 => Bcc, Relative, 2);
    op!(t; 0xB0 => Bcs, Relative, 2);
    op!(t; 0xF0 => Beq, Relative, 2);
    op!(t; 0x30 => Bmi, Relative, 2);
    op!(t; 0xD0 => Bne, Relative, 2);
    op!(t; 0x10 => Bpl, Relative, 2);
    op!(t; 0x50 => Bvc, Relative, 2);
    op!(t; 0x70 => Bvs, Relative, 2);

    // Jump/Subroutine
    op!(t; 0x4C => Jmp, Absolute, 3);
    op!(t; 0x6C => Jmp, Indirect, 5);
    op!(t; 0x20 => Jsr, Absolute, 6);
    op!(t; 0x60 => Rts, Implied, 6);
    op!(t; 0x40 => Rti, Implied, 6);
    op!(t; 0x00 => Brk, Implied, 7);

    // Flags
    op!(t; 0x18 => Clc, Implied, 2);
    op!(t; 0x38 => Sec, Implied, 2);
    op!(t; 0x58 => Cli, Implied, 2);
    op!(t; 0x78 => Sei, Implied, 2);
    op!(t; 0xB8 => Clv, Implied, 2);
    op!(t; 0xD8 => Cld, Implied, 2);
    op!(t; 0xF8 => Sed, Implied, 2);

    op!(t; 0xEA => Nop, Implied, 2);

    t
}
