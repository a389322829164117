// Addressing modes module for 6502 CPU
// Resolves the 13 addressing modes to an effective address or operand value

use crate::bits;
use crate::bus::Bus;
use crate::error::EmuError;

/// Result of an addressing mode calculation
///
/// Contains the effective address, whether indexing crossed a page (which
/// costs a cycle on some opcodes), and the operand value for immediate and
/// accumulator modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressingResult {
    /// The effective address where the data is located
    pub address: u16,

    /// Whether a page boundary was crossed during address calculation
    pub page_crossed: bool,

    /// The operand value for immediate and accumulator modes
    pub value: Option<u8>,
}

impl AddressingResult {
    pub fn new(address: u16) -> Self {
        Self {
            address,
            page_crossed: false,
            value: None,
        }
    }

    pub fn immediate(value: u8) -> Self {
        Self {
            address: 0,
            page_crossed: false,
            value: Some(value),
        }
    }

    pub fn with_page_cross(mut self, crossed: bool) -> Self {
        self.page_crossed = crossed;
        self
    }
}

/// Addressing modes supported by the 6502
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// Implied - No operand (e.g., CLC, NOP)
    Implied,

    /// Accumulator - Operate on accumulator (e.g., LSR A)
    Accumulator,

    /// Immediate - 8-bit constant (e.g., LDA #$01)
    Immediate,

    /// Zero Page - Address in zero page $00-$FF (e.g., LDA $80)
    ZeroPage,

    /// Zero Page,X - Zero page address + X register (e.g., LDA $80,X)
    ZeroPageX,

    /// Zero Page,Y - Zero page address + Y register (e.g., LDX $80,Y)
    ZeroPageY,

    /// Relative - Signed 8-bit offset for branches (e.g., BNE label)
    Relative,

    /// Absolute - 16-bit address (e.g., LDA $8000)
    Absolute,

    /// Absolute,X - 16-bit address + X register (e.g., LDA $8000,X)
    AbsoluteX,

    /// Absolute,Y - 16-bit address + Y register (e.g., LDA $8000,Y)
    AbsoluteY,

    /// Indirect - 16-bit pointer (JMP only) (e.g., JMP ($FFFC))
    Indirect,

    /// Indexed Indirect - Zero page pointer + X (e.g., LDA ($40,X))
    IndexedIndirect,

    /// Indirect Indexed - Zero page pointer + Y (e.g., LDA ($40),Y)
    IndirectIndexed,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode
    pub const fn operand_len(self) -> u8 {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
            _ => 1,
        }
    }
}

/// Whether adding an index to `base` moves into another page
#[inline]
fn page_crossed(base: u16, offset: u8) -> bool {
    bits::crosses_page(base, base.wrapping_add(offset as u16))
}

impl super::Cpu {
    /// Resolve `mode` at the current PC, advancing PC past the operand
    pub(crate) fn resolve_address(
        &mut self,
        bus: &mut Bus,
        mode: AddressingMode,
    ) -> Result<AddressingResult, EmuError> {
        match mode {
            AddressingMode::Implied => Ok(self.addr_implied()),
            AddressingMode::Accumulator => Ok(self.addr_accumulator()),
            AddressingMode::Immediate => self.addr_immediate(bus),
            AddressingMode::ZeroPage => self.addr_zero_page(bus),
            AddressingMode::ZeroPageX => self.addr_zero_page_x(bus),
            AddressingMode::ZeroPageY => self.addr_zero_page_y(bus),
            AddressingMode::Relative => self.addr_relative(bus),
            AddressingMode::Absolute => self.addr_absolute(bus),
            AddressingMode::AbsoluteX => self.addr_absolute_x(bus),
            AddressingMode::AbsoluteY => self.addr_absolute_y(bus),
            AddressingMode::Indirect => self.addr_indirect(bus),
            AddressingMode::IndexedIndirect => self.addr_indexed_indirect(bus),
            AddressingMode::IndirectIndexed => self.addr_indirect_indexed(bus),
        }
    }

    /// Read the byte at PC and advance
    #[inline]
    fn fetch_byte(&mut self, bus: &mut Bus) -> Result<u8, EmuError> {
        let value = bus.read(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(value)
    }

    /// Read a little-endian word at PC and advance
    #[inline]
    fn fetch_word(&mut self, bus: &mut Bus) -> Result<u16, EmuError> {
        let lo = self.fetch_byte(bus)?;
        let hi = self.fetch_byte(bus)?;
        Ok(bits::build_u16(hi, lo))
    }

    /// Read a pointer stored in the zero page; the high byte wraps to $00
    #[inline]
    fn read_zero_page_pointer(&self, bus: &mut Bus, ptr: u8) -> Result<u16, EmuError> {
        let lo = bus.read(ptr as u16)?;
        let hi = bus.read(ptr.wrapping_add(1) as u16)?;
        Ok(bits::build_u16(hi, lo))
    }

    // ========================================
    // Implied / Accumulator / Immediate
    // ========================================

    pub fn addr_implied(&self) -> AddressingResult {
        AddressingResult::new(0)
    }

    pub fn addr_accumulator(&self) -> AddressingResult {
        AddressingResult::immediate(self.a)
    }

    /// Immediate addressing mode - the operand is the byte after the opcode
    pub fn addr_immediate(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        Ok(AddressingResult::immediate(self.fetch_byte(bus)?))
    }

    // ========================================
    // Zero Page Modes
    // ========================================

    /// Zero Page addressing mode - Address in page 0 ($00-$FF)
    pub fn addr_zero_page(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        Ok(AddressingResult::new(self.fetch_byte(bus)? as u16))
    }

    /// Zero Page,X addressing mode
    ///
    /// Wraps within zero page: $FF + 2 = $01 (not $0101).
    pub fn addr_zero_page_x(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        let base = self.fetch_byte(bus)?;
        Ok(AddressingResult::new(base.wrapping_add(self.x) as u16))
    }

    /// Zero Page,Y addressing mode
    ///
    /// Wraps within zero page like Zero Page,X.
    pub fn addr_zero_page_y(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        let base = self.fetch_byte(bus)?;
        Ok(AddressingResult::new(base.wrapping_add(self.y) as u16))
    }

    // ========================================
    // Relative Mode
    // ========================================

    /// Relative addressing mode - Signed 8-bit offset for branch instructions
    ///
    /// The target is relative to the instruction after the branch. The page
    /// crossing flag compares that address with the target.
    pub fn addr_relative(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        let offset = bits::to_signed_byte(self.fetch_byte(bus)?);
        let target = self.pc.wrapping_add_signed(offset as i16);
        let crossed = bits::crosses_page(self.pc, target);
        Ok(AddressingResult::new(target).with_page_cross(crossed))
    }

    // ========================================
    // Absolute Modes
    // ========================================

    /// Absolute addressing mode - 16-bit little-endian address
    pub fn addr_absolute(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        Ok(AddressingResult::new(self.fetch_word(bus)?))
    }

    /// Absolute,X addressing mode
    ///
    /// Page boundary crossing adds an extra cycle for some instructions.
    pub fn addr_absolute_x(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        let base = self.fetch_word(bus)?;
        let addr = base.wrapping_add(self.x as u16);
        Ok(AddressingResult::new(addr).with_page_cross(page_crossed(base, self.x)))
    }

    /// Absolute,Y addressing mode
    pub fn addr_absolute_y(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        let base = self.fetch_word(bus)?;
        let addr = base.wrapping_add(self.y as u16);
        Ok(AddressingResult::new(addr).with_page_cross(page_crossed(base, self.y)))
    }

    // ========================================
    // Indirect Modes
    // ========================================

    /// Indirect addressing mode - 16-bit pointer (JMP only)
    ///
    /// The high byte of the target is read from pointer+1 as a plain 16-bit
    /// increment, so a pointer at $xxFF reads its high byte from the next page.
    pub fn addr_indirect(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        let ptr = self.fetch_word(bus)?;
        Ok(AddressingResult::new(bus.read_u16(ptr)?))
    }

    /// Indexed Indirect addressing mode - ($nn,X)
    ///
    /// Steps:
    /// 1. Add X to the zero page operand (wrapping within page 0)
    /// 2. Read the 16-bit pointer from there (high byte also wraps)
    /// 3. Use the pointer as the effective address
    pub fn addr_indexed_indirect(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        let ptr = self.fetch_byte(bus)?.wrapping_add(self.x);
        Ok(AddressingResult::new(self.read_zero_page_pointer(bus, ptr)?))
    }

    /// Indirect Indexed addressing mode - ($nn),Y
    ///
    /// Steps:
    /// 1. Read the 16-bit base from the zero page (high byte wraps)
    /// 2. Add Y to the base
    ///
    /// Page boundary crossing adds an extra cycle for some instructions.
    pub fn addr_indirect_indexed(&mut self, bus: &mut Bus) -> Result<AddressingResult, EmuError> {
        let ptr = self.fetch_byte(bus)?;
        let base = self.read_zero_page_pointer(bus, ptr)?;
        let addr = base.wrapping_add(self.y as u16);
        Ok(AddressingResult::new(addr).with_page_cross(page_crossed(base, self.y)))
    }
}
