// CPU module - 6502 (2A03) processor core
//
// Register file, status flags, the page-one stack and interrupt dispatch live
// here. Addressing modes, the opcode table and the fetch/decode/execute loop
// are split into submodules, and each instruction group has its own file
// under `instructions/`.

pub mod addressing;
pub mod execute;
pub mod instructions;
pub mod opcodes;

use crate::bits;
use crate::bus::Bus;
use crate::error::EmuError;
use serde::{Deserialize, Serialize};

pub use execute::disassemble;
pub use opcodes::{Instruction, OpcodeInfo, OPCODE_TABLE};

/// Processor Status Flags (P register)
///
/// Bit layout:
/// ```text
/// 7  6  5  4  3  2  1  0
/// N  V  -  B  D  I  Z  C
/// ```
///
/// B only exists on the copy of P pushed to the stack; bit 5 always reads 1.
pub mod flags {
    pub const CARRY: u8 = 0b0000_0001; // Bit 0: C
    pub const ZERO: u8 = 0b0000_0010; // Bit 1: Z
    pub const INTERRUPT_DISABLE: u8 = 0b0000_0100; // Bit 2: I
    pub const DECIMAL: u8 = 0b0000_1000; // Bit 3: D (no BCD on the 2A03)
    pub const BREAK: u8 = 0b0001_0000; // Bit 4: B (pushed copies only)
    pub const UNUSED: u8 = 0b0010_0000; // Bit 5: - (always 1)
    pub const OVERFLOW: u8 = 0b0100_0000; // Bit 6: V
    pub const NEGATIVE: u8 = 0b1000_0000; // Bit 7: N
}

/// Base address of the hardware stack page
pub const STACK_BASE: u16 = 0x0100;

/// Cycles charged for any interrupt sequence
pub const INTERRUPT_CYCLES: u8 = 7;

/// Interrupt sources, each with a fixed vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Reset,
    Nmi,
    Irq,
}

impl Interrupt {
    /// Address of the 16-bit handler pointer
    pub const fn vector(self) -> u16 {
        match self {
            Interrupt::Nmi => 0xFFFA,
            Interrupt::Reset => 0xFFFC,
            Interrupt::Irq => 0xFFFE,
        }
    }
}

/// Serializable copy of the register file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub cycles: u64,
}

/// 6502 register file and cycle counter
#[derive(Debug, Clone)]
pub struct Cpu {
    pub a: u8,      // Accumulator
    pub x: u8,      // Index Register X
    pub y: u8,      // Index Register Y
    pub sp: u8,     // Stack Pointer
    pub pc: u16,    // Program Counter
    pub status: u8, // Processor Status flags

    /// Total cycles executed since power-on
    pub cycles: u64,

    /// Penalty cycles gathered during the current instruction
    pub(crate) extra_cycles: u8,
}

impl Cpu {
    /// Create a CPU in its power-on state
    ///
    /// All registers are zero and only the always-set bit of P is on. The
    /// RESET sequence (see [`Cpu::reset`]) pushes three bytes, which leaves
    /// SP at $FD and sets I, matching a freshly reset 2A03.
    pub fn new() -> Self {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            status: flags::UNUSED,
            cycles: 0,
            extra_cycles: 0,
        }
    }

    /// Run the RESET sequence: PC is loaded from $FFFC-$FFFD
    pub fn reset(&mut self, bus: &mut Bus) -> Result<u8, EmuError> {
        log::info!("CPU reset");
        self.interrupt(bus, Interrupt::Reset)
    }

    /// Dispatch an interrupt
    ///
    /// IRQ is ignored while I is set and costs nothing. Otherwise PC and P
    /// (with B clear) are pushed, I is set and PC is loaded from the vector.
    ///
    /// # Returns
    /// Cycles consumed (0 or 7)
    pub fn interrupt(&mut self, bus: &mut Bus, kind: Interrupt) -> Result<u8, EmuError> {
        if kind == Interrupt::Irq && self.get_interrupt_disable() {
            return Ok(0);
        }

        self.stack_push_u16(bus, self.pc)?;
        self.stack_push(bus, self.status_for_push(false))?;
        self.set_interrupt_disable(true);
        self.pc = bus.read_u16(kind.vector())?;

        self.cycles = self.cycles.wrapping_add(INTERRUPT_CYCLES as u64);
        Ok(INTERRUPT_CYCLES)
    }

    /// Copy of P as it appears on the stack
    ///
    /// `software` is true for BRK and PHP, which push B set.
    #[inline]
    pub fn status_for_push(&self, software: bool) -> u8 {
        bits::set_bit(self.status | flags::UNUSED, 4, software)
    }

    /// Load P from a pulled byte; B is dropped and bit 5 forced on
    #[inline]
    pub fn set_status_from_stack(&mut self, value: u8) {
        self.status = (value & !flags::BREAK) | flags::UNUSED;
    }

    pub fn state(&self) -> CpuState {
        CpuState {
            a: self.a,
            x: self.x,
            y: self.y,
            sp: self.sp,
            pc: self.pc,
            status: self.status,
            cycles: self.cycles,
        }
    }

    pub fn restore_state(&mut self, state: &CpuState) {
        self.a = state.a;
        self.x = state.x;
        self.y = state.y;
        self.sp = state.sp;
        self.pc = state.pc;
        self.set_status_from_stack(state.status);
        self.cycles = state.cycles;
        self.extra_cycles = 0;
    }

    // ========================================
    // Stack ($0100-$01FF)
    // ========================================

    /// Push a byte: write at $0100+SP, then decrement SP
    #[inline]
    pub(crate) fn stack_push(&mut self, bus: &mut Bus, value: u8) -> Result<(), EmuError> {
        bus.write(STACK_BASE | self.sp as u16, value)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    /// Pull a byte: increment SP, then read $0100+SP
    #[inline]
    pub(crate) fn stack_pop(&mut self, bus: &mut Bus) -> Result<u8, EmuError> {
        self.sp = self.sp.wrapping_add(1);
        Ok(bus.read(STACK_BASE | self.sp as u16)?)
    }

    /// Push a word, high byte first
    #[inline]
    pub(crate) fn stack_push_u16(&mut self, bus: &mut Bus, value: u16) -> Result<(), EmuError> {
        self.stack_push(bus, bits::high_byte(value))?;
        self.stack_push(bus, bits::low_byte(value))
    }

    /// Pull a word pushed by `stack_push_u16`
    #[inline]
    pub(crate) fn stack_pop_u16(&mut self, bus: &mut Bus) -> Result<u16, EmuError> {
        let low = self.stack_pop(bus)?;
        let high = self.stack_pop(bus)?;
        Ok(bits::build_u16(high, low))
    }

    // ========================================
    // Status Flag Manipulation Methods
    // ========================================

    #[inline]
    pub fn get_flag(&self, flag: u8) -> bool {
        (self.status & flag) != 0
    }

    #[inline]
    pub fn set_flag(&mut self, flag: u8) {
        self.status |= flag;
    }

    #[inline]
    pub fn clear_flag(&mut self, flag: u8) {
        self.status &= !flag;
    }

    #[inline]
    pub fn update_flag(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set_flag(flag);
        } else {
            self.clear_flag(flag);
        }
    }

    #[inline]
    pub fn get_carry(&self) -> bool {
        self.get_flag(flags::CARRY)
    }

    #[inline]
    pub fn get_zero(&self) -> bool {
        self.get_flag(flags::ZERO)
    }

    #[inline]
    pub fn get_interrupt_disable(&self) -> bool {
        self.get_flag(flags::INTERRUPT_DISABLE)
    }

    #[inline]
    pub fn get_decimal(&self) -> bool {
        self.get_flag(flags::DECIMAL)
    }

    #[inline]
    pub fn get_overflow(&self) -> bool {
        self.get_flag(flags::OVERFLOW)
    }

    #[inline]
    pub fn get_negative(&self) -> bool {
        self.get_flag(flags::NEGATIVE)
    }

    #[inline]
    pub fn set_carry(&mut self, value: bool) {
        self.update_flag(flags::CARRY, value);
    }

    #[inline]
    pub fn set_zero(&mut self, value: bool) {
        self.update_flag(flags::ZERO, value);
    }

    #[inline]
    pub fn set_interrupt_disable(&mut self, value: bool) {
        self.update_flag(flags::INTERRUPT_DISABLE, value);
    }

    #[inline]
    pub fn set_decimal(&mut self, value: bool) {
        self.update_flag(flags::DECIMAL, value);
    }

    #[inline]
    pub fn set_overflow(&mut self, value: bool) {
        self.update_flag(flags::OVERFLOW, value);
    }

    #[inline]
    pub fn set_negative(&mut self, value: bool) {
        self.update_flag(flags::NEGATIVE, value);
    }

    /// Update Zero and Negative flags from an 8-bit result
    #[inline]
    pub fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_zero(value == 0);
        self.set_negative(bits::get_bit(value, 7));
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
