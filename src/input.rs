// Input module - Controller input handling
//
// Each standard controller is an 8-bit parallel-in/serial-out shift register.
// Writing 1 then 0 to $4016 latches the buttons; each read then returns the
// next button in A, B, Select, Start, Up, Down, Left, Right order.

use serde::{Deserialize, Serialize};

/// Upper bits returned with every controller read (open bus)
const OPEN_BUS_BITS: u8 = 0x40;

/// A standard controller button, in shift-register order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];
}

/// Controller structure representing NES controller state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    // Button states
    pub button_a: bool,
    pub button_b: bool,
    pub select: bool,
    pub start: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,

    /// Next button to report (8 and beyond report 1)
    shift: u8,
    /// While high, the shift register reloads continuously
    strobe: bool,
}

impl Controller {
    /// Create a new controller instance with all buttons released
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        *self.button_mut(button) = pressed;
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::A => self.button_a,
            Button::B => self.button_b,
            Button::Select => self.select,
            Button::Start => self.start,
            Button::Up => self.up,
            Button::Down => self.down,
            Button::Left => self.left,
            Button::Right => self.right,
        }
    }

    fn button_mut(&mut self, button: Button) -> &mut bool {
        match button {
            Button::A => &mut self.button_a,
            Button::B => &mut self.button_b,
            Button::Select => &mut self.select,
            Button::Start => &mut self.start,
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
            Button::Left => &mut self.left,
            Button::Right => &mut self.right,
        }
    }

    /// Strobe write; bit 0 high keeps the register reloading
    pub fn write_strobe(&mut self, value: u8) {
        self.strobe = value & 0x01 != 0;
        if self.strobe {
            self.shift = 0;
        }
    }

    /// Serial read of the next button bit
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return self.is_pressed(Button::A) as u8;
        }

        let bit = match Button::ALL.get(self.shift as usize) {
            Some(&button) => self.is_pressed(button) as u8,
            None => 1,
        };
        self.shift = self.shift.saturating_add(1);
        bit
    }
}

/// Both controller ports as seen from $4016/$4017
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerIO {
    pub controller1: Controller,
    pub controller2: Controller,
}

impl ControllerIO {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read $4016 (port 1) or $4017 (port 2)
    pub fn read(&mut self, address: u16) -> u8 {
        let bit = match address {
            0x4016 => self.controller1.read(),
            _ => self.controller2.read(),
        };
        bit | OPEN_BUS_BITS
    }

    /// Write $4016: the strobe line is shared by both ports
    pub fn write(&mut self, value: u8) {
        self.controller1.write_strobe(value);
        self.controller2.write_strobe(value);
    }

    /// Update a button on player 1 or 2 (other players are ignored)
    pub fn set_button(&mut self, player: u8, button: Button, pressed: bool) {
        match player {
            1 => self.controller1.set_button(button, pressed),
            2 => self.controller2.set_button(button, pressed),
            _ => log::warn!("ignoring input for controller {}", player),
        }
    }
}
