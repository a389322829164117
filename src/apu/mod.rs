// APU module - Audio Processing Unit register latch and sample clock
//
// Channel synthesis is not emulated. The APU latches what the CPU writes to
// $4000-$4013/$4015/$4017 so that save states and $4015 reads are faithful,
// and produces a silent sample stream at the configured rate so front-ends
// can pace themselves on audio.

use serde::{Deserialize, Serialize};

/// NTSC CPU clock in Hz
pub const CPU_CLOCK_NTSC: f64 = 1_789_773.0;

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Number of channel registers at $4000-$4013
const CHANNEL_REGISTER_COUNT: usize = 0x14;

/// Serializable register latch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApuState {
    pub registers: Vec<u8>,
    pub status: u8,
    pub frame_counter: u8,
    pub sample_clock: f64,
}

/// APU structure representing the Audio Processing Unit state
pub struct Apu {
    /// Last values written to $4000-$4013
    registers: [u8; CHANNEL_REGISTER_COUNT],
    /// Channel enable bits from $4015
    status: u8,
    /// $4017 frame counter control
    frame_counter: u8,

    /// APU ticks per output sample
    ticks_per_sample: f64,
    /// Ticks accumulated towards the next sample
    sample_clock: f64,
}

impl Apu {
    /// Create a new APU instance producing samples at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Apu {
            registers: [0; CHANNEL_REGISTER_COUNT],
            status: 0,
            frame_counter: 0,
            ticks_per_sample: Self::ticks_per_sample(sample_rate),
            sample_clock: 0.0,
        }
    }

    /// The APU runs at half the CPU clock
    fn ticks_per_sample(sample_rate: u32) -> f64 {
        CPU_CLOCK_NTSC / (2.0 * sample_rate.max(1) as f64)
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.ticks_per_sample = Self::ticks_per_sample(sample_rate);
    }

    pub fn reset(&mut self) {
        self.registers = [0; CHANNEL_REGISTER_COUNT];
        self.status = 0;
        self.frame_counter = 0;
        self.sample_clock = 0.0;
    }

    /// Read an APU register; only $4015 is readable
    pub fn read(&self, address: u16) -> u8 {
        match address {
            0x4015 => self.status,
            _ => 0,
        }
    }

    /// Write an APU register
    pub fn write(&mut self, address: u16, value: u8) {
        match address {
            0x4000..=0x4013 => self.registers[(address - 0x4000) as usize] = value,
            0x4015 => self.status = value & 0x1F,
            0x4017 => self.frame_counter = value,
            _ => {}
        }
    }

    /// Advance one APU cycle
    ///
    /// # Returns
    ///
    /// A sample when one is due. Samples are silent.
    pub fn step(&mut self) -> Option<f32> {
        self.sample_clock += 1.0;
        if self.sample_clock >= self.ticks_per_sample {
            self.sample_clock -= self.ticks_per_sample;
            Some(0.0)
        } else {
            None
        }
    }

    pub fn state(&self) -> ApuState {
        ApuState {
            registers: self.registers.to_vec(),
            status: self.status,
            frame_counter: self.frame_counter,
            sample_clock: self.sample_clock,
        }
    }

    /// Restore a latch snapshot; a wrong register count leaves them untouched
    pub fn restore_state(&mut self, state: &ApuState) {
        if state.registers.len() == CHANNEL_REGISTER_COUNT {
            self.registers.copy_from_slice(&state.registers);
        } else {
            log::warn!(
                "APU snapshot has {} registers, expected {}",
                state.registers.len(),
                CHANNEL_REGISTER_COUNT
            );
        }
        self.status = state.status;
        self.frame_counter = state.frame_counter;
        self.sample_clock = state.sample_clock;
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}
