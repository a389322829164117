// PPU constants

/// PPU registers are 8 bytes ($2000-$2007) mirrored throughout $2000-$3FFF
pub(super) const PPU_REGISTER_MASK: u16 = 0x0007;

/// Size of one logical nametable in bytes (1KB)
pub(super) const NAMETABLE_SIZE: usize = 1024;

/// Nametable VRAM backing: four physical tables so four-screen carts work
pub(super) const VRAM_SIZE: usize = 4 * NAMETABLE_SIZE;

/// Size of palette RAM in bytes
pub(super) const PALETTE_SIZE: usize = 32;

/// OAM: 64 sprites × 4 bytes
pub(super) const OAM_SIZE: usize = 256;

/// Screen width in pixels
pub const SCREEN_WIDTH: usize = 256;

/// Screen height in pixels
pub const SCREEN_HEIGHT: usize = 240;

/// Tile size in pixels (8x8)
pub(super) const TILE_SIZE: usize = 8;

/// Sprites drawn per scanline before overflow is flagged
pub(super) const MAX_SPRITES_PER_LINE: usize = 8;

// ========================================
// PPU Timing Constants (NTSC)
// ========================================

/// Number of PPU cycles per scanline (0-340)
pub const CYCLES_PER_SCANLINE: u16 = 341;

/// Number of scanlines per frame, pre-render line included
pub const SCANLINES_PER_FRAME: u16 = 262;

/// 341 cycles/scanline × 262 scanlines = 89,342 cycles
pub const CYCLES_PER_FRAME: u32 = (CYCLES_PER_SCANLINE as u32) * (SCANLINES_PER_FRAME as u32);

/// Pre-render scanline
pub(super) const PRERENDER_SCANLINE: i16 = -1;

/// Last visible scanline
pub(super) const LAST_VISIBLE_SCANLINE: i16 = 239;

/// First VBlank scanline; VBlank starts at its cycle 1
pub(super) const FIRST_VBLANK_SCANLINE: i16 = 241;

/// Last scanline before wrapping back to the pre-render line
pub(super) const LAST_SCANLINE: i16 = 260;

/// Dot at which the mapper's scanline counter is clocked
pub(super) const MAPPER_TICK_CYCLE: u16 = 260;

/// Dot at which fine Y is incremented on rendering lines
pub(super) const INCREMENT_Y_CYCLE: u16 = 256;

/// Dot at which horizontal scroll bits are copied from t to v
pub(super) const COPY_HORIZONTAL_CYCLE: u16 = 257;

/// Pre-render dots over which vertical scroll bits are copied from t to v
pub(super) const COPY_VERTICAL_CYCLES: std::ops::RangeInclusive<u16> = 280..=304;

// ========================================
// Register bits
// ========================================

pub(super) mod ctrl {
    pub const NAMETABLE: u8 = 0x03;
    pub const INCREMENT_32: u8 = 0x04;
    pub const SPRITE_TABLE: u8 = 0x08;
    pub const BACKGROUND_TABLE: u8 = 0x10;
    pub const SPRITE_16: u8 = 0x20;
    pub const NMI_ENABLE: u8 = 0x80;
}

pub(super) mod mask {
    pub const GRAYSCALE: u8 = 0x01;
    pub const BACKGROUND_LEFT: u8 = 0x02;
    pub const SPRITES_LEFT: u8 = 0x04;
    pub const SHOW_BACKGROUND: u8 = 0x08;
    pub const SHOW_SPRITES: u8 = 0x10;
}

pub(super) mod status {
    pub const SPRITE_OVERFLOW: u8 = 0x20;
    pub const SPRITE_ZERO_HIT: u8 = 0x40;
    pub const VBLANK: u8 = 0x80;
}
