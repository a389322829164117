// NES master palette and color post-processing
//
// The NES has a master palette of 64 colors (indexed 0x00-0x3F). Palette RAM
// holds indices into it. PPUMASK can then average the channels (grayscale)
// and dim the channels that are not emphasized.
//
// Indices $0E-$0F, $1E-$1F, $2E-$2F, $3E-$3F are unused and render as black.

/// NES master palette in RGB format (64 colors)
///
/// Each color is represented as a 32-bit value: 0xRRGGBB
pub const NES_PALETTE: [u32; 64] = [
    // $00-$0F
    0x666666, 0x002A88, 0x1412A7, 0x3B00A4, 0x5C007E, 0x6E0040, 0x6C0600, 0x561D00,
    0x333500, 0x0B4800, 0x005200, 0x004F08, 0x00404D, 0x000000, 0x000000, 0x000000,
    // $10-$1F
    0xADADAD, 0x155FD9, 0x4240FF, 0x7527FE, 0xA01ACC, 0xB71E7B, 0xB53120, 0x994E00,
    0x6B6D00, 0x388700, 0x0C9300, 0x008F32, 0x007C8D, 0x000000, 0x000000, 0x000000,
    // $20-$2F
    0xFFFEFF, 0x64B0FF, 0x9290FF, 0xC676FF, 0xF36AFF, 0xFE6ECC, 0xFE8170, 0xEA9E22,
    0xBCBE00, 0x88D800, 0x5CE430, 0x45E082, 0x48CDDE, 0x4F4F4F, 0x000000, 0x000000,
    // $30-$3F
    0xFFFEFF, 0xC0DFFF, 0xD3D2FF, 0xE8C8FF, 0xFBC2FF, 0xFEC4EA, 0xFECCC5, 0xF7D8A5,
    0xE4E594, 0xCFEF96, 0xBDF4AB, 0xB3F3CC, 0xB5EBF2, 0xB8B8B8, 0x000000, 0x000000,
];

/// Convert a NES palette index to RGB color
#[inline]
pub fn palette_to_rgb(index: u8) -> u32 {
    NES_PALETTE[(index & 0x3F) as usize]
}

/// Split 0xRRGGBB into channels
#[inline]
pub fn split_rgb(rgb: u32) -> [u8; 3] {
    [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8]
}

#[inline]
fn join_rgb([r, g, b]: [u8; 3]) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Apply PPUMASK post-processing to one color
///
/// * `grayscale` - replace every channel with the channel average
/// * `emphasis` - PPUMASK bits 5-7 shifted down (bit 0 red, bit 1 green,
///   bit 2 blue). Channels that are not emphasized are scaled by 3/4; with all
///   three bits set every channel is scaled.
pub fn post_process(rgb: u32, grayscale: bool, emphasis: u8) -> u32 {
    let mut channels = split_rgb(rgb);

    if grayscale {
        let average = (channels.iter().map(|&c| c as u16).sum::<u16>() / 3) as u8;
        channels = [average; 3];
    }

    let emphasis = emphasis & 0x07;
    if emphasis != 0 {
        for (bit, channel) in channels.iter_mut().enumerate() {
            if emphasis == 0x07 || emphasis & (1 << bit) == 0 {
                *channel = (*channel as u16 * 3 / 4) as u8;
            }
        }
    }

    join_rgb(channels)
}
