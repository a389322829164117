// PPU rendering logic
//
// Each visible scanline is produced in one go at dot 0: the background row
// first, then the sprites that cover the line, then palette lookup and
// PPUMASK color post-processing into the frame buffer.

use super::constants::{ctrl, mask, status, MAX_SPRITES_PER_LINE, SCREEN_WIDTH, TILE_SIZE};
use super::palette::{palette_to_rgb, post_process};
use super::{ChrBus, Ppu};
use crate::cartridge::MapperError;

/// Represents a parsed sprite from OAM
#[derive(Debug, Clone, Copy)]
struct Sprite {
    /// Y position (top edge - 1)
    y: u8,
    /// Tile index (or tile bank for 8x16 mode)
    tile_index: u8,
    /// Attribute byte
    attributes: u8,
    /// X position (left edge)
    x: u8,
    /// Original OAM index (for sprite 0 detection)
    oam_index: usize,
}

impl Sprite {
    fn from_oam(oam: &[u8], oam_index: usize) -> Self {
        let base = oam_index * 4;
        Sprite {
            y: oam[base],
            tile_index: oam[base + 1],
            attributes: oam[base + 2],
            x: oam[base + 3],
            oam_index,
        }
    }

    fn is_vflip(&self) -> bool {
        (self.attributes & 0x80) != 0
    }

    fn is_hflip(&self) -> bool {
        (self.attributes & 0x40) != 0
    }

    fn is_behind_background(&self) -> bool {
        (self.attributes & 0x20) != 0
    }

    /// Sprite palette (0-3, for palettes 4-7)
    fn palette(&self) -> u8 {
        self.attributes & 0x03
    }

    fn is_sprite_zero(&self) -> bool {
        self.oam_index == 0
    }
}

/// Pixels of one scanline before palette conversion
struct LineBuffer {
    /// Palette RAM value per pixel
    colors: [u8; SCREEN_WIDTH],
    /// Whether the background pixel at this column is opaque
    bg_opaque: [bool; SCREEN_WIDTH],
}

impl Ppu {
    /// Render the current scanline into the frame buffer
    pub(super) fn render_scanline(&mut self, chr: &dyn ChrBus) -> Result<(), MapperError> {
        let mut line = LineBuffer {
            colors: [0; SCREEN_WIDTH],
            bg_opaque: [false; SCREEN_WIDTH],
        };

        self.render_background_line(&mut line, chr)?;
        if self.mask & mask::SHOW_SPRITES != 0 {
            self.render_sprite_line(&mut line, chr)?;
        }

        let grayscale = self.grayscale_override || self.mask & mask::GRAYSCALE != 0;
        let emphasis = self.mask >> 5;
        let row = self.scanline as usize * SCREEN_WIDTH;
        for (pixel, &color) in self.frame_buffer[row..row + SCREEN_WIDTH]
            .iter_mut()
            .zip(line.colors.iter())
        {
            *pixel = post_process(palette_to_rgb(color), grayscale, emphasis);
        }

        Ok(())
    }

    // ========================================
    // Background
    // ========================================

    /// Render the background row addressed by v and fine X
    ///
    /// Coarse X in v advances at every tile boundary while the background is
    /// shown; dot 257 later restores the horizontal bits from t.
    fn render_background_line(
        &mut self,
        line: &mut LineBuffer,
        chr: &dyn ChrBus,
    ) -> Result<(), MapperError> {
        let backdrop = self.palette_entry(0);
        line.colors.fill(backdrop);

        if self.mask & mask::SHOW_BACKGROUND == 0 {
            return Ok(());
        }

        let pattern_base: u16 = if self.ctrl & ctrl::BACKGROUND_TABLE != 0 {
            0x1000
        } else {
            0x0000
        };
        let show_left = self.mask & mask::BACKGROUND_LEFT != 0;

        let mut fine = self.fine_x as usize;
        let (mut low, mut high, mut palette) = self.fetch_background_tile(pattern_base, chr)?;

        for x in 0..SCREEN_WIDTH {
            let bit = 7 - fine;
            let color_index = (((high >> bit) & 1) << 1) | ((low >> bit) & 1);

            if color_index != 0 && (show_left || x >= 8) {
                line.colors[x] = self.palette_entry((palette * 4 + color_index) as usize);
                line.bg_opaque[x] = true;
            }

            fine += 1;
            if fine == TILE_SIZE {
                fine = 0;
                self.increment_coarse_x();
                (low, high, palette) = self.fetch_background_tile(pattern_base, chr)?;
            }
        }

        Ok(())
    }

    /// Fetch both bit planes and the attribute palette for the tile at v
    fn fetch_background_tile(
        &self,
        pattern_base: u16,
        chr: &dyn ChrBus,
    ) -> Result<(u8, u8, u8), MapperError> {
        let v = self.v;
        let tile_index = self.nametable_byte(0x2000 | (v & 0x0FFF));

        let attr_addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
        let shift = ((v >> 4) & 0x04) | (v & 0x02);
        let palette = (self.nametable_byte(attr_addr) >> shift) & 0x03;

        let fine_y = (v >> 12) & 0x07;
        let row_addr = pattern_base + tile_index as u16 * 16 + fine_y;
        let low = chr.chr_read(row_addr)?;
        let high = chr.chr_read(row_addr + 8)?;

        Ok((low, high, palette))
    }

    // ========================================
    // Sprites
    // ========================================

    fn sprite_height(&self) -> u16 {
        if self.ctrl & ctrl::SPRITE_16 != 0 {
            16
        } else {
            8
        }
    }

    /// Select up to eight sprites covering the current scanline
    ///
    /// A ninth candidate sets the overflow flag and ends evaluation.
    fn evaluate_sprites(&mut self) -> Vec<Sprite> {
        let scanline = self.scanline as u16;
        let height = self.sprite_height();
        let mut selected = Vec::with_capacity(MAX_SPRITES_PER_LINE);

        for index in 0..64 {
            let sprite = Sprite::from_oam(&self.oam, index);
            let top = sprite.y as u16 + 1;
            if scanline < top || scanline >= top + height {
                continue;
            }
            if selected.len() == MAX_SPRITES_PER_LINE {
                self.status |= status::SPRITE_OVERFLOW;
                break;
            }
            selected.push(sprite);
        }

        selected
    }

    /// Pattern row of a sprite for the given line within it
    fn fetch_sprite_row(
        &self,
        sprite: &Sprite,
        row: u16,
        chr: &dyn ChrBus,
    ) -> Result<(u8, u8), MapperError> {
        let height = self.sprite_height();
        let row = if sprite.is_vflip() { height - 1 - row } else { row };

        let (table, tile, row) = if height == 8 {
            let table = if self.ctrl & ctrl::SPRITE_TABLE != 0 {
                0x1000
            } else {
                0x0000
            };
            (table, sprite.tile_index, row)
        } else {
            // Bit 0 picks the table, the rest picks the top tile of the pair
            let table = if sprite.tile_index & 0x01 != 0 {
                0x1000
            } else {
                0x0000
            };
            let top = sprite.tile_index & 0xFE;
            if row < 8 {
                (table, top, row)
            } else {
                (table, top + 1, row - 8)
            }
        };

        let addr = table + tile as u16 * 16 + row;
        Ok((chr.chr_read(addr)?, chr.chr_read(addr + 8)?))
    }

    /// Draw the selected sprites over the background row
    ///
    /// Lower OAM indices win: the first opaque sprite pixel at a column
    /// claims it, even when it is hidden behind an opaque background pixel.
    fn render_sprite_line(
        &mut self,
        line: &mut LineBuffer,
        chr: &dyn ChrBus,
    ) -> Result<(), MapperError> {
        let sprites = self.evaluate_sprites();
        let show_left = self.mask & mask::SPRITES_LEFT != 0;
        let scanline = self.scanline as u16;
        let mut claimed = [false; SCREEN_WIDTH];

        for sprite in &sprites {
            let (low, high) = self.fetch_sprite_row(sprite, scanline - (sprite.y as u16 + 1), chr)?;

            for column in 0..TILE_SIZE {
                let x = sprite.x as usize + column;
                if x >= SCREEN_WIDTH || claimed[x] || (!show_left && x < 8) {
                    continue;
                }

                let bit = if sprite.is_hflip() { column } else { 7 - column };
                let color_index = (((high >> bit) & 1) << 1) | ((low >> bit) & 1);
                if color_index == 0 {
                    continue;
                }
                claimed[x] = true;

                if line.bg_opaque[x] {
                    if sprite.is_sprite_zero() && x != 255 {
                        self.status |= status::SPRITE_ZERO_HIT;
                    }
                    if sprite.is_behind_background() {
                        continue;
                    }
                }

                line.colors[x] =
                    self.palette_entry(0x10 + (sprite.palette() * 4 + color_index) as usize);
            }
        }

        Ok(())
    }
}
