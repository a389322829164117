// Cartridge module - iNES image parsing and mapper hardware
//
// A cartridge is immutable once parsed. The bank-switching state lives in the
// mapper built from it (see `mappers`).

pub mod mappers;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use mappers::{create_mapper, Mapper, MapperError, MapperState, StateValue};

/// iNES magic bytes: "NES" followed by MS-DOS EOF
const INES_MAGIC: [u8; 4] = [b'N', b'E', b'S', 0x1A];

/// Size of the iNES header
pub const HEADER_SIZE: usize = 16;

/// Size of the optional trainer block between the header and PRG data
pub const TRAINER_SIZE: usize = 512;

/// PRG-ROM page size declared by the header
pub const PRG_PAGE_SIZE: usize = 16 * 1024;

/// CHR-ROM page size declared by the header
pub const CHR_PAGE_SIZE: usize = 8 * 1024;

/// Errors raised while reading a ROM image
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("invalid iNES magic {0:02X?}")]
    InvalidMagic([u8; 4]),

    #[error("ROM image is {0} bytes, shorter than the 16-byte header")]
    MissingHeader(usize),

    #[error("ROM image truncated: {section} needs {expected} bytes, {found} available")]
    Truncated {
        section: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Nametable mirroring arrangement
///
/// The cartridge header fixes the initial mode; MMC1 and MMC3 may switch it
/// at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mirroring {
    /// $2000/$2400 share a table, $2800/$2C00 share the other
    Horizontal,
    /// $2000/$2800 share a table, $2400/$2C00 share the other
    Vertical,
    /// All four logical tables map to the first physical table
    SingleScreenLower,
    /// All four logical tables map to the second physical table
    SingleScreenUpper,
    /// Four independent tables backed by cartridge VRAM
    FourScreen,
}

impl Mirroring {
    /// Physical nametable backing each of the four logical tables
    pub const fn nametable_map(self) -> [usize; 4] {
        match self {
            Mirroring::Horizontal => [0, 0, 1, 1],
            Mirroring::Vertical => [0, 1, 0, 1],
            Mirroring::SingleScreenLower => [0, 0, 0, 0],
            Mirroring::SingleScreenUpper => [1, 1, 1, 1],
            Mirroring::FourScreen => [0, 1, 2, 3],
        }
    }
}

/// Decoded iNES header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct INesHeader {
    /// PRG-ROM size in 16KB pages
    pub prg_pages: u8,
    /// CHR-ROM size in 8KB pages (0 means 8KB of CHR-RAM)
    pub chr_pages: u8,
    /// Mapper number (high nibble of byte 7, low nibble from byte 6)
    pub mapper_id: u8,
    /// Mirroring selected by flags 6 bits 0 and 3
    pub mirroring: Mirroring,
    /// Cartridge carries 8KB of PRG-RAM at $6000-$7FFF
    pub has_prg_ram: bool,
    /// A 512-byte trainer precedes PRG data
    pub has_trainer: bool,
}

impl INesHeader {
    /// Parse the fixed 16-byte header
    pub fn parse(bytes: &[u8]) -> Result<Self, CartridgeError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CartridgeError::MissingHeader(bytes.len()));
        }

        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != INES_MAGIC {
            return Err(CartridgeError::InvalidMagic(magic));
        }

        let flags6 = bytes[6];
        let flags7 = bytes[7];

        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(INesHeader {
            prg_pages: bytes[4],
            chr_pages: bytes[5],
            mapper_id: (flags7 & 0xF0) | (flags6 >> 4),
            mirroring,
            has_prg_ram: flags6 & 0x02 != 0,
            has_trainer: flags6 & 0x04 != 0,
        })
    }

    /// Whether the cartridge uses writable CHR-RAM instead of CHR-ROM
    pub fn uses_chr_ram(&self) -> bool {
        self.chr_pages == 0
    }
}

/// A loaded cartridge image
#[derive(Debug, Clone)]
pub struct Cartridge {
    /// Header the image was parsed from
    pub header: INesHeader,
    /// PRG-ROM bytes
    pub prg_rom: Vec<u8>,
    /// CHR-ROM bytes, or 8KB of zeroed CHR-RAM
    pub chr_rom: Vec<u8>,
    /// Trainer block, when present
    pub trainer: Option<Vec<u8>>,
}

impl Cartridge {
    /// Parse an iNES image held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CartridgeError> {
        let header = INesHeader::parse(bytes)?;
        let mut offset = HEADER_SIZE;

        let trainer = if header.has_trainer {
            let block = slice(bytes, offset, TRAINER_SIZE, "trainer")?;
            offset += TRAINER_SIZE;
            Some(block.to_vec())
        } else {
            None
        };

        let prg_size = header.prg_pages as usize * PRG_PAGE_SIZE;
        let prg_rom = slice(bytes, offset, prg_size, "PRG-ROM")?.to_vec();
        offset += prg_size;

        let chr_rom = if header.uses_chr_ram() {
            vec![0; CHR_PAGE_SIZE]
        } else {
            let chr_size = header.chr_pages as usize * CHR_PAGE_SIZE;
            slice(bytes, offset, chr_size, "CHR-ROM")?.to_vec()
        };

        log::info!(
            "Cartridge: mapper {}, {}x16KB PRG, {} CHR, {:?} mirroring{}",
            header.mapper_id,
            header.prg_pages,
            if header.uses_chr_ram() {
                "8KB RAM".to_string()
            } else {
                format!("{}x8KB", header.chr_pages)
            },
            header.mirroring,
            if header.has_prg_ram { ", PRG-RAM" } else { "" }
        );

        Ok(Cartridge {
            header,
            prg_rom,
            chr_rom,
            trainer,
        })
    }

    /// Read and parse an iNES file from disk
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn mapper_id(&self) -> u8 {
        self.header.mapper_id
    }

    pub fn mirroring(&self) -> Mirroring {
        self.header.mirroring
    }
}

fn slice<'a>(
    bytes: &'a [u8],
    offset: usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8], CartridgeError> {
    bytes
        .get(offset..offset + len)
        .ok_or(CartridgeError::Truncated {
            section,
            expected: len,
            found: bytes.len().saturating_sub(offset),
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Build an iNES image whose PRG pages are filled with their page index
    /// and CHR pages with `0x80 | page`.
    pub fn build_rom(prg_pages: u8, chr_pages: u8, mapper: u8, flags6_low: u8) -> Vec<u8> {
        let mut rom = vec![
            b'N',
            b'E',
            b'S',
            0x1A,
            prg_pages,
            chr_pages,
            ((mapper & 0x0F) << 4) | (flags6_low & 0x0F),
            mapper & 0xF0,
        ];
        rom.resize(16, 0);
        if flags6_low & 0x04 != 0 {
            rom.extend(std::iter::repeat(0xEE).take(512));
        }
        for page in 0..prg_pages {
            rom.extend(std::iter::repeat(page).take(16 * 1024));
        }
        for page in 0..chr_pages {
            rom.extend(std::iter::repeat(0x80 | page).take(8 * 1024));
        }
        rom
    }

    /// 32KB NROM image with `program` at $8000, NOP padding, one CHR page
    /// and the given RESET, NMI and IRQ vectors
    pub fn program_rom(program: &[u8], reset: u16, nmi: u16, irq: u16) -> Vec<u8> {
        let mut rom = vec![b'N', b'E', b'S', 0x1A, 2, 1, 0x00, 0x00];
        rom.resize(16, 0);

        let mut prg = vec![0xEA; 0x8000];
        prg[..program.len()].copy_from_slice(program);
        for (offset, vector) in [(0x7FFA, nmi), (0x7FFC, reset), (0x7FFE, irq)] {
            prg[offset..offset + 2].copy_from_slice(&vector.to_le_bytes());
        }
        rom.extend_from_slice(&prg);
        rom.extend(std::iter::repeat(0).take(0x2000));
        rom
    }
}
