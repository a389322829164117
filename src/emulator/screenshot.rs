// Screenshot functionality
//
// Captures the current frame buffer and saves it as a PNG file.

use crate::ppu::palette::split_rgb;
use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during screenshot operations
#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),
}

/// Save a screenshot of the current frame
///
/// # Arguments
///
/// * `frame_buffer` - The PPU frame buffer (256x240 `0x00RRGGBB` pixels)
/// * `directory` - Base screenshot directory
/// * `rom_path` - Optional path to the currently loaded ROM (for naming)
/// * `include_timestamp` - Stamp the file name with the local time
///
/// # Returns
///
/// The path of the written PNG
pub fn save_screenshot(
    frame_buffer: &[u32],
    directory: &Path,
    rom_path: Option<&Path>,
    include_timestamp: bool,
) -> Result<PathBuf, ScreenshotError> {
    let screenshots_dir = screenshot_directory(directory, rom_path);
    fs::create_dir_all(&screenshots_dir)?;

    let filename = if include_timestamp {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        format!("screenshot_{}.png", timestamp)
    } else {
        "screenshot.png".to_string()
    };
    let file_path = screenshots_dir.join(filename);

    let file = fs::File::create(&file_path)?;
    encode_png(frame_buffer, io::BufWriter::new(file))?;

    log::info!("Screenshot saved to {}", file_path.display());
    Ok(file_path)
}

/// Encode a frame as an 8-bit RGB PNG
pub fn encode_png<W: io::Write>(frame_buffer: &[u32], writer: W) -> Result<(), ScreenshotError> {
    debug_assert_eq!(frame_buffer.len(), SCREEN_WIDTH * SCREEN_HEIGHT);

    let mut encoder = png::Encoder::new(writer, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame_to_rgb(frame_buffer))?;
    Ok(())
}

/// Creates a directory structure like: screenshots/<rom_name>/
fn screenshot_directory(base_dir: &Path, rom_path: Option<&Path>) -> PathBuf {
    match rom_path.and_then(|p| p.file_stem()) {
        Some(rom_name) => base_dir.join(rom_name),
        None => base_dir.join("default"),
    }
}

/// Unpack `0x00RRGGBB` pixels into RGB888 bytes
fn frame_to_rgb(frame_buffer: &[u32]) -> Vec<u8> {
    frame_buffer
        .iter()
        .flat_map(|&pixel| split_rgb(pixel))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_to_rgb() {
        let rgb = frame_to_rgb(&[0x00112233, 0x00FFFFFF]);
        assert_eq!(rgb, vec![0x11, 0x22, 0x33, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_screenshot_directory() {
        let base = PathBuf::from("screenshots");
        let dir = screenshot_directory(&base, None);
        assert!(dir.ends_with("screenshots/default"));

        let rom_path = PathBuf::from("test/game.nes");
        let dir = screenshot_directory(&base, Some(&rom_path));
        assert!(dir.ends_with("screenshots/game"));
    }

    #[test]
    fn test_encode_png_signature() {
        let frame = vec![0x00FF0000; SCREEN_WIDTH * SCREEN_HEIGHT];
        let mut bytes = Vec::new();
        encode_png(&frame, &mut bytes).unwrap();

        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_save_screenshot_writes_file() {
        let base = std::env::temp_dir().join(format!("nes_machine_shots_{}", std::process::id()));
        let frame = vec![0; SCREEN_WIDTH * SCREEN_HEIGHT];

        let path = save_screenshot(&frame, &base, Some(Path::new("demo.nes")), false).unwrap();

        assert_eq!(path, base.join("demo").join("screenshot.png"));
        assert!(path.exists());
        fs::remove_dir_all(&base).ok();
    }
}
