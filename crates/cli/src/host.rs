//! Loading an image file as a stand-in host framebuffer.

use crate::error::CliError;
use std::path::Path;

/// A decoded RGBA8 image, top row first.
pub struct HostImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decodes `path` into RGBA8.
///
/// Missing or unreadable files are `CliError::Io`; files that are not a
/// supported image are `CliError::Input`.
pub fn load_image(path: &Path) -> Result<HostImage, CliError> {
    let img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();
    Ok(HostImage {
        width,
        height,
        rgba: img.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_image_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.png");
        let img = image::RgbaImage::from_fn(3, 2, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
        img.save(&path).unwrap();

        let host = load_image(&path).unwrap();
        assert_eq!((host.width, host.height), (3, 2));
        assert_eq!(host.rgba.len(), 3 * 2 * 4);
        // Second texel of the top row.
        assert_eq!(&host.rgba[4..8], &[1, 0, 7, 255]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(&dir.path().join("absent.png")).err().unwrap();
        assert_eq!(err.exit_code(), 11, "got: {err}");
    }

    #[test]
    fn garbage_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_image(&path).err().unwrap();
        assert_eq!(err.exit_code(), 12, "got: {err}");
    }
}
