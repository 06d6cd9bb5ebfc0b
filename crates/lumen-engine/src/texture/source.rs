use std::path::Path;

use crate::error::RenderError;

/// Decoded RGBA8 pixels, row-major, top row first.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wraps raw RGBA8 pixels; `None` if the buffer length does not match.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * 4;
        (width > 0 && height > 0 && pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// A single opaque texel.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// Bytes per row.
    #[inline]
    pub fn row_bytes(&self) -> u32 {
        self.width * 4
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Asset transport collaborator: fetch + decode.
///
/// Called off the frame thread, so implementations may block.
pub trait ImageSource {
    fn load(&self, path: &Path) -> Result<DecodedImage, RenderError>;
}

/// Reads and decodes images from the local filesystem with the `image` crate.
#[derive(Debug, Default, Copy, Clone)]
pub struct FileImageSource;

impl ImageSource for FileImageSource {
    fn load(&self, path: &Path) -> Result<DecodedImage, RenderError> {
        let asset_error = |message: String| RenderError::AssetLoad {
            path: path.display().to_string(),
            message,
        };

        let img = image::open(path).map_err(|e| asset_error(e.to_string()))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        DecodedImage::from_rgba8(width, height, rgba.into_raw())
            .ok_or_else(|| asset_error("image has no pixels".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba8_checks_length() {
        assert!(DecodedImage::from_rgba8(2, 2, vec![0; 16]).is_some());
        assert!(DecodedImage::from_rgba8(2, 2, vec![0; 15]).is_none());
        assert!(DecodedImage::from_rgba8(0, 2, vec![]).is_none());
    }

    #[test]
    fn missing_file_is_an_asset_error() {
        let err = FileImageSource
            .load(Path::new("/definitely/not/here.png"))
            .unwrap_err();
        assert!(matches!(err, RenderError::AssetLoad { .. }), "{err}");
    }

    #[test]
    fn decodes_png_from_disk() {
        let dir = std::env::temp_dir().join(format!("lumen-source-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("checker.png");

        let img = image::RgbaImage::from_fn(3, 2, |x, y| {
            if (x + y) % 2 == 0 { image::Rgba([255, 255, 255, 255]) } else { image::Rgba([0, 0, 0, 255]) }
        });
        img.save(&path).unwrap();

        let decoded = FileImageSource.load(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixels.len(), 24);
        assert_eq!(&decoded.pixels[0..4], &[255, 255, 255, 255]);
        assert_eq!(&decoded.pixels[4..8], &[0, 0, 0, 255]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
