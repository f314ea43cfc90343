use thiserror::Error;

pub const BYTES_PER_PIXEL: usize = 4;

/// Largest image accepted anywhere in the crate: 16384x16384, a 1 GiB RGBA buffer.
pub const MAX_PIXEL_COUNT: usize = 1 << 28;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ImageDimsError {
    #[error("image dimensions must be positive: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("image {width}x{height} exceeds the limit of {max_pixels} pixels")]
    TooLarge {
        width: u32,
        height: u32,
        max_pixels: usize,
    },
}

/// Output image size in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ImageDims {
    width: u32,
    height: u32,
}

impl ImageDims {
    pub fn new(width: u32, height: u32) -> Result<Self, ImageDimsError> {
        if width == 0 || height == 0 {
            return Err(ImageDimsError::InvalidSize { width, height });
        }

        let fits = (width as usize)
            .checked_mul(height as usize)
            .is_some_and(|pixels| pixels <= MAX_PIXEL_COUNT);
        if !fits {
            return Err(ImageDimsError::TooLarge {
                width,
                height,
                max_pixels: MAX_PIXEL_COUNT,
            });
        }

        Ok(Self { width, height })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[must_use]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Cannot overflow: [`ImageDims::new`] caps the pixel count.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }
}
