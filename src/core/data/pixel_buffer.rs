use crate::core::data::colour::Colour;
use crate::core::data::image_dims::{BYTES_PER_PIXEL, ImageDims};
use crate::core::data::point::Point;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PixelBufferError {
    #[error(
        "pixel at x:{}, y:{} outside of image bounds {}x{}",
        .pixel.x,
        .pixel.y,
        .dims.width(),
        .dims.height()
    )]
    PixelOutsideBounds { pixel: Point, dims: ImageDims },
    #[error("image size {expected_size} does not match buffer size {buffer_size}")]
    BoundsMismatch {
        expected_size: usize,
        buffer_size: usize,
    },
    #[error("could not allocate {bytes} bytes for the image")]
    Allocation { bytes: usize },
}

pub type PixelBufferData = Vec<u8>;

/// Row-major RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    dims: ImageDims,
    buffer: PixelBufferData,
}

impl PixelBuffer {
    #[must_use]
    pub fn new(dims: ImageDims) -> Self {
        Self {
            dims,
            buffer: vec![0; dims.buffer_size()],
        }
    }

    /// Like [`PixelBuffer::new`], but reports allocation failure instead of aborting.
    pub fn try_new(dims: ImageDims) -> Result<Self, PixelBufferError> {
        let bytes = dims.buffer_size();
        let mut buffer = PixelBufferData::new();
        buffer
            .try_reserve_exact(bytes)
            .map_err(|_| PixelBufferError::Allocation { bytes })?;
        buffer.resize(bytes, 0);

        Ok(Self { dims, buffer })
    }

    pub fn from_data(dims: ImageDims, buffer: PixelBufferData) -> Result<Self, PixelBufferError> {
        check_size(dims, buffer.len())?;

        Ok(Self { dims, buffer })
    }

    #[must_use]
    pub fn dims(&self) -> ImageDims {
        self.dims
    }

    #[must_use]
    pub fn buffer(&self) -> &PixelBufferData {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    #[must_use]
    pub fn into_data(self) -> PixelBufferData {
        self.buffer
    }

    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.dims.height() {
            return None;
        }

        let row_bytes = self.dims.row_bytes();
        let start = y as usize * row_bytes;
        Some(&self.buffer[start..start + row_bytes])
    }

    pub fn pixel(&self, pixel: Point) -> Result<[u8; 4], PixelBufferError> {
        let index = self.index_of(pixel)?;
        let mut rgba = [0; BYTES_PER_PIXEL];
        rgba.copy_from_slice(&self.buffer[index..index + BYTES_PER_PIXEL]);

        Ok(rgba)
    }

    pub fn set_pixel(&mut self, pixel: Point, colour: Colour) -> Result<(), PixelBufferError> {
        let index = self.index_of(pixel)?;
        self.buffer[index..index + BYTES_PER_PIXEL].copy_from_slice(&colour.to_rgba());

        Ok(())
    }

    fn index_of(&self, pixel: Point) -> Result<usize, PixelBufferError> {
        if pixel.x >= self.dims.width() || pixel.y >= self.dims.height() {
            return Err(PixelBufferError::PixelOutsideBounds {
                pixel,
                dims: self.dims,
            });
        }

        Ok((pixel.y as usize * self.dims.width() as usize + pixel.x as usize) * BYTES_PER_PIXEL)
    }
}

pub(crate) fn check_size(dims: ImageDims, buffer_size: usize) -> Result<(), PixelBufferError> {
    if dims.buffer_size() != buffer_size {
        return Err(PixelBufferError::BoundsMismatch {
            expected_size: dims.buffer_size(),
            buffer_size,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> ImageDims {
        ImageDims::new(width, height).unwrap()
    }

    #[test]
    fn test_try_new_matches_new() {
        assert_eq!(PixelBuffer::try_new(dims(7, 3)).unwrap(), PixelBuffer::new(dims(7, 3)));
    }

    #[test]
    fn test_new_creates_zeroed_buffer() {
        let buffer = PixelBuffer::new(dims(10, 10));

        assert_eq!(buffer.buffer_size(), 400); // 10 * 10 * 4
        assert!(buffer.buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_data_valid() {
        let data: Vec<u8> = vec![
            255, 0, 0, 255, // pixel (0,0) - red
            0, 255, 0, 255, // pixel (1,0) - green
        ];

        let buffer = PixelBuffer::from_data(dims(2, 1), data.clone()).unwrap();

        assert_eq!(buffer.buffer(), &data);
        assert_eq!(buffer.dims(), dims(2, 1));
    }

    #[test]
    fn test_from_data_buffer_size_mismatch() {
        let result = PixelBuffer::from_data(dims(2, 2), vec![255, 0, 0]);

        assert_eq!(
            result.unwrap_err(),
            PixelBufferError::BoundsMismatch {
                expected_size: 16,
                buffer_size: 3
            }
        );
    }

    #[test]
    fn test_set_pixel_writes_rgba() {
        let mut buffer = PixelBuffer::new(dims(3, 3));
        let red = Colour { r: 255, g: 0, b: 0 };

        buffer.set_pixel(Point { x: 1, y: 1 }, red).unwrap();

        assert_eq!(&buffer.buffer()[16..20], &[255, 0, 0, 255]);
        assert_eq!(buffer.pixel(Point { x: 1, y: 1 }).unwrap(), [255, 0, 0, 255]);
    }

    #[test]
    fn test_set_pixel_bottom_right_corner() {
        let mut buffer = PixelBuffer::new(dims(3, 3));
        let blue = Colour { r: 0, g: 0, b: 255 };

        buffer.set_pixel(Point { x: 2, y: 2 }, blue).unwrap();

        assert_eq!(&buffer.buffer()[32..36], &[0, 0, 255, 255]);
    }

    #[test]
    fn test_set_pixel_outside_bounds() {
        let mut buffer = PixelBuffer::new(dims(3, 3));
        let result = buffer.set_pixel(Point { x: 5, y: 1 }, Colour::BLACK);

        assert_eq!(
            result,
            Err(PixelBufferError::PixelOutsideBounds {
                pixel: Point { x: 5, y: 1 },
                dims: dims(3, 3)
            })
        );
    }

    #[test]
    fn test_row_slices_are_row_major() {
        let data: Vec<u8> = (0..24).collect();
        let buffer = PixelBuffer::from_data(dims(2, 3), data).unwrap();

        assert_eq!(buffer.row(1).unwrap(), &[8, 9, 10, 11, 12, 13, 14, 15]);
        assert!(buffer.row(3).is_none());
    }
}
