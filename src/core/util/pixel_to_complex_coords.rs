use crate::core::data::complex::Complex;
use crate::core::data::complex_rect::ComplexRect;
use crate::core::data::image_dims::ImageDims;
use crate::core::data::point::Point;

/// Linear map from image space onto the viewport.
///
/// Divides by the full width and height, so pixel `width` would land on
/// `x_max` and the last real column sits one step short of it. Points outside
/// the image are mapped with the same transform; distributed tiles rely on
/// that when they address rows by their global index.
#[must_use]
pub fn pixel_to_complex_coords(pixel: Point, dims: ImageDims, viewport: ComplexRect) -> Complex {
    Complex {
        real: map_axis(pixel.x, dims.width(), viewport.x_min(), viewport.x_max()),
        imag: map_axis(pixel.y, dims.height(), viewport.y_min(), viewport.y_max()),
    }
}

fn map_axis(value: u32, extent: u32, min: f64, max: f64) -> f64 {
    f64::from(value) * (max - min) / f64::from(extent) + min
}
