use crate::core::data::complex::Complex;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Error)]
pub enum ComplexRectError {
    #[error("complex rect size must be positive: {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
}

/// The viewport: the region of the complex plane an image covers.
///
/// `top_left` holds `(x_min, y_min)` and `bottom_right` holds `(x_max, y_max)`.
/// Image row 0 maps to `y_min`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ComplexRect {
    top_left: Complex,
    bottom_right: Complex,
}

impl ComplexRect {
    pub fn new(top_left: Complex, bottom_right: Complex) -> Result<Self, ComplexRectError> {
        let width = bottom_right.real - top_left.real;
        let height = bottom_right.imag - top_left.imag;

        // the negated comparison also rejects NaN extents
        if !(width > 0.0 && height > 0.0) {
            return Err(ComplexRectError::InvalidSize { width, height });
        }

        Ok(Self {
            top_left,
            bottom_right,
        })
    }

    pub fn from_bounds(
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Result<Self, ComplexRectError> {
        Self::new(Complex::new(x_min, y_min), Complex::new(x_max, y_max))
    }

    #[must_use]
    pub fn top_left(&self) -> Complex {
        self.top_left
    }

    #[must_use]
    pub fn bottom_right(&self) -> Complex {
        self.bottom_right
    }

    #[must_use]
    pub fn x_min(&self) -> f64 {
        self.top_left.real
    }

    #[must_use]
    pub fn x_max(&self) -> f64 {
        self.bottom_right.real
    }

    #[must_use]
    pub fn y_min(&self) -> f64 {
        self.top_left.imag
    }

    #[must_use]
    pub fn y_max(&self) -> f64 {
        self.bottom_right.imag
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.bottom_right.real - self.top_left.real
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom_right.imag - self.top_left.imag
    }
}

impl Default for ComplexRect {
    fn default() -> Self {
        Self {
            top_left: Complex::new(-2.0, -2.0),
            bottom_right: Complex::new(2.0, 2.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_rect_new_valid() {
        let top_left = Complex::new(-2.0, -1.0);
        let bottom_right = Complex::new(1.0, 1.0);

        let rect = ComplexRect::new(top_left, bottom_right).unwrap();

        assert_eq!(rect.top_left(), top_left);
        assert_eq!(rect.bottom_right(), bottom_right);
    }

    #[test]
    fn test_from_bounds_orders_axes() {
        let rect = ComplexRect::from_bounds(-2.5, 1.0, -1.0, 1.5).unwrap();

        assert_eq!(rect.x_min(), -2.5);
        assert_eq!(rect.x_max(), 1.0);
        assert_eq!(rect.y_min(), -1.0);
        assert_eq!(rect.y_max(), 1.5);
        assert_eq!(rect.width(), 3.5);
        assert_eq!(rect.height(), 2.5);
    }

    #[test]
    fn test_complex_rect_dimensions_must_be_positive() {
        assert_eq!(
            ComplexRect::from_bounds(0.0, 0.0, 0.0, 100.0),
            Err(ComplexRectError::InvalidSize {
                width: 0.0,
                height: 100.0
            })
        );
        assert_eq!(
            ComplexRect::from_bounds(0.0, -100.0, 0.0, 10.0),
            Err(ComplexRectError::InvalidSize {
                width: -100.0,
                height: 10.0
            })
        );
        assert_eq!(
            ComplexRect::from_bounds(0.0, 100.0, 0.0, -10.0),
            Err(ComplexRectError::InvalidSize {
                width: 100.0,
                height: -10.0
            })
        );
    }

    #[test]
    fn test_nan_bounds_are_rejected() {
        assert!(ComplexRect::from_bounds(f64::NAN, 1.0, -1.0, 1.0).is_err());
    }

    #[test]
    fn test_default_is_four_by_four_square() {
        let rect = ComplexRect::default();

        assert_eq!(rect.x_min(), -2.0);
        assert_eq!(rect.y_max(), 2.0);
        assert_eq!(rect.width(), 4.0);
        assert_eq!(rect.height(), 4.0);
    }
}
