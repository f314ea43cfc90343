use crate::core::actions::ports::fractal_algorithm::FractalAlgorithm;
use crate::core::data::complex::Complex;
use crate::core::data::complex_rect::ComplexRect;
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::image_dims::ImageDims;
use crate::core::data::point::Point;
use crate::core::fractals::julia::kernel::iterate;
use crate::core::util::pixel_to_complex_coords::pixel_to_complex_coords;

/// A Julia set bound to one image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JuliaAlgorithm {
    dims: ImageDims,
    viewport: ComplexRect,
    c: Complex,
    degree: u32,
    max_iterations: u32,
}

impl FractalAlgorithm for JuliaAlgorithm {
    type Success = u32;

    fn compute(&self, pixel: Point) -> Self::Success {
        let z = pixel_to_complex_coords(pixel, self.dims, self.viewport);

        iterate(z.real, z.imag, self.c, self.degree, self.max_iterations)
    }
}

impl JuliaAlgorithm {
    #[must_use]
    pub fn new(params: &FractalParams, dims: ImageDims) -> Self {
        Self {
            dims,
            viewport: params.viewport(),
            c: params.c(),
            degree: params.degree(),
            max_iterations: params.max_iterations(),
        }
    }

    #[must_use]
    pub fn dims(&self) -> ImageDims {
        self.dims
    }

    #[must_use]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_algorithm() -> JuliaAlgorithm {
        JuliaAlgorithm::new(&FractalParams::default(), ImageDims::new(4, 4).unwrap())
    }

    #[test]
    fn test_corner_pixel_maps_to_viewport_corner() {
        let algorithm = reference_algorithm();

        assert_eq!(
            algorithm.compute(Point { x: 0, y: 0 }),
            iterate(-2.0, -2.0, Complex::new(-0.8, 0.156), 2, 100)
        );
    }

    #[test]
    fn test_centre_pixel_matches_kernel_at_origin() {
        let algorithm = reference_algorithm();

        assert_eq!(
            algorithm.compute(Point { x: 2, y: 2 }),
            iterate(0.0, 0.0, Complex::new(-0.8, 0.156), 2, 100)
        );
    }

    #[test]
    fn test_counts_are_bounded_by_max_iterations() {
        let algorithm = reference_algorithm();

        for y in 0..4 {
            for x in 0..4 {
                assert!(algorithm.compute(Point { x, y }) <= algorithm.max_iterations());
            }
        }
    }
}
