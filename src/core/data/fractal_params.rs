use crate::core::data::complex::Complex;
use crate::core::data::complex_rect::ComplexRect;
use crate::core::fractals::julia::colour_mapping::kinds::JuliaColourMapKinds;
use crate::core::fractals::julia::errors::julia::JuliaError;

pub const DEFAULT_C: Complex = Complex::new(-0.8, 0.156);
pub const DEFAULT_DEGREE: u32 = 2;
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Everything needed to evaluate one Julia set frame, independent of image size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FractalParams {
    c: Complex,
    degree: u32,
    max_iterations: u32,
    viewport: ComplexRect,
    theme: JuliaColourMapKinds,
}

impl FractalParams {
    pub fn new(
        c: Complex,
        degree: u32,
        max_iterations: u32,
        viewport: ComplexRect,
        theme: JuliaColourMapKinds,
    ) -> Result<Self, JuliaError> {
        if degree < 2 {
            return Err(JuliaError::DegreeTooLow { degree });
        }

        if max_iterations == 0 {
            return Err(JuliaError::ZeroMaxIterationsError);
        }

        Ok(Self {
            c,
            degree,
            max_iterations,
            viewport,
            theme,
        })
    }

    #[must_use]
    pub fn c(&self) -> Complex {
        self.c
    }

    #[must_use]
    pub fn degree(&self) -> u32 {
        self.degree
    }

    #[must_use]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    #[must_use]
    pub fn viewport(&self) -> ComplexRect {
        self.viewport
    }

    #[must_use]
    pub fn theme(&self) -> JuliaColourMapKinds {
        self.theme
    }

    #[must_use]
    pub fn with_theme(self, theme: JuliaColourMapKinds) -> Self {
        Self { theme, ..self }
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            c: DEFAULT_C,
            degree: DEFAULT_DEGREE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            viewport: ComplexRect::default(),
            theme: JuliaColourMapKinds::default(),
        }
    }
}
