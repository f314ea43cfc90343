//! The escape-time kernel. Everything here is pure and safe to call from any
//! number of threads at once.

use crate::core::actions::ports::colour_map::ColourMap;
use crate::core::data::colour::Colour;
use crate::core::data::complex::Complex;
use crate::core::fractals::julia::colour_mapping::kinds::JuliaColourMapKinds;
use crate::core::fractals::julia::colour_mapping::maps::{
    blue_purple::JuliaBluePurple, grayscale::JuliaGrayscale, orange::JuliaOrange,
    rgb_bands::JuliaRgbBands,
};
use std::ops::ControlFlow;

pub const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

/// Counts the steps `z -> z^degree + c` takes from `x0 + i*y0` before `|z|^2`
/// exceeds four, capped at `max_iterations`.
///
/// A step is only counted when the new value stays bounded, so a point that
/// escapes on the very first step returns 0.
#[must_use]
pub fn iterate(x0: f64, y0: f64, c: Complex, degree: u32, max_iterations: u32) -> u32 {
    let escaped = (0..max_iterations).try_fold(Complex::new(x0, y0), |z, iteration| {
        let next = raise(z, degree) + c;

        if next.magnitude_squared() > ESCAPE_RADIUS_SQUARED {
            ControlFlow::Break(iteration)
        } else {
            ControlFlow::Continue(next)
        }
    });

    match escaped {
        ControlFlow::Break(iteration) => iteration,
        ControlFlow::Continue(_) => max_iterations,
    }
}

fn raise(z: Complex, degree: u32) -> Complex {
    match degree {
        2 => z * z,
        3 => z * z * z,
        4 => {
            let squared = z * z;
            squared * squared
        }
        _ => z.powi(degree),
    }
}

/// Maps an iteration count to the palette selected by `theme`.
#[must_use]
pub fn colorize(iterations: u32, max_iterations: u32, theme: JuliaColourMapKinds) -> Colour {
    match theme {
        JuliaColourMapKinds::Rgb => JuliaRgbBands::new(max_iterations).map(iterations),
        JuliaColourMapKinds::BluePurple => JuliaBluePurple::new(max_iterations).map(iterations),
        JuliaColourMapKinds::Orange => JuliaOrange::new(max_iterations).map(iterations),
        JuliaColourMapKinds::Grayscale => JuliaGrayscale::new(max_iterations).map(iterations),
    }
}
