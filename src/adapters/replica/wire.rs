//! Request and response shapes shared by the replica client and server.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::data::complex::Complex;
use crate::core::data::complex_rect::{ComplexRect, ComplexRectError};
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::image_dims::{ImageDims, ImageDimsError};
use crate::core::fractals::julia::colour_mapping::kinds::JuliaColourMapKinds;
use crate::core::fractals::julia::errors::julia::JuliaError;

pub const CALCULATE_JULIA_PATH: &str = "/fractal.FractalService/CalculateJulia";
pub const SHUTDOWN_PATH: &str = "/fractal.FractalService/Shutdown";
pub const HEALTH_PATH: &str = "/health";

pub const CALCULATION_TIME_HEADER: &str = "x-calculation-time-ms";
pub const SERVER_ID_HEADER: &str = "x-server-id";

#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid fractal parameters: {0}")]
    Params(#[from] JuliaError),
    #[error("invalid viewport: {0}")]
    Viewport(#[from] ComplexRectError),
    #[error("invalid image size: {0}")]
    Dims(#[from] ImageDimsError),
}

fn default_theme() -> u32 {
    JuliaColourMapKinds::default().id()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeRequest {
    pub c_real: f64,
    pub c_imag: f64,
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub poly_degree: u32,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    #[serde(default = "default_theme")]
    pub theme: u32,
}

impl ComputeRequest {
    #[must_use]
    pub fn new(params: &FractalParams, dims: ImageDims) -> Self {
        let viewport = params.viewport();

        Self {
            c_real: params.c().real,
            c_imag: params.c().imag,
            width: dims.width(),
            height: dims.height(),
            max_iterations: params.max_iterations(),
            poly_degree: params.degree(),
            x_min: viewport.x_min(),
            x_max: viewport.x_max(),
            y_min: viewport.y_min(),
            y_max: viewport.y_max(),
            theme: params.theme().id(),
        }
    }

    /// Validates the request. Unknown themes are normalised, not rejected.
    pub fn to_params(&self) -> Result<(FractalParams, ImageDims), WireError> {
        let viewport = ComplexRect::from_bounds(self.x_min, self.x_max, self.y_min, self.y_max)?;
        let params = FractalParams::new(
            Complex::new(self.c_real, self.c_imag),
            self.poly_degree,
            self.max_iterations,
            viewport,
            JuliaColourMapKinds::from_id(self.theme),
        )?;
        let dims = ImageDims::new(self.width, self.height)?;

        Ok((params, dims))
    }
}

/// A decoded CalculateJulia reply. On the wire the pixels are the raw body
/// and the other fields travel as headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeResponse {
    pub rgba_data: Vec<u8>,
    pub calculation_time_ms: f64,
    pub server_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub server_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_every_parameter() {
        let params = FractalParams::default().with_theme(JuliaColourMapKinds::Orange);
        let dims = ImageDims::new(640, 480).unwrap();

        let request = ComputeRequest::new(&params, dims);

        assert_eq!(request.c_real, -0.8);
        assert_eq!(request.c_imag, 0.156);
        assert_eq!((request.width, request.height), (640, 480));
        assert_eq!(request.poly_degree, 2);
        assert_eq!(request.theme, 3);
        assert_eq!(request.to_params().unwrap(), (params, dims));
    }

    #[test]
    fn test_missing_theme_defaults_to_rgb() {
        let json = r#"{"c_real":-0.8,"c_imag":0.156,"width":4,"height":4,"max_iterations":100,
            "poly_degree":2,"x_min":-2.0,"x_max":2.0,"y_min":-2.0,"y_max":2.0}"#;

        let request: ComputeRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.theme, 1);
        assert_eq!(request.to_params().unwrap().0.theme(), JuliaColourMapKinds::Rgb);
    }

    #[test]
    fn test_invalid_theme_is_normalised() {
        let mut request =
            ComputeRequest::new(&FractalParams::default(), ImageDims::new(2, 2).unwrap());
        request.theme = 42;

        assert_eq!(request.to_params().unwrap().0.theme(), JuliaColourMapKinds::Rgb);
    }

    #[test]
    fn test_invalid_requests_are_rejected() {
        let valid =
            ComputeRequest::new(&FractalParams::default(), ImageDims::new(2, 2).unwrap());

        let zero_width = ComputeRequest {
            width: 0,
            ..valid.clone()
        };
        assert!(matches!(zero_width.to_params(), Err(WireError::Dims(_))));

        let linear = ComputeRequest {
            poly_degree: 1,
            ..valid.clone()
        };
        assert!(matches!(
            linear.to_params(),
            Err(WireError::Params(JuliaError::DegreeTooLow { degree: 1 }))
        ));

        let inverted = ComputeRequest { x_min: 3.0, ..valid };
        assert!(matches!(inverted.to_params(), Err(WireError::Viewport(_))));
    }

    #[test]
    fn test_huge_dimensions_are_rejected_before_allocating() {
        let huge = ComputeRequest {
            width: 1 << 20,
            height: 1 << 20,
            ..ComputeRequest::new(&FractalParams::default(), ImageDims::new(2, 2).unwrap())
        };

        assert!(matches!(
            huge.to_params(),
            Err(WireError::Dims(ImageDimsError::TooLarge { .. }))
        ));
    }
}
