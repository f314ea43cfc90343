use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JuliaError {
    #[error("maximum iterations must be greater than zero")]
    ZeroMaxIterationsError,
    #[error("polynomial degree must be at least 2, got {degree}")]
    DegreeTooLow { degree: u32 },
}
