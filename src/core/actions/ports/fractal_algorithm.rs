use crate::core::data::point::Point;

/// Per-pixel evaluation. Implementations must be pure so any scheduler may
/// call them in any order from any thread.
pub trait FractalAlgorithm {
    type Success;

    fn compute(&self, pixel: Point) -> Self::Success;
}
