pub mod blue_purple;
pub mod grayscale;
pub mod orange;
pub mod rgb_bands;

/// `(n * step) % modulus`, computed wide so large iteration caps cannot overflow.
pub(super) fn band(iterations: u32, step: u64, modulus: u64) -> u8 {
    ((u64::from(iterations) * step) % modulus) as u8
}
