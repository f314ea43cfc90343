use std::ops::{Add, Mul};

// implement Complex instead of using the num-complex trait for learning
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Complex {
    pub real: f64,
    pub imag: f64,
}

impl Complex {
    #[must_use]
    pub const fn new(real: f64, imag: f64) -> Self {
        Self { real, imag }
    }

    #[must_use]
    pub fn magnitude_squared(&self) -> f64 {
        self.real * self.real + self.imag * self.imag
    }

    /// Raises `self` to an integer power through the polar form.
    ///
    /// Used for polynomial degrees above four, where repeated multiplication
    /// stops paying for itself.
    #[must_use]
    pub fn powi(&self, exponent: u32) -> Self {
        if exponent == 0 {
            return Self::new(1.0, 0.0);
        }

        let radius = self.magnitude_squared().sqrt().powi(exponent as i32);
        let angle = self.imag.atan2(self.real) * exponent as f64;

        Self {
            real: radius * angle.cos(),
            imag: radius * angle.sin(),
        }
    }
}

impl Add for Complex {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            real: self.real + other.real,
            imag: self.imag + other.imag,
        }
    }
}

impl Mul for Complex {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self {
            real: self.real * other.real - self.imag * other.imag,
            imag: self.real * other.imag + self.imag * other.real,
        }
    }
}
