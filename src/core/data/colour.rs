#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    #[must_use]
    pub const fn grey(level: u8) -> Self {
        Self {
            r: level,
            g: level,
            b: level,
        }
    }

    /// Opaque RGBA bytes as stored in a [`PixelBuffer`](crate::PixelBuffer).
    #[must_use]
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, u8::MAX]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_is_always_opaque() {
        assert_eq!(Colour { r: 1, g: 2, b: 3 }.to_rgba(), [1, 2, 3, 255]);
        assert_eq!(Colour::BLACK.to_rgba(), [0, 0, 0, 255]);
    }

    #[test]
    fn grey_sets_all_channels() {
        assert_eq!(Colour::grey(40), Colour { r: 40, g: 40, b: 40 });
    }
}
