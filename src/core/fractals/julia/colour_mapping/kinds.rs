use tracing::warn;

/// Palette selector. The numeric id is what travels over the wire and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JuliaColourMapKinds {
    #[default]
    Rgb,
    BluePurple,
    Orange,
    Grayscale,
}

impl JuliaColourMapKinds {
    pub const ALL: &'static [Self] = &[Self::Rgb, Self::BluePurple, Self::Orange, Self::Grayscale];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::BluePurple => "Blue-purple",
            Self::Orange => "Orange",
            Self::Grayscale => "Grayscale",
        }
    }

    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::Rgb => 1,
            Self::BluePurple => 2,
            Self::Orange => 3,
            Self::Grayscale => 4,
        }
    }

    #[must_use]
    pub const fn try_from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Rgb),
            2 => Some(Self::BluePurple),
            3 => Some(Self::Orange),
            4 => Some(Self::Grayscale),
            _ => None,
        }
    }

    /// Unknown ids fall back to the default palette.
    #[must_use]
    pub fn from_id(id: u32) -> Self {
        Self::try_from_id(id).unwrap_or_else(|| {
            warn!(
                theme = id,
                fallback = Self::default().id(),
                "unknown theme id, using default palette"
            );
            Self::default()
        })
    }
}

impl std::fmt::Display for JuliaColourMapKinds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for &kind in JuliaColourMapKinds::ALL {
            assert_eq!(JuliaColourMapKinds::from_id(kind.id()), kind);
        }
    }

    #[test]
    fn unknown_ids_normalise_to_rgb() {
        assert_eq!(JuliaColourMapKinds::from_id(0), JuliaColourMapKinds::Rgb);
        assert_eq!(JuliaColourMapKinds::from_id(5), JuliaColourMapKinds::Rgb);
        assert_eq!(JuliaColourMapKinds::try_from_id(99), None);
    }
}
