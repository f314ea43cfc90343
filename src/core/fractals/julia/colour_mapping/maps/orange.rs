use crate::core::actions::ports::colour_map::ColourMap;
use crate::core::data::colour::Colour;
use crate::core::fractals::julia::colour_mapping::kinds::JuliaColourMapKinds;
use crate::core::fractals::julia::colour_mapping::map::JuliaColourMap;
use crate::core::fractals::julia::colour_mapping::maps::band;

#[derive(Debug)]
pub struct JuliaOrange {
    max_iterations: u32,
}

impl ColourMap<u32> for JuliaOrange {
    fn map(&self, iterations: u32) -> Colour {
        if iterations >= self.max_iterations {
            return Colour::BLACK;
        }

        Colour {
            r: 200 + band(iterations, 5, 55),
            g: 100 + band(iterations, 8, 155),
            b: band(iterations, 2, 50),
        }
    }

    fn display_name(&self) -> &str {
        self.kind().display_name()
    }
}

impl JuliaColourMap for JuliaOrange {
    fn kind(&self) -> JuliaColourMapKinds {
        JuliaColourMapKinds::Orange
    }
}

impl JuliaOrange {
    #[must_use]
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_returns_black_at_max_iterations() {
        assert_eq!(JuliaOrange::new(10).map(10), Colour::BLACK);
    }

    #[test]
    fn test_map_channels_stay_in_their_ranges() {
        let mapper = JuliaOrange::new(1_000);

        for n in 0..1_000 {
            let colour = mapper.map(n);
            assert!(colour.r >= 200);
            assert!(colour.g >= 100);
            assert!(colour.b < 50);
        }
    }

    #[test]
    fn test_map_known_value() {
        // 20*5 = 100 -> 45, 20*8 = 160 -> 5, 20*2 = 40
        assert_eq!(
            JuliaOrange::new(100).map(20),
            Colour { r: 245, g: 105, b: 40 }
        );
    }
}
