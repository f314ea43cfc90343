use crate::core::actions::ports::colour_map::ColourMap;
use crate::core::data::colour::Colour;
use crate::core::fractals::julia::colour_mapping::kinds::JuliaColourMapKinds;
use crate::core::fractals::julia::colour_mapping::map::JuliaColourMap;
use crate::core::fractals::julia::colour_mapping::maps::band;

#[derive(Debug)]
pub struct JuliaRgbBands {
    max_iterations: u32,
}

impl ColourMap<u32> for JuliaRgbBands {
    fn map(&self, iterations: u32) -> Colour {
        if iterations >= self.max_iterations {
            return Colour::BLACK;
        }

        Colour {
            r: band(iterations, 10, 255),
            g: band(iterations, 7, 255),
            b: band(iterations, 4, 255),
        }
    }

    fn display_name(&self) -> &str {
        self.kind().display_name()
    }
}

impl JuliaColourMap for JuliaRgbBands {
    fn kind(&self) -> JuliaColourMapKinds {
        JuliaColourMapKinds::Rgb
    }
}

impl JuliaRgbBands {
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
        let mapper = JuliaRgbBands::new(100);

        assert_eq!(mapper.map(100), Colour::BLACK);
    }

    #[test]
    fn test_map_zero_iterations_is_black_too() {
        let mapper = JuliaRgbBands::new(100);

        assert_eq!(mapper.map(0), Colour { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn test_map_bands_wrap_modulo_255() {
        let mapper = JuliaRgbBands::new(100);

        assert_eq!(mapper.map(3), Colour { r: 30, g: 21, b: 12 });
        // 30 * 10 = 300 -> 45, 30 * 7 = 210, 30 * 4 = 120
        assert_eq!(mapper.map(30), Colour { r: 45, g: 210, b: 120 });
    }

    #[test]
    fn test_map_above_max_is_black() {
        let mapper = JuliaRgbBands::new(100);

        assert_eq!(mapper.map(101), Colour::BLACK);
    }
}
