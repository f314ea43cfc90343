use crate::core::actions::ports::colour_map::ColourMap;
use crate::core::data::colour::Colour;
use crate::core::fractals::julia::colour_mapping::kinds::JuliaColourMapKinds;
use crate::core::fractals::julia::colour_mapping::map::JuliaColourMap;
use crate::core::fractals::julia::colour_mapping::maps::band;

#[derive(Debug)]
pub struct JuliaBluePurple {
    max_iterations: u32,
}

impl ColourMap<u32> for JuliaBluePurple {
    fn map(&self, iterations: u32) -> Colour {
        if iterations >= self.max_iterations {
            return Colour::BLACK;
        }

        Colour {
            r: 100 + band(iterations, 5, 155),
            g: band(iterations, 2, 100),
            b: 200 + band(iterations, 10, 55),
        }
    }

    fn display_name(&self) -> &str {
        self.kind().display_name()
    }
}

impl JuliaColourMap for JuliaBluePurple {
    fn kind(&self) -> JuliaColourMapKinds {
        JuliaColourMapKinds::BluePurple
    }
}

impl JuliaBluePurple {
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
        assert_eq!(JuliaBluePurple::new(50).map(50), Colour::BLACK);
    }

    #[test]
    fn test_map_escaping_pixels_have_base_offsets() {
        let mapper = JuliaBluePurple::new(100);

        assert_eq!(mapper.map(0), Colour { r: 100, g: 0, b: 200 });
        // 7*5 = 35, 7*2 = 14, 7*10 = 70 -> 15
        assert_eq!(mapper.map(7), Colour { r: 135, g: 14, b: 215 });
    }
}
