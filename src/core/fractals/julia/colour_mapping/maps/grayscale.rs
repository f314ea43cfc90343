use crate::core::actions::ports::colour_map::ColourMap;
use crate::core::data::colour::Colour;
use crate::core::fractals::julia::colour_mapping::kinds::JuliaColourMapKinds;
use crate::core::fractals::julia::colour_mapping::map::JuliaColourMap;
use crate::core::fractals::julia::colour_mapping::maps::band;

#[derive(Debug)]
pub struct JuliaGrayscale {
    max_iterations: u32,
}

impl ColourMap<u32> for JuliaGrayscale {
    fn map(&self, iterations: u32) -> Colour {
        if iterations >= self.max_iterations {
            return Colour::BLACK;
        }

        Colour::grey(band(iterations, 8, 255))
    }

    fn display_name(&self) -> &str {
        self.kind().display_name()
    }
}

impl JuliaColourMap for JuliaGrayscale {
    fn kind(&self) -> JuliaColourMapKinds {
        JuliaColourMapKinds::Grayscale
    }
}

impl JuliaGrayscale {
    #[must_use]
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }
}
