use crate::core::fractals::julia::colour_mapping::kinds::JuliaColourMapKinds;
use crate::core::fractals::julia::colour_mapping::map::JuliaColourMap;
use crate::core::fractals::julia::colour_mapping::maps::{
    blue_purple::JuliaBluePurple, grayscale::JuliaGrayscale, orange::JuliaOrange,
    rgb_bands::JuliaRgbBands,
};

#[must_use]
pub fn julia_colour_map_factory(
    kind: JuliaColourMapKinds,
    max_iterations: u32,
) -> Box<dyn JuliaColourMap> {
    match kind {
        JuliaColourMapKinds::Rgb => Box::new(JuliaRgbBands::new(max_iterations)),
        JuliaColourMapKinds::BluePurple => Box::new(JuliaBluePurple::new(max_iterations)),
        JuliaColourMapKinds::Orange => Box::new(JuliaOrange::new(max_iterations)),
        JuliaColourMapKinds::Grayscale => Box::new(JuliaGrayscale::new(max_iterations)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::ports::colour_map::ColourMap;
    use crate::core::data::colour::Colour;

    #[test]
    fn all_array_has_default_first() {
        assert_eq!(
            JuliaColourMapKinds::ALL.first(),
            Some(&JuliaColourMapKinds::default())
        );
    }

    #[test]
    fn factory_round_trip_for_all_kinds() {
        for &kind in JuliaColourMapKinds::ALL {
            let map = julia_colour_map_factory(kind, 256);
            assert_eq!(map.kind(), kind);
        }
    }

    #[test]
    fn display_names_match_between_kind_and_concrete() {
        for &kind in JuliaColourMapKinds::ALL {
            let map = julia_colour_map_factory(kind, 256);
            assert_eq!(map.display_name(), kind.display_name());
        }
    }

    #[test]
    fn display_names_are_unique() {
        let names: Vec<&str> = JuliaColourMapKinds::ALL
            .iter()
            .map(|k| k.display_name())
            .collect();
        for (i, name) in names.iter().enumerate() {
            for (j, other) in names.iter().enumerate() {
                if i != j {
                    assert_ne!(name, other, "Duplicate display name: {}", name);
                }
            }
        }
    }

    #[test]
    fn every_palette_paints_bounded_points_black() {
        for &kind in JuliaColourMapKinds::ALL {
            let map = julia_colour_map_factory(kind, 64);
            assert_eq!(map.map(64), Colour::BLACK, "{kind}");
        }
    }
}
