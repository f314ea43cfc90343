use crate::core::data::colour::Colour;

pub trait ColourMap<T> {
    fn map(&self, value: T) -> Colour;
    fn display_name(&self) -> &str;
}
