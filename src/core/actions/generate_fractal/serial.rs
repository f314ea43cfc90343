use crate::core::actions::ports::colour_map::ColourMap;
use crate::core::actions::ports::fractal_algorithm::FractalAlgorithm;
use crate::core::data::image_dims::{BYTES_PER_PIXEL, ImageDims};
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::data::point::Point;

/// Single-threaded reference renderer. Every other strategy must match it.
pub fn render_serial<Alg, CMap>(dims: ImageDims, algorithm: &Alg, colour_map: &CMap) -> PixelBuffer
where
    Alg: FractalAlgorithm,
    CMap: ColourMap<Alg::Success>,
{
    let mut buffer = PixelBuffer::new(dims);
    render_serial_into(&mut buffer, algorithm, colour_map);

    buffer
}

pub fn render_serial_into<Alg, CMap>(buffer: &mut PixelBuffer, algorithm: &Alg, colour_map: &CMap)
where
    Alg: FractalAlgorithm,
    CMap: ColourMap<Alg::Success>,
{
    let width = buffer.dims().width();
    render_span(buffer.buffer_mut(), 0, width, algorithm, colour_map);
}

/// Fills `out` with consecutive pixels starting at row-major index `first_index`.
///
/// This is the unit of work shared by every strategy: a scheduled chunk, a
/// distributed tile and the whole image are all just spans.
pub(crate) fn render_span<Alg, CMap>(
    out: &mut [u8],
    first_index: usize,
    width: u32,
    algorithm: &Alg,
    colour_map: &CMap,
) where
    Alg: FractalAlgorithm,
    CMap: ColourMap<Alg::Success>,
{
    let width = width as usize;

    for (offset, rgba) in out.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
        let index = first_index + offset;
        let pixel = Point {
            x: (index % width) as u32,
            y: (index / width) as u32,
        };

        rgba.copy_from_slice(&colour_map.map(algorithm.compute(pixel)).to_rgba());
    }
}

#[cfg(test)]
pub(crate) mod stubs {
    use crate::core::actions::ports::colour_map::ColourMap;
    use crate::core::actions::ports::fractal_algorithm::FractalAlgorithm;
    use crate::core::data::colour::Colour;
    use crate::core::data::point::Point;

    #[derive(Debug)]
    pub(crate) struct StubSuccessAlgorithm {}

    impl FractalAlgorithm for StubSuccessAlgorithm {
        type Success = u32;

        fn compute(&self, pixel: Point) -> Self::Success {
            pixel.x + pixel.y * 1_000
        }
    }

    /// Encodes the value so tests can read the source pixel back out of a buffer.
    #[derive(Debug)]
    pub(crate) struct StubColourMap {}

    impl ColourMap<u32> for StubColourMap {
        fn map(&self, value: u32) -> Colour {
            Colour {
                r: (value % 1_000) as u8,
                g: (value / 1_000) as u8,
                b: 7,
            }
        }

        fn display_name(&self) -> &str {
            "stub"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stubs::{StubColourMap, StubSuccessAlgorithm};
    use super::*;

    #[test]
    fn test_render_serial_colours_every_pixel() {
        let dims = ImageDims::new(5, 4).unwrap();

        let buffer = render_serial(dims, &StubSuccessAlgorithm {}, &StubColourMap {});

        for y in 0..4 {
            for x in 0..5 {
                assert_eq!(
                    buffer.pixel(Point { x, y }).unwrap(),
                    [x as u8, y as u8, 7, 255]
                );
            }
        }
    }

    #[test]
    fn test_render_span_starts_mid_image() {
        let mut out = vec![0; 3 * BYTES_PER_PIXEL];

        // index 4 in a 3-wide image is (1, 1)
        render_span(&mut out, 4, 3, &StubSuccessAlgorithm {}, &StubColourMap {});

        assert_eq!(&out[0..4], &[1, 1, 7, 255]);
        assert_eq!(&out[4..8], &[2, 1, 7, 255]);
        assert_eq!(&out[8..12], &[0, 2, 7, 255]);
    }
}
