use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::data::image_dims::BYTES_PER_PIXEL;
use crate::core::data::pixel_buffer::PixelBuffer;

/// Writes the buffer as a binary PPM, dropping the alpha channel.
pub fn write_ppm(buffer: &PixelBuffer, filepath: impl AsRef<Path>) -> std::io::Result<()> {
    let mut file = BufWriter::new(File::create(filepath)?);

    // PPM header: P6 means binary RGB, then width height max_colour
    let width = buffer.dims().width();
    let height = buffer.dims().height();

    writeln!(file, "P6")?;
    writeln!(file, "{} {}", width, height)?;
    writeln!(file, "255")?;

    for pixel in buffer.buffer().chunks_exact(BYTES_PER_PIXEL) {
        file.write_all(&pixel[..3])?;
    }

    file.flush()
}
