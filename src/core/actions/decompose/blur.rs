use crate::core::data::image_dims::BYTES_PER_PIXEL;
use crate::core::data::pixel_buffer::PixelBuffer;

/// 5-point box blur of one row into `out`.
///
/// `above` and `below` are `None` where the row sits on the image edge. Only
/// samples that exist are averaged (integer division by the sample count),
/// and alpha is copied from the centre pixel.
pub fn blur_row(above: Option<&[u8]>, centre: &[u8], below: Option<&[u8]>, out: &mut [u8]) {
    let width = centre.len() / BYTES_PER_PIXEL;

    for x in 0..width {
        let at = x * BYTES_PER_PIXEL;
        let mut sums = [0u32; 3];
        let mut count = 0u32;

        let mut sample = |row: &[u8], offset: usize| {
            for (sum, &channel) in sums.iter_mut().zip(&row[offset..offset + 3]) {
                *sum += u32::from(channel);
            }
            count += 1;
        };

        sample(centre, at);
        if let Some(row) = above {
            sample(row, at);
        }
        if let Some(row) = below {
            sample(row, at);
        }
        if x > 0 {
            sample(centre, at - BYTES_PER_PIXEL);
        }
        if x + 1 < width {
            sample(centre, at + BYTES_PER_PIXEL);
        }

        for (channel, sum) in out[at..at + 3].iter_mut().zip(sums) {
            *channel = (sum / count) as u8;
        }
        out[at + 3] = centre[at + 3];
    }
}

/// Blurs a whole image in one pass, reading only unfiltered values.
#[must_use]
pub fn blur_image(image: &PixelBuffer) -> PixelBuffer {
    let dims = image.dims();
    let mut blurred = PixelBuffer::new(dims);
    let row_bytes = dims.row_bytes();
    let rows: Vec<&[u8]> = image.buffer().chunks_exact(row_bytes).collect();

    for (y, out) in blurred.buffer_mut().chunks_exact_mut(row_bytes).enumerate() {
        let above = y.checked_sub(1).map(|up| rows[up]);
        let below = rows.get(y + 1).copied();
        blur_row(above, rows[y], below, out);
    }

    blurred
}
