use crate::core::actions::decompose::blur::blur_row;
use crate::core::actions::decompose::partition::RowPartition;
use crate::core::actions::generate_fractal::serial::render_span;
use crate::core::actions::ports::colour_map::ColourMap;
use crate::core::actions::ports::fractal_algorithm::FractalAlgorithm;
use crate::core::data::image_dims::ImageDims;

/// One rank's rows plus a halo row above and below.
///
/// Local row 0 is the top halo, rows `1..=rows` are owned and row `rows + 1`
/// is the bottom halo.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    partition: RowPartition,
    dims: ImageDims,
    buffer: Vec<u8>,
}

impl Tile {
    #[must_use]
    pub fn new(partition: RowPartition, dims: ImageDims) -> Self {
        let local_rows = partition.rows() as usize + 2;

        Self {
            partition,
            dims,
            buffer: vec![0; local_rows * dims.row_bytes()],
        }
    }

    #[must_use]
    pub fn partition(&self) -> RowPartition {
        self.partition
    }

    #[must_use]
    pub fn row_bytes(&self) -> usize {
        self.dims.row_bytes()
    }

    pub fn render<Alg, CMap>(&mut self, algorithm: &Alg, colour_map: &CMap)
    where
        Alg: FractalAlgorithm,
        CMap: ColourMap<Alg::Success>,
    {
        let first_index = self.partition.start_row as usize * self.dims.width() as usize;
        let width = self.dims.width();
        render_span(self.owned_rows_mut(), first_index, width, algorithm, colour_map);
    }

    /// Owned rows only, halo excluded.
    #[must_use]
    pub fn owned_rows(&self) -> &[u8] {
        let row_bytes = self.row_bytes();
        &self.buffer[row_bytes..self.buffer.len() - row_bytes]
    }

    fn owned_rows_mut(&mut self) -> &mut [u8] {
        let row_bytes = self.row_bytes();
        let end = self.buffer.len() - row_bytes;
        &mut self.buffer[row_bytes..end]
    }

    #[must_use]
    pub fn first_owned_row(&self) -> &[u8] {
        self.local_row(1)
    }

    #[must_use]
    pub fn last_owned_row(&self) -> &[u8] {
        self.local_row(self.partition.rows() as usize)
    }

    #[must_use]
    pub fn top_halo(&self) -> &[u8] {
        self.local_row(0)
    }

    #[must_use]
    pub fn bottom_halo(&self) -> &[u8] {
        self.local_row(self.partition.rows() as usize + 1)
    }

    pub fn set_top_halo(&mut self, row: &[u8]) {
        self.local_row_mut(0).copy_from_slice(row);
    }

    pub fn set_bottom_halo(&mut self, row: &[u8]) {
        let last = self.partition.rows() as usize + 1;
        self.local_row_mut(last).copy_from_slice(row);
    }

    /// Blurs owned global row `y` into `out`, reading halo rows where needed.
    pub fn blur_row_into(&self, y: u32, out: &mut [u8]) {
        let local = (y - self.partition.start_row) as usize + 1;
        let above = (y > 0).then(|| self.local_row(local - 1));
        let below = (y + 1 < self.dims.height()).then(|| self.local_row(local + 1));

        blur_row(above, self.local_row(local), below, out);
    }

    fn local_row(&self, local: usize) -> &[u8] {
        let row_bytes = self.row_bytes();
        &self.buffer[local * row_bytes..(local + 1) * row_bytes]
    }

    fn local_row_mut(&mut self, local: usize) -> &mut [u8] {
        let row_bytes = self.row_bytes();
        &mut self.buffer[local * row_bytes..(local + 1) * row_bytes]
    }
}
