use thiserror::Error;
use tracing::{debug, info};

use crate::core::actions::decompose::partition::RowPartition;
use crate::core::actions::decompose::tile::Tile;
use crate::core::actions::ports::colour_map::ColourMap;
use crate::core::actions::ports::communicator::{
    Communicator, MessageTag, PendingRecv, TransportError,
};
use crate::core::actions::ports::fractal_algorithm::FractalAlgorithm;
use crate::core::data::image_dims::{ImageDims, ImageDimsError};
use crate::core::data::pixel_buffer::{PixelBuffer, PixelBufferError};

pub const COORDINATOR: usize = 0;

#[derive(Debug, Error)]
pub enum DecomposeError {
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error("the coordinator must supply image dimensions")]
    MissingDimensions,
    #[error("dimension broadcast carried {0} bytes, expected 8")]
    MalformedDimensions(usize),
    #[error("invalid image dimensions: {0}")]
    InvalidDimensions(#[from] ImageDimsError),
    #[error("halo from rank {peer} carried {actual} bytes, expected {expected}")]
    HaloSize {
        peer: usize,
        expected: usize,
        actual: usize,
    },
    #[error("rank {rank} contributed {actual} bytes to the gather, expected {expected}")]
    GatherSize {
        rank: usize,
        expected: usize,
        actual: usize,
    },
    #[error("failed to assemble image: {0}")]
    Assemble(#[from] PixelBufferError),
}

/// What one rank ends up holding after a distributed render.
#[derive(Debug, Clone, PartialEq)]
pub struct RankOutcome {
    pub partition: RowPartition,
    pub dims: ImageDims,
    /// Neighbour rows received during the exchange, unfiltered.
    pub top_halo: Option<Vec<u8>>,
    pub bottom_halo: Option<Vec<u8>>,
    /// Blurred owned rows as contributed to the gather.
    pub owned_rows: Vec<u8>,
    /// The assembled image; only present on the coordinator.
    pub image: Option<PixelBuffer>,
}

/// Runs the distributed pipeline for the calling rank.
///
/// Every rank calls this with the same `build` closure; only the coordinator
/// passes `dims`. `build` turns the broadcast dimensions into the algorithm
/// and colour map to evaluate.
pub fn render_decomposed<C, Alg, CMap, F>(
    comm: &mut C,
    dims: Option<ImageDims>,
    build: F,
) -> Result<RankOutcome, DecomposeError>
where
    C: Communicator,
    Alg: FractalAlgorithm,
    CMap: ColourMap<Alg::Success>,
    F: FnOnce(ImageDims) -> (Alg, CMap),
{
    let rank = comm.rank();
    let n_ranks = comm.size();
    let dims = broadcast_dims(comm, dims)?;
    let partition = RowPartition::for_rank(rank, n_ranks, dims.height());
    let row_bytes = dims.row_bytes();

    let (algorithm, colour_map) = build(dims);
    let mut tile = Tile::new(partition, dims);
    tile.render(&algorithm, &colour_map);
    debug!(rank, start_row = partition.start_row, rows = partition.rows(), "tile rendered");

    let mut blurred = vec![0; partition.rows() as usize * row_bytes];
    let mut top_halo = None;
    let mut bottom_halo = None;

    if !partition.is_empty() {
        let (from_predecessor, from_successor) = post_halo_exchange(comm, &tile, dims.height())?;

        // interior rows have both vertical neighbours resident already
        for y in partition.start_row + 1..partition.end_row.saturating_sub(1) {
            blur_owned_row(&tile, y, &mut blurred);
        }

        if let Some(pending) = from_predecessor {
            let row = wait_halo(comm, pending, row_bytes)?;
            tile.set_top_halo(&row);
            top_halo = Some(row);
        }
        if let Some(pending) = from_successor {
            let row = wait_halo(comm, pending, row_bytes)?;
            tile.set_bottom_halo(&row);
            bottom_halo = Some(row);
        }

        blur_owned_row(&tile, partition.start_row, &mut blurred);
        blur_owned_row(&tile, partition.end_row - 1, &mut blurred);
    }

    let gathered = comm.gather(COORDINATOR, blurred.clone())?;
    let image = match gathered {
        Some(parts) => Some(assemble(dims, n_ranks, parts)?),
        None => None,
    };

    if image.is_some() {
        info!(ranks = n_ranks, width = dims.width(), height = dims.height(), "image gathered");
    }

    Ok(RankOutcome {
        partition,
        dims,
        top_halo,
        bottom_halo,
        owned_rows: blurred,
        image,
    })
}

fn broadcast_dims<C: Communicator>(
    comm: &mut C,
    dims: Option<ImageDims>,
) -> Result<ImageDims, DecomposeError> {
    let payload = if comm.rank() == COORDINATOR {
        let dims = dims.ok_or(DecomposeError::MissingDimensions)?;
        let mut bytes = Vec::with_capacity(8);
        bytes.extend_from_slice(&dims.width().to_le_bytes());
        bytes.extend_from_slice(&dims.height().to_le_bytes());
        Some(bytes)
    } else {
        None
    };

    let bytes = comm.broadcast(COORDINATOR, payload)?;
    let (width, height) = match bytes.as_slice() {
        [w0, w1, w2, w3, h0, h1, h2, h3] => (
            u32::from_le_bytes([*w0, *w1, *w2, *w3]),
            u32::from_le_bytes([*h0, *h1, *h2, *h3]),
        ),
        other => return Err(DecomposeError::MalformedDimensions(other.len())),
    };

    Ok(ImageDims::new(width, height)?)
}

/// Posts up to two sends and two receives before waiting on any of them.
fn post_halo_exchange<C: Communicator>(
    comm: &mut C,
    tile: &Tile,
    height: u32,
) -> Result<(Option<PendingRecv>, Option<PendingRecv>), TransportError> {
    let rank = comm.rank();
    let partition = tile.partition();
    let mut from_predecessor = None;
    let mut from_successor = None;

    if partition.has_predecessor() {
        from_predecessor = Some(comm.post_recv(rank - 1, MessageTag::HaloFromPredecessor)?);
        comm.post_send(rank - 1, MessageTag::HaloFromSuccessor, tile.first_owned_row().to_vec())?;
    }

    if partition.has_successor(height) {
        from_successor = Some(comm.post_recv(rank + 1, MessageTag::HaloFromSuccessor)?);
        comm.post_send(rank + 1, MessageTag::HaloFromPredecessor, tile.last_owned_row().to_vec())?;
    }

    Ok((from_predecessor, from_successor))
}

fn wait_halo<C: Communicator>(
    comm: &mut C,
    pending: PendingRecv,
    row_bytes: usize,
) -> Result<Vec<u8>, DecomposeError> {
    let row = comm.wait(pending)?;

    if row.len() != row_bytes {
        return Err(DecomposeError::HaloSize {
            peer: pending.source,
            expected: row_bytes,
            actual: row.len(),
        });
    }

    Ok(row)
}

fn blur_owned_row(tile: &Tile, y: u32, blurred: &mut [u8]) {
    let row_bytes = tile.row_bytes();
    let local = (y - tile.partition().start_row) as usize;
    tile.blur_row_into(y, &mut blurred[local * row_bytes..(local + 1) * row_bytes]);
}

/// Places each rank's rows at the offset its partition implies.
fn assemble(
    dims: ImageDims,
    n_ranks: usize,
    parts: Vec<Vec<u8>>,
) -> Result<PixelBuffer, DecomposeError> {
    let mut image = vec![0; dims.buffer_size()];

    for (partition, part) in RowPartition::all(n_ranks, dims.height()).into_iter().zip(parts) {
        let span = partition.byte_span(dims.row_bytes());

        if part.len() != span.len() {
            return Err(DecomposeError::GatherSize {
                rank: partition.rank,
                expected: span.len(),
                actual: part.len(),
            });
        }

        image[span].copy_from_slice(&part);
    }

    Ok(PixelBuffer::from_data(dims, image)?)
}
