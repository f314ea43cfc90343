use std::time::Duration;
use thiserror::Error;

/// Distinguishes the traffic that can be in flight between two ranks at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    Broadcast,
    /// A halo row travelling down the image, from a rank to its successor.
    HaloFromPredecessor,
    /// A halo row travelling up the image, from a rank to its predecessor.
    HaloFromSuccessor,
    Gather,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("rank {rank} is outside a cluster of {size}")]
    UnknownRank { rank: usize, size: usize },
    #[error("cluster needs at least one rank")]
    EmptyCluster,
    #[error("rank {peer} disconnected")]
    Disconnected { peer: usize },
    #[error("timed out after {timeout:?} waiting for {tag:?} from rank {peer}")]
    Timeout {
        peer: usize,
        tag: MessageTag,
        timeout: Duration,
    },
    #[error("broadcast root {root} supplied no payload")]
    MissingPayload { root: usize },
    #[error("rank {rank} panicked")]
    RankPanicked { rank: usize },
}

/// A receive that has been posted but not yet completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a posted receive must be waited on"]
pub struct PendingRecv {
    pub source: usize,
    pub tag: MessageTag,
}

/// Point-to-point messaging plus the two collectives the decomposer needs.
///
/// Sends never block. A receive is posted first and completed later with
/// [`Communicator::wait`], so a rank can keep working while its transfers are
/// outstanding.
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Every rank returns the root's payload. Only the root supplies one.
    fn broadcast(
        &mut self,
        root: usize,
        payload: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, TransportError>;

    fn post_send(
        &mut self,
        dest: usize,
        tag: MessageTag,
        payload: Vec<u8>,
    ) -> Result<(), TransportError>;

    fn post_recv(&mut self, source: usize, tag: MessageTag) -> Result<PendingRecv, TransportError>;

    fn wait(&mut self, pending: PendingRecv) -> Result<Vec<u8>, TransportError>;

    /// The root receives every rank's payload in rank order; other ranks get `None`.
    fn gather(
        &mut self,
        root: usize,
        payload: Vec<u8>,
    ) -> Result<Option<Vec<Vec<u8>>>, TransportError>;
}
