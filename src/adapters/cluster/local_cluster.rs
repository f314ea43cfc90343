use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::core::actions::ports::communicator::{
    Communicator, MessageTag, PendingRecv, TransportError,
};

pub const DEFAULT_RANKS: usize = 4;
pub const DEFAULT_RECV_TIMEOUT_MS: u64 = 30_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_RECV_TIMEOUT_MS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub ranks: usize,
    /// How long a rank waits on any single message before failing the run.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            ranks: DEFAULT_RANKS,
            timeout_ms: DEFAULT_RECV_TIMEOUT_MS,
        }
    }
}

impl ClusterConfig {
    #[must_use]
    pub fn with_ranks(ranks: usize) -> Self {
        Self {
            ranks,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: MessageTag,
    payload: Vec<u8>,
}

/// One rank's endpoint in a [`LocalCluster`].
///
/// Each rank owns an inbox; messages that arrive before anyone asks for them
/// are stashed and matched later by `(source, tag)`, oldest first.
#[derive(Debug)]
pub struct ChannelCommunicator {
    rank: usize,
    peers: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    stash: VecDeque<Envelope>,
    timeout: Duration,
}

impl ChannelCommunicator {
    fn check_rank(&self, rank: usize) -> Result<(), TransportError> {
        if rank >= self.peers.len() {
            return Err(TransportError::UnknownRank {
                rank,
                size: self.peers.len(),
            });
        }

        Ok(())
    }

    fn send(&self, dest: usize, tag: MessageTag, payload: Vec<u8>) -> Result<(), TransportError> {
        self.check_rank(dest)?;

        self.peers[dest]
            .send(Envelope {
                source: self.rank,
                tag,
                payload,
            })
            .map_err(|_| TransportError::Disconnected { peer: dest })
    }

    fn receive(&mut self, source: usize, tag: MessageTag) -> Result<Vec<u8>, TransportError> {
        if let Some(position) = self
            .stash
            .iter()
            .position(|envelope| envelope.source == source && envelope.tag == tag)
        {
            if let Some(envelope) = self.stash.remove(position) {
                return Ok(envelope.payload);
            }
        }

        let deadline = Instant::now() + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());

            match self.inbox.recv_timeout(remaining) {
                Ok(envelope) if envelope.source == source && envelope.tag == tag => {
                    return Ok(envelope.payload);
                }
                Ok(envelope) => self.stash.push_back(envelope),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(TransportError::Timeout {
                        peer: source,
                        tag,
                        timeout: self.timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::Disconnected { peer: source });
                }
            }
        }
    }
}

impl Communicator for ChannelCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn broadcast(
        &mut self,
        root: usize,
        payload: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, TransportError> {
        self.check_rank(root)?;

        if self.rank != root {
            return self.receive(root, MessageTag::Broadcast);
        }

        let payload = payload.ok_or(TransportError::MissingPayload { root })?;
        for dest in (0..self.size()).filter(|&dest| dest != root) {
            self.send(dest, MessageTag::Broadcast, payload.clone())?;
        }

        Ok(payload)
    }

    fn post_send(
        &mut self,
        dest: usize,
        tag: MessageTag,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.send(dest, tag, payload)
    }

    fn post_recv(&mut self, source: usize, tag: MessageTag) -> Result<PendingRecv, TransportError> {
        self.check_rank(source)?;

        Ok(PendingRecv { source, tag })
    }

    fn wait(&mut self, pending: PendingRecv) -> Result<Vec<u8>, TransportError> {
        self.receive(pending.source, pending.tag)
    }

    fn gather(
        &mut self,
        root: usize,
        payload: Vec<u8>,
    ) -> Result<Option<Vec<Vec<u8>>>, TransportError> {
        self.check_rank(root)?;

        if self.rank != root {
            self.send(root, MessageTag::Gather, payload)?;
            return Ok(None);
        }

        let mut own = Some(payload);
        let mut parts = Vec::with_capacity(self.size());
        for source in 0..self.size() {
            if source == root {
                parts.push(own.take().unwrap_or_default());
            } else {
                parts.push(self.receive(source, MessageTag::Gather)?);
            }
        }

        Ok(Some(parts))
    }
}

/// An in-process cluster: one OS thread per rank, talking only through channels.
#[derive(Debug, Clone, Copy)]
pub struct LocalCluster {
    config: ClusterConfig,
}

impl LocalCluster {
    pub fn new(config: ClusterConfig) -> Result<Self, TransportError> {
        if config.ranks == 0 {
            return Err(TransportError::EmptyCluster);
        }

        Ok(Self { config })
    }

    #[must_use]
    pub fn ranks(&self) -> usize {
        self.config.ranks
    }

    /// Runs `body` once per rank and returns each rank's result in rank order.
    pub fn run<F, R>(&self, body: F) -> Result<Vec<R>, TransportError>
    where
        F: Fn(&mut ChannelCommunicator) -> R + Sync,
        R: Send,
    {
        let ranks = self.config.ranks;
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let (senders, inboxes): (Vec<_>, Vec<_>) =
            (0..ranks).map(|_| mpsc::channel::<Envelope>()).unzip();

        let communicators: Vec<ChannelCommunicator> = inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ChannelCommunicator {
                rank,
                peers: senders.clone(),
                inbox,
                stash: VecDeque::new(),
                timeout,
            })
            .collect();
        drop(senders);

        debug!(ranks, timeout_ms = self.config.timeout_ms, "starting local cluster");

        thread::scope(|scope| {
            let body = &body;
            let handles: Vec<_> = communicators
                .into_iter()
                .map(|mut comm| {
                    thread::Builder::new()
                        .name(format!("rank-{}", comm.rank))
                        .spawn_scoped(scope, move || body(&mut comm))
                })
                .collect();

            // Join every rank before reporting any failure.
            let joined: Vec<Result<R, TransportError>> = handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| match handle {
                    Ok(handle) => handle.join().map_err(|_| {
                        error!(rank, "rank panicked");
                        TransportError::RankPanicked { rank }
                    }),
                    Err(err) => {
                        error!(rank, error = %err, "failed to spawn rank");
                        Err(TransportError::RankPanicked { rank })
                    }
                })
                .collect();

            joined.into_iter().collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cluster(ranks: usize) -> LocalCluster {
        LocalCluster::new(ClusterConfig {
            ranks,
            timeout_ms: 2_000,
        })
        .unwrap()
    }

    #[test]
    fn test_empty_cluster_is_rejected() {
        assert_eq!(
            LocalCluster::new(ClusterConfig::with_ranks(0)).unwrap_err(),
            TransportError::EmptyCluster
        );
    }

    #[test]
    fn test_broadcast_reaches_every_rank() {
        let results = cluster(4)
            .run(|comm| {
                let payload = (comm.rank() == 0).then(|| vec![1, 2, 3]);
                comm.broadcast(0, payload)
            })
            .unwrap();

        for result in results {
            assert_eq!(result.unwrap(), vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_broadcast_root_without_payload_fails() {
        let results = cluster(1).run(|comm| comm.broadcast(0, None)).unwrap();

        assert_eq!(results[0], Err(TransportError::MissingPayload { root: 0 }));
    }

    #[test]
    fn test_receives_match_by_tag_not_arrival_order() {
        let results = cluster(2)
            .run(|comm| -> Result<Vec<u8>, TransportError> {
                if comm.rank() == 0 {
                    comm.post_send(1, MessageTag::HaloFromSuccessor, vec![2])?;
                    comm.post_send(1, MessageTag::HaloFromPredecessor, vec![1])?;
                    Ok(Vec::new())
                } else {
                    let first = comm.post_recv(0, MessageTag::HaloFromPredecessor)?;
                    let second = comm.post_recv(0, MessageTag::HaloFromSuccessor)?;
                    let mut received = comm.wait(first)?;
                    received.extend(comm.wait(second)?);
                    Ok(received)
                }
            })
            .unwrap();

        assert_eq!(results[1].as_ref().unwrap(), &vec![1, 2]);
    }

    #[test]
    fn test_gather_collects_in_rank_order() {
        let results = cluster(3)
            .run(|comm| {
                let rank = comm.rank() as u8;
                comm.gather(0, vec![rank; rank as usize + 1])
            })
            .unwrap();

        assert_eq!(
            results[0].as_ref().unwrap(),
            &Some(vec![vec![0], vec![1, 1], vec![2, 2, 2]])
        );
        assert_eq!(results[1].as_ref().unwrap(), &None);
        assert_eq!(results[2].as_ref().unwrap(), &None);
    }

    #[test]
    fn test_missing_message_times_out() {
        let cluster = LocalCluster::new(ClusterConfig {
            ranks: 2,
            timeout_ms: 20,
        })
        .unwrap();

        let results = cluster
            .run(|comm| -> Result<Vec<u8>, TransportError> {
                if comm.rank() == 1 {
                    let pending = comm.post_recv(0, MessageTag::Gather)?;
                    comm.wait(pending)
                } else {
                    Ok(Vec::new())
                }
            })
            .unwrap();

        assert!(matches!(
            results[1],
            Err(TransportError::Timeout {
                peer: 0,
                tag: MessageTag::Gather,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_peer_is_rejected() {
        let results = cluster(2)
            .run(|comm| comm.post_send(5, MessageTag::Gather, Vec::new()))
            .unwrap();

        assert_eq!(
            results[0],
            Err(TransportError::UnknownRank { rank: 5, size: 2 })
        );
    }

    #[test]
    fn test_panicking_rank_is_reported() {
        let result = cluster(2).run(|comm| {
            if comm.rank() == 1 {
                panic!("rank failure");
            }
        });

        assert_eq!(result.unwrap_err(), TransportError::RankPanicked { rank: 1 });
    }

    #[test]
    fn test_every_rank_finishes_before_the_first_panic_is_reported() {
        let finished = AtomicUsize::new(0);

        let result = cluster(4).run(|comm| {
            if comm.rank() == 0 || comm.rank() == 2 {
                panic!("rank failure");
            }
            thread::sleep(Duration::from_millis(50));
            finished.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(result.unwrap_err(), TransportError::RankPanicked { rank: 0 });
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }
}
