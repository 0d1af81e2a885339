use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{BoundaryError, Result};

/// Collective communication between the workers of one computation.
///
/// Every worker must take part in every collective, in the same order; a collective
/// returns only after all workers have contributed.
pub trait Communicator {
    fn worker_id(&self) -> usize;

    fn worker_num(&self) -> usize;

    /// Sends `local` to every worker and returns all contributions, indexed by worker id.
    /// The caller's own contribution is at `worker_id()`.
    fn all_gather<T>(&mut self, local: &T) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned;

    /// Blocks until every worker has reached the barrier.
    fn barrier(&mut self) -> Result<()> {
        self.all_gather(&())?;
        Ok(())
    }
}

/// An in-process communicator over `crossbeam-channel`.
///
/// Each ordered pair of workers has its own channel, so messages from one peer arrive in
/// the order they were sent and consecutive collectives cannot interleave. Payloads are
/// encoded with `bincode`. When a peer drops its communicator (it returned early or
/// panicked), waiting on it fails with [`BoundaryError::Communication`].
pub struct ChannelCommunicator {
    worker_id: usize,
    /// `outboxes[peer]` sends to `peer`; `None` at our own index.
    outboxes: Vec<Option<Sender<Vec<u8>>>>,
    /// `inboxes[peer]` receives from `peer`; `None` at our own index.
    inboxes: Vec<Option<Receiver<Vec<u8>>>>,
}

impl ChannelCommunicator {
    /// Creates `worker_num` connected communicators; the i-th one belongs to worker i.
    pub fn group(worker_num: usize) -> Vec<Self> {
        let mut outboxes: Vec<Vec<Option<Sender<Vec<u8>>>>> =
            (0..worker_num).map(|_| vec![None; worker_num]).collect();
        let mut inboxes: Vec<Vec<Option<Receiver<Vec<u8>>>>> =
            (0..worker_num).map(|_| vec![None; worker_num]).collect();
        for from in 0..worker_num {
            for to in 0..worker_num {
                if from != to {
                    let (tx, rx) = unbounded();
                    outboxes[from][to] = Some(tx);
                    inboxes[to][from] = Some(rx);
                }
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(worker_id, (outboxes, inboxes))| Self {
                worker_id,
                outboxes,
                inboxes,
            })
            .collect()
    }

    fn peer_lost(&self, peer: usize) -> BoundaryError {
        BoundaryError::Communication {
            worker: self.worker_id,
            reason: format!("worker {} left the collective", peer),
        }
    }
}

impl Communicator for ChannelCommunicator {
    fn worker_id(&self) -> usize {
        self.worker_id
    }

    fn worker_num(&self) -> usize {
        self.outboxes.len()
    }

    fn all_gather<T>(&mut self, local: &T) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let payload = bincode::serialize(local)?;
        debug!(worker = self.worker_id, bytes = payload.len(), "all-gather send");

        for (peer, outbox) in self.outboxes.iter().enumerate() {
            if let Some(outbox) = outbox {
                outbox
                    .send(payload.clone())
                    .map_err(|_| self.peer_lost(peer))?;
            }
        }

        let mut gathered = Vec::with_capacity(self.worker_num());
        for (peer, inbox) in self.inboxes.iter().enumerate() {
            let bytes = match inbox {
                Some(inbox) => inbox.recv().map_err(|_| self.peer_lost(peer))?,
                None => payload.clone(),
            };
            gathered.push(bincode::deserialize(&bytes)?);
        }
        debug!(worker = self.worker_id, "all-gather done");
        Ok(gathered)
    }
}

#[cfg(test)]
mod test_comm {
    use std::collections::BTreeSet;
    use std::thread;

    use crate::comm::{ChannelCommunicator, Communicator};
    use crate::error::BoundaryError;

    #[test]
    fn test_all_gather_in_worker_order() {
        let communicators = ChannelCommunicator::group(4);
        let handles = communicators
            .into_iter()
            .map(|mut comm| {
                thread::spawn(move || {
                    let local = vec![comm.worker_id() as u64 * 10];
                    comm.all_gather(&local).unwrap()
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            let gathered = handle.join().unwrap();
            assert_eq!(gathered, vec![vec![0], vec![10], vec![20], vec![30]]);
        }
    }

    #[test]
    fn test_consecutive_collectives() {
        let communicators = ChannelCommunicator::group(3);
        let handles = communicators
            .into_iter()
            .map(|mut comm| {
                thread::spawn(move || {
                    let id = comm.worker_id() as u32;
                    let first = comm.all_gather(&BTreeSet::from([(id, id)])).unwrap();
                    comm.barrier().unwrap();
                    let second = comm.all_gather(&(id + 100)).unwrap();
                    (first, second)
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            let (first, second) = handle.join().unwrap();
            assert_eq!(first[2], BTreeSet::from([(2, 2)]));
            assert_eq!(second, vec![100, 101, 102]);
        }
    }

    #[test]
    fn test_single_worker() {
        let mut communicators = ChannelCommunicator::group(1);
        let comm = &mut communicators[0];
        assert_eq!(comm.worker_num(), 1);
        assert_eq!(comm.all_gather(&"only".to_string()).unwrap(), vec!["only".to_string()]);
    }

    #[test]
    fn test_peer_lost() {
        let mut communicators = ChannelCommunicator::group(2);
        drop(communicators.pop());
        let comm = &mut communicators[0];
        match comm.all_gather(&1u8) {
            Err(BoundaryError::Communication { worker, .. }) => assert_eq!(worker, 0),
            other => panic!("expected a communication error, got {:?}", other),
        }
    }
}
