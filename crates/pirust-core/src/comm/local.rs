use crossbeam::channel::{bounded, Receiver, Sender};

use super::Communicator;
use crate::{PiError, PiResult};

/// Factory for an in-process group of ranks.
///
/// Ranks are connected as a binomial tree: rank `r > 0` reports to
/// `r & (r - 1)` (its index with the lowest set bit cleared), so the root
/// receives `⌈log2(size)⌉` messages and the combination order is fixed.
pub struct LocalGroup;

impl LocalGroup {
    /// Creates `size` connected ranks, in rank order.
    ///
    /// Each returned [`LocalRank`] is meant to be moved onto its own thread.
    pub fn create(size: usize) -> Vec<LocalRank> {
        let size = size.max(1);
        let mut ranks: Vec<LocalRank> = (0..size)
            .map(|rank| LocalRank {
                rank,
                size,
                parent: None,
                children: Vec::new(),
            })
            .collect();

        // Children are attached in increasing rank order, which is also the
        // order of the tree levels they join at.
        for rank in 1..size {
            let (tx, rx) = bounded(1);
            ranks[rank].parent = Some(tx);
            ranks[rank & (rank - 1)].children.push((rank, rx));
        }
        ranks
    }
}

/// One member of a [`LocalGroup`].
pub struct LocalRank {
    rank: usize,
    size: usize,
    parent: Option<Sender<Vec<u8>>>,
    children: Vec<(usize, Receiver<Vec<u8>>)>,
}

impl Communicator for LocalRank {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn reduce_to_root<F>(&mut self, payload: Vec<u8>, combine: F) -> PiResult<Option<Vec<u8>>>
    where
        F: Fn(&[u8], &[u8]) -> PiResult<Vec<u8>> + Sync,
    {
        let mut acc = payload;
        for (child, rx) in &self.children {
            let theirs = rx.recv().map_err(|_| {
                PiError::Transport(format!("rank {child} left before contributing"))
            })?;
            acc = combine(&acc, &theirs)?;
        }

        match &self.parent {
            Some(tx) => {
                tx.send(acc).map_err(|_| {
                    PiError::Transport(format!("rank {} could not reach its parent", self.rank))
                })?;
                Ok(None)
            }
            None => Ok(Some(acc)),
        }
    }
}
