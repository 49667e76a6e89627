//! Rank-to-rank communication for the cross-rank reduction.
//!
//! A [`Communicator`] knows its rank and the group size and offers one
//! collective: [`reduce_to_root`](Communicator::reduce_to_root), which folds
//! every rank's payload with a caller-supplied associative function and
//! delivers the result to rank [`ROOT`] only. Every rank must call it,
//! including ranks whose block is empty.
//!
//! - [`LocalGroup`]: ranks are threads of one process, linked by channels.
//! - [`PipeRoot`] / [`PipeWorker`]: ranks are OS processes; workers stream
//!   their payload to the root over a byte pipe (typically stdout).
//! - `MpiComm` (`mpi` feature): ranks are launched by `mpirun` and reduce
//!   over `MPI_COMM_WORLD`.

use crate::PiResult;

mod local;
#[cfg(feature = "mpi")]
mod mpi_comm;
mod pipe;

pub use local::{LocalGroup, LocalRank};
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;
pub use pipe::{read_frame, write_frame, PipeRoot, PipeWorker};

/// Rank that receives the reduced value.
pub const ROOT: usize = 0;

/// Membership in a group of ranks plus the reduce-to-root collective.
pub trait Communicator {
    /// This rank, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    #[inline]
    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    /// Folds `payload` with the payloads of all other ranks using `combine`.
    ///
    /// Returns `Some(result)` on the root and `None` elsewhere. `combine`
    /// must be associative; implementations fix the combination order so a
    /// given group always produces the same bytes.
    fn reduce_to_root<F>(&mut self, payload: Vec<u8>, combine: F) -> PiResult<Option<Vec<u8>>>
    where
        F: Fn(&[u8], &[u8]) -> PiResult<Vec<u8>> + Sync;
}
