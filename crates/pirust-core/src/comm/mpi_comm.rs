//! Ranks launched by an MPI runtime, e.g. `mpirun -n 4 pirust 1000 --mpi`.
//!
//! Every rank pads its payload into a fixed-width slot of
//! [`codec::max_payload_len`] bytes and the slots are reduced with a
//! user-defined commutative operation that folds them through the caller's
//! combining function. A slot is a single contiguous MPI datatype, so the
//! runtime never splits one payload across two invocations of the operation.

use std::slice;

use mpi::collective::UserOperation;
use mpi::datatype::{DynBuffer, DynBufferMut, MutView, UserDatatype, View};
use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as _, Equivalence, Root};
use mpi::{Count, Rank, Threading};
use tracing::debug;

use super::{Communicator, ROOT};
use crate::{codec, PiError, PiResult};

/// Membership in `MPI_COMM_WORLD`.
///
/// Owns the MPI environment: MPI is finalized when the communicator is
/// dropped. Only the thread that created it may call
/// [`reduce_to_root`](Communicator::reduce_to_root); worker threads never
/// touch MPI.
pub struct MpiComm {
    world: SimpleCommunicator,
    rank: usize,
    size: usize,
    slot: usize,
    _universe: Universe,
}

impl MpiComm {
    /// Initializes MPI with funneled threading and joins the world group.
    ///
    /// `slot` is the fixed payload width shared by every rank, normally
    /// [`codec::max_payload_len`] of the run's precision.
    ///
    /// # Errors
    /// * `PiError::Transport` if MPI was already initialized in this process.
    pub fn init(slot: usize) -> PiResult<Self> {
        let (universe, _) = mpi::initialize_with_threading(Threading::Funneled)
            .ok_or_else(|| PiError::Transport("MPI is already initialized".into()))?;
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        debug!(rank, size, slot, "MPI world joined");
        Ok(Self {
            world,
            rank,
            size,
            slot,
            _universe: universe,
        })
    }
}

impl Communicator for MpiComm {
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
        let width = self.slot;
        let count = Count::try_from(width).map_err(|_| PiError::PayloadOverflow {
            len: width,
            max: Count::MAX as usize,
        })?;
        let send = codec::pad(payload, width)?;
        let slot_type = UserDatatype::contiguous(count, &u8::equivalent_datatype());

        let op = UserOperation::commutative(|incoming: DynBuffer, mut inout: DynBufferMut| {
            let bytes = incoming.len() * width;
            // SAFETY: both buffers hold `incoming.len()` slots of `width` bytes.
            let (incoming, inout) = unsafe {
                (
                    slice::from_raw_parts(incoming.as_ptr() as *const u8, bytes),
                    slice::from_raw_parts_mut(inout.as_mut_ptr() as *mut u8, bytes),
                )
            };
            for (src, dst) in incoming.chunks_exact(width).zip(inout.chunks_exact_mut(width)) {
                codec::fold_slots(&combine, src, dst);
            }
        });

        let root = self.world.process_at_rank(ROOT as Rank);
        // SAFETY: `send` is exactly one slot of `width` bytes.
        let send_view = unsafe { View::with_count_and_datatype(&send[..], 1, &slot_type) };

        if self.rank != ROOT {
            root.reduce_into(&send_view, &op);
            debug!(rank = self.rank, "slot sent to root");
            return Ok(None);
        }

        let mut recv = vec![0u8; width];
        {
            // SAFETY: `recv` is exactly one slot of `width` bytes.
            let mut recv_view =
                unsafe { MutView::with_count_and_datatype(&mut recv[..], 1, &slot_type) };
            root.reduce_into_root(&send_view, &mut recv_view, &op);
        }
        Ok(Some(codec::unpad(&recv)?.to_vec()))
    }
}
