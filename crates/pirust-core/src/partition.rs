//! Work assignment for ranks and threads.
//!
//! The full term range `[0, iterations)` is cut into contiguous blocks, one
//! per rank. Inside a block, threads either interleave (`Cyclic`, stride =
//! thread count) or take contiguous sub-blocks (`Blocks`).

use std::iter::StepBy;
use std::ops::Range;

/// How a rank's block is divided among its threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadSplit {
    /// Thread `t` owns `start + t, start + t + T, ...`.
    Cyclic,
    /// Thread `t` owns the `t`-th contiguous sub-block.
    Blocks,
}

/// Contiguous block partition of `[0, iterations)` into `parts` blocks.
///
/// # Example
/// ```
/// use pirust_core::partition::BlockPartition;
///
/// let partition = BlockPartition::new(10, 4);
/// assert_eq!(partition.block_size(), 3);
/// assert_eq!(partition.block(0), 0..3);
/// assert_eq!(partition.block(3), 9..10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPartition {
    iterations: u64,
    parts: u64,
    block_size: u64,
}

impl BlockPartition {
    /// Creates the partition. `parts` is clamped to at least 1.
    pub fn new(iterations: u64, parts: usize) -> Self {
        let parts = (parts as u64).max(1);
        Self {
            iterations,
            parts,
            block_size: iterations.div_ceil(parts),
        }
    }

    /// `ceil(iterations / parts)`.
    #[inline]
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Block of part `index`: `[index * size, min((index + 1) * size, iterations))`.
    ///
    /// Trailing parts may be empty when `iterations` does not divide evenly.
    pub fn block(&self, index: usize) -> Range<u64> {
        let start = (index as u64)
            .saturating_mul(self.block_size)
            .min(self.iterations);
        let end = start.saturating_add(self.block_size).min(self.iterations);
        start..end
    }

    /// All blocks in part order.
    pub fn blocks(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        (0..self.parts as usize).map(|i| self.block(i))
    }
}

/// Term indices owned by thread `thread` of `threads` under the cyclic split.
pub fn cyclic_indices(block: Range<u64>, thread: usize, threads: usize) -> StepBy<Range<u64>> {
    let start = block.start.saturating_add(thread as u64).min(block.end);
    (start..block.end).step_by(threads.max(1))
}

/// Contiguous sub-block owned by thread `thread` of `threads`.
pub fn sub_block(block: Range<u64>, thread: usize, threads: usize) -> Range<u64> {
    let local = BlockPartition::new(block.end.saturating_sub(block.start), threads).block(thread);
    (block.start + local.start)..(block.start + local.end)
}

/// First index and stride of thread `thread`'s share, or `None` if it is empty.
pub fn thread_share(
    block: &Range<u64>,
    thread: usize,
    threads: usize,
    split: ThreadSplit,
) -> Option<(Range<u64>, u64)> {
    match split {
        ThreadSplit::Cyclic => {
            let first = cyclic_indices(block.clone(), thread, threads).next()?;
            Some((first..block.end, threads.max(1) as u64))
        }
        ThreadSplit::Blocks => {
            let range = sub_block(block.clone(), thread, threads);
            (!range.is_empty()).then_some((range, 1))
        }
    }
}
