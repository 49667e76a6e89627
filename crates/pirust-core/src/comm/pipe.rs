use std::io::{Read, Write};

use super::{Communicator, ROOT};
use crate::{PiError, PiResult};

/// Writes one length-prefixed frame (`u64` little-endian length, then bytes).
pub fn write_frame<W: Write>(out: &mut W, payload: &[u8]) -> std::io::Result<()> {
    out.write_all(&(payload.len() as u64).to_le_bytes())?;
    out.write_all(payload)?;
    out.flush()
}

/// Reads one frame written by [`write_frame`], refusing frames longer than
/// `max_len` before allocating for them.
pub fn read_frame<R: Read>(input: &mut R, max_len: usize) -> std::io::Result<Vec<u8>> {
    let mut len = [0u8; 8];
    input.read_exact(&mut len)?;
    let len = u64::from_le_bytes(len);
    if len > max_len as u64 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds the {max_len}-byte bound"),
        ));
    }
    let mut payload = vec![0u8; len as usize];
    input.read_exact(&mut payload)?;
    Ok(payload)
}

/// Root side of a process group: one reader per worker rank.
pub struct PipeRoot<R: Read> {
    workers: Vec<(usize, R)>,
    max_frame: usize,
}

impl<R: Read> PipeRoot<R> {
    /// `workers[i]` carries the payload of rank `i + 1`.
    pub fn new(workers: Vec<R>, max_frame: usize) -> Self {
        Self {
            workers: workers.into_iter().enumerate().map(|(i, r)| (i + 1, r)).collect(),
            max_frame,
        }
    }
}

impl<R: Read> Communicator for PipeRoot<R> {
    fn rank(&self) -> usize {
        ROOT
    }

    fn size(&self) -> usize {
        self.workers.len() + 1
    }

    /// Folds worker payloads into the root's own in rank order.
    fn reduce_to_root<F>(&mut self, payload: Vec<u8>, combine: F) -> PiResult<Option<Vec<u8>>>
    where
        F: Fn(&[u8], &[u8]) -> PiResult<Vec<u8>> + Sync,
    {
        let mut acc = payload;
        for (rank, reader) in &mut self.workers {
            let theirs = read_frame(reader, self.max_frame)
                .map_err(|e| PiError::Transport(format!("rank {rank}: {e}")))?;
            acc = combine(&acc, &theirs)?;
        }
        Ok(Some(acc))
    }
}

/// Worker side of a process group: writes its payload to the root.
pub struct PipeWorker<W: Write> {
    rank: usize,
    size: usize,
    out: W,
}

impl<W: Write> PipeWorker<W> {
    pub fn new(rank: usize, size: usize, out: W) -> Self {
        Self { rank, size, out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Communicator for PipeWorker<W> {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn reduce_to_root<F>(&mut self, payload: Vec<u8>, _combine: F) -> PiResult<Option<Vec<u8>>>
    where
        F: Fn(&[u8], &[u8]) -> PiResult<Vec<u8>> + Sync,
    {
        write_frame(&mut self.out, &payload)
            .map_err(|e| PiError::Transport(format!("rank {}: {e}", self.rank)))?;
        Ok(None)
    }
}
