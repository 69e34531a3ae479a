use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use rxl_types::Block;

use crate::atomic::{parent_dir, read_existing, write_atomic};
use crate::error::{StoreError, StoreResult};
use crate::traits::{ChainStore, SyncMode};

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Append-only log of framed blocks.
///
/// On-disk format, one frame per block in chain order:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (JSON-encoded Block)]
/// ```
///
/// Appending a block writes one frame instead of rewriting the file. On load
/// an incomplete final frame is treated as a torn write from a crash: it is
/// cut off and loading continues with the frames before it. A complete frame
/// whose CRC or JSON does not check out is corruption and fails the load.
///
/// Appends always start on a frame boundary: bytes past the last complete
/// frame are cut off before writing, and a failed write is truncated away.
#[derive(Debug)]
pub struct LogFileStore {
    path: PathBuf,
    sync_mode: SyncMode,
    /// Length of the valid frame prefix, once known.
    committed: Mutex<Option<u64>>,
}

impl LogFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_mode: SyncMode::default(),
            committed: Mutex::new(None),
        }
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, offset: usize, reason: impl std::fmt::Display) -> StoreError {
        StoreError::CorruptStore {
            location: self.location(),
            reason: format!("frame at offset {offset}: {reason}"),
        }
    }

    /// Decode every complete frame. Returns the blocks and the byte length
    /// of the valid prefix.
    fn decode_frames(&self, bytes: &[u8]) -> StoreResult<(Vec<Block>, usize)> {
        let mut blocks = Vec::new();
        let mut offset = 0usize;

        while offset < bytes.len() {
            if bytes.len() - offset < HEADER_SIZE {
                break;
            }

            let header = &bytes[offset..offset + HEADER_SIZE];
            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 {
                return Err(self.corrupt(offset, "zero-length frame"));
            }

            let start = offset + HEADER_SIZE;
            if start + length > bytes.len() {
                break;
            }

            let payload = &bytes[start..start + length];
            let actual_crc = crc32fast::hash(payload);
            if actual_crc != expected_crc {
                return Err(self.corrupt(
                    offset,
                    format!("CRC mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"),
                ));
            }

            let block: Block =
                serde_json::from_slice(payload).map_err(|e| self.corrupt(offset, e))?;
            blocks.push(block);
            offset = start + length;
        }

        Ok((blocks, offset))
    }

    fn set_committed(&self, len: u64) {
        *self.committed.lock().expect("lock poisoned") = Some(len);
    }

    /// End of the last complete frame in `file`, cutting off anything after
    /// it.
    fn frame_boundary(&self, file: &File) -> StoreResult<u64> {
        let file_len = file.metadata()?.len();
        let known = *self.committed.lock().expect("lock poisoned");
        let committed = match known {
            Some(len) => len,
            None => match read_existing(&self.path) {
                Some(bytes) => self.decode_frames(&bytes)?.1 as u64,
                None => 0,
            },
        };

        if file_len <= committed {
            return Ok(file_len);
        }
        warn!(
            path = %self.path.display(),
            committed,
            file_len,
            "discarding bytes past the last complete frame before append"
        );
        file.set_len(committed)?;
        Ok(committed)
    }

    fn write_frame(&self, file: &mut File, frame: &[u8]) -> std::io::Result<()> {
        file.write_all(frame)?;
        file.flush()?;
        if self.sync_mode.is_durable() {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Drop a torn tail so the next append lands on a frame boundary.
    fn truncate_to(&self, valid_len: usize) -> StoreResult<()> {
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.set_len(valid_len as u64)?;
        if self.sync_mode.is_durable() {
            file.sync_all()?;
        }
        Ok(())
    }
}

fn encode_frame(block: &Block) -> StoreResult<Vec<u8>> {
    let payload = serde_json::to_vec(block).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization("block exceeds frame size limit".into()))?;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

impl ChainStore for LogFileStore {
    fn load(&self) -> StoreResult<Option<Vec<Block>>> {
        let Some(bytes) = read_existing(&self.path) else {
            return Ok(None);
        };

        let (blocks, valid_len) = self.decode_frames(&bytes)?;
        if valid_len < bytes.len() {
            warn!(
                path = %self.path.display(),
                valid_len,
                file_len = bytes.len(),
                "torn frame at end of chain log; truncating"
            );
            self.truncate_to(valid_len)?;
        }
        self.set_committed(valid_len as u64);

        debug!(path = %self.path.display(), blocks = blocks.len(), "chain log recovery complete");
        Ok(Some(blocks))
    }

    fn save(&self, chain: &[Block]) -> StoreResult<()> {
        let frames = chain
            .iter()
            .map(encode_frame)
            .collect::<StoreResult<Vec<_>>>()?;

        write_atomic(&self.path, self.sync_mode, |writer| {
            for frame in &frames {
                writer.write_all(frame)?;
            }
            Ok(())
        })?;
        self.set_committed(frames.iter().map(|f| f.len() as u64).sum());

        debug!(path = %self.path.display(), blocks = chain.len(), "rewrote chain log");
        Ok(())
    }

    fn append(&self, chain: &[Block]) -> StoreResult<()> {
        let Some(block) = chain.last() else {
            return Ok(());
        };
        let frame = encode_frame(block)?;

        fs::create_dir_all(parent_dir(&self.path))?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(true)
            .open(&self.path)?;
        let start = self.frame_boundary(&file)?;

        if let Err(e) = self.write_frame(&mut file, &frame) {
            if let Err(truncate) = file.set_len(start) {
                warn!(error = %truncate, "cannot remove partial frame after failed append");
            }
            return Err(e.into());
        }
        self.set_committed(start + frame.len() as u64);

        debug!(index = block.index, len = frame.len(), "chain log append");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
