use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::SyncMode;

/// Read a store file, mapping "absent" and "unreadable" to `None`.
pub(crate) fn read_existing(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no persisted chain");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "persisted chain unreadable; treating as empty");
            None
        }
    }
}

/// Replace `path` with the bytes produced by `fill`.
///
/// The content is written to a temporary file in the target directory and
/// renamed over `path`, so readers see either the old or the new content and
/// a crash mid-write leaves the old file intact.
pub(crate) fn write_atomic<F>(path: &Path, sync: SyncMode, fill: F) -> StoreResult<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> StoreResult<()>,
{
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        fill(&mut writer)?;
        writer.flush()?;
    }
    if sync.is_durable() {
        tmp.as_file().sync_all()?;
    }
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    if sync.is_durable() {
        sync_dir(dir)?;
    }
    Ok(())
}

/// Directory holding `path`; `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
pub(crate) fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
