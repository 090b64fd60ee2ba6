//! Binary process-descriptor files.
//!
//! Layout, all fields little-endian `u32`:
//! a record count, followed by that many `(burst, priority, arrival)` triples.
//! Anything after the last record is ignored.
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::process::ProcessControlBlock;
use crate::utils::logging::prelude::*;

const FIELD_SIZE: usize = 4;
const RECORD_SIZE: usize = 3 * FIELD_SIZE;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("can not read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("{path}: missing record count")]
    MissingCount { path: PathBuf },
    #[error("{path}: expected {expected} records, found only {found}")]
    Truncated { path: PathBuf, expected: u32, found: u32 },
}

/// Read a descriptor file. Any malformed input yields an error, never a
/// partially populated collection.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_process_control_blocks(path: impl AsRef<Path>) -> Result<Vec<ProcessControlBlock>, LoadError> {
    let path = path.as_ref();
    let io_err = |source| LoadError::Io {
        path: path.to_owned(),
        source,
    };

    let mut reader = BufReader::new(File::open(path).map_err(io_err)?);

    let count = match read_u32(&mut reader).map_err(io_err)? {
        Some(count) => count,
        None => return Err(LoadError::MissingCount { path: path.to_owned() }),
    };

    // don't trust the header for the allocation size
    let mut queue = Vec::with_capacity((count as usize).min(1 << 16));
    for pid in 0..count {
        match read_record(&mut reader).map_err(io_err)? {
            Some([burst, priority, arrival]) => {
                queue.push(ProcessControlBlock::new(pid, burst, priority, arrival));
            }
            None => {
                return Err(LoadError::Truncated {
                    path: path.to_owned(),
                    expected: count,
                    found: pid,
                })
            }
        }
    }

    debug!(count, "loaded process control blocks");
    Ok(queue)
}

/// Write `queue` in the format [`load_process_control_blocks`] reads
pub fn write_process_control_blocks(path: impl AsRef<Path>, queue: &[ProcessControlBlock]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&(queue.len() as u32).to_le_bytes())?;
    for pcb in queue {
        for field in &[pcb.remaining_burst_time, pcb.priority, pcb.arrival] {
            writer.write_all(&field.to_le_bytes())?;
        }
    }
    writer.flush()
}

/// Fill `buf` completely. `Ok(false)` on a clean or partial end of input.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

fn read_u32(reader: &mut impl Read) -> io::Result<Option<u32>> {
    let mut buf = [0u8; FIELD_SIZE];
    Ok(if read_full(reader, &mut buf)? {
        Some(u32::from_le_bytes(buf))
    } else {
        None
    })
}

fn read_record(reader: &mut impl Read) -> io::Result<Option<[u32; 3]>> {
    let mut buf = [0u8; RECORD_SIZE];
    if !read_full(reader, &mut buf)? {
        return Ok(None);
    }

    let mut fields = [0u32; 3];
    for (field, chunk) in fields.iter_mut().zip(buf.chunks_exact(FIELD_SIZE)) {
        let mut bytes = [0u8; FIELD_SIZE];
        bytes.copy_from_slice(chunk);
        *field = u32::from_le_bytes(bytes);
    }
    Ok(Some(fields))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::process::from_triples;

    fn raw(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes().to_vec()).collect()
    }

    #[test]
    fn load_written_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pcb.bin");
        let queue = from_triples(vec![(15, 0, 0), (10, 1, 1), (5, 2, 2), (20, 3, 3)]);
        write_process_control_blocks(&path, &queue).unwrap();

        let loaded = load_process_control_blocks(&path).unwrap();
        assert_eq!(loaded.len(), 4);
        assert!(loaded.iter().all(|pcb| !pcb.started));
        assert_eq!(loaded, queue);
    }

    #[test]
    fn reads_fields_in_burst_priority_arrival_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one.bin");
        fs::write(&path, raw(&[1, 7, 3, 11])).unwrap();

        let loaded = load_process_control_blocks(&path).unwrap();
        assert_eq!(loaded, vec![ProcessControlBlock::new(0, 7, 3, 11)]);
    }

    #[test]
    fn missing_file() {
        let err = load_process_control_blocks("").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn empty_file_has_no_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"\x01\x00").unwrap();

        let err = load_process_control_blocks(&path).unwrap_err();
        assert!(matches!(err, LoadError::MissingCount { .. }));
    }

    #[test]
    fn truncated_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.bin");
        let mut bytes = raw(&[2, 5, 0, 0, 3, 1]);
        bytes.truncate(bytes.len() - 1);
        fs::write(&path, bytes).unwrap();

        match load_process_control_blocks(&path).unwrap_err() {
            LoadError::Truncated { expected, found, .. } => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            e => panic!("unexpected {}", e),
        }
    }

    #[test]
    fn zero_count_is_an_empty_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zero.bin");
        fs::write(&path, raw(&[0, 99])).unwrap();

        assert!(load_process_control_blocks(&path).unwrap().is_empty());
    }
}
