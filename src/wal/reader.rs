//! WAL Reader
//!
//! Reads framed entries back from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{ArborError, Result};

use super::{WalEntry, HEADER_SIZE, MAX_PAYLOAD_SIZE};

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset just past the last fully read entry
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next entry from the WAL.
    ///
    /// Returns `Ok(None)` at a clean end of file, and `WalCorruption` for a
    /// torn or damaged frame.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        match read_full(&mut self.reader, &mut header)? {
            0 => return Ok(None),
            n if n < HEADER_SIZE => {
                return Err(ArborError::WalCorruption(format!(
                    "Partial header at offset {} ({} of {} bytes)",
                    self.position, n, HEADER_SIZE
                )))
            }
            _ => {}
        }

        let lsn = u64::from_le_bytes(header[0..8].try_into().unwrap_or_default());
        let crc = u32::from_le_bytes(header[8..12].try_into().unwrap_or_default());
        let len = u32::from_le_bytes(header[12..16].try_into().unwrap_or_default());

        if len > MAX_PAYLOAD_SIZE {
            return Err(ArborError::WalCorruption(format!(
                "Implausible entry length {} at offset {}",
                len, self.position
            )));
        }

        let mut payload = vec![0u8; len as usize];
        let read = read_full(&mut self.reader, &mut payload)?;
        if read < payload.len() {
            return Err(ArborError::WalCorruption(format!(
                "Partial payload at offset {} ({} of {} bytes)",
                self.position,
                read,
                payload.len()
            )));
        }

        let entry = WalEntry::deserialize(lsn, crc, &payload)?;
        self.position += (HEADER_SIZE + payload.len()) as u64;

        Ok(Some(entry))
    }

    /// Offset just past the last valid entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over entries until end of file or the first bad frame
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the file allows, returning how many bytes were read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
