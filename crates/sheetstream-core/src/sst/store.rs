//! Append-only on-disk layout for the shared string table
//!
//! ```text
//! strings.dat   repeated: len(u32 LE) | utf-8 bytes
//! strings.idx   repeated: offset(u64 LE)      -- entry i sits at byte i * 8
//! ```
//!
//! Records are only ever appended, so a failed write can leave at most a
//! truncated trailing record; every record before it stays readable. The
//! index is derived data and can be regenerated from `strings.dat`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tempfile::TempDir;

use crate::error::{Error, Result};

/// File holding the string records
pub const VALUES_FILE: &str = "strings.dat";
/// File holding one offset per string id
pub const INDEX_FILE: &str = "strings.idx";

const INDEX_ENTRY_BYTES: u64 = 8;
const RECORD_HEADER_BYTES: u64 = 4;

/// Where the store lives; a temp directory is removed on drop
#[derive(Debug)]
enum Location {
    Temp(TempDir),
    Dir(PathBuf),
}

impl Location {
    fn path(&self) -> &Path {
        match self {
            Location::Temp(dir) => dir.path(),
            Location::Dir(path) => path,
        }
    }
}

/// Result of scanning `strings.dat` from the start
#[derive(Debug, Default)]
pub(crate) struct ScanResult {
    pub(crate) strings: Vec<String>,
    pub(crate) offsets: Vec<u64>,
    /// Length of the readable prefix; anything after it is a torn record
    pub(crate) valid_len: u64,
}

#[derive(Debug)]
pub(crate) struct StringStore {
    location: Location,
    values: BufWriter<File>,
    index: BufWriter<File>,
    values_reader: File,
    index_reader: File,
    /// Offset the next record will be written at
    values_len: u64,
}

impl StringStore {
    /// Create an empty store in a fresh temp directory
    pub(crate) fn temp() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("sheetstream-sst").tempdir()?;
        Self::create(Location::Temp(dir))
    }

    /// Create an empty store in `dir`, truncating any previous files
    pub(crate) fn create_in(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Self::create(Location::Dir(dir.to_path_buf()))
    }

    fn create(location: Location) -> Result<Self> {
        for name in [VALUES_FILE, INDEX_FILE] {
            File::create(location.path().join(name))?;
        }
        Self::open_files(location, 0)
    }

    /// Open an existing store, returning it with every readable string
    ///
    /// A torn trailing record is cut off, and the index is rewritten when it
    /// does not match the value file.
    pub(crate) fn open(dir: &Path) -> Result<(Self, Vec<String>)> {
        let values_path = dir.join(VALUES_FILE);
        if !values_path.exists() {
            return Err(Error::CorruptStore(format!(
                "missing {}",
                values_path.display()
            )));
        }

        let scan = scan_values(&values_path)?;
        let on_disk = fs::metadata(&values_path)?.len();
        if scan.valid_len < on_disk {
            log::warn!(
                "shared string store {}: dropping {} bytes of torn trailing record",
                values_path.display(),
                on_disk - scan.valid_len
            );
            OpenOptions::new()
                .write(true)
                .open(&values_path)?
                .set_len(scan.valid_len)?;
        }

        let index_path = dir.join(INDEX_FILE);
        let expected_index = scan.offsets.len() as u64 * INDEX_ENTRY_BYTES;
        let index_ok = fs::metadata(&index_path)
            .map(|m| m.len() == expected_index)
            .unwrap_or(false);
        if !index_ok {
            log::debug!(
                "rebuilding shared string index {} ({} entries)",
                index_path.display(),
                scan.offsets.len()
            );
            write_index_file(&index_path, &scan.offsets)?;
        }

        let store = Self::open_files(Location::Dir(dir.to_path_buf()), scan.valid_len)?;
        Ok((store, scan.strings))
    }

    fn open_files(location: Location, values_len: u64) -> Result<Self> {
        let values_path = location.path().join(VALUES_FILE);
        let index_path = location.path().join(INDEX_FILE);
        let append = |path: &Path| OpenOptions::new().append(true).open(path);

        Ok(Self {
            values: BufWriter::new(append(&values_path)?),
            index: BufWriter::new(append(&index_path)?),
            values_reader: File::open(&values_path)?,
            index_reader: File::open(&index_path)?,
            values_len,
            location,
        })
    }

    /// Directory holding the store files
    pub(crate) fn dir(&self) -> &Path {
        self.location.path()
    }

    /// Append one string, returning the offset of its record
    pub(crate) fn append(&mut self, value: &str) -> io::Result<u64> {
        let offset = self.values_len;
        let len = u32::try_from(value.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
        self.values.write_u32::<LittleEndian>(len)?;
        self.values.write_all(value.as_bytes())?;
        self.index.write_u64::<LittleEndian>(offset)?;
        self.values_len += RECORD_HEADER_BYTES + u64::from(len);
        Ok(offset)
    }

    /// Push buffered records to the files, optionally syncing to disk
    pub(crate) fn flush(&mut self, sync: bool) -> io::Result<()> {
        self.values.flush()?;
        self.index.flush()?;
        if sync {
            self.values.get_ref().sync_data()?;
            self.index.get_ref().sync_data()?;
        }
        Ok(())
    }

    /// Offset of the record for `id`, read from the index file
    pub(crate) fn offset_of(&mut self, id: u32) -> Result<u64> {
        self.index_reader
            .seek(SeekFrom::Start(u64::from(id) * INDEX_ENTRY_BYTES))?;
        Ok(self.index_reader.read_u64::<LittleEndian>()?)
    }

    /// Read `count` consecutive records starting at byte `offset`
    pub(crate) fn read_run(&mut self, offset: u64, count: usize) -> Result<Vec<String>> {
        self.values_reader.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(&mut self.values_reader);
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(read_record(&mut reader)?);
        }
        Ok(out)
    }

    /// Regenerate `strings.idx` from `strings.dat`
    ///
    /// Buffered records must be flushed first. Returns the number of entries.
    pub(crate) fn rebuild_index(&mut self) -> Result<usize> {
        self.flush(false)?;
        let values_path = self.location.path().join(VALUES_FILE);
        let index_path = self.location.path().join(INDEX_FILE);

        let scan = scan_values(&values_path)?;
        if scan.valid_len != self.values_len {
            return Err(Error::CorruptStore(format!(
                "value file readable to byte {} but {} bytes were written",
                scan.valid_len, self.values_len
            )));
        }
        write_index_file(&index_path, &scan.offsets)?;

        self.index = BufWriter::new(OpenOptions::new().append(true).open(&index_path)?);
        self.index_reader = File::open(&index_path)?;
        Ok(scan.offsets.len())
    }
}

fn read_record<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u32::<LittleEndian>()? as usize;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| Error::CorruptStore(format!("invalid UTF-8: {e}")))
}

/// Read every complete record of a value file
pub(crate) fn scan_values(path: &Path) -> Result<ScanResult> {
    let file_len = fs::metadata(path)?.len();
    let mut reader = BufReader::new(File::open(path)?);
    let mut scan = ScanResult::default();

    while scan.valid_len < file_len {
        if file_len - scan.valid_len < RECORD_HEADER_BYTES {
            break;
        }
        let len = u64::from(reader.read_u32::<LittleEndian>()?);
        if file_len - scan.valid_len - RECORD_HEADER_BYTES < len {
            break;
        }
        let mut bytes = vec![0u8; len as usize];
        reader.read_exact(&mut bytes)?;
        let value = String::from_utf8(bytes).map_err(|e| {
            Error::CorruptStore(format!("invalid UTF-8 at byte {}: {e}", scan.valid_len))
        })?;
        scan.offsets.push(scan.valid_len);
        scan.strings.push(value);
        scan.valid_len += RECORD_HEADER_BYTES + len;
    }

    Ok(scan)
}

/// Write an index file atomically (temp file + rename)
fn write_index_file(path: &Path, offsets: &[u64]) -> Result<()> {
    let tmp_path = path.with_extension("idx.tmp");
    {
        let mut out = BufWriter::new(File::create(&tmp_path)?);
        for &offset in offsets {
            out.write_u64::<LittleEndian>(offset)?;
        }
        out.flush()?;
        out.get_ref().sync_all()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}
