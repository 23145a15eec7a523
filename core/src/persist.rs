use crate::dictionary::{Dictionary, TermEntry};
use crate::error::{Result, SearchError};
use crate::index::{Posting, PostingList};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const DICTIONARY_MAGIC: &[u8; 4] = b"SKDX";
pub const FORMAT_VERSION: u32 = 1;

/// Skip field value meaning "no forward pointer at this index".
const NO_SKIP: u32 = u32::MAX;

#[derive(Debug, Serialize)]
struct DictionaryFileRef<'a> {
    version: u32,
    created_at: String,
    dictionary: &'a Dictionary,
}

/// Dictionary blob as stored on disk.
#[derive(Debug, Deserialize)]
pub struct DictionaryFile {
    pub version: u32,
    pub created_at: String,
    pub dictionary: Dictionary,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn save_dictionary(path: &Path, dict: &Dictionary) -> Result<()> {
    ensure_parent(path)?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let mut f = BufWriter::new(File::create(path)?);
    f.write_all(DICTIONARY_MAGIC)?;
    bincode::serialize_into(&mut f, &DictionaryFileRef { version: FORMAT_VERSION, created_at, dictionary: dict })?;
    f.flush()?;
    Ok(())
}

pub fn load_dictionary_file(path: &Path) -> Result<DictionaryFile> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    if buf.len() < DICTIONARY_MAGIC.len() || &buf[..DICTIONARY_MAGIC.len()] != DICTIONARY_MAGIC {
        return Err(SearchError::Corrupt(format!("{} is not a dictionary file", path.display())));
    }
    let file: DictionaryFile = bincode::deserialize(&buf[DICTIONARY_MAGIC.len()..])?;
    if file.version != FORMAT_VERSION {
        return Err(SearchError::Corrupt(format!(
            "dictionary format version {} is not supported (expected {FORMAT_VERSION})",
            file.version
        )));
    }
    Ok(file)
}

pub fn load_dictionary(path: &Path) -> Result<Dictionary> {
    Ok(load_dictionary_file(path)?.dictionary)
}

/// Serialize a posting list as one length-prefixed little-endian record:
///
/// ```text
/// u32 body_len | u32 count | count x (u32 doc_id, u32 skip, u32 n, n x u32 position)
/// ```
pub fn encode_posting_list(list: &PostingList) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    body.write_u32::<LittleEndian>(list.len() as u32)?;
    for (posting, skip) in list.postings().iter().zip(list.skips()) {
        body.write_u32::<LittleEndian>(posting.doc_id)?;
        body.write_u32::<LittleEndian>(skip.unwrap_or(NO_SKIP))?;
        body.write_u32::<LittleEndian>(posting.positions.len() as u32)?;
        for &pos in &posting.positions {
            body.write_u32::<LittleEndian>(pos)?;
        }
    }
    let mut record = Vec::with_capacity(body.len() + 4);
    record.write_u32::<LittleEndian>(body.len() as u32)?;
    record.extend_from_slice(&body);
    Ok(record)
}

fn truncated(e: io::Error) -> SearchError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        SearchError::Corrupt("truncated posting record".into())
    } else {
        SearchError::Io(e)
    }
}

fn remaining(cur: &Cursor<&[u8]>) -> usize {
    cur.get_ref().len().saturating_sub(cur.position() as usize)
}

pub fn decode_posting_list(bytes: &[u8]) -> Result<PostingList> {
    let mut cur = Cursor::new(bytes);
    let body_len = cur.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    if body_len + 4 != bytes.len() {
        return Err(SearchError::Corrupt(format!(
            "posting record declares {body_len} body bytes but {} were read",
            bytes.len().saturating_sub(4)
        )));
    }
    let count = cur.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    // doc id, skip and position count take 12 bytes per entry
    if count > remaining(&cur) / 12 {
        return Err(SearchError::Corrupt(format!(
            "posting record declares {count} entries but holds {} bytes",
            bytes.len()
        )));
    }
    let mut postings: Vec<Posting> = Vec::with_capacity(count);
    let mut skips = Vec::with_capacity(count);
    for i in 0..count {
        let doc_id = cur.read_u32::<LittleEndian>().map_err(truncated)?;
        let skip = cur.read_u32::<LittleEndian>().map_err(truncated)?;
        let n = cur.read_u32::<LittleEndian>().map_err(truncated)? as usize;
        if n > remaining(&cur) / 4 {
            return Err(SearchError::Corrupt(format!("doc id {doc_id} declares {n} positions past the record end")));
        }
        let mut positions = Vec::with_capacity(n);
        for _ in 0..n {
            positions.push(cur.read_u32::<LittleEndian>().map_err(truncated)?);
        }
        if let Some(prev) = postings.last() {
            if prev.doc_id >= doc_id {
                return Err(SearchError::Corrupt(format!("doc id {doc_id} out of order at index {i}")));
            }
        }
        let skip = match skip {
            NO_SKIP => None,
            target if (target as usize) > i && (target as usize) < count => Some(target),
            target => return Err(SearchError::Corrupt(format!("skip pointer {target} at index {i} is invalid"))),
        };
        postings.push(Posting::new(doc_id, positions));
        skips.push(skip);
    }
    if cur.position() as usize != bytes.len() {
        return Err(SearchError::Corrupt("trailing bytes after posting record".into()));
    }
    Ok(PostingList::from_parts(postings, skips))
}

/// Append-only writer used while flushing the index.
pub struct PostingsWriter {
    out: BufWriter<File>,
    offset: u64,
}

impl PostingsWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        ensure_parent(path.as_ref())?;
        let f = File::create(path.as_ref())?;
        Ok(Self { out: BufWriter::new(f), offset: 0 })
    }

    /// Byte offset the next append will land at.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let at = self.offset;
        self.out.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(at)
    }

    /// Flush and sync; returns the total number of bytes written.
    pub fn finish(mut self) -> Result<u64> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        Ok(self.offset)
    }
}

/// Random-access reader over a frozen postings file. Each read opens the
/// file read-only, so any number of processes can share an index.
#[derive(Debug, Clone)]
pub struct PostingsReader {
    path: PathBuf,
    len: u64,
}

impl PostingsReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let len = std::fs::metadata(path.as_ref())?.len();
        Ok(Self { path: path.as_ref().to_path_buf(), len })
    }

    pub fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        if offset.checked_add(size).map_or(true, |end| end > self.len) {
            return Err(SearchError::Corrupt(format!(
                "range {offset}+{size} exceeds postings file of {} bytes",
                self.len
            )));
        }
        let mut f = File::open(&self.path)?;
        f.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        f.read_exact(&mut buf).map_err(truncated)?;
        Ok(buf)
    }

    pub fn read_posting_list(&self, entry: &TermEntry) -> Result<PostingList> {
        let list = decode_posting_list(&self.read(entry.offset, entry.size)?)?;
        if list.len() != entry.doc_freq as usize {
            return Err(SearchError::Corrupt(format!(
                "posting list at offset {} has {} entries, dictionary says {}",
                entry.offset,
                list.len(),
                entry.doc_freq
            )));
        }
        Ok(list)
    }
}
