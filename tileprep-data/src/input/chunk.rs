//! Bounded, streaming reads of delimited exports.
//!
//! Files are read line by line and handed out in chunks of at most
//! `chunk_size` non-blank lines, so memory stays proportional to the chunk
//! size rather than the file size. Gzip input is detected by its magic bytes.

use std::io::{self, BufRead, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::MultiGzDecoder;
use thiserror::Error;
use tileprep_fs::open_utf8_file;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const UTF8_BOM: char = '\u{feff}';

/// Errors raised while streaming an input file.
#[derive(Debug, Error)]
pub enum ChunkReadError {
    #[error("failed to open {path}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path} at line {line}")]
    Read {
        path: Utf8PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// Consecutive non-blank lines from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    lines: Vec<(usize, String)>,
}

impl Chunk {
    /// Lines paired with their 1-based line numbers.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines.iter().map(|(number, line)| (*number, line.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Iterator over [`Chunk`]s of a single file.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use tileprep_data::input::ChunkReader;
///
/// # fn main() -> Result<(), tileprep_data::input::ChunkReadError> {
/// for chunk in ChunkReader::open(Utf8Path::new("clu54_WestVirginia_STR.txt"), 10_000)? {
///     println!("{} lines", chunk?.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChunkReader {
    path: Utf8PathBuf,
    reader: Box<dyn BufRead + Send>,
    chunk_size: usize,
    line_number: usize,
    buffer: String,
    finished: bool,
}

impl ChunkReader {
    /// Open `path`; a `chunk_size` of zero is treated as one.
    pub fn open(path: &Utf8Path, chunk_size: usize) -> Result<Self, ChunkReadError> {
        let file = open_utf8_file(path).map_err(|source| ChunkReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut raw = BufReader::new(file);
        let header = raw.fill_buf().map_err(|source| ChunkReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let reader: Box<dyn BufRead + Send> = if header.starts_with(&GZIP_MAGIC) {
            Box::new(BufReader::new(MultiGzDecoder::new(raw)))
        } else {
            Box::new(raw)
        };
        Ok(Self::from_reader(path, reader, chunk_size))
    }

    /// Stream chunks from an already-open reader.
    pub fn from_reader(
        path: &Utf8Path,
        reader: Box<dyn BufRead + Send>,
        chunk_size: usize,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            reader,
            chunk_size: chunk_size.max(1),
            line_number: 0,
            buffer: String::new(),
            finished: false,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, ChunkReadError> {
        loop {
            self.buffer.clear();
            let read = self
                .reader
                .read_line(&mut self.buffer)
                .map_err(|source| ChunkReadError::Read {
                    path: self.path.clone(),
                    line: self.line_number + 1,
                    source,
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let mut line = self.buffer.trim_end_matches(['\n', '\r']);
            if self.line_number == 1 {
                line = line.strip_prefix(UTF8_BOM).unwrap_or(line);
            }
            if !line.trim().is_empty() {
                return Ok(Some(line.to_owned()));
            }
        }
    }
}

impl Iterator for ChunkReader {
    type Item = Result<Chunk, ChunkReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut lines = Vec::with_capacity(self.chunk_size.min(1024));
        while lines.len() < self.chunk_size {
            match self.next_line() {
                Ok(Some(line)) => lines.push((self.line_number, line)),
                Ok(None) => {
                    self.finished = true;
                    break;
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
        if lines.is_empty() {
            return None;
        }
        Some(Ok(Chunk { lines }))
    }
}

impl std::fmt::Debug for ChunkReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkReader")
            .field("path", &self.path)
            .field("chunk_size", &self.chunk_size)
            .field("line_number", &self.line_number)
            .finish_non_exhaustive()
    }
}
