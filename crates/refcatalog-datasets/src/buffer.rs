use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use memmap2::Mmap;
use serde::Deserialize;

use crate::DatasetError;

/// Strategy for loading dataset files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Memory-map each file (fast, zero-copy).
    #[default]
    Mmap,
    /// Read each file into an owned buffer (portable fallback).
    Owned,
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mmap" => Ok(LoadMode::Mmap),
            "owned" => Ok(LoadMode::Owned),
            other => Err(format!("unknown load mode {other:?} (expected mmap or owned)")),
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadMode::Mmap => "mmap",
            LoadMode::Owned => "owned",
        })
    }
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

/// Bytes of one dataset file, either mapped or read.
pub struct SourceBuffer {
    path: PathBuf,
    buf: Buffer,
}

impl SourceBuffer {
    pub fn load(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self, DatasetError> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).map_err(|e| DatasetError::io(&path, e))?;
        let len = file
            .metadata()
            .map_err(|e| DatasetError::io(&path, e))?
            .len();

        let buf = match mode {
            // Mapping a zero-length file is not portable.
            LoadMode::Mmap if len > 0 => {
                let map = unsafe { Mmap::map(&file) }.map_err(|e| DatasetError::io(&path, e))?;
                Buffer::Mmap(map)
            }
            _ => {
                let mut bytes = Vec::with_capacity(len as usize);
                file.read_to_end(&mut bytes)
                    .map_err(|e| DatasetError::io(&path, e))?;
                Buffer::Owned(bytes)
            }
        };
        Ok(SourceBuffer { path, buf })
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.buf {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }

    /// Lines split on `\n` with a trailing `\r` removed. A final empty
    /// segment after the last newline is not yielded.
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        let bytes = self.as_bytes();
        let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        (!bytes.is_empty())
            .then(|| body.split(|b| *b == b'\n').map(strip_cr))
            .into_iter()
            .flatten()
    }

    pub fn as_str(&self) -> Result<&str, DatasetError> {
        std::str::from_utf8(self.as_bytes()).map_err(|source| DatasetError::Utf8 {
            path: self.path.clone(),
            source,
        })
    }
}

pub(crate) fn strip_cr(line: &[u8]) -> &[u8] {
    if line.ends_with(b"\r") {
        &line[..line.len() - 1]
    } else {
        line
    }
}
