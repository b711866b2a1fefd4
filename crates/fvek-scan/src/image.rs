//! Flat memory image walked for tagged kernel pool allocations.
//!
//! The image is treated as one linear address space: an allocation's address
//! is its byte offset in the file. No page-table translation is attempted, so
//! this works on raw physical dumps where pool blocks are not split across
//! non-contiguous pages.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, ScanError};
use crate::source::{Allocation, AllocationSource, PoolTag};

/// Pool header layout of the target kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PoolLayout {
    /// 64-bit kernels: 16-byte header and alignment, `BlockSize` in byte 2.
    #[default]
    X64,
    /// 32-bit kernels: 8-byte header and alignment, 9-bit `BlockSize` at byte 2.
    X86,
}

impl PoolLayout {
    /// Size of the pool header in bytes.
    pub const fn header_len(self) -> usize {
        match self {
            PoolLayout::X64 => 16,
            PoolLayout::X86 => 8,
        }
    }

    /// Pool block granularity in bytes.
    pub const fn alignment(self) -> usize {
        match self {
            PoolLayout::X64 => 16,
            PoolLayout::X86 => 8,
        }
    }

    /// Decodes the header at the start of `bytes`.
    ///
    /// Returns `None` when fewer than [`Self::header_len`] bytes are available.
    pub fn decode_header(self, bytes: &[u8]) -> Option<PoolHeader> {
        let header = bytes.get(..self.header_len())?;
        let block_size = match self {
            PoolLayout::X64 => usize::from(header[2]),
            PoolLayout::X86 => usize::from(u16::from_le_bytes([header[2], header[3]]) & 0x01ff),
        };
        Some(PoolHeader {
            block_size,
            tag: PoolTag([header[4], header[5], header[6], header[7]]),
        })
    }
}

/// The fields of a pool header the walker cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolHeader {
    /// Allocation size in pool blocks, header included.
    pub block_size: usize,
    /// Owner tag.
    pub tag: PoolTag,
}

impl PoolHeader {
    /// Allocation size in bytes under `layout`.
    #[inline]
    pub fn size(&self, layout: PoolLayout) -> usize {
        self.block_size * layout.alignment()
    }
}

/// Default size of the header window read from the image at a time.
pub const DEFAULT_CHUNK_LEN: usize = 1 << 20;

/// A memory image on disk, read in place.
///
/// Pool headers are searched through a bounded window that slides over the
/// file; only the bytes of allocations carrying the requested tag are
/// copied out.
#[derive(Debug)]
pub struct RawImage {
    path: PathBuf,
    file: File,
    len: u64,
    layout: PoolLayout,
    chunk_len: usize,
}

impl RawImage {
    /// Opens an image without reading its contents.
    pub fn open(path: impl AsRef<Path>, layout: PoolLayout) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let image_err = |source| ScanError::ImageRead {
            path: path.clone(),
            source,
        };
        let file = File::open(&path).map_err(image_err)?;
        let len = file.metadata().map_err(image_err)?.len();
        debug!(path = %path.display(), bytes = len, "opened memory image");
        Ok(Self {
            path,
            file,
            len,
            layout,
            chunk_len: DEFAULT_CHUNK_LEN,
        })
    }

    /// Sets the header window size, rounded up to the pool alignment.
    pub fn with_chunk_len(mut self, chunk_len: usize) -> Self {
        let align = self.layout.alignment();
        self.chunk_len = chunk_len.max(1).div_ceil(align) * align;
        self
    }

    /// Image size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the image is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Header layout used when walking.
    pub fn layout(&self) -> PoolLayout {
        self.layout
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(buf))
            .map_err(|source| ScanError::ImageRead {
                path: self.path.clone(),
                source,
            })
    }
}

impl AllocationSource for RawImage {
    fn allocations(&self, tag: PoolTag, min_size: usize) -> Result<Vec<Allocation>> {
        let layout = self.layout;
        let align = layout.alignment() as u64;
        let header_len = layout.header_len() as u64;

        let mut window = vec![0u8; self.chunk_len];
        let mut window_start = 0u64;
        let mut window_len = 0usize;
        let mut found = Vec::new();

        // `cursor` stays pool-aligned; a header not fully inside the current
        // window reloads the window starting at that header.
        let mut cursor = 0u64;
        while cursor + header_len <= self.len {
            if cursor + header_len > window_start + window_len as u64 {
                window_start = cursor;
                window_len = (self.len - cursor).min(self.chunk_len as u64) as usize;
                self.read_at(window_start, &mut window[..window_len])?;
            }
            let rel = (cursor - window_start) as usize;
            let Some(header) = layout.decode_header(&window[rel..window_len]) else {
                break;
            };

            if header.tag == tag && header.block_size > 0 {
                let end = cursor
                    .saturating_add(header.size(layout) as u64)
                    .min(self.len);
                let size = (end - cursor) as usize;
                if size > min_size {
                    let mut bytes = vec![0u8; size];
                    self.read_at(cursor, &mut bytes)?;
                    found.push(Allocation {
                        address: cursor,
                        bytes,
                    });
                    cursor = end.div_ceil(align) * align;
                    continue;
                }
            }
            cursor += align;
        }

        debug!(%tag, count = found.len(), "enumerated tagged pool allocations");
        Ok(found)
    }
}
