//! Per-item chained reader: raw item stream plus filter stages.

use std::io::{ErrorKind, Read};

use appendix_filters::FilterChain;
use appendix_shared::{AppendixError, ContentItem, DynamicContext, Result};

/// One pull from a [`ChainedReader`].
#[derive(Debug, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// Bytes produced by the stream; never empty.
    Data(&'a [u8]),
    /// The stream is exhausted.
    Eof,
}

/// Pull-based stream over one item's filtered content.
///
/// Inline text is never filtered. Files are wrapped by every stage of the
/// chain, with parameters expanded against the context as it stands when the
/// reader is opened.
pub struct ChainedReader {
    stream: Box<dyn Read>,
    buf: Vec<u8>,
    label: String,
}

impl ChainedReader {
    pub fn open(
        item: &ContentItem,
        chain: &FilterChain,
        ctx: &DynamicContext,
        chunk_size: usize,
    ) -> Result<Self> {
        let label = item.label();
        let raw = item
            .open_raw()
            .map_err(|e| AppendixError::item_read(label.clone(), e))?;

        let stream = match item {
            ContentItem::File { .. } if !chain.is_empty() => chain.wrap(raw, ctx)?,
            _ => raw,
        };

        Ok(Self {
            stream,
            buf: vec![0; chunk_size.max(1)],
            label,
        })
    }

    /// Pull the next chunk, or [`Chunk::Eof`] once the stream is drained.
    pub fn next_chunk(&mut self) -> Result<Chunk<'_>> {
        loop {
            match self.stream.read(&mut self.buf) {
                Ok(0) => return Ok(Chunk::Eof),
                Ok(n) => return Ok(Chunk::Data(&self.buf[..n])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(AppendixError::item_read(self.label.clone(), e)),
            }
        }
    }
}
