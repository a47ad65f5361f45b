//! Overlapping text windows for large documents

use crate::config::ExtractorConfig;
use crate::types::Chunk;
use rfp_domain::Document;
use std::sync::Arc;

/// Splits document text into overlapping chunks
///
/// Sizes and offsets are counted in characters. When the document carries
/// page offsets, a chunk end that lands just past a page boundary is pulled
/// back onto it, so chunks tend not to straddle pages.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
    snap_tolerance: usize,
}

impl TextChunker {
    /// Create a new text chunker
    ///
    /// `overlap` must be smaller than `chunk_size`; `ExtractorConfig::validate`
    /// enforces this for configured chunkers.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size.saturating_sub(1)),
            snap_tolerance: 0,
        }
    }

    /// Chunker with the configured sizes and page snapping
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap).with_page_snap(config.page_snap_tolerance)
    }

    /// Allow chunk ends to move back up to `tolerance` characters onto a page boundary
    pub fn with_page_snap(mut self, tolerance: usize) -> Self {
        self.snap_tolerance = tolerance;
        self
    }

    /// Lazily iterate the chunks of `document`
    ///
    /// The iterator is `Clone`; cloning it restarts from the same position.
    pub fn iter<'a>(&self, document: &'a Document) -> Chunks<'a> {
        let text = document.text();
        let byte_offsets: Arc<[usize]> = text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(text.len()))
            .collect();

        Chunks {
            document,
            byte_offsets,
            chunker: *self,
            start: 0,
            index: 0,
            done: document.is_empty(),
        }
    }

    /// Collect every chunk of `document`
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.iter(document).collect()
    }

    /// End offset for a chunk starting at `start`
    fn chunk_end(&self, document: &Document, start: usize) -> usize {
        let len = document.char_len();
        let end = (start + self.chunk_size).min(len);
        if end == len || self.snap_tolerance == 0 {
            return end;
        }

        // Largest page start inside (end - tolerance, end), keeping the chunk
        // longer than the overlap so the next start still advances
        let floor = end.saturating_sub(self.snap_tolerance);
        document
            .page_offsets()
            .iter()
            .rev()
            .copied()
            .find(|&boundary| boundary < end && boundary >= floor && boundary > start + self.overlap)
            .unwrap_or(end)
    }
}

/// Iterator over the chunks of one document
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    document: &'a Document,
    byte_offsets: Arc<[usize]>,
    chunker: TextChunker,
    start: usize,
    index: usize,
    done: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }

        let start = self.start;
        let end = self.chunker.chunk_end(self.document, start);
        let text = &self.document.text()[self.byte_offsets[start]..self.byte_offsets[end]];

        let chunk = Chunk {
            index: self.index,
            start,
            end,
            page: self.document.page_at(start),
            text: text.to_string(),
        };

        if end >= self.document.char_len() {
            self.done = true;
        } else {
            self.start = end - self.chunker.overlap;
        }
        self.index += 1;

        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_no_chunks() {
        let chunker = TextChunker::new(100, 10);
        assert!(chunker.chunk(&Document::new("")).is_empty());
    }

    #[test]
    fn test_small_document_is_single_chunk() {
        let chunker = TextChunker::new(100, 10);
        let chunks = chunker.chunk(&Document::new("Short text here."));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Short text here.");
        assert_eq!(chunks[0].page, None);
    }

    #[test]
    fn test_windows_overlap_exactly() {
        let chunker = TextChunker::new(10, 3);
        let doc = Document::new("abcdefghijklmnopqrstuvwxyz");
        let chunks = chunker.chunk(&doc);

        let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(spans, vec![(0, 10), (7, 17), (14, 24), (21, 26)]);
        assert_eq!(chunks[1].text, "hijklmnopq");
        assert_eq!(chunks[3].text, "vwxyz");
    }

    #[test]
    fn test_offsets_are_chars_not_bytes() {
        let chunker = TextChunker::new(4, 1);
        let doc = Document::new("ééééééé");
        let chunks = chunker.chunk(&doc);
        assert_eq!(chunks[0].text, "éééé");
        assert_eq!(chunks[1].start, 3);
        assert_eq!(chunks[1].text, "éééé");
    }

    #[test]
    fn test_snaps_to_page_boundary() {
        // Page two starts at offset 8
        let doc = Document::from_pages(["aaaaaaa", "bbbbbbbbbbbbbbb"]);
        let chunker = TextChunker::new(10, 2).with_page_snap(3);
        let chunks = chunker.chunk(&doc);

        assert_eq!(chunks[0].end, 8);
        assert_eq!(chunks[0].page, Some(1));
        assert_eq!(chunks[1].start, 6);
    }

    #[test]
    fn test_boundary_outside_tolerance_is_ignored() {
        let doc = Document::from_pages(["aaaa", "bbbbbbbbbbbbbbbbbbbb"]);
        let chunker = TextChunker::new(10, 2).with_page_snap(3);
        let chunks = chunker.chunk(&doc);
        assert_eq!(chunks[0].end, 10);
    }

    #[test]
    fn test_chunk_pages_follow_start_offset() {
        let doc = Document::from_pages(["a".repeat(20), "b".repeat(20)]);
        let chunker = TextChunker::new(15, 5);
        let pages: Vec<Option<u32>> = chunker.iter(&doc).map(|c| c.page).collect();
        assert_eq!(pages.first(), Some(&Some(1)));
        assert_eq!(pages.last(), Some(&Some(2)));
    }

    #[test]
    fn test_iterator_restarts_when_cloned() {
        let doc = Document::new("x".repeat(50));
        let chunker = TextChunker::new(20, 5);
        let mut iter = chunker.iter(&doc);
        let fresh = iter.clone();
        iter.next();
        assert_eq!(fresh.count(), chunker.chunk(&doc).len());
    }
}
