//! Source document model
//!
//! All offsets are character (Unicode scalar value) offsets, never byte
//! offsets, so they stay meaningful for non-ASCII tender text.

/// Page separator emitted by `pdftotext`
pub const PAGE_SEPARATOR: char = '\u{000C}';

/// Extracted document text plus the character offset where each page starts
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    text: String,
    char_len: usize,
    page_offsets: Vec<usize>,
}

impl Document {
    /// Create a document without page metadata
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self {
            text,
            char_len,
            page_offsets: Vec::new(),
        }
    }

    /// Create a document with explicit page start offsets
    ///
    /// Offsets must be strictly increasing, start at 0 and lie inside the
    /// text.
    pub fn with_page_offsets(text: impl Into<String>, page_offsets: Vec<usize>) -> Result<Self, String> {
        let mut doc = Self::new(text);

        if let Some(&first) = page_offsets.first() {
            if first != 0 {
                return Err(format!("first page must start at offset 0, got {}", first));
            }
        }
        for pair in page_offsets.windows(2) {
            if pair[1] <= pair[0] {
                return Err(format!(
                    "page offsets must be strictly increasing ({} then {})",
                    pair[0], pair[1]
                ));
            }
        }
        if let Some(&last) = page_offsets.last() {
            if last > doc.char_len || (last == doc.char_len && page_offsets.len() > 1) {
                return Err(format!(
                    "page offset {} beyond end of text ({} chars)",
                    last, doc.char_len
                ));
            }
        }

        doc.page_offsets = page_offsets;
        Ok(doc)
    }

    /// Build a document from per-page texts, joined with a newline
    ///
    /// # Examples
    ///
    /// ```
    /// use rfp_domain::Document;
    ///
    /// let doc = Document::from_pages(["Page one", "Page two"]);
    /// assert_eq!(doc.page_at(0), Some(1));
    /// assert_eq!(doc.page_at(9), Some(2));
    /// ```
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        let mut page_offsets = Vec::new();
        let mut offset = 0;

        for (idx, page) in pages.into_iter().enumerate() {
            if idx > 0 {
                text.push('\n');
                offset += 1;
            }
            page_offsets.push(offset);
            let page = page.as_ref();
            text.push_str(page);
            offset += page.chars().count();
        }

        Self {
            text,
            char_len: offset,
            page_offsets,
        }
    }

    /// Build a document from text whose pages are separated by form feeds
    pub fn from_paged_text(raw: &str) -> Self {
        if !raw.contains(PAGE_SEPARATOR) {
            return Self::new(raw);
        }
        let mut pages: Vec<&str> = raw.split(PAGE_SEPARATOR).collect();
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Self::from_pages(pages)
    }

    /// Full document text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Whether the document has no text at all
    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    /// Character offsets where pages start (empty when unknown)
    pub fn page_offsets(&self) -> &[usize] {
        &self.page_offsets
    }

    /// Number of known pages
    pub fn page_count(&self) -> usize {
        self.page_offsets.len()
    }

    /// 1-based page containing the character at `offset`
    pub fn page_at(&self, offset: usize) -> Option<u32> {
        if self.page_offsets.is_empty() {
            return None;
        }
        let page = self.page_offsets.partition_point(|&start| start <= offset);
        Some(page.max(1) as u32)
    }
}
