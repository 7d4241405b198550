//! Paginated lookup table with cursor navigation.
//!
//! The table holds the candidates currently loaded from the gateway, a page
//! size and an absolute cursor position. The page shown is the one containing
//! the cursor. Navigation never wraps around and never leaves the cursor on a
//! candidate that does not exist.

use std::ops::Range;

use crate::candidate::Candidate;

#[derive(Debug, Clone)]
pub struct LookupTable {
    /// Loaded candidates
    candidates: Vec<Candidate>,

    /// Number of candidates per page
    page_size: usize,

    /// Absolute cursor position (0-based, < len when non-empty)
    cursor: usize,
}

impl LookupTable {
    /// Create a lookup table with specified page size.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            candidates: Vec::new(),
            page_size: page_size.max(1),
            cursor: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn append_candidate(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    /// Get all loaded candidates.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Absolute position of the cursor.
    pub fn cursor_pos(&self) -> usize {
        self.cursor
    }

    /// Index of the first candidate on the cursor's page.
    pub fn page_start(&self) -> usize {
        self.cursor / self.page_size * self.page_size
    }

    /// Zero-based page index of the cursor.
    pub fn current_page(&self) -> usize {
        self.cursor / self.page_size
    }

    /// Number of pages over the loaded candidates.
    pub fn num_pages(&self) -> usize {
        self.candidates.len().div_ceil(self.page_size)
    }

    /// Cursor offset within its page.
    pub fn cursor_in_page(&self) -> usize {
        self.cursor % self.page_size
    }

    fn current_page_range(&self) -> Range<usize> {
        let start = self.page_start().min(self.candidates.len());
        let end = (start + self.page_size).min(self.candidates.len());
        start..end
    }

    /// Candidates on the cursor's page.
    pub fn current_page_candidates(&self) -> &[Candidate] {
        &self.candidates[self.current_page_range()]
    }

    /// Candidate under the cursor.
    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.candidates.get(self.cursor)
    }

    /// Whether the cursor is on the last loaded candidate.
    pub fn cursor_on_last(&self) -> bool {
        !self.candidates.is_empty() && self.cursor + 1 == self.candidates.len()
    }

    /// Whether the cursor's page is the last loaded page.
    pub fn on_last_page(&self) -> bool {
        self.candidates.is_empty() || self.current_page() + 1 >= self.num_pages()
    }

    /// Move cursor up one row. Returns true if the cursor moved.
    pub fn cursor_up(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move cursor down one row, crossing into the next page if needed.
    pub fn cursor_down(&mut self) -> bool {
        if self.candidates.is_empty() || self.cursor + 1 >= self.candidates.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Move to the previous page, keeping the row within the page.
    pub fn page_up(&mut self) -> bool {
        if self.cursor < self.page_size {
            return false;
        }
        self.cursor -= self.page_size;
        true
    }

    /// Move to the next page, keeping the row within the page when the next
    /// page is long enough and landing on the last candidate otherwise.
    pub fn page_down(&mut self) -> bool {
        if self.on_last_page() {
            return false;
        }
        self.cursor = (self.cursor + self.page_size).min(self.candidates.len() - 1);
        true
    }

    /// Clear the table.
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.cursor = 0;
    }
}

impl Default for LookupTable {
    fn default() -> Self {
        Self::with_page_size(5)
    }
}
