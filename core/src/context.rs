//! IME context for platform communication.
//!
//! The `ImeContext` struct is a plain data container the host reads after each
//! `process_key_event()` call: preedit text with its cursor, auxiliary text,
//! the visible lookup-table page and any committed text. No callbacks, no
//! traits; the host copies the fields into its own UI.

use serde::Serialize;

use crate::lookup_table::LookupTable;

/// One row of the visible lookup-table page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateView {
    pub text: String,
    /// Foreground colour (0xRRGGBB), if the row is highlighted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<u32>,
}

/// UI state produced by the editor.
///
/// - `preedit_text`: composition shown inline (raw pinyin)
/// - `preedit_cursor`: cursor inside the preedit, in chars
/// - `auxiliary_text`: hint line above the lookup table
/// - `candidates`: rows of the visible page
/// - `candidate_cursor`: highlighted row within the page
/// - `lookup_visible`: whether the lookup table should be shown
/// - `commit_text`: text committed by the last key (consume with `take_commit`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImeContext {
    pub preedit_text: String,
    pub preedit_cursor: usize,
    pub auxiliary_text: String,
    pub candidates: Vec<CandidateView>,
    pub candidate_cursor: usize,
    pub lookup_visible: bool,
    pub commit_text: String,
}

impl ImeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all state (preedit, candidates, auxiliary).
    /// Does NOT clear commit_text (platform should consume it first).
    pub fn clear(&mut self) {
        self.preedit_text.clear();
        self.preedit_cursor = 0;
        self.auxiliary_text.clear();
        self.hide_lookup_table();
    }

    /// Take the commit text, leaving it empty.
    pub fn take_commit(&mut self) -> String {
        std::mem::take(&mut self.commit_text)
    }

    /// Append committed text. Several commits within one key accumulate.
    pub fn commit(&mut self, text: &str) {
        self.commit_text.push_str(text);
    }

    pub fn has_commit(&self) -> bool {
        !self.commit_text.is_empty()
    }

    /// Check if there's any visible state (preedit or candidates).
    pub fn has_visible_state(&self) -> bool {
        !self.preedit_text.is_empty() || self.lookup_visible
    }

    pub fn update_preedit(&mut self, text: &str, cursor: usize) {
        self.preedit_text.clear();
        self.preedit_text.push_str(text);
        self.preedit_cursor = cursor;
    }

    pub fn update_auxiliary(&mut self, text: String) {
        self.auxiliary_text = text;
    }

    /// Copy the cursor's page out of `table`.
    pub fn update_lookup_table(&mut self, table: &LookupTable) {
        if table.is_empty() {
            self.hide_lookup_table();
            return;
        }
        self.candidates = table
            .current_page_candidates()
            .iter()
            .map(|c| CandidateView {
                text: c.text.clone(),
                foreground: c.foreground,
            })
            .collect();
        self.candidate_cursor = table.cursor_in_page();
        self.lookup_visible = true;
    }

    pub fn hide_lookup_table(&mut self) {
        self.candidates.clear();
        self.candidate_cursor = 0;
        self.lookup_visible = false;
    }

    /// Texts of the visible page.
    pub fn candidate_texts(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Candidate, CandidateKind};

    #[test]
    fn test_clear_keeps_commit() {
        let mut ctx = ImeContext::new();
        ctx.update_preedit("nihao", 5);
        ctx.commit("你好");
        ctx.clear();
        assert!(!ctx.has_visible_state());
        assert!(ctx.has_commit());
        assert_eq!(ctx.take_commit(), "你好");
        assert!(!ctx.has_commit());
    }

    #[test]
    fn test_lookup_page_follows_cursor() {
        let mut table = LookupTable::with_page_size(2);
        table.append_candidate(Candidate::ordinary("你", 0));
        table.append_candidate(Candidate::ordinary("尼", 1));
        table.append_candidate(Candidate::new("妮", 2, CandidateKind::User).with_foreground(0xef));

        let mut ctx = ImeContext::new();
        ctx.update_lookup_table(&table);
        assert_eq!(ctx.candidate_texts(), vec!["你", "尼"]);
        assert!(ctx.lookup_visible);

        table.page_down();
        ctx.update_lookup_table(&table);
        assert_eq!(ctx.candidate_texts(), vec!["妮"]);
        assert_eq!(ctx.candidates[0].foreground, Some(0xef));
        assert_eq!(ctx.candidate_cursor, 0);

        table.clear();
        ctx.update_lookup_table(&table);
        assert!(!ctx.lookup_visible);
        assert!(ctx.candidates.is_empty());
    }
}
