//! Candidate types for the lookup table.
//!
//! A `Candidate` is one converted-text choice produced by the conversion
//! gateway, tagged once with its provenance so selection can branch on a
//! plain enum instead of asking the gateway again.

use serde::{Deserialize, Serialize};

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CandidateKind {
    /// Built-in phrase for the segment(s) at the lookup cursor.
    Ordinary,
    /// Phrase learned into the user dictionary; removable with Ctrl+D.
    User,
    /// Whole-composition sentence guess; `rank` picks among the n-best list.
    NBest { rank: u8 },
}

impl CandidateKind {
    pub fn is_user(self) -> bool {
        matches!(self, CandidateKind::User)
    }

    pub fn is_nbest(self) -> bool {
        matches!(self, CandidateKind::NBest { .. })
    }
}

/// A single displayable candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Display text (already script-converted when shown in a table).
    pub text: String,
    /// Index of this candidate in the gateway's current candidate list.
    pub index: usize,
    pub kind: CandidateKind,
    /// Foreground colour attribute (0xRRGGBB), set for highlighted entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<u32>,
}

impl Candidate {
    pub fn new<T: Into<String>>(text: T, index: usize, kind: CandidateKind) -> Self {
        Candidate {
            text: text.into(),
            index,
            kind,
            foreground: None,
        }
    }

    pub fn ordinary<T: Into<String>>(text: T, index: usize) -> Self {
        Self::new(text, index, CandidateKind::Ordinary)
    }

    /// Attach a foreground colour attribute.
    pub fn with_foreground(mut self, color: u32) -> Self {
        self.foreground = Some(color);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(CandidateKind::User.is_user());
        assert!(!CandidateKind::Ordinary.is_user());
        assert!(CandidateKind::NBest { rank: 0 }.is_nbest());
        assert!(!CandidateKind::User.is_nbest());
    }

    #[test]
    fn test_foreground_attribute() {
        let c = Candidate::new("你好", 3, CandidateKind::User).with_foreground(0xef);
        assert_eq!(c.text, "你好");
        assert_eq!(c.index, 3);
        assert_eq!(c.foreground, Some(0xef));
        assert_eq!(Candidate::ordinary("好", 0).foreground, None);
    }

    #[test]
    fn test_kind_serializes_with_tag() {
        let json = serde_json::to_string(&CandidateKind::NBest { rank: 2 }).unwrap();
        assert_eq!(json, r#"{"type":"n_best","rank":2}"#);
    }
}
