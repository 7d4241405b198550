//! Deterministic in-memory conversion gateway.
//!
//! `FixtureGateway` stands in for a real conversion engine in tests and in the
//! replay tool. It segments the input by greedy longest match over a fixed
//! syllable list, looks phrases up by apostrophe-joined syllable keys
//! (`"ni'hao"`), offers a whole-sentence n-best candidate at the start of the
//! composition and keeps a small user dictionary that `train` extends and
//! `remove_user_candidate` shrinks.
//!
//! Phonetic offsets are buffer positions, so `phonetic_offset` is the identity
//! clamped to the text length.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{ConversionGateway, GatewayError};
use crate::candidate::{Candidate, CandidateKind};
use crate::ConfigError;

/// Serializable description of a fixture engine.
///
/// ```toml
/// syllables = ["ni", "hao"]
///
/// [phrases]
/// "ni'hao" = ["你好"]
/// ni = ["你", "尼"]
///
/// [user_phrases]
/// hao = ["号"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FixtureData {
    pub syllables: Vec<String>,
    pub phrases: BTreeMap<String, Vec<String>>,
    pub user_phrases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    start: usize,
    end: usize,
    syllable: String,
}

/// A candidate of the current list; `first..last` is its segment span.
#[derive(Debug, Clone)]
struct Entry {
    text: String,
    kind: CandidateKind,
    first: usize,
    last: usize,
    key: String,
}

/// A phrase the user fixed over `first..last`.
#[derive(Debug, Clone)]
struct Fixed {
    first: usize,
    last: usize,
    text: String,
    kind: CandidateKind,
}

#[derive(Debug, Clone)]
pub struct FixtureGateway {
    /// Longest first, for greedy matching
    syllables: Vec<String>,
    phrases: AHashMap<String, Vec<String>>,
    user_phrases: AHashMap<String, Vec<String>>,

    text_len: usize,
    parsed_len: usize,
    segments: Vec<Segment>,
    fixed: Vec<Fixed>,
    candidates: Vec<Entry>,
    sentence: String,
}

impl FixtureGateway {
    pub fn new(data: FixtureData) -> Self {
        let mut syllables: Vec<String> = data
            .syllables
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        syllables.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        syllables.dedup();

        Self {
            syllables,
            phrases: data.phrases.into_iter().collect(),
            user_phrases: data.user_phrases.into_iter().collect(),
            text_len: 0,
            parsed_len: 0,
            segments: Vec::new(),
            fixed: Vec::new(),
            candidates: Vec::new(),
            sentence: String::new(),
        }
    }

    pub fn builder() -> FixtureGatewayBuilder {
        FixtureGatewayBuilder::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        Ok(Self::new(toml::from_str(content)?))
    }

    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    /// User phrases stored under `key`.
    pub fn user_phrases(&self, key: &str) -> &[String] {
        self.user_phrases.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Syllables of the current segmentation.
    pub fn syllables_of_input(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.syllable.as_str()).collect()
    }

    fn segment(&self, text: &str) -> (Vec<Segment>, usize) {
        let chars: Vec<char> = text.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        'outer: while i < chars.len() {
            if chars[i] == '\'' {
                i += 1;
                continue;
            }
            for syllable in &self.syllables {
                let n = syllable.chars().count();
                if i + n <= chars.len() && chars[i..i + n].iter().copied().eq(syllable.chars()) {
                    segments.push(Segment {
                        start: i,
                        end: i + n,
                        syllable: syllable.clone(),
                    });
                    i += n;
                    continue 'outer;
                }
            }
            break;
        }
        (segments, i)
    }

    fn key(&self, first: usize, last: usize) -> String {
        self.segments[first..last]
            .iter()
            .map(|s| s.syllable.as_str())
            .collect::<Vec<_>>()
            .join("'")
    }

    /// First segment not entirely left of `phonetic`.
    fn segment_at(&self, phonetic: usize) -> Option<usize> {
        if phonetic >= self.parsed_len {
            return None;
        }
        self.segments.iter().position(|s| s.end > phonetic)
    }

    fn best_phrase(&self, key: &str) -> Option<&String> {
        self.user_phrases
            .get(key)
            .and_then(|v| v.first())
            .or_else(|| self.phrases.get(key).and_then(|v| v.first()))
    }

    /// Sentence over all segments honouring `fixed`; unconstrained runs take
    /// the longest known phrase, unknown syllables stay as spelled.
    fn guess(&self, fixed: &[Fixed]) -> String {
        let n = self.segments.len();
        let mut out = String::new();
        let mut i = 0;

        while i < n {
            if let Some(f) = fixed.iter().find(|f| f.first == i) {
                out.push_str(&f.text);
                i = f.last;
                continue;
            }
            let limit = fixed
                .iter()
                .filter(|f| f.first > i)
                .map(|f| f.first)
                .min()
                .unwrap_or(n);
            let step = (i + 1..=limit)
                .rev()
                .find_map(|j| self.best_phrase(&self.key(i, j)).map(|p| (j, p)));
            match step {
                Some((j, phrase)) => {
                    out.push_str(phrase);
                    i = j;
                }
                None => {
                    out.push_str(&self.segments[i].syllable);
                    i += 1;
                }
            }
        }
        out
    }

    fn boundaries(&self) -> Vec<usize> {
        let mut b = vec![0];
        for s in &self.segments {
            b.push(s.start);
            b.push(s.end);
        }
        b.extend(self.parsed_len..=self.text_len);
        b.sort_unstable();
        b.dedup();
        b
    }
}

impl ConversionGateway for FixtureGateway {
    fn reset(&mut self) {
        self.text_len = 0;
        self.parsed_len = 0;
        self.segments.clear();
        self.fixed.clear();
        self.candidates.clear();
        self.sentence.clear();
    }

    fn parse(&mut self, text: &str) -> Result<usize, GatewayError> {
        let (segments, parsed) = self.segment(text);
        if segments != self.segments {
            self.fixed.clear();
        }
        self.segments = segments;
        self.parsed_len = parsed;
        self.text_len = text.chars().count();
        self.candidates.clear();
        self.sentence = self.guess(&self.fixed);
        trace!(text, parsed, segments = self.segments.len(), "fixture parse");
        Ok(parsed)
    }

    fn parsed_len(&self) -> usize {
        self.parsed_len
    }

    fn guess_candidates(&mut self, phonetic: usize) -> Result<(), GatewayError> {
        self.candidates.clear();
        let Some(first) = self.segment_at(phonetic) else {
            return Ok(());
        };
        let n = self.segments.len();

        if first == 0 && n > 1 {
            let text = self.guess(&[]);
            let key = self.key(0, n);
            self.candidates.push(Entry {
                text,
                kind: CandidateKind::NBest { rank: 0 },
                first: 0,
                last: n,
                key,
            });
        }

        for last in (first + 1..=n).rev() {
            let key = self.key(first, last);
            for (kind, table) in [
                (CandidateKind::User, &self.user_phrases),
                (CandidateKind::Ordinary, &self.phrases),
            ] {
                let Some(list) = table.get(&key) else {
                    continue;
                };
                for text in list {
                    if self.candidates.iter().any(|c| &c.text == text) {
                        continue;
                    }
                    self.candidates.push(Entry {
                        text: text.clone(),
                        kind,
                        first,
                        last,
                        key: key.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    fn candidate(&self, index: usize) -> Result<Candidate, GatewayError> {
        self.candidates
            .get(index)
            .map(|e| Candidate::new(e.text.clone(), index, e.kind))
            .ok_or(GatewayError::InvalidIndex {
                index,
                count: self.candidates.len(),
            })
    }

    fn choose_candidate(&mut self, phonetic: usize, index: usize) -> Result<usize, GatewayError> {
        let entry = self
            .candidates
            .get(index)
            .cloned()
            .ok_or(GatewayError::InvalidIndex {
                index,
                count: self.candidates.len(),
            })?;
        let n = self.segments.len();

        if !entry.kind.is_nbest() && self.segment_at(phonetic) != Some(entry.first) {
            return Err(GatewayError::InvalidOffset(phonetic));
        }
        let (first, last) = (entry.first, entry.last);

        self.fixed.retain(|f| f.last <= first || f.first >= last);
        self.fixed.push(Fixed {
            first,
            last,
            text: entry.text,
            kind: entry.kind,
        });
        self.fixed.sort_by_key(|f| f.first);
        self.sentence = self.guess(&self.fixed);

        if last == n {
            Ok(self.text_len)
        } else {
            Ok(self.segments[last].start)
        }
    }

    fn guess_sentence(&mut self) -> Result<(), GatewayError> {
        self.sentence = self.guess(&self.fixed);
        Ok(())
    }

    fn sentence(&self, nbest_rank: Option<u8>) -> Option<String> {
        if self.segments.is_empty() {
            return None;
        }
        match nbest_rank {
            None | Some(0) => Some(self.sentence.clone()),
            Some(_) => None,
        }
    }

    fn remove_user_candidate(&mut self, index: usize) -> Result<(), GatewayError> {
        let entry = self.candidates.get(index).ok_or(GatewayError::InvalidIndex {
            index,
            count: self.candidates.len(),
        })?;
        if !entry.kind.is_user() {
            return Err(GatewayError::NotUserCandidate(index));
        }
        let (key, text) = (entry.key.clone(), entry.text.clone());
        if let Some(list) = self.user_phrases.get_mut(&key) {
            list.retain(|p| p != &text);
            if list.is_empty() {
                self.user_phrases.remove(&key);
            }
        }
        self.candidates.remove(index);
        Ok(())
    }

    fn train(&mut self) {
        for f in &self.fixed {
            if f.kind != CandidateKind::Ordinary || f.last - f.first < 2 {
                continue;
            }
            let key = self.segments[f.first..f.last]
                .iter()
                .map(|s| s.syllable.as_str())
                .collect::<Vec<_>>()
                .join("'");
            let list = self.user_phrases.entry(key).or_default();
            if !list.contains(&f.text) {
                list.push(f.text.clone());
            }
        }
    }

    fn phonetic_offset(&self, cursor: usize) -> usize {
        cursor.min(self.text_len)
    }

    fn buffer_offset(&self, phonetic: usize) -> Option<usize> {
        if phonetic > self.text_len {
            return None;
        }
        match self.segment_at(phonetic).map(|i| &self.segments[i]) {
            Some(seg) if seg.start <= phonetic => Some(seg.start),
            _ => Some(phonetic),
        }
    }

    fn left_boundary(&self, phonetic: usize) -> usize {
        self.boundaries()
            .into_iter()
            .rev()
            .find(|&b| b < phonetic)
            .unwrap_or(0)
    }

    fn right_boundary(&self, phonetic: usize) -> usize {
        self.boundaries()
            .into_iter()
            .find(|&b| b > phonetic)
            .unwrap_or(self.text_len)
    }
}

/// Builder for small in-code fixtures.
#[derive(Debug, Default)]
pub struct FixtureGatewayBuilder {
    data: FixtureData,
}

impl FixtureGatewayBuilder {
    pub fn syllables<I, S>(mut self, syllables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data.syllables.extend(syllables.into_iter().map(Into::into));
        self
    }

    /// Built-in phrase for an apostrophe-joined syllable key.
    pub fn phrase(mut self, key: &str, text: &str) -> Self {
        self.data
            .phrases
            .entry(key.to_string())
            .or_default()
            .push(text.to_string());
        self
    }

    pub fn user_phrase(mut self, key: &str, text: &str) -> Self {
        self.data
            .user_phrases
            .entry(key.to_string())
            .or_default()
            .push(text.to_string());
        self
    }

    pub fn build(self) -> FixtureGateway {
        FixtureGateway::new(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> FixtureGateway {
        FixtureGateway::builder()
            .syllables(["ni", "hao", "zhong", "guo", "a", "n"])
            .phrase("ni'hao", "你好")
            .phrase("ni", "你")
            .phrase("ni", "尼")
            .phrase("hao", "好")
            .phrase("zhong'guo", "中国")
            .phrase("zhong", "中")
            .phrase("guo", "国")
            .user_phrase("hao", "号")
            .build()
    }

    fn texts(g: &FixtureGateway) -> Vec<String> {
        (0..g.candidate_count())
            .map(|i| g.candidate(i).unwrap().text)
            .collect()
    }

    #[test]
    fn test_greedy_segmentation() {
        let mut g = gateway();
        assert_eq!(g.parse("nihao").unwrap(), 5);
        assert_eq!(g.syllables_of_input(), vec!["ni", "hao"]);

        assert_eq!(g.parse("ni'hao").unwrap(), 6);
        assert_eq!(g.syllables_of_input(), vec!["ni", "hao"]);

        assert_eq!(g.parse("nihaox").unwrap(), 5);
        assert_eq!(g.parsed_len(), 5);
    }

    #[test]
    fn test_candidates_at_start_include_nbest() {
        let mut g = gateway();
        g.parse("nihao").unwrap();
        g.guess_candidates(0).unwrap();
        assert_eq!(texts(&g), vec!["你好", "你", "尼"]);
        assert_eq!(g.candidate(0).unwrap().kind, CandidateKind::NBest { rank: 0 });
        assert_eq!(g.candidate(1).unwrap().kind, CandidateKind::Ordinary);
    }

    #[test]
    fn test_candidates_mid_input_list_user_first() {
        let mut g = gateway();
        g.parse("nihao").unwrap();
        g.guess_candidates(2).unwrap();
        assert_eq!(texts(&g), vec!["号", "好"]);
        assert_eq!(g.candidate(0).unwrap().kind, CandidateKind::User);

        g.guess_candidates(3).unwrap();
        assert_eq!(texts(&g), vec!["号", "好"]);
    }

    #[test]
    fn test_no_candidates_past_parsed_text() {
        let mut g = gateway();
        g.parse("nihaoq").unwrap();
        g.guess_candidates(5).unwrap();
        assert_eq!(g.candidate_count(), 0);
        assert!(matches!(g.candidate(0), Err(GatewayError::InvalidIndex { .. })));
    }

    #[test]
    fn test_choose_then_guess_sentence() {
        let mut g = gateway();
        g.parse("nihao").unwrap();
        g.guess_candidates(0).unwrap();
        assert_eq!(g.choose_candidate(0, 2).unwrap(), 2);
        g.guess_sentence().unwrap();
        assert_eq!(g.sentence(None).as_deref(), Some("尼号"));

        g.guess_candidates(2).unwrap();
        assert_eq!(g.choose_candidate(2, 1).unwrap(), 5);
        assert_eq!(g.sentence(None).as_deref(), Some("尼好"));
    }

    #[test]
    fn test_choose_rejects_bad_index_and_offset() {
        let mut g = gateway();
        g.parse("nihao").unwrap();
        g.guess_candidates(0).unwrap();
        assert!(matches!(
            g.choose_candidate(0, 9),
            Err(GatewayError::InvalidIndex { index: 9, count: 3 })
        ));
        assert_eq!(g.choose_candidate(2, 1), Err(GatewayError::InvalidOffset(2)));
    }

    #[test]
    fn test_reparse_keeps_choices_only_for_same_segments() {
        let mut g = gateway();
        g.parse("nihao").unwrap();
        g.guess_candidates(0).unwrap();
        g.choose_candidate(0, 2).unwrap();

        g.parse("nihao").unwrap();
        assert_eq!(g.sentence(None).as_deref(), Some("尼号"));

        g.parse("nihaoa").unwrap();
        assert_eq!(g.sentence(None).as_deref(), Some("你好a"));
    }

    #[test]
    fn test_boundaries_cover_segments_and_tail() {
        let mut g = gateway();
        g.parse("ni'haoxy").unwrap();
        assert_eq!(g.left_boundary(8), 7);
        assert_eq!(g.left_boundary(7), 6);
        assert_eq!(g.left_boundary(6), 3);
        assert_eq!(g.left_boundary(3), 2);
        assert_eq!(g.left_boundary(0), 0);
        assert_eq!(g.right_boundary(0), 2);
        assert_eq!(g.right_boundary(4), 6);
        assert_eq!(g.right_boundary(8), 8);
    }

    #[test]
    fn test_buffer_offset_snaps_to_segment_start() {
        let mut g = gateway();
        g.parse("zhongguo").unwrap();
        assert_eq!(g.buffer_offset(5), Some(5));
        assert_eq!(g.buffer_offset(6), Some(5));
        assert_eq!(g.buffer_offset(8), Some(8));
        assert_eq!(g.buffer_offset(9), None);
        assert_eq!(g.phonetic_offset(42), 8);
    }

    #[test]
    fn test_remove_user_candidate_only_for_user_entries() {
        let mut g = gateway();
        g.parse("hao").unwrap();
        g.guess_candidates(0).unwrap();
        assert_eq!(g.remove_user_candidate(1), Err(GatewayError::NotUserCandidate(1)));
        g.remove_user_candidate(0).unwrap();
        assert!(g.user_phrases("hao").is_empty());
        g.guess_candidates(0).unwrap();
        assert_eq!(texts(&g), vec!["好"]);
    }

    #[test]
    fn test_train_learns_multi_segment_choices() {
        let mut g = FixtureGateway::builder()
            .syllables(["zhong", "guo", "ren"])
            .phrase("zhong'guo'ren", "中国人")
            .phrase("zhong'guo", "中国")
            .phrase("zhong", "中")
            .build();
        g.parse("zhongguoren").unwrap();
        g.guess_candidates(0).unwrap();
        assert_eq!(texts(&g), vec!["中国人", "中国", "中"]);

        assert_eq!(g.choose_candidate(0, 1).unwrap(), 8);
        g.train();
        assert_eq!(g.user_phrases("zhong'guo"), ["中国".to_string()]);

        g.guess_candidates(0).unwrap();
        assert_eq!(g.candidate(1).unwrap().kind, CandidateKind::User);
    }

    #[test]
    fn test_train_ignores_single_segment_choices() {
        let mut g = gateway();
        g.parse("nihao").unwrap();
        g.guess_candidates(0).unwrap();
        g.choose_candidate(0, 1).unwrap();
        g.train();
        assert!(g.user_phrases("ni").is_empty());
    }

    #[test]
    fn test_reset_clears_composition_but_keeps_dictionaries() {
        let mut g = gateway();
        g.parse("nihao").unwrap();
        g.guess_candidates(0).unwrap();
        g.reset();
        assert_eq!(g.candidate_count(), 0);
        assert_eq!(g.parsed_len(), 0);
        assert!(g.sentence(None).is_none());
        assert_eq!(g.user_phrases("hao"), ["号".to_string()]);
    }

    #[test]
    fn test_loads_from_toml() {
        let g = FixtureGateway::from_toml_str(
            r#"
            syllables = ["ni", "hao"]
            [phrases]
            "ni'hao" = ["你好"]
            [user_phrases]
            hao = ["号"]
            "#,
        )
        .unwrap();
        assert_eq!(g.user_phrases("hao"), ["号".to_string()]);
        assert_eq!(g.phrases.get("ni'hao").map(Vec::len), Some(1));
    }
}
