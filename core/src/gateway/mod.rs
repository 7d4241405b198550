//! Conversion gateway: the contract between the editor and the phonetic
//! conversion engine.
//!
//! The engine owns segmentation, sentence guessing, candidate generation and
//! the user dictionary. The editor only talks to it through this trait and
//! treats every error as "no candidates, keep prior state".
//!
//! Offsets:
//! - *buffer offsets* are char offsets into the raw input text;
//! - *phonetic offsets* are engine-defined positions addressing segments.
//!   `phonetic_offset` and `buffer_offset` convert between the two.

pub mod fixture;

pub use fixture::{FixtureData, FixtureGateway, FixtureGatewayBuilder};

use crate::candidate::Candidate;

/// Failures reported by a conversion engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("no candidates available")]
    NoCandidates,
    #[error("candidate index {index} out of range ({count} candidates)")]
    InvalidIndex { index: usize, count: usize },
    #[error("candidate {0} is not a user candidate")]
    NotUserCandidate(usize),
    #[error("phonetic offset {0} does not address a segment")]
    InvalidOffset(usize),
    #[error("engine error: {0}")]
    Engine(String),
}

/// Operations the editor requires from the conversion engine.
///
/// Implementations are owned by exactly one editor session and are called
/// synchronously from the key handler.
pub trait ConversionGateway {
    /// Drop all conversion state for the current composition.
    fn reset(&mut self);

    /// Re-segment `text`. Returns how many chars the engine recognised; the
    /// rest of the text is carried verbatim on commit.
    fn parse(&mut self, text: &str) -> Result<usize, GatewayError>;

    /// Chars recognised by the last `parse`.
    fn parsed_len(&self) -> usize;

    /// Compute the candidate list for the segment at `phonetic`.
    fn guess_candidates(&mut self, phonetic: usize) -> Result<(), GatewayError>;

    /// Size of the candidate list computed by `guess_candidates`.
    fn candidate_count(&self) -> usize;

    /// Candidate at `index`, with its engine text and kind.
    fn candidate(&self, index: usize) -> Result<Candidate, GatewayError>;

    /// Fix candidate `index` at `phonetic`. Returns the phonetic offset just
    /// after the chosen phrase.
    fn choose_candidate(&mut self, phonetic: usize, index: usize) -> Result<usize, GatewayError>;

    /// Re-run sentence disambiguation over the segments not yet chosen.
    fn guess_sentence(&mut self) -> Result<(), GatewayError>;

    /// Converted sentence; `Some(rank)` asks for an n-best alternative.
    fn sentence(&self, nbest_rank: Option<u8>) -> Option<String>;

    /// Remove the user-dictionary phrase behind candidate `index`.
    fn remove_user_candidate(&mut self, index: usize) -> Result<(), GatewayError>;

    /// Learn from the choices of the composition about to be committed.
    fn train(&mut self);

    /// Phonetic offset of the buffer cursor.
    fn phonetic_offset(&self, cursor: usize) -> usize;

    /// Buffer offset where the segment at `phonetic` begins.
    fn buffer_offset(&self, phonetic: usize) -> Option<usize>;

    /// Buffer offset of the nearest segment boundary left of `phonetic`.
    fn left_boundary(&self, phonetic: usize) -> usize;

    /// Buffer offset of the nearest segment boundary right of `phonetic`.
    fn right_boundary(&self, phonetic: usize) -> usize;
}
