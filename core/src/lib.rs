//! libchinese-editor
//!
//! Candidate editing layer for Pinyin input methods. The crate tracks the raw
//! keystroke text, the edit cursor and a paginated lookup table, and turns key
//! events into edits, cursor moves, candidate selection and commits. Phonetic
//! segmentation and candidate generation live behind [`ConversionGateway`].
//!
//! Public API:
//! - `InputBuffer` - raw pinyin text with a char cursor
//! - `Candidate` / `CandidateKind` - converted text tagged with its provenance
//! - `LookupTable` - paginated candidate chooser with an absolute cursor
//! - `ConversionGateway` - contract of the external conversion engine
//! - `FixtureGateway` - deterministic in-memory gateway for tests and replay
//! - `PhoneticEditor` - key dispatch and the selection/commit protocol
//! - `ImeContext` - what the host reads back after each key
//! - `Config` - page size, display mode, refill strategy, selection keys
//!
//! ```
//! use libchinese_editor::{Config, Editor, FixtureGateway, KeyEvent, PhoneticEditor};
//!
//! let gateway = FixtureGateway::builder()
//!     .syllables(["ni", "hao"])
//!     .phrase("ni'hao", "你好")
//!     .phrase("ni", "你")
//!     .phrase("hao", "好")
//!     .build();
//! let mut editor = PhoneticEditor::new(gateway, Config::default());
//!
//! for ch in "nihao".chars() {
//!     editor.process_key_event(KeyEvent::from_char(ch));
//! }
//! editor.process_key_event(KeyEvent::from_char(' '));
//! assert_eq!(editor.context_mut().take_commit(), "你好");
//! ```
use serde::{Deserialize, Serialize};

pub mod candidate;
pub use candidate::{Candidate, CandidateKind};

pub mod lookup_table;
pub use lookup_table::LookupTable;

pub mod input_buffer;
pub use input_buffer::InputBuffer;

pub mod keys;
pub use keys::{KeyEvent, KeyResult, Modifiers};

pub mod context;
pub use context::{CandidateView, ImeContext};

pub mod gateway;
pub use gateway::{ConversionGateway, FixtureGateway, GatewayError};

pub mod script;
pub use script::{ConverterError, ScriptConverter, TableConverter};

pub mod editor;
pub use editor::{Editor, PhoneticEditor};

/// Which script candidates and commits are displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Simplified,
    Traditional,
}

/// How the lookup table is filled from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefillStrategy {
    /// Materialise every candidate on each state change.
    #[default]
    Eager,
    /// Materialise one page at a time, loading more when navigation reaches
    /// the last loaded candidate.
    Windowed,
}

/// Errors raised while loading or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Editor configuration.
///
/// Read-only from the editor's point of view: the editor copies what it needs
/// at construction. Missing keys in a TOML file take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Candidates per lookup-table page (at least 1).
    pub page_size: usize,

    /// Simplified or traditional display of candidates and commits.
    pub display_mode: DisplayMode,

    /// Eager or windowed lookup-table refill.
    pub refill: RefillStrategy,

    /// Keys selecting candidates on the current page, first char selects the
    /// first candidate.
    pub select_keys: String,

    /// Foreground colour (0xRRGGBB) used to highlight user candidates.
    pub user_candidate_color: u32,

    /// Append "page/total" to the auxiliary text.
    pub show_page_number: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 5,
            display_mode: DisplayMode::Simplified,
            refill: RefillStrategy::Eager,
            select_keys: "123456789".to_string(),
            user_candidate_color: 0x0000_00ef,
            show_page_number: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.page_size = config.page_size.max(1);
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check if a character is a selection key and return its index (0-based).
    pub fn selection_key_index(&self, ch: char) -> Option<usize> {
        self.select_keys.chars().position(|c| c == ch)
    }

    pub fn is_traditional(&self) -> bool {
        self.display_mode == DisplayMode::Traditional
    }
}

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC).
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>()
    }

    /// Byte offset of the char at `char_idx`, or `s.len()` past the end.
    pub fn byte_offset(s: &str, char_idx: usize) -> usize {
        s.char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(s.len())
    }
}
