//! Editor trait and the phonetic editor.
//!
//! An editor consumes host key events, keeps its composition state and
//! publishes what the host should display through an [`ImeContext`].

pub mod phonetic;

pub use phonetic::PhoneticEditor;

use crate::context::ImeContext;
use crate::keys::{KeyEvent, KeyResult};

/// Host-facing editor interface.
///
/// # Example
///
/// ```
/// use libchinese_editor::{Config, Editor, FixtureGateway, KeyEvent, KeyResult, PhoneticEditor};
///
/// let gateway = FixtureGateway::builder().syllables(["a"]).phrase("a", "啊").build();
/// let mut editor = PhoneticEditor::new(gateway, Config::default());
///
/// assert_eq!(editor.process_key_event(KeyEvent::from_char('a')), KeyResult::Handled);
/// assert_eq!(editor.context().preedit_text, "a");
/// ```
pub trait Editor {
    /// Process one key event. `NotHandled` means the host should pass the key
    /// on to the application.
    fn process_key_event(&mut self, event: KeyEvent) -> KeyResult;

    /// The host clicked row `index` of the visible lookup-table page.
    fn candidate_clicked(&mut self, index: usize) -> bool;

    /// Drop the composition and any pending commit text, returning to the
    /// state of a freshly built editor.
    fn reset(&mut self);

    fn context(&self) -> &ImeContext;

    fn context_mut(&mut self) -> &mut ImeContext;

    /// Name for logging.
    fn name(&self) -> &'static str;
}
