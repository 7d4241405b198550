//! Phonetic editor for pinyin input.
//!
//! The editor owns the raw input buffer, the lookup table and one gateway
//! session. Edits re-parse the buffer, then ask the gateway for candidates at
//! the lookup cursor and refill the table. Navigation keys only move the table
//! cursor, loading another page first when the refill strategy is windowed.
//!
//! Selection follows the candidate kind: an n-best candidate commits the whole
//! composition, an ordinary or user candidate fixes one span and moves the
//! edit cursor to the next unresolved segment, committing once the last
//! segment is chosen.

use tracing::{debug, trace, warn};

use super::Editor;
use crate::candidate::{Candidate, CandidateKind};
use crate::context::ImeContext;
use crate::gateway::ConversionGateway;
use crate::input_buffer::InputBuffer;
use crate::keys::{keysym, KeyEvent, KeyResult, Modifiers};
use crate::lookup_table::LookupTable;
use crate::script::{ScriptConverter, TableConverter};
use crate::utils::byte_offset;
use crate::{Config, RefillStrategy};

/// Longest raw input accepted, in chars. Further letters are swallowed.
pub const MAX_INPUT_LEN: usize = 64;

/// Pinyin editor over a conversion gateway `G`, displaying traditional text
/// through `C` when configured.
pub struct PhoneticEditor<G: ConversionGateway, C: ScriptConverter = TableConverter> {
    gateway: G,
    buffer: InputBuffer,
    table: LookupTable,
    config: Config,
    converter: C,
    context: ImeContext,
}

impl<G: ConversionGateway> PhoneticEditor<G> {
    /// Create an editor with the built-in simplified/traditional table.
    pub fn new(gateway: G, config: Config) -> Self {
        Self::with_converter(gateway, config, TableConverter::builtin())
    }
}

impl<G: ConversionGateway, C: ScriptConverter> PhoneticEditor<G, C> {
    pub fn with_converter(gateway: G, config: Config, converter: C) -> Self {
        let table = LookupTable::with_page_size(config.page_size);
        Self {
            gateway,
            buffer: InputBuffer::new(),
            table,
            config,
            converter,
            context: ImeContext::new(),
        }
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn lookup_table(&self) -> &LookupTable {
        &self.table
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Whether no composition is in progress.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Select the candidate at absolute index `index` of the gateway's list.
    ///
    /// Returns false, changing nothing, when the index is out of range or the
    /// gateway refuses the choice.
    pub fn select_candidate(&mut self, index: usize) -> bool {
        let count = self.gateway.candidate_count();
        if index >= count {
            debug!(index, count, "selection out of range");
            return false;
        }
        let candidate = match self.gateway.candidate(index) {
            Ok(candidate) => candidate,
            Err(err) => {
                warn!(index, %err, "candidate lookup failed");
                return false;
            }
        };
        debug!(index, text = %candidate.text, kind = ?candidate.kind, "select candidate");

        match candidate.kind {
            CandidateKind::NBest { rank } => {
                // n-best sentences always start at the beginning of the input
                if let Err(err) = self.gateway.choose_candidate(0, index) {
                    warn!(index, %err, "choosing n-best candidate failed");
                    return false;
                }
                self.commit_sentence(Some(rank));
            }
            CandidateKind::Ordinary | CandidateKind::User => {
                let lookup_cursor = self.lookup_cursor();
                let next = match self.gateway.choose_candidate(lookup_cursor, index) {
                    Ok(next) => next,
                    Err(err) => {
                        warn!(index, lookup_cursor, %err, "choosing candidate failed");
                        return false;
                    }
                };
                if let Err(err) = self.gateway.guess_sentence() {
                    warn!(%err, "sentence guess failed");
                }

                if next >= self.input_end() {
                    self.commit_sentence(None);
                    return true;
                }
                match self.gateway.buffer_offset(next) {
                    Some(pos) => {
                        self.buffer.set_cursor(pos);
                    }
                    None => warn!(next, "no buffer offset for phonetic position"),
                }
                self.update();
            }
        }
        true
    }

    /// Select row `index` of the cursor's page.
    pub fn select_candidate_in_page(&mut self, index: usize) -> bool {
        let page_size = self.table.page_size();
        if index >= page_size {
            debug!(index, page_size, "page selection out of range");
            return false;
        }
        self.select_candidate(self.table.page_start() + index)
    }

    fn dispatch(&mut self, event: KeyEvent) -> KeyResult {
        let modifiers = event.modifiers.filtered();
        match event.printable() {
            Some(' ') => self.process_space(modifiers),
            Some(ch) if modifiers.is_empty() => self.process_char(ch),
            _ => self.process_function_key(event.keyval, modifiers),
        }
    }

    fn process_char(&mut self, ch: char) -> KeyResult {
        if ch.is_ascii_lowercase() || (ch == '\'' && !self.buffer.is_empty()) {
            return self.insert(ch);
        }
        if self.buffer.is_empty() {
            return KeyResult::NotHandled;
        }
        if let Some(index) = self.config.selection_key_index(ch) {
            self.select_candidate_in_page(index);
        }
        KeyResult::Handled
    }

    fn process_space(&mut self, modifiers: Modifiers) -> KeyResult {
        if self.buffer.is_empty() {
            return KeyResult::NotHandled;
        }
        if !modifiers.is_empty() {
            return KeyResult::Handled;
        }

        match self.table.selected_candidate() {
            Some(candidate) => {
                let index = candidate.index;
                self.select_candidate(index);
            }
            None => self.commit_raw(),
        }
        KeyResult::Handled
    }

    fn process_function_key(&mut self, keyval: u32, modifiers: Modifiers) -> KeyResult {
        if self.buffer.is_empty() {
            return KeyResult::NotHandled;
        }
        if !modifiers.is_empty() && modifiers != Modifiers::CONTROL {
            return KeyResult::Handled;
        }

        if modifiers.is_empty() {
            match keyval {
                keysym::RETURN | keysym::KP_ENTER => self.commit_raw(),
                keysym::BACKSPACE => {
                    self.remove_char_before();
                }
                keysym::DELETE | keysym::KP_DELETE => {
                    self.remove_char_after();
                }
                keysym::LEFT | keysym::KP_LEFT => {
                    self.move_cursor_left();
                }
                keysym::RIGHT | keysym::KP_RIGHT => {
                    self.move_cursor_right();
                }
                keysym::HOME | keysym::KP_HOME => {
                    self.move_cursor_to_begin();
                }
                keysym::END | keysym::KP_END => {
                    self.move_cursor_to_end();
                }
                keysym::UP | keysym::KP_UP => {
                    self.cursor_up();
                }
                keysym::DOWN | keysym::KP_DOWN => {
                    self.cursor_down();
                }
                keysym::PAGE_UP | keysym::KP_PAGE_UP => {
                    self.page_up();
                }
                keysym::PAGE_DOWN | keysym::KP_PAGE_DOWN | keysym::TAB => {
                    self.page_down();
                }
                keysym::ESCAPE => self.reset_session(),
                _ => {}
            }
        } else {
            match keyval {
                keysym::RETURN | keysym::KP_ENTER => self.commit_raw(),
                keysym::BACKSPACE => {
                    self.remove_word_before();
                }
                keysym::DELETE | keysym::KP_DELETE => {
                    self.remove_word_after();
                }
                keysym::LEFT | keysym::KP_LEFT => {
                    self.move_cursor_left_by_word();
                }
                keysym::RIGHT | keysym::KP_RIGHT => {
                    self.move_cursor_right_by_word();
                }
                keysym::LOWER_D | keysym::UPPER_D => {
                    self.remove_user_candidate();
                }
                _ => {}
            }
        }
        KeyResult::Handled
    }

    fn insert(&mut self, ch: char) -> KeyResult {
        if self.buffer.len() >= MAX_INPUT_LEN {
            debug!(len = self.buffer.len(), "input full, key dropped");
            return KeyResult::Handled;
        }
        self.buffer.insert_char(ch);
        self.text_changed();
        KeyResult::Handled
    }

    /// Re-parse and refresh after the buffer text changed. An emptied buffer
    /// ends the composition.
    fn text_changed(&mut self) {
        if self.buffer.is_empty() {
            self.reset_session();
            return;
        }
        self.update_phonetic();
        self.update();
    }

    fn update_phonetic(&mut self) {
        match self.gateway.parse(self.buffer.text()) {
            Ok(parsed) => trace!(text = self.buffer.text(), parsed, "parsed input"),
            Err(err) => warn!(%err, "parse failed"),
        }
    }

    fn remove_char_before(&mut self) -> bool {
        if !self.buffer.delete_before() {
            return false;
        }
        self.text_changed();
        true
    }

    fn remove_char_after(&mut self) -> bool {
        if !self.buffer.delete_after() {
            return false;
        }
        self.text_changed();
        true
    }

    fn remove_word_before(&mut self) -> bool {
        let cursor = self.buffer.cursor();
        if cursor == 0 {
            return false;
        }
        let left = self.cursor_left_by_word();
        if left >= cursor || !self.buffer.erase(left, cursor - left) {
            return false;
        }
        self.text_changed();
        true
    }

    fn remove_word_after(&mut self) -> bool {
        if self.buffer.cursor_at_end() {
            return false;
        }
        let cursor = self.buffer.cursor();
        let right = self.cursor_right_by_word().min(self.buffer.len());
        if right <= cursor || !self.buffer.erase(cursor, right - cursor) {
            return false;
        }
        self.text_changed();
        true
    }

    fn move_cursor_left(&mut self) -> bool {
        if !self.buffer.move_left() {
            return false;
        }
        self.update();
        true
    }

    fn move_cursor_right(&mut self) -> bool {
        if !self.buffer.move_right() {
            return false;
        }
        self.update();
        true
    }

    fn move_cursor_to_begin(&mut self) -> bool {
        if !self.buffer.move_to_start() {
            return false;
        }
        self.update();
        true
    }

    fn move_cursor_to_end(&mut self) -> bool {
        if !self.buffer.move_to_end() {
            return false;
        }
        self.update();
        true
    }

    fn move_cursor_left_by_word(&mut self) -> bool {
        if self.buffer.cursor() == 0 {
            return false;
        }
        let left = self.cursor_left_by_word();
        if !self.buffer.set_cursor(left) {
            return false;
        }
        self.update();
        true
    }

    fn move_cursor_right_by_word(&mut self) -> bool {
        if self.buffer.cursor_at_end() {
            return false;
        }
        let right = self.cursor_right_by_word().min(self.buffer.len());
        if !self.buffer.set_cursor(right) {
            return false;
        }
        self.update();
        true
    }

    fn cursor_left_by_word(&self) -> usize {
        let offset = self.gateway.phonetic_offset(self.buffer.cursor());
        self.gateway.left_boundary(offset)
    }

    fn cursor_right_by_word(&self) -> usize {
        let offset = self.gateway.phonetic_offset(self.buffer.cursor());
        self.gateway.right_boundary(offset)
    }

    fn cursor_up(&mut self) -> bool {
        if !self.table.cursor_up() {
            return false;
        }
        self.update_lookup_table_fast();
        true
    }

    fn cursor_down(&mut self) -> bool {
        if self.table.cursor_on_last() {
            self.fill_lookup_table();
        }
        if !self.table.cursor_down() {
            return false;
        }
        self.update_lookup_table_fast();
        true
    }

    fn page_up(&mut self) -> bool {
        if !self.table.page_up() {
            return false;
        }
        self.update_lookup_table_fast();
        true
    }

    fn page_down(&mut self) -> bool {
        if self.table.on_last_page() {
            self.fill_lookup_table();
        }
        if !self.table.page_down() {
            return false;
        }
        self.update_lookup_table_fast();
        true
    }

    fn remove_user_candidate(&mut self) -> bool {
        let Some(candidate) = self.table.selected_candidate() else {
            return false;
        };
        if !candidate.kind.is_user() {
            return false;
        }
        let index = candidate.index;
        if let Err(err) = self.gateway.remove_user_candidate(index) {
            warn!(index, %err, "removing user candidate failed");
            return false;
        }
        debug!(index, "removed user candidate");
        self.update_phonetic();
        self.update();
        true
    }

    /// Phonetic offset of the end of the input.
    fn input_end(&self) -> usize {
        self.gateway.phonetic_offset(self.buffer.len())
    }

    /// Where candidates are looked up: the cursor's phonetic offset, or the
    /// start when the cursor is at the end so the whole input is offered.
    fn lookup_cursor(&self) -> usize {
        let cursor = self.gateway.phonetic_offset(self.buffer.cursor());
        if cursor == self.input_end() {
            0
        } else {
            cursor
        }
    }

    fn update(&mut self) {
        let lookup_cursor = self.lookup_cursor();
        let guessed = match self.gateway.guess_candidates(lookup_cursor) {
            Ok(()) => true,
            Err(err) => {
                warn!(lookup_cursor, %err, "candidate guess failed");
                false
            }
        };

        self.table.clear();
        if guessed {
            self.fill_lookup_table();
        }
        self.context.update_lookup_table(&self.table);
        self.update_preedit_text();
        self.update_auxiliary_text();
    }

    /// Redraw after a table cursor move without asking the gateway again.
    fn update_lookup_table_fast(&mut self) {
        self.context.update_lookup_table(&self.table);
        self.update_preedit_text();
        self.update_auxiliary_text();
    }

    /// Load the next batch of candidates: everything when eager, one page
    /// when windowed. Returns how many were appended.
    fn fill_lookup_table(&mut self) -> usize {
        let total = self.gateway.candidate_count();
        let start = self.table.len();
        let end = match self.config.refill {
            RefillStrategy::Eager => total,
            RefillStrategy::Windowed => (start + self.table.page_size()).min(total),
        };

        for index in start..end {
            match self.gateway.candidate(index) {
                Ok(candidate) => {
                    let candidate = self.display_candidate(candidate);
                    self.table.append_candidate(candidate);
                }
                Err(err) => {
                    warn!(index, %err, "candidate lookup failed");
                    break;
                }
            }
        }
        let loaded = self.table.len() - start;
        trace!(start, loaded, total, "filled lookup table");
        loaded
    }

    fn display_candidate(&self, mut candidate: Candidate) -> Candidate {
        if self.config.is_traditional() {
            candidate.text = self.converter.simp_to_trad(&candidate.text);
        }
        if candidate.kind.is_user() {
            candidate = candidate.with_foreground(self.config.user_candidate_color);
        }
        candidate
    }

    fn update_preedit_text(&mut self) {
        self.context.update_preedit(self.buffer.text(), self.buffer.cursor());
    }

    fn update_auxiliary_text(&mut self) {
        if self.buffer.is_empty() {
            self.context.update_auxiliary(String::new());
            return;
        }
        let text = self.buffer.text();
        let at = byte_offset(text, self.buffer.cursor());
        let mut aux = format!("{}|{}", &text[..at], &text[at..]);

        if self.config.show_page_number && !self.table.is_empty() {
            let pages = self
                .gateway
                .candidate_count()
                .div_ceil(self.table.page_size())
                .max(1);
            aux.push_str(&format!(" {}/{}", self.table.current_page() + 1, pages));
        }
        self.context.update_auxiliary(aux);
    }

    /// Commit the raw input verbatim and end the composition.
    fn commit_raw(&mut self) {
        let text = self.buffer.text().to_string();
        debug!(%text, "commit raw input");
        self.context.commit(&text);
        self.reset_session();
    }

    /// Commit the converted sentence followed by the unparsed tail, train the
    /// gateway on the choices and end the composition.
    fn commit_sentence(&mut self, nbest_rank: Option<u8>) {
        let parsed = self.gateway.parsed_len().min(self.buffer.len());
        let mut text = match self.gateway.sentence(nbest_rank) {
            Some(mut sentence) => {
                sentence.push_str(self.buffer.tail(parsed));
                sentence
            }
            None => self.buffer.text().to_string(),
        };
        if self.config.is_traditional() {
            text = self.converter.simp_to_trad(&text);
        }
        debug!(%text, ?nbest_rank, "commit sentence");

        self.gateway.train();
        self.context.commit(&text);
        self.reset_session();
    }

    fn reset_session(&mut self) {
        self.buffer.clear();
        self.table.clear();
        self.gateway.reset();
        self.context.clear();
    }
}

impl<G: ConversionGateway, C: ScriptConverter> Editor for PhoneticEditor<G, C> {
    fn process_key_event(&mut self, event: KeyEvent) -> KeyResult {
        if event.is_release() {
            return KeyResult::NotHandled;
        }
        let result = self.dispatch(event);
        debug!(
            keyval = event.keyval,
            keycode = event.keycode,
            modifiers = event.modifiers.bits(),
            ?result,
            "key event"
        );
        result
    }

    fn candidate_clicked(&mut self, index: usize) -> bool {
        self.select_candidate_in_page(index)
    }

    fn reset(&mut self) {
        self.reset_session();
        self.context.take_commit();
    }

    fn context(&self) -> &ImeContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ImeContext {
        &mut self.context
    }

    fn name(&self) -> &'static str {
        "phonetic"
    }
}
