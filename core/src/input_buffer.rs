//! Input buffer with cursor tracking for IME input.
//!
//! The input buffer stores the raw pinyin spelling as typed (e.g., "nihao")
//! and the edit cursor within it. Offsets are char offsets, which is what the
//! conversion gateway and the host preedit cursor both speak.

use crate::utils::byte_offset;

/// Input buffer tracking raw input and cursor position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize, // char offset, 0 <= cursor <= char_len
    char_len: usize,
}

impl InputBuffer {
    /// Create a new empty input buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw input text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the cursor position (char offset).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length of the buffer in chars.
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the cursor sits after the last char.
    pub fn cursor_at_end(&self) -> bool {
        self.cursor == self.char_len
    }

    /// Text from char offset `start` to the end.
    pub fn tail(&self, start: usize) -> &str {
        &self.text[byte_offset(&self.text, start.min(self.char_len))..]
    }

    /// Clear the buffer and reset cursor.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.char_len = 0;
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, ch: char) {
        let at = byte_offset(&self.text, self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
        self.char_len += 1;
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        let at = byte_offset(&self.text, self.cursor);
        let n = s.chars().count();
        self.text.insert_str(at, s);
        self.cursor += n;
        self.char_len += n;
    }

    /// Erase `len` chars starting at `start`.
    ///
    /// The whole range must lie inside the buffer, otherwise nothing changes
    /// and `false` is returned. A cursor inside or after the range is pulled
    /// back so it keeps pointing at the same text.
    pub fn erase(&mut self, start: usize, len: usize) -> bool {
        let Some(end) = start.checked_add(len) else {
            return false;
        };
        if len == 0 || end > self.char_len {
            return false;
        }

        let from = byte_offset(&self.text, start);
        let to = byte_offset(&self.text, end);
        self.text.replace_range(from..to, "");
        self.char_len -= len;

        if self.cursor >= end {
            self.cursor -= len;
        } else if self.cursor > start {
            self.cursor = start;
        }
        true
    }

    /// Delete the character before the cursor (backspace).
    /// Returns true if a character was deleted.
    pub fn delete_before(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.erase(self.cursor - 1, 1)
    }

    /// Delete the character after the cursor (delete key).
    /// Returns true if a character was deleted.
    pub fn delete_after(&mut self) -> bool {
        if self.cursor >= self.char_len {
            return false;
        }
        self.erase(self.cursor, 1)
    }

    /// Move cursor to the left by one character.
    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move cursor to the right by one character.
    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.char_len {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Move cursor to the beginning. Returns true if the cursor moved.
    pub fn move_to_start(&mut self) -> bool {
        self.set_cursor(0)
    }

    /// Move cursor to the end. Returns true if the cursor moved.
    pub fn move_to_end(&mut self) -> bool {
        self.set_cursor(self.char_len)
    }

    /// Set the cursor position.
    ///
    /// Returns false, leaving the cursor alone, when `pos` is past the end or
    /// equal to the current position.
    pub fn set_cursor(&mut self, pos: usize) -> bool {
        if pos > self.char_len || pos == self.cursor {
            return false;
        }
        self.cursor = pos;
        true
    }
}
