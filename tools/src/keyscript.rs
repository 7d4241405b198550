//! Key script parsing.
//!
//! A script is a string of keys. Plain characters stand for themselves;
//! named keys and chords go in angle brackets: `<space>`, `<bs>`,
//! `<ctrl+left>`, `<alt+shift+a>`, `<lt>` for a literal `<`. Whitespace
//! outside brackets is ignored so scripts can span lines.

use anyhow::{bail, Context, Result};
use libchinese_editor::keys::keysym;
use libchinese_editor::{KeyEvent, Modifiers};

/// One parsed key with the token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptKey {
    pub token: String,
    pub event: KeyEvent,
}

fn named_key(name: &str) -> Option<u32> {
    let keyval = match name {
        "space" => keysym::SPACE,
        "bs" | "backspace" => keysym::BACKSPACE,
        "del" | "delete" => keysym::DELETE,
        "kpdel" => keysym::KP_DELETE,
        "enter" | "return" | "cr" => keysym::RETURN,
        "kpenter" => keysym::KP_ENTER,
        "esc" | "escape" => keysym::ESCAPE,
        "tab" => keysym::TAB,
        "left" => keysym::LEFT,
        "right" => keysym::RIGHT,
        "up" => keysym::UP,
        "down" => keysym::DOWN,
        "home" => keysym::HOME,
        "end" => keysym::END,
        "pgup" | "pageup" => keysym::PAGE_UP,
        "pgdn" | "pagedown" => keysym::PAGE_DOWN,
        "lt" => '<' as u32,
        "gt" => '>' as u32,
        _ => return None,
    };
    Some(keyval)
}

fn modifier(name: &str) -> Option<Modifiers> {
    match name {
        "ctrl" | "control" => Some(Modifiers::CONTROL),
        "alt" => Some(Modifiers::ALT),
        "shift" => Some(Modifiers::SHIFT),
        "super" => Some(Modifiers::SUPER),
        "hyper" => Some(Modifiers::HYPER),
        "meta" => Some(Modifiers::META),
        _ => None,
    }
}

/// Parse the inside of `<...>`.
fn parse_chord(body: &str) -> Result<KeyEvent> {
    let lower = body.to_ascii_lowercase();
    let mut parts: Vec<&str> = lower.split('+').collect();
    let Some(name) = parts.pop() else {
        bail!("empty key");
    };

    let mut modifiers = Modifiers::empty();
    for part in parts {
        modifiers |= modifier(part).with_context(|| format!("unknown modifier `{part}`"))?;
    }

    let keyval = match named_key(name) {
        Some(keyval) => keyval,
        None => {
            // single character keys keep the case they were written in
            let as_written = &body[body.len() - name.len()..];
            let mut chars = as_written.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => ch as u32,
                _ => bail!("unknown key `{name}`"),
            }
        }
    };
    Ok(KeyEvent::with_modifiers(keyval, modifiers))
}

pub fn parse(script: &str) -> Result<Vec<ScriptKey>> {
    let mut keys = Vec::new();
    let mut chars = script.char_indices();

    while let Some((start, ch)) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }
        if ch != '<' {
            keys.push(ScriptKey {
                token: ch.to_string(),
                event: KeyEvent::from_char(ch),
            });
            continue;
        }

        let Some((end, _)) = chars.by_ref().find(|&(_, c)| c == '>') else {
            bail!("unterminated `<` at byte {start}");
        };
        let body = &script[start + 1..end];
        let event = parse_chord(body).with_context(|| format!("in `<{body}>`"))?;
        keys.push(ScriptKey {
            token: format!("<{body}>"),
            event,
        });
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(script: &str) -> Vec<KeyEvent> {
        parse(script).unwrap().into_iter().map(|k| k.event).collect()
    }

    #[test]
    fn test_plain_chars_and_named_keys() {
        assert_eq!(
            events("ni <space>\n<BS>"),
            vec![
                KeyEvent::from_char('n'),
                KeyEvent::from_char('i'),
                KeyEvent::key(keysym::SPACE),
                KeyEvent::key(keysym::BACKSPACE),
            ]
        );
    }

    #[test]
    fn test_chords() {
        assert_eq!(events("<ctrl+left>"), vec![KeyEvent::ctrl(keysym::LEFT)]);
        assert_eq!(
            events("<Alt+Shift+A>"),
            vec![KeyEvent::with_modifiers(
                'A' as u32,
                Modifiers::ALT | Modifiers::SHIFT
            )]
        );
        assert_eq!(events("<ctrl+d>"), vec![KeyEvent::ctrl('d' as u32)]);
        assert_eq!(events("<lt>"), vec![KeyEvent::from_char('<')]);
    }

    #[test]
    fn test_tokens_are_kept_for_display() {
        let keys = parse("a<pgdn>").unwrap();
        assert_eq!(keys[0].token, "a");
        assert_eq!(keys[1].token, "<pgdn>");
        assert_eq!(keys[1].event, KeyEvent::key(keysym::PAGE_DOWN));
    }

    #[test]
    fn test_errors() {
        assert!(parse("<space").is_err());
        assert!(parse("<foo>").is_err());
        assert!(parse("<hyperx+a>").is_err());
        assert!(parse("<>").is_err());
    }
}
