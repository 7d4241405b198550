//! Simplified to traditional script conversion for display.
//!
//! Conversion is a pure function of its input: the longest phrase entry wins,
//! then single characters are mapped, anything unknown passes through. Results
//! are memoised in an LRU cache since the same candidate texts are converted
//! again on every lookup-table refill.

use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::Path;

use ahash::AHashMap;
use lru::LruCache;
use serde::Deserialize;

use crate::utils::normalize;

/// One-way simplified to traditional mapping.
pub trait ScriptConverter {
    fn simp_to_trad(&self, text: &str) -> String;
}

/// Errors raised while loading conversion tables.
#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid table: {0}")]
    Json(#[from] serde_json::Error),
}

/// Table file layout: `{"chars": {"国": "國"}, "phrases": {"头发": "頭髮"}}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TableFile {
    chars: HashMap<String, String>,
    phrases: HashMap<String, String>,
}

// Common characters whose traditional form differs.
const BUILTIN_CHARS: &[(char, char)] = &[
    ('这', '這'),
    ('个', '個'),
    ('们', '們'),
    ('来', '來'),
    ('时', '時'),
    ('国', '國'),
    ('学', '學'),
    ('说', '說'),
    ('会', '會'),
    ('对', '對'),
    ('过', '過'),
    ('还', '還'),
    ('发', '發'),
    ('经', '經'),
    ('现', '現'),
    ('动', '動'),
    ('后', '後'),
    ('长', '長'),
    ('开', '開'),
    ('见', '見'),
    ('问', '問'),
    ('门', '門'),
    ('话', '話'),
    ('间', '間'),
    ('东', '東'),
    ('车', '車'),
    ('书', '書'),
    ('边', '邊'),
    ('电', '電'),
    ('点', '點'),
    ('体', '體'),
    ('头', '頭'),
    ('实', '實'),
    ('万', '萬'),
    ('与', '與'),
    ('爱', '愛'),
    ('汉', '漢'),
    ('语', '語'),
    ('华', '華'),
    ('号', '號'),
    ('岁', '歲'),
    ('钟', '鐘'),
    ('锅', '鍋'),
    ('妈', '媽'),
    ('吗', '嗎'),
    ('么', '麼'),
    ('让', '讓'),
    ('认', '認'),
    ('识', '識'),
    ('谢', '謝'),
    ('请', '請'),
    ('读', '讀'),
    ('写', '寫'),
    ('听', '聽'),
    ('买', '買'),
    ('卖', '賣'),
    ('钱', '錢'),
    ('飞', '飛'),
    ('机', '機'),
    ('马', '馬'),
    ('鸟', '鳥'),
    ('鱼', '魚'),
    ('龙', '龍'),
    ('气', '氣'),
    ('热', '熱'),
    ('错', '錯'),
];

const BUILTIN_PHRASES: &[(&str, &str)] = &[
    ("头发", "頭髮"),
    ("理发", "理髮"),
    ("皇后", "皇后"),
    ("以后", "以後"),
    ("干净", "乾淨"),
    ("钟表", "鐘錶"),
];

const CACHE_CAPACITY: usize = 1024;

/// Table-driven converter with an LRU cache of converted strings.
#[derive(Debug)]
pub struct TableConverter {
    chars: AHashMap<char, char>,
    phrases: AHashMap<String, String>,
    max_phrase_chars: usize,
    cache: RefCell<LruCache<String, String>>,
}

impl TableConverter {
    /// Empty converter: every text passes through unchanged.
    pub fn empty() -> Self {
        Self {
            chars: AHashMap::new(),
            phrases: AHashMap::new(),
            max_phrase_chars: 0,
            cache: RefCell::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Converter preloaded with a small built-in table of common characters.
    pub fn builtin() -> Self {
        let mut conv = Self::empty();
        for &(s, t) in BUILTIN_CHARS {
            conv.insert_char(s, t);
        }
        for &(s, t) in BUILTIN_PHRASES {
            conv.insert_phrase(s, t);
        }
        conv
    }

    /// Merge a JSON table into the built-in one.
    pub fn from_json_str(content: &str) -> Result<Self, ConverterError> {
        let table: TableFile = serde_json::from_str(content)?;
        let mut conv = Self::builtin();
        for (s, t) in table.chars {
            let (mut s, mut t) = (s.chars(), t.chars());
            if let (Some(s), None, Some(t), None) = (s.next(), s.next(), t.next(), t.next()) {
                conv.insert_char(s, t);
            }
        }
        for (s, t) in table.phrases {
            conv.insert_phrase(&s, &t);
        }
        Ok(conv)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ConverterError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn insert_char(&mut self, simplified: char, traditional: char) {
        self.chars.insert(simplified, traditional);
        self.cache.get_mut().clear();
    }

    pub fn insert_phrase(&mut self, simplified: &str, traditional: &str) {
        let simplified = normalize(simplified);
        self.max_phrase_chars = self.max_phrase_chars.max(simplified.chars().count());
        self.phrases.insert(simplified, normalize(traditional));
        self.cache.get_mut().clear();
    }

    fn convert(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            let longest = self.max_phrase_chars.min(chars.len() - i);
            let phrase = (2..=longest).rev().find_map(|n| {
                let key: String = chars[i..i + n].iter().collect();
                self.phrases.get(&key).map(|t| (n, t))
            });
            if let Some((n, t)) = phrase {
                out.push_str(t);
                i += n;
                continue;
            }
            out.push(*self.chars.get(&chars[i]).unwrap_or(&chars[i]));
            i += 1;
        }
        out
    }
}

impl Default for TableConverter {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ScriptConverter for TableConverter {
    fn simp_to_trad(&self, text: &str) -> String {
        let text = normalize(text);
        if let Some(hit) = self.cache.borrow_mut().get(&text) {
            return hit.clone();
        }
        let converted = self.convert(&text);
        self.cache.borrow_mut().put(text, converted.clone());
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_chars_and_passes_unknown_through() {
        let conv = TableConverter::builtin();
        assert_eq!(conv.simp_to_trad("中国"), "中國");
        assert_eq!(conv.simp_to_trad("你好abc"), "你好abc");
        assert_eq!(conv.simp_to_trad(""), "");
    }

    #[test]
    fn test_phrase_beats_char_mapping() {
        let conv = TableConverter::builtin();
        // 发 alone maps to 發, but 头发 is 頭髮
        assert_eq!(conv.simp_to_trad("发"), "發");
        assert_eq!(conv.simp_to_trad("头发"), "頭髮");
        assert_eq!(conv.simp_to_trad("我的头发长"), "我的頭髮長");
    }

    #[test]
    fn test_empty_converter_is_identity() {
        let conv = TableConverter::empty();
        assert_eq!(conv.simp_to_trad("这个"), "这个");
    }

    #[test]
    fn test_cached_result_is_invalidated_by_insert() {
        let mut conv = TableConverter::empty();
        assert_eq!(conv.simp_to_trad("云"), "云");
        conv.insert_char('云', '雲');
        assert_eq!(conv.simp_to_trad("云"), "雲");
    }

    #[test]
    fn test_json_table_extends_builtin() {
        let conv = TableConverter::from_json_str(
            r#"{"chars": {"云": "雲", "bad": "x"}, "phrases": {"白云": "白雲"}}"#,
        )
        .unwrap();
        assert_eq!(conv.simp_to_trad("云国"), "雲國");
        assert_eq!(conv.simp_to_trad("白云"), "白雲");
    }

    #[test]
    fn test_json_table_rejects_garbage() {
        assert!(matches!(
            TableConverter::from_json_str("not json"),
            Err(ConverterError::Json(_))
        ));
    }
}
