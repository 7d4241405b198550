//! Loading editor configuration, fixture engines and conversion tables from
//! disk, then driving an editor built from them.

use std::path::PathBuf;

use libchinese_editor::{
    Config, DisplayMode, Editor, FixtureGateway, KeyEvent, PhoneticEditor, RefillStrategy,
    ScriptConverter, TableConverter,
};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("libchinese-editor-{}-{}", std::process::id(), name))
}

const FIXTURE: &str = r#"
syllables = ["zhong", "guo", "tou", "fa"]

[phrases]
"zhong'guo" = ["中国"]
zhong = ["中", "钟"]
guo = ["国"]
"tou'fa" = ["头发"]
tou = ["头"]
fa = ["发"]
"#;

#[test]
fn test_config_round_trip_through_file() {
    let path = temp_path("config.toml");
    let config = Config {
        page_size: 7,
        display_mode: DisplayMode::Traditional,
        refill: RefillStrategy::Windowed,
        select_keys: "asdfghjkl".to_string(),
        user_candidate_color: 0x00ff_0000,
        show_page_number: false,
    };
    config.save_toml(&path).unwrap();
    let loaded = Config::load_toml(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, config);
}

#[test]
fn test_partial_config_file_uses_defaults() {
    let path = temp_path("partial.toml");
    std::fs::write(&path, "display_mode = \"traditional\"\nrefill = \"windowed\"\n").unwrap();
    let loaded = Config::load_toml(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.display_mode, DisplayMode::Traditional);
    assert_eq!(loaded.refill, RefillStrategy::Windowed);
    assert_eq!(loaded.page_size, 5);
    assert_eq!(loaded.select_keys, "123456789");
    assert!(loaded.show_page_number);
}

#[test]
fn test_missing_config_file_is_an_error() {
    assert!(Config::load_toml(temp_path("does-not-exist.toml")).is_err());
}

#[test]
fn test_editor_from_files() {
    let fixture_path = temp_path("fixture.toml");
    let config_path = temp_path("editor.toml");
    std::fs::write(&fixture_path, FIXTURE).unwrap();
    std::fs::write(
        &config_path,
        "page_size = 2\ndisplay_mode = \"traditional\"\nshow_page_number = false\n",
    )
    .unwrap();

    let gateway = FixtureGateway::load_toml(&fixture_path).unwrap();
    let config = Config::load_toml(&config_path).unwrap();
    std::fs::remove_file(&fixture_path).ok();
    std::fs::remove_file(&config_path).ok();

    let mut editor = PhoneticEditor::new(gateway, config);
    for ch in "toufa".chars() {
        editor.process_key_event(KeyEvent::from_char(ch));
    }
    // 头发 is a phrase with its own traditional form
    assert_eq!(editor.context().candidate_texts(), vec!["頭髮", "頭"]);
    assert_eq!(editor.context().auxiliary_text, "toufa|");

    editor.process_key_event(KeyEvent::from_char(' '));
    assert_eq!(editor.context_mut().take_commit(), "頭髮");
}

#[test]
fn test_conversion_table_from_file() {
    let path = temp_path("table.json");
    std::fs::write(&path, r#"{"chars": {"钟": "鍾"}, "phrases": {"钟表": "鐘錶"}}"#).unwrap();
    let converter = TableConverter::load_json(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(converter.simp_to_trad("钟"), "鍾");
    assert_eq!(converter.simp_to_trad("钟表"), "鐘錶");

    let config = Config {
        display_mode: DisplayMode::Traditional,
        ..Config::default()
    };
    let gateway = FixtureGateway::from_toml_str(FIXTURE).unwrap();
    let mut editor = PhoneticEditor::with_converter(gateway, config, converter);
    for ch in "zhong".chars() {
        editor.process_key_event(KeyEvent::from_char(ch));
    }
    assert_eq!(editor.context().candidate_texts(), vec!["中", "鍾"]);
}
