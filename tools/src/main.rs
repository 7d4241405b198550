mod keyscript;

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use libchinese_editor::{Config, Editor, FixtureGateway, ImeContext, PhoneticEditor, TableConverter};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keyscript::ScriptKey;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Replay a key script through a phonetic editor backed by a fixture engine.
#[derive(Parser)]
#[command(name = "replay")]
struct Args {
    /// Fixture engine description (TOML: syllables, phrases, user_phrases)
    #[arg(long)]
    fixture: PathBuf,

    /// Editor configuration (TOML); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra simplified-to-traditional table (JSON)
    #[arg(long)]
    table: Option<PathBuf>,

    /// Key script given inline, e.g. "nihao<space>"
    #[arg(long, conflicts_with = "script")]
    keys: Option<String>,

    /// Key script file; stdin when neither --keys nor --script is given
    #[arg(long)]
    script: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Serialize)]
struct Step<'a> {
    key: &'a str,
    handled: bool,
    context: &'a ImeContext,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn read_script(args: &Args) -> Result<String> {
    if let Some(keys) = &args.keys {
        return Ok(keys.clone());
    }
    if let Some(path) = &args.script {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()));
    }
    let mut script = String::new();
    std::io::stdin()
        .read_to_string(&mut script)
        .context("reading script from stdin")?;
    Ok(script)
}

fn render_text(step: &Step) -> String {
    let ctx = step.context;
    let result = if step.handled { "handled" } else { "passed" };
    let mut line = format!("{:<14} {:<8}", step.key, result);

    if !ctx.preedit_text.is_empty() {
        line.push_str(&format!(
            " preedit={:?}@{} aux={:?}",
            ctx.preedit_text, ctx.preedit_cursor, ctx.auxiliary_text
        ));
    }
    if ctx.lookup_visible {
        let rows: Vec<String> = ctx
            .candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mark = if i == ctx.candidate_cursor { ">" } else { "" };
                let user = if c.foreground.is_some() { "*" } else { "" };
                format!("{mark}{}.{}{user}", i + 1, c.text)
            })
            .collect();
        line.push_str(&format!(" [{}]", rows.join(" ")));
    }
    if ctx.has_commit() {
        line.push_str(&format!(" commit={:?}", ctx.commit_text));
    }
    line
}

/// Feed every key to `editor`, rendering the context after each one.
fn replay<E: Editor>(editor: &mut E, keys: &[ScriptKey], format: Format) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(keys.len());
    for key in keys {
        let result = editor.process_key_event(key.event);
        let step = Step {
            key: &key.token,
            handled: result.is_handled(),
            context: editor.context(),
        };
        lines.push(match format {
            Format::Text => render_text(&step),
            Format::Json => serde_json::to_string(&step)?,
        });
        // commits are reported once
        editor.context_mut().take_commit();
    }
    Ok(lines)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let gateway = FixtureGateway::load_toml(&args.fixture)
        .with_context(|| format!("loading fixture {}", args.fixture.display()))?;
    let config = match &args.config {
        Some(path) => Config::load_toml(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    let converter = match &args.table {
        Some(path) => TableConverter::load_json(path)
            .with_context(|| format!("loading table {}", path.display()))?,
        None => TableConverter::builtin(),
    };

    let keys = keyscript::parse(&read_script(&args)?)?;
    let mut editor = PhoneticEditor::with_converter(gateway, config, converter);
    info!(editor = editor.name(), keys = keys.len(), "replaying");

    for line in replay(&mut editor, &keys, args.format)? {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> PhoneticEditor<FixtureGateway> {
        let gateway = FixtureGateway::builder()
            .syllables(["ni", "hao"])
            .phrase("ni'hao", "你好")
            .phrase("ni", "你")
            .phrase("hao", "好")
            .user_phrase("hao", "号")
            .build();
        PhoneticEditor::new(gateway, Config::default())
    }

    #[test]
    fn test_text_replay_shows_candidates_and_commit() {
        let mut ed = editor();
        let keys = keyscript::parse("ni<space>").unwrap();
        let lines = replay(&mut ed, &keys, Format::Text).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("preedit=\"ni\"@2"));
        assert!(lines[1].contains("[>1.你]"));
        assert!(lines[2].contains("commit=\"你\""));
        assert!(!ed.context().has_commit());
    }

    #[test]
    fn test_user_candidates_are_marked() {
        let mut ed = editor();
        let keys = keyscript::parse("hao").unwrap();
        let lines = replay(&mut ed, &keys, Format::Text).unwrap();
        assert!(lines[2].contains("[>1.号* 2.好]"));
    }

    #[test]
    fn test_json_replay_is_one_object_per_key() {
        let mut ed = editor();
        let keys = keyscript::parse("<bs>n").unwrap();
        let lines = replay(&mut ed, &keys, Format::Json).unwrap();
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["key"], "<bs>");
        assert_eq!(first["handled"], false);
        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["context"]["preedit_text"], "n");
    }
}
