//! Terminal, script and JSON rendering shared by every command.
//!
//! The mode comes from `--format` (or the hidden `--json`), then the
//! `FORMAT` env var, then `output` in the user config. Without any of those
//! it is [`OutputMode::Pretty`] on a terminal and [`OutputMode::Text`] when
//! piped.
//!
//! Results go to stdout. Errors go to stderr in the same mode, so a script
//! using `--json` can parse both streams.

use std::io::{self, Write};

use backlog_core::error::ErrorCode;
use backlog_core::mutation::MutationError;
use clap::ValueEnum;
use serde::Serialize;

const LABEL_WIDTH: usize = 12;
const RULE: &str = "────────────────────────────────────────────────────────────────";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Aligned, sectioned output for people.
    Pretty,
    /// Tab-separated rows with a header line.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Map the name settled by config resolution (`pretty`, `text`, `json`).
    pub fn from_resolved(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Pretty,
        }
    }
}

/// A heading line followed by a rule.
pub fn heading(w: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(w, "{title}")?;
    writeln!(w, "{RULE}")
}

/// One `label: value` line, labels padded to a common width.
pub fn field(w: &mut dyn Write, label: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{label}:");
    writeln!(w, "{label:<LABEL_WIDTH$} {}", value.as_ref())
}

/// A list row that can print itself as a table line or as pretty text.
///
/// JSON output serializes the row directly.
pub trait Row: Serialize {
    const HEADERS: &'static [&'static str];

    /// Cells in [`Self::HEADERS`] order. Tabs and newlines are replaced.
    fn cells(&self) -> Vec<String>;

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()>;
}

fn clean_cell(cell: &str) -> String {
    cell.replace(['\t', '\n'], " ")
}

/// Write `rows` in `mode`. Text output omits the header when there are no rows.
pub fn write_rows<R: Row>(out: &mut dyn Write, rows: &[R], mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, rows)?;
            writeln!(out)?;
        }
        OutputMode::Text => {
            if !rows.is_empty() {
                writeln!(out, "{}", R::HEADERS.join("\t"))?;
            }
            for row in rows {
                let cells: Vec<String> = row.cells().iter().map(|c| clean_cell(c)).collect();
                writeln!(out, "{}", cells.join("\t"))?;
            }
        }
        OutputMode::Pretty => {
            for row in rows {
                row.write_pretty(out)?;
            }
        }
    }
    Ok(())
}

pub fn print_rows<R: Row>(rows: &[R], mode: OutputMode) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_rows(&mut out, rows, mode)
}

/// Print a single value: JSON directly, otherwise through `text` or `pretty`.
pub fn print_value<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text(value, &mut out)?,
        OutputMode::Pretty => pretty(value, &mut out)?,
    }
    Ok(())
}

/// A failure as shown to the user.
#[derive(Debug, Serialize)]
pub struct CliError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'static str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            summary: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.code()),
            summary: Some(code.summary()),
            message: message.into(),
            hint: code.hint(),
        }
    }
}

impl From<&MutationError> for CliError {
    fn from(err: &MutationError) -> Self {
        Self::from_code(err.code(), err.to_string())
    }
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut *out, &serde_json::json!({ "error": error }))?;
        writeln!(out)?;
        return Ok(());
    }
    match error.code {
        Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
        None => writeln!(out, "error: {}", error.message)?,
    }
    if let Some(hint) = error.hint {
        writeln!(out, "  hint: {hint}")?;
    }
    Ok(())
}

pub fn print_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)
}

/// Confirmation after a write. JSON mode wraps `details` in `{ok, message, details}`.
pub fn print_done<T: Serialize>(mode: OutputMode, message: &str, details: &T) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        let envelope = serde_json::json!({
            "ok": true,
            "message": message,
            "details": details,
        });
        serde_json::to_writer_pretty(&mut out, &envelope)?;
        writeln!(out)?;
    } else {
        writeln!(out, "ok: {message}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Pair {
        id: &'static str,
        note: &'static str,
    }

    impl Row for Pair {
        const HEADERS: &'static [&'static str] = &["id", "note"];

        fn cells(&self) -> Vec<String> {
            vec![self.id.to_string(), self.note.to_string()]
        }

        fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
            field(w, self.id, self.note)
        }
    }

    fn rows(mode: OutputMode, rows: &[Pair]) -> String {
        let mut buf = Vec::new();
        write_rows(&mut buf, rows, mode).expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn resolved_names_map_to_modes() {
        assert_eq!(OutputMode::from_resolved("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_resolved("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_resolved("anything"), OutputMode::Pretty);
    }

    #[test]
    fn json_rows_form_an_array() {
        let out = rows(
            OutputMode::Json,
            &[Pair { id: "a", note: "x" }, Pair { id: "b", note: "y" }],
        );
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid JSON");
        assert_eq!(parsed[1]["id"], "b");
        assert_eq!(rows(OutputMode::Json, &[]).trim(), "[]");
    }

    #[test]
    fn text_rows_are_tab_separated_and_sanitized() {
        let out = rows(OutputMode::Text, &[Pair { id: "a", note: "two\twords" }]);
        assert_eq!(out, "id\tnote\na\ttwo words\n");
        assert_eq!(rows(OutputMode::Text, &[]), "");
    }

    #[test]
    fn pretty_fields_align() {
        let out = rows(OutputMode::Pretty, &[Pair { id: "due", note: "Today" }]);
        assert_eq!(out, "due:         Today\n");
    }

    #[test]
    fn errors_carry_code_and_hint() {
        let err = CliError::from_code(ErrorCode::InvalidDate, "bad date 'soon'");
        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Text, &err).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("error[E2006]: bad date 'soon'"));
        assert!(text.contains("hint: "));

        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Json, &CliError::new("plain")).expect("write");
        let json: serde_json::Value = serde_json::from_slice(&buf).expect("valid JSON");
        assert_eq!(json["error"]["message"], "plain");
        assert!(json["error"].get("summary").is_none());
        assert!(json["error"].get("code").is_none());
    }
}
