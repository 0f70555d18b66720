use std::borrow::Cow;

use crate::error::ParseError;
use crate::re;

re!(re_inline_day_first, r" (\d{1,2}[/\-.]\d{1,2}[/\-.]\d{4})");
re!(re_inline_iso, r" (\d{4}-\d{2}-\d{2})");

/// Header row plus raw field rows, exactly as tokenized. Field text is
/// untyped here; normalization happens in the builder.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ── Newline restoration ──────────────────────────────────────────────────────
//
// Statement text arrives with real line breaks, with literal "\n" sequences,
// or flattened onto one line by a clipboard paste. Strategies are tried in
// that order; the first that applies wins.

fn verbatim(raw: &str) -> Option<Cow<'_, str>> {
    raw.contains('\n').then(|| Cow::Borrowed(raw))
}

fn unescape(raw: &str) -> Option<Cow<'_, str>> {
    raw.contains("\\n")
        .then(|| Cow::Owned(raw.replace("\\n", "\n")))
}

/// Last resort: records are assumed to start with a date, so a break is
/// re-inserted before every date-shaped token.
fn reinsert_before_dates(raw: &str) -> Cow<'_, str> {
    let restored = re_inline_day_first().replace_all(raw, "\n$1");
    let restored = re_inline_iso().replace_all(&restored, "\n$1").into_owned();
    Cow::Owned(restored)
}

pub fn restore_newlines(raw: &str) -> Cow<'_, str> {
    if let Some(text) = verbatim(raw) {
        return text;
    }
    if let Some(text) = unescape(raw) {
        return text;
    }
    reinsert_before_dates(raw)
}

// ── Tokenization ─────────────────────────────────────────────────────────────

/// Splits raw statement text into a trimmed header row and data rows.
/// Comma-delimited, double-quote-escaped; a doubled quote inside a quoted
/// field is a literal quote. Rows may be ragged; missing cells read as "".
pub fn tokenize(raw: &str) -> Result<RawTable, ParseError> {
    let text = restore_newlines(raw);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(ParseError::TooFewRows);
    }

    let joined = lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(joined.as_bytes());

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

pub(crate) fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
    row.get(index).map(String::as_str).unwrap_or("")
}
