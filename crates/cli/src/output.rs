//! Rendering of cache listings and sizes.

use serde::Serialize;

use crate::args::OutputFormat;
use prefixer_client::CachedFavicon;

/// Listing columns, in display order.
pub const FIELDS: [&str; 4] = ["domain", "file", "size", "modified"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a byte count into IEC units (KiB, MiB, GiB, TiB) with trimmed precision.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit_index = 0;

    while value >= 1024.0 && unit_index < UNITS.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        return format!("{bytes} {}", UNITS[unit_index]);
    }

    let mut value_str = if value >= 10.0 { format!("{value:.1}") } else { format!("{value:.2}") };

    if value_str.contains('.') {
        while value_str.ends_with('0') {
            value_str.pop();
        }
        if value_str.ends_with('.') {
            value_str.pop();
        }
    }

    format!("{value_str} {}", UNITS[unit_index])
}

/// One display row of `cache_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub domain: String,
    pub file: String,
    pub size: String,
    pub modified: String,
}

impl ListRow {
    fn cells(&self) -> [&str; 4] {
        [&self.domain, &self.file, &self.size, &self.modified]
    }
}

impl From<&CachedFavicon> for ListRow {
    fn from(item: &CachedFavicon) -> Self {
        Self {
            domain: item.domain.clone(),
            file: item.file.clone(),
            size: format_bytes(item.size),
            modified: item.modified.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Render `rows` in `format`. The result carries no trailing newline.
pub fn render(format: OutputFormat, rows: &[ListRow]) -> Result<String, serde_json::Error> {
    Ok(match format {
        OutputFormat::Table => render_table(rows),
        OutputFormat::Csv => render_csv(rows),
        OutputFormat::Json => serde_json::to_string(rows)?,
        OutputFormat::Yaml => render_yaml(rows)?,
    })
}

fn render_table(rows: &[ListRow]) -> String {
    let mut widths = FIELDS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let border = format!("+{border}+");

    let line = |cells: [&str; 4]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!(" {cell:<w$} "))
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut out = vec![border.clone(), line(FIELDS), border.clone()];
    out.extend(rows.iter().map(|row| line(row.cells())));
    out.push(border);
    out.join("\n")
}

fn render_csv(rows: &[ListRow]) -> String {
    let mut lines = vec![FIELDS.join(",")];
    lines.extend(rows.iter().map(|row| row.cells().map(csv_field).join(",")));
    lines.join("\n")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_yaml(rows: &[ListRow]) -> Result<String, serde_json::Error> {
    let mut out = vec!["---".to_string()];
    for row in rows {
        for (i, (field, value)) in FIELDS.iter().zip(row.cells()).enumerate() {
            let lead = if i == 0 { "- " } else { "  " };
            out.push(format!("{lead}{field}: {}", yaml_scalar(value)?));
        }
    }
    Ok(out.join("\n"))
}

/// Plain scalar when unambiguous, otherwise a double-quoted (JSON) string.
fn yaml_scalar(value: &str) -> Result<String, serde_json::Error> {
    let plain = !value.is_empty()
        && value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        && value.starts_with(|c: char| c.is_ascii_alphabetic())
        && !value.ends_with(' ')
        && !matches!(value.to_ascii_lowercase().as_str(), "true" | "false" | "yes" | "no" | "null" | "on" | "off");

    if plain { Ok(value.to_string()) } else { serde_json::to_string(value) }
}
