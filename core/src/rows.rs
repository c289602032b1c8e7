//! Minimal comma-separated row handling shared by the progress ledger and the
//! hotkey file.
//!
//! Both files are tiny two-column tables that older versions of the tool wrote
//! with a standard CSV writer, so double-quoted fields (`"a,b"`, `"say ""hi"""`)
//! are accepted on read and produced on write when a field needs them.

/// Split one line into fields. Returns `None` for an unterminated quote.
pub fn split_row(line: &str) -> Option<Vec<String>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(field);
    Some(fields)
}

/// Join fields into one line (no terminator), quoting where needed.
pub fn join_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| quote_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
