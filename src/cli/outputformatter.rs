use serde_json::Value;

use terminal_size::{terminal_size, Height, Width};

use crate::pages::PageContent;

/// Set to `json` to print page data as pretty JSON instead of tables.
pub const OUTPUT_ENV: &str = "EVENTSPHERE_OUTPUT";

// Columns shown first when present; everything else follows in key order.
const LEADING_COLUMNS: &[&str] = &["id", "title", "firstName", "lastName", "email", "role", "name", "status"];

// Render page content for the terminal. Lists become ASCII tables; single
// records become a two-column field/value table.
pub fn print_page_content(content: &PageContent) {
    let forced_json = std::env::var(OUTPUT_ENV).map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);
    match content {
        PageContent::Form => println!("(form page: nothing to load)"),
        _ if forced_json => print_json(&content.as_json()),
        PageContent::Table(rows) => {
            if rows.is_empty() {
                println!("(no rows)");
            } else if !print_table(&Value::Array(rows.clone())) {
                print_json(&content.as_json());
            }
        }
        PageContent::Record(v) => {
            if !print_record(v) {
                print_json(v);
            }
        }
    }
}

fn print_json(v: &Value) {
    let s = serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string());
    println!("{}", s);
}

// Returns true if a table was printed.
pub fn print_table(val: &Value) -> bool {
    let (cols, rows) = match table_from_array(val) {
        Some(t) => t,
        None => return false,
    };
    if rows.is_empty() { return false; }
    render(&cols, &rows, &format!("rows: {}, cols: {}", rows.len(), cols.len()));
    true
}

fn print_record(val: &Value) -> bool {
    let map = match val {
        Value::Object(m) if !m.is_empty() => m,
        _ => return false,
    };
    let cols = vec!["field".to_string(), "value".to_string()];
    let rows: Vec<Vec<String>> = ordered_keys(map.keys()).into_iter()
        .map(|k| vec![k.clone(), map.get(&k).map(to_cell_string).unwrap_or_default()])
        .collect();
    render(&cols, &rows, &format!("fields: {}", rows.len()));
    true
}

fn render(cols: &[String], rows: &[Vec<String>], summary: &str) {
    // Detect terminal width once for this rendering
    let termw = get_terminal_width();
    crate::tprintln!("[cli.outputformatter] detected terminal width={} columns", termw);

    let mut widths: Vec<usize> = cols.iter().map(|s| visible_len(s).min(termw)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = visible_len(cell);
            if w > widths[i] { widths[i] = w.min(termw); }
        }
    }

    let sep = build_separator(&widths);
    println!("{}", fit_line_to_width(&sep, termw));
    println!("{}", fit_line_to_width(&build_row_header_colored(cols, &widths), termw));
    println!("{}", fit_line_to_width(&sep, termw));
    for r in rows {
        println!("{}", fit_line_to_width(&build_row(r, &widths), termw));
    }
    println!("{}", fit_line_to_width(&sep, termw));
    println!("{}", fit_line_to_width(summary, termw));
}

fn ordered_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut all: Vec<String> = keys.cloned().collect();
    all.sort_by_key(|k| {
        let rank = LEADING_COLUMNS.iter().position(|c| *c == k.as_str()).unwrap_or(LEADING_COLUMNS.len());
        (rank, k.clone())
    });
    all
}

// Build (columns, rows) from a JSON array.
// - Objects: union of keys across all rows, leading columns first.
// - Scalars/arrays: a single column named "value".
pub fn table_from_array(val: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let arr = match val {
        Value::Array(arr) if !arr.is_empty() => arr,
        _ => return None,
    };
    let mut all_keys: Vec<&String> = Vec::new();
    let mut is_all_objects = true;
    for el in arr {
        if let Value::Object(map) = el {
            for k in map.keys() { if !all_keys.contains(&k) { all_keys.push(k); } }
        } else {
            is_all_objects = false;
        }
    }
    if is_all_objects && !all_keys.is_empty() {
        let cols = ordered_keys(all_keys.into_iter());
        let rows = arr.iter()
            .filter_map(Value::as_object)
            .map(|map| cols.iter().map(|k| map.get(k).map(to_cell_string).unwrap_or_default()).collect())
            .collect();
        Some((cols, rows))
    } else {
        let rows = arr.iter().map(|el| vec![to_cell_string(el)]).collect();
        Some((vec!["value".to_string()], rows))
    }
}

fn to_cell_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // Populated references: show the most human field
        Value::Object(m) => ["title", "name", "email", "companyName"]
            .iter()
            .find_map(|k| m.get(*k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| v.to_string()),
        other => other.to_string(),
    }
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let (text, align_right) = (truncate(&cell, *w), is_numeric_like(&cell));
        let pad = w.saturating_sub(visible_len(&text));
        s.push(' ');
        if align_right {
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&" ".repeat(pad));
        }
        s.push(' ');
        s.push('|');
    }
    s
}

// Header row with column names colored green. Padding uses visible width.
fn build_row_header_colored(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let text = truncate(&cell, *w);
        s.push(' ');
        s.push_str(&format!("\x1b[32m{}\x1b[0m", text));
        s.push_str(&" ".repeat(w.saturating_sub(visible_len(&text))));
        s.push(' ');
        s.push('|');
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    // crude detection for aligning numbers to right
    let st = s.trim();
    if st.is_empty() { return false; }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() { has_digit = true; continue; }
        if ".-+eE,_".contains(ch) { continue; }
        return false;
    }
    has_digit
}

// --- Terminal fitting & ANSI helpers ---

fn get_terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_h))) if w > 20 => (w - 4) as usize,
        _ => 80,
    }
}

fn fit_line_to_width(s: &str, maxw: usize) -> String {
    if visible_len(s) <= maxw { return s.to_string(); }
    elide_end_preserving_ansi(s, maxw)
}

fn visible_len(s: &str) -> usize {
    // Count visible chars, skipping ANSI CSI sequences (ESC [ ... letter)
    let mut count = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            continue;
        }
        count += 1;
    }
    count
}

fn elide_end_preserving_ansi(s: &str, maxw: usize) -> String {
    let budget = maxw.saturating_sub(1);
    let mut out = String::new();
    let mut shown = 0usize;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            out.push(ch);
            if chars.peek() == Some(&'[') {
                for c in chars.by_ref() {
                    out.push(c);
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            continue;
        }
        if shown >= budget { break; }
        out.push(ch);
        shown += 1;
    }
    out.push('…');
    // Ensure color reset at end to avoid bleed if an escape was cut
    out.push_str("\x1b[0m");
    out
}
