//! Pretty-printing for previews
//!
//! Renders data on one line when it fits the width, otherwise one
//! element (or one group) per line.

use super::data::Data;

/// Default line width for previews
pub const DEFAULT_WIDTH: usize = 72;

/// Renders `data` as display lines no wider than `width` where possible.
pub fn pretty_lines(data: &Data, width: usize) -> Vec<String> {
    let single = data.to_string();
    if single.chars().count() <= width {
        return vec![single];
    }

    let (open, close, items): (&str, &str, Vec<String>) = match data {
        Data::Value(_) => return vec![single],
        Data::List(items) => ("[", "]", items.iter().map(|v| v.to_string()).collect()),
        Data::Set(items) => ("{", "}", items.iter().map(|v| v.to_string()).collect()),
        Data::Map(groups) => (
            "{",
            "}",
            groups
                .iter()
                .map(|(key, value)| format!("{}: {}", key, value))
                .collect(),
        ),
    };

    let last = items.len().saturating_sub(1);
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let lead = if i == 0 { open } else { " " };
            let tail = if i == last { close } else { "," };
            format!("{}{}{}", lead, item, tail)
        })
        .collect()
}
