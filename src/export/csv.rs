//! RFC 4180 writer

use std::io::Write;

use super::reader::RowReader;
use crate::query::QueryResult;
use crate::value::Value;

const LINE_END: &str = "\r\n";

/// Delimited-text output options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: char,
    /// Write the header row when the reader has one
    pub header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            header: true,
        }
    }
}

/// Writes every row of `reader`, returning the number of data rows
pub fn write_csv<W: Write>(
    reader: RowReader,
    writer: &mut W,
    options: &CsvOptions,
) -> QueryResult<usize> {
    let mut reader = if options.header {
        reader
    } else {
        reader.without_header()
    };

    let mut written = 0;
    let mut line = String::new();
    for row in reader.by_ref() {
        let row = row?;
        line.clear();
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                line.push(options.delimiter);
            }
            push_field(&mut line, value, options.delimiter);
        }
        line.push_str(LINE_END);
        writer.write_all(line.as_bytes())?;
        written += 1;
    }

    if reader.header_emitted() {
        written -= 1;
    }
    Ok(written)
}

fn push_field(line: &mut String, value: &Value, delimiter: char) {
    let text = value.render_plain();
    let quote = text
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\r' || c == '\n');
    if quote {
        line.push('"');
        line.push_str(&text.replace('"', "\"\""));
        line.push('"');
    } else {
        line.push_str(&text);
    }
}
