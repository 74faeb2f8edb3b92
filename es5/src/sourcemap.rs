//! Source map v3 assembly and serialization.
//!
//! A [`Bundle`] concatenates printed programs into one generated text while
//! collecting their segments; [`Bundle::source_map`] then encodes the segments
//! into the `mappings` string.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::printer::Printed;

/// One mapped token: 0-based generated and original coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub generated_line: u32,
    pub generated_column: u32,
    pub original_line: u32,
    pub original_column: u32,
    /// Original identifier name, recorded only for renamed identifiers.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// `data:application/json;base64,...` form for inline embedding.
    pub fn to_data_url(&self) -> serde_json::Result<String> {
        let json = self.to_json()?;
        Ok(format!(
            "data:application/json;base64,{}",
            STANDARD.encode(json.as_bytes())
        ))
    }
}

/// Advance a 0-based line/column cursor over `text`.
pub(crate) fn advance_cursor(line: &mut u32, column: &mut u32, text: &str) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                *line += 1;
                *column = 0;
            }
            _ => *column += 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bundle {
    text: String,
    line: u32,
    column: u32,
    open_end: bool,
    sources: Vec<String>,
    segments: Vec<(usize, Segment)>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one printed program that was parsed from `source`.
    pub fn push(&mut self, source: &str, printed: Printed) {
        if printed.text.is_empty() {
            return;
        }
        if self.open_end {
            self.append(";");
        }

        let index = match self.sources.iter().position(|s| s == source) {
            Some(index) => index,
            None => {
                self.sources.push(source.to_string());
                self.sources.len() - 1
            }
        };
        for mut segment in printed.segments {
            if segment.generated_line == 0 {
                segment.generated_column += self.column;
            }
            segment.generated_line += self.line;
            self.segments.push((index, segment));
        }
        self.append(&printed.text);
        self.open_end = printed.open_end;
    }

    fn append(&mut self, text: &str) {
        advance_cursor(&mut self.line, &mut self.column, text);
        self.text.push_str(text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_map(&self, file: &str) -> SourceMap {
        let (names, mappings) = encode_mappings(&normalize(&self.segments));
        SourceMap {
            version: 3,
            file: file.to_string(),
            sources: self.sources.clone(),
            names,
            mappings,
        }
    }
}

/// Drop segments that continue the previous one: same generated line, same
/// source line and the same generated to original column offset.
fn normalize(segments: &[(usize, Segment)]) -> Vec<&(usize, Segment)> {
    let mut kept: Vec<&(usize, Segment)> = Vec::new();
    for entry in segments {
        let (source, segment) = entry;
        let continues = kept.last().is_some_and(|(last_source, last)| {
            last_source == source
                && last.generated_line == segment.generated_line
                && last.original_line == segment.original_line
                && last.name.is_none()
                && segment.name.is_none()
                && i64::from(last.generated_column) - i64::from(last.original_column)
                    == i64::from(segment.generated_column) - i64::from(segment.original_column)
        });
        if !continues {
            kept.push(entry);
        }
    }
    kept
}

fn encode_mappings(segments: &[&(usize, Segment)]) -> (Vec<String>, String) {
    let mut names: Vec<String> = Vec::new();
    let mut mappings = String::new();
    let mut line = 0;
    let mut prev_column = 0i64;
    let mut prev_source = 0i64;
    let mut prev_original_line = 0i64;
    let mut prev_original_column = 0i64;
    let mut prev_name = 0i64;
    let mut first_on_line = true;

    for (source, segment) in segments {
        while line < segment.generated_line {
            mappings.push(';');
            line += 1;
            prev_column = 0;
            first_on_line = true;
        }
        if !first_on_line {
            mappings.push(',');
        }
        first_on_line = false;

        let column = i64::from(segment.generated_column);
        let source = *source as i64;
        let original_line = i64::from(segment.original_line);
        let original_column = i64::from(segment.original_column);
        encode_vlq(&mut mappings, column - prev_column);
        encode_vlq(&mut mappings, source - prev_source);
        encode_vlq(&mut mappings, original_line - prev_original_line);
        encode_vlq(&mut mappings, original_column - prev_original_column);
        prev_column = column;
        prev_source = source;
        prev_original_line = original_line;
        prev_original_column = original_column;

        if let Some(name) = &segment.name {
            let index = match names.iter().position(|n| n == name) {
                Some(index) => index,
                None => {
                    names.push(name.clone());
                    names.len() - 1
                }
            };
            let index = index as i64;
            encode_vlq(&mut mappings, index - prev_name);
            prev_name = index;
        }
    }
    (names, mappings)
}

const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(out: &mut String, value: i64) {
    let mut rest = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = rest & 0b11111;
        rest >>= 5;
        if rest > 0 {
            digit |= 0b100000;
        }
        out.push(char::from(BASE64_DIGITS[digit as usize]));
        if rest == 0 {
            break;
        }
    }
}
