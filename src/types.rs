//! Shared types used across crimp.
//! `Options` is the fully resolved description of one run; the CLI builds it
//! from arguments, library callers construct it directly.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::io::codec::Codec;

/// What the user asked for with `-s/--source-map`.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum SourceMapRequest {
    /// No source map.
    #[default]
    Absent,
    /// `<output>.map` next to an output file, inline when writing to stdout.
    Auto,
    /// An explicit map path; inline when it names the output file itself.
    Path(PathBuf),
}

impl SourceMapRequest {
    /// Interpret the flag value: no flag, a bare flag (or empty value), or a path.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value {
            None => SourceMapRequest::Absent,
            Some("") => SourceMapRequest::Auto,
            Some(path) => SourceMapRequest::Path(PathBuf::from(path)),
        }
    }
}

/// Options for one minify or pretty-print run.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Options {
    /// Input paths in argument order; empty reads standard input.
    pub inputs: Vec<PathBuf>,
    /// Output file; `None` writes to standard output.
    pub output: Option<PathBuf>,
    pub mangle: bool,
    pub pretty: bool,
    pub obfuscate: bool,
    pub drop_semi: bool,
    pub source_map: SourceMapRequest,
    /// Indentation width for the pretty printer.
    pub indent_width: usize,
    /// Codec for file-based I/O.
    pub encoding: Codec,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: None,
            mangle: false,
            pretty: false,
            obfuscate: false,
            drop_semi: false,
            source_map: SourceMapRequest::Absent,
            indent_width: 4,
            encoding: Codec::default(),
        }
    }
}

impl Options {
    /// `--mangle` and `--obfuscate` both imply semicolon dropping.
    pub fn drops_semicolons(&self) -> bool {
        self.drop_semi || self.mangle || self.obfuscate
    }

    pub fn obfuscates(&self) -> bool {
        self.obfuscate || self.mangle
    }

    pub fn indent(&self) -> Option<String> {
        self.pretty.then(|| " ".repeat(self.indent_width))
    }
}
