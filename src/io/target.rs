//! Stream target resolution.
//!
//! Every stream a run touches is decided once, up front, from the options and
//! the working directory. Files are not opened here; the pipeline opens them
//! when it starts writing.
use std::path::{Path, PathBuf};

use crate::io::paths::{absolutize, parent_dir, relative_path, to_url};
use crate::types::{Options, SourceMapRequest};

/// Source name recorded for standard input.
pub const STDIN_NAME: &str = "<stdin>";
/// `file` field of a source map whose code went to standard output.
pub const STDOUT_NAME: &str = "<stdout>";

/// Where the output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    /// Process standard output; never closed by the pipeline.
    Standard,
    /// A file, created when writing begins.
    File(PathBuf),
}

/// Where the source map goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapTarget {
    /// A separate file, created after the output is written.
    File(PathBuf),
    /// Appended to the output itself as a data URL.
    Inline,
}

/// Where source text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Standard,
    /// Absolute path of an input file.
    File(PathBuf),
}

impl InputSource {
    /// Name used in syntax errors.
    pub fn display_name(&self) -> String {
        match self {
            InputSource::Standard => STDIN_NAME.to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }
}

/// All stream decisions for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPlan {
    pub cwd: PathBuf,
    pub inputs: Vec<InputSource>,
    pub output: StreamTarget,
    /// `None` when no map was asked for.
    pub source_map: Option<MapTarget>,
}

impl StreamPlan {
    pub fn resolve(options: &Options, cwd: &Path) -> Self {
        let inputs = if options.inputs.is_empty() {
            vec![InputSource::Standard]
        } else {
            options
                .inputs
                .iter()
                .map(|path| InputSource::File(absolutize(cwd, path)))
                .collect()
        };

        let output = match &options.output {
            Some(path) => StreamTarget::File(absolutize(cwd, path)),
            None => StreamTarget::Standard,
        };

        let source_map = match (&options.source_map, &output) {
            (SourceMapRequest::Absent, _) => None,
            (SourceMapRequest::Auto, StreamTarget::File(path)) => {
                let mut map = path.clone().into_os_string();
                map.push(".map");
                Some(MapTarget::File(PathBuf::from(map)))
            }
            (SourceMapRequest::Auto, StreamTarget::Standard) => Some(MapTarget::Inline),
            (SourceMapRequest::Path(path), output) => {
                let map = absolutize(cwd, path);
                if *output == StreamTarget::File(map.clone()) {
                    Some(MapTarget::Inline)
                } else {
                    Some(MapTarget::File(map))
                }
            }
        };

        Self {
            cwd: cwd.to_path_buf(),
            inputs,
            output,
            source_map,
        }
    }

    /// Directory holding the output file, or the working directory for stdout.
    pub fn output_dir(&self) -> &Path {
        match &self.output {
            StreamTarget::File(path) => parent_dir(path),
            StreamTarget::Standard => &self.cwd,
        }
    }

    /// Directory that map `sources` are relative to.
    pub fn map_dir(&self) -> &Path {
        match &self.source_map {
            Some(MapTarget::File(path)) => parent_dir(path),
            _ => self.output_dir(),
        }
    }

    /// Entry for `input` in the map's `sources`.
    pub fn source_name(&self, input: &InputSource) -> String {
        match input {
            InputSource::Standard => STDIN_NAME.to_string(),
            InputSource::File(path) => to_url(&relative_path(self.map_dir(), path)),
        }
    }

    /// `file` field of the map.
    pub fn map_file(&self) -> String {
        match &self.output {
            StreamTarget::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            StreamTarget::Standard => STDOUT_NAME.to_string(),
        }
    }

    /// URL of a separate map file as seen from the output; `None` when inline.
    pub fn map_url(&self) -> Option<String> {
        match &self.source_map {
            Some(MapTarget::File(path)) => Some(to_url(&relative_path(self.output_dir(), path))),
            _ => None,
        }
    }
}
