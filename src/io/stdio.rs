//! Borrowed standard streams, so runs can be driven in-process with buffers.
use std::io::{Read, Write};

use crate::io::codec::Codec;

pub struct StdStreams<'a> {
    pub stdin: &'a mut dyn Read,
    pub stdout: &'a mut dyn Write,
    /// Codec the streams declare for themselves; wins over the configured one.
    pub encoding: Option<Codec>,
}

impl<'a> StdStreams<'a> {
    pub fn new(stdin: &'a mut dyn Read, stdout: &'a mut dyn Write) -> Self {
        Self {
            stdin,
            stdout,
            encoding: None,
        }
    }

    pub fn with_encoding(mut self, encoding: Codec) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Codec for standard stream I/O given the configured one.
    pub fn codec(&self, configured: Codec) -> Codec {
        self.encoding.unwrap_or(configured)
    }
}
