//! I/O layer: text codecs, lexical path handling, borrowed standard streams,
//! and resolution of the input, output and source-map stream targets.
pub mod codec;
pub use codec::{Codec, DecodeError, EncodeError, UnknownCodec};

pub mod paths;

pub mod stdio;
pub use stdio::StdStreams;

pub mod target;
pub use target::{InputSource, MapTarget, StreamPlan, StreamTarget};
