#![doc = r#"
crimp: a command-line JavaScript (ES5) minifier and pretty printer.

This crate wires the `crimp-es5` parser and printer to real streams: it resolves
inputs, the output and an optional source map, applies the printing rules chosen
by the user and maps every failure to a process exit code. It powers the `crimp`
CLI and can be embedded in your own Rust applications.

Add dependency
--------------
```toml
[dependencies]
crimp = "1.0"
```

Minify a string
---------------
```rust
use crimp::{Options, minify_str};

let text = minify_str("var foo = \"bar\";", &Options::default())?;
assert_eq!(text, "var foo=\"bar\";");
# Ok::<(), crimp::Error>(())
```

Minify files with a source map
------------------------------
```rust,no_run
use std::path::PathBuf;
use crimp::{Interrupt, Options, SourceMapRequest, StdStreams, minify};

fn main() -> crimp::Result<()> {
    let options = Options {
        inputs: vec![PathBuf::from("src/app.js"), PathBuf::from("src/util.js")],
        output: Some(PathBuf::from("dist/app.min.js")),
        mangle: true,
        source_map: SourceMapRequest::Auto, // dist/app.min.js.map
        ..Options::default()
    };

    let mut stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut stdio = StdStreams::new(&mut stdin, &mut stdout);
    minify(&options, &mut stdio, &Interrupt::new())
}
```

Error handling
--------------
All public functions return `crimp::Result<T>`; every `crimp::Error` knows the exit
code the CLI uses for it.

```rust
use crimp::{Error, Options, minify_str};

match minify_str("function(){};", &Options::default()) {
    Err(err @ Error::Syntax(_)) => {
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Function statement requires a name at 1:9");
    }
    other => panic!("unexpected {other:?}"),
}
```

Useful modules
--------------
- [`api`]: high-level entry points.
- [`types`]: `Options` and the source map request.
- [`io`]: codecs, path helpers and stream target resolution.
- [`interrupt`]: cooperative SIGINT handling.
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod error;
pub mod interrupt;
pub mod io;
pub mod types;

// Curated public API surface
pub use error::{EXIT_INTERRUPTED, EXIT_IO, Error, Result};
pub use interrupt::Interrupt;
pub use io::{Codec, MapTarget, StdStreams, StreamPlan, StreamTarget};
pub use types::{Options, SourceMapRequest};

pub use api::{minify, minify_in, minify_str, rules_for};

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Directory the crate was built from.
pub const LOCATION: &str = env!("CARGO_MANIFEST_DIR");
