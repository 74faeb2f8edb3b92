#![doc = r#"
crimp-es5: ECMAScript 5.1 parsing and printing for the `crimp` minifier.

The crate is a small, self-contained pipeline:

- [`parse`] turns source text into a [`ast::Program`] or a [`SyntaxError`]
  carrying line, column and (optionally) the source name.
- [`Unparser`] prints a program according to a list of [`Rule`]s: compact or
  indented layout, optional semicolon dropping, optional scope-aware renaming.
- [`Bundle`] concatenates printed programs and produces a version 3
  [`SourceMap`].

Minify with a source map
------------------------
```rust
use crimp_es5::{Bundle, Rule, Unparser, parse};

let program = parse("var foo = \"bar\";", Some("source.js"))?;
let printed = Unparser::new(&[Rule::minify(false)]).unparse(&program);

let mut bundle = Bundle::new();
bundle.push("source.js", printed);
assert_eq!(bundle.text(), "var foo=\"bar\";");
assert_eq!(bundle.source_map("dest.js").mappings, "AAAA,OAAQ,CAAE");
# Ok::<(), crimp_es5::SyntaxError>(())
```

Syntax errors
-------------
```rust
let err = crimp_es5::parse("function(){};", Some("/tmp/source.js")).unwrap_err();
assert_eq!(
    err.to_string(),
    "Function statement requires a name at 1:9 in '/tmp/source.js'"
);
```
"#]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod rules;
pub mod scope;
pub mod sourcemap;

pub use error::{Result, SyntaxError};
pub use lexer::reserved_words;
pub use parser::parse;
pub use printer::{Printed, Unparser};
pub use rules::Rule;
pub use sourcemap::{Bundle, Segment, SourceMap};

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Directory the crate was built from.
pub const LOCATION: &str = env!("CARGO_MANIFEST_DIR");
/// Grammar implemented by [`parse`]: name and edition.
pub const GRAMMAR: (&str, &str) = ("ecmascript", "5.1");
