//! End-to-end CLI tests for crimp.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CLOSURE: &str = "\
(function(root) {
  var bar = 'bar';

  var foo = function() {
    return bar;
  };

  root.name = 'demo';
  root.foo = foo;
  root.bar = bar;
})(window)
";

fn crimp() -> Command {
    cargo_bin_cmd!("crimp")
}

/// A scratch directory holding `source.js`.
fn workspace(source: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("source.js"), source).expect("write source.js");
    dir
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("read map");
    serde_json::from_str(&text).expect("parse map")
}

fn expected_map() -> serde_json::Value {
    serde_json::json!({
        "version": 3,
        "file": "dest.js",
        "sources": ["source.js"],
        "names": [],
        "mappings": "AAAA,OAAQ,CAAE",
    })
}

// ============================================
// Basic CLI Tests
// ============================================

mod cli_basics {
    use super::*;

    #[test]
    fn shows_help_with_inputs_first() {
        crimp()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("[input_file [input_file ...]]"))
            .stdout(predicate::str::contains("--output-path"))
            .stdout(predicate::str::contains("Basic mangling options"));
    }

    #[test]
    fn shows_version() {
        crimp()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::starts_with(format!(
                "crimp {} from ",
                env!("CARGO_PKG_VERSION")
            )))
            .stdout(predicate::str::contains("ecmascript 5.1 from crimp-es5\n"))
            .stdout(predicate::str::contains("using "));
    }

    #[test]
    fn rejects_inputs_after_flags() {
        let dir = workspace("var a;");
        crimp()
            .current_dir(dir.path())
            .args(["-O", "source.js", "other.js"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("must come before the first flag"))
            .stderr(predicate::str::contains("[input_file [input_file ...]]"));
        assert_eq!(
            fs::read_to_string(dir.path().join("source.js")).expect("source"),
            "var a;"
        );
    }

    #[test]
    fn rejects_malformed_values() {
        crimp()
            .args(["--indent-width", "x"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("[input_file [input_file ...]]"));
        crimp()
            .arg("-O")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("[input_file [input_file ...]]"));
        crimp()
            .args(["--encoding", "klingon"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown encoding: klingon"));
    }
}

// ============================================
// Minify Tests
// ============================================

mod minify {
    use super::*;

    #[test]
    fn stdin_to_stdout() {
        crimp()
            .write_stdin("var foo = 1;")
            .assert()
            .success()
            .stdout("var foo=1;");
    }

    #[test]
    fn source_file_to_stdout() {
        let dir = workspace("var foo = \"bar\";");
        crimp()
            .arg(dir.path().join("source.js"))
            .assert()
            .success()
            .stdout("var foo=\"bar\";");
    }

    #[test]
    fn source_file_to_dest_file() {
        let dir = workspace("var foo = \"bar\";");
        crimp()
            .current_dir(dir.path())
            .args(["source.js", "-O", "dest.js"])
            .assert()
            .success()
            .stdout("");
        assert_eq!(
            fs::read_to_string(dir.path().join("dest.js")).expect("dest.js"),
            "var foo=\"bar\";"
        );
    }

    #[test]
    fn shift_jis_source_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("sj.js"), b"var s = '\x82\xcd\x82\xa2';").expect("write sj.js");
        crimp()
            .current_dir(dir.path())
            .args(["sj.js", "-O", "out.js", "--encoding", "shift_jis"])
            .assert()
            .success();
        assert_eq!(
            fs::read(dir.path().join("out.js")).expect("out.js"),
            b"var s='\x82\xcd\x82\xa2';"
        );
    }

    #[test]
    fn output_is_stable() {
        let dir = workspace(CLOSURE);
        let first = crimp()
            .current_dir(dir.path())
            .args(["source.js", "-m"])
            .output()
            .expect("first run");
        let second = crimp()
            .write_stdin(first.stdout.clone())
            .arg("-m")
            .output()
            .expect("second run");
        assert_eq!(first.stdout, second.stdout);
    }

    #[test]
    fn mangles_the_closure() {
        let dir = workspace(CLOSURE);
        crimp()
            .current_dir(dir.path())
            .args(["source.js", "-O", "dest.js", "-s", "--obfuscate", "--drop-semi"])
            .assert()
            .success();
        assert_eq!(
            fs::read_to_string(dir.path().join("dest.js")).expect("dest.js"),
            "(function(a){var b='bar';var c=function(){return b};\
             a.name='demo';a.foo=c;a.bar=b})(window)\n\
             //# sourceMappingURL=dest.js.map\n"
        );
        let map = read_json(&dir.path().join("dest.js.map"));
        assert_eq!(map["names"], serde_json::json!(["root", "bar", "foo"]));
        assert_eq!(map["sources"], serde_json::json!(["source.js"]));
    }
}

// ============================================
// Source Map Tests
// ============================================

mod source_maps {
    use super::*;

    #[test]
    fn inline_on_stdout() {
        let dir = workspace("var foo = \"bar\";");
        crimp()
            .arg(dir.path().join("source.js"))
            .arg("-s")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "var foo=\"bar\";\n//# sourceMappingURL=data:application/json",
            ));
    }

    #[test]
    fn implied_map_file() {
        let dir = workspace("var foo = \"bar\";");
        crimp()
            .current_dir(dir.path())
            .args(["source.js", "-O", "dest.js", "-s"])
            .assert()
            .success();
        assert_eq!(
            fs::read_to_string(dir.path().join("dest.js")).expect("dest.js"),
            "var foo=\"bar\";\n//# sourceMappingURL=dest.js.map\n"
        );
        assert_eq!(read_json(&dir.path().join("dest.js.map")), expected_map());
    }

    #[test]
    fn named_map_file() {
        let dir = workspace("var foo = \"bar\";");
        crimp()
            .current_dir(dir.path())
            .args(["source.js", "-O", "dest.js", "-s", "dest.map"])
            .assert()
            .success();
        assert_eq!(
            fs::read_to_string(dir.path().join("dest.js")).expect("dest.js"),
            "var foo=\"bar\";\n//# sourceMappingURL=dest.map\n"
        );
        assert_eq!(read_json(&dir.path().join("dest.map")), expected_map());
    }

    #[test]
    fn map_naming_the_output_is_inline() {
        let dir = workspace("var foo = \"bar\";");
        crimp()
            .current_dir(dir.path())
            .args(["source.js", "-O", "dest.js", "-s", "dest.js"])
            .assert()
            .success();
        let raw = fs::read_to_string(dir.path().join("dest.js")).expect("dest.js");
        assert!(raw.contains("var foo=\"bar\";\n//# sourceMappingURL=data:application/json"));
        let encoded = raw
            .lines()
            .last()
            .and_then(|line| line.rsplit(',').next())
            .expect("data url");
        let decoded = STANDARD.decode(encoded).expect("base64");
        let map: serde_json::Value = serde_json::from_slice(&decoded).expect("json");
        assert_eq!(map, expected_map());
    }

    #[test]
    fn pretty_print_stdin() {
        crimp()
            .args(["-p", "-s"])
            .write_stdin("var foo=\"bar\"")
            .assert()
            .success()
            .stdout(predicate::str::contains("var foo = \"bar\";\n\n//# sourceMappingURL="));
    }
}

// ============================================
// Failure Tests
// ============================================

mod failures {
    use super::*;

    #[test]
    fn syntax_error() {
        let dir = workspace("function(){};");
        let source = dir.path().join("source.js");
        crimp()
            .arg(&source)
            .assert()
            .code(1)
            .stdout("")
            .stderr(format!(
                "Function statement requires a name at 1:9 in '{}'\n",
                source.display()
            ));
    }

    #[test]
    fn deep_nesting_is_reported() {
        let nested = format!("x={}1{}", "(".repeat(5000), ")".repeat(5000));
        crimp()
            .write_stdin(nested)
            .assert()
            .code(1)
            .stdout("")
            .stderr(predicate::str::starts_with("Maximum nesting depth exceeded at 1:"))
            .stderr(predicate::str::contains("in '<stdin>'\n"));
    }

    #[test]
    fn decode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("source.js");
        fs::write(&source, b"var \x82\xcd\x82\xa2 = 1;").expect("write source");
        crimp()
            .arg(&source)
            .arg("--encoding=utf-8")
            .assert()
            .code(1)
            .stderr(predicate::str::starts_with("read error: "))
            .stderr(predicate::str::contains("codec can't decode byte 0x82"));
    }

    #[test]
    fn encode_error_leaves_no_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dest = dir.path().join("dest.js");
        crimp()
            .arg("--encoding=ascii")
            .arg("-O")
            .arg(&dest)
            .env("LC_ALL", "en_US.UTF-8")
            .write_stdin("var s = \"\u{306f}\u{3044}\";")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("'ascii' codec can't encode characters"));
        assert!(!dest.exists());
    }

    #[test]
    fn missing_input_uses_errno() {
        let dir = tempfile::tempdir().expect("tempdir");
        crimp()
            .current_dir(dir.path())
            .arg("missing.js")
            .assert()
            .code(2)
            .stderr(predicate::str::starts_with("missing.js: "));
    }
}
