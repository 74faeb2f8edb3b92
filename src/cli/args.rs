use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, FromArgMatches, Parser};

use crimp::{Codec, Options, SourceMapRequest};

use super::errors::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "crimp",
    about = "Minify or pretty-print JavaScript (ES5) sources",
    disable_version_flag = true
)]
pub struct CliArgs {
    /// Path(s) to input file(s); standard input when omitted
    #[arg(value_name = "input_file")]
    pub inputs: Vec<PathBuf>,

    /// Output file path
    #[arg(short = 'O', long = "output-path", value_name = "output_path")]
    pub output: Option<PathBuf>,

    /// Enable all basic mangling options
    #[arg(short, long)]
    pub mangle: bool,

    /// Use the pretty printer (omit for the minify printer)
    #[arg(short, long = "pretty-print")]
    pub pretty: bool,

    /// Enable source map; defaults to <output_path>.map, written inline as a data
    /// URL when identical to <output_path> or when writing to stdout
    #[arg(
        short,
        long = "source-map",
        value_name = "sourcemap_path",
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub source_map: Option<String>,

    /// Show version information
    #[arg(long)]
    pub version: bool,

    /// Obfuscate (mangle) names
    #[arg(short, long, help_heading = "Basic mangling options")]
    pub obfuscate: bool,

    /// Drop unneeded semicolons
    #[arg(long, help_heading = "Basic mangling options")]
    pub drop_semi: bool,

    /// Indentation width for the pretty printer
    #[arg(long, value_name = "n", default_value_t = 4)]
    pub indent_width: usize,

    /// Encoding for file-based I/O (utf-8, ascii, latin-1, shift_jis, cp1252, ...);
    /// defaults to the locale
    #[arg(long, value_name = "codec")]
    pub encoding: Option<Codec>,
}

impl CliArgs {
    pub fn into_options(self) -> Options {
        Options {
            inputs: self.inputs,
            output: self.output,
            mangle: self.mangle,
            pretty: self.pretty,
            obfuscate: self.obfuscate,
            drop_semi: self.drop_semi,
            source_map: SourceMapRequest::from_flag(self.source_map.as_deref()),
            indent_width: self.indent_width,
            encoding: self.encoding.unwrap_or_else(Codec::preferred),
        }
    }
}

/// What the command line asks for.
#[derive(Debug, PartialEq)]
pub enum Invocation {
    Version,
    Run(Options),
}

/// Parse a full argv (program name first).
pub fn parse_args(argv: &[OsString]) -> Result<Invocation, AppError> {
    let program = argv
        .first()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "crimp".to_string());
    let prog = resolve_prog(&program);
    let mut cmd = CliArgs::command()
        .bin_name(prog.clone())
        .override_usage(usage(&prog));

    let usage_text = cmd.render_usage().to_string();

    let rest: Vec<String> = argv
        .iter()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    if let Some((input, flag)) = misplaced_input(&rest) {
        return Err(AppError::MisplacedInput {
            input,
            flag,
            usage: usage_text,
        });
    }

    let mut argv = argv.to_vec();
    if argv.is_empty() {
        argv.push(OsString::from(prog));
    }
    let with_usage = |source| AppError::Usage {
        source,
        usage: usage_text.clone(),
    };
    let matches = cmd.try_get_matches_from_mut(argv).map_err(with_usage)?;
    let args = CliArgs::from_arg_matches(&matches).map_err(with_usage)?;
    if args.version {
        return Ok(Invocation::Version);
    }
    Ok(Invocation::Run(args.into_options()))
}

fn usage(prog: &str) -> String {
    format!(
        "{prog} [input_file [input_file ...]] [-h] [-O <output_path>] [-m] [-p] \
         [-s [<sourcemap_path>]] [--version] [-o] [--drop-semi] [--indent-width n] \
         [--encoding <codec>]"
    )
}

enum Pending {
    Nothing,
    Required,
    Optional,
}

fn value_kind(flag: &str) -> Pending {
    if let Some(long) = flag.strip_prefix("--") {
        return match long {
            "output-path" | "indent-width" | "encoding" => Pending::Required,
            "source-map" => Pending::Optional,
            _ => Pending::Nothing,
        };
    }
    let shorts: Vec<char> = flag.chars().skip(1).collect();
    for (i, c) in shorts.iter().enumerate() {
        let attached = i + 1 < shorts.len();
        match c {
            'O' if attached => return Pending::Nothing,
            'O' => return Pending::Required,
            's' if attached => return Pending::Nothing,
            's' => return Pending::Optional,
            _ => {}
        }
    }
    Pending::Nothing
}

/// First positional that follows a flag, with that flag.
///
/// Inputs must precede every flag so that `-O source1.js source2.js` can never
/// quietly turn an input into the output.
fn misplaced_input(args: &[String]) -> Option<(String, String)> {
    let mut first_flag: Option<&str> = None;
    let mut pending = Pending::Nothing;
    let mut positional_only = false;
    for token in args {
        if !positional_only {
            match std::mem::replace(&mut pending, Pending::Nothing) {
                Pending::Required => continue,
                Pending::Optional if !token.starts_with('-') => continue,
                _ => {}
            }
            if token == "--" {
                positional_only = true;
                continue;
            }
            if token.starts_with('-') && token.len() > 1 {
                first_flag.get_or_insert(token.as_str());
                if !token.contains('=') {
                    pending = value_kind(token);
                }
                continue;
            }
        }
        if let Some(flag) = first_flag {
            return Some((token.clone(), flag.to_string()));
        }
    }
    None
}

/// Program name for usage text.
///
/// An executable found through `PATH` shows its base name; a binary run out of a
/// cargo `target/<profile>/` directory shows the launcher; anything else is
/// shown as invoked.
pub fn resolve_prog(program: &str) -> String {
    resolve_prog_with(
        program,
        std::env::var_os("PATH").as_deref(),
        std::env::var_os("CARGO").is_some(),
    )
}

fn resolve_prog_with(program: &str, path_var: Option<&OsStr>, under_cargo: bool) -> String {
    let path = Path::new(program);
    let dir = path.parent().unwrap_or(Path::new(""));
    let on_path = path_var
        .map(|paths| std::env::split_paths(paths).any(|entry| entry == dir))
        .unwrap_or(false);
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    match base {
        Some(base) if on_path => base,
        _ if under_cargo && in_target_dir(dir) => "cargo run --".to_string(),
        _ => program.to_string(),
    }
}

fn in_target_dir(dir: &Path) -> bool {
    dir.parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == "target")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<OsString> {
        std::iter::once("crimp")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    fn options(args: &[&str]) -> Options {
        match parse_args(&argv(args)).expect("parses") {
            Invocation::Run(options) => options,
            other => panic!("expected a run, got {other:?}"),
        }
    }

    #[test]
    fn inputs_then_flags() {
        let opts = options(&["a.js", "b.js", "-m", "-O", "out.js"]);
        assert_eq!(opts.inputs, vec![PathBuf::from("a.js"), PathBuf::from("b.js")]);
        assert_eq!(opts.output, Some(PathBuf::from("out.js")));
        assert!(opts.drops_semicolons());
        assert!(opts.obfuscates());
        assert_eq!(opts.indent_width, 4);
    }

    #[test]
    fn source_map_values() {
        assert_eq!(options(&["-m"]).source_map, SourceMapRequest::Absent);
        assert_eq!(
            options(&["-s", "some.map"]).source_map,
            SourceMapRequest::Path(PathBuf::from("some.map"))
        );
        assert_eq!(options(&["-s", "-m"]).source_map, SourceMapRequest::Auto);
        assert_eq!(options(&["-O", "dest.js", "-s"]).source_map, SourceMapRequest::Auto);
        assert_eq!(options(&["--source-map="]).source_map, SourceMapRequest::Auto);
    }

    #[test]
    fn trailing_inputs_are_rejected() {
        let err = parse_args(&argv(&["some.js", "other.js", "-m", "path"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.render().contains("Usage: crimp [input_file [input_file ...]]"));

        let err = parse_args(&argv(&["-O", "source1.js", "source2.js"])).unwrap_err();
        assert!(matches!(
            err,
            AppError::MisplacedInput { ref input, ref flag, .. } if input == "source2.js" && flag == "-O"
        ));
    }

    #[test]
    fn misplaced_scan_understands_values() {
        let scan = |args: &[&str]| {
            let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            misplaced_input(&args)
        };
        assert_eq!(scan(&["a.js", "-O", "out.js", "-s", "out.map", "-p"]), None);
        assert_eq!(scan(&["a.js", "--indent-width", "2", "--encoding=ascii"]), None);
        assert_eq!(scan(&["-Oout.js", "b.js"]), Some(("b.js".into(), "-Oout.js".into())));
        assert_eq!(scan(&["-m", "--", "b.js"]), Some(("b.js".into(), "-m".into())));
        assert_eq!(scan(&["--", "-weird.js"]), None);
    }

    #[test]
    fn malformed_values_are_usage_errors() {
        let err = parse_args(&argv(&["--indent-width", "wide"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.render().contains("[input_file [input_file ...]]"));
        let err = parse_args(&argv(&["-O"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.render().contains("[input_file [input_file ...]]"));
        let err = parse_args(&argv(&["--encoding", "klingon"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.render().contains("unknown encoding: klingon"));
        assert!(err.render().contains("[input_file [input_file ...]]"));
        let err = parse_args(&argv(&["--bogus"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn help_goes_to_stdout() {
        let err = parse_args(&argv(&["-h"])).unwrap_err();
        assert_eq!(err.exit_code(), 0);
        assert!(!err.use_stderr());
        assert!(err.render().contains("Basic mangling options"));
    }

    #[test]
    fn version_skips_the_run() {
        assert_eq!(parse_args(&argv(&["--version"])).expect("parses"), Invocation::Version);
    }

    #[test]
    fn explicit_encoding_is_kept() {
        assert_eq!(options(&["--encoding", "latin1"]).encoding, Codec::Latin1);
        assert_eq!(options(&["--encoding", "shift_jis"]).encoding.name(), "Shift_JIS");
    }

    #[test]
    fn program_names() {
        let path = OsString::from("/usr/local/bin:/usr/bin");
        assert_eq!(resolve_prog_with("/usr/bin/crimp", Some(path.as_os_str()), false), "crimp");
        assert_eq!(
            resolve_prog_with("/src/crimp/target/debug/crimp", Some(path.as_os_str()), true),
            "cargo run --"
        );
        assert_eq!(
            resolve_prog_with("/src/crimp/target/debug/crimp", Some(path.as_os_str()), false),
            "/src/crimp/target/debug/crimp"
        );
        assert_eq!(resolve_prog_with("./crimp", None, false), "./crimp");
    }
}
