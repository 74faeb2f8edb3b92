//! High-level library API: minify or pretty-print sources to their resolved
//! targets, or minify a string in memory. Prefer these entrypoints over the
//! `crimp_es5` building blocks when embedding crimp.
use std::fs;
use std::path::Path;

use crimp_es5::{Bundle, Rule, Unparser};
use tracing::debug;

use crate::error::{Error, Result};
use crate::interrupt::Interrupt;
use crate::io::codec::Codec;
use crate::io::paths::display_path;
use crate::io::stdio::StdStreams;
use crate::io::target::{InputSource, MapTarget, StreamPlan, StreamTarget};
use crate::types::Options;

/// Printer rules selected by `options`.
pub fn rules_for(options: &Options) -> Vec<Rule> {
    let mut rules = vec![Rule::minify(options.drops_semicolons())];
    if options.obfuscates() {
        rules.push(Rule::obfuscate(crimp_es5::reserved_words()));
    }
    if let Some(indent) = options.indent() {
        rules.push(Rule::indent(indent));
    }
    rules
}

/// Minify `source` in memory, without source map or file I/O.
pub fn minify_str(source: &str, options: &Options) -> Result<String> {
    let program = crimp_es5::parse(source, None)?;
    Ok(Unparser::new(&rules_for(options)).unparse(&program).text)
}

/// Run the pipeline against the process working directory.
pub fn minify(options: &Options, stdio: &mut StdStreams<'_>, interrupt: &Interrupt) -> Result<()> {
    let cwd = std::env::current_dir()?;
    minify_in(options, &cwd, stdio, interrupt)
}

/// Run the pipeline with relative paths resolved against `cwd`.
pub fn minify_in(
    options: &Options,
    cwd: &Path,
    stdio: &mut StdStreams<'_>,
    interrupt: &Interrupt,
) -> Result<()> {
    let plan = StreamPlan::resolve(options, cwd);
    let rules = rules_for(options);
    debug!("streams: {:?}", plan);
    debug!("rules: {:?}", rules);

    let unparser = Unparser::new(&rules);
    let mut bundle = Bundle::new();
    for input in &plan.inputs {
        let text = read_input(&plan, input, options, stdio, interrupt)?;
        interrupt.check()?;
        let program = crimp_es5::parse(&text, Some(&input.display_name()))?;
        bundle.push(&plan.source_name(input), unparser.unparse(&program));
    }
    interrupt.check()?;

    let mut output = bundle.text().to_string();
    let mut map_file = None;
    if let Some(target) = &plan.source_map {
        let map = bundle.source_map(&plan.map_file());
        let url = match (target, plan.map_url()) {
            (MapTarget::File(path), Some(url)) => {
                map_file = Some((path, map.to_json()?));
                url
            }
            _ => map.to_data_url()?,
        };
        debug!("source map url: {}", url);
        output.push_str("\n//# sourceMappingURL=");
        output.push_str(&url);
        output.push('\n');
    }

    match &plan.output {
        StreamTarget::File(path) => write_file(&plan, path, &output, options.encoding)?,
        StreamTarget::Standard => {
            let bytes = stdio.codec(options.encoding).encode(&output)?;
            stdio.stdout.write_all(&bytes)?;
            stdio.stdout.flush()?;
        }
    }
    if let Some((path, json)) = map_file {
        interrupt.check()?;
        write_file(&plan, path, &json, options.encoding)?;
    }
    Ok(())
}

fn read_input(
    plan: &StreamPlan,
    input: &InputSource,
    options: &Options,
    stdio: &mut StdStreams<'_>,
    interrupt: &Interrupt,
) -> Result<String> {
    interrupt.check()?;
    match input {
        InputSource::Standard => {
            let codec = stdio.codec(options.encoding);
            let mut bytes = Vec::new();
            interrupt.blocking(|| stdio.stdin.read_to_end(&mut bytes))??;
            Ok(codec.decode(&bytes)?)
        }
        InputSource::File(path) => {
            let bytes = fs::read(path).map_err(|e| Error::file(&display_path(&plan.cwd, path), e))?;
            Ok(options.encoding.decode(&bytes)?)
        }
    }
}

/// Encode first, then open: an unencodable run never creates the file.
fn write_file(plan: &StreamPlan, path: &Path, text: &str, encoding: Codec) -> Result<()> {
    let bytes = encoding.encode(text)?;
    fs::write(path, bytes).map_err(|e| Error::file(&display_path(&plan.cwd, path), e))
}
