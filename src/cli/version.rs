use std::io::Write;

/// Lines printed by `--version`: each component with the place it was built
/// from, then the running executable.
pub fn report() -> Vec<String> {
    let (grammar, edition) = crimp_es5::GRAMMAR;
    let exe = std::env::current_exe()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| "?".to_string());
    vec![
        format!("{} {} from {}", crimp::NAME, crimp::VERSION, crimp::LOCATION),
        format!(
            "{} {} from {}",
            crimp_es5::NAME,
            crimp_es5::VERSION,
            crimp_es5::LOCATION
        ),
        format!("{grammar} {edition} from {}", crimp_es5::NAME),
        format!(
            "using {exe} ({}-{})",
            std::env::consts::ARCH,
            std::env::consts::OS
        ),
    ]
}

pub fn write_report(out: &mut dyn Write) -> std::io::Result<()> {
    for line in report() {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
