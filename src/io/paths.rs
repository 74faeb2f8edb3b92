//! Lexical path helpers. Nothing here touches the filesystem, so paths that do
//! not exist yet (output files, map files) compare and relativize the same way
//! existing ones do.
use std::path::{Component, Path, PathBuf};

/// `path` made absolute against `cwd`, with `.` and `..` folded away.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `to` relative to the directory `from_dir`; both must be absolute and normalized.
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from_dir.components().collect();
    let target: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();
    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &target[common..] {
        out.push(component);
    }
    out
}

/// Path rendered with `/` separators, as source maps expect.
pub fn to_url(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// `path` as shown to the user: relative when it lives under `cwd`.
pub fn display_path(cwd: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(cwd) {
        Ok(rest) if !rest.as_os_str().is_empty() => rest.to_path_buf(),
        _ => path.to_path_buf(),
    }
}

/// Directory containing `path`, or `path` itself when it has no parent.
pub fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolutize_folds_dots() {
        let cwd = Path::new("/work/project");
        assert_eq!(absolutize(cwd, Path::new("out/./a.js")), Path::new("/work/project/out/a.js"));
        assert_eq!(absolutize(cwd, Path::new("../other/a.js")), Path::new("/work/other/a.js"));
        assert_eq!(absolutize(cwd, Path::new("/abs/b.js")), Path::new("/abs/b.js"));
    }

    #[test]
    fn same_file_compares_equal_after_normalization() {
        let cwd = Path::new("/work");
        assert_eq!(
            absolutize(cwd, Path::new("dest.js")),
            absolutize(cwd, Path::new("./sub/../dest.js"))
        );
    }

    #[test]
    fn relative_paths_climb_and_descend() {
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b/c.js")), Path::new("c.js"));
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/x/c.js")), Path::new("../x/c.js"));
        assert_eq!(to_url(&relative_path(Path::new("/a/b/c"), Path::new("/a/d.js"))), "../../d.js");
    }

    #[test]
    fn display_paths_stay_relative_under_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(display_path(cwd, Path::new("/work/src/a.js")), Path::new("src/a.js"));
        assert_eq!(display_path(cwd, Path::new("/elsewhere/a.js")), Path::new("/elsewhere/a.js"));
    }
}
