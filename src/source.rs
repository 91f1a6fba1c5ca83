use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
};

pub const SOURCE_EXTENSION: &str = "vm";
pub const OUTPUT_EXTENSION: &str = "asm";

/// Strips a trailing `//` comment and surrounding whitespace from a raw
/// source line. Returns `None` for blank and comment-only lines.
pub fn clean(line: &str) -> Option<&str> {
    let code = line.split_once("//").map_or(line, |(code, _)| code).trim();
    (!code.is_empty()).then_some(code)
}

/// What kind of input a translation run was pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A single `.vm` file.
    File,
    /// A directory containing at least one `.vm` file.
    Directory,
}

/// Classifies the input path, or `None` when there is nothing to translate
/// at it.
pub fn classify(path: &Path) -> io::Result<Option<InputKind>> {
    if has_source_extension(path) && path.is_file() {
        return Ok(Some(InputKind::File));
    }
    if path.is_dir() && !discover_units(path)?.is_empty() {
        return Ok(Some(InputKind::Directory));
    }
    Ok(None)
}

/// Returns the `.vm` files directly inside `dir`, sorted by path so that a
/// multi-unit run concatenates in a stable order.
pub fn discover_units(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut units = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if has_source_extension(&path) {
            units.push(path);
        }
    }
    units.sort();
    Ok(units)
}

/// Derives the output artifact path: `Foo.vm` becomes `Foo.asm`, and a
/// directory `dir` becomes `dir/dir.asm`.
pub fn output_path(input: &Path, kind: InputKind) -> PathBuf {
    match kind {
        InputKind::File => input.with_extension(OUTPUT_EXTENSION),
        InputKind::Directory => {
            let stem = input
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap_or("out");
            input.join(format!("{stem}.{OUTPUT_EXTENSION}"))
        }
    }
}

/// The unit's scoping name: its file stem. Statics and user labels are
/// prefixed with this.
pub fn unit_name(path: &Path) -> &str {
    path.file_stem().and_then(OsStr::to_str).unwrap_or_default()
}

fn has_source_extension(path: &Path) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(SOURCE_EXTENSION)
}
