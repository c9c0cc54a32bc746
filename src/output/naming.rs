//! Output path and archive entry naming

use std::path::{Path, PathBuf};

/// Append `suffix` unless the path already ends with it (case-insensitive).
pub fn ensure_suffix(path: &Path, suffix: &str) -> PathBuf {
    let text = path.to_string_lossy();
    if text.to_lowercase().ends_with(&suffix.to_lowercase()) {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{text}{suffix}"))
    }
}

/// Replace the final extension with `extension` unless it already is that
/// extension (case-insensitive). A path without extension gains one.
pub fn fix_extension(path: &Path, extension: &str) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.to_string_lossy().eq_ignore_ascii_case(extension) => path.to_path_buf(),
        _ => path.with_extension(extension),
    }
}

/// Name of the single entry inside a zip archive.
///
/// Derived from the requested path's base name, lower-cased, with any `.zip`
/// suffix removed (`export` if nothing remains). `.<format>` is appended
/// unless the name already ends with it or the format is `template`.
pub fn zip_entry_name(path: &Path, format: &str) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut name = base.strip_suffix(".zip").unwrap_or(&base).to_string();
    if name.is_empty() {
        name = "export".to_string();
    }

    let extension = format!(".{format}");
    if !name.ends_with(&extension) && format != "template" {
        name.push_str(&extension);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_entry_name() {
        assert_eq!(zip_entry_name(Path::new("/a/DATA.ZIP"), "json"), "data.json");
        assert_eq!(zip_entry_name(Path::new("/a/out.csv.zip"), "csv"), "out.csv");
        assert_eq!(zip_entry_name(Path::new("/a/report"), "xml"), "report.xml");
        assert_eq!(zip_entry_name(Path::new("/a/.zip"), "yaml"), "export.yaml");
        assert_eq!(zip_entry_name(Path::new("/a/page.html"), "template"), "page.html");
    }

    #[test]
    fn test_ensure_suffix() {
        assert_eq!(ensure_suffix(Path::new("out.csv"), ".gz"), PathBuf::from("out.csv.gz"));
        assert_eq!(ensure_suffix(Path::new("out.csv.GZ"), ".gz"), PathBuf::from("out.csv.GZ"));
    }

    #[test]
    fn test_fix_extension() {
        assert_eq!(fix_extension(Path::new("out.csv"), "zip"), PathBuf::from("out.zip"));
        assert_eq!(fix_extension(Path::new("out.ZIP"), "zip"), PathBuf::from("out.ZIP"));
        assert_eq!(fix_extension(Path::new("out"), "zip"), PathBuf::from("out.zip"));
    }
}
