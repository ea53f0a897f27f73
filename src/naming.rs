//! Output naming and path resolution.
//!
//! Every task's identity is its output path, so the rules that derive output
//! names from manifest entries live in one place:
//!
//! - `notes/graphql-schema-stitching.mdx` → `graphql-schema-stitching.html`
//!   ([`convert_extension`]; only the file name survives, the source directory
//!   does not leak into the output tree)
//! - tag `Deep Dive` → `deep-dive` ([`slugify`])
//! - `""` resolved against any base → `""` ([`resolve_path`]; an unset value
//!   means "feature disabled", never "the base directory itself")

use std::path::{Path, PathBuf};

/// Replace the extension of the file name in `path` with `new_ext`.
///
/// The directory part is dropped. A leading dot on `new_ext` is optional, and a
/// name without an extension keeps its stem unchanged:
///
/// - `("notes/a.mdx", ".html")` → `"a.html"`
/// - `("README", "html")` → `"README.html"`
pub fn convert_extension(path: &str, new_ext: &str) -> String {
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match file_name.rfind('.') {
        Some(0) | None => file_name.as_str(),
        Some(dot) => &file_name[..dot],
    };
    format!("{}.{}", stem, new_ext.trim_start_matches('.'))
}

/// Turn a tag into a file-name-safe slug.
///
/// Lowercases, turns spaces into dashes and drops `.`, `,` and `/`. Anything
/// else is kept as written so existing tag URLs stay stable.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            '.' | ',' | '/' => None,
            c => Some(c),
        })
        .collect()
}

/// Resolve a manifest-relative path against `base`.
///
/// An empty `relative` resolves to an empty path so callers can treat it as
/// "not configured". Absolute paths are returned as-is.
pub fn resolve_path(base: &Path, relative: &str) -> PathBuf {
    if relative.is_empty() {
        PathBuf::new()
    } else {
        base.join(relative)
    }
}

/// True when a path produced by [`resolve_path`] means "not configured".
pub fn is_unset(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_extension_drops_directory() {
        assert_eq!(convert_extension("notes/a.mdx", ".html"), "a.html");
    }

    #[test]
    fn convert_extension_without_leading_dot() {
        assert_eq!(convert_extension("posts/hello.md", "html"), "hello.html");
    }

    #[test]
    fn convert_extension_no_extension_appends() {
        assert_eq!(convert_extension("posts/README", ".html"), "README.html");
    }

    #[test]
    fn convert_extension_only_last_extension_replaced() {
        assert_eq!(convert_extension("archive.tar.md", ".html"), "archive.tar.html");
    }

    #[test]
    fn convert_extension_dotfile_keeps_name() {
        assert_eq!(convert_extension(".notes", ".html"), ".notes.html");
    }

    #[test]
    fn slugify_spaces_and_case() {
        assert_eq!(slugify("Deep Dive"), "deep-dive");
    }

    #[test]
    fn slugify_strips_punctuation() {
        assert_eq!(slugify("C/C++, v1.0"), "cc++-v10");
    }

    #[test]
    fn slugify_existing_slug_unchanged() {
        assert_eq!(slugify("deep-dive"), "deep-dive");
    }

    #[test]
    fn resolve_empty_is_empty() {
        let resolved = resolve_path(Path::new("/site"), "");
        assert!(is_unset(&resolved));
        assert_ne!(resolved, PathBuf::from("/site"));
    }

    #[test]
    fn resolve_relative_joins_base() {
        assert_eq!(
            resolve_path(Path::new("/site"), "templates/page.html"),
            PathBuf::from("/site/templates/page.html")
        );
    }

    #[test]
    fn resolve_absolute_wins() {
        assert_eq!(
            resolve_path(Path::new("/site"), "/abs/layout.html"),
            PathBuf::from("/abs/layout.html")
        );
    }
}
