//! Syntax highlighting for fenced code blocks.
//!
//! Uses syntect's bundled grammars with the `InspiredGitHub` theme and emits
//! inline `style` attributes, so pages need no extra stylesheet. The language
//! comes from the fence info string only; nothing is guessed from content.

use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxReference, SyntaxSet};

const THEME: &str = "InspiredGitHub";

struct Assets {
    syntaxes: SyntaxSet,
    theme: Theme,
}

// Loaded on first use and shared by every build in the process.
fn assets() -> &'static Assets {
    static ASSETS: OnceLock<Assets> = OnceLock::new();
    ASSETS.get_or_init(|| {
        let mut themes = ThemeSet::load_defaults();
        let theme = themes.themes.remove(THEME).unwrap_or_else(|| {
            log::warn!("Highlight theme {THEME} missing, using an unstyled theme");
            Theme::default()
        });
        Assets {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    })
}

/// Grammar for a fence language such as `rust`, `py` or `JSON`.
pub fn syntax_for(language: &str) -> Option<&'static SyntaxReference> {
    if language.is_empty() {
        return None;
    }
    assets().syntaxes.find_syntax_by_token(language)
}

/// Highlight `source` as a `<pre>` block with styled spans.
pub fn highlight(syntax: &SyntaxReference, source: &str) -> Result<String, syntect::Error> {
    let assets = assets();
    highlighted_html_for_string(source, &assets.syntaxes, syntax, &assets.theme)
}
