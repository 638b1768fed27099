// File: src/parser/sanitize.rs
//! Removal of markdown code-fence artifacts from model output.
use once_cell::sync::Lazy;
use regex::Regex;

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\n?|\n?```").expect("static fence pattern"));
static MARKDOWN_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```markdown\n?|\n?```").expect("static fence pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceLang {
    Json,
    Markdown,
}

/// Cleans one streamed fragment: drops every JSON fence marker, then at most
/// the first remaining newline.
pub fn clean_fragment(fragment: &str) -> String {
    JSON_FENCE.replace_all(fragment, "").replacen('\n', "", 1)
}

/// Whole-document fence stripping used by the one-shot variants.
pub fn strip_fences(text: &str, lang: FenceLang) -> String {
    let re = match lang {
        FenceLang::Json => &JSON_FENCE,
        FenceLang::Markdown => &MARKDOWN_FENCE,
    };
    re.replace_all(text, "").into_owned()
}
