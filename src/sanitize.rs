use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("Invalid regex"));

/// Normalize arbitrary text into a filesystem-safe token.
///
/// The text is trimmed, NFKD-decomposed, whitespace runs become a single `_`, and every
/// character outside `[A-Za-z0-9_.-]` is dropped. Accented letters therefore keep their
/// base letter. The result may be empty.
pub fn sanitize(raw: &str) -> String {
    let decomposed: String = raw.trim().nfkd().collect();
    let underscored = WHITESPACE.replace_all(&decomposed, "_");
    UNSAFE_CHARS.replace_all(&underscored, "").into_owned()
}

/// Sanitize a segment label for use inside a clip file name.
///
/// Same as [`sanitize`], but dots and hyphens also become `_` so the label can never
/// look like an extension or collide with the `NN-` index prefix.
pub fn clip_label(raw: &str) -> String {
    sanitize(raw)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
