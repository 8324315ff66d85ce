//! Organization key deriver: turns an email domain into a directory search term.
//!
//! `jane@AcmeCorp.com` → `Acme`, `bob@BigWidgets.io` → `Big Widgets`.

use std::sync::LazyLock;

use regex::Regex;

/// Trailing legal-entity suffixes, matched case-insensitively.
static LEGAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:corp|inc|llc|ltd|company|co)$").expect("suffix pattern compiles")
});

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("camel pattern compiles"));

/// Derive the organization search key for an email address.
///
/// Takes the first label of the domain and normalizes it with
/// [`normalize_label`]. Callers pass emails validated by the line parser.
pub fn derive_key(email: &str) -> String {
    let domain = email.split_once('@').map(|(_, d)| d).unwrap_or(email);
    let label = domain.split('.').next().unwrap_or(domain);
    normalize_label(label)
}

/// Strip one trailing legal-entity suffix and split camel-case words.
///
/// A label made entirely of a suffix (`inc.com`) is kept as is rather than
/// collapsing to an empty search term.
pub fn normalize_label(label: &str) -> String {
    let stripped = LEGAL_SUFFIX.replace(label, "");
    let base = if stripped.trim().is_empty() {
        label
    } else {
        stripped.as_ref()
    };

    CAMEL_BOUNDARY
        .replace_all(base, "$1 $2")
        .trim()
        .to_string()
}
