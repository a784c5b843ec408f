//! Output file naming.

/// Name used when a title sanitizes to nothing.
pub const FALLBACK_NAME: &str = "product_sheet";

/// Extension of rendered product sheets.
pub const OUTPUT_EXTENSION: &str = "html";

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '(' | ')')
}

/// Strip characters that are unsafe in file names and trim the result.
///
/// Letters, digits, spaces and `-_()` are kept; everything else is removed.
/// An empty result becomes [`FALLBACK_NAME`].
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title.chars().filter(|c| is_allowed(*c)).collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name of the product sheet for a (suffixed) title.
pub fn output_file_name(title: &str) -> String {
    format!("{}.{}", sanitize_title(title), OUTPUT_EXTENSION)
}
