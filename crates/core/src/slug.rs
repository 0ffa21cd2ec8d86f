//! URL slugs and generated SKUs.

/// Turn a display name into a URL slug.
///
/// ASCII letters and digits are kept (lowercased). Runs of whitespace,
/// hyphens and underscores collapse to a single `-`. Everything else is
/// dropped, and the result never starts or ends with `-`.
///
/// ```
/// use ojasritu_core::slugify;
///
/// assert_eq!(slugify("Ashwagandha Churna (100g)"), "ashwagandha-churna-100g");
/// assert_eq!(slugify("  Triphala -- Tablets "), "triphala-tablets");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }

    out
}

/// Build the default SKU for a product: `PRD-<first 3 letters>-<id>`.
///
/// ```
/// use ojasritu_core::slug::default_sku;
///
/// assert_eq!(default_sku("Brahmi Oil", 42), "PRD-BRA-42");
/// ```
#[must_use]
pub fn default_sku(name: &str, id: i32) -> String {
    let prefix: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    format!("PRD-{prefix}-{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Kumkumadi Tailam"), "kumkumadi-tailam");
        assert_eq!(slugify("Chyawanprash_Classic"), "chyawanprash-classic");
    }

    #[test]
    fn test_slugify_drops_punctuation_and_non_ascii() {
        assert_eq!(slugify("Neem & Tulsi Face-Wash!"), "neem-tulsi-face-wash");
        assert_eq!(slugify("अश्वगंधा Ashwagandha"), "ashwagandha");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify(" -- "), "");
    }

    #[test]
    fn test_default_sku_short_name() {
        assert_eq!(default_sku("Go", 7), "PRD-GO-7");
    }
}
