use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Label used for questions whose topic is blank.
pub const UNCATEGORIZED_TOPIC: &str = "uncategorized";

/// Canonical comparison key: trimmed, lowercased, diacritics stripped.
///
/// Used for answer options and topic labels alike, so `"a"` matches `"A"`
/// and `"Matemática"` matches `"matematica"`.
pub fn normalize_key(value: &str) -> String {
    value
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized topic key; blank topics fall into the uncategorized bucket.
pub fn topic_key(topic: &str) -> String {
    let key = normalize_key(topic);
    if key.is_empty() {
        UNCATEGORIZED_TOPIC.to_string()
    } else {
        key
    }
}

/// Display label for a topic; blank topics read as uncategorized.
pub fn topic_label(topic: &str) -> String {
    let label = topic.trim();
    if label.is_empty() {
        UNCATEGORIZED_TOPIC.to_string()
    } else {
        label.to_string()
    }
}

/// Truncates to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => value[..byte_idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_folds_case_and_accents() {
        assert_eq!(normalize_key("Matemática"), "matematica");
        assert_eq!(normalize_key("  GEOGRAFÍA "), "geografia");
        assert_eq!(normalize_key("a"), normalize_key("A"));
        assert_eq!(normalize_key("Ação"), "acao");
    }

    #[test]
    fn test_normalize_key_blank() {
        assert_eq!(normalize_key("   "), "");
    }

    #[test]
    fn test_topic_key_defaults_blank_to_uncategorized() {
        assert_eq!(topic_key(""), UNCATEGORIZED_TOPIC);
        assert_eq!(topic_key("  "), UNCATEGORIZED_TOPIC);
        assert_eq!(topic_key("História"), "historia");
        assert_eq!(topic_label(" "), UNCATEGORIZED_TOPIC);
        assert_eq!(topic_label(" História "), "História");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("ãéí", 2), "ãé");
        assert_eq!(truncate_chars("short", 180), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
