//! Approximate word comparison tolerant of single recognition errors.
//!
//! Not used by [`AddressParser`](super::AddressParser): there is no agreed rule
//! yet for when a near-miss street type should be accepted.

/// Whether `word` is close enough to `reference`.
///
/// Lengths may differ by at most one character, and the number of positional
/// mismatches over the shorter length may not exceed `len(reference) / 4 + 1`.
///
/// # Examples
///
/// ```rust
/// use address_ocr::address::fuzzy::is_similar;
///
/// assert!(is_similar("улнца", "улица"));
/// assert!(!is_similar("ул", "улица"));
/// ```
pub fn is_similar(word: &str, reference: &str) -> bool {
    let word: Vec<char> = word.chars().collect();
    let reference: Vec<char> = reference.chars().collect();

    if word.len().abs_diff(reference.len()) > 1 {
        return false;
    }

    let mismatches = word
        .iter()
        .zip(reference.iter())
        .filter(|(a, b)| a != b)
        .count();

    mismatches <= reference.len() / 4 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_words_are_similar() {
        assert!(is_similar("проспект", "проспект"));
    }

    #[test]
    fn test_error_budget_scales_with_length() {
        // "проспект" has 8 chars: up to 3 mismatches allowed
        assert!(is_similar("прасрект", "проспект"));
        assert!(is_similar("пхасхект", "проспект"));
        assert!(!is_similar("пхасхекх", "проспект"));
    }

    #[test]
    fn test_length_difference_over_one_is_rejected() {
        assert!(is_similar("проспек", "проспект"));
        assert!(!is_similar("просп", "проспект"));
    }
}
