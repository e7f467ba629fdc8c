/// Greedy word-wrap for a person's display name.
///
/// Splits the name on spaces and repeatedly merges a token with its right
/// neighbor while their summed character length stays under
/// `chars_per_face`. A freshly merged token is re-tested against what is now
/// to its right before the scan advances, but tokens the scan has already
/// passed are never revisited. The result is the token list, one line per
/// token.
///
/// This is deliberately not an optimal line breaker: the single left-to-right
/// pass matches how labels are laid out under each face, where early words
/// packing tighter than late words reads naturally.
pub fn wrap_name(name: &str, chars_per_face: usize) -> Vec<String> {
    let mut tokens: Vec<String> = name.split_whitespace().map(str::to_string).collect();

    let mut i = 0;
    while i + 1 < tokens.len() {
        let merged_len = tokens[i].chars().count() + tokens[i + 1].chars().count();
        if merged_len < chars_per_face {
            let next = tokens.remove(i + 1);
            tokens[i].push(' ');
            tokens[i].push_str(&next);
            // The merged token may combine again with its new right neighbor.
        } else {
            i += 1;
        }
    }

    tokens
}

/// Wrapped label text with explicit line breaks, ready for a rendering host.
pub fn format_label(name: &str, chars_per_face: usize) -> String {
    wrap_name(name, chars_per_face).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_example_from_docs() {
        // "Anna"+"Maria" = 9 < 10 merges; "Anna Maria"+"Garcia" = 16 stops.
        assert_eq!(
            wrap_name("Anna Maria Garcia", 10),
            vec!["Anna Maria".to_string(), "Garcia".to_string()]
        );
    }

    #[test]
    fn test_wrap_short_name_single_line() {
        assert_eq!(wrap_name("Bo Wu", 10), vec!["Bo Wu".to_string()]);
    }

    #[test]
    fn test_wrap_merged_token_merges_again() {
        // "Al"+"Bo" = 4 < 12 -> "Al Bo"; "Al Bo"+"Cy" = 7 < 12 -> "Al Bo Cy".
        assert_eq!(wrap_name("Al Bo Cy", 12), vec!["Al Bo Cy".to_string()]);
    }

    #[test]
    fn test_wrap_never_revisits_passed_tokens() {
        // "Johannes"+"Brahms" = 14, no merge, scan moves on;
        // "Brahms"+"Jr" = 8 < 10 merges. The earlier pair is not re-tested
        // even though removing "Jr" changed nothing to its left.
        assert_eq!(
            wrap_name("Johannes Brahms Jr", 10),
            vec!["Johannes".to_string(), "Brahms Jr".to_string()]
        );
    }

    #[test]
    fn test_wrap_boundary_is_strict() {
        // Summed length equal to the threshold does not merge.
        assert_eq!(
            wrap_name("Anna Maria", 9),
            vec!["Anna".to_string(), "Maria".to_string()]
        );
        assert_eq!(wrap_name("Anna Maria", 10), vec!["Anna Maria".to_string()]);
    }

    #[test]
    fn test_wrap_single_and_empty() {
        assert_eq!(wrap_name("Rick", 10), vec!["Rick".to_string()]);
        assert!(wrap_name("", 10).is_empty());
        assert!(wrap_name("   ", 10).is_empty());
    }

    #[test]
    fn test_format_label_joins_with_newlines() {
        assert_eq!(format_label("Anna Maria Garcia", 10), "Anna Maria\nGarcia");
    }
}
