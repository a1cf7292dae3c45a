//! List splitting for container and array conversion
//!
//! Raw list values are comma-separated; a backslash escapes a comma and
//! nothing else.

/// Split a raw value on unescaped commas.
///
/// Commas preceded by a backslash do not split; the `\,` pair collapses
/// to a literal comma in the part that contains it. All other
/// backslashes are preserved verbatim. An empty input yields no
/// elements, and a trailing unescaped comma yields a trailing empty
/// element.
pub fn split(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                chars.next();
                current.push(',');
            }
            ',' => parts.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn escape(part: &str) -> String {
        part.replace(',', "\\,")
    }

    #[test]
    fn test_plain_split() {
        assert_eq!(split("1,2,3"), vec!["1", "2", "3"]);
        assert_eq!(split("solo"), vec!["solo"]);
    }

    #[test]
    fn test_escaped_comma_joins_parts() {
        assert_eq!(split("a\\,b,c"), vec!["a,b", "c"]);
        assert_eq!(split("\\,"), vec![","]);
    }

    #[test]
    fn test_other_backslashes_are_verbatim() {
        assert_eq!(split("a\\b,c"), vec!["a\\b", "c"]);
        assert_eq!(split("tail\\"), vec!["tail\\"]);
    }

    #[test]
    fn test_double_backslash_before_comma() {
        // The second backslash escapes the comma; the first stays.
        assert_eq!(split("a\\\\,b"), vec!["a\\,b"]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert_eq!(split(""), Vec::<String>::new());
    }

    #[test]
    fn test_trailing_comma_yields_trailing_empty_element() {
        assert_eq!(split("a,"), vec!["a", ""]);
        assert_eq!(split(","), vec!["", ""]);
    }

    #[test]
    fn test_empty_middle_element() {
        assert_eq!(split("a,,b"), vec!["a", "", "b"]);
    }

    proptest! {
        #[test]
        fn prop_split_round_trips_comma_free_parts(
            parts in proptest::collection::vec("[^,]{0,12}", 1..6)
        ) {
            // Backslash-final parts would swallow the joining comma, so
            // they are out of scope for the unescaped round trip. A lone
            // empty part joins to the empty input, which by definition
            // splits to nothing.
            prop_assume!(parts.iter().all(|p| !p.ends_with('\\')));
            prop_assume!(!(parts.len() == 1 && parts[0].is_empty()));
            prop_assert_eq!(split(&parts.join(",")), parts);
        }

        #[test]
        fn prop_split_round_trips_escaped_parts(
            parts in proptest::collection::vec("[a-z,]{0,12}", 1..6)
        ) {
            prop_assume!(!(parts.len() == 1 && parts[0].is_empty()));
            let joined = parts
                .iter()
                .map(|p| escape(p))
                .collect::<Vec<_>>()
                .join(",");
            prop_assert_eq!(split(&joined), parts);
        }
    }
}
