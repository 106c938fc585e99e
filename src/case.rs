//! Column-name case conversions between snake_case and camelCase.
//!
//! These transforms are intentionally not perfect inverses of each other:
//! uppercase runs ("HTTPServer") and leading digits do not round-trip. That
//! asymmetry is accepted and documented rather than patched, because callers
//! rely on the exact output for record keys.

/// Convert a snake_case column name to camelCase.
///
/// Splits on `_`, uppercases the first letter of each non-empty segment,
/// concatenates, then lowercases the first character of the result. Doubled
/// underscores contribute nothing (empty segments are skipped). If the
/// computed result is empty (input was only underscores, or empty), the
/// original string is returned verbatim.
///
/// ```
/// use rowcast::case::to_camel_case;
/// assert_eq!(to_camel_case("USER_ID"), "userId");
/// assert_eq!(to_camel_case("id"), "id");
/// ```
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for part in s.to_lowercase().split('_') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() {
        return s.to_string();
    }
    let mut chars = out.chars();
    let first = chars.next().unwrap_or_default();
    let mut result: String = first.to_lowercase().collect();
    result.push_str(chars.as_str());
    result
}

/// Convert a camelCase column name to snake_case.
///
/// Inserts `_` before each uppercase run that directly follows a lowercase
/// letter, then lowercases the whole string.
///
/// ```
/// use rowcast::case::to_snake_case;
/// assert_eq!(to_snake_case("userId"), "user_id");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_lowercase();
            out.extend(c.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_basic() {
        assert_eq!(to_camel_case("USER_ID"), "userId");
        assert_eq!(to_camel_case("user_id"), "userId");
        assert_eq!(to_camel_case("first_name_initial"), "firstNameInitial");
    }

    #[test]
    fn test_camel_case_no_underscore() {
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(to_camel_case("NAME"), "name");
    }

    #[test]
    fn test_camel_case_doubled_underscore_skipped() {
        assert_eq!(to_camel_case("user__id"), "userId");
        assert_eq!(to_camel_case("_user_id"), "userId");
    }

    #[test]
    fn test_camel_case_degenerate_inputs() {
        // Only-underscore and empty inputs fall back to the original string.
        assert_eq!(to_camel_case(""), "");
        assert_eq!(to_camel_case("___"), "___");
    }

    #[test]
    fn test_camel_case_idempotent_without_underscores() {
        for s in ["userId", "name", "a", "alreadyCamelCase"] {
            assert_eq!(to_camel_case(&to_camel_case(s)), to_camel_case(s));
        }
    }

    #[test]
    fn test_snake_case_basic() {
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("firstNameInitial"), "first_name_initial");
        assert_eq!(to_snake_case("id"), "id");
    }

    #[test]
    fn test_snake_case_uppercase_run() {
        // An uppercase run gets a single separator at its start; this is the
        // documented lossy behavior, not a bug.
        assert_eq!(to_snake_case("parseHTTPHeader"), "parse_httpheader");
        assert_eq!(to_snake_case("ID"), "id");
    }

    #[test]
    fn test_not_inverses() {
        // Round-tripping is not guaranteed for uppercase runs.
        let original = "httpStatusCODE";
        let round = to_camel_case(&to_snake_case(original));
        assert_ne!(round, original);
    }
}
