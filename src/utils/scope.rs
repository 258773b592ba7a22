//! Scope-string helpers shared by the grant handlers, token builder and
//! validator. OAuth scopes are carried on the wire and in storage as a
//! single space-delimited string (RFC 6749 §3.3); internally we work with
//! an ordered list of tokens, since scope order is preserved from the
//! original request through to the issued token.

use std::collections::HashSet;

/// Split a space-delimited scope string into its individual tokens,
/// dropping empty segments from repeated/leading/trailing whitespace.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Re-join scope tokens into the wire/storage representation.
pub fn join_scopes<I, S>(scopes: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    scopes
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if every token in `requested` also appears in `granted` — the
/// downscoping check used by refresh_token and token_exchange grants.
pub fn is_subset(requested: &[String], granted: &[String]) -> bool {
    let granted: HashSet<&str> = granted.iter().map(String::as_str).collect();
    requested.iter().all(|s| granted.contains(s.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scopes_collapses_whitespace() {
        assert_eq!(
            parse_scopes("  openid  profile\temail "),
            vec!["openid", "profile", "email"]
        );
    }

    #[test]
    fn join_scopes_round_trips_with_parse() {
        let scopes = parse_scopes("a b c");
        assert_eq!(join_scopes(&scopes), "a b c");
    }

    #[test]
    fn is_subset_detects_escalation() {
        let granted = parse_scopes("openid profile");
        assert!(is_subset(&parse_scopes("openid"), &granted));
        assert!(!is_subset(&parse_scopes("openid email"), &granted));
    }
}
