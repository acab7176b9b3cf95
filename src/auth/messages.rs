//! Backend error message translation
//!
//! Maps raw auth service error strings to user-facing messages. Exact
//! matches first, then an ordered case-insensitive keyword scan, then the
//! raw message unchanged. Fail-open: unknown errors are never hidden.

/// Exact-match table of known backend error strings
const EXACT: &[(&str, &str)] = &[
    ("Invalid login credentials", "Incorrect email or password"),
    (
        "Email not confirmed",
        "Email not verified yet; please check your inbox for the confirmation message",
    ),
    ("User already registered", "This email is already registered"),
    (
        "Password should be at least 6 characters",
        "Password must be at least 6 characters",
    ),
    ("Invalid email", "Invalid email address"),
    (
        "Unable to validate email address: invalid format",
        "Invalid email address",
    ),
    ("Signups not allowed", "Registration is currently closed"),
    (
        "For security purposes, you can only request this once every 60 seconds",
        "Too many requests; please retry in 60 seconds",
    ),
    ("Unable to create user", "Unable to create the account"),
    ("User creation failed", "Account creation failed"),
];

/// Ordered keyword groups for the substring fallback; first match wins
const KEYWORDS: &[(&[&str], &str)] = &[
    (
        &["email rate limit", "rate limit exceeded"],
        "Email rate limit reached; please retry later",
    ),
    (
        &["too many requests", "too many"],
        "Too many requests; please retry later",
    ),
    (
        &["invalid login credentials", "invalid credentials"],
        "Incorrect email or password",
    ),
    (
        &["email not confirmed", "not confirmed"],
        "Email not verified yet; please check your inbox for the confirmation message",
    ),
    (
        &["user already registered", "already registered"],
        "This email is already registered",
    ),
    (
        &["signups not allowed", "not allowed"],
        "Registration is currently closed",
    ),
];

/// Translate a raw backend error message to a user-facing one
///
/// Deterministic and pure. Unrecognized messages pass through unchanged.
pub fn translate(raw: &str) -> String {
    if let Some((_, translated)) = EXACT.iter().find(|(known, _)| *known == raw) {
        tracing::debug!(raw, "Auth error translated (exact match)");
        return (*translated).to_string();
    }

    let lowered = raw.to_lowercase();
    for (needles, translated) in KEYWORDS {
        if needles.iter().any(|needle| lowered.contains(needle)) {
            tracing::debug!(raw, "Auth error translated (keyword match)");
            return (*translated).to_string();
        }
    }

    tracing::debug!(raw, "Auth error passed through untranslated");
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matches_cover_the_whole_table() {
        for (known, translated) in EXACT {
            assert_eq!(translate(known), *translated);
        }
    }

    #[test]
    fn test_keyword_fallback_is_case_insensitive() {
        assert_eq!(
            translate("AuthApiError: Too Many Requests from this IP"),
            "Too many requests; please retry later"
        );
        assert_eq!(
            translate("login failed: invalid credentials supplied"),
            "Incorrect email or password"
        );
        assert_eq!(
            translate("blocked: email rate limit hit"),
            "Email rate limit reached; please retry later"
        );
    }

    #[test]
    fn test_first_keyword_group_wins() {
        // Contains both a rate-limit keyword and "too many"; the rate
        // limit group is registered first.
        assert_eq!(
            translate("rate limit exceeded: too many attempts"),
            "Email rate limit reached; please retry later"
        );
    }

    #[test]
    fn test_unknown_messages_pass_through() {
        assert_eq!(translate("database exploded"), "database exploded");
        assert_eq!(translate(""), "");
    }
}
