//! E2E tests for auth error message translation
//!
//! The translation table is part of the public contract: raw backend
//! phrasings must map to the exact user-facing strings, with a keyword
//! fallback for variant phrasings and passthrough for everything else.

use teekdocs::auth::messages::translate;

#[test]
fn test_exact_table_entries() {
    assert_eq!(
        translate("Invalid login credentials"),
        "Incorrect email or password"
    );
    assert_eq!(
        translate("Email not confirmed"),
        "Email not verified yet; please check your inbox for the confirmation message"
    );
    assert_eq!(
        translate("User already registered"),
        "This email is already registered"
    );
    assert_eq!(
        translate("Password should be at least 6 characters"),
        "Password must be at least 6 characters"
    );
    assert_eq!(translate("Signups not allowed"), "Registration is currently closed");
}

#[test]
fn test_keyword_fallback_ignores_case_and_wrapping() {
    assert_eq!(
        translate("AuthApiError: INVALID LOGIN CREDENTIALS (400)"),
        "Incorrect email or password"
    );
    assert_eq!(
        translate("Request failed: too many requests"),
        "Too many requests; please retry later"
    );
}

#[test]
fn test_unknown_messages_pass_through_verbatim() {
    assert_eq!(translate("Database on fire"), "Database on fire");
    assert_eq!(translate(""), "");
}
