//! Static fallback credentials
//!
//! An optional allow-list of username/password/role triples used as a
//! degraded-mode principal source when the remote auth service is
//! unavailable. Never consulted while the backend is reachable.

use crate::config::FallbackUser;

/// Check credentials against the static allow-list
///
/// Returns the matching entry, or `None` if the list is empty or no
/// entry matches.
pub fn authenticate<'a>(
    users: &'a [FallbackUser],
    username: &str,
    password: &str,
) -> Option<&'a FallbackUser> {
    let matched = users
        .iter()
        .find(|user| user.username == username && user.password == password);
    if let Some(user) = matched {
        tracing::warn!(
            username = %user.username,
            role = %user.role,
            "Authenticated via static fallback credentials (degraded mode)"
        );
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<FallbackUser> {
        vec![FallbackUser {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            role: "admin".to_string(),
        }]
    }

    #[test]
    fn test_matching_credentials() {
        let users = users();
        let user = authenticate(&users, "admin", "admin123").unwrap();
        assert_eq!(user.role, "admin");
    }

    #[test]
    fn test_wrong_password_or_unknown_user() {
        let users = users();
        assert!(authenticate(&users, "admin", "wrong").is_none());
        assert!(authenticate(&users, "nobody", "admin123").is_none());
        assert!(authenticate(&[], "admin", "admin123").is_none());
    }
}
