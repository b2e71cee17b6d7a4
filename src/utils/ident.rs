//! Commit id generation and branch-name validation.

use sha1::{Digest, Sha1};

/// Length of a full commit id in hex characters.
pub const COMMIT_ID_LEN: usize = 40;

/// Shortest hex prefix accepted when resolving a commit by prefix.
pub const MIN_PREFIX_LEN: usize = 4;

/// Marker hashed in place of the parent id for root commits.
const EMPTY_PARENT: &str = "0000000000000000000000000000000000000000";

/// Derives a new commit id from the parent id, message, and timestamp salt.
///
/// The id is the lowercase hex SHA-1 digest of `parent \n message \n salt`
/// where the salt is the timestamp rendered with nanosecond precision.
/// Deriving from the parent id makes cycles structurally impossible; the
/// subsecond salt keeps rapid commits with identical messages distinct.
#[must_use]
pub fn generate_commit_id(parent: Option<&str>, message: &str, timestamp: f64) -> String {
    let mut hasher = Sha1::new();
    hasher.update(parent.unwrap_or(EMPTY_PARENT).as_bytes());
    hasher.update(b"\n");
    hasher.update(message.as_bytes());
    hasher.update(b"\n");
    hasher.update(format!("{timestamp:.9}").as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks whether a string has the shape of a full commit id.
#[must_use]
pub fn is_commit_id(s: &str) -> bool {
    s.len() == COMMIT_ID_LEN && is_hex(s)
}

/// Checks whether a string is usable as a commit-id prefix.
#[must_use]
pub fn is_id_prefix(s: &str) -> bool {
    s.len() >= MIN_PREFIX_LEN && s.len() <= COMMIT_ID_LEN && is_hex(s)
}

fn is_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validates a branch name against the grammar `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Names are case-sensitive; no whitespace and no punctuation other than
/// underscore is accepted.
#[must_use]
pub fn is_valid_branch_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
