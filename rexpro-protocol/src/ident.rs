//! Session and request identifiers.

use uuid::Uuid;

/// The all-zero identifier. As a session id it means "no session".
pub const NIL_IDENTIFIER: &str = "00000000-0000-0000-0000-000000000000";

/// Generates a random version 4 UUID in its 36-character hyphenated form.
pub fn new_identifier() -> String {
    Uuid::new_v4().to_string()
}
