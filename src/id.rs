use uuid::Uuid;

/// Generates a new opaque record ID (a random hyphenated UUID).
pub fn new_id() -> String {
    Uuid::new_v4().to_hyphenated().to_string()
}
