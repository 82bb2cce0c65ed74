//! Domain entities mirrored from persistent storage.

use std::fmt;

use time::OffsetDateTime;

/// A stored board post. `password_hash` holds the PHC string produced at
/// creation time and is only ever used for verification.
#[derive(Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl fmt::Debug for PostRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostRecord")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("content", &self.content)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password_hash() {
        let now = OffsetDateTime::now_utc();
        let record = PostRecord {
            id: 7,
            title: "hello".into(),
            content: "world".into(),
            username: "alice".into(),
            password_hash: "$argon2id$v=19$secret-material".into(),
            created_at: now,
            updated_at: now,
        };

        let rendered = format!("{record:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("secret-material"));
    }
}
