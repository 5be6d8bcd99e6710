//! Database row types — these map directly to SQLite rows.

pub struct PostRow {
    pub id: String,
    pub title: String,
    pub created_at: String,
}

pub struct InboxRow {
    pub id: String,
    pub to_user_id: String,
    pub subject: String,
    pub body: String,
    pub created_at: String,
}
