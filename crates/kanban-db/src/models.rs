//! Row types, one per table.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct BoardRow {
    pub id: String,
    pub title: String,
    pub owner_id: String,
}

#[derive(Debug, Clone)]
pub struct ColumnRow {
    pub id: String,
    pub title: String,
    pub position: i64,
}

#[derive(Debug, Clone)]
pub struct CardRow {
    pub id: String,
    pub column_id: String,
    pub title: String,
    pub details: String,
    pub position: i64,
    pub created_by_id: Option<String>,
    pub assigned_to_id: Option<String>,
}
