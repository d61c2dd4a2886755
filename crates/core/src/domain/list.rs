use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::list_item::ListItem;
use crate::domain::UserId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub user_id: UserId,
    pub name: String,
    /// Kept equal to `items.len()` on every save.
    pub items_count: i64,
    /// Newest first (insertion at head).
    pub items: Vec<ListItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
