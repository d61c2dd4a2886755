use serde::{Deserialize, Serialize};

pub mod list;
pub mod list_item;
pub mod product;
pub mod purchase_list;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);
