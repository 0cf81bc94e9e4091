use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: i64,
}

impl Ticket {
    pub fn description_display(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description")
    }
}
