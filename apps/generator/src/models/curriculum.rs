use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::request::Tier;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GrammarCategoryRow {
    pub id: i32,
    pub name: String,
    pub order_num: i32,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GrammarTopicRow {
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub order_num: i32,
    pub learning_objective: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// Achievement standard. `level` is one of 우수 / 보통 / 미흡.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GrammarAchievementRow {
    pub id: i32,
    pub topic_id: i32,
    pub level: String,
    pub description: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReadingTypeRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub order_num: i32,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VocabularyCategoryRow {
    pub id: i32,
    pub name: String,
    pub order_num: i32,
    pub learning_objective: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VocabularyAchievementRow {
    pub id: i32,
    pub category_id: i32,
    pub level: String,
    pub description: String,
    pub created_at: Option<NaiveDateTime>,
}

/// Word list tier as stored in `words.level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordLevel {
    Basic,
    Middle,
    High,
}

impl WordLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WordLevel::Basic => "basic",
            WordLevel::Middle => "middle",
            WordLevel::High => "high",
        }
    }

    pub fn parse(level: &str) -> Option<Self> {
        match level.trim().to_lowercase().as_str() {
            "basic" => Some(WordLevel::Basic),
            "middle" => Some(WordLevel::Middle),
            "high" => Some(WordLevel::High),
            _ => None,
        }
    }
}

impl From<Tier> for WordLevel {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Low => WordLevel::Basic,
            Tier::Medium => WordLevel::Middle,
            Tier::High => WordLevel::High,
        }
    }
}
