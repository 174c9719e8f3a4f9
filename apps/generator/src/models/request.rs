//! Content generation request: the loosely typed wire shape and the validated form.
//!
//! Requests arrive as JSON (HTTP body or a file passed to the CLI). They are
//! deserialized into `RawContentRequest`, then converted with `TryFrom` into a
//! `ContentRequest` whose invariants the planner can rely on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Used when a request omits `question_type`.
pub const DEFAULT_QUESTION_TYPE: &str = "multiple choice (4 options)";

// ────────────────────────────────────────────────────────────────────────────
// Enumerations
// ────────────────────────────────────────────────────────────────────────────

/// Content category. Closed set; hint resolution is implemented per variant
/// in `curriculum::hints`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Grammar,
    Reading,
    Vocabulary,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Grammar => "grammar",
            CategoryKind::Reading => "reading",
            CategoryKind::Vocabulary => "vocabulary",
        }
    }

    /// Accepts the English names and the Korean labels used by the curriculum tables.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "grammar" | "문법" => Some(CategoryKind::Grammar),
            "reading" | "독해" => Some(CategoryKind::Reading),
            "vocabulary" | "어휘" => Some(CategoryKind::Vocabulary),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three difficulty tiers a work item can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    /// Fixed reporting and emission order.
    pub const ALL: [Tier; 3] = [Tier::High, Tier::Medium, Tier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested difficulty: a single uniform tier, or a split across all three
/// tiers driven by `DifficultyDistribution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    High,
    Medium,
    Low,
    Distributed,
}

impl Difficulty {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" | "상" => Some(Difficulty::High),
            "medium" | "중" => Some(Difficulty::Medium),
            "low" | "하" => Some(Difficulty::Low),
            "distributed" | "분배" => Some(Difficulty::Distributed),
            _ => None,
        }
    }

    /// The uniform tier, or `None` for distributed difficulty.
    pub fn fixed_tier(&self) -> Option<Tier> {
        match self {
            Difficulty::High => Some(Tier::High),
            Difficulty::Medium => Some(Tier::Medium),
            Difficulty::Low => Some(Tier::Low),
            Difficulty::Distributed => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validated request
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub kind: CategoryKind,
    pub subcategories: Vec<String>,
    /// Relative weight. Ratios need not sum to 100.
    pub ratio: f64,
}

/// Tier percentages of a subcategory allocation. Used only under
/// `Difficulty::Distributed`; need not sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyDistribution {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for DifficultyDistribution {
    fn default() -> Self {
        Self {
            high: 20.0,
            medium: 60.0,
            low: 20.0,
        }
    }
}

impl DifficultyDistribution {
    pub fn total(&self) -> f64 {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentRequest {
    pub grade: u32,
    pub categories: Vec<Category>,
    pub question_type: String,
    pub difficulty: Difficulty,
    pub total_questions: u32,
    pub difficulty_distribution: DifficultyDistribution,
}

impl ContentRequest {
    pub fn total_ratio(&self) -> f64 {
        self.categories.iter().map(|c| c.ratio).sum()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire shape
// ────────────────────────────────────────────────────────────────────────────

/// Request as received. Every field is optional so that shape errors surface
/// as a `RequestError` naming the field instead of a generic serde message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawContentRequest {
    #[serde(default)]
    pub grade: Option<i64>,
    #[serde(default)]
    pub categories: Option<Vec<RawCategory>>,
    #[serde(default, alias = "questionType")]
    pub question_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, alias = "totalQuestions")]
    pub total_questions: Option<i64>,
    #[serde(default, alias = "difficultyDistribution")]
    pub difficulty_distribution: Option<RawDifficultyDistribution>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subcategories: Option<Vec<String>>,
    #[serde(default)]
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDifficultyDistribution {
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub medium: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("grade must be a positive integer, got {0}")]
    InvalidGrade(i64),

    #[error("at least one category is required")]
    NoCategories,

    #[error("unknown category '{0}' (expected grammar, reading or vocabulary)")]
    UnknownCategory(String),

    #[error("category '{0}' has no subcategories")]
    EmptySubcategories(String),

    #[error("category '{category}' has an invalid ratio {ratio}")]
    InvalidRatio { category: String, ratio: f64 },

    #[error("category ratios sum to {0}; the total must be positive")]
    NonPositiveTotalRatio(f64),

    #[error("unknown difficulty '{0}' (expected high, medium, low or distributed)")]
    UnknownDifficulty(String),

    #[error("total_questions must be a positive integer, got {0}")]
    InvalidTotalQuestions(i64),

    #[error("difficulty_distribution.{tier} must be between 0 and 100, got {value}")]
    InvalidPercentage { tier: &'static str, value: f64 },
}

impl TryFrom<RawContentRequest> for ContentRequest {
    type Error = RequestError;

    fn try_from(raw: RawContentRequest) -> Result<Self, Self::Error> {
        let grade = raw.grade.ok_or(RequestError::MissingField("grade"))?;
        let grade = u32::try_from(grade)
            .ok()
            .filter(|g| *g > 0)
            .ok_or(RequestError::InvalidGrade(grade))?;

        let raw_categories = raw
            .categories
            .ok_or(RequestError::MissingField("categories"))?;
        if raw_categories.is_empty() {
            return Err(RequestError::NoCategories);
        }
        let categories = raw_categories
            .into_iter()
            .map(Category::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let total_ratio: f64 = categories.iter().map(|c| c.ratio).sum();
        if total_ratio <= 0.0 {
            return Err(RequestError::NonPositiveTotalRatio(total_ratio));
        }

        let difficulty_label = raw
            .difficulty
            .ok_or(RequestError::MissingField("difficulty"))?;
        let difficulty = Difficulty::parse(&difficulty_label)
            .ok_or(RequestError::UnknownDifficulty(difficulty_label))?;

        let total_questions = raw
            .total_questions
            .ok_or(RequestError::MissingField("total_questions"))?;
        let total_questions = u32::try_from(total_questions)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(RequestError::InvalidTotalQuestions(total_questions))?;

        let difficulty_distribution = match raw.difficulty_distribution {
            Some(d) => DifficultyDistribution::try_from(d)?,
            None => DifficultyDistribution::default(),
        };

        let question_type = raw
            .question_type
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| DEFAULT_QUESTION_TYPE.to_string());

        Ok(ContentRequest {
            grade,
            categories,
            question_type,
            difficulty,
            total_questions,
            difficulty_distribution,
        })
    }
}

impl TryFrom<RawCategory> for Category {
    type Error = RequestError;

    fn try_from(raw: RawCategory) -> Result<Self, Self::Error> {
        let name = raw.name.ok_or(RequestError::MissingField("categories[].name"))?;
        let kind = CategoryKind::parse(&name).ok_or_else(|| RequestError::UnknownCategory(name.clone()))?;

        let subcategories: Vec<String> = raw
            .subcategories
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if subcategories.is_empty() {
            return Err(RequestError::EmptySubcategories(name));
        }

        let ratio = raw.ratio.ok_or(RequestError::MissingField("categories[].ratio"))?;
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(RequestError::InvalidRatio {
                category: name,
                ratio,
            });
        }

        Ok(Category {
            kind,
            subcategories,
            ratio,
        })
    }
}

impl TryFrom<RawDifficultyDistribution> for DifficultyDistribution {
    type Error = RequestError;

    /// Missing tiers fall back to the 20/60/20 default for that tier.
    fn try_from(raw: RawDifficultyDistribution) -> Result<Self, Self::Error> {
        let defaults = DifficultyDistribution::default();
        let check = |tier: &'static str, value: Option<f64>, fallback: f64| {
            let value = value.unwrap_or(fallback);
            if (0.0..=100.0).contains(&value) {
                Ok(value)
            } else {
                Err(RequestError::InvalidPercentage { tier, value })
            }
        };
        Ok(DifficultyDistribution {
            high: check("high", raw.high, defaults.high)?,
            medium: check("medium", raw.medium, defaults.medium)?,
            low: check("low", raw.low, defaults.low)?,
        })
    }
}

impl RawContentRequest {
    /// Grade-2 mixed request used by the CLI when no request file is given.
    pub fn sample() -> Self {
        let category = |name: &str, subs: &[&str], ratio: f64| RawCategory {
            name: Some(name.to_string()),
            subcategories: Some(subs.iter().map(|s| s.to_string()).collect()),
            ratio: Some(ratio),
        };
        RawContentRequest {
            grade: Some(2),
            categories: Some(vec![
                category("reading", &["주제/제목/요지 추론", "세부 정보 파악"], 50.0),
                category("grammar", &["현재완료", "to부정사"], 30.0),
                category("vocabulary", &["개인 및 주변 생활"], 20.0),
            ]),
            question_type: Some(DEFAULT_QUESTION_TYPE.to_string()),
            difficulty: Some("distributed".to_string()),
            total_questions: Some(10),
            difficulty_distribution: Some(RawDifficultyDistribution {
                high: Some(20.0),
                medium: Some(60.0),
                low: Some(20.0),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<ContentRequest, RequestError> {
        let raw: RawContentRequest = serde_json::from_value(value).unwrap();
        ContentRequest::try_from(raw)
    }

    #[test]
    fn test_sample_request_is_valid() {
        let request = ContentRequest::try_from(RawContentRequest::sample()).unwrap();
        assert_eq!(request.grade, 2);
        assert_eq!(request.categories.len(), 3);
        assert_eq!(request.difficulty, Difficulty::Distributed);
        assert_eq!(request.total_ratio(), 100.0);
    }

    #[test]
    fn test_camel_case_aliases_and_korean_labels() {
        let request = parse(json!({
            "grade": 1,
            "categories": [{"name": "문법", "subcategories": ["be동사"], "ratio": 100}],
            "questionType": "빈칸 채우기",
            "difficulty": "중",
            "totalQuestions": 4
        }))
        .unwrap();
        assert_eq!(request.categories[0].kind, CategoryKind::Grammar);
        assert_eq!(request.difficulty, Difficulty::Medium);
        assert_eq!(request.question_type, "빈칸 채우기");
        assert_eq!(request.total_questions, 4);
    }

    #[test]
    fn test_missing_distribution_defaults_to_20_60_20() {
        let request = parse(json!({
            "grade": 3,
            "categories": [{"name": "reading", "subcategories": ["요지"], "ratio": 1}],
            "difficulty": "distributed",
            "total_questions": 5
        }))
        .unwrap();
        assert_eq!(request.difficulty_distribution, DifficultyDistribution::default());
        assert_eq!(request.question_type, DEFAULT_QUESTION_TYPE);
    }

    #[test]
    fn test_zero_total_ratio_is_rejected() {
        let err = parse(json!({
            "grade": 2,
            "categories": [
                {"name": "grammar", "subcategories": ["a"], "ratio": 0},
                {"name": "reading", "subcategories": ["b"], "ratio": 0}
            ],
            "difficulty": "high",
            "total_questions": 5
        }))
        .unwrap_err();
        assert_eq!(err, RequestError::NonPositiveTotalRatio(0.0));
    }

    #[test]
    fn test_negative_ratio_is_rejected() {
        let err = parse(json!({
            "grade": 2,
            "categories": [{"name": "grammar", "subcategories": ["a"], "ratio": -5}],
            "difficulty": "high",
            "total_questions": 5
        }))
        .unwrap_err();
        assert!(matches!(err, RequestError::InvalidRatio { .. }));
    }

    #[test]
    fn test_unknown_category_and_difficulty() {
        let err = parse(json!({
            "grade": 2,
            "categories": [{"name": "listening", "subcategories": ["a"], "ratio": 1}],
            "difficulty": "high",
            "total_questions": 5
        }))
        .unwrap_err();
        assert_eq!(err, RequestError::UnknownCategory("listening".to_string()));

        let err = parse(json!({
            "grade": 2,
            "categories": [{"name": "grammar", "subcategories": ["a"], "ratio": 1}],
            "difficulty": "extreme",
            "total_questions": 5
        }))
        .unwrap_err();
        assert_eq!(err, RequestError::UnknownDifficulty("extreme".to_string()));
    }

    #[test]
    fn test_blank_subcategories_are_rejected() {
        let err = parse(json!({
            "grade": 2,
            "categories": [{"name": "grammar", "subcategories": ["  "], "ratio": 1}],
            "difficulty": "low",
            "total_questions": 5
        }))
        .unwrap_err();
        assert_eq!(err, RequestError::EmptySubcategories("grammar".to_string()));
    }

    #[test]
    fn test_non_positive_grade_and_total() {
        let err = parse(json!({
            "grade": 0,
            "categories": [{"name": "grammar", "subcategories": ["a"], "ratio": 1}],
            "difficulty": "low",
            "total_questions": 5
        }))
        .unwrap_err();
        assert_eq!(err, RequestError::InvalidGrade(0));

        let err = parse(json!({
            "grade": 1,
            "categories": [{"name": "grammar", "subcategories": ["a"], "ratio": 1}],
            "difficulty": "low",
            "total_questions": -3
        }))
        .unwrap_err();
        assert_eq!(err, RequestError::InvalidTotalQuestions(-3));
    }

    #[test]
    fn test_missing_fields_are_named() {
        let err = parse(json!({ "categories": [] })).unwrap_err();
        assert_eq!(err, RequestError::MissingField("grade"));

        let err = parse(json!({ "grade": 1 })).unwrap_err();
        assert_eq!(err, RequestError::MissingField("categories"));
    }

    #[test]
    fn test_partial_distribution_fills_missing_tiers() {
        let request = parse(json!({
            "grade": 2,
            "categories": [{"name": "grammar", "subcategories": ["a"], "ratio": 1}],
            "difficulty": "distributed",
            "total_questions": 5,
            "difficulty_distribution": {"high": 50}
        }))
        .unwrap();
        assert_eq!(request.difficulty_distribution.high, 50.0);
        assert_eq!(request.difficulty_distribution.medium, 60.0);
        assert_eq!(request.difficulty_distribution.low, 20.0);
    }

    #[test]
    fn test_out_of_range_percentage_is_rejected() {
        let result = parse(json!({
            "grade": 2,
            "categories": [{"name": "grammar", "subcategories": ["a"], "ratio": 1}],
            "difficulty": "distributed",
            "total_questions": 5,
            "difficulty_distribution": {"high": 1e300, "medium": 0, "low": 1e300}
        }));
        assert!(
            matches!(result, Err(RequestError::InvalidPercentage { tier: "high", .. })),
            "got {result:?}"
        );

        let result = parse(json!({
            "grade": 2,
            "categories": [{"name": "grammar", "subcategories": ["a"], "ratio": 1}],
            "difficulty": "distributed",
            "total_questions": 5,
            "difficulty_distribution": {"high": 20, "medium": 60, "low": -1}
        }));
        assert!(matches!(result, Err(RequestError::InvalidPercentage { tier: "low", .. })));
    }
}
