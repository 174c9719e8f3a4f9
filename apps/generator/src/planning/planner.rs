//! Distribution Planner: partitions a content request into ordered work items.
//!
//! Pure and deterministic: no I/O, no randomness, no map iteration.
//!
//! Algorithm:
//! 1. total_ratio = Σ category.ratio (must be > 0)
//! 2. category_questions = floor(total_questions × ratio / total_ratio)
//!    (truncation; the shortfall is reported, never redistributed)
//! 3. Even split across subcategories; the first `remainder` subcategories get +1
//! 4. Distributed difficulty: high = max(1, floor(a × high%)), low = max(1, floor(a × low%)),
//!    medium = a − high − low
//! 5. Emit in category × subcategory × (high, medium, low) order, skipping zero counts

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::request::{CategoryKind, ContentRequest, DifficultyDistribution, Tier};

/// Tolerance used when checking that ratios / percentages add up to 100.
const SUM_EPSILON: f64 = 1e-9;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// One (category, subcategory, tier, count) allocation. `count` is always ≥ 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub category: CategoryKind,
    pub subcategory: String,
    pub count: u32,
    pub tier: Tier,
}

/// Non-fatal findings from planning. Surfaced as warnings and returned with the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanAnomaly {
    /// Category ratios do not add up to 100.
    RatioSumNot100 { total: f64 },
    /// Difficulty percentages do not add up to 100 (distributed mode only).
    DistributionSumNot100 { total: f64 },
    /// The medium tier came out ≤ 0 after high and low were floored to 1.
    /// Figures are the raw values before capping.
    NonPositiveMedium {
        category: CategoryKind,
        subcategory: String,
        allocation: u32,
        high: i64,
        medium: i64,
        low: i64,
    },
    /// Category truncation left the plan below the requested total.
    Shortfall { planned: u32, requested: u32 },
}

/// Ordered work items plus anything suspicious found while building them.
/// Item order drives generation order and pool concatenation downstream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub items: Vec<WorkItem>,
    pub anomalies: Vec<PlanAnomaly>,
}

impl Plan {
    pub fn total(&self) -> u32 {
        self.items.iter().map(|i| i.count).sum()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("category ratios sum to {0}; no questions can be derived from a non-positive weight")]
    NonPositiveTotalRatio(f64),
}

// ────────────────────────────────────────────────────────────────────────────
// Planning
// ────────────────────────────────────────────────────────────────────────────

/// Builds the plan for a validated request.
pub fn plan(request: &ContentRequest) -> Result<Plan, PlanError> {
    let total_ratio = request.total_ratio();
    // `!(x > 0)` also rejects NaN
    if !(total_ratio > 0.0) {
        return Err(PlanError::NonPositiveTotalRatio(total_ratio));
    }

    let mut anomalies = Vec::new();
    if (total_ratio - 100.0).abs() > SUM_EPSILON {
        anomalies.push(PlanAnomaly::RatioSumNot100 { total: total_ratio });
    }

    let fixed_tier = request.difficulty.fixed_tier();
    let distribution = &request.difficulty_distribution;
    if fixed_tier.is_none() && (distribution.total() - 100.0).abs() > SUM_EPSILON {
        anomalies.push(PlanAnomaly::DistributionSumNot100 {
            total: distribution.total(),
        });
    }

    let mut items = Vec::new();

    for category in &request.categories {
        let category_questions =
            proportional_floor(request.total_questions, category.ratio, total_ratio);
        let allocations = split_evenly(category_questions, category.subcategories.len());
        debug!(
            "Category {}: {} questions over {} subcategories {:?}",
            category.kind,
            category_questions,
            category.subcategories.len(),
            allocations
        );

        for (subcategory, allocation) in category.subcategories.iter().zip(allocations) {
            if allocation == 0 {
                continue;
            }

            let Some(tier) = fixed_tier else {
                let split = TierSplit::compute(allocation, distribution);
                if split.medium_is_deficient(distribution) {
                    anomalies.push(PlanAnomaly::NonPositiveMedium {
                        category: category.kind,
                        subcategory: subcategory.clone(),
                        allocation,
                        high: split.high,
                        medium: split.medium,
                        low: split.low,
                    });
                }
                for (tier, count) in split.capped(allocation) {
                    if count > 0 {
                        items.push(WorkItem {
                            category: category.kind,
                            subcategory: subcategory.clone(),
                            count,
                            tier,
                        });
                    }
                }
                continue;
            };

            items.push(WorkItem {
                category: category.kind,
                subcategory: subcategory.clone(),
                count: allocation,
                tier,
            });
        }
    }

    let planned: u32 = items.iter().map(|i| i.count).sum();
    if planned < request.total_questions {
        anomalies.push(PlanAnomaly::Shortfall {
            planned,
            requested: request.total_questions,
        });
    }

    for anomaly in &anomalies {
        warn!("Plan anomaly: {:?}", anomaly);
    }

    Ok(Plan { items, anomalies })
}

/// floor(total × weight / weight_sum), computed in that order.
fn proportional_floor(total: u32, weight: f64, weight_sum: f64) -> u32 {
    let share = (f64::from(total) * weight / weight_sum).floor();
    if share <= 0.0 {
        0
    } else {
        share as u32
    }
}

/// Splits `total` into `parts` near-equal shares; earlier parts take the remainder.
fn split_evenly(total: u32, parts: usize) -> Vec<u32> {
    if parts == 0 {
        return Vec::new();
    }
    let parts_u32 = parts as u32;
    let base = total / parts_u32;
    let remainder = (total % parts_u32) as usize;
    (0..parts)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Raw tier counts for one subcategory allocation. `medium` may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TierSplit {
    high: i64,
    medium: i64,
    low: i64,
}

impl TierSplit {
    fn compute(allocation: u32, distribution: &DifficultyDistribution) -> Self {
        let high = floored_tier(allocation, distribution.high);
        let low = floored_tier(allocation, distribution.low);
        let medium = i64::from(allocation) - high - low;
        Self { high, medium, low }
    }

    /// Medium ≤ 0 is only suspicious when the medium tier was asked for a share.
    fn medium_is_deficient(&self, distribution: &DifficultyDistribution) -> bool {
        self.medium < 0 || (self.medium == 0 && distribution.medium > 0.0)
    }

    /// Tier counts in emission order, capped so they never exceed `allocation`.
    /// High is served first, then low; medium gets whatever is left.
    fn capped(&self, allocation: u32) -> [(Tier, u32); 3] {
        let mut remaining = i64::from(allocation);
        let mut take = |wanted: i64| {
            let granted = wanted.clamp(0, remaining);
            remaining -= granted;
            granted as u32
        };
        let high = take(self.high);
        let low = take(self.low);
        let medium = take(self.medium);
        [(Tier::High, high), (Tier::Medium, medium), (Tier::Low, low)]
    }
}

/// Tier counts actually emitted for a raw split, in (high, medium, low) order.
pub fn emitted_tiers(allocation: u32, high: i64, medium: i64, low: i64) -> [(Tier, u32); 3] {
    TierSplit { high, medium, low }.capped(allocation)
}

/// max(1, floor(allocation × percent / 100)) for a tier with a positive share, else 0.
/// Never more than `allocation`, so the medium residual cannot overflow.
fn floored_tier(allocation: u32, percent: f64) -> i64 {
    if percent <= 0.0 {
        return 0;
    }
    let share = (f64::from(allocation) * percent / 100.0).floor() as i64;
    share.max(1).min(i64::from(allocation))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
