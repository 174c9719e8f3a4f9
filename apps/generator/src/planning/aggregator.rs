//! Plan Aggregator: per-category and per-tier totals for validation and display.

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::request::{CategoryKind, Tier};
use crate::planning::planner::{emitted_tiers, Plan, PlanAnomaly, WorkItem};

/// Totals for the three tiers. Absent tiers report 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierTotals {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl TierTotals {
    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }

    fn add(&mut self, tier: Tier, count: u32) {
        match tier {
            Tier::High => self.high += count,
            Tier::Medium => self.medium += count,
            Tier::Low => self.low += count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanSummary {
    /// Keyed in first-seen order.
    pub per_category: IndexMap<CategoryKind, u32>,
    pub per_tier: TierTotals,
    pub grand_total: u32,
}

/// Sums counts by category, by tier, and overall.
pub fn summarize(items: &[WorkItem]) -> PlanSummary {
    let mut summary = PlanSummary::default();
    for item in items {
        *summary.per_category.entry(item.category).or_insert(0) += item.count;
        summary.per_tier.add(item.tier, item.count);
        summary.grand_total += item.count;
    }
    summary
}

/// Human-readable report of a plan: items in plan order, then the totals.
pub fn render_report(plan: &Plan, summary: &PlanSummary) -> String {
    let mut out = String::from("Question distribution\n");
    for (index, item) in plan.items.iter().enumerate() {
        out.push_str(&format!(
            "  {:>2}. {:<10} {:<24} {:<6} {}\n",
            index + 1,
            item.category.as_str(),
            item.subcategory,
            item.tier.as_str(),
            item.count
        ));
    }

    out.push_str("By category\n");
    for (category, total) in &summary.per_category {
        out.push_str(&format!("  {:<10} {}\n", category.as_str(), total));
    }

    out.push_str("By difficulty\n");
    for tier in Tier::ALL {
        out.push_str(&format!("  {:<10} {}\n", tier.as_str(), summary.per_tier.get(tier)));
    }

    out.push_str(&format!("Total: {}\n", summary.grand_total));

    if !plan.anomalies.is_empty() {
        out.push_str("Warnings\n");
        for anomaly in &plan.anomalies {
            out.push_str(&format!("  - {}\n", describe_anomaly(anomaly)));
        }
    }
    out
}

fn describe_anomaly(anomaly: &PlanAnomaly) -> String {
    match anomaly {
        PlanAnomaly::RatioSumNot100 { total } => {
            format!("category ratios sum to {total}, not 100")
        }
        PlanAnomaly::DistributionSumNot100 { total } => {
            format!("difficulty percentages sum to {total}, not 100")
        }
        PlanAnomaly::NonPositiveMedium {
            category,
            subcategory,
            allocation,
            high,
            medium,
            low,
        } => {
            let emitted = emitted_tiers(*allocation, *high, *medium, *low);
            let kept = emitted
                .iter()
                .map(|(tier, count)| format!("{}={count}", tier.as_str()))
                .collect::<Vec<_>>()
                .join(" ");
            let dropped = emitted
                .iter()
                .zip([*high, *medium, *low])
                .filter(|((_, count), raw)| *raw > 0 && *count == 0)
                .map(|((tier, _), _)| tier.as_str())
                .collect::<Vec<_>>();
            let mut text = format!(
                "{category}/{subcategory}: allocation {allocation} split high={high} medium={medium} low={low}; capped to {kept}"
            );
            if !dropped.is_empty() {
                text.push_str(&format!(" ({} dropped)", dropped.join(", ")));
            }
            text
        }
        PlanAnomaly::Shortfall { planned, requested } => {
            format!("planned {planned} of {requested} requested questions")
        }
    }
}
