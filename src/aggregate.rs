use std::collections::BTreeMap;

use crate::config::{GoalConfig, NEAR_RATIO};
use crate::types::{AggregateResult, GroupSummary, HierarchyId, Level, Row, StatusClass};
use crate::util::round1;

/// Sums lots and revenue in one pass. An empty input yields all zeros.
pub fn aggregate<'a, I>(rows: I) -> AggregateResult
where
    I: IntoIterator<Item = &'a Row>,
{
    let (lots, revenue) = rows
        .into_iter()
        .fold((0u64, 0.0f64), |(lots, revenue), r| {
            (lots.saturating_add(r.lots), revenue + r.revenue)
        });
    let alv = if lots > 0 { revenue / lots as f64 } else { 0.0 };
    AggregateResult { lots, revenue, alv }
}

/// Partitions rows by their id at `key`. Each group keeps input order.
pub fn group_by<'a, I>(rows: I, key: Level) -> BTreeMap<HierarchyId, Vec<&'a Row>>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut map: BTreeMap<HierarchyId, Vec<&'a Row>> = BTreeMap::new();
    for r in rows {
        map.entry(r.id_at(key).clone()).or_default().push(r);
    }
    map
}

/// `hit` at or above goal, `near` within 10% below it, `miss` otherwise.
/// NaN input classifies as `miss`.
pub fn status(alv: f64, goal: f64) -> StatusClass {
    if alv >= goal {
        StatusClass::Hit
    } else if alv >= goal * NEAR_RATIO {
        StatusClass::Near
    } else {
        StatusClass::Miss
    }
}

/// Signed distance from goal in percent, one decimal. Assumes `goal > 0`.
pub fn gap_pct(alv: f64, goal: f64) -> f64 {
    let gap = round1((alv - goal) / goal * 100.0);
    // A gap that rounds to zero from below is reported as `+0`, not `-0`.
    if gap == 0.0 {
        0.0
    } else {
        gap
    }
}

/// `+6.7% vs goal`, `-12% vs goal`.
pub fn gap_label(alv: f64, goal: f64) -> String {
    let gap = gap_pct(alv, goal);
    let sign = if gap >= 0.0 { "+" } else { "" };
    format!("{}{}% vs goal", sign, gap)
}

/// Goal-aware aggregation. Each call may override the configured goal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    config: GoalConfig,
}

impl Aggregator {
    pub fn new(config: GoalConfig) -> Self {
        Aggregator { config }
    }

    pub fn config(&self) -> GoalConfig {
        self.config
    }

    pub fn goal(&self, goal_override: Option<f64>) -> f64 {
        goal_override.unwrap_or(self.config.goal)
    }

    pub fn status(&self, alv: f64, goal_override: Option<f64>) -> StatusClass {
        status(alv, self.goal(goal_override))
    }

    pub fn gap_pct(&self, alv: f64, goal_override: Option<f64>) -> f64 {
        gap_pct(alv, self.goal(goal_override))
    }

    pub fn summarize<'a, I>(&self, key: HierarchyId, rows: I, goal_override: Option<f64>) -> GroupSummary
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let result = aggregate(rows);
        GroupSummary {
            key,
            status: self.status(result.alv, goal_override),
            gap_pct: self.gap_pct(result.alv, goal_override),
            result,
        }
    }

    /// One summary per distinct id at `key`, ascending by id.
    pub fn summarize_groups<'a, I>(&self, rows: I, key: Level, goal_override: Option<f64>) -> Vec<GroupSummary>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        group_by(rows, key)
            .into_iter()
            .map(|(id, members)| self.summarize(id, members, goal_override))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Row> {
        vec![
            Row::new(1, 1, 1, 10, 120_000.0),
            Row::new(1, 1, 2, 5, 40_000.0),
            Row::new(2, 1, 1, 8, 100_000.0),
        ]
    }

    #[test]
    fn test_aggregate_empty() {
        let empty: Vec<Row> = Vec::new();
        assert_eq!(
            aggregate(&empty),
            AggregateResult { lots: 0, revenue: 0.0, alv: 0.0 }
        );
    }

    #[test]
    fn test_aggregate_sums() {
        let rows = sample();
        let agg = aggregate(&rows[..2]);
        assert_eq!(agg.lots, 15);
        assert_eq!(agg.revenue, 160_000.0);
        assert!((agg.alv - 10_666.666_666).abs() < 0.01);
    }

    #[test]
    fn test_aggregate_zero_lots_with_revenue() {
        let rows = vec![Row::new(1, 1, 1, 0, 500.0)];
        let agg = aggregate(&rows);
        assert_eq!(agg.revenue, 500.0);
        assert_eq!(agg.alv, 0.0);
    }

    #[test]
    fn test_group_by_preserves_order() {
        let rows = sample();
        let groups = group_by(&rows, Level::Region);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&HierarchyId::Num(1)], vec![&rows[0], &rows[1]]);
        assert_eq!(groups[&HierarchyId::Num(2)], vec![&rows[2]]);

        let by_district = group_by(&rows, Level::District);
        assert_eq!(by_district.len(), 1);
        assert_eq!(by_district[&HierarchyId::Num(1)].len(), 3);
    }

    #[test]
    fn test_group_by_unknown_ids_group_together() {
        let rows = vec![
            Row::new(1, "", 1, 1, 1.0),
            Row::new(1, 2, 1, 1, 1.0),
            Row::new(1, " ", 1, 1, 1.0),
        ];
        let groups = group_by(&rows, Level::District);
        let unknown = HierarchyId::normalize("");
        assert_eq!(groups[&unknown], vec![&rows[0], &rows[2]]);
    }

    #[test]
    fn test_status_boundaries() {
        let goal = 10_000.0;
        assert_eq!(status(goal, goal), StatusClass::Hit);
        assert_eq!(status(goal * 0.9, goal), StatusClass::Near);
        assert_eq!(status(goal * 0.9 - 0.001, goal), StatusClass::Miss);
        assert_eq!(status(f64::NAN, goal), StatusClass::Miss);
        assert_eq!(status(0.0, goal), StatusClass::Miss);
    }

    #[test]
    fn test_gap_pct_and_label() {
        assert_eq!(gap_pct(10_666.67, 10_000.0), 6.7);
        assert_eq!(gap_pct(8_800.0, 10_000.0), -12.0);
        assert_eq!(gap_label(10_666.67, 10_000.0), "+6.7% vs goal");
        assert_eq!(gap_label(8_800.0, 10_000.0), "-12% vs goal");
        assert_eq!(gap_label(10_000.0, 10_000.0), "+0% vs goal");
    }

    #[test]
    fn test_gap_just_below_goal_is_positive_zero() {
        let gap = gap_pct(9_999.0, 10_000.0);
        assert_eq!(gap, 0.0);
        assert!(gap.is_sign_positive());
        assert_eq!(gap_label(9_999.0, 10_000.0), "+0% vs goal");
        assert_eq!(serde_json::to_string(&gap).unwrap(), "0.0");
    }

    #[test]
    fn test_zero_goal_does_not_panic() {
        assert!(gap_pct(5.0, 0.0).is_infinite());
        assert!(gap_pct(0.0, 0.0).is_nan());
        assert_eq!(status(5.0, 0.0), StatusClass::Hit);
    }

    #[test]
    fn test_aggregator_goal_override() {
        let agg = Aggregator::new(GoalConfig { goal: 10_000.0 });
        assert_eq!(agg.status(10_500.0, None), StatusClass::Hit);
        assert_eq!(agg.status(10_500.0, Some(11_000.0)), StatusClass::Near);
        assert_eq!(agg.status(10_500.0, Some(20_000.0)), StatusClass::Miss);

        let other = Aggregator::new(GoalConfig { goal: 5_000.0 });
        assert_eq!(other.status(6_000.0, None), StatusClass::Hit);
        assert_eq!(agg.status(6_000.0, None), StatusClass::Miss);
    }

    #[test]
    fn test_summarize_groups() {
        let rows = sample();
        let agg = Aggregator::default();
        let groups = agg.summarize_groups(&rows, Level::Region, None);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, HierarchyId::Num(1));
        assert_eq!(groups[0].result.lots, 15);
        assert_eq!(groups[0].status, StatusClass::Hit);
        assert_eq!(groups[0].gap_pct, 6.7);
        assert_eq!(groups[1].key, HierarchyId::Num(2));
        assert_eq!(groups[1].result.alv, 12_500.0);
    }
}
