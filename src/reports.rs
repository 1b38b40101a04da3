use crate::aggregate::{aggregate, gap_label, Aggregator};
use crate::filters::{drill_level, filter, scope_label, HierarchicalFilterState};
use crate::types::{
    AggregateResult, BreakdownRow, DrillLevel, GroupSummary, Level, ScopeSummary, Selection,
    StatusClass,
};
use crate::util::{format_currency, format_currency_dec, format_int, format_pct};

/// Everything the dashboard shows for one selection: the scope totals and
/// one sub-result per child of the current drill level.
#[derive(Debug, Clone)]
pub struct Breakdown {
    pub selection: Selection,
    pub drill: DrillLevel,
    pub group_key: Level,
    pub scope: Option<String>,
    pub goal: f64,
    pub total: AggregateResult,
    pub status: StatusClass,
    pub gap_pct: f64,
    pub groups: Vec<GroupSummary>,
}

pub fn drill_breakdown(
    state: &HierarchicalFilterState,
    aggregator: &Aggregator,
    goal_override: Option<f64>,
) -> Breakdown {
    let selection = state.current().clone();
    let drill = drill_level(&selection);
    let group_key = drill.group_key();
    let scoped = filter(state.rows(), &selection);

    let total = aggregate(scoped.iter().copied());
    let groups = aggregator.summarize_groups(scoped.iter().copied(), group_key, goal_override);

    Breakdown {
        scope: scope_label(&selection),
        selection,
        drill,
        group_key,
        goal: aggregator.goal(goal_override),
        status: aggregator.status(total.alv, goal_override),
        gap_pct: aggregator.gap_pct(total.alv, goal_override),
        total,
        groups,
    }
}

pub fn breakdown_rows(breakdown: &Breakdown) -> Vec<BreakdownRow> {
    let scope_revenue = breakdown.total.revenue;
    breakdown
        .groups
        .iter()
        .map(|g| {
            let share = if scope_revenue > 0.0 {
                g.result.revenue / scope_revenue
            } else {
                0.0
            };
            BreakdownRow {
                group: breakdown.group_key.option_label(&g.key),
                lots: format_int(g.result.lots),
                revenue: format_currency(g.result.revenue),
                avg_lot_value: format_currency_dec(g.result.alv),
                revenue_share: format_pct(share),
                status: format!("{} {}", g.status.icon(), g.status),
                vs_goal: gap_label(g.result.alv, breakdown.goal),
            }
        })
        .collect()
}

pub fn scope_summary(breakdown: &Breakdown) -> ScopeSummary {
    ScopeSummary {
        generated_at: chrono::Utc::now(),
        drill_level: breakdown.drill,
        group_key: breakdown.group_key,
        scope: breakdown.scope.clone(),
        lots: breakdown.total.lots,
        revenue: breakdown.total.revenue,
        alv: breakdown.total.alv,
        goal: breakdown.goal,
        status: breakdown.status,
        gap_pct: breakdown.gap_pct,
        groups: breakdown.groups.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoalConfig;
    use crate::types::{HierarchyId, LevelValue, Row};

    fn state() -> HierarchicalFilterState {
        HierarchicalFilterState::new(vec![
            Row::new(1, 1, 1, 10, 120_000.0),
            Row::new(1, 1, 2, 5, 40_000.0),
            Row::new(2, 1, 1, 8, 100_000.0),
            Row::new(1, 2, 5, 4, 30_000.0),
        ])
    }

    #[test]
    fn test_company_breakdown_groups_by_region() {
        let st = state();
        let b = drill_breakdown(&st, &Aggregator::default(), None);
        assert_eq!(b.drill, DrillLevel::Company);
        assert_eq!(b.group_key, Level::Region);
        assert_eq!(b.scope, None);
        assert_eq!(b.total.lots, 27);
        assert_eq!(b.groups.len(), 2);
        assert_eq!(b.groups[0].key, HierarchyId::Num(1));
    }

    #[test]
    fn test_region_breakdown_groups_by_district() {
        let mut st = state();
        st.select(Level::Region, LevelValue::from(1));
        let b = drill_breakdown(&st, &Aggregator::default(), None);
        assert_eq!(b.drill, DrillLevel::Region);
        assert_eq!(b.group_key, Level::District);
        assert_eq!(b.scope.as_deref(), Some("Region 1"));
        assert_eq!(b.total.lots, 19);
        let keys: Vec<_> = b.groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(keys, vec![HierarchyId::Num(1), HierarchyId::Num(2)]);
        // District 2: 30,000 / 4 = 7,500 against 10,000.
        assert_eq!(b.groups[1].status, StatusClass::Miss);
        assert_eq!(b.groups[1].gap_pct, -25.0);
    }

    #[test]
    fn test_territory_floor_keeps_territory_key() {
        let mut st = state();
        st.select(Level::Region, LevelValue::from(1));
        st.select(Level::District, LevelValue::from(1));
        st.select(Level::Territory, LevelValue::from(2));
        let b = drill_breakdown(&st, &Aggregator::default(), None);
        assert_eq!(b.drill, DrillLevel::Territory);
        assert_eq!(b.group_key, Level::Territory);
        assert_eq!(b.groups.len(), 1);
        assert_eq!(b.total.alv, 8_000.0);
        assert_eq!(b.status, StatusClass::Miss);
    }

    #[test]
    fn test_goal_override_flows_through() {
        let st = state();
        let agg = Aggregator::new(GoalConfig { goal: 10_000.0 });
        let b = drill_breakdown(&st, &agg, Some(12_000.0));
        assert_eq!(b.goal, 12_000.0);
        // Region 2: 12,500 per lot.
        assert_eq!(b.groups[1].status, StatusClass::Hit);
    }

    #[test]
    fn test_breakdown_rows_formatting() {
        let mut st = state();
        st.select(Level::Region, LevelValue::from(1));
        st.select(Level::District, LevelValue::from(1));
        let b = drill_breakdown(&st, &Aggregator::default(), None);
        let rows = breakdown_rows(&b);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, "Territory 1");
        assert_eq!(rows[0].lots, "10");
        assert_eq!(rows[0].revenue, "$120,000");
        assert_eq!(rows[0].avg_lot_value, "$12,000.00");
        assert_eq!(rows[0].revenue_share, "75.0%");
        assert_eq!(rows[0].status, "\u{25b2} hit");
        assert_eq!(rows[0].vs_goal, "+20% vs goal");
        assert_eq!(rows[1].status, "\u{25bc} miss");
    }

    #[test]
    fn test_scope_summary_serializes() {
        let mut st = state();
        st.select(Level::Region, LevelValue::from(2));
        let b = drill_breakdown(&st, &Aggregator::default(), None);
        let summary = scope_summary(&b);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["drill_level"], "region");
        assert_eq!(json["group_key"], "district");
        assert_eq!(json["scope"], "Region 2");
        assert_eq!(json["status"], "hit");
        assert_eq!(json["groups"], 1);
    }
}
