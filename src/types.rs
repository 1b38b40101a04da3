use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

use crate::error::ParseLevelError;

/// Identifier substituted for blank hierarchy cells at ingestion.
pub const UNKNOWN_ID: &str = "Unknown";

/// Canonical identifier for one node of the Region → District → Territory
/// hierarchy.
///
/// Every identifier passes through [`HierarchyId::normalize`] before it is
/// compared, so `"3"`, `"3.0"` and `" 03 "` are the same node. Ordering is
/// total: numeric ids come first in ascending numeric order, followed by
/// textual ids in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum HierarchyId {
    Num(i64),
    Text(String),
}

impl HierarchyId {
    pub fn normalize(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return HierarchyId::Text(UNKNOWN_ID.to_string());
        }
        // Exports from the warehouse carry ids like `3.0`; only `digits[.0*]`
        // is numeric, so codes such as `1E5` stay text.
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (s, None),
        };
        let zero_frac = frac_part.map_or(true, |f| f.chars().all(|c| c == '0'));
        let digits = int_part.strip_prefix('-').unwrap_or(int_part);
        if zero_frac && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = int_part.parse::<i64>() {
                return HierarchyId::Num(n);
            }
        }
        HierarchyId::Text(s.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, HierarchyId::Text(t) if t == UNKNOWN_ID)
    }
}

impl fmt::Display for HierarchyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyId::Num(n) => write!(f, "{}", n),
            HierarchyId::Text(t) => f.write_str(t),
        }
    }
}

impl From<i64> for HierarchyId {
    fn from(n: i64) -> Self {
        HierarchyId::Num(n)
    }
}

impl From<i32> for HierarchyId {
    fn from(n: i32) -> Self {
        HierarchyId::Num(i64::from(n))
    }
}

impl From<&str> for HierarchyId {
    fn from(s: &str) -> Self {
        HierarchyId::normalize(s)
    }
}

/// A cleaned sales record. Rows are never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub region: HierarchyId,
    pub district: HierarchyId,
    pub territory: HierarchyId,
    pub lots: u64,
    pub revenue: f64,
}

impl Row {
    pub fn new(
        region: impl Into<HierarchyId>,
        district: impl Into<HierarchyId>,
        territory: impl Into<HierarchyId>,
        lots: u64,
        revenue: f64,
    ) -> Self {
        Row {
            region: region.into(),
            district: district.into(),
            territory: territory.into(),
            lots,
            revenue,
        }
    }

    pub fn id_at(&self, level: Level) -> &HierarchyId {
        match level {
            Level::Region => &self.region,
            Level::District => &self.district,
            Level::Territory => &self.territory,
        }
    }
}

/// CSV shape as exported by the warehouse. Column aliases cover both the
/// short headers and the item-level export headers.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Region", alias = "region", alias = "Item Region Id", default)]
    pub region: Option<String>,
    #[serde(rename = "District", alias = "district", alias = "Item District", default)]
    pub district: Option<String>,
    #[serde(rename = "Territory", alias = "territory", alias = "Item Territory Id", default)]
    pub territory: Option<String>,
    #[serde(rename = "Lots", alias = "lots", default)]
    pub lots: Option<String>,
    #[serde(rename = "Revenue", alias = "revenue", alias = "Contract Price", default)]
    pub revenue: Option<String>,
}

/// One tier of the geographic hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Region,
    District,
    Territory,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Region, Level::District, Level::Territory];

    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Region => None,
            Level::District => Some(Level::Region),
            Level::Territory => Some(Level::District),
        }
    }

    pub fn child(self) -> Option<Level> {
        match self {
            Level::Region => Some(Level::District),
            Level::District => Some(Level::Territory),
            Level::Territory => None,
        }
    }

    /// Levels strictly below `self`, top-down.
    pub fn descendants(self) -> Vec<Level> {
        let mut out = Vec::new();
        let mut next = self.child();
        while let Some(level) = next {
            out.push(level);
            next = level.child();
        }
        out
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Region => "region",
            Level::District => "district",
            Level::Territory => "territory",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Region => "Region",
            Level::District => "District",
            Level::Territory => "Territory",
        }
    }

    /// Caption of the `all` entry in this level's selector.
    pub fn all_label(self) -> &'static str {
        match self {
            Level::Region => "All Regions",
            Level::District => "All Districts",
            Level::Territory => "All Territories",
        }
    }

    pub fn option_label(self, id: &HierarchyId) -> String {
        format!("{} {}", self.label(), id)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "region" => Ok(Level::Region),
            "district" => Ok(Level::District),
            "territory" => Ok(Level::Territory),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

/// Value held by one selector: the `all` sentinel or a concrete node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LevelValue {
    #[default]
    All,
    Only(HierarchyId),
}

impl Serialize for LevelValue {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            LevelValue::All => s.serialize_str("all"),
            LevelValue::Only(id) => id.serialize(s),
        }
    }
}

impl LevelValue {
    /// `all` in any case selects the sentinel; anything else is normalized
    /// as an identifier.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("all") {
            LevelValue::All
        } else {
            LevelValue::Only(HierarchyId::normalize(raw))
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, LevelValue::All)
    }

    pub fn id(&self) -> Option<&HierarchyId> {
        match self {
            LevelValue::All => None,
            LevelValue::Only(id) => Some(id),
        }
    }

    pub fn matches(&self, id: &HierarchyId) -> bool {
        match self {
            LevelValue::All => true,
            LevelValue::Only(want) => want == id,
        }
    }
}

impl fmt::Display for LevelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelValue::All => f.write_str("all"),
            LevelValue::Only(id) => id.fmt(f),
        }
    }
}

impl From<HierarchyId> for LevelValue {
    fn from(id: HierarchyId) -> Self {
        LevelValue::Only(id)
    }
}

impl From<i64> for LevelValue {
    fn from(n: i64) -> Self {
        LevelValue::Only(HierarchyId::Num(n))
    }
}

impl From<i32> for LevelValue {
    fn from(n: i32) -> Self {
        LevelValue::Only(HierarchyId::from(n))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Selection {
    pub region: LevelValue,
    pub district: LevelValue,
    pub territory: LevelValue,
}

impl Selection {
    pub fn new(
        region: impl Into<LevelValue>,
        district: impl Into<LevelValue>,
        territory: impl Into<LevelValue>,
    ) -> Self {
        Selection {
            region: region.into(),
            district: district.into(),
            territory: territory.into(),
        }
    }

    pub fn get(&self, level: Level) -> &LevelValue {
        match level {
            Level::Region => &self.region,
            Level::District => &self.district,
            Level::Territory => &self.territory,
        }
    }

    /// A set level must have every ancestor set.
    pub fn is_consistent(&self) -> bool {
        (self.district.is_all() || !self.region.is_all())
            && (self.territory.is_all() || !self.district.is_all())
    }

    /// Clears any level that sits under an `all` ancestor.
    pub fn sanitized(&self) -> Selection {
        let mut out = self.clone();
        if out.region.is_all() {
            out.district = LevelValue::All;
        }
        if out.district.is_all() {
            out.territory = LevelValue::All;
        }
        out
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.region.matches(&row.region)
            && self.district.matches(&row.district)
            && self.territory.matches(&row.territory)
    }
}

/// Depth of the current selection. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrillLevel {
    Company,
    Region,
    District,
    Territory,
}

impl DrillLevel {
    /// Field used to break the current scope into sub-results. At the
    /// territory floor there is nothing finer, so territory is reused.
    pub fn group_key(self) -> Level {
        match self {
            DrillLevel::Company => Level::Region,
            DrillLevel::Region => Level::District,
            DrillLevel::District | DrillLevel::Territory => Level::Territory,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DrillLevel::Company => "company",
            DrillLevel::Region => "region",
            DrillLevel::District => "district",
            DrillLevel::Territory => "territory",
        }
    }
}

impl fmt::Display for DrillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AggregateResult {
    pub lots: u64,
    pub revenue: f64,
    /// Average lot value; 0 when there are no lots.
    pub alv: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Hit,
    Near,
    Miss,
}

impl StatusClass {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::Hit => "hit",
            StatusClass::Near => "near",
            StatusClass::Miss => "miss",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            StatusClass::Hit => "\u{25b2}",
            StatusClass::Near => "\u{25cf}",
            StatusClass::Miss => "\u{25bc}",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate plus goal comparison for one group of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: HierarchyId,
    #[serde(flatten)]
    pub result: AggregateResult,
    pub status: StatusClass,
    pub gap_pct: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BreakdownRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Lots")]
    #[tabled(rename = "Lots")]
    pub lots: String,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue")]
    pub revenue: String,
    #[serde(rename = "AvgLotValue")]
    #[tabled(rename = "AvgLotValue")]
    pub avg_lot_value: String,
    #[serde(rename = "RevenueShare")]
    #[tabled(rename = "RevenueShare")]
    pub revenue_share: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "VsGoal")]
    #[tabled(rename = "VsGoal")]
    pub vs_goal: String,
}

#[derive(Debug, Serialize)]
pub struct ScopeSummary {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub drill_level: DrillLevel,
    pub group_key: Level,
    pub scope: Option<String>,
    pub lots: u64,
    pub revenue: f64,
    pub alv: f64,
    pub goal: f64,
    pub status: StatusClass,
    pub gap_pct: f64,
    pub groups: usize,
}
