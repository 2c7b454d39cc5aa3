//! Dashboard filter state (PRD-72).
//!
//! A [`FilterState`] is built once per render cycle from the user's time
//! range and artifact type selections, then consumed by the aggregation
//! planner. `now` is captured at build time and reused for every pipeline
//! in the cycle, so all panels of one render observe the same window.

use chrono::Duration;

use crate::catalog::TypeCatalog;
use crate::error::CoreError;
use crate::types::{Timestamp, TypeId};

/// Time window selection: five named presets plus an explicit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSelection {
    LastHour,
    Last6Hours,
    Last24Hours,
    Last7Days,
    Last30Days,
    Custom { from: Timestamp, to: Timestamp },
}

impl TimeSelection {
    /// String form used in query parameters and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSelection::LastHour => "1h",
            TimeSelection::Last6Hours => "6h",
            TimeSelection::Last24Hours => "24h",
            TimeSelection::Last7Days => "7d",
            TimeSelection::Last30Days => "30d",
            TimeSelection::Custom { .. } => "custom",
        }
    }

    /// Parse a preset name. Unknown values fall back to the 24h default.
    pub fn from_str(s: &str) -> Self {
        match s {
            "1h" => TimeSelection::LastHour,
            "6h" => TimeSelection::Last6Hours,
            "7d" => TimeSelection::Last7Days,
            "30d" => TimeSelection::Last30Days,
            _ => TimeSelection::Last24Hours,
        }
    }

    /// Resolve the selection to a concrete `(start, end)` window.
    ///
    /// Presets end at `now` and subtract a fixed duration, so they always
    /// satisfy `start <= end`. Only the explicit range can be inverted.
    fn window(&self, now: Timestamp) -> (Timestamp, Timestamp) {
        match *self {
            TimeSelection::LastHour => (now - Duration::hours(1), now),
            TimeSelection::Last6Hours => (now - Duration::hours(6), now),
            TimeSelection::Last24Hours => (now - Duration::hours(24), now),
            TimeSelection::Last7Days => (now - Duration::days(7), now),
            TimeSelection::Last30Days => (now - Duration::days(30), now),
            TimeSelection::Custom { from, to } => (from, to),
        }
    }
}

/// Artifact type selection: everything in the catalog, or a single id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSelection {
    All,
    One(TypeId),
}

/// Canonical query predicate for one render cycle.
///
/// Immutable once built; consumed only by the aggregation planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub time_start: Timestamp,
    pub time_end: Timestamp,
    /// Non-empty: `All` expands to the catalog's full id set.
    pub type_ids: Vec<TypeId>,
}

impl FilterState {
    /// Build the filter for one render cycle.
    ///
    /// Fails with [`CoreError::InvalidRange`] iff an explicit range has
    /// `from > to`. A single selected id is used as-is even when it is not
    /// in the catalog (it simply matches nothing downstream).
    pub fn build(
        time: TimeSelection,
        types: &TypeSelection,
        now: Timestamp,
        catalog: &TypeCatalog,
    ) -> Result<Self, CoreError> {
        let (time_start, time_end) = time.window(now);
        if time_start > time_end {
            return Err(CoreError::InvalidRange {
                start: time_start,
                end: time_end,
            });
        }

        let type_ids = match types {
            TypeSelection::All => catalog.ids().to_vec(),
            TypeSelection::One(id) => vec![id.clone()],
        };

        Ok(Self {
            time_start,
            time_end,
            type_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    use super::*;

    fn catalog() -> TypeCatalog {
        let mut m = BTreeMap::new();
        m.insert("64a000000000000000000001".to_string(), "Render".to_string());
        m.insert("64a000000000000000000002".to_string(), "Encode".to_string());
        TypeCatalog::from_map(m)
    }

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn preset_windows_end_at_captured_now() {
        let c = catalog();
        for (sel, hours) in [
            (TimeSelection::LastHour, 1),
            (TimeSelection::Last6Hours, 6),
            (TimeSelection::Last24Hours, 24),
            (TimeSelection::Last7Days, 7 * 24),
            (TimeSelection::Last30Days, 30 * 24),
        ] {
            let f = FilterState::build(sel, &TypeSelection::All, now(), &c).unwrap();
            assert_eq!(f.time_end, now());
            assert_eq!(f.time_end - f.time_start, Duration::hours(hours));
        }
    }

    #[test]
    fn all_selection_expands_to_full_catalog() {
        let c = catalog();
        let f = FilterState::build(
            TimeSelection::Last24Hours,
            &TypeSelection::All,
            now(),
            &c,
        )
        .unwrap();
        assert_eq!(f.type_ids.len(), c.len());
        assert!(!f.type_ids.is_empty());
    }

    #[test]
    fn single_selection_is_kept_verbatim() {
        let c = catalog();
        let f = FilterState::build(
            TimeSelection::LastHour,
            &TypeSelection::One("64a000000000000000000002".into()),
            now(),
            &c,
        )
        .unwrap();
        assert_eq!(f.type_ids, vec!["64a000000000000000000002".to_string()]);
    }

    #[test]
    fn inverted_custom_range_is_rejected() {
        let c = catalog();
        let err = FilterState::build(
            TimeSelection::Custom {
                from: now(),
                to: now() - Duration::days(1),
            },
            &TypeSelection::All,
            now(),
            &c,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRange { .. }));
    }

    #[test]
    fn valid_custom_range_passes_through() {
        let c = catalog();
        let from = now() - Duration::days(3);
        let f = FilterState::build(
            TimeSelection::Custom { from, to: now() },
            &TypeSelection::All,
            now(),
            &c,
        )
        .unwrap();
        assert_eq!(f.time_start, from);
        assert_eq!(f.time_end, now());
    }

    #[test]
    fn equal_custom_bounds_are_valid() {
        let c = catalog();
        let f = FilterState::build(
            TimeSelection::Custom {
                from: now(),
                to: now(),
            },
            &TypeSelection::All,
            now(),
            &c,
        )
        .unwrap();
        assert_eq!(f.time_start, f.time_end);
    }

    #[test]
    fn preset_names_round_trip() {
        for s in ["1h", "6h", "24h", "7d", "30d"] {
            assert_eq!(TimeSelection::from_str(s).as_str(), s);
        }
        // Unknown names fall back to the default window.
        assert_eq!(TimeSelection::from_str("weird"), TimeSelection::Last24Hours);
    }
}
