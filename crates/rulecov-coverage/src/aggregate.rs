#![deny(unsafe_code)]

use rulecov_standards::{Catalog, Implementability};
use serde::Serialize;

use crate::record::CoverageMap;

/// Summary counts for a completed coverage map.
///
/// Only `Implementable` catalog ids enter the denominators; rejected and
/// not-implementable ids still appear in per-id detail reports but never in
/// these counts. "Specified" and "implemented" both mean a non-empty
/// relationship set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub mandatory_total: usize,
    pub mandatory_specified: usize,
    pub mandatory_implemented: usize,
    pub optional_total: usize,
    pub optional_specified: usize,
    pub optional_implemented: usize,
    pub mandatory_implemented_percent: f64,
    pub optional_implemented_percent: f64,
}

pub fn summarize(map: &CoverageMap, catalog: &Catalog) -> CoverageSummary {
    let mut mandatory_total = 0;
    let mut mandatory_specified = 0;
    let mut mandatory_implemented = 0;
    let mut optional_total = 0;
    let mut optional_specified = 0;
    let mut optional_implemented = 0;

    for entry in catalog.entries() {
        if entry.implementability != Implementability::Implementable {
            continue;
        }
        let record = map.get(&entry.id);
        let specified = record.is_some_and(|r| r.is_specified());
        let implemented = record.is_some_and(|r| r.is_implemented());
        if entry.mandatory {
            mandatory_total += 1;
            mandatory_specified += usize::from(specified);
            mandatory_implemented += usize::from(implemented);
        } else {
            optional_total += 1;
            optional_specified += usize::from(specified);
            optional_implemented += usize::from(implemented);
        }
    }

    CoverageSummary {
        mandatory_total,
        mandatory_specified,
        mandatory_implemented,
        optional_total,
        optional_specified,
        optional_implemented,
        mandatory_implemented_percent: percent(mandatory_implemented, mandatory_total),
        optional_implemented_percent: percent(optional_implemented, optional_total),
    }
}

/// `covered * 100 / total`, rounded half-up to two decimal places. An empty
/// denominator is defined as zero coverage, never a division error.
fn percent(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = covered as f64 * 100.0 / total as f64;
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_half_up_to_two_places() {
        assert_eq!(percent(1, 3), 33.33);
        assert_eq!(percent(2, 3), 66.67);
        assert_eq!(percent(1, 8), 12.5);
        assert_eq!(percent(5, 5), 100.0);
    }

    #[test]
    fn percent_of_empty_denominator_is_zero() {
        assert_eq!(percent(0, 0), 0.0);
    }
}
