//! Rank score based gating of records.

use crate::common::is_mitochondrial;

/// Threshold applied when loading whole files.
pub const DEFAULT_RANK_THRESHOLD: f64 = 0.0;
/// Threshold applied when loading a region, below any real rank score.
pub const DEFAULT_REGION_RANK_THRESHOLD: f64 = -1000.0;

/// Decides whether a record is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankFilter {
    pub threshold: f64,
}

impl RankFilter {
    /// Construct with the default threshold unless one is given explicitly.
    pub fn new(threshold: Option<f64>, region_bounded: bool) -> Self {
        let threshold = threshold.unwrap_or(if region_bounded {
            DEFAULT_REGION_RANK_THRESHOLD
        } else {
            DEFAULT_RANK_THRESHOLD
        });
        Self { threshold }
    }

    /// Records pass if they have no rank score, score above the threshold, or
    /// are mitochondrial.
    pub fn passes(&self, chrom: &str, rank_score: Option<f64>) -> bool {
        match rank_score {
            None => true,
            Some(rank_score) => rank_score > self.threshold || is_mitochondrial(chrom),
        }
    }
}

#[cfg(test)]
mod test {
    use float_cmp::approx_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, false, 0.0)]
    #[case(None, true, -1000.0)]
    #[case(Some(5.0), true, 5.0)]
    #[case(Some(0.0), true, 0.0)]
    fn threshold_defaults(
        #[case] threshold: Option<f64>,
        #[case] region_bounded: bool,
        #[case] expected: f64,
    ) {
        let filter = RankFilter::new(threshold, region_bounded);

        assert!(approx_eq!(f64, filter.threshold, expected, ulps = 2));
    }

    #[rstest]
    #[case("1", None, true)]
    #[case("1", Some(0.5), true)]
    #[case("1", Some(0.0), false)]
    #[case("1", Some(-3.0), false)]
    #[case("MT", Some(-3.0), true)]
    #[case("chrM", Some(-3.0), true)]
    fn passes(#[case] chrom: &str, #[case] rank_score: Option<f64>, #[case] expected: bool) {
        let filter = RankFilter::new(None, false);

        assert_eq!(filter.passes(chrom, rank_score), expected);
    }
}
