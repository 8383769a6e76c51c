//! Code for sorting `Variant` records by rank score or variant rank.

use std::cmp::Ordering;

use crate::variants::schema::Variant;

/// Sort order of variant listings.
#[derive(
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortKey {
    /// Ascending by variant rank.
    #[default]
    VariantRank,
    /// Descending by rank score.
    RankScore,
}

/// Helper wrapper that sorts `Variant` by descending rank score, missing scores last.
#[derive(Debug)]
pub struct ByRankScore {
    pub rank_score: Option<f64>,
    pub variant: Variant,
}

impl From<Variant> for ByRankScore {
    fn from(val: Variant) -> Self {
        Self {
            rank_score: val.rank_score,
            variant: val,
        }
    }
}

impl PartialEq for ByRankScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ByRankScore {}

impl PartialOrd for ByRankScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByRankScore {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.rank_score, other.rank_score) {
            (Some(lhs), Some(rhs)) => rhs.total_cmp(&lhs),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Helper wrapper that sorts `Variant` by ascending variant rank, missing ranks last.
#[derive(Debug)]
pub struct ByVariantRank {
    pub variant_rank: Option<usize>,
    pub variant: Variant,
}

impl From<Variant> for ByVariantRank {
    fn from(val: Variant) -> Self {
        Self {
            variant_rank: val.variant_rank,
            variant: val,
        }
    }
}

impl PartialEq for ByVariantRank {
    fn eq(&self, other: &Self) -> bool {
        self.variant_rank == other.variant_rank
    }
}

impl Eq for ByVariantRank {}

impl PartialOrd for ByVariantRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByVariantRank {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.variant_rank, other.variant_rank) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Stable sort of `variants` by `sort_key`.
pub fn sort_variants(variants: Vec<Variant>, sort_key: SortKey) -> Vec<Variant> {
    match sort_key {
        SortKey::VariantRank => {
            let mut wrapped = variants
                .into_iter()
                .map(ByVariantRank::from)
                .collect::<Vec<_>>();
            wrapped.sort();
            wrapped.into_iter().map(|w| w.variant).collect()
        }
        SortKey::RankScore => {
            let mut wrapped = variants
                .into_iter()
                .map(ByRankScore::from)
                .collect::<Vec<_>>();
            wrapped.sort();
            wrapped.into_iter().map(|w| w.variant).collect()
        }
    }
}
