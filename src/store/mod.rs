//! Storage of cases and variants.
//!
//! [`VariantStore`] is the narrow contract that ingestion and queries use.  Two
//! implementations are provided, [`memory::MemoryStore`] for tests and small
//! one-off runs, and [`rocks::RocksDbStore`] for persistent storage.

use crate::{
    common::canonicalize,
    variants::schema::{Case, Category, Variant, VariantType},
};

pub mod memory;
pub mod rocks;

/// Errors produced by [`VariantStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document with the same key exists already.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Underlying RocksDB failure.
    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Document could not be (de-)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Internal lock was poisoned by a panicked thread.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// The database lacks a column family.
    #[error("missing column family: {0}")]
    MissingColumnFamily(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Selection of variants.
///
/// Unset fields do not restrict the selection.  `start` and `end` select the
/// variants overlapping the window, a missing bound is unbounded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantFilter {
    pub case_id: Option<String>,
    /// Institute that owns the variants.
    pub institute: Option<String>,
    pub variant_type: Option<VariantType>,
    pub category: Option<Category>,
    pub chromosome: Option<String>,
    pub start: Option<usize>,
    pub end: Option<usize>,
    /// Storage ids.
    pub ids: Option<Vec<String>>,
    /// Positional ids.
    pub variant_ids: Option<Vec<String>>,
    /// Variants overlapping any of these genes.
    pub hgnc_ids: Option<Vec<u32>>,
    /// Variants with a rank score of at least this value.
    pub min_rank_score: Option<f64>,
}

impl VariantFilter {
    /// Filter for all variants of a case in the given variant type and (optional) category.
    pub fn scope(case_id: &str, variant_type: VariantType, category: Option<Category>) -> Self {
        Self {
            case_id: Some(case_id.to_string()),
            variant_type: Some(variant_type),
            category,
            ..Default::default()
        }
    }

    /// Whether `variant` is selected by the filter.
    pub fn matches(&self, variant: &Variant) -> bool {
        if let Some(case_id) = &self.case_id {
            if &variant.case_id != case_id {
                return false;
            }
        }
        if let Some(institute) = &self.institute {
            if &variant.institute != institute {
                return false;
            }
        }
        if let Some(variant_type) = self.variant_type {
            if variant.variant_type != variant_type {
                return false;
            }
        }
        if let Some(category) = self.category {
            if variant.category != category {
                return false;
            }
        }
        if let Some(chromosome) = &self.chromosome {
            if canonicalize(chromosome) != canonicalize(&variant.chromosome) {
                return false;
            }
        }
        if let Some(end) = self.end {
            if variant.position > end {
                return false;
            }
        }
        if let Some(start) = self.start {
            if variant.end < start {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&variant.id) {
                return false;
            }
        }
        if let Some(variant_ids) = &self.variant_ids {
            if !variant_ids.contains(&variant.variant_id) {
                return false;
            }
        }
        if let Some(hgnc_ids) = &self.hgnc_ids {
            if !variant.hgnc_ids.iter().any(|id| hgnc_ids.contains(id)) {
                return false;
            }
        }
        if let Some(min_rank_score) = self.min_rank_score {
            match variant.rank_score {
                Some(rank_score) if rank_score >= min_rank_score => (),
                _ => return false,
            }
        }
        true
    }
}

/// Storage contract for cases and variants.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn VariantStore>`.
pub trait VariantStore: Send + Sync {
    /// Insert a new variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if a variant with the same storage id exists.
    fn insert_variant(&self, variant: &Variant) -> Result<()>;

    /// Insert or overwrite the variant with the same storage id.
    fn replace_variant(&self, variant: &Variant) -> Result<()>;

    /// Set the `variant_rank` of the variant, returns `false` if there is no such variant.
    fn set_variant_rank(&self, id: &str, rank: usize) -> Result<bool>;

    /// Fetch one variant by its storage id.
    fn variant(&self, id: &str) -> Result<Option<Variant>>;

    /// Fetch all variants selected by `filter`.
    fn find_variants(&self, filter: &VariantFilter) -> Result<Vec<Variant>>;

    /// Delete all variants selected by `filter`, returns the number of deleted variants.
    fn delete_variants(&self, filter: &VariantFilter) -> Result<usize>;

    /// Fetch one case by its id.
    fn case(&self, case_id: &str) -> Result<Option<Case>>;

    /// Fetch all cases, optionally only those that `institute` collaborates on.
    fn cases(&self, institute: Option<&str>) -> Result<Vec<Case>>;

    /// Insert or overwrite a case.
    fn upsert_case(&self, case: &Case) -> Result<()>;
}

/// Whether the case is visible to the institute.
pub(crate) fn case_visible_to(case: &Case, institute: Option<&str>) -> bool {
    match institute {
        None => true,
        Some(institute) => {
            case.owner == institute || case.collaborators.iter().any(|c| c == institute)
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    /// Construct a variant for tests.
    pub fn variant(
        id: &str,
        case_id: &str,
        chrom: &str,
        position: usize,
        end: usize,
        rank_score: Option<f64>,
    ) -> Variant {
        Variant {
            id: id.to_string(),
            variant_id: format!("pos-{id}"),
            case_id: case_id.to_string(),
            institute: "inst-1".to_string(),
            chromosome: chrom.to_string(),
            position,
            end,
            rank_score,
            ..Default::default()
        }
    }

    /// Checks that every backend must pass.
    pub fn check_store_contract(store: &dyn VariantStore) -> std::result::Result<(), anyhow::Error> {
        let first = variant("a", "case-1", "1", 100, 100, Some(10.0));
        let second = variant("b", "case-1", "1", 200, 300, Some(5.0));
        let third = variant("c", "case-2", "2", 100, 100, None);
        for v in [&first, &second, &third] {
            store.insert_variant(v)?;
        }

        assert!(matches!(
            store.insert_variant(&first),
            Err(Error::DuplicateKey(_))
        ));

        assert_eq!(store.variant("a")?, Some(first.clone()));
        assert_eq!(store.variant("nope")?, None);

        let found = store.find_variants(&VariantFilter {
            case_id: Some("case-1".into()),
            ..Default::default()
        })?;
        let mut ids = found.iter().map(|v| v.id.as_str()).collect::<Vec<_>>();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(store.set_variant_rank("b", 2)?);
        assert!(!store.set_variant_rank("nope", 1)?);
        assert_eq!(store.variant("b")?.and_then(|v| v.variant_rank), Some(2));

        let mut replaced = third.clone();
        replaced.rank_score = Some(1.0);
        store.replace_variant(&replaced)?;
        assert_eq!(store.variant("c")?.and_then(|v| v.rank_score), Some(1.0));

        let deleted = store.delete_variants(&VariantFilter {
            case_id: Some("case-1".into()),
            ..Default::default()
        })?;
        assert_eq!(deleted, 2);
        assert_eq!(store.find_variants(&VariantFilter::default())?.len(), 1);

        let case = Case {
            id: "case-1".into(),
            display_name: "fam".into(),
            owner: "inst-1".into(),
            collaborators: vec!["inst-1".into(), "inst-2".into()],
            ..Default::default()
        };
        store.upsert_case(&case)?;
        assert_eq!(store.case("case-1")?, Some(case.clone()));
        assert_eq!(store.cases(Some("inst-2"))?, vec![case.clone()]);
        assert_eq!(store.cases(Some("inst-3"))?, vec![]);
        assert_eq!(store.cases(None)?.len(), 1);

        Ok(())
    }

    #[rstest]
    #[case(Some(150), Some(250), true)]
    #[case(Some(301), None, false)]
    #[case(None, Some(199), false)]
    #[case(Some(300), Some(300), true)]
    #[case(None, None, true)]
    fn filter_overlap_window(
        #[case] start: Option<usize>,
        #[case] end: Option<usize>,
        #[case] expected: bool,
    ) {
        let v = variant("x", "case-1", "1", 200, 300, None);
        let filter = VariantFilter {
            chromosome: Some("chr1".into()),
            start,
            end,
            ..Default::default()
        };

        assert_eq!(filter.matches(&v), expected);
    }

    #[rstest]
    #[case(Some(5.0), Some(5.0), true)]
    #[case(Some(5.0), Some(4.9), false)]
    #[case(Some(5.0), None, false)]
    #[case(None, None, true)]
    fn filter_min_rank_score(
        #[case] min_rank_score: Option<f64>,
        #[case] rank_score: Option<f64>,
        #[case] expected: bool,
    ) {
        let v = variant("x", "case-1", "1", 1, 1, rank_score);
        let filter = VariantFilter {
            min_rank_score,
            ..Default::default()
        };

        assert_eq!(filter.matches(&v), expected);
    }

    #[test]
    fn filter_scope() {
        let mut v = variant("x", "case-1", "1", 1, 1, None);
        v.variant_type = VariantType::Research;
        v.category = Category::Sv;

        assert!(VariantFilter::scope("case-1", VariantType::Research, None).matches(&v));
        assert!(
            VariantFilter::scope("case-1", VariantType::Research, Some(Category::Sv)).matches(&v)
        );
        assert!(
            !VariantFilter::scope("case-1", VariantType::Research, Some(Category::Snv))
                .matches(&v)
        );
        assert!(!VariantFilter::scope("case-1", VariantType::Clinical, None).matches(&v));
        assert!(!VariantFilter::scope("case-2", VariantType::Research, None).matches(&v));
    }

    #[test]
    fn filter_hgnc_ids() {
        let mut v = variant("x", "case-1", "1", 1, 1, None);
        v.hgnc_ids = vec![1100, 1101];

        let hit = VariantFilter {
            hgnc_ids: Some(vec![1101]),
            ..Default::default()
        };
        let miss = VariantFilter {
            hgnc_ids: Some(vec![7]),
            ..Default::default()
        };
        assert!(hit.matches(&v));
        assert!(!miss.matches(&v));
    }

    #[test]
    fn trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn VariantStore) {}
    }
}
