//! Assignment of the dense `variant_rank`.

use thousands::Separable;

use crate::{
    err::Error,
    store::{VariantFilter, VariantStore},
    variants::{
        query::sorting::{sort_variants, SortKey},
        schema::{Category, VariantType},
    },
};

/// Number the variants of the case in `variant_type` and `category` as 1..N by
/// descending rank score.  Variants without a score come last, ties keep
/// storage order.
///
/// Returns the number of ranked variants.
pub fn add_variant_rank(
    store: &dyn VariantStore,
    case_id: &str,
    variant_type: VariantType,
    category: Category,
) -> Result<usize, Error> {
    tracing::info!(
        "updating variant_rank of {} {} variants of case {}",
        variant_type,
        category,
        case_id
    );
    let before = std::time::Instant::now();

    let variants = store.find_variants(&VariantFilter::scope(
        case_id,
        variant_type,
        Some(category),
    ))?;
    let sorted = sort_variants(variants, SortKey::RankScore);
    for (index, variant) in sorted.iter().enumerate() {
        store.set_variant_rank(&variant.id, index + 1)?;
    }

    tracing::info!(
        "... ranked {} variants in {:?}",
        sorted.len().separate_with_commas(),
        before.elapsed()
    );
    Ok(sorted.len())
}
