//! Enrichment of compound references with data of the referenced variants.

use std::collections::HashMap;

use crate::{
    err::Error,
    store::{VariantFilter, VariantStore},
    variants::schema::{Category, Compound, CompoundGene, Region, Variant, VariantType},
};

/// Where compound partners are looked up.
pub enum Partners<'a> {
    /// Index of the variants of one region, built once per refresh pass.
    Index(&'a HashMap<String, Variant>),
    /// Look up each partner in the store.
    Store(&'a dyn VariantStore),
}

impl Partners<'_> {
    fn get(&self, id: &str) -> Result<Option<Variant>, Error> {
        match self {
            Partners::Index(index) => Ok(index.get(id).cloned()),
            Partners::Store(store) => Ok(store.variant(id)?),
        }
    }
}

/// Compute the enriched compounds of `variant`, sorted by descending combined score.
///
/// Partners that cannot be found are kept with `not_loaded` set, carrying only
/// their id and combined score.
pub fn refresh(variant: &Variant, partners: &Partners) -> Result<Vec<Compound>, Error> {
    let mut result = Vec::with_capacity(variant.compounds.len());
    for compound in &variant.compounds {
        let enriched = match partners.get(&compound.variant)? {
            Some(partner) => Compound {
                variant: compound.variant.clone(),
                display_name: compound.display_name.clone(),
                combined_score: compound.combined_score,
                rank_score: partner.rank_score,
                not_loaded: false,
                genes: partner
                    .genes
                    .iter()
                    .map(|gene| CompoundGene {
                        hgnc_id: gene.hgnc_id,
                        hgnc_symbol: gene.hgnc_symbol.clone(),
                        region_annotation: gene.region_annotation.clone(),
                        functional_annotation: gene.functional_annotation.clone(),
                    })
                    .collect(),
            },
            None => Compound {
                variant: compound.variant.clone(),
                combined_score: compound.combined_score,
                not_loaded: true,
                ..Default::default()
            },
        };
        result.push(enriched);
    }
    result.sort_by(|lhs, rhs| rhs.combined_score.total_cmp(&lhs.combined_score));
    Ok(result)
}

/// Refresh the compounds of all variants in `region`, returns the number of updated variants.
pub fn update_compounds_in_region(
    store: &dyn VariantStore,
    case_id: &str,
    variant_type: VariantType,
    category: Category,
    region: &Region,
) -> Result<usize, Error> {
    tracing::info!("updating compounds of variants in {}", region);

    let filter = VariantFilter {
        chromosome: Some(region.chrom.clone()),
        start: Some(region.start),
        end: Some(region.end),
        ..VariantFilter::scope(case_id, variant_type, Some(category))
    };
    let variants = store.find_variants(&filter)?;
    let order = variants.iter().map(|v| v.id.clone()).collect::<Vec<_>>();
    let index: HashMap<String, Variant> =
        variants.into_iter().map(|v| (v.id.clone(), v)).collect();

    let mut updated = 0;
    for id in &order {
        let variant = match index.get(id) {
            Some(variant) if !variant.compounds.is_empty() => variant,
            _ => continue,
        };
        let compounds = refresh(variant, &Partners::Index(&index))?;
        store.replace_variant(&Variant {
            compounds,
            ..variant.clone()
        })?;
        updated += 1;
    }

    tracing::info!("... updated compounds of {} variants", updated);
    Ok(updated)
}
