//! In-memory variant store.

use std::sync::RwLock;

use indexmap::IndexMap;

use super::{case_visible_to, Error, Result, VariantFilter, VariantStore};
use crate::variants::schema::{Case, Variant};

/// Variant store that keeps all documents in insertion order in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    variants: RwLock<IndexMap<String, Variant>>,
    cases: RwLock<IndexMap<String, Case>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VariantStore for MemoryStore {
    fn insert_variant(&self, variant: &Variant) -> Result<()> {
        let mut variants = self.variants.write().map_err(|_| Error::LockPoisoned)?;
        if variants.contains_key(&variant.id) {
            return Err(Error::DuplicateKey(variant.id.clone()));
        }
        variants.insert(variant.id.clone(), variant.clone());
        Ok(())
    }

    fn replace_variant(&self, variant: &Variant) -> Result<()> {
        let mut variants = self.variants.write().map_err(|_| Error::LockPoisoned)?;
        variants.insert(variant.id.clone(), variant.clone());
        Ok(())
    }

    fn set_variant_rank(&self, id: &str, rank: usize) -> Result<bool> {
        let mut variants = self.variants.write().map_err(|_| Error::LockPoisoned)?;
        Ok(match variants.get_mut(id) {
            Some(variant) => {
                variant.variant_rank = Some(rank);
                true
            }
            None => false,
        })
    }

    fn variant(&self, id: &str) -> Result<Option<Variant>> {
        let variants = self.variants.read().map_err(|_| Error::LockPoisoned)?;
        Ok(variants.get(id).cloned())
    }

    fn find_variants(&self, filter: &VariantFilter) -> Result<Vec<Variant>> {
        let variants = self.variants.read().map_err(|_| Error::LockPoisoned)?;
        Ok(variants
            .values()
            .filter(|variant| filter.matches(variant))
            .cloned()
            .collect())
    }

    fn delete_variants(&self, filter: &VariantFilter) -> Result<usize> {
        let mut variants = self.variants.write().map_err(|_| Error::LockPoisoned)?;
        let before = variants.len();
        variants.retain(|_, variant| !filter.matches(variant));
        Ok(before - variants.len())
    }

    fn case(&self, case_id: &str) -> Result<Option<Case>> {
        let cases = self.cases.read().map_err(|_| Error::LockPoisoned)?;
        Ok(cases.get(case_id).cloned())
    }

    fn cases(&self, institute: Option<&str>) -> Result<Vec<Case>> {
        let cases = self.cases.read().map_err(|_| Error::LockPoisoned)?;
        Ok(cases
            .values()
            .filter(|case| case_visible_to(case, institute))
            .cloned()
            .collect())
    }

    fn upsert_case(&self, case: &Case) -> Result<()> {
        let mut cases = self.cases.write().map_err(|_| Error::LockPoisoned)?;
        cases.insert(case.id.clone(), case.clone());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::store::test::{check_store_contract, variant};

    #[test]
    fn contract() -> std::result::Result<(), anyhow::Error> {
        check_store_contract(&MemoryStore::new())
    }

    #[test]
    fn find_keeps_insertion_order() -> std::result::Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        for id in ["z", "a", "m"] {
            store.insert_variant(&variant(id, "case-1", "1", 1, 1, None))?;
        }

        let ids = store
            .find_variants(&VariantFilter::default())?
            .into_iter()
            .map(|v| v.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["z", "a", "m"]);

        Ok(())
    }
}
