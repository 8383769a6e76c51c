//! Persistent variant store on top of RocksDB.
//!
//! Documents are written as JSON into the column families `cases` and
//! `variants`, keyed by their ids.  The `meta` column family records the
//! version of the writer.

use std::{path::Path, sync::Mutex};

use super::{case_visible_to, Error, Result, VariantFilter, VariantStore};
use crate::{
    common::worker_version,
    variants::schema::{Case, Variant},
};

/// Name of the column family for meta data.
const CF_META: &str = "meta";
/// Name of the column family for cases.
const CF_CASES: &str = "cases";
/// Name of the column family for variants.
const CF_VARIANTS: &str = "variants";

/// Variant store backed by RocksDB.
pub struct RocksDbStore {
    db: rocksdb::DBWithThreadMode<rocksdb::MultiThreaded>,
    /// Serializes the check-then-put of inserts.
    insert_lock: Mutex<()>,
}

impl std::fmt::Debug for RocksDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbStore")
            .field("path", &self.db.path())
            .finish()
    }
}

/// Construct RocksDB options for opening the store.
fn build_rocksdb_options() -> rocksdb::Options {
    let mut options = rocksdb::Options::default();

    options.create_if_missing(true);
    options.create_missing_column_families(true);
    options.set_compression_type(rocksdb::DBCompressionType::Zstd);

    options
}

impl RocksDbStore {
    /// Open the store at `path`, creating it if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::debug!("opening RocksDB at {:?}", path.as_ref());
        let options = build_rocksdb_options();
        let db = rocksdb::DBWithThreadMode::<rocksdb::MultiThreaded>::open_cf(
            &options,
            path.as_ref(),
            [CF_META, CF_CASES, CF_VARIANTS],
        )?;

        let store = Self {
            db,
            insert_lock: Mutex::new(()),
        };
        store.write_meta(path.as_ref())?;
        Ok(store)
    }

    fn write_meta(&self, path: &Path) -> Result<()> {
        let cf_meta = self.cf(CF_META)?;
        self.db
            .put_cf(&cf_meta, "worker-version", worker_version())?;
        let db_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        self.db.put_cf(&cf_meta, "db-name", db_name)?;
        Ok(())
    }

    /// Read a meta data value.
    pub fn meta(&self, key: &str) -> Result<Option<String>> {
        let cf_meta = self.cf(CF_META)?;
        Ok(self
            .db
            .get_cf(&cf_meta, key)?
            .map(|raw| String::from_utf8_lossy(&raw).to_string()))
    }

    fn cf(&self, name: &'static str) -> Result<std::sync::Arc<rocksdb::BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or(Error::MissingColumnFamily(name))
    }

    fn put_variant(&self, variant: &Variant) -> Result<()> {
        let cf_variants = self.cf(CF_VARIANTS)?;
        self.db.put_cf(
            &cf_variants,
            variant.id.as_bytes(),
            serde_json::to_vec(variant)?,
        )?;
        Ok(())
    }

    /// Decode all documents of a column family, in key order.
    fn scan<T: serde::de::DeserializeOwned>(&self, name: &'static str) -> Result<Vec<T>> {
        let cf = self.cf(name)?;
        let mut result = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            result.push(serde_json::from_slice(&value)?);
        }
        Ok(result)
    }
}

impl VariantStore for RocksDbStore {
    fn insert_variant(&self, variant: &Variant) -> Result<()> {
        let _guard = self.insert_lock.lock().map_err(|_| Error::LockPoisoned)?;
        let cf_variants = self.cf(CF_VARIANTS)?;
        if self
            .db
            .get_pinned_cf(&cf_variants, variant.id.as_bytes())?
            .is_some()
        {
            return Err(Error::DuplicateKey(variant.id.clone()));
        }
        self.put_variant(variant)
    }

    fn replace_variant(&self, variant: &Variant) -> Result<()> {
        self.put_variant(variant)
    }

    fn set_variant_rank(&self, id: &str, rank: usize) -> Result<bool> {
        let _guard = self.insert_lock.lock().map_err(|_| Error::LockPoisoned)?;
        match self.variant(id)? {
            Some(mut variant) => {
                variant.variant_rank = Some(rank);
                self.put_variant(&variant)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn variant(&self, id: &str) -> Result<Option<Variant>> {
        let cf_variants = self.cf(CF_VARIANTS)?;
        match self.db.get_pinned_cf(&cf_variants, id.as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn find_variants(&self, filter: &VariantFilter) -> Result<Vec<Variant>> {
        if let Some(ids) = &filter.ids {
            let mut result = Vec::new();
            for id in ids {
                if let Some(variant) = self.variant(id)? {
                    if filter.matches(&variant) {
                        result.push(variant);
                    }
                }
            }
            return Ok(result);
        }

        Ok(self
            .scan::<Variant>(CF_VARIANTS)?
            .into_iter()
            .filter(|variant| filter.matches(variant))
            .collect())
    }

    fn delete_variants(&self, filter: &VariantFilter) -> Result<usize> {
        let cf_variants = self.cf(CF_VARIANTS)?;
        let doomed = self.find_variants(filter)?;
        let mut batch = rocksdb::WriteBatch::default();
        for variant in &doomed {
            batch.delete_cf(&cf_variants, variant.id.as_bytes());
        }
        self.db.write(batch)?;
        Ok(doomed.len())
    }

    fn case(&self, case_id: &str) -> Result<Option<Case>> {
        let cf_cases = self.cf(CF_CASES)?;
        match self.db.get_pinned_cf(&cf_cases, case_id.as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn cases(&self, institute: Option<&str>) -> Result<Vec<Case>> {
        Ok(self
            .scan::<Case>(CF_CASES)?
            .into_iter()
            .filter(|case| case_visible_to(case, institute))
            .collect())
    }

    fn upsert_case(&self, case: &Case) -> Result<()> {
        let cf_cases = self.cf(CF_CASES)?;
        self.db
            .put_cf(&cf_cases, case.id.as_bytes(), serde_json::to_vec(case)?)?;
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
        let tmp_dir = temp_testdir::TempDir::default();
        let store = RocksDbStore::open(tmp_dir.join("variants-db"))?;

        check_store_contract(&store)
    }

    #[test]
    fn meta_is_written() -> std::result::Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let store = RocksDbStore::open(tmp_dir.join("variants-db"))?;

        assert_eq!(store.meta("worker-version")?.as_deref(), Some("x.y.z"));
        assert_eq!(store.meta("db-name")?.as_deref(), Some("variants-db"));

        Ok(())
    }

    #[test]
    fn reopen_keeps_documents() -> std::result::Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("variants-db");
        {
            let store = RocksDbStore::open(&path)?;
            store.insert_variant(&variant("a", "case-1", "1", 1, 1, Some(3.0)))?;
        }

        let store = RocksDbStore::open(&path)?;
        assert_eq!(
            store.variant("a")?.and_then(|v| v.rank_score),
            Some(3.0)
        );

        Ok(())
    }

    #[test]
    fn find_by_ids_skips_unknown() -> std::result::Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let store = RocksDbStore::open(tmp_dir.join("variants-db"))?;
        store.insert_variant(&variant("a", "case-1", "1", 1, 1, None))?;

        let found = store.find_variants(&VariantFilter {
            ids: Some(vec!["a".into(), "b".into()]),
            ..Default::default()
        })?;
        assert_eq!(found.len(), 1);

        Ok(())
    }
}
