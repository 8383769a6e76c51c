//! Implementation of `variants load` and `variants delete` subcommands.

use thousands::Separable;
use uuid::Uuid;

use crate::{
    catalog::{json::JsonCatalog, HgncGene, LookupTables, ReferenceCatalog},
    common,
    err::Error,
    store::{self, rocks::RocksDbStore, VariantFilter, VariantStore},
    variants::{
        compounds::update_compounds_in_region,
        rank::add_variant_rank,
        schema::{Case, Category, Region, VariantType},
    },
};

pub mod build;
pub mod filter;
pub mod header;
pub mod reader;

use self::{
    build::{build_variant, parse_rank_score, BuildContext},
    filter::RankFilter,
    reader::{RawRecord, SourceOpener, VcfOpener},
};

/// Flank added on each side of a gene when loading the variants of a gene.
pub const GENE_PADDING: usize = 5_000;

/// Log progress after this many parsed records.
const PARSED_PROGRESS_EVERY: usize = 5_000;
/// Log progress after this many inserted records.
const INSERTED_PROGRESS_EVERY: usize = 1_000;

/// Region restriction of a load.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionSpec {
    /// Genomic interval, both bounds are required for loading.
    Interval {
        chrom: String,
        start: Option<usize>,
        end: Option<usize>,
    },
    /// Footprint of a gene.
    Gene(HgncGene),
}

impl RegionSpec {
    /// The region to load, genes are padded by [`GENE_PADDING`] on each side.
    pub fn load_region(&self) -> Result<Region, Error> {
        match self {
            RegionSpec::Interval {
                chrom,
                start: Some(start),
                end: Some(end),
            } => {
                if start > end {
                    Err(Error::InvalidRegion(format!(
                        "start {} is after end {} on {}",
                        start, end, chrom
                    )))
                } else {
                    Ok(Region::new(chrom, *start, *end))
                }
            }
            RegionSpec::Interval { chrom, .. } => Err(Error::InvalidRegion(format!(
                "both start and end are required for chromosome {}",
                chrom
            ))),
            RegionSpec::Gene(gene) => Ok(Region::new(
                &gene.chromosome,
                gene.start.saturating_sub(GENE_PADDING).max(1),
                gene.end + GENE_PADDING,
            )),
        }
    }
}

/// Parameters of one load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadRequest {
    pub variant_type: VariantType,
    pub category: Category,
    /// Explicit rank score threshold, defaults depend on `region`.
    pub rank_threshold: Option<f64>,
    pub region: Option<RegionSpec>,
}

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LoadSummary {
    pub batch_id: Uuid,
    /// Number of records read from the file.
    pub parsed: usize,
    /// Number of variants written to the store.
    pub inserted: usize,
    pub region: Option<Region>,
}

/// States of one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BatchState {
    Opening,
    Streaming,
    Finalizing,
    RollingBack,
    Done,
    Failed,
}

/// In-flight state of one load.
#[derive(Debug)]
struct Batch {
    id: Uuid,
    state: BatchState,
    parsed: usize,
    inserted: usize,
    region: Option<Region>,
}

impl Batch {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: BatchState::Opening,
            parsed: 0,
            inserted: 0,
            region: None,
        }
    }

    fn transition(&mut self, state: BatchState) {
        tracing::debug!("batch {}: {} -> {}", self.id, self.state, state);
        self.state = state;
    }
}

/// Loads the variants of cases into a store.
pub struct VariantLoader<'a> {
    pub store: &'a dyn VariantStore,
    pub catalog: &'a dyn ReferenceCatalog,
    pub opener: &'a dyn SourceOpener,
}

impl VariantLoader<'_> {
    /// Load the variants of `case` described by `request`.
    ///
    /// On any error after the first write, all variants of the scope are
    /// removed again and the error is returned as [`Error::IngestionFailure`].
    pub fn load_variants(&self, case: &Case, request: &LoadRequest) -> Result<LoadSummary, Error> {
        let mut batch = Batch::new();
        tracing::info!(
            "loading {} {} variants of case {} (batch {})",
            request.variant_type,
            request.category,
            &case.id,
            batch.id
        );

        let path = case
            .vcf_files
            .get(request.variant_type, request.category)
            .ok_or_else(|| Error::MissingSourceFile {
                case_id: case.id.clone(),
                variant_type: request.variant_type,
                category: request.category,
            })?;
        batch.region = request
            .region
            .as_ref()
            .map(RegionSpec::load_region)
            .transpose()?;
        let tables = LookupTables::fetch(self.catalog, case).map_err(Error::Catalog)?;
        let source = self.opener.open(path, batch.region.as_ref())?;
        let header = source.header_info().clone();
        let ctx = BuildContext::new(
            case,
            request.variant_type,
            request.category,
            &tables,
            &header,
        );
        let rank_filter = RankFilter::new(request.rank_threshold, batch.region.is_some());
        tracing::debug!("rank filter = {:?}", &rank_filter);

        batch.transition(BatchState::Streaming);
        let result = self
            .stream(&mut batch, source, &ctx, &rank_filter)
            .and_then(|()| {
                batch.transition(BatchState::Finalizing);
                self.finalize(&batch, case, request)
            });

        match result {
            Ok(()) => {
                batch.transition(BatchState::Done);
                tracing::info!(
                    "... parsed {} records, inserted {} variants",
                    batch.parsed.separate_with_commas(),
                    batch.inserted.separate_with_commas()
                );
                Ok(LoadSummary {
                    batch_id: batch.id,
                    parsed: batch.parsed,
                    inserted: batch.inserted,
                    region: batch.region,
                })
            }
            Err(err) => {
                batch.transition(BatchState::RollingBack);
                tracing::warn!(
                    "loading case {} failed after {} inserted variants, rolling back: {}",
                    &case.id,
                    batch.inserted.separate_with_commas(),
                    &err
                );
                let scope =
                    VariantFilter::scope(&case.id, request.variant_type, Some(request.category));
                if let Err(e) = self.store.delete_variants(&scope) {
                    tracing::error!("could not roll back case {}: {}", &case.id, e);
                }
                batch.transition(BatchState::Failed);
                tracing::error!("batch {} of case {} failed: {}", batch.id, &case.id, &err);
                Err(Error::IngestionFailure {
                    case_id: case.id.clone(),
                    source: Box::new(err),
                })
            }
        }
    }

    /// Pull all records from `source`, stopping at the first fatal error.
    fn stream(
        &self,
        batch: &mut Batch,
        source: Box<dyn reader::RecordSource>,
        ctx: &BuildContext,
        rank_filter: &RankFilter,
    ) -> Result<(), Error> {
        let before = std::time::Instant::now();
        let mut prev = std::time::Instant::now();
        for item in source {
            batch.parsed += 1;
            if batch.parsed % PARSED_PROGRESS_EVERY == 0 {
                tracing::info!(
                    "... parsed {} records ({:?} for the last {})",
                    batch.parsed.separate_with_commas(),
                    prev.elapsed(),
                    PARSED_PROGRESS_EVERY.separate_with_commas()
                );
                prev = std::time::Instant::now();
            }

            match item.and_then(|raw| self.load_record(&raw, ctx, rank_filter)) {
                Ok(false) => (),
                Ok(true) => {
                    batch.inserted += 1;
                    if batch.inserted % INSERTED_PROGRESS_EVERY == 0 {
                        tracing::info!(
                            "... inserted {} variants",
                            batch.inserted.separate_with_commas()
                        );
                    }
                }
                Err(err @ Error::DuplicateIdentity(_)) => tracing::debug!("skipping: {}", err),
                Err(err) if err.is_recoverable() => tracing::warn!("skipping record: {}", err),
                Err(err) => return Err(err),
            }
        }
        tracing::info!(
            "... streamed {} records in {:?}",
            batch.parsed.separate_with_commas(),
            before.elapsed()
        );
        Ok(())
    }

    /// Gate, build and insert one record, returns whether a variant was inserted.
    fn load_record(
        &self,
        raw: &RawRecord,
        ctx: &BuildContext,
        rank_filter: &RankFilter,
    ) -> Result<bool, Error> {
        let rank_score = parse_rank_score(raw, &ctx.case.id)?;
        if !rank_filter.passes(&raw.chrom, rank_score) {
            return Ok(false);
        }
        let variant = build_variant(raw, ctx)?;
        match self.store.insert_variant(&variant) {
            Ok(()) => Ok(true),
            Err(store::Error::DuplicateKey(id)) => Err(Error::DuplicateIdentity(id)),
            Err(e) => Err(e.into()),
        }
    }

    fn finalize(&self, batch: &Batch, case: &Case, request: &LoadRequest) -> Result<(), Error> {
        add_variant_rank(self.store, &case.id, request.variant_type, request.category)?;
        if let Some(region) = &batch.region {
            update_compounds_in_region(
                self.store,
                &case.id,
                request.variant_type,
                request.category,
                region,
            )?;
        }
        Ok(())
    }
}

/// Delete the variants of a case, optionally restricted to one category.
pub fn delete_variants(
    store: &dyn VariantStore,
    case_id: &str,
    variant_type: VariantType,
    category: Option<Category>,
) -> Result<usize, Error> {
    tracing::info!(
        "deleting {} variants of case {} (category = {:?})",
        variant_type,
        case_id,
        category
    );
    let deleted = store.delete_variants(&VariantFilter::scope(case_id, variant_type, category))?;
    tracing::info!("... deleted {} variants", deleted.separate_with_commas());
    Ok(deleted)
}

/// Open the store and fetch the case, shared by the subcommands.
pub(crate) fn open_case(path_db: &str, case_id: &str) -> Result<(RocksDbStore, Case), anyhow::Error> {
    let store = RocksDbStore::open(path_db)
        .map_err(|e| anyhow::anyhow!("could not open store at {}: {}", path_db, e))?;
    let case = store
        .case(case_id)?
        .ok_or_else(|| anyhow::anyhow!("no case with id {} in {}", case_id, path_db))?;
    Ok((store, case))
}

/// Command line arguments for `variants load` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "load variants of a case", long_about = None)]
pub struct Args {
    /// Path to the RocksDB store.
    #[clap(long)]
    pub path_db: String,
    /// Path to the reference catalog JSON file.
    #[clap(long)]
    pub path_catalog: String,
    /// Identifier of the case.
    #[clap(long)]
    pub case_id: String,
    /// Clinical or research variants.
    #[clap(long, value_enum, default_value_t = VariantType::Clinical)]
    pub variant_type: VariantType,
    /// Category of the variants.
    #[clap(long, value_enum, default_value_t = Category::Snv)]
    pub category: Category,
    /// Only load variants with a rank score above this value.
    #[clap(long, allow_hyphen_values = true)]
    pub rank_threshold: Option<f64>,
    /// Chromosome to load.
    #[clap(long, conflicts_with = "hgnc_symbol")]
    pub chrom: Option<String>,
    /// Start of the region to load, 1-based.
    #[clap(long, requires = "chrom")]
    pub start: Option<usize>,
    /// End of the region to load, 1-based and inclusive.
    #[clap(long, requires = "chrom")]
    pub end: Option<usize>,
    /// Load the variants of the gene with this symbol.
    #[clap(long)]
    pub hgnc_symbol: Option<String>,
}

/// Resolve the region options of a command line.
pub(crate) fn region_spec(
    catalog: &dyn ReferenceCatalog,
    case: &Case,
    chrom: &Option<String>,
    start: Option<usize>,
    end: Option<usize>,
    hgnc_symbol: &Option<String>,
) -> Result<Option<RegionSpec>, anyhow::Error> {
    if let Some(symbol) = hgnc_symbol {
        let gene = catalog
            .genes_by_alias(symbol, case.genome_build)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("unknown gene symbol {}", symbol))?;
        Ok(Some(RegionSpec::Gene(gene)))
    } else {
        Ok(chrom.as_ref().map(|chrom| RegionSpec::Interval {
            chrom: chrom.clone(),
            start,
            end,
        }))
    }
}

/// Main entry point for `variants load` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    common::trace_rss_now();

    let (store, case) = open_case(&args.path_db, &args.case_id)?;
    tracing::info!("loading catalog from {}...", &args.path_catalog);
    let catalog = JsonCatalog::from_path(&args.path_catalog)?;

    let request = LoadRequest {
        variant_type: args.variant_type,
        category: args.category,
        rank_threshold: args.rank_threshold,
        region: region_spec(
            &catalog,
            &case,
            &args.chrom,
            args.start,
            args.end,
            &args.hgnc_symbol,
        )?,
    };
    let loader = VariantLoader {
        store: &store,
        catalog: &catalog,
        opener: &VcfOpener,
    };
    let summary = loader.load_variants(&case, &request)?;
    println!("{}", serde_json::to_string(&summary)?);

    common::trace_rss_now();
    tracing::info!(
        "All of `variants load` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}

/// Command line arguments for `variants delete` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "delete variants of a case", long_about = None)]
pub struct DeleteArgs {
    /// Path to the RocksDB store.
    #[clap(long)]
    pub path_db: String,
    /// Identifier of the case.
    #[clap(long)]
    pub case_id: String,
    /// Clinical or research variants.
    #[clap(long, value_enum, default_value_t = VariantType::Clinical)]
    pub variant_type: VariantType,
    /// Restrict deletion to one category.
    #[clap(long, value_enum)]
    pub category: Option<Category>,
}

/// Main entry point for `variants delete` sub command.
pub fn run_delete(args_common: &crate::common::Args, args: &DeleteArgs) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    let store = RocksDbStore::open(&args.path_db)
        .map_err(|e| anyhow::anyhow!("could not open store at {}: {}", &args.path_db, e))?;
    let deleted = delete_variants(&store, &args.case_id, args.variant_type, args.category)?;
    println!("{}", serde_json::json!({ "deleted": deleted }));

    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{
        build::storage_id,
        reader::test::MemoryOpener,
        *,
    };
    use crate::{store::memory::MemoryStore, variants::schema::Variant};

    const VCF: &str = "tests/data/case-1.snv.vcf";

    fn case() -> Result<Case, anyhow::Error> {
        let text = std::fs::read_to_string("tests/data/case-1.json")?;
        Ok(serde_json::from_str(&text)?)
    }

    fn catalog() -> Result<JsonCatalog, anyhow::Error> {
        JsonCatalog::from_path("tests/data/catalog.json")
    }

    fn scope_count(store: &dyn VariantStore) -> Result<usize, anyhow::Error> {
        Ok(store
            .find_variants(&VariantFilter::scope(
                "case-1",
                VariantType::Clinical,
                Some(Category::Snv),
            ))?
            .len())
    }

    fn sorted_ranks(store: &dyn VariantStore) -> Result<Vec<Option<usize>>, anyhow::Error> {
        let mut ranks = store
            .find_variants(&VariantFilter::default())?
            .into_iter()
            .map(|v| v.variant_rank)
            .collect::<Vec<_>>();
        ranks.sort();
        Ok(ranks)
    }

    #[test]
    fn load_whole_file() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let catalog = catalog()?;
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &VcfOpener,
        };

        let summary = loader.load_variants(&case()?, &LoadRequest::default())?;

        assert_eq!(summary.parsed, 10);
        assert_eq!(summary.inserted, 8);
        assert_eq!(summary.region, None);
        assert_eq!(scope_count(&store)?, 8);
        assert_eq!(sorted_ranks(&store)?, (1..=8).map(Some).collect::<Vec<_>>());

        let top = storage_id("1", 1100, "A", "G", Category::Snv, VariantType::Clinical, "case-1");
        assert_eq!(store.variant(&top)?.and_then(|v| v.variant_rank), Some(1));
        let mito = store
            .find_variants(&VariantFilter {
                chromosome: Some("MT".into()),
                ..Default::default()
            })?
            .into_iter()
            .map(|v| v.variant_rank)
            .collect::<Vec<_>>();
        assert_eq!(mito, vec![Some(8)]);

        Ok(())
    }

    #[test]
    #[tracing_test::traced_test]
    fn reload_is_idempotent() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let catalog = catalog()?;
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &VcfOpener,
        };
        let case = case()?;

        loader.load_variants(&case, &LoadRequest::default())?;
        let first = store.find_variants(&VariantFilter::default())?;
        let summary = loader.load_variants(&case, &LoadRequest::default())?;
        let second = store.find_variants(&VariantFilter::default())?;

        assert_eq!(summary.parsed, 10);
        assert_eq!(summary.inserted, 0);
        assert_eq!(first, second);
        assert!(logs_contain("is already loaded"));

        Ok(())
    }

    #[test]
    fn explicit_threshold() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let catalog = catalog()?;
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &VcfOpener,
        };
        let request = LoadRequest {
            rank_threshold: Some(8.0),
            ..Default::default()
        };

        let summary = loader.load_variants(&case()?, &request)?;

        // 15, 12, 9 and the mitochondrial call
        assert_eq!(summary.inserted, 4);

        Ok(())
    }

    #[test]
    fn fatal_error_rolls_back() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let catalog = catalog()?;
        let mut research = crate::store::test::variant("r", "case-1", "1", 1, 1, Some(1.0));
        research.variant_type = VariantType::Research;
        store.insert_variant(&research)?;

        let header_info = VcfOpener.open(VCF, None)?.header_info().clone();
        let opener = MemoryOpener {
            header_info,
            make: || {
                let mut items = VcfOpener
                    .open(VCF, None)
                    .expect("test file must open")
                    .collect::<Vec<_>>();
                items.insert(
                    4,
                    Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "truncated",
                    ))),
                );
                items
            },
        };
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &opener,
        };

        let err = loader
            .load_variants(&case()?, &LoadRequest::default())
            .expect_err("load must fail");

        assert!(matches!(err, Error::IngestionFailure { .. }));
        assert_eq!(scope_count(&store)?, 0);
        assert!(store.variant("r")?.is_some());

        Ok(())
    }

    /// Store whose ranking always fails.
    struct FailingRanks(MemoryStore);

    impl VariantStore for FailingRanks {
        fn insert_variant(&self, variant: &Variant) -> store::Result<()> {
            self.0.insert_variant(variant)
        }
        fn replace_variant(&self, variant: &Variant) -> store::Result<()> {
            self.0.replace_variant(variant)
        }
        fn set_variant_rank(&self, _id: &str, _rank: usize) -> store::Result<bool> {
            Err(store::Error::LockPoisoned)
        }
        fn variant(&self, id: &str) -> store::Result<Option<Variant>> {
            self.0.variant(id)
        }
        fn find_variants(&self, filter: &VariantFilter) -> store::Result<Vec<Variant>> {
            self.0.find_variants(filter)
        }
        fn delete_variants(&self, filter: &VariantFilter) -> store::Result<usize> {
            self.0.delete_variants(filter)
        }
        fn case(&self, case_id: &str) -> store::Result<Option<Case>> {
            self.0.case(case_id)
        }
        fn cases(&self, institute: Option<&str>) -> store::Result<Vec<Case>> {
            self.0.cases(institute)
        }
        fn upsert_case(&self, case: &Case) -> store::Result<()> {
            self.0.upsert_case(case)
        }
    }

    #[test]
    #[tracing_test::traced_test]
    fn ranking_error_rolls_back() -> Result<(), anyhow::Error> {
        let store = FailingRanks(MemoryStore::new());
        let catalog = catalog()?;
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &VcfOpener,
        };

        let err = loader
            .load_variants(&case()?, &LoadRequest::default())
            .expect_err("load must fail");

        assert!(matches!(
            err,
            Error::IngestionFailure { ref source, .. }
                if matches!(**source, Error::Store(store::Error::LockPoisoned))
        ));
        assert_eq!(scope_count(&store)?, 0);
        assert!(logs_contain("finalizing -> rolling_back"));

        Ok(())
    }

    #[test]
    fn malformed_record_is_skipped() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let catalog = catalog()?;
        let header_info = VcfOpener.open(VCF, None)?.header_info().clone();
        let opener = MemoryOpener {
            header_info,
            make: || {
                let mut items = VcfOpener
                    .open(VCF, None)
                    .expect("test file must open")
                    .collect::<Vec<_>>();
                items.insert(0, Err(Error::parse_failure("1:1", "bad INFO")));
                items
            },
        };
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &opener,
        };

        let summary = loader.load_variants(&case()?, &LoadRequest::default())?;

        assert_eq!(summary.parsed, 11);
        assert_eq!(summary.inserted, 8);

        Ok(())
    }

    #[test]
    fn missing_source_file() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let catalog = catalog()?;
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &VcfOpener,
        };
        let request = LoadRequest {
            variant_type: VariantType::Research,
            ..Default::default()
        };

        let err = loader
            .load_variants(&case()?, &request)
            .expect_err("load must fail");

        assert!(matches!(err, Error::MissingSourceFile { .. }));
        assert_eq!(store.find_variants(&VariantFilter::default())?.len(), 0);

        Ok(())
    }

    #[test]
    fn invalid_region() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let catalog = catalog()?;
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &VcfOpener,
        };
        let request = LoadRequest {
            region: Some(RegionSpec::Interval {
                chrom: "1".into(),
                start: Some(1),
                end: None,
            }),
            ..Default::default()
        };

        let err = loader
            .load_variants(&case()?, &request)
            .expect_err("load must fail");

        assert!(matches!(err, Error::InvalidRegion(_)));
        assert_eq!(store.find_variants(&VariantFilter::default())?.len(), 0);

        Ok(())
    }

    #[test]
    fn load_gene_region() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let catalog = catalog()?;
        let case = case()?;
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &VcfOpener,
        };
        let region = region_spec(&catalog, &case, &None, None, None, &Some("GENEA".into()))?;
        let request = LoadRequest {
            region,
            ..Default::default()
        };

        let summary = loader.load_variants(&case, &request)?;

        assert_eq!(summary.region, Some(Region::new("1", 1, 7000)));
        assert_eq!(summary.inserted, 6);
        assert_eq!(sorted_ranks(&store)?, (1..=6).map(Some).collect::<Vec<_>>());

        let id = storage_id("1", 1100, "A", "G", Category::Snv, VariantType::Clinical, "case-1");
        let compounds = store.variant(&id)?.map(|v| v.compounds).unwrap_or_default();
        assert_eq!(compounds.len(), 2);
        assert!(!compounds[0].not_loaded);
        assert_eq!(compounds[0].rank_score, Some(12.0));
        assert!(compounds[1].not_loaded);
        assert_eq!(compounds[1].rank_score, None);

        Ok(())
    }

    #[rstest::rstest]
    #[case(10_000, 20_000, 5_000, 25_000)]
    #[case(1_000, 2_000, 1, 7_000)]
    #[case(5_000, 5_000, 1, 10_000)]
    fn gene_padding(
        #[case] start: usize,
        #[case] end: usize,
        #[case] expected_start: usize,
        #[case] expected_end: usize,
    ) -> Result<(), anyhow::Error> {
        let spec = RegionSpec::Gene(HgncGene {
            chromosome: "1".into(),
            start,
            end,
            ..Default::default()
        });

        assert_eq!(
            spec.load_region()?,
            Region::new("1", expected_start, expected_end)
        );

        Ok(())
    }

    #[test]
    fn delete_by_category() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        let catalog = catalog()?;
        let loader = VariantLoader {
            store: &store,
            catalog: &catalog,
            opener: &VcfOpener,
        };
        loader.load_variants(&case()?, &LoadRequest::default())?;

        assert_eq!(
            delete_variants(&store, "case-1", VariantType::Clinical, Some(Category::Sv))?,
            0
        );
        assert_eq!(
            delete_variants(&store, "case-1", VariantType::Clinical, None)?,
            8
        );

        Ok(())
    }
}
