//! Case scoped retrieval of variants, causatives and overlapping variants.

use std::io::Write;

use itertools::Itertools;

use crate::{
    catalog::{json::JsonCatalog, GenePanel, ReferenceCatalog},
    common::{self, is_par, GenomeRelease},
    err::Error,
    store::{rocks::RocksDbStore, VariantFilter, VariantStore},
    variants::{
        annotate::add_gene_info,
        ingest::open_case,
        schema::{Case, Category, Variant, VariantType},
    },
};

pub mod sorting;

use self::sorting::{sort_variants, SortKey};

/// Number of variants returned by default.
pub const DEFAULT_COUNT: usize = 10;

/// Number of variants to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    /// No limit.
    All,
    Limit(usize),
}

impl Default for Count {
    fn default() -> Self {
        Count::Limit(DEFAULT_COUNT)
    }
}

/// Window into a sorted variant listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub skip: usize,
    pub count: Count,
}

impl Pagination {
    /// Maximal number of results after skipping, `None` for no limit.
    ///
    /// The limit is `skip + count`, explicit positional ids limit the result
    /// to their number.
    fn limit(&self, variant_ids: Option<&[String]>) -> Option<usize> {
        match (variant_ids, self.count) {
            (Some(variant_ids), _) => Some(variant_ids.len()),
            (None, Count::All) => None,
            (None, Count::Limit(count)) => Some(self.skip + count),
        }
    }
}

/// List the variants of a case.
///
/// `filter` may further restrict the selection; its case, category and
/// positional ids are replaced by the arguments, the variant type defaults to
/// clinical.
pub fn variants(
    store: &dyn VariantStore,
    case_id: &str,
    filter: &VariantFilter,
    variant_ids: Option<&[String]>,
    category: Category,
    pagination: &Pagination,
    sort_key: SortKey,
) -> Result<Vec<Variant>, Error> {
    let filter = VariantFilter {
        case_id: Some(case_id.to_string()),
        category: Some(category),
        variant_type: Some(filter.variant_type.unwrap_or(VariantType::Clinical)),
        variant_ids: variant_ids.map(|ids| ids.to_vec()),
        ..filter.clone()
    };
    tracing::debug!("variants filter = {:?}", &filter);

    let limit = pagination.limit(variant_ids);
    let sorted = sort_variants(store.find_variants(&filter)?, sort_key);
    Ok(sorted
        .into_iter()
        .skip(pagination.skip)
        .take(limit.unwrap_or(usize::MAX))
        .collect())
}

/// Genome release of the case, defaults for unknown cases.
fn case_release(store: &dyn VariantStore, case_id: &str) -> Result<GenomeRelease, Error> {
    Ok(store
        .case(case_id)?
        .map(|case| case.genome_build)
        .unwrap_or_default())
}

/// Fetch one variant with gene information.
///
/// With `case_id`, `document_id` is the positional id of the variant in that
/// case, otherwise the storage id.  Variants on X and Y are flagged whether
/// they are in a pseudo-autosomal region.
pub fn variant(
    store: &dyn VariantStore,
    catalog: &dyn ReferenceCatalog,
    document_id: &str,
    panels: &[GenePanel],
    case_id: Option<&str>,
) -> Result<Option<Variant>, Error> {
    let found = match case_id {
        Some(case_id) => store
            .find_variants(&VariantFilter {
                case_id: Some(case_id.to_string()),
                variant_ids: Some(vec![document_id.to_string()]),
                ..Default::default()
            })?
            .into_iter()
            .next(),
        None => store.variant(document_id)?,
    };
    let variant = match found {
        Some(variant) => variant,
        None => return Ok(None),
    };

    let release = case_release(store, &variant.case_id)?;
    let mut variant = add_gene_info(variant, panels, catalog, release)?;
    if matches!(
        common::canonicalize(&variant.chromosome).as_str(),
        "X" | "Y"
    ) {
        variant.is_par = Some(is_par(release, &variant.chromosome, variant.position));
    }
    Ok(Some(variant))
}

/// Overwrite the stored variant with `variant`.
pub fn update_variant(store: &dyn VariantStore, variant: &Variant) -> Result<(), Error> {
    tracing::debug!("updating variant {}", &variant.id);
    store.replace_variant(variant)?;
    Ok(())
}

/// Storage ids of the causatives of all cases the institute collaborates on.
pub fn causatives(store: &dyn VariantStore, institute: &str) -> Result<Vec<String>, Error> {
    Ok(store
        .cases(Some(institute))?
        .into_iter()
        .flat_map(|case| case.causatives)
        .unique()
        .collect())
}

/// Scope of a causatives check.
#[derive(Debug, Clone, Copy)]
pub enum CausativeScope<'a> {
    Case(&'a Case),
    Institute(&'a str),
}

impl<'a> CausativeScope<'a> {
    /// Exactly one of `case` and `institute` must be given.
    pub fn new(case: Option<&'a Case>, institute: Option<&'a str>) -> Result<Self, Error> {
        match (case, institute) {
            (Some(case), None) => Ok(CausativeScope::Case(case)),
            (None, Some(institute)) => Ok(CausativeScope::Institute(institute)),
            _ => Err(Error::InvalidScope),
        }
    }
}

/// Variants in the case (or institute) that are causatives elsewhere.
///
/// The case's own causatives are not considered.
pub fn check_causatives(
    store: &dyn VariantStore,
    scope: CausativeScope,
) -> Result<Vec<Variant>, Error> {
    let institute = match scope {
        CausativeScope::Case(case) => case.owner.as_str(),
        CausativeScope::Institute(institute) => institute,
    };
    let mut causative_ids = causatives(store, institute)?;
    if let CausativeScope::Case(case) = scope {
        causative_ids.retain(|id| !case.causatives.contains(id));
    }
    if causative_ids.is_empty() {
        return Ok(Vec::new());
    }

    let positional_ids = store
        .find_variants(&VariantFilter {
            ids: Some(causative_ids),
            ..Default::default()
        })?
        .into_iter()
        .map(|v| v.variant_id)
        .unique()
        .collect::<Vec<_>>();

    let filter = match scope {
        CausativeScope::Case(case) => VariantFilter {
            case_id: Some(case.id.clone()),
            ..Default::default()
        },
        CausativeScope::Institute(institute) => VariantFilter {
            institute: Some(institute.to_string()),
            ..Default::default()
        },
    };
    Ok(store.find_variants(&VariantFilter {
        variant_ids: Some(positional_ids),
        ..filter
    })?)
}

/// Causatives of other cases that look like `variant`.
///
/// Causatives are taken from the variant's institute.  Candidates are matched on the display name without the variant type suffix
/// and fetched one at a time.
pub fn other_causatives<'a>(
    store: &'a dyn VariantStore,
    case: &'a Case,
    variant: &Variant,
) -> Result<impl Iterator<Item = Result<Variant, Error>> + 'a, Error> {
    let prefix = match variant.display_name.rsplit_once('_') {
        Some((prefix, _)) => prefix.to_string(),
        None => variant.display_name.clone(),
    };
    let ids = causatives(store, &variant.institute)?;

    Ok(ids
        .into_iter()
        .filter_map(move |id| store.variant(&id).map_err(Error::from).transpose())
        .filter(move |other| match other {
            Ok(other) => other.case_id != case.id && other.display_name.starts_with(&prefix),
            Err(_) => true,
        }))
}

/// Variants of the opposite category overlapping the genes of `variant`.
///
/// The window is the bounding interval of the variant's genes on the variant
/// chromosome.  Variants without known genes overlap nothing.
pub fn overlapping(
    store: &dyn VariantStore,
    catalog: &dyn ReferenceCatalog,
    variant: &Variant,
) -> Result<Vec<Variant>, Error> {
    let release = case_release(store, &variant.case_id)?;
    let chrom = common::canonicalize(&variant.chromosome);
    let mut window: Option<(usize, usize)> = None;
    for hgnc_id in &variant.hgnc_ids {
        let gene = match catalog
            .gene_by_id(*hgnc_id, release)
            .map_err(Error::Catalog)?
        {
            Some(gene) if common::canonicalize(&gene.chromosome) == chrom => gene,
            _ => continue,
        };
        window = Some(match window {
            None => (gene.start, gene.end),
            Some((start, end)) => (start.min(gene.start), end.max(gene.end)),
        });
    }
    let (start, end) = match window {
        Some(window) => window,
        None => return Ok(Vec::new()),
    };

    let filter = VariantFilter {
        chromosome: Some(variant.chromosome.clone()),
        start: Some(start),
        end: Some(end),
        ..VariantFilter::scope(
            &variant.case_id,
            variant.variant_type,
            Some(variant.category.opposite()),
        )
    };
    Ok(sort_variants(store.find_variants(&filter)?, SortKey::RankScore))
}

/// Write one JSON document per line.
fn write_json_lines<T: serde::Serialize>(items: &[T]) -> Result<(), anyhow::Error> {
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for item in items {
        serde_json::to_writer(&mut out, item)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Command line arguments for `variants list` sub command.
#[derive(clap::Parser, Debug)]
#[command(author, version, about = "list variants of a case", long_about = None)]
pub struct ListArgs {
    /// Path to the RocksDB store.
    #[arg(long)]
    pub path_db: String,
    /// Identifier of the case.
    #[arg(long)]
    pub case_id: String,
    #[arg(long, value_enum, default_value_t = Category::Snv)]
    pub category: Category,
    #[arg(long, value_enum, default_value_t = VariantType::Clinical)]
    pub variant_type: VariantType,
    /// Positional ids to select.
    #[arg(long)]
    pub variant_id: Vec<String>,
    /// Number of variants to skip.
    #[arg(long, default_value_t = 0)]
    pub skip: usize,
    /// Number of variants to return.
    #[arg(long, default_value_t = DEFAULT_COUNT, conflicts_with = "all")]
    pub count: usize,
    /// Return all variants.
    #[arg(long)]
    pub all: bool,
    #[arg(long, value_enum, default_value_t = SortKey::VariantRank)]
    pub sort_key: SortKey,
    /// Only variants in any of these genes (HGNC ids).
    #[arg(long)]
    pub hgnc_id: Vec<u32>,
    /// Only variants with at least this rank score.
    #[arg(long)]
    pub min_rank_score: Option<f64>,
}

/// Main entry point for `variants list` sub command.
pub fn run_list(args_common: &crate::common::Args, args: &ListArgs) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let store = RocksDbStore::open(&args.path_db)?;
    let pagination = Pagination {
        skip: args.skip,
        count: if args.all {
            Count::All
        } else {
            Count::Limit(args.count)
        },
    };
    let variant_ids = (!args.variant_id.is_empty()).then_some(args.variant_id.as_slice());
    let result = variants(
        &store,
        &args.case_id,
        &VariantFilter {
            variant_type: Some(args.variant_type),
            hgnc_ids: (!args.hgnc_id.is_empty()).then(|| args.hgnc_id.clone()),
            min_rank_score: args.min_rank_score,
            ..Default::default()
        },
        variant_ids,
        args.category,
        &pagination,
        args.sort_key,
    )?;
    tracing::info!("... found {} variants", result.len());
    write_json_lines(&result)
}

/// Command line arguments for `variants show` sub command.
#[derive(clap::Parser, Debug)]
#[command(author, version, about = "show one variant with gene information", long_about = None)]
pub struct ShowArgs {
    /// Path to the RocksDB store.
    #[arg(long)]
    pub path_db: String,
    /// Path to the reference catalog JSON file.
    #[arg(long)]
    pub path_catalog: String,
    /// Storage id, or positional id if `--case-id` is given.
    #[arg(long)]
    pub variant_id: String,
    /// Look up the positional id in this case.
    #[arg(long)]
    pub case_id: Option<String>,
}

/// Main entry point for `variants show` sub command.
pub fn run_show(args_common: &crate::common::Args, args: &ShowArgs) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let store = RocksDbStore::open(&args.path_db)?;
    let catalog = JsonCatalog::from_path(&args.path_catalog)?;
    let panels = match &args.case_id {
        Some(case_id) => match store.case(case_id)? {
            Some(case) => catalog.panels_for_case(&case)?,
            None => anyhow::bail!("no case with id {}", case_id),
        },
        None => Vec::new(),
    };
    let found = variant(
        &store,
        &catalog,
        &args.variant_id,
        &panels,
        args.case_id.as_deref(),
    )?
    .ok_or_else(|| anyhow::anyhow!("no variant with id {}", &args.variant_id))?;
    write_json_lines(&[found])
}

/// Command line arguments for `variants overlapping` sub command.
#[derive(clap::Parser, Debug)]
#[command(author, version, about = "list variants of the other category in the same genes", long_about = None)]
pub struct OverlappingArgs {
    /// Path to the RocksDB store.
    #[arg(long)]
    pub path_db: String,
    /// Path to the reference catalog JSON file.
    #[arg(long)]
    pub path_catalog: String,
    /// Storage id of the variant.
    #[arg(long)]
    pub variant_id: String,
}

/// Main entry point for `variants overlapping` sub command.
pub fn run_overlapping(
    args_common: &crate::common::Args,
    args: &OverlappingArgs,
) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let store = RocksDbStore::open(&args.path_db)?;
    let catalog = JsonCatalog::from_path(&args.path_catalog)?;
    let found = store
        .variant(&args.variant_id)?
        .ok_or_else(|| anyhow::anyhow!("no variant with id {}", &args.variant_id))?;
    write_json_lines(&overlapping(&store, &catalog, &found)?)
}

/// Command line arguments for `variants causatives` sub command.
#[derive(clap::Parser, Debug)]
#[command(author, version, about = "list causatives", long_about = None)]
pub struct CausativesArgs {
    /// Path to the RocksDB store.
    #[arg(long)]
    pub path_db: String,
    /// Check the variants of this case.
    #[arg(long)]
    pub case_id: Option<String>,
    /// Institute whose causatives to list or check.
    #[arg(long)]
    pub institute: Option<String>,
    /// Return variants that are causatives in other cases instead of ids.
    #[arg(long)]
    pub check: bool,
    /// With `--case-id`, list causatives of other cases that look like this
    /// variant (storage id) instead.
    #[arg(long, requires = "case_id", conflicts_with = "check")]
    pub other_than: Option<String>,
}

/// Main entry point for `variants causatives` sub command.
pub fn run_causatives(
    args_common: &crate::common::Args,
    args: &CausativesArgs,
) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let (store, case) = match &args.case_id {
        Some(case_id) => {
            let (store, case) = open_case(&args.path_db, case_id)?;
            (store, Some(case))
        }
        None => (RocksDbStore::open(&args.path_db)?, None),
    };

    if let (Some(case), Some(variant_id)) = (&case, &args.other_than) {
        let found = store
            .variant(variant_id)?
            .ok_or_else(|| anyhow::anyhow!("no variant with id {}", variant_id))?;
        let others = other_causatives(&store, case, &found)?.collect::<Result<Vec<_>, _>>()?;
        return write_json_lines(&others);
    }

    let scope = CausativeScope::new(case.as_ref(), args.institute.as_deref())?;
    if args.check {
        write_json_lines(&check_causatives(&store, scope)?)
    } else {
        let institute = match scope {
            CausativeScope::Case(case) => case.owner.as_str(),
            CausativeScope::Institute(institute) => institute,
        };
        write_json_lines(&causatives(&store, institute)?)
    }
}
