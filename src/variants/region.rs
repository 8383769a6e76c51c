//! Implementation of `variants extract-region` subcommand.

use std::io::Write;

use noodles_vcf as vcf;
use thousands::Separable;

use crate::{
    catalog::json::JsonCatalog,
    common::{self, io::open_read_maybe_gz},
    err::Error,
    variants::{
        ingest::{
            build::parse_rank_score, filter::RankFilter, open_case, reader::RawRecord, region_spec,
            RegionSpec,
        },
        schema::{Case, Category, Region, VariantType},
    },
};

/// The region to extract, genes without padding and missing bounds unbounded.
pub fn extraction_region(spec: &RegionSpec) -> Region {
    match spec {
        RegionSpec::Interval { chrom, start, end } => {
            Region::new(chrom, start.unwrap_or(1), end.unwrap_or(usize::MAX))
        }
        RegionSpec::Gene(gene) => Region::new(&gene.chromosome, gene.start, gene.end),
    }
}

/// Copy the records of the case's variant file in `region` to `out`, with the
/// original header.
///
/// The rank filter is only applied if `rank_threshold` is given.  Returns the
/// number of written records.
pub fn extract_region<W: Write>(
    case: &Case,
    region: Option<&RegionSpec>,
    variant_type: VariantType,
    category: Category,
    rank_threshold: Option<f64>,
    out: W,
) -> Result<usize, Error> {
    let path = case
        .vcf_files
        .get(variant_type, category)
        .ok_or_else(|| Error::MissingSourceFile {
            case_id: case.id.clone(),
            variant_type,
            category,
        })?;
    let region = region.map(extraction_region);
    let rank_filter = rank_threshold.map(|threshold| RankFilter::new(Some(threshold), false));
    tracing::info!(
        "extracting {:?} from {} (rank filter = {:?})",
        &region,
        path,
        &rank_filter
    );

    let mut reader = vcf::Reader::new(open_read_maybe_gz(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("could not open {}: {}", path, e),
        ))
    })?);
    let header = reader.read_header()?;
    let mut writer = vcf::Writer::new(out);
    writer.write_header(&header)?;

    let mut record = vcf::Record::default();
    let mut written = 0;
    while reader.read_record(&header, &mut record)? != 0 {
        let raw = match RawRecord::from_vcf(&record, &header) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("skipping record: {}", e);
                continue;
            }
        };
        if let Some(region) = &region {
            if !region.overlaps(&raw.chrom, raw.pos, raw.end()) {
                continue;
            }
        }
        if let Some(rank_filter) = &rank_filter {
            let rank_score = match parse_rank_score(&raw, &case.id) {
                Ok(rank_score) => rank_score,
                Err(e) => {
                    tracing::warn!("skipping record: {}", e);
                    continue;
                }
            };
            if !rank_filter.passes(&raw.chrom, rank_score) {
                continue;
            }
        }
        writer.write_record(&header, &record)?;
        written += 1;
    }

    tracing::info!("... wrote {} records", written.separate_with_commas());
    Ok(written)
}

/// Command line arguments for `variants extract-region` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "extract a region from the variant file of a case", long_about = None)]
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
    #[clap(long, value_enum, default_value_t = VariantType::Clinical)]
    pub variant_type: VariantType,
    #[clap(long, value_enum, default_value_t = Category::Snv)]
    pub category: Category,
    /// Only write records with a rank score above this value.
    #[clap(long, allow_hyphen_values = true)]
    pub rank_threshold: Option<f64>,
    /// Chromosome to extract, whole chromosome without `--start` and `--end`.
    #[clap(long, conflicts_with = "hgnc_symbol")]
    pub chrom: Option<String>,
    #[clap(long, requires = "chrom")]
    pub start: Option<usize>,
    #[clap(long, requires = "chrom")]
    pub end: Option<usize>,
    /// Extract the footprint of the gene with this symbol.
    #[clap(long)]
    pub hgnc_symbol: Option<String>,
    /// Path to the output VCF file, gzip-compressed if ending in `.gz`.
    #[clap(long)]
    pub path_out: String,
}

/// Main entry point for `variants extract-region` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    let (_store, case) = open_case(&args.path_db, &args.case_id)?;
    let catalog = JsonCatalog::from_path(&args.path_catalog)?;
    let region = region_spec(
        &catalog,
        &case,
        &args.chrom,
        args.start,
        args.end,
        &args.hgnc_symbol,
    )?;
    let out = common::io::open_write_maybe_gz(&args.path_out)?;
    extract_region(
        &case,
        region.as_ref(),
        args.variant_type,
        args.category,
        args.rank_threshold,
        out,
    )?;

    Ok(())
}
