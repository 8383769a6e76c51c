//! Construction of [`Variant`] documents from raw records.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::{header::HeaderInfo, reader::RawRecord};
use crate::{
    catalog::LookupTables,
    common::{canonicalize, md5_key},
    err::Error,
    variants::{
        consequence,
        schema::{
            Case, Category, Compound, Gene, GenotypeCall, SampleRole, Transcript, Variant,
            VariantType, PHENOTYPE_AFFECTED,
        },
    },
};

/// Storage id of a call, unique per case, category and variant type.
pub fn storage_id(
    chrom: &str,
    pos: usize,
    reference: &str,
    alternative: &str,
    category: Category,
    variant_type: VariantType,
    case_id: &str,
) -> String {
    md5_key(&[
        chrom,
        &pos.to_string(),
        reference,
        alternative,
        &category.to_string(),
        &variant_type.to_string(),
        case_id,
    ])
}

/// Positional id of a call, shared across cases and variant types.
pub fn positional_id(
    chrom: &str,
    pos: usize,
    reference: &str,
    alternative: &str,
    category: Category,
) -> String {
    md5_key(&[
        chrom,
        &pos.to_string(),
        reference,
        alternative,
        &category.to_string(),
    ])
}

/// Per-batch context for building variants.
#[derive(Debug)]
pub struct BuildContext<'a> {
    pub case: &'a Case,
    pub institute: &'a str,
    pub variant_type: VariantType,
    pub category: Category,
    pub tables: &'a LookupTables,
    pub header: &'a HeaderInfo,
    /// Roles of the samples, only filled for the cancer category.
    pub sample_roles: HashMap<String, SampleRole>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        case: &'a Case,
        variant_type: VariantType,
        category: Category,
        tables: &'a LookupTables,
        header: &'a HeaderInfo,
    ) -> Self {
        let sample_roles = if category == Category::Cancer {
            case.individuals
                .iter()
                .map(|individual| {
                    let role = if individual.phenotype == PHENOTYPE_AFFECTED {
                        SampleRole::Case
                    } else {
                        SampleRole::Control
                    };
                    (individual.individual_id.clone(), role)
                })
                .collect()
        } else {
            HashMap::new()
        };

        Self {
            case,
            institute: &case.owner,
            variant_type,
            category,
            tables,
            header,
            sample_roles,
        }
    }
}

/// Pick the value for `case_id` from `case:value` entries.
fn case_entry<'r>(
    raw: &'r RawRecord,
    key: &str,
    case_id: &str,
) -> Result<Option<&'r str>, Error> {
    for entry in raw.info(key) {
        let (case, value) = entry.split_once(':').ok_or_else(|| {
            Error::parse_failure(raw.locus(), format!("malformed {} entry {:?}", key, entry))
        })?;
        if case == case_id {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Rank score of the record for the given case.
pub fn parse_rank_score(raw: &RawRecord, case_id: &str) -> Result<Option<f64>, Error> {
    case_entry(raw, "RankScore", case_id)?
        .map(|value| {
            value.trim().parse::<f64>().map_err(|e| {
                Error::parse_failure(raw.locus(), format!("invalid rank score {:?}: {}", value, e))
            })
        })
        .transpose()
}

/// Rank score components labelled with the header categories.
fn parse_rank_result(
    raw: &RawRecord,
    categories: &[String],
) -> Result<Option<IndexMap<String, f64>>, Error> {
    let value = match raw.info_first("RankResult") {
        Some(value) if !categories.is_empty() => value,
        _ => return Ok(None),
    };
    let values = value.split('|').collect::<Vec<_>>();
    if values.len() != categories.len() {
        return Err(Error::parse_failure(
            raw.locus(),
            format!(
                "RankResult has {} values but header lists {} categories",
                values.len(),
                categories.len()
            ),
        ));
    }
    categories
        .iter()
        .zip(values)
        .map(|(category, value)| {
            value
                .trim()
                .parse::<f64>()
                .map(|value| (category.clone(), value))
                .map_err(|e| {
                    Error::parse_failure(raw.locus(), format!("invalid RankResult {:?}: {}", value, e))
                })
        })
        .collect::<Result<IndexMap<_, _>, _>>()
        .map(Some)
}

/// Compound references of the record for the given case.
fn parse_compounds(raw: &RawRecord, ctx: &BuildContext) -> Result<Vec<Compound>, Error> {
    let value = match case_entry(raw, "Compounds", &ctx.case.id)? {
        Some(value) => value,
        None => return Ok(Vec::new()),
    };

    value
        .split('|')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, score) = entry.split_once('>').ok_or_else(|| {
                Error::parse_failure(raw.locus(), format!("malformed compound {:?}", entry))
            })?;
            let combined_score = score.trim().parse::<f64>().map_err(|e| {
                Error::parse_failure(raw.locus(), format!("invalid compound score {:?}: {}", score, e))
            })?;
            let (chrom, pos, reference, alternative) = split_compound_name(name)
                .ok_or_else(|| {
                    Error::parse_failure(raw.locus(), format!("malformed compound name {:?}", name))
                })?;
            let chrom = canonicalize(chrom);
            Ok(Compound {
                variant: storage_id(
                    &chrom,
                    pos,
                    reference,
                    alternative,
                    ctx.category,
                    ctx.variant_type,
                    &ctx.case.id,
                ),
                display_name: Some(format!("{}_{}_{}_{}", &chrom, pos, reference, alternative)),
                combined_score,
                ..Default::default()
            })
        })
        .collect()
}

/// Split a compound name `chrom_pos_ref_alt`; the chromosome may contain underscores.
fn split_compound_name(name: &str) -> Option<(&str, usize, &str, &str)> {
    let mut parts = name.rsplitn(4, '_');
    let alternative = parts.next()?;
    let reference = parts.next()?;
    let pos = parts.next()?.parse().ok()?;
    let chrom = parts.next()?;
    if chrom.is_empty() || reference.is_empty() || alternative.is_empty() {
        return None;
    }
    Some((chrom, pos, reference, alternative))
}

/// A transcript as annotated in the CSQ field, with its gene.
#[derive(Debug, Clone)]
struct CsqEntry {
    symbol: Option<String>,
    gene_id: Option<String>,
    transcript: Transcript,
}

fn parse_hgnc_id(value: &str) -> Option<u32> {
    value.strip_prefix("HGNC:").unwrap_or(value).parse().ok()
}

/// `deleterious(0.01)` becomes `deleterious`.
fn strip_prediction_score(value: &str) -> String {
    value.split('(').next().unwrap_or(value).trim().to_string()
}

/// `ENST01:c.100A>G` becomes `c.100A>G`.
fn strip_feature_prefix(value: &str) -> String {
    value
        .split_once(':')
        .map(|(_, name)| name)
        .unwrap_or(value)
        .to_string()
}

/// Parse the CSQ entries of the record, only those with an HGNC id are kept.
fn parse_csq(raw: &RawRecord, fields: &[String]) -> Vec<CsqEntry> {
    if fields.is_empty() {
        return Vec::new();
    }

    raw.info("CSQ")
        .iter()
        .filter_map(|entry| {
            let values: HashMap<&str, &str> = fields
                .iter()
                .map(String::as_str)
                .zip(entry.split('|'))
                .filter(|(_, value)| !value.is_empty())
                .collect();
            let get = |key: &str| values.get(key).map(|value| value.to_string());

            let hgnc_id = values.get("HGNC_ID").and_then(|v| parse_hgnc_id(v))?;
            let functional_annotations = values
                .get("Consequence")
                .map(|v| v.split('&').map(str::to_string).collect::<Vec<_>>())
                .unwrap_or_default();
            let mut region_annotations: Vec<String> = Vec::new();
            for term in &functional_annotations {
                if let Some(region) = consequence::region(term) {
                    if !region_annotations.iter().any(|r| r == region) {
                        region_annotations.push(region.to_string());
                    }
                }
            }

            Some(CsqEntry {
                symbol: get("SYMBOL"),
                gene_id: get("Gene"),
                transcript: Transcript {
                    transcript_id: get("Feature").unwrap_or_default(),
                    hgnc_id: Some(hgnc_id),
                    protein_id: get("ENSP"),
                    biotype: get("BIOTYPE"),
                    functional_annotations,
                    region_annotations,
                    exon: get("EXON"),
                    intron: get("INTRON"),
                    strand: get("STRAND"),
                    coding_sequence_name: get("HGVSc").map(|v| strip_feature_prefix(&v)),
                    protein_sequence_name: get("HGVSp").map(|v| strip_feature_prefix(&v)),
                    sift_prediction: get("SIFT").map(|v| strip_prediction_score(&v)),
                    polyphen_prediction: get("PolyPhen").map(|v| strip_prediction_score(&v)),
                    is_canonical: values.get("CANONICAL") == Some(&"YES"),
                    ..Default::default()
                },
            })
        })
        .collect()
}

/// Group the transcripts into genes, in order of first appearance.
fn build_genes(entries: Vec<CsqEntry>, tables: &LookupTables) -> Vec<Gene> {
    let mut genes: IndexMap<u32, Gene> = IndexMap::new();
    for entry in entries {
        let hgnc_id = match entry.transcript.hgnc_id {
            Some(hgnc_id) => hgnc_id,
            None => continue,
        };
        let gene = genes.entry(hgnc_id).or_insert_with(|| Gene {
            hgnc_id,
            hgnc_symbol: tables
                .symbol_of(hgnc_id)
                .map(str::to_string)
                .or(entry.symbol.clone()),
            ensembl_gene_id: entry.gene_id.clone(),
            ..Default::default()
        });
        gene.transcripts.push(entry.transcript);
    }

    genes
        .into_values()
        .map(|mut gene| {
            let worst = consequence::most_severe(
                gene.transcripts
                    .iter()
                    .flat_map(|tx| tx.functional_annotations.iter().map(String::as_str)),
            )
            .map(str::to_string);
            if let Some(worst) = &worst {
                gene.region_annotation = consequence::region(worst).map(str::to_string);
                if let Some(tx) = gene
                    .transcripts
                    .iter()
                    .find(|tx| tx.functional_annotations.contains(worst))
                {
                    gene.sift_prediction = tx.sift_prediction.clone();
                    gene.polyphen_prediction = tx.polyphen_prediction.clone();
                }
            }
            gene.functional_annotation = worst;
            gene
        })
        .collect()
}

/// Sub-category, end and length of the call.
fn shape(
    raw: &RawRecord,
    category: Category,
    alternative: &str,
) -> Result<(String, usize, Option<usize>), Error> {
    match category {
        Category::Sv => {
            let sv_type = raw
                .info_first("SVTYPE")
                .ok_or_else(|| Error::parse_failure(raw.locus(), "missing INFO/SVTYPE"))?
                .to_lowercase();
            let end = match raw.info_first("END") {
                Some(end) => end.parse::<usize>().map_err(|e| {
                    Error::parse_failure(raw.locus(), format!("invalid INFO/END {:?}: {}", end, e))
                })?,
                None => raw.pos,
            };
            let length = raw
                .info_first("SVLEN")
                .and_then(|len| len.parse::<i64>().ok())
                .map(|len| len.unsigned_abs() as usize)
                .unwrap_or_else(|| end.saturating_sub(raw.pos));
            Ok((sv_type, end, Some(length)))
        }
        Category::Snv | Category::Cancer => {
            let end = raw.pos + raw.reference.len().max(1) - 1;
            if raw.reference.len() == 1 && alternative.len() == 1 {
                Ok(("snv".to_string(), end, Some(1)))
            } else {
                let length = raw.reference.len().abs_diff(alternative.len());
                Ok(("indel".to_string(), end, Some(length)))
            }
        }
    }
}

/// Build the variant for `raw`.
pub fn build_variant(raw: &RawRecord, ctx: &BuildContext) -> Result<Variant, Error> {
    let chrom = canonicalize(&raw.chrom);
    let alternative = raw
        .alternatives
        .first()
        .ok_or_else(|| Error::parse_failure(raw.locus(), "no alternative allele"))?
        .clone();
    let (sub_category, end, length) = shape(raw, ctx.category, &alternative)?;
    let case_id = ctx.case.id.as_str();

    let genes = build_genes(parse_csq(raw, &ctx.header.csq_fields), ctx.tables);
    let hgnc_ids = genes.iter().map(|gene| gene.hgnc_id).collect::<Vec<_>>();
    let hgnc_symbols = genes
        .iter()
        .filter_map(|gene| gene.hgnc_symbol.clone())
        .collect::<Vec<_>>();

    let genetic_models = case_entry(raw, "GeneticModels", case_id)?
        .map(|models| {
            models
                .split('|')
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let samples = ctx
        .case
        .individuals
        .iter()
        .filter_map(|individual| {
            let sample = raw
                .samples
                .iter()
                .find(|sample| sample.name == individual.individual_id)?;
            Some(GenotypeCall {
                sample_id: individual.individual_id.clone(),
                display_name: individual.display_name.clone(),
                genotype_call: sample.genotype.clone(),
                allele_depths: sample.allele_depths.clone(),
                read_depth: sample.read_depth,
                genotype_quality: sample.genotype_quality,
                role: ctx.sample_roles.get(&individual.individual_id).copied(),
            })
        })
        .collect();

    let simple_id = format!("{}_{}_{}_{}", &chrom, raw.pos, &raw.reference, &alternative);
    Ok(Variant {
        id: storage_id(
            &chrom,
            raw.pos,
            &raw.reference,
            &alternative,
            ctx.category,
            ctx.variant_type,
            case_id,
        ),
        variant_id: positional_id(&chrom, raw.pos, &raw.reference, &alternative, ctx.category),
        display_name: format!("{}_{}", &simple_id, ctx.variant_type),
        simple_id,
        case_id: case_id.to_string(),
        institute: ctx.institute.to_string(),
        variant_type: ctx.variant_type,
        category: ctx.category,
        sub_category,
        position: raw.pos,
        end,
        length,
        reference: raw.reference.clone(),
        alternative,
        rank_score: parse_rank_score(raw, case_id)?,
        variant_rank: None,
        rank_result: parse_rank_result(raw, &ctx.header.rank_result)?,
        genetic_models,
        panels: ctx.tables.panels_of(&hgnc_ids),
        hgnc_ids,
        hgnc_symbols,
        genes,
        compounds: parse_compounds(raw, ctx)?,
        samples,
        is_par: None,
        chromosome: chrom,
    })
}
