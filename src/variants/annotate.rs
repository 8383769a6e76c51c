//! Gene and panel information for variants at query time.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use regex::Regex;

use crate::{
    catalog::{GenePanel, PanelGene, ReferenceCatalog},
    common::GenomeRelease,
    err::Error,
    variants::schema::{CommonGene, Variant},
};

lazy_static::lazy_static! {
    static ref VERSION_SUFFIX: Regex = Regex::new(r"\.\d+$").expect("invalid regex in source code");
}

/// Strip the version suffix of a transcript id, `NM_000001.2` becomes `NM_000001`.
pub fn strip_version(id: &str) -> String {
    VERSION_SUFFIX.replace(id, "").into_owned()
}

/// Panel curation of one gene merged over all panels.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct PanelCuration {
    disease_associated: BTreeSet<String>,
    disease_associated_no_version: BTreeSet<String>,
    manual_penetrance: bool,
    mosaicism: bool,
    manual_inheritance: BTreeSet<String>,
}

impl PanelCuration {
    fn merge(entries: &[&PanelGene]) -> Self {
        let mut result = Self::default();
        for entry in entries {
            for tx in &entry.disease_associated_transcripts {
                result
                    .disease_associated_no_version
                    .insert(strip_version(tx));
                result.disease_associated.insert(tx.clone());
            }
            result.manual_penetrance |= entry.reduced_penetrance;
            result.mosaicism |= entry.mosaicism;
            result
                .manual_inheritance
                .extend(entry.inheritance_models.iter().cloned());
        }
        result
    }
}

/// Add canonical gene, transcript and panel curation information to the genes of `variant`.
pub fn add_gene_info(
    mut variant: Variant,
    panels: &[GenePanel],
    catalog: &dyn ReferenceCatalog,
    release: GenomeRelease,
) -> Result<Variant, Error> {
    for gene in variant.genes.iter_mut() {
        let panel_entries = panels
            .iter()
            .flat_map(|panel| panel.genes.iter())
            .filter(|entry| entry.hgnc_id == gene.hgnc_id)
            .collect::<Vec<_>>();
        let curation = PanelCuration::merge(&panel_entries);

        let hgnc_gene = catalog
            .gene_by_id(gene.hgnc_id, release)
            .map_err(Error::Catalog)?;
        let transcripts_dict = hgnc_gene
            .as_ref()
            .map(|hgnc_gene| {
                hgnc_gene
                    .transcripts
                    .iter()
                    .map(|tx| (tx.ensembl_transcript_id.clone(), tx.clone()))
                    .collect::<IndexMap<_, _>>()
            })
            .unwrap_or_default();
        if hgnc_gene
            .as_ref()
            .map(|g| g.incomplete_penetrance)
            .unwrap_or(false)
        {
            gene.omim_penetrance = Some(true);
        }

        for transcript in gene.transcripts.iter_mut() {
            let hgnc_transcript = match transcripts_dict.get(&transcript.transcript_id) {
                Some(hgnc_transcript) => hgnc_transcript,
                None => continue,
            };
            if !hgnc_transcript.refseq_ids.is_empty() {
                transcript.refseq_ids = hgnc_transcript.refseq_ids.clone();
                if hgnc_transcript.refseq_ids.iter().any(|refseq_id| {
                    curation
                        .disease_associated_no_version
                        .contains(&strip_version(refseq_id))
                }) {
                    transcript.is_disease_associated = true;
                }
            }
            if hgnc_transcript.is_primary {
                transcript.is_primary = true;
            }
        }

        gene.disease_associated_transcripts = curation.disease_associated.into_iter().collect();
        gene.manual_penetrance = Some(curation.manual_penetrance);
        gene.mosaicism = Some(curation.mosaicism);
        gene.manual_inheritance = curation.manual_inheritance.into_iter().collect();
        gene.common = hgnc_gene.map(|hgnc_gene| CommonGene {
            gene: hgnc_gene,
            transcripts_dict,
        });
        gene.disease_terms = catalog
            .disease_terms(gene.hgnc_id)
            .map_err(Error::Catalog)?;
    }

    Ok(variant)
}
