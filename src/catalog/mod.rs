//! Reference catalog of genes, transcripts, gene panels and disease terms.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    common::GenomeRelease,
    variants::schema::{Case, DiseaseTerm},
};

pub mod json;

/// A transcript of a canonical gene.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct HgncTranscript {
    pub ensembl_transcript_id: String,
    #[serde(default)]
    pub refseq_ids: Vec<String>,
    /// Whether this is the primary transcript of the gene.
    #[serde(default)]
    pub is_primary: bool,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

/// A canonical gene record.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct HgncGene {
    pub hgnc_id: u32,
    pub hgnc_symbol: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub ensembl_id: Option<String>,
    pub chromosome: String,
    /// 1-based start position.
    pub start: usize,
    /// 1-based, inclusive end position.
    pub end: usize,
    #[serde(default)]
    pub build: GenomeRelease,
    /// OMIM lists the gene with incomplete penetrance.
    #[serde(default)]
    pub incomplete_penetrance: bool,
    #[serde(default)]
    pub transcripts: Vec<HgncTranscript>,
}

/// Curation of one gene on a panel.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct PanelGene {
    pub hgnc_id: u32,
    pub symbol: Option<String>,
    /// RefSeq transcript ids, possibly versioned.
    #[serde(default)]
    pub disease_associated_transcripts: Vec<String>,
    #[serde(default)]
    pub reduced_penetrance: bool,
    #[serde(default)]
    pub mosaicism: bool,
    #[serde(default)]
    pub inheritance_models: Vec<String>,
}

/// One version of a gene panel.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct GenePanel {
    pub panel_name: String,
    pub version: f64,
    pub display_name: Option<String>,
    #[serde(default)]
    pub institute: String,
    #[serde(default)]
    pub genes: Vec<PanelGene>,
}

/// Lookup of genes, panels and disease terms.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn ReferenceCatalog>`.
pub trait ReferenceCatalog: Send + Sync {
    /// The gene with the given HGNC id in the given release.
    fn gene_by_id(
        &self,
        hgnc_id: u32,
        release: GenomeRelease,
    ) -> Result<Option<HgncGene>, anyhow::Error>;

    /// Genes for a symbol.
    ///
    /// If the symbol is a primary symbol then only this gene is returned,
    /// otherwise all genes that list the symbol as alias.
    fn genes_by_alias(
        &self,
        symbol: &str,
        release: GenomeRelease,
    ) -> Result<Vec<HgncGene>, anyhow::Error>;

    /// The panel versions that the case refers to.
    fn panels_for_case(&self, case: &Case) -> Result<Vec<GenePanel>, anyhow::Error>;

    /// Mapping from HGNC id to the names of the case panels containing the gene.
    fn gene_to_panels(&self, case: &Case) -> Result<HashMap<u32, BTreeSet<String>>, anyhow::Error> {
        let mut result: HashMap<u32, BTreeSet<String>> = HashMap::new();
        for panel in self.panels_for_case(case)? {
            for gene in &panel.genes {
                result
                    .entry(gene.hgnc_id)
                    .or_default()
                    .insert(panel.panel_name.clone());
            }
        }
        Ok(result)
    }

    /// Mapping from HGNC id to gene for all genes of the release.
    fn hgncid_to_gene(
        &self,
        release: GenomeRelease,
    ) -> Result<HashMap<u32, HgncGene>, anyhow::Error>;

    /// Disease terms linked to the gene.
    fn disease_terms(&self, hgnc_id: u32) -> Result<Vec<DiseaseTerm>, anyhow::Error>;
}

/// Read-only snapshot of the lookup tables used while loading one batch.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub gene_to_panels: HashMap<u32, BTreeSet<String>>,
    pub hgncid_to_gene: HashMap<u32, HgncGene>,
}

impl LookupTables {
    /// Fetch the tables for the given case.
    pub fn fetch(catalog: &dyn ReferenceCatalog, case: &Case) -> Result<Self, anyhow::Error> {
        let gene_to_panels = catalog.gene_to_panels(case)?;
        let hgncid_to_gene = catalog.hgncid_to_gene(case.genome_build)?;
        tracing::debug!(
            "fetched lookup tables with {} panel genes and {} genes",
            gene_to_panels.len(),
            hgncid_to_gene.len()
        );
        Ok(Self {
            gene_to_panels,
            hgncid_to_gene,
        })
    }

    /// Names of the panels containing any of the genes, sorted.
    pub fn panels_of(&self, hgnc_ids: &[u32]) -> Vec<String> {
        hgnc_ids
            .iter()
            .filter_map(|hgnc_id| self.gene_to_panels.get(hgnc_id))
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Symbol of the gene, if known.
    pub fn symbol_of(&self, hgnc_id: u32) -> Option<&str> {
        self.hgncid_to_gene
            .get(&hgnc_id)
            .map(|gene| gene.hgnc_symbol.as_str())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn panels_of_is_sorted_union() {
        let mut tables = LookupTables::default();
        tables
            .gene_to_panels
            .insert(1, ["OMIM-AUTO".to_string(), "EP".to_string()].into());
        tables.gene_to_panels.insert(2, ["EP".to_string()].into());

        assert_eq!(tables.panels_of(&[2, 1, 3]), vec!["EP", "OMIM-AUTO"]);
        assert_eq!(tables.panels_of(&[3]), Vec::<String>::new());
    }

    #[test]
    fn symbol_of() {
        let mut tables = LookupTables::default();
        tables.hgncid_to_gene.insert(
            1100,
            HgncGene {
                hgnc_id: 1100,
                hgnc_symbol: "BRCA1".into(),
                ..Default::default()
            },
        );

        assert_eq!(tables.symbol_of(1100), Some("BRCA1"));
        assert_eq!(tables.symbol_of(1), None);
    }
}
