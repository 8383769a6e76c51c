//! Reference catalog read from a single JSON document.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};

use super::{GenePanel, HgncGene, ReferenceCatalog};
use crate::{
    common::{io::open_read_maybe_gz, GenomeRelease},
    variants::schema::{Case, DiseaseTerm},
};

/// On-disk layout of the catalog.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CatalogData {
    #[serde(default)]
    pub genes: Vec<HgncGene>,
    #[serde(default)]
    pub panels: Vec<GenePanel>,
    #[serde(default)]
    pub disease_terms: Vec<DiseaseTerm>,
}

/// Catalog held in memory.
#[derive(Debug, Default, Clone)]
pub struct JsonCatalog {
    data: CatalogData,
}

impl JsonCatalog {
    pub fn new(data: CatalogData) -> Self {
        Self { data }
    }

    /// Load catalog from a (possibly gzip-compressed) JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        tracing::info!("loading reference catalog from {:?}", path.as_ref());
        let reader = open_read_maybe_gz(path.as_ref())?;
        let data: CatalogData = serde_json::from_reader(reader).map_err(|e| {
            anyhow::anyhow!("could not parse catalog {:?}: {}", path.as_ref(), e)
        })?;
        tracing::info!(
            "  catalog has {} genes, {} panels, {} disease terms",
            data.genes.len(),
            data.panels.len(),
            data.disease_terms.len()
        );
        Ok(Self::new(data))
    }

    fn genes_of(&self, release: GenomeRelease) -> impl Iterator<Item = &HgncGene> {
        self.data
            .genes
            .iter()
            .filter(move |gene| gene.build == release)
    }
}

impl ReferenceCatalog for JsonCatalog {
    fn gene_by_id(
        &self,
        hgnc_id: u32,
        release: GenomeRelease,
    ) -> Result<Option<HgncGene>, anyhow::Error> {
        Ok(self
            .genes_of(release)
            .find(|gene| gene.hgnc_id == hgnc_id)
            .cloned())
    }

    fn genes_by_alias(
        &self,
        symbol: &str,
        release: GenomeRelease,
    ) -> Result<Vec<HgncGene>, anyhow::Error> {
        let primary = self
            .genes_of(release)
            .filter(|gene| gene.hgnc_symbol == symbol)
            .cloned()
            .collect::<Vec<_>>();
        if !primary.is_empty() {
            return Ok(primary);
        }
        Ok(self
            .genes_of(release)
            .filter(|gene| gene.aliases.iter().any(|alias| alias == symbol))
            .cloned()
            .collect())
    }

    fn panels_for_case(&self, case: &Case) -> Result<Vec<GenePanel>, anyhow::Error> {
        let mut result = Vec::new();
        for panel_ref in &case.panels {
            let found = self.data.panels.iter().find(|panel| {
                panel.panel_name == panel_ref.panel_name
                    && float_eq(panel.version, panel_ref.version)
            });
            match found {
                Some(panel) => result.push(panel.clone()),
                None => tracing::warn!(
                    "panel {} version {} of case {} not in catalog",
                    &panel_ref.panel_name,
                    panel_ref.version,
                    &case.id
                ),
            }
        }
        Ok(result)
    }

    fn hgncid_to_gene(
        &self,
        release: GenomeRelease,
    ) -> Result<HashMap<u32, HgncGene>, anyhow::Error> {
        Ok(self
            .genes_of(release)
            .map(|gene| (gene.hgnc_id, gene.clone()))
            .collect())
    }

    fn disease_terms(&self, hgnc_id: u32) -> Result<Vec<DiseaseTerm>, anyhow::Error> {
        Ok(self
            .data
            .disease_terms
            .iter()
            .filter(|term| term.hgnc_ids.contains(&hgnc_id))
            .cloned()
            .collect())
    }
}

/// Panel versions are given with one decimal place.
fn float_eq(lhs: f64, rhs: f64) -> bool {
    (lhs - rhs).abs() < 1e-6
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::variants::schema::PanelRef;

    fn load() -> Result<JsonCatalog, anyhow::Error> {
        JsonCatalog::from_path("tests/data/catalog.json")
    }

    #[test]
    fn from_path() -> Result<(), anyhow::Error> {
        let catalog = load()?;

        assert_eq!(catalog.data.genes.len(), 4);
        assert_eq!(catalog.data.panels.len(), 2);

        Ok(())
    }

    #[test]
    fn gene_by_id_respects_release() -> Result<(), anyhow::Error> {
        let catalog = load()?;

        let gene = catalog.gene_by_id(1100, GenomeRelease::Grch37)?;
        assert_eq!(gene.map(|g| g.hgnc_symbol), Some("GENEA".to_string()));
        assert_eq!(catalog.gene_by_id(1100, GenomeRelease::Grch38)?, None);

        Ok(())
    }

    #[rstest::rstest]
    #[case("GENEA", vec![1100])]
    #[case("ALIASB", vec![1101, 1102])]
    #[case("GENEB", vec![1101])]
    #[case("NOPE", vec![])]
    fn genes_by_alias(#[case] symbol: &str, #[case] expected: Vec<u32>) -> Result<(), anyhow::Error> {
        let catalog = load()?;

        let ids = catalog
            .genes_by_alias(symbol, GenomeRelease::Grch37)?
            .into_iter()
            .map(|g| g.hgnc_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, expected);

        Ok(())
    }

    #[test]
    fn panels_and_gene_to_panels() -> Result<(), anyhow::Error> {
        let catalog = load()?;
        let case = Case {
            id: "case-1".into(),
            panels: vec![
                PanelRef {
                    panel_name: "panel-1".into(),
                    version: 1.0,
                },
                PanelRef {
                    panel_name: "panel-2".into(),
                    version: 2.0,
                },
                PanelRef {
                    panel_name: "panel-missing".into(),
                    version: 1.0,
                },
            ],
            ..Default::default()
        };

        let panels = catalog.panels_for_case(&case)?;
        assert_eq!(panels.len(), 2);

        let gene_to_panels = catalog.gene_to_panels(&case)?;
        assert_eq!(
            gene_to_panels.get(&1100).cloned().map(|s| s.into_iter().collect::<Vec<_>>()),
            Some(vec!["panel-1".to_string(), "panel-2".to_string()])
        );
        assert_eq!(gene_to_panels.get(&1103), None);

        Ok(())
    }

    #[test]
    fn disease_terms() -> Result<(), anyhow::Error> {
        let catalog = load()?;

        let terms = catalog.disease_terms(1100)?;
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].disease_id, "OMIM:100100");
        assert!(catalog.disease_terms(1103)?.is_empty());

        Ok(())
    }
}
