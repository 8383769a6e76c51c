//! Documents that are kept in the variant store, i.e., cases and variants.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{catalog::HgncGene, catalog::HgncTranscript, common::GenomeRelease};

/// The category of a variant.
#[derive(
    clap::ValueEnum,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Debug,
    Default,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    /// Single nucleotide variants and short indels.
    #[default]
    Snv,
    /// Structural variants.
    Sv,
    /// Paired tumor/normal calls.
    Cancer,
}

impl Category {
    /// The category that is compared against in overlap queries.
    pub fn opposite(&self) -> Category {
        match self {
            Category::Sv => Category::Snv,
            Category::Snv | Category::Cancer => Category::Sv,
        }
    }
}

/// Whether the variant comes from the clinical or research file.
#[derive(
    clap::ValueEnum,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Debug,
    Default,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VariantType {
    #[default]
    Clinical,
    Research,
}

/// Role of a sample in a paired cancer analysis.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SampleRole {
    Case,
    Control,
}

/// Phenotype code for affected individuals.
pub const PHENOTYPE_AFFECTED: u8 = 2;

/// An individual of a case.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct Individual {
    /// Identifier, must match the sample name in the variant files.
    pub individual_id: String,
    /// Name to display.
    pub display_name: String,
    /// Phenotype code, 1 = unaffected, 2 = affected.
    pub phenotype: u8,
    /// Sex code, 1 = male, 2 = female.
    #[serde(default)]
    pub sex: u8,
}

/// The variant files registered for a case.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct VcfFiles {
    pub vcf_snv: Option<String>,
    pub vcf_sv: Option<String>,
    pub vcf_cancer: Option<String>,
    pub vcf_snv_research: Option<String>,
    pub vcf_sv_research: Option<String>,
    pub vcf_cancer_research: Option<String>,
}

impl VcfFiles {
    /// Resolve the file that applies to the given variant type and category.
    pub fn get(&self, variant_type: VariantType, category: Category) -> Option<&str> {
        let path = match (variant_type, category) {
            (VariantType::Clinical, Category::Snv) => &self.vcf_snv,
            (VariantType::Clinical, Category::Sv) => &self.vcf_sv,
            (VariantType::Clinical, Category::Cancer) => &self.vcf_cancer,
            (VariantType::Research, Category::Snv) => &self.vcf_snv_research,
            (VariantType::Research, Category::Sv) => &self.vcf_sv_research,
            (VariantType::Research, Category::Cancer) => &self.vcf_cancer_research,
        };
        path.as_deref().filter(|path| !path.is_empty())
    }
}

/// Reference to a gene panel version used by a case.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct PanelRef {
    pub panel_name: String,
    pub version: f64,
}

/// A case, the owner of variants.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct Case {
    #[serde(rename = "_id")]
    pub id: String,
    pub display_name: String,
    /// Institute that owns the case.
    pub owner: String,
    /// Institutes that have access to the case, includes the owner.
    #[serde(default)]
    pub collaborators: Vec<String>,
    #[serde(default)]
    pub individuals: Vec<Individual>,
    #[serde(default)]
    pub vcf_files: VcfFiles,
    /// Storage ids of variants marked causative.
    #[serde(default)]
    pub causatives: Vec<String>,
    #[serde(default)]
    pub panels: Vec<PanelRef>,
    #[serde(default)]
    pub genome_build: GenomeRelease,
}

/// Per-sample call information.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct GenotypeCall {
    pub sample_id: String,
    pub display_name: String,
    /// Genotype string, e.g., `0/1`.
    pub genotype_call: Option<String>,
    /// Reference and alternative allele depths.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allele_depths: Vec<i32>,
    pub read_depth: Option<i32>,
    pub genotype_quality: Option<i32>,
    /// Only set for the cancer category.
    pub role: Option<SampleRole>,
}

/// Consequence of the variant on one transcript.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct Transcript {
    pub transcript_id: String,
    pub hgnc_id: Option<u32>,
    pub protein_id: Option<String>,
    pub biotype: Option<String>,
    /// Sequence ontology terms.
    #[serde(default)]
    pub functional_annotations: Vec<String>,
    #[serde(default)]
    pub region_annotations: Vec<String>,
    pub exon: Option<String>,
    pub intron: Option<String>,
    pub strand: Option<String>,
    pub coding_sequence_name: Option<String>,
    pub protein_sequence_name: Option<String>,
    pub sift_prediction: Option<String>,
    pub polyphen_prediction: Option<String>,
    #[serde(default)]
    pub is_canonical: bool,
    /// Copied from the canonical gene record at annotation time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refseq_ids: Vec<String>,
    #[serde(default)]
    pub is_disease_associated: bool,
    #[serde(default)]
    pub is_primary: bool,
}

/// The canonical gene record with its transcripts indexed by id.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct CommonGene {
    #[serde(flatten)]
    pub gene: HgncGene,
    pub transcripts_dict: IndexMap<String, HgncTranscript>,
}

/// A disease term linked to a gene.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct DiseaseTerm {
    /// E.g., `OMIM:615349`.
    pub disease_id: String,
    pub description: String,
    #[serde(default)]
    pub hgnc_ids: Vec<u32>,
}

/// A gene that the variant overlaps.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct Gene {
    pub hgnc_id: u32,
    pub hgnc_symbol: Option<String>,
    pub ensembl_gene_id: Option<String>,
    /// Most severe consequence over the gene's transcripts.
    pub functional_annotation: Option<String>,
    pub region_annotation: Option<String>,
    pub sift_prediction: Option<String>,
    pub polyphen_prediction: Option<String>,
    #[serde(default)]
    pub transcripts: Vec<Transcript>,

    // The following is only filled by the annotator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disease_associated_transcripts: Vec<String>,
    pub manual_penetrance: Option<bool>,
    pub mosaicism: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_inheritance: Vec<String>,
    pub omim_penetrance: Option<bool>,
    pub common: Option<CommonGene>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disease_terms: Vec<DiseaseTerm>,
}

/// Gene summary on a compound.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct CompoundGene {
    pub hgnc_id: u32,
    pub hgnc_symbol: Option<String>,
    pub region_annotation: Option<String>,
    pub functional_annotation: Option<String>,
}

/// Reference to another variant of the same case.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct Compound {
    /// Storage id of the referenced variant.
    pub variant: String,
    pub display_name: Option<String>,
    pub combined_score: f64,
    pub rank_score: Option<f64>,
    #[serde(default)]
    pub not_loaded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genes: Vec<CompoundGene>,
}

/// A variant of one case.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct Variant {
    /// Storage id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Positional id, shared across cases and variant types.
    pub variant_id: String,
    /// `chrom_pos_ref_alt`
    pub simple_id: String,
    /// `chrom_pos_ref_alt_type`
    pub display_name: String,
    pub case_id: String,
    pub institute: String,
    pub variant_type: VariantType,
    pub category: Category,
    /// E.g., `snv`, `indel`, `del`, `dup`.
    pub sub_category: String,
    pub chromosome: String,
    /// 1-based start position.
    pub position: usize,
    /// 1-based, inclusive end position.
    pub end: usize,
    pub length: Option<usize>,
    pub reference: String,
    pub alternative: String,
    pub rank_score: Option<f64>,
    /// 1-based rank within case, category and variant type.
    pub variant_rank: Option<usize>,
    /// Components of the rank score as described in the file header.
    pub rank_result: Option<IndexMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genetic_models: Vec<String>,
    #[serde(default)]
    pub hgnc_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hgnc_symbols: Vec<String>,
    /// Panels that contain any of the overlapped genes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panels: Vec<String>,
    #[serde(default)]
    pub genes: Vec<Gene>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compounds: Vec<Compound>,
    #[serde(default)]
    pub samples: Vec<GenotypeCall>,
    pub is_par: Option<bool>,
}

/// A closed genomic interval.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Region {
    pub chrom: String,
    /// 1-based start position.
    pub start: usize,
    /// 1-based, inclusive end position.
    pub end: usize,
}

impl Region {
    pub fn new(chrom: &str, start: usize, end: usize) -> Self {
        Self {
            chrom: chrom.to_string(),
            start,
            end,
        }
    }

    /// Whether `[start, end]` on `chrom` overlaps with the region.
    pub fn overlaps(&self, chrom: &str, start: usize, end: usize) -> bool {
        crate::common::canonicalize(&self.chrom) == crate::common::canonicalize(chrom)
            && start <= self.end
            && end >= self.start
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}
