//! Sequence ontology consequence terms, ordered by severity.

/// Consequence terms from most to least severe with the region they imply.
const SO_TERMS: &[(&str, &str)] = &[
    ("transcript_ablation", "exonic"),
    ("splice_donor_variant", "splicing"),
    ("splice_acceptor_variant", "splicing"),
    ("stop_gained", "exonic"),
    ("frameshift_variant", "exonic"),
    ("stop_lost", "exonic"),
    ("start_lost", "exonic"),
    ("initiator_codon_variant", "exonic"),
    ("transcript_amplification", "exonic"),
    ("inframe_insertion", "exonic"),
    ("inframe_deletion", "exonic"),
    ("missense_variant", "exonic"),
    ("protein_altering_variant", "exonic"),
    ("splice_region_variant", "splicing"),
    ("incomplete_terminal_codon_variant", "exonic"),
    ("stop_retained_variant", "exonic"),
    ("synonymous_variant", "exonic"),
    ("coding_sequence_variant", "exonic"),
    ("mature_miRNA_variant", "ncRNA_exonic"),
    ("5_prime_UTR_variant", "5UTR"),
    ("3_prime_UTR_variant", "3UTR"),
    ("non_coding_transcript_exon_variant", "ncRNA_exonic"),
    ("non_coding_exon_variant", "ncRNA_exonic"),
    ("non_coding_transcript_variant", "ncRNA_exonic"),
    ("nc_transcript_variant", "ncRNA_exonic"),
    ("intron_variant", "intronic"),
    ("NMD_transcript_variant", "ncRNA"),
    ("upstream_gene_variant", "upstream"),
    ("downstream_gene_variant", "downstream"),
    ("TFBS_ablation", "TFBS"),
    ("TFBS_amplification", "TFBS"),
    ("TF_binding_site_variant", "TFBS"),
    ("regulatory_region_ablation", "regulatory_region"),
    ("regulatory_region_amplification", "regulatory_region"),
    ("feature_elongation", "genomic_feature"),
    ("regulatory_region_variant", "regulatory_region"),
    ("feature_truncation", "genomic_feature"),
    ("intergenic_variant", "intergenic_variant"),
];

/// Severity rank of a term, lower is more severe.  Unknown terms sort last.
pub fn severity(term: &str) -> usize {
    SO_TERMS
        .iter()
        .position(|(name, _)| *name == term)
        .unwrap_or(SO_TERMS.len())
}

/// Region implied by a term.
pub fn region(term: &str) -> Option<&'static str> {
    SO_TERMS
        .iter()
        .find(|(name, _)| *name == term)
        .map(|(_, region)| *region)
}

/// The most severe of the given terms.
pub fn most_severe<'a, I>(terms: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    terms.into_iter().min_by_key(|term| severity(term))
}
