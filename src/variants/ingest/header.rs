//! Metadata taken from the VCF header.

use noodles_vcf as vcf;

/// Header metadata needed for building variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Categories of the `RankResult` INFO field, in order.
    pub rank_result: Vec<String>,
    /// Field names of the `CSQ` INFO field, in order.
    pub csq_fields: Vec<String>,
}

impl HeaderInfo {
    /// Extract the metadata from a VCF header.
    pub fn from_vcf(header: &vcf::Header) -> Self {
        let mut result = Self::default();
        for (key, info) in header.infos() {
            match key.to_string().as_str() {
                "RankResult" => result.rank_result = parse_rank_result(info.description()),
                "CSQ" => result.csq_fields = parse_csq_format(info.description()),
                _ => (),
            }
        }
        result
    }
}

/// The `RankResult` description lists the categories separated by `|`.
fn parse_rank_result(description: &str) -> Vec<String> {
    description
        .split('|')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// The VEP description ends in `Format: Allele|Consequence|...`.
fn parse_csq_format(description: &str) -> Vec<String> {
    match description.split_once("Format:") {
        Some((_, format)) => format
            .trim()
            .trim_matches('"')
            .split('|')
            .map(|s| s.trim().to_string())
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_rank_result() {
        assert_eq!(
            super::parse_rank_result("Consequence|Conservation| Frequency|"),
            vec!["Consequence", "Conservation", "Frequency"]
        );
    }

    #[rstest::rstest]
    #[case(
        "Consequence annotations from Ensembl VEP. Format: Allele|Consequence|SYMBOL",
        vec!["Allele", "Consequence", "SYMBOL"],
    )]
    #[case("no format here", vec![])]
    fn parse_csq_format(#[case] description: &str, #[case] expected: Vec<&str>) {
        assert_eq!(super::parse_csq_format(description), expected);
    }

    #[test]
    fn from_vcf() -> Result<(), anyhow::Error> {
        let mut reader = vcf::Reader::new(crate::common::io::open_read_maybe_gz(
            "tests/data/case-1.snv.vcf",
        )?);
        let header = reader.read_header()?;

        let info = HeaderInfo::from_vcf(&header);
        assert_eq!(
            info.rank_result,
            vec!["Consequence", "Conservation", "Frequency"]
        );
        assert_eq!(info.csq_fields.first().map(String::as_str), Some("Allele"));
        assert!(info.csq_fields.iter().any(|f| f == "HGNC_ID"));

        Ok(())
    }
}
