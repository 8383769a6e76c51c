//! Pull-based access to the raw records of a variant file.

use std::io::BufRead;

use indexmap::IndexMap;
use noodles_vcf as vcf;

use super::header::HeaderInfo;
use crate::{common::io::open_read_maybe_gz, err::Error, variants::schema::Region};

/// INFO fields that are carried over into [`RawRecord`].
const INFO_KEYS: &[&str] = &[
    "RankScore",
    "RankResult",
    "GeneticModels",
    "Compounds",
    "CSQ",
    "END",
    "SVTYPE",
    "SVLEN",
];

/// Per-sample genotype fields of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSample {
    pub name: String,
    pub genotype: Option<String>,
    pub allele_depths: Vec<i32>,
    pub read_depth: Option<i32>,
    pub genotype_quality: Option<i32>,
}

/// One record of a variant file, decoupled from the file format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub chrom: String,
    /// 1-based position.
    pub pos: usize,
    pub reference: String,
    pub alternatives: Vec<String>,
    /// INFO values, split into their comma-separated entries.
    pub info: IndexMap<String, Vec<String>>,
    pub samples: Vec<RawSample>,
}

impl RawRecord {
    /// Entries of an INFO field, empty if absent.
    pub fn info(&self, key: &str) -> &[String] {
        self.info.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First entry of an INFO field.
    pub fn info_first(&self, key: &str) -> Option<&str> {
        self.info(key).first().map(String::as_str)
    }

    /// Inclusive end position, from INFO/END if present.
    pub fn end(&self) -> usize {
        self.info_first("END")
            .and_then(|end| end.parse().ok())
            .unwrap_or_else(|| self.pos + self.reference.len().max(1) - 1)
    }

    /// `chrom:pos` for messages.
    pub fn locus(&self) -> String {
        format!("{}:{}", &self.chrom, self.pos)
    }

    /// Convert from a VCF record.
    pub fn from_vcf(record: &vcf::Record, header: &vcf::Header) -> Result<Self, anyhow::Error> {
        let mut info = IndexMap::new();
        for key in INFO_KEYS {
            let parsed = key
                .parse::<vcf::record::info::field::Key>()
                .map_err(|e| anyhow::anyhow!("invalid INFO key {}: {}", key, e))?;
            if let Some(value) = record.info().get(&parsed) {
                info.insert(
                    key.to_string(),
                    value.map(info_value_strings).unwrap_or_default(),
                );
            }
        }

        let samples = header
            .sample_names()
            .iter()
            .zip(record.genotypes().values())
            .map(|(name, sample)| {
                use vcf::record::genotypes::{
                    keys::key,
                    sample::{value::Array, Value},
                };

                let genotype = match sample.get(&key::GENOTYPE) {
                    Some(Some(Value::String(gt))) => Some(gt.clone()),
                    _ => None,
                };
                let allele_depths = match sample.get(&key::READ_DEPTHS) {
                    Some(Some(Value::Array(Array::Integer(ad)))) => {
                        ad.iter().map(|v| v.unwrap_or_default()).collect()
                    }
                    _ => Vec::new(),
                };
                let read_depth = match sample.get(&key::READ_DEPTH) {
                    Some(Some(Value::Integer(dp))) => Some(*dp),
                    _ => None,
                };
                let genotype_quality = match sample.get(&key::CONDITIONAL_GENOTYPE_QUALITY) {
                    Some(Some(Value::Integer(gq))) => Some(*gq),
                    _ => None,
                };

                RawSample {
                    name: name.clone(),
                    genotype,
                    allele_depths,
                    read_depth,
                    genotype_quality,
                }
            })
            .collect();

        Ok(Self {
            chrom: record.chromosome().to_string(),
            pos: usize::from(record.position()),
            reference: record.reference_bases().to_string(),
            alternatives: record
                .alternate_bases()
                .iter()
                .map(|allele| allele.to_string())
                .collect(),
            info,
            samples,
        })
    }
}

/// Flatten an INFO value into strings.
fn info_value_strings(value: &vcf::record::info::field::Value) -> Vec<String> {
    use vcf::record::info::field::{value::Array, Value};

    match value {
        Value::Integer(v) => vec![v.to_string()],
        Value::Float(v) => vec![v.to_string()],
        Value::Flag => Vec::new(),
        Value::Character(v) => vec![v.to_string()],
        Value::String(v) => v.split(',').map(str::to_string).collect(),
        Value::Array(Array::Integer(vs)) => vs.iter().flatten().map(|v| v.to_string()).collect(),
        Value::Array(Array::Float(vs)) => vs.iter().flatten().map(|v| v.to_string()).collect(),
        Value::Array(Array::Character(vs)) => {
            vs.iter().flatten().map(|v| v.to_string()).collect()
        }
        Value::Array(Array::String(vs)) => vs.iter().flatten().cloned().collect(),
    }
}

/// A sequence of raw records plus the header metadata of the file.
///
/// Items are `Err` for records that cannot be read.  Those with
/// [`Error::RecordParseFailure`] only affect the one record.
pub trait RecordSource: Iterator<Item = Result<RawRecord, Error>> {
    fn header_info(&self) -> &HeaderInfo;
}

/// Opens record sources, once per pass over a file.
pub trait SourceOpener {
    /// Open `path`, yielding only records overlapping `region` if given.
    fn open(&self, path: &str, region: Option<&Region>) -> Result<Box<dyn RecordSource>, Error>;
}

/// Opens VCF files, plain or gzip-compressed.
#[derive(Debug, Default, Clone, Copy)]
pub struct VcfOpener;

impl SourceOpener for VcfOpener {
    fn open(&self, path: &str, region: Option<&Region>) -> Result<Box<dyn RecordSource>, Error> {
        Ok(Box::new(VcfSource::open(path, region.cloned())?))
    }
}

/// Record source on top of the `noodles` VCF reader.
pub struct VcfSource {
    reader: vcf::Reader<Box<dyn BufRead>>,
    header: vcf::Header,
    header_info: HeaderInfo,
    region: Option<Region>,
    record: vcf::Record,
    /// Number of records read so far, including skipped ones.
    line_no: usize,
}

impl VcfSource {
    pub fn open(path: &str, region: Option<Region>) -> Result<Self, Error> {
        tracing::debug!("opening {} (region = {:?})", path, &region);
        let inner = open_read_maybe_gz(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("could not open {}: {}", path, e),
            ))
        })?;
        let mut reader = vcf::Reader::new(inner);
        let header = reader.read_header()?;
        let header_info = HeaderInfo::from_vcf(&header);

        Ok(Self {
            reader,
            header,
            header_info,
            region,
            record: vcf::Record::default(),
            line_no: 0,
        })
    }
}

impl Iterator for VcfSource {
    type Item = Result<RawRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_no += 1;
            match self.reader.read_record(&self.header, &mut self.record) {
                Ok(0) => return None,
                Ok(_) => (),
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    return Some(Err(Error::parse_failure(
                        format!("record #{}", self.line_no),
                        e,
                    )))
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }

            let raw = match RawRecord::from_vcf(&self.record, &self.header) {
                Ok(raw) => raw,
                Err(e) => {
                    return Some(Err(Error::parse_failure(
                        format!("record #{}", self.line_no),
                        e,
                    )))
                }
            };
            match &self.region {
                Some(region) if !region.overlaps(&raw.chrom, raw.pos, raw.end()) => continue,
                _ => return Some(Ok(raw)),
            }
        }
    }
}

impl RecordSource for VcfSource {
    fn header_info(&self) -> &HeaderInfo {
        &self.header_info
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Record source backed by a list of results.
    pub struct MemorySource {
        pub header_info: HeaderInfo,
        pub items: VecDeque<Result<RawRecord, Error>>,
    }

    impl Iterator for MemorySource {
        type Item = Result<RawRecord, Error>;

        fn next(&mut self) -> Option<Self::Item> {
            self.items.pop_front()
        }
    }

    impl RecordSource for MemorySource {
        fn header_info(&self) -> &HeaderInfo {
            &self.header_info
        }
    }

    /// Opener that hands out copies of the records produced by `make`.
    pub struct MemoryOpener<F>
    where
        F: Fn() -> Vec<Result<RawRecord, Error>>,
    {
        pub header_info: HeaderInfo,
        pub make: F,
    }

    impl<F> SourceOpener for MemoryOpener<F>
    where
        F: Fn() -> Vec<Result<RawRecord, Error>>,
    {
        fn open(
            &self,
            _path: &str,
            region: Option<&Region>,
        ) -> Result<Box<dyn RecordSource>, Error> {
            let items = (self.make)()
                .into_iter()
                .filter(|item| match (item, region) {
                    (Ok(raw), Some(region)) => region.overlaps(&raw.chrom, raw.pos, raw.end()),
                    _ => true,
                })
                .collect();
            Ok(Box::new(MemorySource {
                header_info: self.header_info.clone(),
                items,
            }))
        }
    }

    #[test]
    fn read_all_records() -> Result<(), anyhow::Error> {
        let source = VcfOpener.open("tests/data/case-1.snv.vcf", None)?;
        assert_eq!(source.header_info().rank_result.len(), 3);

        let records = source.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(records.len(), 10);

        let first = &records[0];
        assert_eq!(first.chrom, "1");
        assert_eq!(first.pos, 1100);
        assert_eq!(first.reference, "A");
        assert_eq!(first.alternatives, vec!["G"]);
        assert_eq!(first.info("RankScore"), &["case-1:15".to_string()]);
        assert_eq!(first.info("CSQ").len(), 2);
        assert_eq!(
            first.samples[0],
            RawSample {
                name: "proband".into(),
                genotype: Some("0/1".into()),
                allele_depths: vec![10, 12],
                read_depth: Some(22),
                genotype_quality: Some(99),
            }
        );

        Ok(())
    }

    #[test]
    fn read_region() -> Result<(), anyhow::Error> {
        let region = Region::new("1", 1, 7000);
        let source = VcfOpener.open("tests/data/case-1.snv.vcf", Some(&region))?;

        let positions = source
            .map(|r| r.map(|r| r.pos))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(positions, vec![1100, 1500, 1800, 5100, 6000, 7000]);

        Ok(())
    }

    #[test]
    fn missing_file_fails() {
        assert!(VcfOpener.open("tests/data/does-not-exist.vcf", None).is_err());
    }

    #[rstest::rstest]
    #[case("A", None, 100)]
    #[case("ACG", None, 102)]
    #[case("N", Some("5000"), 5000)]
    fn raw_record_end(#[case] reference: &str, #[case] end: Option<&str>, #[case] expected: usize) {
        let mut raw = RawRecord {
            chrom: "1".into(),
            pos: 100,
            reference: reference.into(),
            ..Default::default()
        };
        if let Some(end) = end {
            raw.info.insert("END".into(), vec![end.into()]);
        }

        assert_eq!(raw.end(), expected);
    }
}
