//! Common functionality.

use byte_unit::{Byte, UnitType};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use md5::{Digest, Md5};

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Helper to print the current memory resident set size via `tracing`.
pub fn trace_rss_now() {
    let rss = procfs::process::Process::myself()
        .and_then(|me| me.stat())
        .map(|stat| stat.rss * procfs::page_size());
    match rss {
        Ok(rss) => tracing::debug!(
            "RSS now: {:.2}",
            Byte::from_u64(rss).get_appropriate_unit(UnitType::Binary)
        ),
        Err(e) => tracing::trace!("could not determine RSS: {}", e),
    }
}

/// Canonicalize chromosome name, i.e., strip `chr` prefix and map `M` to `MT`.
pub fn canonicalize(chrom: &str) -> String {
    let stripped = chrom
        .strip_prefix("chr")
        .or_else(|| chrom.strip_prefix("CHR"))
        .unwrap_or(chrom);
    match stripped {
        "M" | "m" | "mt" | "Mt" => "MT".to_string(),
        "x" => "X".to_string(),
        "y" => "Y".to_string(),
        _ => stripped.to_string(),
    }
}

/// Whether the given chromosome name refers to the mitochondrial genome.
pub fn is_mitochondrial(chrom: &str) -> bool {
    canonicalize(chrom) == "MT"
}

/// Compute the lower-case hex MD5 digest of the `_`-joined `parts`.
pub fn md5_key<S: AsRef<str>>(parts: &[S]) -> String {
    let mut hasher = Md5::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"_");
        }
        hasher.update(part.as_ref().as_bytes());
    }
    base16ct::lower::encode_string(&hasher.finalize())
}

/// Select the genome release to use.
#[derive(
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    strum::Display,
    strum::EnumString,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GenomeRelease {
    /// GRCh37 / hg19
    #[default]
    Grch37,
    /// GRCh38 / hg38
    Grch38,
}

/// Pseudo-autosomal regions as `(chrom, start, end)`, 1-based and inclusive.
fn par_regions(release: GenomeRelease) -> &'static [(&'static str, usize, usize)] {
    match release {
        GenomeRelease::Grch37 => &[
            ("X", 60_001, 2_699_520),
            ("X", 154_931_044, 155_260_560),
            ("Y", 10_001, 2_649_520),
            ("Y", 59_034_050, 59_363_566),
        ],
        GenomeRelease::Grch38 => &[
            ("X", 10_001, 2_781_479),
            ("X", 155_701_383, 156_030_895),
            ("Y", 10_001, 2_781_479),
            ("Y", 56_887_903, 57_217_415),
        ],
    }
}

/// Whether the position lies in a pseudo-autosomal region.
pub fn is_par(release: GenomeRelease, chrom: &str, pos: usize) -> bool {
    let chrom = canonicalize(chrom);
    par_regions(release)
        .iter()
        .any(|(par_chrom, start, end)| *par_chrom == chrom && *start <= pos && pos <= *end)
}

/// Return the version of the `variant-loader` crate and `x.y.z` in tests.
pub fn worker_version() -> &'static str {
    if cfg!(test) {
        "x.y.z"
    } else {
        env!("CARGO_PKG_VERSION")
    }
}
