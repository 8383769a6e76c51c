//! Implementation of `cases add` subcommand.

use crate::{
    common::{self, io::open_read_maybe_gz},
    store::{rocks::RocksDbStore, VariantStore},
    variants::schema::Case,
};

/// Command line arguments for `cases add` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "add or update a case", long_about = None)]
pub struct Args {
    /// Path to the RocksDB store, created if missing.
    #[clap(long)]
    pub path_db: String,
    /// Path to the case JSON file.
    #[clap(long)]
    pub path_case_json: String,
}

/// Read a case from a (possibly gzip-compressed) JSON file.
pub fn read_case(path: &str) -> Result<Case, anyhow::Error> {
    let reader = open_read_maybe_gz(path)?;
    serde_json::from_reader(reader)
        .map_err(|e| anyhow::anyhow!("could not parse case from {}: {}", path, e))
}

/// Main entry point for `cases add` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    common::trace_rss_now();

    let case = read_case(&args.path_case_json)?;
    let store = RocksDbStore::open(&args.path_db)
        .map_err(|e| anyhow::anyhow!("could not open store at {}: {}", &args.path_db, e))?;
    match store.case(&case.id)? {
        Some(_) => tracing::info!("updating case {}", &case.id),
        None => tracing::info!("adding case {}", &case.id),
    }
    store.upsert_case(&case)?;

    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::variants::schema::{Category, VariantType};

    #[test]
    fn read_case_file() -> Result<(), anyhow::Error> {
        let case = read_case("tests/data/case-1.json")?;

        assert_eq!(case.id, "case-1");
        assert_eq!(case.owner, "inst-1");
        assert_eq!(case.individuals.len(), 2);
        assert_eq!(
            case.vcf_files.get(VariantType::Clinical, Category::Snv),
            Some("tests/data/case-1.snv.vcf")
        );
        assert_eq!(case.vcf_files.get(VariantType::Research, Category::Snv), None);

        Ok(())
    }

    #[test]
    fn run_adds_case() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path_db = tmp_dir.join("db").to_string_lossy().to_string();
        let args = Args {
            path_db: path_db.clone(),
            path_case_json: "tests/data/case-1.json".into(),
        };

        run(&crate::common::Args::default(), &args)?;
        run(&crate::common::Args::default(), &args)?;

        let store = RocksDbStore::open(&path_db)?;
        assert_eq!(store.cases(None)?.len(), 1);
        assert_eq!(
            store.case("case-1")?.map(|c| c.display_name),
            Some(read_case("tests/data/case-1.json")?.display_name)
        );

        Ok(())
    }
}
