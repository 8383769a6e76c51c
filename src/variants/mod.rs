//! Loading, annotation and querying of the variants of cases.

pub mod annotate;
pub mod compounds;
pub mod consequence;
pub mod ingest;
pub mod query;
pub mod rank;
pub mod region;
pub mod schema;
