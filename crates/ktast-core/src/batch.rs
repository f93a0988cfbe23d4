//! Parallel processing of independent source units

use rayon::prelude::*;

use crate::config::ConstructOptions;
use crate::construct::Constructed;
use crate::result::Result;

/// Parse and construct every source, one independent pipeline per unit
///
/// Results keep the order of `sources`.
pub fn construct_all<S>(sources: &[S], options: &ConstructOptions) -> Vec<Result<Constructed>>
where
    S: AsRef<str> + Sync,
{
    let results: Vec<Result<Constructed>> = sources
        .par_iter()
        .map(|source| Constructed::from_source(source.as_ref(), options))
        .collect();

    let failed = results.iter().filter(|result| result.is_err()).count();
    tracing::debug!("Constructed {} units, {} failed", results.len(), failed);
    results
}

/// Construct every source and write each unit back with its trivia
pub fn round_trip_all<S>(sources: &[S], options: &ConstructOptions) -> Vec<Result<String>>
where
    S: AsRef<str> + Sync,
{
    sources
        .par_iter()
        .map(|source| Constructed::from_source(source.as_ref(), options).map(|unit| unit.write()))
        .collect()
}
