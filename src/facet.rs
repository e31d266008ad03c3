//! Splits a dataset into independent facets and runs work over each of them.
//!
//! Facets only scope selection when per-facet calculation is requested; otherwise
//! the whole dataset is one partition with an empty key, whatever faceting the
//! renderer applies later.

use std::thread;

use tracing::debug;

use crate::construct::{Dataset, GroupKey};
use crate::error::{HighlightError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: GroupKey,
    pub rows: Vec<usize>,
}

pub fn partition(dataset: &Dataset, facets: &[String], per_facet: bool) -> Result<Vec<Partition>> {
    if !per_facet || facets.is_empty() {
        return Ok(vec![Partition {
            key: GroupKey::empty(),
            rows: dataset.all_rows(),
        }]);
    }
    if let Some(unknown) = facets.iter().find(|f| !dataset.schema().contains(f)) {
        return Err(HighlightError::Configuration(format!(
            "facet column '{}' is not in the dataset",
            unknown
        )));
    }
    let partitions: Vec<Partition> = dataset
        .partition(&dataset.all_rows(), facets)?
        .into_iter()
        .map(|(key, rows)| Partition { key, rows })
        .collect();
    debug!(facets = partitions.len(), columns = ?facets, "partitioned by facet");
    Ok(partitions)
}

/// Applies `work` to every partition, on scoped threads when `parallel` is set.
/// Results come back in partition order either way.
pub fn run<T, F>(partitions: &[Partition], parallel: bool, work: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&Partition) -> Result<T> + Sync,
{
    if !parallel || partitions.len() < 2 {
        return partitions.iter().map(&work).collect();
    }
    let work = &work;
    thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .iter()
            .map(|partition| scope.spawn(move || work(partition)))
            .collect();
        handles
            .into_iter()
            .zip(partitions)
            .map(|(handle, partition)| {
                handle.join().map_err(|_| {
                    HighlightError::Invariant(format!(
                        "worker for facet {} panicked",
                        partition.key
                    ))
                })?
            })
            .collect()
    })
}
