use rayon::prelude::*;

use crate::foundation::core::{VolumeBounds, Voxel};
use crate::foundation::error::{TimesliceError, TimesliceResult};
use crate::plane::mapper::MappedPlane;

/// One output cell of one step, tagged with the voxel it samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleQuery {
    /// Rounded voxel coordinate; `coord.z` orders the schedule.
    pub coord: Voxel,
    /// Destination raster.
    pub step: u32,
    /// Destination row.
    pub row: u32,
    /// Destination column.
    pub col: u32,
}

/// Controls for coordinate generation and sorting. Frame reading is always single-threaded.
#[derive(Clone, Debug, Default)]
pub struct Threading {
    /// Generate and sort queries on a rayon pool when `true`.
    pub parallel: bool,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

/// Every query of every step, sorted by frame index ascending.
#[derive(Clone, Debug, Default)]
pub struct QuerySchedule {
    queries: Vec<SampleQuery>,
    steps: u32,
}

impl QuerySchedule {
    /// Queries in ascending `coord.z` order.
    pub fn queries(&self) -> &[SampleQuery] {
        &self.queries
    }

    /// Total number of queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// `true` if no query was produced.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Number of planes the schedule covers.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Highest frame index any in-volume query needs.
    pub fn max_frame_in(&self, bounds: VolumeBounds) -> Option<u64> {
        self.queries
            .iter()
            .rev()
            .find(|q| bounds.contains(q.coord))
            .map(|q| q.coord.z as u64)
    }
}

/// Merge the sample grids of all `planes` (index = step) into one time-ordered schedule.
///
/// Ties in `coord.z` keep no particular order. Pure: no IO.
pub fn schedule_queries(
    planes: &[MappedPlane],
    threading: &Threading,
) -> TimesliceResult<QuerySchedule> {
    let steps = u32::try_from(planes.len())
        .map_err(|_| TimesliceError::config("too many planes in one schedule"))?;
    let total = planes
        .iter()
        .try_fold(0usize, |acc, p| acc.checked_add(p.resolution.cells()))
        .ok_or_else(|| TimesliceError::config("query count overflows usize"))?;

    let queries = if threading.parallel {
        let pool = build_thread_pool(threading.threads)?;
        pool.install(|| {
            let mut queries: Vec<SampleQuery> = planes
                .par_iter()
                .enumerate()
                .flat_map_iter(|(step, plane)| step_queries(step as u32, plane))
                .collect();
            queries.par_sort_unstable_by_key(|q| q.coord.z);
            queries
        })
    } else {
        let mut queries = Vec::with_capacity(total);
        for (step, plane) in planes.iter().enumerate() {
            queries.extend(step_queries(step as u32, plane));
        }
        queries.sort_unstable_by_key(|q| q.coord.z);
        queries
    };

    tracing::debug!(steps, queries = queries.len(), "scheduled sample queries");
    Ok(QuerySchedule { queries, steps })
}

fn step_queries(step: u32, plane: &MappedPlane) -> impl Iterator<Item = SampleQuery> + '_ {
    plane.voxels().map(move |(row, col, coord)| SampleQuery {
        coord,
        step,
        row,
        col,
    })
}

fn build_thread_pool(threads: Option<usize>) -> TimesliceResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(TimesliceError::config(
            "threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| TimesliceError::config(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/scheduler.rs"]
mod tests;
