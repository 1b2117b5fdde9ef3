use super::accumulator::ForceAccumulator;
use super::error::EngineError;
use super::kernel::KernelData;
use super::kernel::select::NonbondedKernel;
use super::work::WorkCounter;
use crate::core::models::nblist::NeighborListView;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One kernel pass over one window of a neighbor list.
#[derive(Debug, Clone, Copy)]
pub struct KernelJob<'a> {
    pub kernel: &'a NonbondedKernel<'a>,
    pub list: NeighborListView<'a>,
}

/// Splits `list` into jobs of at most `entries_per_job` outer entries.
pub fn split_jobs<'a>(
    kernel: &'a NonbondedKernel<'a>,
    list: NeighborListView<'a>,
    entries_per_job: usize,
) -> Vec<KernelJob<'a>> {
    list.chunks(entries_per_job)
        .into_iter()
        .map(|list| KernelJob { kernel, list })
        .collect()
}

/// Runs every job and adds the results into `out` and `work`.
///
/// Jobs may overlap arbitrarily in the particles they touch: with the `parallel` feature each
/// worker accumulates into a private zeroed copy of `out`, and the copies are summed once all
/// jobs have finished.
#[instrument(skip_all, name = "kernel_jobs", fields(jobs = jobs.len()))]
pub fn run_jobs(
    jobs: &[KernelJob<'_>],
    data: &KernelData<'_>,
    out: &mut ForceAccumulator,
    work: &mut WorkCounter,
) -> Result<(), EngineError> {
    if jobs.len() <= 1 {
        run_sequential(jobs, data, out, work);
        return Ok(());
    }

    #[cfg(not(feature = "parallel"))]
    run_sequential(jobs, data, out, work);

    #[cfg(feature = "parallel")]
    run_parallel(jobs, data, out, work)?;

    Ok(())
}

fn run_sequential(
    jobs: &[KernelJob<'_>],
    data: &KernelData<'_>,
    out: &mut ForceAccumulator,
    work: &mut WorkCounter,
) {
    for job in jobs {
        job.kernel.run(job.list, data, out, work);
    }
}

#[cfg(feature = "parallel")]
fn run_parallel(
    jobs: &[KernelJob<'_>],
    data: &KernelData<'_>,
    out: &mut ForceAccumulator,
    work: &mut WorkCounter,
) -> Result<(), EngineError> {
    let template = out.zeroed_like();
    tracing::debug!(
        jobs = jobs.len(),
        threads = rayon::current_num_threads(),
        "Running kernel jobs with thread-local accumulators."
    );

    let (partial, partial_work) = jobs
        .par_iter()
        .fold(
            || (template.clone(), WorkCounter::new()),
            |(mut acc, mut counter), job| {
                job.kernel.run(job.list, data, &mut acc, &mut counter);
                (acc, counter)
            },
        )
        .map(Ok::<_, EngineError>)
        .try_reduce(
            || (template.clone(), WorkCounter::new()),
            |(mut acc, mut counter), (other, other_counter)| {
                acc.merge(&other)?;
                counter.merge(&other_counter);
                Ok((acc, counter))
            },
        )?;

    out.merge(&partial)?;
    work.merge(&partial_work);
    Ok(())
}
