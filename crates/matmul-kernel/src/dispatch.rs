//! Fork/join dispatch of per-worker jobs.
//!
//! A [`Dispatch`] runs one job per [`RowBand`] and returns only once every
//! job has finished, which is the single join barrier of the harness. Bands
//! are moved into the jobs, so each worker holds the only mutable reference
//! to its rows and no synchronization on the output is needed.

use alloc::vec::Vec;

use crate::matrix::RowBand;

pub trait Dispatch {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Run `job` once per band and wait for all of them.
    fn fork_join<'c, F>(&self, bands: Vec<RowBand<'c>>, job: F)
    where
        F: Fn(RowBand<'c>) + Sync + Send;
}

/// Runs every job on the calling thread, in worker order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serial;

impl Dispatch for Serial {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn fork_join<'c, F>(&self, bands: Vec<RowBand<'c>>, job: F)
    where
        F: Fn(RowBand<'c>) + Sync + Send,
    {
        for band in bands {
            job(band);
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        /// One scoped OS thread per non-empty band, joined when the scope
        /// ends. Empty bands (more workers than rows) run inline.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct ScopedThreads;

        impl Dispatch for ScopedThreads {
            fn name(&self) -> &'static str {
                "threads"
            }

            fn fork_join<'c, F>(&self, bands: Vec<RowBand<'c>>, job: F)
            where
                F: Fn(RowBand<'c>) + Sync + Send,
            {
                let job = &job;
                std::thread::scope(|s| {
                    for band in bands {
                        if band.plan().is_empty() {
                            job(band);
                        } else {
                            s.spawn(move || job(band));
                        }
                    }
                });
            }
        }

        /// Parallelism reported by the host, at least 1.
        pub fn available_workers() -> usize {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    } else {
        /// Parallelism reported by the host; always 1 without `std`.
        pub fn available_workers() -> usize {
            1
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        /// Fixed-size rayon pool; every non-empty band becomes one spawned task
        /// of a `ThreadPool::scope`.
        ///
        /// The pool never has more threads than the host can run at once:
        /// bands are tasks, so extra workers queue instead of idling on their
        /// own OS threads.
        #[derive(Debug)]
        pub struct RayonPool {
            pool: rayon::ThreadPool,
        }

        impl RayonPool {
            pub fn new(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(pool_size(threads))
                    .thread_name(|idx| std::format!("matmul-worker-{idx}"))
                    .build()?;
                Ok(Self { pool })
            }

            pub fn threads(&self) -> usize {
                self.pool.current_num_threads()
            }
        }

        impl Dispatch for RayonPool {
            fn name(&self) -> &'static str {
                "rayon"
            }

            fn fork_join<'c, F>(&self, bands: Vec<RowBand<'c>>, job: F)
            where
                F: Fn(RowBand<'c>) + Sync + Send,
            {
                let job = &job;
                self.pool.scope(|s| {
                    for band in bands {
                        if band.plan().is_empty() {
                            job(band);
                        } else {
                            s.spawn(move |_| job(band));
                        }
                    }
                });
            }
        }

        fn pool_size(requested: usize) -> usize {
            requested.clamp(1, available_workers())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;
    use crate::partition::{plan, Partition};

    fn fill_by_worker(dispatcher: &impl Dispatch, dim: usize, workers: usize) -> Matrix {
        let mut m = Matrix::zeros(dim);
        let plans = plan(dim, workers, Partition::RemainderLast);
        let bands = m.split_bands(&plans);
        dispatcher.fork_join(bands, |mut band| {
            let tag = band.worker() as i32 + 1;
            for row in band.plan().rows() {
                band.row_mut(row).fill(tag);
            }
        });
        m
    }

    fn expected(dim: usize, workers: usize) -> Matrix {
        fill_by_worker(&Serial, dim, workers)
    }

    #[test]
    fn test_serial_runs_every_band() {
        let m = expected(7, 3);
        assert_eq!(m.row(0), [1; 7]);
        assert_eq!(m.row(2), [2; 7]);
        assert_eq!(m.row(6), [3; 7]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_scoped_threads_matches_serial() {
        for workers in [1, 2, 4, 9, 12] {
            assert_eq!(fill_by_worker(&ScopedThreads, 9, workers), expected(9, workers));
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_rayon_pool_matches_serial() {
        let pool = RayonPool::new(3).unwrap();
        assert_eq!(pool.threads(), 3.min(available_workers()));
        for workers in [1, 2, 4, 9, 12] {
            assert_eq!(fill_by_worker(&pool, 9, workers), expected(9, workers));
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_rayon_pool_capped_at_host_parallelism() {
        let pool = RayonPool::new(20_000).unwrap();
        assert!(pool.threads() <= available_workers());
        assert!(pool.threads() >= 1);

        // W far above N still produces the serial result.
        assert_eq!(fill_by_worker(&pool, 5, 64), expected(5, 64));
    }

    /// Worker indices of the bands whose job ran on the calling thread.
    #[cfg(feature = "std")]
    fn inline_workers(dispatcher: &impl Dispatch, dim: usize, workers: usize) -> Vec<usize> {
        let caller = std::thread::current().id();
        let inline = std::sync::Mutex::new(Vec::new());
        let mut m = Matrix::zeros(dim);
        let plans = plan(dim, workers, Partition::RemainderLast);
        dispatcher.fork_join(m.split_bands(&plans), |band| {
            if std::thread::current().id() == caller {
                inline.lock().unwrap().push(band.worker());
            }
        });
        let mut inline = inline.into_inner().unwrap();
        inline.sort_unstable();
        inline
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_scoped_threads_runs_empty_bands_inline() {
        // dim 3, 8 workers: workers 0..7 own nothing, worker 7 owns all rows.
        assert_eq!(inline_workers(&ScopedThreads, 3, 8), (0..7).collect::<Vec<_>>());
        assert!(inline_workers(&ScopedThreads, 8, 4).is_empty());
    }

    #[test]
    fn test_available_workers_positive() {
        assert!(available_workers() >= 1);
    }
}
