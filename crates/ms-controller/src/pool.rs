//! Worker pool for per-agent precomputation.
//!
//! With the `parallel` feature the work runs on a dedicated Rayon pool;
//! without it, on the calling thread.  Either way results come back in input
//! order and are applied by the caller after every worker is done, so both
//! builds produce the same population.

use crate::ControllerResult;

pub struct WorkerPool {
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// `None` lets Rayon pick one thread per core.
    pub fn new(num_threads: Option<usize>) -> ControllerResult<Self> {
        #[cfg(feature = "parallel")]
        {
            let mut builder =
                rayon::ThreadPoolBuilder::new().thread_name(|i| format!("msim-worker-{i}"));
            if let Some(n) = num_threads {
                builder = builder.num_threads(n);
            }
            let pool = builder
                .build()
                .map_err(|e| crate::ControllerError::ThreadPool(e.to_string()))?;
            Ok(Self { pool })
        }

        #[cfg(not(feature = "parallel"))]
        {
            let _ = num_threads;
            Ok(Self {})
        }
    }

    pub fn threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            self.pool.current_num_threads()
        }

        #[cfg(not(feature = "parallel"))]
        {
            1
        }
    }

    /// `f(index, item)` for every item; results in input order.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync + Send,
    {
        #[cfg(not(feature = "parallel"))]
        {
            items.iter().enumerate().map(|(i, t)| f(i, t)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.pool
                .install(|| items.par_iter().enumerate().map(|(i, t)| f(i, t)).collect())
        }
    }
}
