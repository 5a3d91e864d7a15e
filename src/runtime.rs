// SPDX-License-Identifier: MPL-2.0

//! Data-parallel initialization of many independent subsets.
//!
//! Subsets never share mutable state: each one only writes its own buffers
//! and reads a shared immutable image, so they can be processed
//! concurrently without synchronization.

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::def_map::DefMap;
use crate::error::{Error, Result};
use crate::img::Image;
use crate::subset::{InitMode, Subset};

/// Handle over a dedicated thread pool.
///
/// Acquire it once at program start, the threads are joined
/// when the handle is dropped.
pub struct Runtime {
    pool: ThreadPool,
}

impl Runtime {
    /// Start a pool with `threads` workers, or one per core if 0.
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("dic-worker-{}", i))
            .build()?;
        log::debug!("Runtime started with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Fill the reference intensities of every subset from `image`.
    ///
    /// Returns one result per subset, in the same order.
    pub fn initialize_reference(&self, subsets: &mut [Subset], image: &Image) -> Vec<Result<()>> {
        self.initialize_reference_with(subsets, image, || ())
    }

    /// Same as `initialize_reference`, calling `on_done` once per processed subset,
    /// from the worker threads.
    pub fn initialize_reference_with<F>(
        &self,
        subsets: &mut [Subset],
        image: &Image,
        on_done: F,
    ) -> Vec<Result<()>>
    where
        F: Fn() + Sync,
    {
        self.pool.install(|| {
            subsets
                .par_iter_mut()
                .map(|subset| {
                    let result = subset.initialize(image);
                    on_done();
                    log_failure(subset, result)
                })
                .collect()
        })
    }

    /// Fill the deformed intensities of every subset,
    /// subset `i` being sampled through `maps[i]`.
    pub fn initialize_deformed(
        &self,
        subsets: &mut [Subset],
        image: &Image,
        maps: &[DefMap],
    ) -> Result<Vec<Result<()>>> {
        self.initialize_deformed_with(subsets, image, maps, || ())
    }

    /// Same as `initialize_deformed`, calling `on_done` once per processed subset.
    pub fn initialize_deformed_with<F>(
        &self,
        subsets: &mut [Subset],
        image: &Image,
        maps: &[DefMap],
        on_done: F,
    ) -> Result<Vec<Result<()>>>
    where
        F: Fn() + Sync,
    {
        if subsets.len() != maps.len() {
            return Err(Error::SizeMismatch {
                expected: subsets.len(),
                actual: maps.len(),
            });
        }
        Ok(self.pool.install(|| {
            subsets
                .par_iter_mut()
                .zip(maps.par_iter())
                .map(|(subset, map)| {
                    let result =
                        subset.initialize_with_map(image, map, InitMode::FillDefIntensities);
                    on_done();
                    log_failure(subset, result)
                })
                .collect()
        }))
    }
}

fn log_failure(subset: &Subset, result: Result<()>) -> Result<()> {
    if let Err(err) = &result {
        log::warn!(
            "Subset at ({}, {}) rejected: {}",
            subset.centroid_x(),
            subset.centroid_y(),
            err
        );
    }
    result
}
