// SPDX-License-Identifier: MPL-2.0

//! Run parameters shared by the command line program and library users.

use crate::img::Interpolation;

/// Configuration of a correlation run over a grid of subsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Interpolation used to sample deformed intensities.
    pub interpolation: Interpolation,
    /// Number of worker threads, 0 for one per core.
    pub threads: usize,
    /// Distance in pixels between two neighbor points of interest.
    pub step: usize,
    /// Number of points of interest along each axis.
    pub count: usize,
    /// Log verbosity, from 0 (errors only) to 4 (trace).
    pub verbosity: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Bilinear,
            threads: 0,
            step: 20,
            count: 1,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Centroids of the `count x count` grid of points of interest
    /// centered on `(cx, cy)`, row by row.
    #[allow(clippy::cast_possible_wrap)]
    #[allow(clippy::cast_possible_truncation)]
    pub fn grid(&self, cx: i32, cy: i32) -> Vec<(i32, i32)> {
        let step = self.step as i32;
        let half = (self.count as i32 - 1) * step / 2;
        (0..self.count as i32)
            .flat_map(|j| (0..self.count as i32).map(move |i| (i, j)))
            .map(|(i, j)| (cx - half + i * step, cy - half + j * step))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn single_point_grid_is_the_center() {
        let config = Config::default();
        assert_eq!(config.grid(125, 250), vec![(125, 250)]);
    }

    #[test]
    fn grid_is_centered_row_by_row() {
        let config = Config {
            step: 10,
            count: 3,
            ..Config::default()
        };
        let grid = config.grid(50, 60);
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0], (40, 50));
        assert_eq!(grid[1], (50, 50));
        assert_eq!(grid[4], (50, 60));
        assert_eq!(grid[8], (60, 70));
    }
}
