//! Bezier camera paths.
//!
//! A path is sampled once into a dense polyline and then played back one sample
//! per tick, looping back to the start when it runs off the end.

use std::f32::consts::TAU;

use bevy::prelude::Vec3;
use thiserror::Error;

/// Coefficients are built in `i32`, which overflows past this many points.
pub const MAX_CONTROL_POINTS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("a bezier path takes at most {MAX_CONTROL_POINTS} control points, got {0}")]
    TooManyControlPoints(usize),
}

/// `C(n, k)` for `k = 0..=n`.
///
/// Each coefficient is the product `n * (n-1) * ... * (k+1)` divided down by
/// `n-k, n-k-1, ..., 2`, truncating after every division. Degrees that would
/// take the path past [`MAX_CONTROL_POINTS`] are rejected before the product
/// can overflow.
pub fn binomial_coefficients(n: usize) -> Result<Vec<i32>, PathError> {
    if n >= MAX_CONTROL_POINTS {
        return Err(PathError::TooManyControlPoints(n + 1));
    }

    let coefficients = (0..=n)
        .map(|k| {
            let mut val: i32 = 1;
            for j in (k + 1..=n).rev() {
                val *= j as i32;
            }
            for j in (2..=n - k).rev() {
                val = (val as f32 / j as f32) as i32;
            }
            val
        })
        .collect();

    Ok(coefficients)
}

fn bezier_point(u: f32, control_points: &[Vec3], coefficients: &[i32]) -> Vec3 {
    let n = control_points.len() - 1;

    control_points
        .iter()
        .zip(coefficients)
        .enumerate()
        .fold(Vec3::ZERO, |point, (k, (control, coefficient))| {
            let blend = *coefficient as f32 * u.powi(k as i32) * (1. - u).powi((n - k) as i32);
            point + *control * blend
        })
}

/// Eight control points on a horizontal circle of `radius` around `center`,
/// lifted by `dy`, with the first point repeated at the end to close the loop.
pub fn circle_control_points(center: Vec3, radius: f32, dy: f32) -> Vec<Vec3> {
    const STEPS: usize = 8;

    let mut points: Vec<Vec3> = (0..STEPS)
        .map(|i| {
            let angle = TAU * i as f32 / STEPS as f32;
            center + Vec3::new(radius * angle.cos(), dy, radius * angle.sin())
        })
        .collect();
    points.push(points[0]);

    points
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BezierPath {
    samples: Vec<Vec3>,
    current: usize,
    reversed: bool,
}

impl BezierPath {
    /// Samples the curve at `u = k / sample_count` for `k in 0..sample_count`,
    /// so the final sample stops one step short of the last control point.
    ///
    /// Fewer than two control points or zero samples give an empty path.
    pub fn new(control_points: &[Vec3], sample_count: usize) -> Result<Self, PathError> {
        if control_points.len() > MAX_CONTROL_POINTS {
            return Err(PathError::TooManyControlPoints(control_points.len()));
        }
        if control_points.len() < 2 || sample_count == 0 {
            return Ok(Self::default());
        }

        let coefficients = binomial_coefficients(control_points.len() - 1)?;

        let samples = (0..sample_count)
            .map(|k| {
                let u = k as f32 / sample_count as f32;
                bezier_point(u, control_points, &coefficients)
            })
            .collect();

        Ok(Self {
            samples,
            current: 0,
            reversed: false,
        })
    }

    pub fn samples(&self) -> &[Vec3] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn reverse_direction(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Advances the cursor and returns the sample it lands on.
    ///
    /// The start always heads forward again, and the end wraps to the start
    /// regardless of direction.
    pub fn next_point(&mut self) -> Option<Vec3> {
        let last = self.samples.len().checked_sub(1)?;
        if last == 0 {
            return Some(self.samples[0]);
        }

        if self.current == 0 {
            self.reversed = false;
            self.current = 1;
        } else if self.current == last {
            self.reversed = false;
            self.current = 0;
        } else if self.reversed {
            self.current -= 1;
        } else {
            self.current += 1;
        }

        Some(self.samples[self.current])
    }
}
