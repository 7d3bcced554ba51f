/*
* Licensed to Elasticsearch B.V. under one or more contributor
* license agreements. See the NOTICE file distributed with
* this work for additional information regarding copyright
* ownership. Elasticsearch B.V. licenses this file to you under
* the Apache License, Version 2.0 (the "License"); you may
* not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*  http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing,
* software distributed under the License is distributed on an
* "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
* KIND, either express or implied.  See the License for the
* specific language governing permissions and limitations
* under the License.
*/

//! Supported metrics

use crate::vector::Vector;
use std::fmt::Debug;

/// A distance function over `Vector`s.
///
/// Implementors only need to supply `squared_distance`; `distance` is the
/// square root of it by default. Indices that only ever compare distances
/// (GUG shell pruning, VPTree partitioning) should prefer `squared_distance`
/// to avoid the `sqrt`.
pub trait Metric: Debug {
    /// Squared distance between two points, `dim`-checked by the caller
    fn squared_distance(&self, a: &Vector, b: &Vector) -> f64;

    /// Distance between two points
    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        self.squared_distance(a, b).sqrt()
    }
}

/// Euclidean (L2) distance
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    fn squared_distance(&self, a: &Vector, b: &Vector) -> f64 {
        a.as_slice()
            .iter()
            .zip(b.as_slice())
            .map(|(x, y)| (x - y) * (x - y))
            .sum()
    }
}

/// Manhattan (L1) distance
#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl Metric for Manhattan {
    fn squared_distance(&self, a: &Vector, b: &Vector) -> f64 {
        self.distance(a, b).powi(2)
    }

    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        a.as_slice()
            .iter()
            .zip(b.as_slice())
            .map(|(x, y)| (x - y).abs())
            .sum()
    }
}

/// Chebyshev (L-infinity) distance, used by the GUG's shell-pruning lower bound
#[derive(Debug, Clone, Copy, Default)]
pub struct Chebyshev;

impl Metric for Chebyshev {
    fn squared_distance(&self, a: &Vector, b: &Vector) -> f64 {
        self.distance(a, b).powi(2)
    }

    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        a.as_slice()
            .iter()
            .zip(b.as_slice())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }
}

/// A metric defined by a user-supplied closure, for callers who need a
/// one-off distance function without declaring a new type
pub struct ClosureMetric<F>(pub F)
where
    F: Fn(&Vector, &Vector) -> f64;

impl<F> Debug for ClosureMetric<F>
where
    F: Fn(&Vector, &Vector) -> f64,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("ClosureMetric")
    }
}

impl<F> Metric for ClosureMetric<F>
where
    F: Fn(&Vector, &Vector) -> f64,
{
    fn squared_distance(&self, a: &Vector, b: &Vector) -> f64 {
        (self.0)(a, b).powi(2)
    }

    fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        (self.0)(a, b)
    }
}
