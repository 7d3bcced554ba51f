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

//! A dense, owned, fixed-dimension real vector

use crate::errors::{VectorSpaceError, VectorSpaceResult};
use std::ops::{Add, Index, IndexMut, Mul, Sub};

/// A dense point in R^n, stored as an owned `Vec<f64>`
#[derive(Debug, Clone, PartialEq)]
pub struct Vector(Vec<f64>);

impl Vector {
    /// Build a vector from its coordinates
    pub fn new(coords: Vec<f64>) -> VectorSpaceResult<Vector> {
        if coords.is_empty() {
            Err(VectorSpaceError::EmptyVector)
        } else {
            Ok(Vector(coords))
        }
    }

    /// A vector of `dim` zeros
    pub fn zeros(dim: usize) -> Vector {
        Vector(vec![0.0; dim])
    }

    /// Number of components
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Borrow the coordinates as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Borrow the coordinates mutably
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }

    fn check_dim(&self, other: &Vector) -> VectorSpaceResult<()> {
        if self.dim() != other.dim() {
            Err(VectorSpaceError::DimensionMismatch {
                left: self.dim(),
                right: other.dim(),
            })
        } else {
            Ok(())
        }
    }

    /// Componentwise sum, failing if the dimensions disagree
    pub fn checked_add(&self, other: &Vector) -> VectorSpaceResult<Vector> {
        self.check_dim(other)?;
        Ok(Vector(
            self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect(),
        ))
    }

    /// Componentwise difference, failing if the dimensions disagree
    pub fn checked_sub(&self, other: &Vector) -> VectorSpaceResult<Vector> {
        self.check_dim(other)?;
        Ok(Vector(
            self.0.iter().zip(&other.0).map(|(a, b)| a - b).collect(),
        ))
    }

    /// Scale every component by `s`
    pub fn scaled(&self, s: f64) -> Vector {
        Vector(self.0.iter().map(|a| a * s).collect())
    }

    /// `self + t * (other - self)`, the point a fraction `t` of the way from `self` to `other`
    pub fn lerp(&self, other: &Vector, t: f64) -> VectorSpaceResult<Vector> {
        let diff = other.checked_sub(self)?;
        self.checked_add(&diff.scaled(t))
    }

    /// True if every component is within `eps` of the matching component of `other`
    pub fn approx_eq(&self, other: &Vector, eps: f64) -> bool {
        self.dim() == other.dim()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Index<usize> for Vector {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl<'a> Add for &'a Vector {
    type Output = Vector;
    fn add(self, other: &'a Vector) -> Vector {
        self.checked_add(other)
            .expect("vectors must share a dimension")
    }
}

impl<'a> Sub for &'a Vector {
    type Output = Vector;
    fn sub(self, other: &'a Vector) -> Vector {
        self.checked_sub(other)
            .expect("vectors must share a dimension")
    }
}

impl Mul<f64> for &Vector {
    type Output = Vector;
    fn mul(self, s: f64) -> Vector {
        self.scaled(s)
    }
}
