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

//! The errors that can occur while working with vectors and metrics

use std::error::Error;
use std::fmt;

/// Result type used throughout this crate
pub type VectorSpaceResult<T> = Result<T, VectorSpaceError>;

/// Error type for vector and metric operations
#[derive(Debug, Clone, PartialEq)]
pub enum VectorSpaceError {
    /// Two vectors that were compared or combined did not share a dimension
    DimensionMismatch {
        /// Dimension of the left-hand vector
        left: usize,
        /// Dimension of the right-hand vector
        right: usize,
    },
    /// A vector was constructed with zero dimensions
    EmptyVector,
}

impl fmt::Display for VectorSpaceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VectorSpaceError::DimensionMismatch { left, right } => write!(
                f,
                "dimension mismatch: left has {} components, right has {}",
                left, right
            ),
            VectorSpaceError::EmptyVector => write!(f, "vector has zero dimensions"),
        }
    }
}

impl Error for VectorSpaceError {}
