//! # Topolearn
//!
//! Nearest-neighbor indices and the incremental-topology substrate they
//! back: a growing uniform grid, a vantage-point tree, and a brute-force
//! baseline behind one facade, plus a graph substrate and three streaming
//! clients built on it (Growing Neural Gas, its target-size variant, and a
//! fixed-topology Kohonen map).
//!
//! ## Layout
//! - [`index`], the three NN backends and the [`index::NnBackend`] facade
//!   that dispatches across them.
//! - [`net`], [`net::Net`], the arena-backed node/edge graph every
//!   streaming client builds on.
//! - [`gng`], [`gng::Gng`] and [`gng::GngT`], streaming topology learners
//!   over `net` and `index`.
//! - [`kohonen`], [`kohonen::Kohonen`], a fixed-topology self-organising map.
//! - [`rng`], [`diagnostics`], [`errors`] (ambient per-instance state:
//!   seeded randomness, one-time warnings, and the crate's error type).

#![warn(missing_docs)]

pub mod diagnostics;
pub mod errors;
pub mod gng;
pub mod index;
pub mod kohonen;
pub mod net;
pub mod rng;

pub use errors::{TopoError, TopoResult};
pub use gng::{Gng, GngParams, GngT, GngTParams};
pub use index::{Gug, GugConfig, Linear, NnBackend, NnIndex, VpTree, VpTreeConfig};
pub use kohonen::{GridTopology, Kohonen, RingTopology};
pub use net::Net;
pub use rng::Rng;
