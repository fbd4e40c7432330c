//! Core building blocks of a batch run: run parameters, the per-run workspace,
//! record splitting, engine driving and output aggregation. These are the
//! primitives consumed by the high-level `api` module.
pub mod aggregate;
pub mod driver;
pub mod params;
pub mod split;
pub mod workspace;
