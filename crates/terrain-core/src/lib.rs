//! Terrain-aware pathfinding engine: slope/aspect derivation, avalanche
//! runout zones, and A* route search over a Digital Elevation Model.
//!
//! This crate has no `wasm-bindgen`, no JS types, and no process-wide
//! state — it is single-threaded and cooperative per call (see
//! [`pathfinder::Pathfinder::find_path`]'s `progress` callback), and every
//! input is borrowed read-only. Hosts (browser bindings, CLIs, servers) are
//! free to run multiple instances concurrently on separate threads.
//!
//! [`facade::EngineFacade`] is the entry point most hosts want: it owns
//! blob (de)serialization and error-kind mapping so a caller never has to
//! construct an [`grid::ElevationGrid`] or [`band::TerrainBand`] by hand.

pub mod aspect;
pub mod band;
pub mod codec;
pub mod error;
pub mod facade;
pub mod grid;
pub mod pathfinder;
pub mod progress;
pub mod runout;
pub mod terrain;

pub use aspect::Aspect;
pub use band::{BandKind, TerrainBand};
pub use codec::RasterCodec;
pub use error::{EngineError, EngineResult};
pub use facade::EngineFacade;
pub use grid::{Bounds, ElevationGrid};
pub use pathfinder::{Constraints, PathPoint, Pathfinder, TerrainContext};
pub use progress::{ControlFlow, ProgressCallback};
pub use runout::{RunoutAnalyzer, RunoutParams};
pub use terrain::{TerrainAnalysis, TerrainAnalyzer};
