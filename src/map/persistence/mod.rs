//! Map persistence: loading feature batches and writing back edited geometry.
//!
//! Handles async store I/O for map data, including:
//! - Batch load of every feature of a map, skipping malformed records
//! - Per-edit geometry saves with failure tracking and retry
//! - Background image discovery
//!
//! ## Module Structure
//!
//! - [`messages`] - Message types for map operations
//! - [`resources`] - Resource types for state tracking
//! - [`results`] - Result types for async operations
//! - [`store`] - The store trait and the JSON file store
//! - [`wkt`] - Geometry text encoding
//! - [`decode`] - Record to feature decoding
//! - [`save`] - Save system and task polling
//! - [`load`] - Load system and task polling
//!
//! ## Key Types
//!
//! - [`GeometryStore`] - The external system of record
//! - [`ActiveStore`] - The store in use
//! - [`MapSaveError`] - Saves that failed and can be retried
//! - [`SaveQueue`] - Keeps saves of each feature in edit order
//! - [`AsyncMapOperation`] - Tracks async I/O state

mod decode;
mod load;
mod messages;
mod resources;
mod results;
mod save;
mod store;
pub mod wkt;


// Re-exports - Messages
pub use messages::{CloseMapRequest, GeometryChanged, OpenMapRequest, RetryFailedSavesRequest};

// Re-exports - Resources
pub use resources::{ActiveStore, AsyncMapOperation, MapLoadError, MapSaveError, SaveQueue};

// Re-exports - Store
pub use decode::DecodeOptions;
pub use store::{GeometryStore, JsonFileStore};

// Re-exports - Systems
pub use load::{close_map_system, load_map_system, poll_load_tasks};
pub use save::{poll_save_tasks, retry_failed_saves_system, save_geometry_system};
