//! Shortsmith Job Service
//!
//! Runs a render job and publishes its state for polling clients:
//!
//! ```text
//! RenderRequest ─▶ JobRunner ─▶ render-engine ─▶ output.mp4
//!                      │                              │
//!                      ▼                              ▼
//!              JobStatusPublisher ─▶ JobStore ─▶ ObjectStore
//!                 (_status.json, _result.json, _error.json)
//! ```
//!
//! Every run that gets past the Started marker ends with a terminal
//! `finished` or `failed` status marker.

pub mod jobs;
pub mod publisher;
pub mod runner;
pub mod store;

pub use jobs::{JobSnapshot, JobStore, ObjectJobStore};
pub use publisher::{error_chain, JobState, JobStatusPublisher};
pub use runner::{JobOutcome, JobRunner};
pub use store::{FsObjectStore, MemoryObjectStore, ObjectStore, CONTENT_TYPE_JSON, CONTENT_TYPE_MP4};
