//! Shortsmith Timeline Model
//!
//! Defines the data contracts of a render job:
//! - **Tracks:** video, audio, and text elements with timing and z-order
//! - **Styles:** text styling, fractional positioning, and animation selection
//! - **Timeline:** the ordered track list submitted for one render
//! - **Job markers:** status, error, and manifest records polled by clients
//!
//! Positions are fractional `[0.0, 1.0]` canvas coordinates naming a layer's
//! center; times are seconds on the output timeline.

pub mod color;
pub mod job;
pub mod style;
pub mod timeline;
pub mod track;

pub use color::*;
pub use job::*;
pub use style::*;
pub use timeline::*;
pub use track::*;
