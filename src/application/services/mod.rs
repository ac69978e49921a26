//! Application services
//!
//! Services orchestrate domain logic using I/O boundary traits.

pub mod targeting;

pub use targeting::TargetingService;
