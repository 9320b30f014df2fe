//
//  codeship
//  api/mod.rs
//

//! # Typed API Endpoints
//!
//! Thin, typed wrappers over the request pipeline in
//! [`Organization`](crate::Organization). Each helper decides the verb,
//! path and payload for one endpoint, delegates to
//! [`Organization::request`](crate::Organization::request), and
//! deserializes the returned bytes.
//!
//! ## Modules
//!
//! - [`projects`]: project resources (`Project`, list/get/create)
//! - [`builds`]: build resources (`Build`, list/get/create/stop/restart,
//!   plus per-build pipelines, services and steps)
//!
//! ## Error handling
//!
//! Everything the pipeline can return passes through unchanged; the only
//! failure added at this layer is [`Error::Decoding`](crate::Error) when
//! a response body does not match the expected shape.
//!
//! Endpoints not covered here can be called through
//! [`Organization::request`](crate::Organization::request) directly.

pub mod builds;
pub mod projects;

pub use builds::{Build, BuildPipeline, BuildService, BuildStep};
pub use projects::{CreateProjectRequest, Project, ProjectType};
