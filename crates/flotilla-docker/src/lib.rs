//! Docker Engine implementation of the flotilla runtime client.
//!
//! [`DockerRuntime`] talks to the engine through `bollard`. All translation between the core's
//! value types and the engine models lives in [`convert`] as plain functions.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flotilla_core::prelude::*;
//! use flotilla_docker::DockerRuntime;
//!
//! # async fn run() -> Result<(), RuntimeError> {
//! let runtime = Arc::new(DockerRuntime::connect_local().await?);
//! let reconciler = StackReconciler::new(RuntimeContext::new(runtime));
//! let status = reconciler.status("shop").await;
//! # let _ = status;
//! # Ok(())
//! # }
//! ```
mod client;
pub use client::DockerRuntime;

pub mod convert;

mod error;
pub use error::runtime_error;
