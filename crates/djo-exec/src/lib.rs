//! Cluster-backed collaborators for the reconcile core.
//!
//! `wire` holds the JSON shapes of the stored objects; the `kubectl` feature
//! adds the transport that talks to the cluster through the `kubectl` binary.
mod error;
pub use error::KubectlError;

pub mod wire;

#[cfg(feature = "kubectl")]
pub mod kubectl;
