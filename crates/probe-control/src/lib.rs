//! # probe-control
//!
//! Client for the control plane that provisions client nodes and collects
//! results.
//!
//! ## Features
//!
//! - **ControlPlane**: async trait covering node lifecycle, log lines,
//!   sub-results and client discovery, with retrying provisioning and
//!   best-effort teardown/reporting helpers
//! - **HttpControlPlane**: the `/nodes`, `/logs`, `/subresults`, `/clients`
//!   HTTP surface
//! - **MockControlPlane**: scripted nodes backed by `MockTransport`, recording
//!   every interaction for assertions
//! - **SubResult**: one report row per test case

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod error;
mod http;
mod mock;
mod params;
mod report;

pub use client::{ControlPlane, DEFAULT_PROVISION_TIMEOUT, PROVISION_ATTEMPTS};
pub use error::{ControlError, ControlResult};
pub use http::{HttpControlPlane, HttpControlPlaneConfig};
pub use mock::MockControlPlane;
pub use params::NodeParams;
pub use report::{SubResult, SubResultDetails};
