//! Yo testing infrastructure
//!
//! A deterministic in-memory network for exercising the Yo protocols
//! without real transport, keys on disk, or an actual notary cluster.
//! Every node implements the full effect surface from `yo-protocol`, so
//! flows and coordinators run unmodified against it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use yo_testkit::TestNetwork;
//!
//! let network = TestNetwork::builder()
//!     .notaries(["NotaryA", "NotaryB"])
//!     .parties(["Alice", "Bob"])
//!     .build();
//! let alice = network.node("Alice");
//! // ... drive flows against `alice`
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod identity;
pub mod ledger;
pub mod network;

pub use identity::TestIdentity;
pub use network::{TestNetwork, TestNetworkBuilder, TestNode};

/// Install a fmt subscriber for test output. Safe to call repeatedly.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
