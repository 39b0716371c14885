//! Raccoon core - discovery and paced eviction of aged workloads
//!
//! This crate contains the scheduling engine of the raccoon daemon:
//! - TTL resolution from per-workload annotations
//! - Discovery passes that select workloads older than their TTL
//! - A rendezvous hand-off between discovery and eviction
//! - A single eviction worker with jittered pacing between evictions
//! - The daemon loop driving discovery on a fixed interval
//!
//! Cluster access is abstracted behind [`WorkloadDirectory`], so the core
//! can run against Kubernetes or the bundled [`InMemoryDirectory`].

pub mod daemon;
pub mod directory;
pub mod discovery;
pub mod error;
pub mod handoff;
pub mod memory;
pub mod metrics;
pub mod pacing;
pub mod ttl;
pub mod worker;
pub mod workload;

pub use daemon::{Daemon, Settings};
pub use directory::{DirectoryError, DirectoryResult, WorkloadDirectory};
pub use discovery::DiscoveryPass;
pub use error::{RaccoonError, RaccoonResult};
pub use handoff::{HandoffError, HandoffReceiver, HandoffSender};
pub use memory::InMemoryDirectory;
pub use metrics::{EvictionMetrics, EvictionObserver, NoopObserver};
pub use pacing::PacingPolicy;
pub use ttl::{TtlResolver, DEFAULT_TTL_ANNOTATION};
pub use worker::{process_eviction, EvictionOutcome, EvictionWorker};
pub use workload::{Workload, WorkloadRef};

pub use tokio_util::sync::CancellationToken;
