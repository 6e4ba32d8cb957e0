//! Environment detection probes
//!
//! Best-effort only: every probe tolerates missing tools and inconclusive
//! output by returning `None`/empty, never by failing the run. The parsing
//! is split out as pure functions over captured text so each strategy is
//! testable without invoking real system tools.

pub mod disk;
pub mod net;
pub mod virt;

pub use disk::RootDevice;
pub use net::NetFacts;
