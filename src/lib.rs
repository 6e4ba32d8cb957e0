//! vm-bootstrap library
//!
//! One-shot provisioning for cloned VM templates.
//!
//! # Design Principles
//!
//! - **Safety First**: No unsafe code (`#![forbid(unsafe_code)]`)
//! - **One typed plan**: every decision is collected, validated and frozen
//!   before anything mutates; the apply phase never re-prompts
//! - **Best effort where safe**: only steps that could leave the host
//!   unreachable after reboot are fatal
//! - **Previewable**: dry-run prints every mutating command while detection
//!   and reporting still run for real
//!
//! A run has two phases: the interactive collector (unprivileged) builds a
//! [`plan::ProvisionPlan`]; the apply executor (root, reached in-process or
//! via a sudo re-exec) performs the mutation catalog, writes the completion
//! marker and reboots.

pub mod apply;
pub mod collect;
pub mod detect;
pub mod elevate;
pub mod exec;
pub mod logging;
pub mod plan;
pub mod state;
pub mod validate;

mod error;

pub use error::BootstrapError;
