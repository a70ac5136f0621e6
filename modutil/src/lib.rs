//! ModUtil - integrity checks and versioned content sync for game mod packs
//!
//! This library provides the engine behind the `modutil` command-line tool:
//! verifying installed content against a server-published trust manifest and
//! fetching/applying the base pack and incremental update packs.
//!
//! # Modules
//!
//! - [`store`]: durable records (trust manifest, install state)
//! - [`fingerprint`]: SHA-1 digests of files and directory trees
//! - [`integrity`]: manifest-driven integrity checks
//! - [`transfer`]: single-slot background downloads with polled progress
//! - [`archive`]: archive extraction used to apply packs
//! - [`sync`]: the state machine tying everything together
//! - [`config`]: application settings (`config.ini`)
//! - [`status`]: bounded ring of user-facing status lines
//! - [`logging`]: tracing subscriber bootstrap

pub mod archive;
pub mod config;
pub mod fingerprint;
pub mod integrity;
pub mod logging;
pub mod status;
pub mod store;
pub mod sync;
pub mod transfer;

/// Crate version, reported in logs at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
