//! Composition root for the Route-Pooling Matcher: configuration, adapter
//! wiring and the runnable entry point live here. No transport of its own —
//! `main` starts the dispatcher and keeps it alive, and a future HTTP/RPC
//! front end would depend on this crate's `config` and `wiring` modules
//! rather than re-deriving them.

pub mod config;
pub mod wiring;
