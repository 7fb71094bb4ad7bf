//! Purpose: Shared library crate used by the `dbcycle` CLI and tests.
//! Exports: `core` (codec, schema, values, errors), `store`, `transfer`, `api`.
//! Role: Library backing the binary; `api` is the intended public surface.
//! Invariants: Codec modules do no store I/O; stores never see binary layout.
//! Invariants: Long-running jobs take an explicit `TransferControl`, never globals.
pub mod api;
pub mod config;
pub mod core;
pub mod notice;
pub mod schema_fmt;
pub mod store;
pub mod transfer;
