//! Built-in program integrations.
//!
//! Each submodule wires one external program into the
//! [`ProgramExecutor`](crate::ProgramExecutor) lifecycle.
//! `echo` is the reference integration: small enough to read in one
//! sitting, and useful as a smoke test on hosts where the real
//! workhorse programs are not installed.

pub mod echo;

pub use echo::EchoExecutor;
