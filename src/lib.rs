//! Datachat is a terminal client for a streaming chat-with-data service.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation, request construction, the credential
//!   gate, stream decoding, error classification and streaming orchestration.
//! - [`api`] defines the wire constants and payloads of the analyze endpoint.
//! - [`auth`] stores and resolves the bearer token used in database mode.
//! - [`utils`] holds URL helpers and the transcript logger.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which resolves configuration and dispatches
//! into [`core::app`] for one-shot questions and interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod utils;
