pub mod app;
pub mod auth_gate;
pub mod chat_stream;
pub mod config;
pub mod conversation;
pub mod keyring;
pub mod message;
pub mod mode;
pub mod request;
pub mod session;
pub mod stream_decoder;
pub mod stream_errors;
