//! httpfromtcp - HTTP/1.1 over a raw TCP stream
//!
//! An incremental request parser, an ordered response writer with chunked
//! bodies and trailers, and a task-per-connection server.

pub mod app;
pub mod config;
pub mod http;
pub mod server;
