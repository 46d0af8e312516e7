//! Accept loop and server lifecycle.
//!
//! [`Server`] binds a listening socket and spawns one task per accepted
//! connection. A failing or panicking connection task never reaches the
//! accept loop.

pub mod listener;

pub use listener::Server;
