//! Per-connection session core of an HTTP/1.0 and HTTP/1.1 origin server:
//! request parsing, URL normalization, static file streaming and dynamic
//! plugin dispatch, built on `rotor`/`rotor-stream`.
//!
//! The TCP acceptor, event loop, timer wheel and buffer primitive remain
//! the caller's concern (`rotor`/`rotor-stream`/`mio`, wired together in
//! `demos/serve.rs`); this crate supplies the `Protocol` implementation
//! that drives one connection through parse, dispatch and response.

extern crate rotor;
extern crate rotor_stream;
extern crate mio;
extern crate time;
extern crate libc;
extern crate argparse;
#[macro_use] extern crate log;
extern crate env_logger;
#[macro_use] extern crate quick_error;
#[macro_use] extern crate matches;
#[cfg(test)] extern crate tempfile;

pub mod config;
pub mod error;
pub mod headers;
pub mod method;
pub mod parser;
pub mod plugin;
pub mod registry;
pub mod responder;
pub mod response;
pub mod session;
pub mod url;
pub mod version;

pub use config::Config;
pub use session::{Context, Session};
pub use registry::Registry;
