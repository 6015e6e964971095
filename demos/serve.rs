//! Runnable wiring of `session_httpd` onto a real `mio` event loop: a
//! single listening socket, one `rotor::Handler`, sessions served by
//! `session_httpd::Session`. Mirrors the shape of the teacher's own
//! `examples/hello_world_server.rs` (a `Context` struct plus
//! `handler.add_machine_with`), generalized from a single hardcoded
//! handler to the full static/dynamic dispatch this crate implements.
//!
//! Kept under `demos/` rather than `examples/`: this workspace's own
//! `examples/` directory is reserved for the read-only retrieval pack this
//! crate was built against.

extern crate session_httpd;
extern crate rotor;
extern crate rotor_stream;
extern crate mio;
extern crate env_logger;
#[macro_use] extern crate log;

use std::env;
use std::process;

use mio::tcp::{TcpListener, TcpStream};
use rotor_stream::{Accept, Stream};

use session_httpd::{Config, Registry, Session};
use session_httpd::plugin::{PluginLoader, StaticPluginLoader};
use session_httpd::session::Context as SessionContext;

struct ServerContext {
    config: Config,
    registry: Registry,
    plugins: StaticPluginLoader,
}

impl SessionContext for ServerContext {
    fn config(&self) -> &Config {
        &self.config
    }
    fn registry(&mut self) -> &mut Registry {
        &mut self.registry
    }
    fn plugins(&self) -> &PluginLoader {
        &self.plugins
    }
}

fn main() {
    env_logger::init().expect("env_logger already initialized");

    let args: Vec<String> = env::args().skip(1).collect();
    let config = match Config::parse_args(&args) {
        Ok(c) => c,
        Err(code) => process::exit(code),
    };
    let addr = config.listen_addr.clone();

    let mut event_loop = mio::EventLoop::new().expect("failed to create event loop");
    let mut handler = rotor::Handler::new(ServerContext {
        config: config,
        registry: Registry::new(),
        // A production deployment loads handlers from shared objects
        // under root_path (spec.md §1); this empty table leaves dynamic
        // requests answering 404 until real plugins are registered.
        plugins: StaticPluginLoader::new(),
    }, &mut event_loop);

    let listener = TcpListener::bind(&addr.parse().expect("invalid --listen address"))
        .expect("failed to bind listen address");

    let registered = handler.add_machine_with(&mut event_loop, |scope| {
        Accept::<TcpListener, TcpStream, Stream<ServerContext, _, Session>>::new(listener, scope)
    }).is_ok();
    assert!(registered, "failed to register listening socket with the event loop");

    info!("listening on {}", addr);
    event_loop.run(&mut handler).expect("event loop terminated with an error");
}
