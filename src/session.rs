//! The session controller (C3, spec.md §4.3): drives one connection's
//! bytes through the parser, dispatches completed requests, and owns the
//! two-timer lifecycle.
//!
//! Implements `rotor_stream::Protocol` directly rather than going through
//! the teacher's own higher-level `server::protocol::Server` trait
//! (`src/server/protocol.rs`): that trait (and its `Parser<M>` driver in
//! `src/server/parser.rs`) is itself an unfinished draft in the teacher
//! repo, built against `hyper` types and full of `unimplemented!()` bodies.
//! `rotor_stream::Protocol` is the real foundation underneath it, and is
//! what this crate's own request shape (one raw byte parser, not hyper's)
//! needs directly.
//!
//! The two timer slots spec.md §3 describes (`connection_timer`,
//! `keep_alive_timer`) are not modeled as separate fields: `rotor_stream`
//! hands every `Protocol` exactly one `Deadline` per returned state, so
//! invariant 2 ("at most one of the two timers armed at any instant") is
//! true by construction rather than by bookkeeping — each callback simply
//! computes the one deadline that applies to the phase it is returning to.

use rotor::Scope;
use rotor_stream::{Protocol, Transport, Deadline, Expectation as E, Request, StreamSocket, Buf};
use time::Duration;

use config::Config;
use error::MetaError;
use method::Method;
use parser::{self, ParseOutcome, ParsePhase, ReadBuf, RequestState};
use plugin::PluginLoader;
use registry::{Registry, SessionId};
use responder::{dynamic, static_file};
use response;

const CONNECTION_TIMEOUT: i64 = 60;
const KEEP_ALIVE_TIMEOUT: i64 = 10;
/// Not spec'd directly; a backstop so a session streaming a very large or
/// very slow-draining file cannot wedge the loop's deadline heap forever.
const RESPONSE_TIMEOUT: i64 = 60;

/// Bundles the process-wide collaborators spec.md §1 lists as external:
/// configuration, the server registry and the plugin loader. `Scope<C>`
/// derefs to this, the way the teacher's examples deref `Scope<Context>`
/// straight to their own counter (`examples/hello_world_server.rs`).
pub trait Context {
    fn config(&self) -> &Config;
    fn registry(&mut self) -> &mut Registry;
    fn plugins(&self) -> &PluginLoader;
}

impl ReadBuf for Buf {
    fn as_slice(&self) -> &[u8] {
        &self[..]
    }
    fn consume(&mut self, n: usize) {
        Buf::consume(self, n)
    }
}

pub(crate) struct Streaming {
    pub path: String,
    pub is_keep_alive: bool,
}

pub(crate) enum PostFlush {
    CloseImmediately,
    CloseConnection { is_keep_alive: bool },
}

enum Phase {
    AwaitingRequest,
    AwaitingFlush(PostFlush),
    StreamingFile(Streaming),
}

/// One live connection (spec.md §3's `Session`).
pub struct Session {
    pub id: SessionId,
    req: RequestState,
    meta_error: Option<MetaError>,
    phase: Phase,
}

impl Session {
    fn new() -> Session {
        Session {
            id: ::registry::next_session_id(),
            req: RequestState::new(),
            meta_error: None,
            phase: Phase::AwaitingRequest,
        }
    }

    fn connection_deadline() -> Deadline {
        Deadline::now() + Duration::seconds(CONNECTION_TIMEOUT)
    }

    fn keep_alive_deadline() -> Deadline {
        Deadline::now() + Duration::seconds(KEEP_ALIVE_TIMEOUT)
    }

    pub(crate) fn response_deadline() -> Deadline {
        Deadline::now() + Duration::seconds(RESPONSE_TIMEOUT)
    }

    /// spec.md §4.3: dispatch a fully parsed request. Runs only from
    /// `Phase::AwaitingRequest`, after `parser::parse` returned `Good`.
    fn dispatch<C, S>(mut self, transport: &mut Transport<S>, scope: &mut Scope<C>)
        -> Request<Self>
        where C: Context, S: StreamSocket
    {
        let is_static = self.req.is_static;
        let method = self.req.method;

        let resolved = resolve_path(scope.config(), &self.req.url);

        match method {
            Method::Get if is_static => {
                static_file::begin(self, resolved, transport, scope)
            }
            Method::Get if !is_static => {
                dynamic::respond(self, resolved, transport, scope)
            }
            Method::Post => {
                dynamic::respond(self, resolved, transport, scope)
            }
            _ => {
                let body = response::not_implemented_response();
                transport.output().extend(&body);
                self.phase = Phase::AwaitingFlush(PostFlush::CloseImmediately);
                Some((self, E::Flush(0), Session::response_deadline()))
            }
        }
    }

    /// spec.md §4.3 "`CloseConnection`": arm the keep-alive timer or
    /// half-close immediately. Queues nothing; called once the response
    /// body itself has already been fully queued and flushed.
    pub(crate) fn close_connection(mut self, is_keep_alive: bool)
        -> Option<(Self, E, Deadline)>
    {
        if is_keep_alive {
            self.req.phase = ParsePhase::Finished;
            self.phase = Phase::AwaitingRequest;
            Some((self, E::Bytes(1), Session::keep_alive_deadline()))
        } else {
            None
        }
    }

    pub(crate) fn registry_id(&self) -> SessionId {
        self.id
    }

    /// Accessor for the responder modules (`responder::static_file`,
    /// `responder::dynamic`): everything C4/C5 need out of the parsed
    /// request, without handing out the mutable parse state itself.
    pub(crate) fn request(&self) -> &RequestState {
        &self.req
    }

    /// Transitions into streaming a static file body (C4 step 5): the
    /// caller has already queued the response head.
    pub(crate) fn begin_streaming(mut self, streaming: Streaming) -> Self {
        self.phase = Phase::StreamingFile(streaming);
        self
    }

    /// Transitions into "wait for the queued bytes to flush, then run
    /// `CloseConnection`" (spec.md §4.3, used by both C4's end-of-body and
    /// C5's single-shot response).
    pub(crate) fn queue_close(mut self, action: PostFlush) -> Self {
        self.phase = Phase::AwaitingFlush(action);
        self
    }
}

impl<C, S> Protocol<C, S> for Session
    where C: Context, S: StreamSocket
{
    type Seed = ();

    fn create(_seed: (), _sock: &mut S, _scope: &mut Scope<C>) -> Request<Self> {
        Some((Session::new(), E::Bytes(1), Session::connection_deadline()))
    }

    fn bytes_read(mut self, transport: &mut Transport<S>, _end: usize,
        scope: &mut Scope<C>) -> Request<Self>
    {
        match self.phase {
            Phase::AwaitingRequest => {}
            // Bytes for the next request may arrive before this response
            // has finished flushing; spec.md §5 only promises request N+1
            // is *parsed* after request N's response is sent, not that the
            // socket stops delivering bytes meanwhile. Leave them buffered.
            _ => return Some((self, E::Bytes(1), Session::response_deadline())),
        }

        loop {
            match parser::parse(&mut self.req, transport.input()) {
                ParseOutcome::Short => {
                    return Some((self, E::Bytes(1), Session::connection_deadline()));
                }
                ParseOutcome::Error(e) => {
                    let err: MetaError = e.into();
                    self.meta_error = Some(err.clone());
                    let body = response::error_response(&err);
                    transport.output().extend(&body);
                    self.phase = Phase::AwaitingFlush(PostFlush::CloseImmediately);
                    return Some((self, E::Flush(0), Session::response_deadline()));
                }
                ParseOutcome::Good => {
                    return self.dispatch(transport, scope);
                }
            }
        }
    }

    fn bytes_flushed(mut self, transport: &mut Transport<S>, scope: &mut Scope<C>)
        -> Request<Self>
    {
        let phase = ::std::mem::replace(&mut self.phase, Phase::AwaitingRequest);
        match phase {
            Phase::AwaitingFlush(PostFlush::CloseImmediately) => None,
            Phase::AwaitingFlush(PostFlush::CloseConnection { is_keep_alive }) => {
                self.close_connection(is_keep_alive)
            }
            Phase::StreamingFile(streaming) => {
                static_file::continue_streaming(self, streaming, transport, scope)
            }
            Phase::AwaitingRequest => {
                Some((self, E::Bytes(1), Session::connection_deadline()))
            }
        }
    }

    fn timeout(self, _transport: &mut Transport<S>, scope: &mut Scope<C>)
        -> Request<Self>
    {
        // Either the 60s connection-idle timer, the 10s keep-alive timer,
        // or the response backstop fired: all three shut the write side
        // down (spec.md §4.3, §5). A backstop firing mid-stream is the one
        // case that leaves an entry in the registry's offset map, so erase
        // it here rather than relying on `continue_streaming`'s normal
        // completion/error paths, neither of which runs again.
        if let Phase::StreamingFile(_) = self.phase {
            scope.registry().erase_offset(self.registry_id());
        }
        None
    }

    fn delimiter_not_found(self, _transport: &mut Transport<S>, _scope: &mut Scope<C>)
        -> Request<Self>
    {
        None
    }

    fn wakeup(self, _transport: &mut Transport<S>, _scope: &mut Scope<C>)
        -> Request<Self>
    {
        Some((self, E::Bytes(1), Session::response_deadline()))
    }
}

impl Drop for Session {
    /// Invariant 5: on session destruction, any offset entry for this
    /// session must be gone. The registry itself is reached only through
    /// `Scope<C>`, which is not available from `Drop`; every path that can
    /// end a session while `Phase::StreamingFile` is live erases the entry
    /// itself instead — `static_file`'s completion/error branches, and
    /// `timeout`'s backstop for a stalled transfer. This impl documents the
    /// invariant rather than enforcing it.
    fn drop(&mut self) {}
}

/// spec.md §4.3 step 1 and §6 "Filesystem surface": prepend `root_path`,
/// substituting `homepage_path` for a bare `/`.
fn resolve_path(config: &Config, url: &[u8]) -> String {
    let url_str = String::from_utf8_lossy(url);
    if url_str == "/" {
        format!("{}/{}", config.root_path.trim_right_matches('/'), config.homepage_path)
    } else {
        format!("{}{}", config.root_path.trim_right_matches('/'), url_str)
    }
}

#[cfg(test)]
mod test {
    use super::resolve_path;
    use config::Config;

    #[test]
    fn root_request_uses_homepage_path() {
        let cfg = Config { root_path: "/srv".into(), homepage_path: "index.html".into(), listen_addr: "x".into() };
        assert_eq!(resolve_path(&cfg, b"/"), "/srv/index.html");
    }

    #[test]
    fn other_requests_are_appended_to_root() {
        let cfg = Config { root_path: "/srv".into(), homepage_path: "index.html".into(), listen_addr: "x".into() };
        assert_eq!(resolve_path(&cfg, b"/a/b"), "/srv/a/b");
    }
}
