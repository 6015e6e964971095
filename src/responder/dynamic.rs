//! The dynamic responder (C5, spec.md §4.5): loads a plugin handler for
//! the resolved path, invokes it once, and sends back whatever it
//! produced. Unlike C4 this is a single write with no streaming state.

use rotor::Scope;
use rotor_stream::{Expectation as E, Request, StreamSocket, Transport};

use error::{MetaError, StatusCode};
use method::Method;
use plugin::parse_query;
use response;
use session::{PostFlush, Session};
use version::Version;

pub fn respond<C, S>(session: Session, path: String, transport: &mut Transport<S>,
    scope: &mut Scope<C>) -> Request<Session>
    where C: ::session::Context, S: StreamSocket
{
    let is_keep_alive = session.request().is_keep_alive;
    let method = session.request().method;

    let handler = match scope.plugins().open(&path) {
        Ok(h) => h,
        Err(_) => {
            // A missing plugin is a resource-level failure, same as a
            // missing static file (spec.md §7): terminate unconditionally
            // rather than re-entering keep-alive.
            let err = MetaError::new(StatusCode::NotFound404, "no such plugin");
            let body = response::error_response(&err);
            transport.output().extend(&body);
            let session = session.queue_close(PostFlush::CloseImmediately);
            return Some((session, E::Flush(0), Session::response_deadline()));
        }
    };

    let payload = match method {
        Method::Post => handler.respond_post(&session.request().body),
        _ => handler.respond_get(&parse_query(&session.request().query)),
    };

    // Deliberately no Content-Length (spec.md §4.5): the handler's output
    // is opaque to this crate.
    let mut w = response::ResponseWriter::new();
    w.status_line(Version::Http11, StatusCode::Ok200)
        .header_if(is_keep_alive, "Connection", "Keep-Alive")
        .end_headers()
        .body(&payload);
    transport.output().extend(&w.into_bytes());

    let session = session.queue_close(PostFlush::CloseConnection {
        is_keep_alive: is_keep_alive,
    });
    Some((session, E::Flush(0), Session::response_deadline()))
}
