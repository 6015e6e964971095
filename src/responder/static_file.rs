//! The static file responder (C4, spec.md §4.4): opens a cached file
//! handle, emits headers, then streams the body in fixed chunks paced by
//! write completion.
//!
//! Grounded in `examples/original_source/src/util/file.h`'s positional
//! `Read`/pread-based `File` and in `http_session.cc`'s `ServeFile`/
//! `SendFile`. Reads go through `libc::pread` directly (rather than
//! `Seek`+`read`) because the file handle is cached and shared across
//! sessions in the registry (spec.md §4.6): no session may move the
//! shared handle's cursor.

use std::io;
use std::os::unix::io::AsRawFd;

use rotor::Scope;
use rotor_stream::{Expectation as E, Request, StreamSocket, Transport};

use error::{MetaError, StatusCode};
use response;
use session::{PostFlush, Session, Streaming};
use version::Version;

/// Suggested by spec.md §4.4; matches the original's `kFileBufferSize`.
const FILE_BUFFER_SIZE: usize = 4096;

fn pread(fd: i32, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    let n = unsafe {
        ::libc::pread(fd, buf.as_mut_ptr() as *mut _, buf.len(), offset as ::libc::off_t)
    };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

pub fn begin<C, S>(session: Session, path: String, transport: &mut Transport<S>,
    scope: &mut Scope<C>) -> Request<Session>
    where C: ::session::Context, S: StreamSocket
{
    let is_keep_alive = session.request().is_keep_alive;

    let size = match scope.registry().get_fd(&path) {
        Ok(file) => match file.metadata() {
            Ok(meta) => meta.len(),
            Err(_) => {
                return fail(session, StatusCode::InternalServerError500,
                    "could not stat file", transport);
            }
        },
        Err(e) => {
            let status = if e.kind() == io::ErrorKind::NotFound {
                StatusCode::NotFound404
            } else {
                StatusCode::InternalServerError500
            };
            return fail(session, status, "could not open file", transport);
        }
    };

    let mut w = response::ResponseWriter::new();
    w.status_line(Version::Http11, StatusCode::Ok200)
        .header("Content-Length", &size.to_string())
        .header_if(is_keep_alive, "Connection", "Keep-Alive")
        .end_headers();
    transport.output().extend(&w.into_bytes());

    scope.registry().emplace_offset(session.registry_id(), 0);
    let session = session.begin_streaming(Streaming {
        path: path,
        is_keep_alive: is_keep_alive,
    });
    Some((session, E::Flush(0), Session::response_deadline()))
}

/// Called from `Session::bytes_flushed` once the previous chunk (or the
/// response head, for the first call) has drained.
pub fn continue_streaming<C, S>(session: Session, streaming: Streaming,
    transport: &mut Transport<S>, scope: &mut Scope<C>) -> Request<Session>
    where C: ::session::Context, S: StreamSocket
{
    let id = session.registry_id();
    let offset = scope.registry().search_offset(id).unwrap_or(0);

    let fd = match scope.registry().get_fd(&streaming.path) {
        Ok(file) => file.as_raw_fd(),
        Err(_) => {
            scope.registry().erase_offset(id);
            return session.close_connection(false);
        }
    };

    let mut buf = [0u8; FILE_BUFFER_SIZE];
    match pread(fd, &mut buf, offset) {
        Ok(0) => {
            scope.registry().erase_offset(id);
            session.close_connection(streaming.is_keep_alive)
        }
        Ok(n) => {
            scope.registry().increment_offset(id, n as u64);
            transport.output().extend(&buf[..n]);
            let session = session.begin_streaming(streaming);
            Some((session, E::Flush(0), Session::response_deadline()))
        }
        Err(_) => {
            scope.registry().erase_offset(id);
            session.close_connection(false)
        }
    }
}

/// A resource-level failure (file missing, open/stat error). Per spec.md
/// §7, this terminates the connection unconditionally, the same as a parse
/// error: the original's `SendErrorResponse` (`http_session.cc`) calls
/// `ShutdownWrite()` regardless of `is_keep_alive_`.
fn fail<S>(session: Session, status: StatusCode, message: &'static str,
    transport: &mut Transport<S>) -> Request<Session>
    where S: StreamSocket
{
    let err = MetaError::new(status, message);
    let body = response::error_response(&err);
    transport.output().extend(&body);
    let session = session.queue_close(PostFlush::CloseImmediately);
    Some((session, E::Flush(0), Session::response_deadline()))
}

#[cfg(test)]
mod test {
    // The bulk of C4 (dispatch, offset bookkeeping, response shape) is
    // exercised through `Registry`'s own tests (`registry.rs`) and
    // `response::test`; the `Protocol` plumbing here needs a live
    // `rotor_stream::Transport`, which is exactly the externally supplied
    // primitive spec.md §1 treats as out of scope to construct in tests.

    #[test]
    fn pread_reads_from_the_requested_offset() {
        use std::io::Write;
        use std::os::unix::io::AsRawFd;
        let mut f = ::tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"0123456789").unwrap();
        f.flush().unwrap();
        let mut buf = [0u8; 4];
        let n = super::pread(f.as_raw_fd(), &mut buf, 3).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"3456");
    }

    #[test]
    fn pread_at_eof_returns_zero() {
        use std::os::unix::io::AsRawFd;
        let f = ::tempfile::NamedTempFile::new().unwrap();
        let mut buf = [0u8; 4];
        let n = super::pread(f.as_raw_fd(), &mut buf, 0).unwrap();
        assert_eq!(n, 0);
    }
}
