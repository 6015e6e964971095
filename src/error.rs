//! Status codes and the error taxonomy of §7: a first parse or resource
//! error ends the request; there is no recovery mid-request.
use std::borrow::Cow;

/// The six status codes this session core ever produces (spec.md §6).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StatusCode {
    Ok200,
    BadRequest400,
    NotFound404,
    MethodNotAllowed405,
    InternalServerError500,
    NotImplemented501,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok200 => 200,
            StatusCode::BadRequest400 => 400,
            StatusCode::NotFound404 => 404,
            StatusCode::MethodNotAllowed405 => 405,
            StatusCode::InternalServerError500 => 500,
            StatusCode::NotImplemented501 => 501,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            StatusCode::Ok200 => "OK",
            StatusCode::BadRequest400 => "Bad Request",
            StatusCode::NotFound404 => "Not Found",
            StatusCode::MethodNotAllowed405 => "Method Not Allowed",
            StatusCode::InternalServerError500 => "Internal Server Error",
            StatusCode::NotImplemented501 => "Not Implemented",
        }
    }
}

quick_error! {
    /// Error type reported by the request parser (C1) and URL normalizer (C2).
    ///
    /// Matches a `(StatusCode, message)` pair, same as `meta_error` in the
    /// data model (spec.md §3). Use `.status()` to recover the code that
    /// should be sent to the client.
    #[derive(Debug)]
    pub enum ParseError {
        MissingMethod {
            description("no space after the method token")
        }
        UnsupportedMethod {
            description("method token did not match GET, POST, PUT or HEAD")
        }
        MissingUrl {
            description("no space after the request target")
        }
        EmptyUrl {
            description("request target is empty")
        }
        UrlMustBeAbsolute {
            description("request target does not start with /")
        }
        MissingVersion {
            description("request line is missing the HTTP-version token")
        }
        MalformedVersion {
            description("HTTP-version token is not HTTP/<digits>.<digits>")
        }
        UnsupportedVersion {
            description("HTTP-version is not 1.0 or 1.1")
        }
        MissingColon {
            description("header line has no ':' separator")
        }
        BadPercentEncoding {
            description("'%' is not followed by two hex digits")
        }
    }
}

impl ParseError {
    /// Unsupported method is reported as 405; everything else is 400.
    pub fn status(&self) -> StatusCode {
        match *self {
            ParseError::UnsupportedMethod => StatusCode::MethodNotAllowed405,
            _ => StatusCode::BadRequest400,
        }
    }
}

/// First parse/resource failure recorded on a session (spec.md §3,
/// `meta_error`). Filled once; never overwritten afterwards for the same
/// request.
#[derive(Debug, Clone)]
pub struct MetaError {
    pub status: StatusCode,
    pub message: Cow<'static, str>,
}

impl MetaError {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> MetaError {
        MetaError { status: status, message: message.into() }
    }
}

impl From<ParseError> for MetaError {
    fn from(e: ParseError) -> MetaError {
        MetaError::new(e.status(), e.description_owned())
    }
}

impl ParseError {
    fn description_owned(&self) -> Cow<'static, str> {
        use std::error::Error;
        Cow::Borrowed(self.description())
    }
}

/// Canned HTML body for an error status, same shape as the teacher's
/// `Context::emit_error_page` (`server/context.rs`).
pub fn canned_body(status: StatusCode) -> String {
    format!(
        "<h1>{} {}</h1>\n<p><small>served by session-httpd</small></p>\n",
        status.code(),
        status.reason(),
    )
}

#[cfg(test)]
mod test {
    use super::{ParseError, StatusCode};

    #[test]
    fn unsupported_method_is_405() {
        assert_eq!(ParseError::UnsupportedMethod.status(), StatusCode::MethodNotAllowed405);
    }

    #[test]
    fn other_parse_errors_are_400() {
        assert_eq!(ParseError::MissingColon.status(), StatusCode::BadRequest400);
        assert_eq!(ParseError::BadPercentEncoding.status(), StatusCode::BadRequest400);
        assert_eq!(ParseError::UnsupportedVersion.status(), StatusCode::BadRequest400);
    }
}
