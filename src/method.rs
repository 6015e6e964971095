/// The HTTP method of a request, matched case-sensitively against the
/// request-line token.
///
/// Anything other than an exact match of `GET`, `POST`, `PUT` or `HEAD`
/// (including a right word in the wrong case) is `Unsupported`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Head,
    Unsupported,
}

impl Method {
    pub fn parse(token: &[u8]) -> Method {
        match token {
            b"GET" => Method::Get,
            b"POST" => Method::Post,
            b"PUT" => Method::Put,
            b"HEAD" => Method::Head,
            _ => Method::Unsupported,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Method;

    #[test]
    fn recognized() {
        assert_eq!(Method::parse(b"GET"), Method::Get);
        assert_eq!(Method::parse(b"POST"), Method::Post);
        assert_eq!(Method::parse(b"PUT"), Method::Put);
        assert_eq!(Method::parse(b"HEAD"), Method::Head);
    }

    #[test]
    fn case_sensitive() {
        assert_eq!(Method::parse(b"get"), Method::Unsupported);
        assert_eq!(Method::parse(b"Get"), Method::Unsupported);
    }

    #[test]
    fn unsupported() {
        assert_eq!(Method::parse(b"DELETE"), Method::Unsupported);
        assert_eq!(Method::parse(b"FOO"), Method::Unsupported);
        assert_eq!(Method::parse(b""), Method::Unsupported);
    }
}
