use std::fmt::{self, Display};

/// Represents a version of the HTTP spec that this session core understands.
///
/// HTTP/0.9 and HTTP/2 are not supported: both collapse to `Unsupported`,
/// same as any other unparsable version string (e.g. `HTTP/2.0` is rejected
/// with `400`, not upgraded).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Version {
    /// HTTP/1.0, version code 100.
    Http10,
    /// HTTP/1.1, version code 101.
    Http11,
    /// Anything else: missing, malformed, or a version we don't speak.
    Unsupported,
}

impl Version {
    /// Maps the `<major>*100 + <minor>` code computed while parsing the
    /// request line onto a `Version`. Only 100 and 101 are accepted.
    pub fn from_code(code: u32) -> Version {
        match code {
            100 => Version::Http10,
            101 => Version::Http11,
            _ => Version::Unsupported,
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
            Version::Unsupported => "HTTP/?.?",
        })
    }
}

#[cfg(test)]
mod test {
    use super::Version;

    #[test]
    fn known_codes() {
        assert_eq!(Version::from_code(100), Version::Http10);
        assert_eq!(Version::from_code(101), Version::Http11);
    }

    #[test]
    fn unknown_codes() {
        assert_eq!(Version::from_code(200), Version::Unsupported);
        assert_eq!(Version::from_code(0), Version::Unsupported);
    }
}
