use std::fmt;
use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// A flag word was requested but the previous flag word's continuation bit was clear.
    UnadvertisedFlagWord,
    /// Presence checking ended while the current flag word still advertised another one. The
    /// property schema and the wire disagree on how many properties there are.
    UnexpectedContinuation,
    /// The byte stream ended partway through a value.
    Truncated { step: &'static str },
    /// A primitive value was malformed: bad UTF-8, unknown field type, overrun lengths, and so
    /// on.
    BadEncode(String),
    /// Decoding hit a nesting limit.
    ParseLimit(String),
    /// The byte stream failed for a reason other than running out of data.
    Io(io::Error),
}

impl Error {
    /// True if the flag-word continuation protocol was violated.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Error::UnadvertisedFlagWord | Error::UnexpectedContinuation
        )
    }

    /// True if the byte stream or a primitive value failed to decode.
    pub fn is_decode(&self) -> bool {
        !self.is_framing()
    }

    /// Map a read failure on `step` into either [`Error::Truncated`] or [`Error::Io`].
    pub(crate) fn read_fail(step: &'static str) -> impl FnOnce(io::Error) -> Error {
        move |e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::Truncated { step }
            } else {
                Error::Io(e)
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::UnadvertisedFlagWord => {
                f.write_str("Attempted to read flag word when none advertised")
            }
            Error::UnexpectedContinuation => f.write_str("Unexpected continuation flag word"),
            Error::Truncated { step } => write!(f, "Data ended early on step [{}]", step),
            Error::BadEncode(ref err) => write!(f, "Basic data encoding failure: {}", err),
            Error::ParseLimit(ref err) => write!(f, "Hit parsing limit: {}", err),
            Error::Io(ref err) => write!(f, "Stream read failed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::read_fail("read stream")(e)
    }
}
