//! Error type definitions.

use std::borrow::Cow;
use std::io::ErrorKind;
pub use std::io::Error as IoError;
pub use std::io::Result as IoResult;
use std::convert::TryFrom;
use std::error;
use std::fmt;


// Export types

/// A result that may contain a codec error.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if ok, contains nothing, and otherwise contains a codec error.
pub type UnitResult = Result<()>;


/// An error that may happen while compressing or decompressing pixel data.
/// Every failure is reported by the call that detected it.
/// Nothing is retried internally, and no partially decoded bytes are ever returned.
#[derive(Debug)]
pub enum Error {

    /// A codec name, codec id, compression level or quality value was not accepted.
    Configuration(Cow<'static, str>),

    /// The entropy coder reported a failure or produced
    /// more bytes than its own upper bound allows.
    Encode(Cow<'static, str>),

    /// The compressed bytes are corrupt or do not match the expected layout.
    /// This includes version mismatches, inconsistent size prefixes,
    /// and decompressed byte counts that differ from the declared ones.
    Invalid(Cow<'static, str>),

    /// A computed byte range does not fit into the supplied buffer.
    /// Detected before the entropy coder is invoked.
    Capacity(Cow<'static, str>),

    /// The codec is registered, but its algorithm is not part of this engine.
    NotSupported(Cow<'static, str>),

    /// The contents of an in-memory reader or writer could not be accessed.
    Io(IoError),
}


impl Error {

    /// Create an error of the variant `Configuration`.
    pub(crate) fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Configuration(message.into())
    }

    /// Create an error of the variant `Encode`.
    pub(crate) fn encode(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Encode(message.into())
    }

    /// Create an error of the variant `Invalid`.
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Invalid(message.into())
    }

    /// Create an error of the variant `Capacity`.
    pub(crate) fn capacity(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Capacity(message.into())
    }

    /// Create an error of the variant `NotSupported`.
    pub(crate) fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Error::NotSupported(message.into())
    }
}

/// Enable using the `?` operator on `std::io::Result`.
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        if error.kind() == ErrorKind::UnexpectedEof {
            Error::invalid("reference to missing bytes")
        }
        else {
            Error::Io(error)
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(message) => write!(formatter, "invalid configuration: {}", message),
            Error::Encode(message) => write!(formatter, "encoding failed: {}", message),
            Error::Invalid(message) => write!(formatter, "invalid data: {}", message),
            Error::Capacity(message) => write!(formatter, "buffer too small: {}", message),
            Error::NotSupported(message) => write!(formatter, "not supported: {}", message),
            Error::Io(error) => write!(formatter, "{}", error),
        }
    }
}


/// Return error on invalid range.
#[inline]
pub(crate) fn i32_to_usize(value: i32, error_message: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::invalid(error_message))
}

/// Return error on invalid range.
#[inline]
pub(crate) fn usize_to_i32(value: usize, error_message: &'static str) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::invalid(error_message))
}

/// Return error on invalid range.
#[inline]
pub(crate) fn u64_to_usize(value: u64, error_message: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::invalid(error_message))
}

/// Return error on invalid range.
#[inline]
pub(crate) fn usize_to_u32(value: usize, error_message: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::invalid(error_message))
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unexpected_end_of_input_is_invalid_data(){
        let error: Error = IoError::new(ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(error, Error::Invalid(_)));

        let error: Error = IoError::new(ErrorKind::Other, "other").into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn conversions_report_errors_instead_of_panicking(){
        assert!(i32_to_usize(-1, "negative").is_err());
        assert_eq!(i32_to_usize(7, "negative").unwrap(), 7);
        assert!(usize_to_i32(usize::MAX, "large").is_err());
    }
}
