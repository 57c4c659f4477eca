use thiserror::Error;

macro_rules! invalid_metadata {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidMetadata {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidMetadata {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The loader distinguishes between input that violates its calling contract
/// ([`Error::InvalidArgument`]), metadata that contradicts the ECMA-335 invariants the
/// unresolved model relies on ([`Error::InvalidMetadata`]), metadata that is well-formed but
/// uses a construct this library does not translate ([`Error::NotSupported`]), and cooperative
/// cancellation ([`Error::Cancelled`]).
///
/// Locally recoverable conditions (function pointers, custom modifiers, malformed
/// `DecimalConstantAttribute` blobs, unreadable security blobs) are handled by the documented
/// fallback and never surface as errors.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied value violates the loader's contract.
    ///
    /// Raised before any state is mutated, e.g. for a module without a name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The metadata graph is internally inconsistent.
    ///
    /// This error indicates that the source graph does not satisfy an ECMA-335 invariant the
    /// loader depends on, such as a generic parameter whose recorded position differs from its
    /// index in the owner's parameter list. The error includes the source location where the
    /// inconsistency was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the inconsistency
    /// * `file` - Source file in which the error was detected
    /// * `line` - Source line in which the error was detected
    #[error("Invalid metadata - {file}:{line}: {message}")]
    InvalidMetadata {
        /// The message to be printed for the error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The metadata uses a construct this library does not translate.
    ///
    /// Currently raised for P/Invoke records with an unknown calling convention.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The load was cancelled through the configured cancellation token.
    ///
    /// Only raised on the eager type-iteration boundary; lazy materialization is never
    /// cancelled.
    #[error("The load was cancelled")]
    Cancelled,
}
