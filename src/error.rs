use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! bad_image_error {
    ($msg:expr) => {
        crate::Error::BadImage {
            message: $msg.to_string(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::BadImage {
            message: format!($fmt, $($arg)*),
        }
    };
}

macro_rules! invalid_encoding_error {
    ($msg:expr) => {
        crate::Error::InvalidEncoding {
            message: $msg.to_string(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidEncoding {
            message: format!($fmt, $($arg)*),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all failure modes that can occur while parsing PE images, reading and
/// rewriting CLI metadata, and encoding or decoding x86 instructions. Each variant carries
/// enough context to locate the fault - structural errors embed the source location where
/// the malformation was detected, image errors carry the offending detail in their message.
///
/// # Error Categories
///
/// ## Parsing Errors
/// - [`Error::OutOfBounds`] - Attempted to read or write beyond a buffer boundary
/// - [`Error::BadImage`] - Signature mismatch, bad magic, or impossible header field
/// - [`Error::Malformed`] - Corrupted or inconsistent metadata structure
/// - [`Error::Empty`] - Empty input provided
///
/// ## Emit Errors
/// - [`Error::InvalidEncoding`] - x86 instruction not representable in machine code
/// - [`Error::InvariantViolation`] - Caller-supplied structure violates a documented precondition
///
/// ## I/O Errors
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::{Error, MappingMode, PeImage};
///
/// match PeImage::from_path(std::path::Path::new("app.exe"), MappingMode::Unmapped) {
///     Ok(image) => println!("Loaded {} sections", image.sections.len()),
///     Err(Error::BadImage { message }) => eprintln!("Not a PE file: {}", message),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An out of bound access was attempted while parsing or writing.
    ///
    /// This error occurs when trying to read data beyond the end of a buffer
    /// or stream. It's a safety check to prevent buffer overruns during parsing.
    #[error("Out of Bound access would have occurred!")]
    OutOfBounds,

    /// The input is not a valid PE image.
    ///
    /// Indicates a signature mismatch, a bad magic value, or a header field
    /// whose value is impossible for a well-formed image.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the offending structure, including the faulting offset
    #[error("BadImage - {message}")]
    BadImage {
        /// The message describing what made the image invalid
        message: String,
    },

    /// The metadata is damaged and could not be parsed.
    ///
    /// This error indicates that a metadata structure is corrupted or doesn't
    /// conform to the ECMA-335 format. The error includes the source location
    /// where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An x86 instruction could not be encoded or decoded.
    ///
    /// This error occurs when an opcode byte has no entry in the catalogue,
    /// or when an instruction's operands demand a ModR/M, SIB, or immediate
    /// combination that the encoding scheme cannot represent.
    #[error("InvalidEncoding - {message}")]
    InvalidEncoding {
        /// The message describing the unrepresentable encoding
        message: String,
    },

    /// A caller-supplied structure violates a documented precondition.
    ///
    /// Examples include a segment tree whose children overlap, or two
    /// sections occupying the same RVA range.
    #[error("InvariantViolation - {message}")]
    InvariantViolation {
        /// The message describing the violated invariant
        message: String,
    },

    /// Provided input was empty.
    ///
    /// This error occurs when an empty file or buffer is provided where
    /// actual PE image data was expected.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
