extern crate miette;
extern crate thiserror;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConverterError {
    #[error("error converting an value")]
    #[diagnostic(code(libpod::try_from_int_error))]
    TryFromIntError(#[from] std::num::TryFromIntError),
}

#[derive(Error, Diagnostic, Debug)]
pub enum PodError {
    #[error(transparent)]
    #[diagnostic(code(libpod::convert_error))]
    ConvertValue(#[from] ConverterError),

    #[error(
        "invalid block checksum at byte {position:#x} (expected {expected:#010x}, found {found:#010x})"
    )]
    #[diagnostic(
        code(libpod::checksum_mismatch),
        help("the coder key or block size was derived wrongly, or the file is corrupt")
    )]
    ChecksumMismatch {
        position: u32,
        expected: u32,
        found: u32,
    },

    #[error("unexpected end of data (needed {needed:?} bytes, {remaining:?} remaining)")]
    #[diagnostic(code(libpod::unexpected_end_of_data))]
    UnexpectedEndOfData { needed: u64, remaining: u64 },

    #[error("unsupported layout: {field} (expected {expected}, found {found})")]
    #[diagnostic(code(libpod::unsupported_layout))]
    UnsupportedLayout {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("input length {length:?} is not a multiple of 4 bytes")]
    #[diagnostic(code(libpod::misaligned_input))]
    MisalignedInput { length: u64 },

    #[error("decode aborted by an earlier error")]
    #[diagnostic(code(libpod::decode_aborted))]
    DecodeAborted,

    #[error("encoding POD data is not supported")]
    #[diagnostic(code(libpod::unsupported_direction))]
    UnsupportedDirection,

    #[error("file is too large ({length:?} bytes, at most {} allowed)", u32::MAX)]
    #[diagnostic(code(libpod::file_size_error))]
    FileTooLarge { length: u64 },

    #[error("integer overflow")]
    #[diagnostic(code(libpod::integer_overflow))]
    IntegerOverflow,

    #[error("POD file reading error")]
    #[diagnostic(code(libpod::io_error))]
    ReadFile(#[from] std::io::Error),
}
