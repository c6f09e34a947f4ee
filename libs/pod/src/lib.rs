//! Reader for the obfuscated binary data files ("POD" files) of the 3Dfx
//! racing game Pod.
//!
//! Every 32-bit word of a file, header included, passes through a word
//! cipher which recovers its XOR key from the file size, discovers where the
//! embedded block checksums sit and validates them. The cleartext starts
//! with a [`ContainerHeader`]; what follows is specific to the file type, of
//! which [`Track`] is implemented.

pub mod cipher;
pub mod config;
pub mod container;
mod converter;
pub mod cursor;
pub mod error;
pub mod string;
pub mod track;

pub use cipher::{decode_word, transform, CipherState, DecodeReader, WordCipher};
pub use config::{CipherConfig, Direction};
pub use container::{open_container, Container, ContainerHeader};
pub use cursor::ByteCursor;
pub use error::PodError;
pub use string::{encode_pod_string, read_pod_string};
pub use track::{read_track, ReadOptions, Track, TrackEvent};

pub type Result<T> = core::result::Result<T, PodError>;
