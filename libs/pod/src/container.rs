use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::debug;

use crate::cipher::{unwrap_io_error, DecodeReader, WordCipher};
use crate::config::CipherConfig;
use crate::converter;
use crate::cursor::ByteCursor;
use crate::error::PodError;
use crate::Result;

/// Generic header preceding every POD data file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerHeader {
    /// File size as stored in the header
    pub file_size: u32,
    /// Offset table. May contain stale pointers, which are kept as-is
    pub offsets: Vec<u32>,
}

/// A decoded POD data file: its header, the cipher parameters recovered while
/// decoding and the cleartext payload following the header.
#[derive(Clone, Debug)]
pub struct Container {
    header: ContainerHeader,
    cipher: CipherConfig,
    payload: Vec<u8>,
}

impl Container {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(BufReader::new(file))
    }

    /// Decode a container from a seekable source.
    ///
    /// The raw length of the source seeds the cipher, so it is measured
    /// before any byte is decoded. Decoding starts at the beginning of the
    /// source.
    pub fn open<R: Read + Seek>(mut source: R) -> Result<Self> {
        let length = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        let config = CipherConfig::for_file_size(file_size_of(length)?);

        let mut reader = DecodeReader::new(source, config)?;
        let mut cleartext = Vec::new();
        reader
            .read_to_end(&mut cleartext)
            .map_err(unwrap_io_error)?;
        Self::from_cleartext(&cleartext, reader.into_config())
    }

    /// Decode a container held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let length = converter::usize_to_u64(bytes.len())?;
        let config = CipherConfig::for_file_size(file_size_of(length)?);

        let mut cipher = WordCipher::new(config)?;
        let mut cleartext = Vec::with_capacity(bytes.len());
        cipher.transform(bytes, &mut cleartext)?;
        Self::from_cleartext(&cleartext, cipher.into_config())
    }

    fn from_cleartext(cleartext: &[u8], cipher: CipherConfig) -> Result<Self> {
        let mut cursor = ByteCursor::new(cleartext);
        let header = read_header(&mut cursor)?;
        let payload = cursor.read_rest().to_vec();

        debug!(
            "decoded container: file size {}, {} offsets, coder key {:#010x}, block size {}, {} payload bytes",
            header.file_size,
            header.offsets.len(),
            cipher.coder_key(),
            cipher.block_size(),
            payload.len()
        );

        Ok(Self {
            header,
            cipher,
            payload,
        })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// XOR key the data was encoded with
    pub fn coder_key(&self) -> u32 {
        self.cipher.coder_key()
    }

    /// Checksum block size, 0 if the stream never revealed one
    pub fn block_size(&self) -> u32 {
        self.cipher.block_size()
    }

    pub fn cipher_config(&self) -> &CipherConfig {
        &self.cipher
    }

    /// Cleartext bytes following the header
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_parts(self) -> (ContainerHeader, Vec<u8>) {
        (self.header, self.payload)
    }
}

/// Decode a container, returning its header and the cleartext payload.
pub fn open_container<R: Read + Seek>(source: R) -> Result<(ContainerHeader, Vec<u8>)> {
    Container::open(source).map(Container::into_parts)
}

fn file_size_of(length: u64) -> Result<u32> {
    u32::try_from(length).map_err(|_| PodError::FileTooLarge { length })
}

fn read_header(cursor: &mut ByteCursor<'_>) -> Result<ContainerHeader> {
    let file_size = cursor.read_u32()?;
    let offset_count = converter::u32_to_usize(cursor.read_u32()?)?;

    let mut offsets = Vec::with_capacity(offset_count.min(cursor.remaining() / 4));
    for _ in 0..offset_count {
        offsets.push(cursor.read_u32()?);
    }

    Ok(ContainerHeader { file_size, offsets })
}
