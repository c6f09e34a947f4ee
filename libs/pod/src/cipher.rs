use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

use crate::config::{CipherConfig, Direction};
use crate::error::PodError;
use crate::Result;

/// Size of one cipher word (in bytes)
pub const WORD_SIZE: u32 = 4;
/// Coder keys which switch to the secondary cipher after the first block
pub const SECONDARY_CODER_KEYS: [u32; 2] = [0x0000_5CA8, 0x0000_D13F];

/// Raw bytes pulled from the inner reader per refill of [`DecodeReader`]
const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Running state of one decode pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CipherState {
    /// Bytes of input processed so far
    bytes_consumed: u32,
    /// Wrapping sum of the decoded words since the last block boundary
    running_checksum: u32,
    /// Last decoded word, 0 right after a boundary
    previous_word: u32,
}

impl CipherState {
    pub fn bytes_consumed(&self) -> u32 {
        self.bytes_consumed
    }

    pub fn running_checksum(&self) -> u32 {
        self.running_checksum
    }

    pub fn previous_word(&self) -> u32 {
        self.previous_word
    }
}

/// Decode a single raw word.
///
/// Returns `None` for checksum words, which never reach the cleartext stream.
pub fn decode_word(
    config: &mut CipherConfig,
    state: &mut CipherState,
    dword: u32,
) -> Result<Option<u32>> {
    if config.direction() != Direction::Decode {
        return Err(PodError::UnsupportedDirection);
    }

    let position = state.bytes_consumed;
    if position == 0 {
        config.set_coder_key(dword ^ config.declared_file_size());
        debug!(
            "derived coder key {:#010x} from file size {}",
            config.coder_key(),
            config.declared_file_size()
        );
    }

    let decoded = if uses_secondary_cipher(config, position) {
        secondary_decode(dword, state.previous_word)
    } else {
        dword ^ config.coder_key()
    };

    let is_block_end = if config.is_block_size_known() {
        if position % config.block_size() == 0 {
            if decoded != state.running_checksum {
                return Err(PodError::ChecksumMismatch {
                    position,
                    expected: state.running_checksum,
                    found: decoded,
                });
            }
            trace!("checksum {decoded:#010x} valid at byte {position:#x}");
            true
        } else {
            false
        }
    } else if decoded == state.running_checksum
        && config.declared_file_size().checked_rem(position) == Some(0)
    {
        let block_size = position
            .checked_add(WORD_SIZE)
            .ok_or(PodError::IntegerOverflow)?;
        config.discover_block_size(block_size);
        debug!("discovered block size {block_size} at byte {position:#x}");
        true
    } else {
        false
    };

    let emitted = if is_block_end {
        state.running_checksum = 0;
        state.previous_word = 0;
        None
    } else {
        state.running_checksum = state.running_checksum.wrapping_add(decoded);
        state.previous_word = decoded;
        Some(decoded)
    };

    state.bytes_consumed = position
        .checked_add(WORD_SIZE)
        .ok_or(PodError::IntegerOverflow)?;
    Ok(emitted)
}

/// Decode a buffer of whole words, appending the cleartext to `output`.
///
/// Returns the number of bytes appended, which is less than the input length
/// whenever checksum words were dropped.
pub fn transform(
    config: &mut CipherConfig,
    state: &mut CipherState,
    input: &[u8],
    output: &mut Vec<u8>,
) -> Result<usize> {
    if input.len() % WORD_SIZE as usize != 0 {
        return Err(PodError::MisalignedInput {
            length: crate::converter::usize_to_u64(input.len())?,
        });
    }

    let mut produced = 0usize;
    for chunk in input.chunks_exact(WORD_SIZE as usize) {
        let dword = LittleEndian::read_u32(chunk);
        if let Some(decoded) = decode_word(config, state, dword)? {
            let mut bytes = [0u8; WORD_SIZE as usize];
            LittleEndian::write_u32(&mut bytes, decoded);
            output.extend_from_slice(&bytes);
            produced += bytes.len();
        }
    }
    Ok(produced)
}

fn uses_secondary_cipher(config: &CipherConfig, position: u32) -> bool {
    config.is_block_size_known()
        && position > config.block_size()
        && SECONDARY_CODER_KEYS.contains(&config.coder_key())
}

fn secondary_decode(dword: u32, previous_word: u32) -> u32 {
    let key = match previous_word & 0x0003_0000 {
        0x0000_0000 => previous_word.wrapping_sub(0x50A4_A89D),
        0x0001_0000 => 0x3AF7_0BC4u32.wrapping_sub(previous_word),
        0x0002_0000 => previous_word.wrapping_add(0x0709_1971) << 1,
        _ => 0x11E6_7316u32.wrapping_sub(previous_word) << 1,
    };
    match previous_word & 0x0000_0003 {
        0 => !dword ^ key,
        1 => !dword ^ !key,
        2 => dword ^ !key,
        _ => dword ^ key ^ 0x0000_FFFF,
    }
}

/// Word cipher owning the configuration and state of one decode session.
#[derive(Clone, Debug)]
pub struct WordCipher {
    config: CipherConfig,
    state: CipherState,
}

impl WordCipher {
    pub fn new(config: CipherConfig) -> Result<Self> {
        if config.direction() != Direction::Decode {
            return Err(PodError::UnsupportedDirection);
        }
        Ok(Self {
            config,
            state: CipherState::default(),
        })
    }

    pub fn config(&self) -> &CipherConfig {
        &self.config
    }

    pub fn state(&self) -> &CipherState {
        &self.state
    }

    pub fn into_config(self) -> CipherConfig {
        self.config
    }

    pub fn decode_word(&mut self, dword: u32) -> Result<Option<u32>> {
        decode_word(&mut self.config, &mut self.state, dword)
    }

    pub fn transform(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        transform(&mut self.config, &mut self.state, input, output)
    }
}

/// Streaming adapter yielding the cleartext of a POD byte source.
///
/// Cipher failures surface as [`io::Error`]s of kind `InvalidData` wrapping a
/// [`PodError`].
pub struct DecodeReader<R> {
    inner: R,
    cipher: WordCipher,
    raw: Vec<u8>,
    decoded: Vec<u8>,
    decoded_pos: usize,
    finished: bool,
    failed: bool,
}

impl<R: Read> DecodeReader<R> {
    pub fn new(inner: R, config: CipherConfig) -> Result<Self> {
        Ok(Self {
            inner,
            cipher: WordCipher::new(config)?,
            raw: Vec::with_capacity(READ_CHUNK_SIZE),
            decoded: Vec::with_capacity(READ_CHUNK_SIZE),
            decoded_pos: 0,
            finished: false,
            failed: false,
        })
    }

    pub fn cipher(&self) -> &WordCipher {
        &self.cipher
    }

    /// Consume the reader, returning the cipher configuration as derived so far.
    pub fn into_config(self) -> CipherConfig {
        self.cipher.into_config()
    }

    fn refill(&mut self) -> io::Result<()> {
        self.decoded.clear();
        self.decoded_pos = 0;

        let filled = self.raw.len();
        self.raw.resize(filled + READ_CHUNK_SIZE, 0);
        let read = loop {
            match self.inner.read(&mut self.raw[filled..]) {
                Ok(read) => break read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    self.raw.truncate(filled);
                    return Err(error);
                }
            }
        };
        self.raw.truncate(filled + read);

        if read == 0 {
            if !self.raw.is_empty() {
                let consumed = u64::from(self.cipher.state().bytes_consumed());
                let partial = self.raw.len() as u64;
                return Err(self.fail(PodError::MisalignedInput {
                    length: consumed + partial,
                }));
            }
            self.finished = true;
            return Ok(());
        }

        let whole = self.raw.len() - self.raw.len() % WORD_SIZE as usize;
        if let Err(error) = self.cipher.transform(&self.raw[..whole], &mut self.decoded) {
            return Err(self.fail(error));
        }
        self.raw.drain(..whole);
        Ok(())
    }

    /// Poison the reader: words decoded ahead of a cipher failure are dropped
    /// and every later read fails.
    fn fail(&mut self, error: PodError) -> io::Error {
        self.failed = true;
        self.raw.clear();
        self.decoded.clear();
        self.decoded_pos = 0;
        invalid_data(error)
    }
}

impl<R: Read> Read for DecodeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failed {
            return Err(invalid_data(PodError::DecodeAborted));
        }
        while self.decoded_pos == self.decoded.len() {
            if self.finished {
                return Ok(0);
            }
            self.refill()?;
        }

        let available = &self.decoded[self.decoded_pos..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.decoded_pos += count;
        Ok(count)
    }
}

fn invalid_data(error: PodError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error)
}

/// Recover a [`PodError`] carried through an [`io::Error`] by [`DecodeReader`].
pub(crate) fn unwrap_io_error(error: io::Error) -> PodError {
    if !error.get_ref().is_some_and(|inner| inner.is::<PodError>()) {
        return PodError::ReadFile(error);
    }

    let kind = error.kind();
    match error.into_inner().map(|inner| inner.downcast::<PodError>()) {
        Some(Ok(pod)) => *pod,
        Some(Err(inner)) => PodError::ReadFile(io::Error::new(kind, inner)),
        None => PodError::ReadFile(io::Error::from(kind)),
    }
}
