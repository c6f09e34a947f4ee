/// Direction of a cipher session.
///
/// Only [`Direction::Decode`] is implemented. The format's encoder was never
/// reverse-engineered, so a session configured with [`Direction::Encode`] is
/// rejected with [`crate::error::PodError::UnsupportedDirection`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Decode,
    Encode,
}

/// Parameters shared between the container reader and the word cipher for
/// one decode session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CipherConfig {
    direction: Direction,
    /// Raw length of the source in bytes
    declared_file_size: u32,
    /// XOR key recovered from the first word of the stream
    coder_key: u32,
    /// Distance between checksum words, 0 until discovered
    block_size: u32,
}

impl CipherConfig {
    /// Create a decode configuration seeded with the raw length of the source.
    pub fn for_file_size(declared_file_size: u32) -> Self {
        Self {
            declared_file_size,
            ..Self::default()
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn declared_file_size(&self) -> u32 {
        self.declared_file_size
    }

    pub fn coder_key(&self) -> u32 {
        self.coder_key
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Whether the checksum block size has been discovered yet.
    pub fn is_block_size_known(&self) -> bool {
        self.block_size != 0
    }

    pub(crate) fn set_coder_key(&mut self, coder_key: u32) {
        self.coder_key = coder_key;
    }

    /// Records the discovered block size. Once non-zero it is never replaced.
    pub(crate) fn discover_block_size(&mut self, block_size: u32) {
        if self.block_size == 0 {
            self.block_size = block_size;
        }
    }
}
