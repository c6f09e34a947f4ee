use std::path::Path;

use log::{debug, warn};

use crate::container::Container;
use crate::converter;
use crate::cursor::ByteCursor;
use crate::error::PodError;
use crate::string::read_pod_string;
use crate::Result;

/// Expected value of the first reserved field of a track
pub const TRACK_RESERVED1: u32 = 3;
/// Smallest possible event: empty name, parameter size and count
const MIN_EVENT_SIZE: usize = 1 + 4 + 4;

#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Reject tracks whose first reserved field is not [`TRACK_RESERVED1`]
    pub strict_reserved: bool,
    /// Upper bound for the declared parameter count of one event
    pub max_params: u32,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            strict_reserved: false,
            max_params: 0x1_0000,
        }
    }
}

/// An event on a track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackEvent {
    pub name: String,
    /// Length of every parameter block of this event
    pub param_size: u32,
    pub params: Vec<Vec<u8>>,
}

/// A track file: reserved fields, the event list and the macro section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub reserved1: u32,
    pub reserved2: u32,
    /// Size of the event parameter buffer the game allocates
    pub param_block_size: u32,
    pub events: Vec<TrackEvent>,
    /// Macro section, kept unparsed
    pub macros: Vec<u8>,
}

impl Track {
    pub fn open_path(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Self> {
        let container = Container::open_path(path)?;
        Self::from_container(&container, opts)
    }

    pub fn from_container(container: &Container, opts: &ReadOptions) -> Result<Self> {
        read_track(container.payload(), opts)
    }

    pub fn find_event(&self, name: &str) -> Option<&TrackEvent> {
        self.events.iter().find(|event| event.name == name)
    }
}

/// Parse a track from the cleartext payload of a container.
pub fn read_track(payload: &[u8], opts: &ReadOptions) -> Result<Track> {
    let mut cursor = ByteCursor::new(payload);

    let reserved1 = cursor.read_u32()?;
    if reserved1 != TRACK_RESERVED1 {
        if opts.strict_reserved {
            return Err(PodError::UnsupportedLayout {
                field: "reserved1",
                expected: TRACK_RESERVED1.to_string(),
                found: reserved1.to_string(),
            });
        }
        warn!("track reserved1 is {reserved1}, expected {TRACK_RESERVED1}");
    }
    let reserved2 = cursor.read_u32()?;

    let event_count = cursor.read_u32()?;
    let param_block_size = cursor.read_u32()?;

    let event_count = converter::u32_to_usize(event_count)?;
    let mut events = Vec::with_capacity(event_count.min(cursor.remaining() / MIN_EVENT_SIZE));
    for _ in 0..event_count {
        events.push(read_event(&mut cursor, opts)?);
    }

    let macros = cursor.read_rest().to_vec();
    debug!(
        "read track: {} events, {} macro bytes left unparsed",
        events.len(),
        macros.len()
    );

    Ok(Track {
        reserved1,
        reserved2,
        param_block_size,
        events,
        macros,
    })
}

/// Read one event: name, shared parameter size, count and the blocks.
pub fn read_event(cursor: &mut ByteCursor<'_>, opts: &ReadOptions) -> Result<TrackEvent> {
    let name = read_pod_string(cursor)?;
    let param_size = cursor.read_u32()?;
    let param_count = cursor.read_u32()?;
    if param_count > opts.max_params {
        return Err(PodError::UnsupportedLayout {
            field: "parameter count",
            expected: format!("at most {}", opts.max_params),
            found: param_count.to_string(),
        });
    }

    let size = converter::u32_to_usize(param_size)?;
    let count = converter::u32_to_usize(param_count)?;
    cursor.ensure(size.checked_mul(count).ok_or(PodError::IntegerOverflow)?)?;

    let params = (0..count)
        .map(|_| cursor.read_bytes(size).map(<[u8]>::to_vec))
        .collect::<Result<Vec<_>>>()?;

    Ok(TrackEvent {
        name,
        param_size,
        params,
    })
}
