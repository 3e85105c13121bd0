//! Frame synchronisation for links that deliver stale or fragmented bytes.
//!
//! A serial converter may still be flushing the tail of a previous answer
//! when the next one starts arriving, so the first byte in the buffer is not
//! necessarily the first byte of the reply. The scanner accepts the first
//! offset where unit, function, length and CRC all agree.

use crate::error::Error;
use crate::modbus::frame::{
    self, has_valid_crc, read_response_len, ECHO_FRAME_LEN, EXCEPTION_BIT, EXCEPTION_FRAME_LEN,
};

use bytes::{Bytes, BytesMut};
use log::warn;
use tokio_util::codec::Decoder;

const MAX_BUFFER_SIZE: usize = 4096;

/// Shape of the reply a transaction is waiting for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expect {
    Registers { unit: u8, count: u16 },
    Echo { unit: u8, function: u8 },
}

impl Expect {
    pub fn registers(unit: u8, count: u16) -> Self {
        Self::Registers { unit, count }
    }

    /// The reply to a write repeats the request's unit and function.
    pub fn echo_of(request: &[u8]) -> Self {
        Self::Echo {
            unit: request.first().copied().unwrap_or_default(),
            function: request.get(1).copied().unwrap_or_default(),
        }
    }

    fn unit(&self) -> u8 {
        match self {
            Self::Registers { unit, .. } | Self::Echo { unit, .. } => *unit,
        }
    }

    fn function(&self) -> u8 {
        match self {
            Self::Registers { .. } => frame::FunctionCode::ReadHoldingRegisters.into(),
            Self::Echo { function, .. } => *function,
        }
    }

    /// Length of the frame starting at `candidate[0]`, if one is there.
    fn match_at(&self, candidate: &[u8]) -> Option<usize> {
        if candidate.len() < 2 || candidate[0] != self.unit() {
            return None;
        }

        let function = candidate[1];
        let len = if function == self.function() | EXCEPTION_BIT {
            EXCEPTION_FRAME_LEN
        } else if function != self.function() {
            return None;
        } else {
            match self {
                Self::Registers { count, .. } => {
                    let byte_count = *candidate.get(2)? as usize;
                    if byte_count != *count as usize * 2 {
                        return None;
                    }
                    read_response_len(*count)
                }
                Self::Echo { .. } => ECHO_FRAME_LEN,
            }
        };

        (candidate.len() >= len && has_valid_crc(&candidate[..len])).then_some(len)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Found {
    pub offset: usize,
    pub len: usize,
}

/// First offset in `buf` holding a complete frame matching `expect`.
pub fn find_frame(buf: &[u8], expect: &Expect) -> Option<Found> {
    (0..buf.len()).find_map(|offset| {
        expect
            .match_at(&buf[offset..])
            .map(|len| Found { offset, len })
    })
}

/// Codec over the raw transport's receive buffer. Yields the matching frame
/// and drops whatever preceded it.
pub struct FrameDecoder {
    expect: Expect,
    discarded: usize,
}

impl FrameDecoder {
    pub fn new(expect: Expect) -> Self {
        Self {
            expect,
            discarded: 0,
        }
    }

    /// Garbage bytes thrown away so far.
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl Decoder for FrameDecoder {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, Error> {
        match find_frame(src, &self.expect) {
            Some(found) => {
                if found.offset > 0 {
                    let garbage = src.split_to(found.offset);
                    warn!(
                        "discarding {} bytes before frame: {}",
                        garbage.len(),
                        frame::hex(&garbage)
                    );
                    self.discarded += garbage.len();
                }
                Ok(Some(src.split_to(found.len).freeze()))
            }
            None if src.len() > MAX_BUFFER_SIZE => Err(Error::Frame(format!(
                "no frame in {} buffered bytes",
                src.len()
            ))),
            None => Ok(None),
        }
    }
}
