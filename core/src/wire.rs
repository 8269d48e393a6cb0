//! The custom 5-byte-header framing used by every socket in the protocol
//! (§6.1): one type-code byte, a 4-byte big-endian payload length, then a
//! UTF-8 payload of that length. [`WireCodec`] implements this as a
//! `tokio_util::codec::Decoder`/`Encoder` pair so connection loops can drive
//! it with `FramedRead`/`FramedWrite`, the same idiom the original peer
//! manager used around `LengthDelimitedCodec` — only the byte layout differs.

use crate::error::WireError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

const HEADER_LEN: usize = 5;

/// The ten wire type codes (§6.1). Code 9 is overloaded: its meaning depends
/// on which role receives it (a tracker reading it as a trader
/// unregistering, a miner reading it as a wallet-directory update) rather
/// than anything distinguishable at the framing layer, so this layer keeps
/// it as a single undifferentiated variant and leaves disambiguation to the
/// receiving role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCode {
    Close = 0,
    Block = 1,
    Chain = 2,
    Transaction = 3,
    PeerList = 4,
    MinerRegister = 5,
    ChainRequest = 6,
    TraderResponse = 7,
    TraderRegister = 8,
    Nine = 9,
}

impl TypeCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TypeCode {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TypeCode::Close),
            1 => Ok(TypeCode::Block),
            2 => Ok(TypeCode::Chain),
            3 => Ok(TypeCode::Transaction),
            4 => Ok(TypeCode::PeerList),
            5 => Ok(TypeCode::MinerRegister),
            6 => Ok(TypeCode::ChainRequest),
            7 => Ok(TypeCode::TraderResponse),
            8 => Ok(TypeCode::TraderRegister),
            9 => Ok(TypeCode::Nine),
            other => Err(WireError::UnknownType(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub type_code: TypeCode,
    pub payload: String,
}

impl Frame {
    pub fn new(type_code: TypeCode, payload: impl Into<String>) -> Self {
        Frame {
            type_code,
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct WireCodec;

impl Decoder for WireCodec {
    type Item = Frame;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, WireError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }
        let type_byte = src[0];
        let len = u32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
        if src.len() < HEADER_LEN + len {
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None);
        }

        let type_code = TypeCode::try_from(type_byte)?;
        src.advance(HEADER_LEN);
        let payload_bytes = src.split_to(len);
        let payload = std::str::from_utf8(&payload_bytes)?.to_string();
        Ok(Some(Frame { type_code, payload }))
    }
}

impl Encoder<Frame> for WireCodec {
    type Error = WireError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), WireError> {
        let payload = item.payload.as_bytes();
        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u8(item.type_code.as_u8());
        dst.put_u32(payload.len() as u32);
        dst.put_slice(payload);
        Ok(())
    }
}
