//! The AMF3 variable length unsigned integer.
//!
//! One to four bytes. The first three carry seven bits each with the high bit
//! flagging a continuation, the fourth carries eight bits.

use bytes_util::CursorBuffer;

use crate::errors::{AmfReadError, AmfWriteError};

/// Exclusive upper bound accepted by [`write_u29`].
pub const U29_LIMIT: u32 = 0x4000_0000;

/// Write `value` as a variable length integer.
///
/// Values from `0x2000_0000` up to the limit only keep their low 29 bits.
pub fn write_u29(buffer: &mut CursorBuffer, value: u32) -> Result<(), AmfWriteError> {
    let mut bytes = [0u8; 4];
    let len = if value < 0x80 {
        bytes[0] = value as u8;
        1
    } else if value < 0x4000 {
        bytes[0] = ((value >> 7) & 0x7f) as u8 | 0x80;
        bytes[1] = (value & 0x7f) as u8;
        2
    } else if value < 0x20_0000 {
        bytes[0] = ((value >> 14) & 0x7f) as u8 | 0x80;
        bytes[1] = ((value >> 7) & 0x7f) as u8 | 0x80;
        bytes[2] = (value & 0x7f) as u8;
        3
    } else if value < U29_LIMIT {
        bytes[0] = ((value >> 22) & 0x7f) as u8 | 0x80;
        bytes[1] = ((value >> 15) & 0x7f) as u8 | 0x80;
        bytes[2] = ((value >> 8) & 0x7f) as u8 | 0x80;
        bytes[3] = (value & 0xff) as u8;
        4
    } else {
        return Err(AmfWriteError::UInt29OutOfRange(value));
    };

    buffer.write_bytes(&bytes[..len])?;
    Ok(())
}

/// Read a variable length integer. The position is unchanged on failure.
pub fn read_u29(buffer: &mut CursorBuffer) -> Result<u32, AmfReadError> {
    let start = buffer.position();
    match read_groups(buffer) {
        Ok(value) => Ok(value),
        Err(err) => {
            buffer.set_position(start).ok();
            Err(err)
        }
    }
}

fn read_groups(buffer: &mut CursorBuffer) -> Result<u32, AmfReadError> {
    let mut result = 0u32;
    for _ in 0..3 {
        let byte = u32::from(buffer.read_u8()?);
        if byte < 0x80 {
            return Ok(result | byte);
        }
        result = (result | (byte & 0x7f)) << 7;
    }

    // the fourth byte carries a full eight bits
    let byte = u32::from(buffer.read_u8()?);
    Ok((result << 1) | byte)
}

/// Sign extend the 29 bit payload of an AMF3 integer.
pub(crate) const fn sign_extend(value: u32) -> i32 {
    ((value << 3) as i32) >> 3
}
