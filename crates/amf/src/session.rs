use bytes_util::{CursorBuffer, Endianness};

/// Buffer state captured at the start of a top-level encode or decode.
///
/// AMF is always network order, so the buffer is switched to big-endian for
/// the duration of the call. A failed call moves the position back and drops
/// any bytes it appended. Bytes it overwrote in place are not restored.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    position: usize,
    len: usize,
    endianness: Endianness,
}

impl Checkpoint {
    pub(crate) fn enter(buffer: &mut CursorBuffer) -> Self {
        let checkpoint = Self {
            position: buffer.position(),
            len: buffer.len(),
            endianness: buffer.endianness(),
        };
        buffer.set_endianness(Endianness::Big);
        checkpoint
    }

    pub(crate) fn leave<T, E>(self, buffer: &mut CursorBuffer, result: Result<T, E>) -> Result<T, E> {
        buffer.set_endianness(self.endianness);

        if result.is_err() {
            if buffer.len() > self.len {
                // shrinking never exceeds the capacity
                buffer.set_len(self.len).ok();
            }
            buffer.set_position(self.position).ok();
        }

        result
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_on_error() {
        let mut buffer = CursorBuffer::new();
        buffer.set_endianness(Endianness::Little);
        buffer.write_u8(1).unwrap();

        let checkpoint = Checkpoint::enter(&mut buffer);
        assert_eq!(buffer.endianness(), Endianness::Big);
        buffer.write_u32(7).unwrap();

        let result: Result<(), ()> = checkpoint.leave(&mut buffer, Err(()));
        assert!(result.is_err());
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.position(), 1);
        assert_eq!(buffer.endianness(), Endianness::Little);
    }

    #[test]
    fn test_keep_on_success() {
        let mut buffer = CursorBuffer::new();

        let checkpoint = Checkpoint::enter(&mut buffer);
        buffer.write_u16(0x0102).unwrap();
        let result: Result<(), ()> = checkpoint.leave(&mut buffer, Ok(()));

        assert!(result.is_ok());
        assert_eq!(buffer.as_bytes(), &[0x01, 0x02]);
    }
}
