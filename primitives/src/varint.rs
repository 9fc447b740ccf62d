//! Bitcoin compact-size integers.
//!
//! ```text
//! < 0xfd        value itself (1 byte)
//! 0xfd  + u16   (3 bytes)
//! 0xfe  + u32   (5 bytes)
//! 0xff  + u64   (9 bytes)
//! ```
//!
//! Used for transaction, input, output and witness item counts and for
//! script lengths.

use alloc::vec::Vec;
use crate::codec::ByteReader;
use crate::error::{CodecError, CodecResult};

/// Read one VarInt.
///
/// Fails only if the input ends before the follow-up bytes the prefix asks
/// for. Non-minimal encodings are accepted as they appear on chain.
pub fn read_varint(r: &mut ByteReader<'_>) -> CodecResult<u64> {
    let start = r.position();
    let prefix = r.read_u8()?;
    let value = match prefix {
        0xff => r.read_u64_le(),
        0xfe => r.read_u32_le().map(u64::from),
        0xfd => r.read_u16_le().map(u64::from),
        _ => return Ok(u64::from(prefix)),
    };
    // report the failure at the prefix so callers see where the integer began
    value.map_err(|err| match err {
        CodecError::UnexpectedEnd { needed, .. } => CodecError::UnexpectedEnd {
            offset: start,
            needed,
        },
        other => other,
    })
}

/// Read a VarInt that is used as a length or count.
pub fn read_varint_len(r: &mut ByteReader<'_>) -> CodecResult<usize> {
    let offset = r.position();
    let value = read_varint(r)?;
    usize::try_from(value).map_err(|_| CodecError::LengthOverflow { offset })
}

/// Read a VarInt-prefixed byte string.
pub fn read_varint_bytes<'a>(r: &mut ByteReader<'a>) -> CodecResult<&'a [u8]> {
    let len = read_varint_len(r)?;
    r.read_bytes(len)
}

/// Number of bytes the shortest encoding of `value` takes.
pub fn varint_len(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Append the shortest encoding of `value`.
pub fn encode_varint(value: u64, buf: &mut Vec<u8>) {
    match varint_len(value) {
        1 => buf.push(value as u8),
        3 => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        5 => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Append a VarInt length prefix followed by `data`.
pub fn encode_varint_bytes(data: &[u8], buf: &mut Vec<u8>) {
    encode_varint(data.len() as u64, buf);
    buf.extend_from_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        buf
    }

    #[test]
    fn test_encodes_a_u8_varint() {
        assert_eq!(encoded(12), vec![12]);
        assert_eq!(encoded(0xfc), vec![0xfc]);
    }

    #[test]
    fn test_encodes_a_u16_varint() {
        assert_eq!(encoded(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(encoded(0xffff), vec![0xfd, 0xff, 0xff]);
    }

    #[test]
    fn test_encodes_a_u32_varint() {
        assert_eq!(encoded(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(encoded(0xffff_ffff), vec![0xfe, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_encodes_a_u64_varint() {
        assert_eq!(
            encoded(0xffff_ffff + 1),
            vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_decode_boundaries() {
        for value in [0, 1, 0xfc, 0xfd, 0xfffe, 0xffff, 0x1_0000, 0xffff_ffff, 0x1_0000_0000, u64::MAX] {
            let buf = encoded(value);
            assert_eq!(buf.len(), varint_len(value));
            let mut r = ByteReader::new(&buf);
            assert_eq!(read_varint(&mut r).unwrap(), value, "value {:#x}", value);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn test_decode_accepts_non_minimal() {
        let data = [0xfd, 0x05, 0x00];
        let mut r = ByteReader::new(&data);
        assert_eq!(read_varint(&mut r).unwrap(), 5);
    }

    #[test]
    fn test_truncated_follow_up_bytes() {
        let data = [0x00, 0xfe, 0x01, 0x02];
        let mut r = ByteReader::new(&data);
        assert_eq!(read_varint(&mut r).unwrap(), 0);
        let err = read_varint(&mut r).unwrap_err();
        assert_eq!(err, CodecError::UnexpectedEnd { offset: 1, needed: 2 });
    }

    #[test]
    fn test_empty_input() {
        let mut r = ByteReader::new(&[]);
        assert!(matches!(
            read_varint(&mut r),
            Err(CodecError::UnexpectedEnd { offset: 0, needed: 1 })
        ));
    }

    #[test]
    fn test_varint_bytes() {
        let mut buf = Vec::new();
        encode_varint_bytes(b"script", &mut buf);
        buf.push(0x99);
        let mut r = ByteReader::new(&buf);
        assert_eq!(read_varint_bytes(&mut r).unwrap(), b"script");
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn test_varint_bytes_declared_past_end() {
        let data = [0x05, 0x01, 0x02];
        let mut r = ByteReader::new(&data);
        assert!(matches!(
            read_varint_bytes(&mut r),
            Err(CodecError::UnexpectedEnd { offset: 1, needed: 3 })
        ));
    }
}
