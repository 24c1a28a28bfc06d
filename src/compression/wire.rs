//! Byte-level wire helpers for the compression codecs
//!
//! All multi-byte integers are big-endian. BigInt values travel as
//! sign + magnitude: `[sign u8][mag_len u32][magnitude bytes]`, where
//! sign is 0 for non-negative and 1 for negative, and zero encodes with
//! an empty magnitude. This keeps `put_bigint`/`read_bigint` exact
//! inverses for every signed value, which the DELTA strategy relies on.

use num_bigint::{BigInt, Sign};

pub fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn put_bigint(buf: &mut Vec<u8>, value: &BigInt) {
    let (sign, mag) = value.to_bytes_be();
    buf.push(if sign == Sign::Minus { 1 } else { 0 });
    if sign == Sign::NoSign {
        put_u32(buf, 0);
    } else {
        put_u32(buf, mag.len() as u32);
        buf.extend_from_slice(&mag);
    }
}

/// Encoded size of one BigInt, used for uncompressed-size estimates.
pub fn bigint_wire_len(value: &BigInt) -> usize {
    let (sign, mag) = value.to_bytes_be();
    1 + 4 + if sign == Sign::NoSign { 0 } else { mag.len() }
}

/// Forward-only reader over an untrusted byte slice. Every accessor
/// returns `None` on underflow instead of panicking.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    pub fn u16(&mut self) -> Option<u16> {
        let bytes = self.take(2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }

    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    pub fn bigint(&mut self) -> Option<BigInt> {
        let sign_byte = self.u8()?;
        if sign_byte > 1 {
            return None;
        }
        let len = self.u32()? as usize;
        let mag = self.take(len)?;
        if mag.is_empty() {
            return Some(BigInt::from(0));
        }
        let sign = if sign_byte == 1 { Sign::Minus } else { Sign::Plus };
        Some(BigInt::from_bytes_be(sign, mag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bigint_round_trip() {
        let values = [
            BigInt::from(0),
            BigInt::from(1),
            BigInt::from(-1),
            BigInt::from(255),
            BigInt::from(-256),
            BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap(),
            -BigInt::parse_bytes(b"987654321098765432109876543210", 10).unwrap(),
        ];
        for v in &values {
            let mut buf = Vec::new();
            put_bigint(&mut buf, v);
            assert_eq!(buf.len(), bigint_wire_len(v));
            let mut r = Reader::new(&buf);
            assert_eq!(r.bigint().unwrap(), *v);
            assert_eq!(r.remaining(), 0);
        }
    }

    #[test]
    fn test_reader_underflow() {
        let mut r = Reader::new(&[0x01, 0x02]);
        assert_eq!(r.u32(), None);
        assert_eq!(r.u16(), Some(0x0102));
        assert_eq!(r.u8(), None);
    }

    #[test]
    fn test_truncated_bigint() {
        let mut buf = Vec::new();
        put_bigint(&mut buf, &BigInt::from(123456));
        buf.truncate(buf.len() - 1);
        let mut r = Reader::new(&buf);
        assert_eq!(r.bigint(), None);
    }

    #[test]
    fn test_bad_sign_byte() {
        let mut r = Reader::new(&[7, 0, 0, 0, 1, 42]);
        assert_eq!(r.bigint(), None);
    }
}
