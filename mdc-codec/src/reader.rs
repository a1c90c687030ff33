use crate::error::{CodecError, Result};
use num_bigint::{BigInt, Sign};

/// Cursor over an encoded byte slice with an optional cumulative read
/// budget. Exceeding the budget aborts the scan with `LimitExceeded`,
/// matching the original reader's configurable limit used to bound
/// untrusted input (e.g. a transaction's `data` payload).
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    limit: Option<u64>,
    read_total: u64,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            limit: None,
            read_total: 0,
        }
    }

    pub fn with_limit(buf: &'a [u8], limit: u64) -> Self {
        Self {
            buf,
            pos: 0,
            limit: Some(limit),
            read_total: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.read_total += n as u64;
        if let Some(limit) = self.limit {
            if self.read_total > limit {
                return Err(CodecError::LimitExceeded { limit });
            }
        }
        if self.remaining() < n {
            return Err(CodecError::CorruptData("truncated stream"));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    /// Fixed-width raw bytes with no length prefix; mirrors `Writer::write_fixed`.
    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        bytes
            .try_into()
            .map_err(|_| CodecError::CorruptData("fixed-width read length mismatch"))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub fn read_time(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    fn read_magnitude(&mut self, n: usize) -> Result<u64> {
        if n > 8 {
            return Err(CodecError::CorruptData("varint length exceeds 8 bytes"));
        }
        let bytes = self.take(n)?;
        let mut buf = [0u8; 8];
        buf[8 - n..].copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn read_varint(&mut self) -> Result<i64> {
        let head = self.read_u8()?;
        if head < 128 {
            return Ok(head as i64);
        }
        let negative = head & 0x40 != 0;
        let n = (head & 0x3f) as usize;
        let mag = self.read_magnitude(n)?;
        if negative {
            Ok(-(mag as i64))
        } else {
            Ok(mag as i64)
        }
    }

    pub fn read_varuint(&mut self) -> Result<u64> {
        let v = self.read_varint()?;
        if v < 0 {
            return Err(CodecError::CorruptData("expected non-negative varint"));
        }
        Ok(v as u64)
    }

    /// Mirrors `Writer::write_bigint`: header length nibble `0x3f` means the
    /// true length follows as a VarInt.
    pub fn read_bigint(&mut self) -> Result<BigInt> {
        let head = self.read_u8()?;
        if head == 0 {
            return Ok(BigInt::from(0));
        }
        if head < 128 {
            return Ok(BigInt::from(head));
        }
        let negative = head & 0x40 != 0;
        let mut len = (head & 0x3f) as usize;
        if len == 0x3f {
            len = self.read_varint()? as usize;
        }
        let bytes = self.take(len)?;
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Ok(BigInt::from_bytes_be(sign, bytes))
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_varuint()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| CodecError::CorruptData("invalid utf-8 string"))
    }

    pub fn read_slice<T, F: FnMut(&mut Self) -> Result<T>>(
        &mut self,
        mut decode_one: F,
    ) -> Result<Vec<T>> {
        let count = self.read_varuint()? as usize;
        let mut out = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            out.push(decode_one(self)?);
        }
        Ok(out)
    }

    /// A polymorphic object is framed as `Bytes`; an empty result means the
    /// object was `nil`.
    pub fn read_polymorphic(&mut self) -> Result<Vec<u8>> {
        self.read_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::Writer;

    #[test]
    fn limit_exceeded_aborts_scan() {
        let mut w = Writer::new();
        w.write_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let bytes = w.into_bytes();
        let mut r = Reader::with_limit(&bytes, 4);
        assert!(matches!(
            r.read_bytes(),
            Err(CodecError::LimitExceeded { limit: 4 })
        ));
    }

    #[test]
    fn corrupt_length_prefix_is_reported() {
        let bytes = [0x85, 0, 0]; // claims 5 length bytes, only 2 present
        let mut r = Reader::new(&bytes);
        assert!(r.read_varint().is_err());
    }
}
