use num_bigint::{BigInt, Sign};
use sha2::{Digest, Sha256};

/// Destination for encoded bytes. Implemented both by a plain buffer (for
/// on-disk/on-wire encoding) and by a running hasher (so that `Hash256` can
/// stream values straight into SHA-256 without materializing the
/// intermediate encoding), mirroring the original `bin.Writer`'s use as both
/// a byte sink and, via `hash.go`, a digest input.
pub trait Sink {
    fn push(&mut self, bytes: &[u8]);
}

impl Sink for Vec<u8> {
    fn push(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl Sink for Sha256 {
    fn push(&mut self, bytes: &[u8]) {
        Digest::update(self, bytes);
    }
}

/// Tag-less, order-dependent binary writer.
pub struct Writer<S: Sink> {
    sink: S,
}

impl Writer<Vec<u8>> {
    pub fn new() -> Self {
        Self { sink: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.sink
    }
}

impl Default for Writer<Vec<u8>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sink> Writer<S> {
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.sink.push(bytes);
    }

    pub fn write_nil(&mut self) {
        self.raw(&[0]);
    }

    /// Fixed-width raw bytes with no length prefix, for callers that already
    /// know the size on both ends (addresses, hashes, public keys).
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.raw(bytes);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.raw(&[v as u8]);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.raw(&[v]);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.raw(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.raw(&v.to_be_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.raw(&v.to_be_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Unix time in nanoseconds, big-endian fixed width.
    pub fn write_time(&mut self, unix_nanos: i64) {
        self.write_u64(unix_nanos as u64);
    }

    /// Signed VarInt: `0 <= v < 128` is one byte; otherwise a header byte
    /// `0x80 | (sign ? 0x40 : 0) | n` followed by `n` big-endian magnitude
    /// bytes, `n` the minimal byte length (1..=8).
    pub fn write_varint(&mut self, v: i64) {
        if (0..128).contains(&v) {
            self.raw(&[v as u8]);
            return;
        }
        let negative = v < 0;
        let mag = if negative {
            (v as i128).unsigned_abs() as u64
        } else {
            v as u64
        };
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&mag.to_be_bytes());
        let mut n = 8usize;
        while n > 1 && buf[8 - n] == 0 {
            n -= 1;
        }
        let mut header = 0x80u8;
        if negative {
            header |= 0x40;
        }
        header |= n as u8;
        self.raw(&[header]);
        self.raw(&buf[8 - n..]);
    }

    /// Arbitrary-precision integer. Zero encodes to a single `0x00`. The
    /// header's length nibble may be `0x3f`, signalling that the true byte
    /// length follows as a VarInt (for magnitudes >= 63 bytes).
    pub fn write_bigint(&mut self, v: &BigInt) {
        if v.sign() == Sign::NoSign {
            self.raw(&[0]);
            return;
        }
        let (sign, mag) = v.to_bytes_be();
        // A single positive byte < 128 collapses to the VarInt fast path,
        // matching the original `WriteBigInt`'s `n == 1 && b[0] < 128` case.
        if sign == Sign::Plus && mag.len() == 1 && mag[0] < 128 {
            self.raw(&mag);
            return;
        }
        let mut header = 0x80u8;
        if sign == Sign::Minus {
            header |= 0x40;
        }
        if mag.len() < 0x3f {
            header |= mag.len() as u8;
        } else {
            header |= 0x3f;
        }
        self.raw(&[header]);
        if mag.len() >= 0x3f {
            self.write_varint(mag.len() as i64);
        }
        self.raw(&mag);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as i64);
        self.raw(bytes);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn write_slice<T, F: FnMut(&mut Self, &T)>(&mut self, items: &[T], mut encode_one: F) {
        self.write_varint(items.len() as i64);
        for item in items {
            encode_one(self, item);
        }
    }

    /// A polymorphic object writes its own byte sequence framed as `Bytes`;
    /// `None` encodes identically to an empty-byte `Bytes`.
    pub fn write_polymorphic(&mut self, encoded: Option<&[u8]>) {
        self.write_bytes(encoded.unwrap_or(&[]));
    }
}

/// `Hash256(v1..vn) = SHA256(encode(v1) ‖ .. ‖ encode(vn))`.
pub fn hash256<F: FnOnce(&mut Writer<Sha256>)>(encode: F) -> [u8; 32] {
    let mut w = Writer::with_sink(Sha256::new());
    encode(&mut w);
    w.into_sink().finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    #[test]
    fn varint_small_is_one_byte() {
        let mut w = Writer::new();
        w.write_varint(42);
        assert_eq!(w.into_bytes(), vec![42]);
    }

    #[test]
    fn varint_roundtrip_negative() {
        let mut w = Writer::new();
        w.write_varint(-300);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_varint().unwrap(), -300);
    }

    #[test]
    fn bigint_zero_is_single_zero_byte() {
        let mut w = Writer::new();
        w.write_bigint(&BigInt::from(0));
        assert_eq!(w.into_bytes(), vec![0]);
    }

    #[test]
    fn bigint_roundtrip_large() {
        let v = BigInt::from(10).pow(40);
        let mut w = Writer::new();
        w.write_bigint(&v);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_bigint().unwrap(), v);
    }

    #[test]
    fn bytes_empty_is_single_zero_byte() {
        let mut w = Writer::new();
        w.write_bytes(&[]);
        assert_eq!(w.into_bytes(), vec![0]);
    }
}
