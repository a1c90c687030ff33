//! `TextAddressCodec` capability (spec §3, §6, C11): versioned address with
//! an optional memo and a checksum, base58-encoded with an `"MDC"` prefix.
//! A legacy 34-character format (no prefix, no memo) is accepted on decode.

use crate::error::AddressCodecError;
use sha2::{Digest, Sha256};

const PREFIX: &str = "MDC";
const VERSION: u8 = 1;

fn double_sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

/// Big-endian encoding of `memo`, with leading zero bytes trimmed; `memo ==
/// 0` trims to an empty slice.
fn memo_bytes(memo: u64) -> Vec<u8> {
    let be = memo.to_be_bytes();
    let first_nonzero = be.iter().position(|&b| b != 0);
    match first_nonzero {
        Some(i) => be[i..].to_vec(),
        None => Vec::new(),
    }
}

fn memo_from_trimmed(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    if bytes.len() > 8 {
        return 0;
    }
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

/// Encode a 20-byte address (with optional memo) as `"MDC" ‖
/// base58(version ‖ addr20 ‖ memoTrimmedBE ‖ checksum3)`.
pub fn encode_address(addr: &[u8; 20], memo: u64) -> String {
    let memo_be = memo_bytes(memo);
    let mut body = Vec::with_capacity(1 + 20 + memo_be.len());
    body.push(VERSION);
    body.extend_from_slice(addr);
    body.extend_from_slice(&memo_be);

    let mut prefixed = Vec::with_capacity(PREFIX.len() + body.len());
    prefixed.extend_from_slice(PREFIX.as_bytes());
    prefixed.extend_from_slice(&body);
    let checksum = double_sha256(&prefixed);

    let mut full = body;
    full.extend_from_slice(&checksum[0..3]);

    format!("{PREFIX}{}", bs58::encode(full).into_string())
}

/// Decode either the current `"MDC"`-prefixed format or the legacy 34-char
/// format (`base58(version ‖ addr20 ‖ checksum4)`, memo always 0).
pub fn decode_address(text: &str) -> Result<([u8; 20], u64), AddressCodecError> {
    if let Some(rest) = text.strip_prefix(PREFIX) {
        return decode_current(rest);
    }
    decode_legacy(text)
}

fn decode_current(body_b58: &str) -> Result<([u8; 20], u64), AddressCodecError> {
    let raw = bs58::decode(body_b58)
        .into_vec()
        .map_err(|_| AddressCodecError::InvalidEncoding)?;
    if raw.len() < 1 + 20 + 3 {
        return Err(AddressCodecError::BadLength);
    }
    let (body, checksum) = raw.split_at(raw.len() - 3);
    let version = body[0];
    if version != VERSION {
        return Err(AddressCodecError::UnsupportedVersion(version));
    }
    let addr_bytes = &body[1..21];
    let memo_be = &body[21..];
    if memo_be.len() > 8 {
        return Err(AddressCodecError::BadLength);
    }

    let mut prefixed = Vec::with_capacity(PREFIX.len() + body.len());
    prefixed.extend_from_slice(PREFIX.as_bytes());
    prefixed.extend_from_slice(body);
    let expected = double_sha256(&prefixed);
    if &expected[0..3] != checksum {
        return Err(AddressCodecError::BadChecksum);
    }

    let mut addr = [0u8; 20];
    addr.copy_from_slice(addr_bytes);
    Ok((addr, memo_from_trimmed(memo_be)))
}

fn decode_legacy(text: &str) -> Result<([u8; 20], u64), AddressCodecError> {
    let raw = bs58::decode(text)
        .into_vec()
        .map_err(|_| AddressCodecError::InvalidEncoding)?;
    if raw.len() != 1 + 20 + 4 {
        return Err(AddressCodecError::BadLength);
    }
    let (body, checksum) = raw.split_at(21);
    let version = body[0];
    if version != VERSION {
        return Err(AddressCodecError::UnsupportedVersion(version));
    }
    let expected = double_sha256(body);
    if &expected[0..4] != checksum {
        return Err(AddressCodecError::BadChecksum);
    }
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&body[1..21]);
    Ok((addr, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_round_trips_with_memo() {
        let addr = [7u8; 20];
        let text = encode_address(&addr, 42);
        assert!(text.starts_with("MDC"));
        let (decoded_addr, memo) = decode_address(&text).unwrap();
        assert_eq!(decoded_addr, addr);
        assert_eq!(memo, 42);
    }

    #[test]
    fn encode_then_decode_round_trips_without_memo() {
        let addr = [9u8; 20];
        let text = encode_address(&addr, 0);
        let (decoded_addr, memo) = decode_address(&text).unwrap();
        assert_eq!(decoded_addr, addr);
        assert_eq!(memo, 0);
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let addr = [1u8; 20];
        let mut text = encode_address(&addr, 0);
        text.push('1'); // perturb the base58 tail
        assert!(decode_address(&text).is_err());
    }

    #[test]
    fn legacy_format_decodes_with_zero_memo() {
        let addr = [3u8; 20];
        let mut body = vec![VERSION];
        body.extend_from_slice(&addr);
        let checksum = double_sha256(&body);
        let mut full = body;
        full.extend_from_slice(&checksum[0..4]);
        let legacy_text = bs58::encode(full).into_string();

        let (decoded_addr, memo) = decode_address(&legacy_text).unwrap();
        assert_eq!(decoded_addr, addr);
        assert_eq!(memo, 0);
    }
}
