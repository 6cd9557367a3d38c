// MIT License - Copyright (c) 2026 Peter Wright
// Wire framing: length, type, payload, checksum

use tracing::debug;

use crate::constants::{CRLF, FRAME_OVERHEAD, KEEPALIVE, RESERVED};
use crate::error::{AdemcoError, Result};
use crate::protocol::MessageType;

/// A validated inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Declared frame length (the `LL` field).
    pub length: usize,
    pub message_type: MessageType,
    /// Payload, `LL - 8` bytes starting after the type field.
    pub data: String,
}

/// Two's-complement of the byte sum modulo 256.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        .wrapping_neg()
}

/// Checksum rendered the way it appears on the wire (2 uppercase hex digits).
pub fn checksum_hex(body: &[u8]) -> String {
    format!("{:02X}", checksum(body))
}

/// Build a pre-checksum body from a 2-char type and a payload.
///
/// The length prefix covers the whole frame including the reserved field and
/// the checksum that [`encode_frame`] appends.
pub fn build_body(message_type: &str, data: &str) -> Result<String> {
    if message_type.len() != 2 || !message_type.is_ascii() {
        return Err(AdemcoError::malformed(format!(
            "message type must be 2 ASCII chars, got {:?}",
            message_type
        )));
    }
    let length = FRAME_OVERHEAD + data.len();
    if length > 0xFF {
        return Err(AdemcoError::malformed(format!(
            "payload of {} bytes does not fit the length field",
            data.len()
        )));
    }
    Ok(format!("{:02X}{}{}{}", length, message_type, data, RESERVED))
}

/// Append the checksum and terminator to a command body.
pub fn encode_frame(body: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(body.len() + 4);
    frame.extend_from_slice(body.as_bytes());
    frame.extend_from_slice(checksum_hex(body.as_bytes()).as_bytes());
    frame.extend_from_slice(CRLF);
    frame
}

/// Drop leading keep-alive markers and the trailing line terminator.
pub fn strip_line(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|&b| b != KEEPALIVE)
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(start, |i| i + 1)
        .max(start);
    &line[start..end]
}

/// Decode one raw inbound line.
///
/// Returns `Ok(None)` for lines that carry nothing (bare keep-alives, blank
/// lines). Checksum and structural problems are returned as protocol errors.
pub fn decode_frame(line: &[u8]) -> Result<Option<Frame>> {
    let line = strip_line(line);
    if line.is_empty() {
        return Ok(None);
    }
    if !line.is_ascii() {
        return Err(AdemcoError::malformed(format!(
            "non-ASCII bytes in {:?}",
            String::from_utf8_lossy(line)
        )));
    }
    let text = std::str::from_utf8(line)
        .map_err(|e| AdemcoError::malformed(format!("invalid text: {}", e)))?;

    if text.len() < 6 {
        return Err(AdemcoError::malformed(format!("frame too short: {:?}", text)));
    }

    let (body, received) = text.split_at(text.len() - 2);
    let expected = checksum_hex(body.as_bytes());
    if received != expected {
        return Err(AdemcoError::ChecksumMismatch {
            frame: text.to_string(),
            expected,
            received: received.to_string(),
        });
    }

    let length = usize::from_str_radix(&body[0..2], 16)
        .map_err(|_| AdemcoError::malformed(format!("bad length field in {:?}", text)))?;
    let data_len = length.checked_sub(FRAME_OVERHEAD).ok_or_else(|| {
        AdemcoError::malformed(format!("declared length {} below frame overhead", length))
    })?;

    let message_type = MessageType::from_code(&body[2..4]);
    let end = (4 + data_len).min(body.len());
    let data = body[4..end].to_string();

    debug!("Decoded {} frame, payload {:?}", message_type, data);

    Ok(Some(Frame {
        length,
        message_type,
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Small deterministic generator for printable ASCII payloads.
    fn payloads(count: usize) -> Vec<String> {
        let mut seed: u32 = 0x2545_F491;
        let mut out = Vec::with_capacity(count);
        for n in 0..count {
            let len = n % 41;
            let mut s = String::with_capacity(len);
            for _ in 0..len {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let c = 0x20 + ((seed >> 16) % 95) as u8;
                s.push(c as char);
            }
            out.push(s);
        }
        out
    }

    #[test]
    fn test_checksum_known_values() {
        assert_eq!(checksum_hex(b"08zs00"), "4B");
        assert_eq!(checksum_hex(b"0CZS1000"), "1F");
        assert_eq!(checksum_hex(b"0Acn0100"), "FD");
    }

    #[test]
    fn test_checksum_of_zero_sum_is_zero() {
        // 0x80 + 0x80 = 256 -> 0
        assert_eq!(checksum(&[0x80, 0x80]), 0);
        assert_eq!(checksum_hex(b""), "00");
    }

    #[test]
    fn test_checksum_is_unsigned_negation() {
        // sum 437 -> 181 mod 256 -> 256 - 181 = 75
        assert_eq!(checksum(b"08zs00"), 75);
        assert_eq!(checksum(&[1]), 0xFF);
    }

    #[test]
    fn test_build_body() {
        assert_eq!(build_body("zs", "").unwrap(), "08zs00");
        assert_eq!(build_body("cn", "01").unwrap(), "0Acn0100");
        assert!(build_body("z", "").is_err());
        assert!(build_body("zs", &"x".repeat(248)).is_err());
    }

    #[test]
    fn test_encode_frame() {
        assert_eq!(encode_frame("08zs00"), b"08zs004B\r\n".to_vec());
    }

    #[test]
    fn test_decode_zone_status_report() {
        let frame = decode_frame(b"0CZS10001F\r\n").unwrap().unwrap();
        assert_eq!(frame.length, 12);
        assert_eq!(frame.message_type, MessageType::ZoneStatus);
        assert_eq!(frame.data, "1000");
    }

    #[test]
    fn test_decode_strips_keepalive_markers() {
        let frame = decode_frame(b"PPP0CZS10001F\r\n").unwrap().unwrap();
        assert_eq!(frame.data, "1000");
    }

    #[test]
    fn test_decode_silently_skips_empty_lines() {
        assert!(decode_frame(b"P").unwrap().is_none());
        assert!(decode_frame(b"PPPP\r\n").unwrap().is_none());
        assert!(decode_frame(b"\r\n").unwrap().is_none());
        assert!(decode_frame(b"").unwrap().is_none());
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let err = decode_frame(b"0CZS10001E\r\n").unwrap_err();
        match err {
            AdemcoError::ChecksumMismatch {
                expected, received, ..
            } => {
                assert_eq!(expected, "1F");
                assert_eq!(received, "1E");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_rejects_lowercase_checksum() {
        let err = decode_frame(b"08zs004b\r\n").unwrap_err();
        assert!(matches!(err, AdemcoError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_decode_rejects_short_and_undersized_frames() {
        assert!(matches!(
            decode_frame(b"0Z\r\n").unwrap_err(),
            AdemcoError::MalformedFrame { .. }
        ));
        // declared length 4 is below the 8-byte overhead
        let body = "04OK";
        let line = encode_frame(body);
        assert!(matches!(
            decode_frame(&line).unwrap_err(),
            AdemcoError::MalformedFrame { .. }
        ));
    }

    #[test]
    fn test_decode_rejects_non_ascii() {
        let err = decode_frame(b"0CZS1\xff001F\r\n").unwrap_err();
        assert!(matches!(err, AdemcoError::MalformedFrame { .. }));
    }

    #[test]
    fn test_decode_unknown_type_is_not_an_error() {
        let line = encode_frame(&build_body("XX", "abc").unwrap());
        let frame = decode_frame(&line).unwrap().unwrap();
        assert_eq!(frame.message_type, MessageType::Unknown("XX".to_string()));
        assert_eq!(frame.data, "abc");
    }

    #[test]
    fn test_payload_clamped_to_body() {
        // declared length 0x20 but only 4 payload bytes present
        let line = encode_frame("20ZS1000");
        let frame = decode_frame(&line).unwrap().unwrap();
        assert_eq!(frame.data, "1000");
    }

    #[test]
    fn test_payload_round_trips() {
        for payload in payloads(300) {
            let body = build_body("ZS", &payload).unwrap();
            let frame = decode_frame(&encode_frame(&body)).unwrap().unwrap();
            assert_eq!(frame.data, payload, "body {:?}", body);
            assert_eq!(frame.length, body.len() + 2);
        }
    }

    #[test]
    fn test_single_corrupted_byte_fails_checksum() {
        for payload in payloads(25) {
            let mut line = encode_frame(&build_body("ZS", &payload).unwrap());
            line.truncate(line.len() - 2);
            for pos in 0..line.len() {
                let original = line[pos];
                for replacement in 0x20u8..0x7F {
                    if replacement == original {
                        continue;
                    }
                    let mut corrupted = line.clone();
                    corrupted[pos] = replacement;
                    assert!(
                        decode_frame(&corrupted).is_err(),
                        "corruption at {} to {:?} accepted in {:?}",
                        pos,
                        replacement as char,
                        String::from_utf8_lossy(&line)
                    );
                }
            }
        }
    }
}
