//! Base64 VLQ codec used by the `mappings` field

use crate::SourceMapError;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const CONTINUATION: i64 = 0b10_0000;
const DIGIT_MASK: i64 = 0b01_1111;

/// Appends the VLQ encoding of `value` to `out`.
pub fn encode(value: i64, out: &mut String) {
    let mut vlq = if value < 0 { (-value << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = vlq & DIGIT_MASK;
        vlq >>= 5;
        if vlq > 0 {
            digit |= CONTINUATION;
        }
        out.push(BASE64[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Decodes every value of one mapping segment (the text between commas).
pub fn decode_segment(segment: &str) -> Result<Vec<i64>, SourceMapError> {
    let mut values = Vec::with_capacity(5);
    let mut value = 0i64;
    let mut shift = 0u32;
    let mut pending = false;

    for ch in segment.chars() {
        let digit = base64_value(ch).ok_or(SourceMapError::InvalidBase64(ch))?;
        if shift > 60 {
            return Err(SourceMapError::TruncatedVlq);
        }
        value |= (digit & DIGIT_MASK) << shift;
        if digit & CONTINUATION != 0 {
            shift += 5;
            pending = true;
            continue;
        }
        let negative = value & 1 == 1;
        let magnitude = value >> 1;
        values.push(if negative { -magnitude } else { magnitude });
        value = 0;
        shift = 0;
        pending = false;
    }

    if pending {
        return Err(SourceMapError::TruncatedVlq);
    }
    Ok(values)
}

fn base64_value(ch: char) -> Option<i64> {
    let value = match ch {
        'A'..='Z' => ch as u8 - b'A',
        'a'..='z' => ch as u8 - b'a' + 26,
        '0'..='9' => ch as u8 - b'0' + 52,
        '+' => 62,
        '/' => 63,
        _ => return None,
    };
    Some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: i64) -> String {
        let mut out = String::new();
        encode(value, &mut out);
        out
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encoded(0), "A");
        assert_eq!(encoded(1), "C");
        assert_eq!(encoded(-1), "D");
        assert_eq!(encoded(15), "e");
        assert_eq!(encoded(16), "gB");
        assert_eq!(encoded(-17), "jB");
        assert_eq!(encoded(123), "2H");
    }

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("AAgBC").unwrap(), vec![0, 0, 16, 1]);
        assert_eq!(decode_segment("2HjBD").unwrap(), vec![123, -17, -1]);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(decode_segment("A*"), Err(SourceMapError::InvalidBase64('*'))));
        assert!(matches!(decode_segment("g"), Err(SourceMapError::TruncatedVlq)));
    }
}
