//! LZW encoding of the serialized field payload.
//!
//! The dictionary starts with the 256 single-byte strings (codes 0-255) and
//! gains one entry per miss. It lives only for the duration of one call and
//! is never capped, so a call costs O(n) extra memory for n input bytes.
//! Inputs are bounded by the maximum message length times the batch size,
//! which keeps that acceptable.

use crate::error::Error;
use fxhash::FxHashMap;

/// Separator between codes in the textual token stream.
pub const CODE_SEPARATOR: char = ',';

const FIRST_FREE_CODE: u32 = 256;

/// Encodes `text` and renders the codes as a comma-separated token stream.
///
/// ```
/// # use cloudpelican::compressor::encode;
/// assert_eq!(encode("TOBEORNOTTOBEORTOBEORNOT"),
///     "84,79,66,69,79,82,78,79,84,256,258,260,265,259,261,263");
/// ```
pub fn encode(text: &str) -> String {
    let codes = encode_codes(text.as_bytes());
    let mut out = String::with_capacity(codes.len() * 4);
    for (i, code) in codes.iter().enumerate() {
        if i > 0 {
            out.push(CODE_SEPARATOR);
        }
        out.push_str(&code.to_string());
    }
    out
}

/// Runs LZW over `input` and returns the emitted codes.
///
/// Phrases are keyed by `(prefix code, next byte)`, which is equivalent to
/// keying by the full phrase string since every prefix of a phrase is itself
/// in the dictionary.
pub fn encode_codes(input: &[u8]) -> Vec<u32> {
    let mut dictionary: FxHashMap<(u32, u8), u32> = FxHashMap::default();
    let mut next_code = FIRST_FREE_CODE;
    let mut codes = Vec::new();
    let mut current: Option<u32> = None;

    for &byte in input {
        current = match current {
            None => Some(byte as u32),
            Some(prefix) => match dictionary.get(&(prefix, byte)) {
                Some(&code) => Some(code),
                None => {
                    codes.push(prefix);
                    dictionary.insert((prefix, byte), next_code);
                    next_code += 1;
                    Some(byte as u32)
                }
            },
        };
    }

    if let Some(code) = current {
        codes.push(code);
    }
    codes
}

/// Inverse of [`encode`], for the collector side.
pub fn decode(stream: &str) -> Result<String, Error> {
    if stream.is_empty() {
        return Ok(String::new());
    }
    let codes = stream
        .split(CODE_SEPARATOR)
        .map(|c| {
            c.parse::<u32>()
                .map_err(|_| Error::code_stream(format!("'{c}' is not a code")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let bytes = decode_codes(&codes)?;
    String::from_utf8(bytes).map_err(|_| Error::code_stream("decoded payload is not UTF-8"))
}

/// Inverse of [`encode_codes`].
pub fn decode_codes(codes: &[u32]) -> Result<Vec<u8>, Error> {
    let mut dictionary: Vec<Vec<u8>> = (0..=255u8).map(|b| vec![b]).collect();
    let mut out = Vec::new();
    let mut previous: Option<Vec<u8>> = None;

    for &code in codes {
        let entry = match dictionary.get(code as usize) {
            Some(entry) => entry.clone(),
            // The cScSc case: the code being defined right now.
            None if code as usize == dictionary.len() => match &previous {
                Some(prev) => {
                    let mut entry = prev.clone();
                    entry.push(prev[0]);
                    entry
                }
                None => return Err(Error::code_stream("stream starts with an undefined code")),
            },
            None => return Err(Error::code_stream(format!("code {code} is not defined"))),
        };

        out.extend_from_slice(&entry);
        if let Some(mut prev) = previous.take() {
            prev.push(entry[0]);
            dictionary.push(prev);
        }
        previous = Some(entry);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_emits_nothing() {
        assert_eq!(encode(""), "");
        assert!(encode_codes(b"").is_empty());
        assert_eq!(decode("").unwrap(), "");
    }

    #[test]
    fn single_byte_is_its_own_code() {
        assert_eq!(encode("a"), "97");
    }

    #[test]
    fn repeated_run_builds_longer_phrases() {
        // a, aa, aaa, ... each new phrase is one longer than the last
        assert_eq!(encode_codes(b"aaaaaa"), vec![97, 256, 257]);
        assert_eq!(decode("97,256,257").unwrap(), "aaaaaa");
    }

    #[test]
    fn dictionary_is_rebuilt_per_call() {
        let first = encode("abababab");
        let second = encode("abababab");
        assert_eq!(first, second);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("97,x").is_err());
        assert!(decode("97,999").is_err());
        assert!(decode("256").is_err());
    }

    #[test]
    fn multibyte_text_survives() {
        let text = "h\u{e9}llo w\u{f6}rld h\u{e9}llo";
        assert_eq!(decode(&encode(text)).unwrap(), text);
    }
}
