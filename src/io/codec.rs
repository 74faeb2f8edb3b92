//! Text codecs for reading sources and writing output.
//!
//! `utf-8`, `ascii` and `latin-1` are handled strictly in-house; every other
//! WHATWG label (`shift_jis`, `cp1252`, `euc-jp`, ...) goes through
//! `encoding_rs`. Error messages follow the familiar
//! `'<codec>' codec can't decode ...` wording so that users see which byte or
//! character broke a run.
use std::str::FromStr;

use encoding_rs::{DecoderResult, Encoding, EncoderResult, REPLACEMENT, UTF_8};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Codec {
    #[default]
    Utf8,
    Ascii,
    Latin1,
    /// Any other codec `encoding_rs` can both decode and encode.
    Legacy(&'static Encoding),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown encoding: {0}")]
pub struct UnknownCodec(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{codec}' codec can't decode {span}: {reason}")]
pub struct DecodeError {
    pub codec: &'static str,
    span: String,
    reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{codec}' codec can't encode {span}: {reason}")]
pub struct EncodeError {
    pub codec: &'static str,
    span: String,
    reason: String,
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<Codec> for String {
    fn from(codec: Codec) -> Self {
        codec.name().to_string()
    }
}

impl TryFrom<String> for Codec {
    type Error = UnknownCodec;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Codec {
    type Err = UnknownCodec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        let normalized = label.to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" | "u8" | "utf" => return Ok(Codec::Utf8),
            "ascii" | "us-ascii" | "646" | "ansi-x3.4-1968" => return Ok(Codec::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "8859" | "cp819" | "l1" => {
                return Ok(Codec::Latin1);
            }
            _ => {}
        }
        let encoding = Encoding::for_label(label.as_bytes())
            .or_else(|| Encoding::for_label(normalized.as_bytes()))
            .ok_or_else(|| UnknownCodec(s.to_string()))?;
        if encoding == UTF_8 {
            Ok(Codec::Utf8)
        } else if encoding == REPLACEMENT || encoding.output_encoding() != encoding {
            // decode-only labels (utf-16, iso-2022-kr) cannot write output
            Err(UnknownCodec(s.to_string()))
        } else {
            Ok(Codec::Legacy(encoding))
        }
    }
}

impl Codec {
    pub fn name(self) -> &'static str {
        match self {
            Codec::Utf8 => "utf-8",
            Codec::Ascii => "ascii",
            Codec::Latin1 => "latin-1",
            Codec::Legacy(encoding) => encoding.name(),
        }
    }

    /// Codec named by the locale environment, falling back to UTF-8.
    pub fn preferred() -> Self {
        ["LC_ALL", "LC_CTYPE", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.is_empty())
            .and_then(|locale| Codec::from_locale(&locale))
            .unwrap_or_default()
    }

    /// Codeset of a locale string such as `en_US.UTF-8` or `de_DE.ISO-8859-1@euro`.
    pub fn from_locale(locale: &str) -> Option<Self> {
        let (_, codeset) = locale.split_once('.')?;
        let codeset = codeset.split('@').next().unwrap_or(codeset);
        codeset.parse().ok()
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            Codec::Utf8 => match std::str::from_utf8(bytes) {
                Ok(text) => Ok(text.to_string()),
                Err(err) => Err(utf8_error(bytes, err)),
            },
            Codec::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
                Some(position) => Err(DecodeError {
                    codec: self.name(),
                    span: byte_span(bytes, position, position + 1),
                    reason: "ordinal not in range(128)".to_string(),
                }),
            },
            Codec::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Codec::Legacy(encoding) => decode_legacy(encoding, bytes),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodeError> {
        let limit = match self {
            Codec::Utf8 => return Ok(text.as_bytes().to_vec()),
            Codec::Ascii => 0x80,
            Codec::Latin1 => 0x100,
            Codec::Legacy(encoding) => return encode_legacy(encoding, text),
        };
        let mut bytes = Vec::with_capacity(text.len());
        for (offset, c) in text.char_indices() {
            let code = u32::from(c);
            if code >= limit {
                return Err(EncodeError {
                    codec: self.name(),
                    span: char_span(text, offset, |next| u32::from(next) < limit),
                    reason: format!("ordinal not in range({limit})"),
                });
            }
            // `code` fits a byte here
            bytes.push(code as u8);
        }
        Ok(bytes)
    }
}

fn decode_legacy(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, DecodeError> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len());
    let mut text = String::with_capacity(capacity);
    let mut consumed = 0;
    loop {
        let (result, read) =
            decoder.decode_to_string_without_replacement(&bytes[consumed..], &mut text, true);
        consumed += read;
        match result {
            DecoderResult::InputEmpty => return Ok(text),
            DecoderResult::OutputFull => {
                let rest = bytes.len() - consumed;
                let more = decoder
                    .max_utf8_buffer_length_without_replacement(rest)
                    .unwrap_or(rest);
                text.reserve(more.max(4));
            }
            DecoderResult::Malformed(bad, extra) => {
                let end = consumed - usize::from(extra);
                let start = end.saturating_sub(usize::from(bad));
                return Err(DecodeError {
                    codec: encoding.name(),
                    span: byte_span(bytes, start, end.max(start + 1)),
                    reason: legacy_reason(encoding).to_string(),
                });
            }
        }
    }
}

fn encode_legacy(encoding: &'static Encoding, text: &str) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = encoding.new_encoder();
    let capacity = encoder
        .max_buffer_length_from_utf8_without_replacement(text.len())
        .unwrap_or(text.len());
    let mut bytes = Vec::with_capacity(capacity);
    let mut consumed = 0;
    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(&text[consumed..], &mut bytes, true);
        consumed += read;
        match result {
            EncoderResult::InputEmpty => return Ok(bytes),
            EncoderResult::OutputFull => {
                let rest = text.len() - consumed;
                let more = encoder
                    .max_buffer_length_from_utf8_without_replacement(rest)
                    .unwrap_or(rest);
                bytes.reserve(more.max(8));
            }
            EncoderResult::Unmappable(c) => {
                let offset = consumed - c.len_utf8();
                return Err(EncodeError {
                    codec: encoding.name(),
                    span: char_span(text, offset, |next| encodes(encoding, next)),
                    reason: legacy_reason(encoding).to_string(),
                });
            }
        }
    }
}

/// Whether `encoding` has a mapping for `c` on its own.
fn encodes(encoding: &'static Encoding, c: char) -> bool {
    let mut buf = [0u8; 4];
    let mut out = Vec::with_capacity(16);
    let (result, _) = encoding.new_encoder().encode_from_utf8_to_vec_without_replacement(
        c.encode_utf8(&mut buf),
        &mut out,
        true,
    );
    !matches!(result, EncoderResult::Unmappable(_))
}

fn legacy_reason(encoding: &'static Encoding) -> &'static str {
    if encoding.is_single_byte() {
        "character maps to <undefined>"
    } else {
        "illegal multibyte sequence"
    }
}

/// `byte 0x.. in position N` or `bytes in position N-M` for `bytes[start..end]`.
fn byte_span(bytes: &[u8], start: usize, end: usize) -> String {
    if end - start <= 1 {
        format!("byte 0x{:02x} in position {start}", bytes[start])
    } else {
        format!("bytes in position {start}-{}", end - 1)
    }
}

/// Span of the unencodable run starting at byte `offset`, in character positions.
fn char_span(text: &str, offset: usize, encodable: impl Fn(char) -> bool) -> String {
    let position = text[..offset].chars().count();
    let mut rest = text[offset..].chars();
    let first = rest.next().unwrap_or_default();
    let run = rest.take_while(|&next| !encodable(next)).count();
    if run == 0 {
        format!("character '{}' in position {position}", escape_char(first))
    } else {
        format!("characters in position {position}-{}", position + run)
    }
}

fn utf8_error(bytes: &[u8], err: std::str::Utf8Error) -> DecodeError {
    let start = err.valid_up_to();
    let (len, reason) = match err.error_len() {
        None => (bytes.len() - start, "unexpected end of data"),
        Some(len) => {
            let lead = bytes[start];
            let valid_lead = matches!(lead, 0xC2..=0xF4);
            let reason = if valid_lead {
                "invalid continuation byte"
            } else {
                "invalid start byte"
            };
            (len, reason)
        }
    };
    DecodeError {
        codec: Codec::Utf8.name(),
        span: byte_span(bytes, start, start + len.max(1)),
        reason: reason.to_string(),
    }
}

fn escape_char(c: char) -> String {
    let code = u32::from(c);
    if code < 0x100 {
        format!("\\x{code:02x}")
    } else if code < 0x10000 {
        format!("\\u{code:04x}")
    } else {
        format!("\\U{code:08x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("UTF8".parse::<Codec>(), Ok(Codec::Utf8));
        assert_eq!("us_ascii".parse::<Codec>(), Ok(Codec::Ascii));
        assert_eq!("ISO-8859-1".parse::<Codec>(), Ok(Codec::Latin1));
        assert_eq!(
            "klingon".parse::<Codec>().unwrap_err().to_string(),
            "unknown encoding: klingon"
        );
    }

    #[test]
    fn parses_legacy_labels() {
        assert_eq!(
            "shift_jis".parse::<Codec>(),
            Ok(Codec::Legacy(encoding_rs::SHIFT_JIS))
        );
        assert_eq!("cp1252".parse::<Codec>().map(Codec::name), Ok("windows-1252"));
        assert_eq!("unicode-1-1-utf-8".parse::<Codec>(), Ok(Codec::Utf8));
        assert!("utf-16".parse::<Codec>().is_err());
    }

    #[test]
    fn serializes_by_name() {
        let json = serde_json::to_string(&Codec::Legacy(encoding_rs::SHIFT_JIS)).expect("json");
        assert_eq!(json, "\"Shift_JIS\"");
        let codec: Codec = serde_json::from_str("\"latin-1\"").expect("codec");
        assert_eq!(codec, Codec::Latin1);
    }

    #[test]
    fn reads_codeset_from_locale() {
        assert_eq!(Codec::from_locale("en_US.UTF-8"), Some(Codec::Utf8));
        assert_eq!(Codec::from_locale("de_DE.ISO-8859-1@euro"), Some(Codec::Latin1));
        assert_eq!(
            Codec::from_locale("ja_JP.SJIS"),
            Some(Codec::Legacy(encoding_rs::SHIFT_JIS))
        );
        assert_eq!(Codec::from_locale("C"), None);
    }

    #[test]
    fn utf8_reports_invalid_start_byte() {
        let err = Codec::Utf8.decode(b"var \x82 = 1;").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'utf-8' codec can't decode byte 0x82 in position 4: invalid start byte"
        );
    }

    #[test]
    fn utf8_reports_truncated_and_broken_sequences() {
        let err = Codec::Utf8.decode(b"ab\xe4\xb8").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'utf-8' codec can't decode bytes in position 2-3: unexpected end of data"
        );
        let err = Codec::Utf8.decode(b"\xe4(").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'utf-8' codec can't decode byte 0xe4 in position 0: invalid continuation byte"
        );
    }

    #[test]
    fn ascii_rejects_high_bytes() {
        let err = Codec::Ascii.decode(b"abc\xe9").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'ascii' codec can't decode byte 0xe9 in position 3: ordinal not in range(128)"
        );
    }

    #[test]
    fn latin1_round_trips_every_byte() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = Codec::Latin1.decode(&bytes).expect("latin-1 decodes anything");
        assert_eq!(Codec::Latin1.encode(&text).expect("encodes"), bytes);
    }

    #[test]
    fn encode_groups_unencodable_runs() {
        let err = Codec::Ascii.encode("var \u{4e2d}\u{6587}=1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'ascii' codec can't encode characters in position 4-5: ordinal not in range(128)"
        );
        let err = Codec::Ascii.encode("caf\u{e9}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'ascii' codec can't encode character '\\xe9' in position 3: ordinal not in range(128)"
        );
        let err = Codec::Latin1.encode("\u{1f600}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'latin-1' codec can't encode character '\\U0001f600' in position 0: ordinal not in range(256)"
        );
    }

    #[test]
    fn shift_jis_reads_and_writes() {
        let codec: Codec = "shift_jis".parse().expect("codec");
        let text = codec.decode(b"var s='\x82\xcd\x82\xa2';").expect("decodes");
        assert_eq!(text, "var s='\u{306f}\u{3044}';");
        assert_eq!(codec.encode(&text).expect("encodes"), b"var s='\x82\xcd\x82\xa2';");
    }

    #[test]
    fn shift_jis_reports_bad_bytes_and_characters() {
        let codec: Codec = "shift_jis".parse().expect("codec");
        let err = codec.decode(b"ab\xa0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Shift_JIS' codec can't decode byte 0xa0 in position 2: illegal multibyte sequence"
        );
        let err = codec.encode("caf\u{e9}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Shift_JIS' codec can't encode character '\\xe9' in position 3: illegal multibyte sequence"
        );
    }

    #[test]
    fn windows_1252_covers_the_euro_sign() {
        let codec: Codec = "cp1252".parse().expect("codec");
        assert_eq!(codec.decode(b"'\x80'").expect("decodes"), "'\u{20ac}'");
        assert_eq!(codec.encode("'\u{20ac}'").expect("encodes"), b"'\x80'");
        let err = codec.encode("x=\u{4e2d}\u{6587}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'windows-1252' codec can't encode characters in position 2-3: character maps to <undefined>"
        );
    }
}
