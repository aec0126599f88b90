use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
    pub had_errors: bool,
}

/// Decodes an import file. A BOM wins; otherwise valid UTF-8 is taken as is
/// and anything else goes through charset detection.
pub fn decode(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(encoding, &bytes[bom_len..]);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: UTF_8.name(),
            had_errors: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    debug!("[encoding] detected {}", encoding.name());

    decode_with(encoding, bytes)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> DecodedText {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);

    if had_errors {
        warn!("[encoding] replacement characters while decoding as {}", encoding.name());
    }

    DecodedText {
        text: text.into_owned(),
        encoding: encoding.name(),
        had_errors,
    }
}
