use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

// Gmail hands back base64url payloads with and without padding
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Standard base64 with `+` -> `-` and `/` -> `_`. Padding is kept.
pub fn b64u_encode(content: impl AsRef<[u8]>) -> String {
    general_purpose::URL_SAFE.encode(content)
}

pub fn b64u_decode(b64u: &str) -> Result<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(b64u)
        .map_err(|_| Error::FailToB64uDecode)
}

pub fn b64u_decode_to_string(b64u: &str) -> Result<String> {
    b64u_decode(b64u)
        .ok()
        .and_then(|r| String::from_utf8(r).ok())
        .ok_or(Error::FailToB64uDecode)
}

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    FailToB64uDecode,
}

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_substitutes_url_safe_chars() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        assert_eq!(b64u_encode([0xfb, 0xff]), "-_8=");
    }

    #[test]
    fn test_decode_accepts_missing_padding() {
        assert_eq!(b64u_decode("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(b64u_decode("-_8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_to_string() {
        let encoded = b64u_encode("To: a@example.com");
        assert_eq!(b64u_decode_to_string(&encoded).unwrap(), "To: a@example.com");
        assert_eq!(b64u_decode_to_string("***"), Err(Error::FailToB64uDecode));
    }
}
