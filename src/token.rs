//! Opaque link tokens.
//!
//! Application links carry upstream URLs as base64 tokens instead of raw
//! third-party URLs. New tokens use the URL-safe alphabet without padding;
//! decoding also accepts the standard alphabet so links minted by older
//! clients keep resolving.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not valid base64")]
    Encoding,
    #[error("token does not decode to UTF-8 text")]
    Utf8,
    #[error("token does not hold an absolute http(s) URL")]
    NotAUrl,
}

pub fn encode(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(url.as_bytes())
}

pub fn decode(token: &str) -> Result<Url, TokenError> {
    let token = token.trim();
    let bytes = [&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(token).ok())
        .ok_or(TokenError::Encoding)?;
    let text = String::from_utf8(bytes).map_err(|_| TokenError::Utf8)?;

    let url = Url::parse(text.trim()).map_err(|_| TokenError::NotAUrl)?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(TokenError::NotAUrl),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_recovers_url() {
        let raw = "https://www.avtub.net/category/bokep-indo/?filter=latest";
        assert_eq!(decode(&encode(raw)).unwrap().as_str(), raw);
    }

    #[test]
    fn test_encoded_token_is_url_safe() {
        // '?' and '>' produce '/' and '+' in the standard alphabet
        let token = encode("https://site.example/?a=>>>??");
        assert!(!token.contains('/'));
        assert!(!token.contains('+'));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_decode_accepts_standard_padded_tokens() {
        let raw = "https://bokepkorea.tv/x/?s=a";
        let legacy = STANDARD.encode(raw);
        assert!(legacy.ends_with('='));
        assert_eq!(decode(&legacy).unwrap().as_str(), raw);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode("!!not base64!!"), Err(TokenError::Encoding));
    }

    #[test]
    fn test_decode_rejects_non_url_payload() {
        assert_eq!(decode(&encode("just some words")), Err(TokenError::NotAUrl));
        assert_eq!(decode(&encode("ftp://files.example/x")), Err(TokenError::NotAUrl));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let token = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        assert_eq!(decode(&token), Err(TokenError::Utf8));
    }
}
