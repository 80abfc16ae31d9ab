use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Decode JSON piped on stdin. `None` when stdin is a terminal or carries nothing.
pub fn read_json<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut piped = String::new();
    io::stdin().lock().read_to_string(&mut piped)?;
    decode(&piped)
}

fn decode<T: DeserializeOwned>(piped: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let body = piped.trim();
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| format!("Invalid JSON on stdin: {}", e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_decode_blank_is_none() {
        assert!(decode::<Value>("  \n").unwrap().is_none());
    }

    #[test]
    fn test_decode_reports_bad_json() {
        let err = decode::<Value>("{ not json").unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON on stdin"));
    }
}
