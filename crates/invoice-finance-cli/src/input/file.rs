use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

fn open(path: &str) -> Result<(PathBuf, File), Box<dyn std::error::Error>> {
    let resolved = std::env::current_dir()?.join(path);
    if !resolved.is_file() {
        return Err(format!("No such input file: {}", resolved.display()).into());
    }
    let file = File::open(&resolved)
        .map_err(|e| format!("Cannot open '{}': {}", resolved.display(), e))?;
    Ok((resolved, file))
}

/// Decode a JSON document from disk.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let (resolved, file) = open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid JSON in '{}': {}", resolved.display(), e).into())
}

/// Raw text of a file, for formats other than JSON (policy YAML).
pub fn read_to_string(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let (resolved, file) = open(path)?;
    let mut contents = String::new();
    BufReader::new(file)
        .read_to_string(&mut contents)
        .map_err(|e| format!("Cannot read '{}': {}", resolved.display(), e))?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Write;

    #[test]
    fn test_read_json_and_missing_file() {
        let path = std::env::temp_dir().join(format!("ifin-input-{}.json", std::process::id()));
        File::create(&path).unwrap().write_all(br#"{ "seller": "s1" }"#).unwrap();
        let value: Value = read_json(path.to_str().unwrap()).unwrap();
        assert_eq!(value["seller"], "s1");

        let err = read_json::<Value>("/nonexistent/invoices.json").unwrap_err();
        assert!(err.to_string().contains("No such input file"));
    }
}
