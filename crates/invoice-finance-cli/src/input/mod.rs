pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Typed input from `--input <file>`, or from piped stdin when no file is given.
pub fn file_or_stdin<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => file::read_json(path).map(Some),
        None => stdin::read_json(),
    }
}
