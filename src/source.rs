//! Where the raw input bytes come from.
//!
//! The dashboard never touches the filesystem or network directly; it is
//! handed two [`DataSource`]s and asks them for bytes on every (re)load.

use crate::error::FetchError;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// A fetchable input resource.
pub trait DataSource: Send + Sync {
    /// Human-readable location, used in error messages and logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Local file, read fully on each fetch.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        Ok(fs::read(&self.path)?)
    }
}

/// Remote resource fetched over HTTP(S) with a bounded timeout.
pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// In-memory bytes; handy for tests and for piping data in from elsewhere.
pub struct StaticSource {
    name: String,
    bytes: Vec<u8>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl DataSource for StaticSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        Ok(self.bytes.clone())
    }
}

/// Pick a source for a location string: URLs go over HTTP, anything else is a path.
pub fn source_for(location: &str, timeout: Duration) -> Box<dyn DataSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(location, timeout))
    } else {
        Box::new(FileSource::new(location))
    }
}
