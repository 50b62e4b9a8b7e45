//! Reader for Level 5 MAT files as written by Octave (`-v6`/`-v7`) and MATLAB.
//!
//! Layout: a 128-byte [`Header`] followed by tagged data elements. Each
//! top-level `miMATRIX` element is one variable; `miCOMPRESSED` elements hold a
//! zlib stream wrapping exactly one such element.

use crate::error::Result;
use std::fs;
use std::io::Read;
use std::path::Path;

pub mod element;
pub mod header;
pub mod matrix;
pub mod value;

pub use header::{Endian, Header};
pub use value::{ClassId, MatValue, Numbers};

use element::ElementReader;
use header::HEADER_LEN;

#[derive(Clone, Debug)]
pub struct MatFile {
    header: Header,
    variables: Vec<matrix::Variable>,
}

impl MatFile {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        tracing::debug!("read {} bytes from {}", bytes.len(), path.display());
        Self::from_bytes(&bytes)
    }

    pub fn read_from(mut r: impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Header::parse(bytes)?;
        let mut reader = ElementReader::new(&bytes[HEADER_LEN..], header.endian);
        let mut variables = Vec::new();
        while let Some(el) = reader.next_element()? {
            if let Some(var) = matrix::decode_variable(el, header.endian)? {
                variables.push(var);
            }
        }
        Ok(Self { header, variables })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn variable(&self, name: &str) -> Option<&MatValue> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn into_variable(self, name: &str) -> Option<MatValue> {
        self.variables
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Variables in file order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &MatValue)> {
        self.variables.iter().map(|(n, v)| (n.as_str(), v))
    }
}
