use crate::error::{ConvError, Result};

pub const HEADER_LEN: usize = 128;
pub const TEXT_LEN: usize = 116;
pub const VERSION: u16 = 0x0100;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    #[inline]
    pub fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
        }
    }

    #[inline]
    pub fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        }
    }

    #[inline]
    pub fn u64(self, b: [u8; 8]) -> u64 {
        match self {
            Endian::Little => u64::from_le_bytes(b),
            Endian::Big => u64::from_be_bytes(b),
        }
    }
}

/// The fixed 128-byte Level 5 header.
#[derive(Clone, Debug)]
pub struct Header {
    /// Descriptive text, trailing padding removed.
    pub text: String,
    pub version: u16,
    pub endian: Endian,
}

impl Header {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(ConvError::Format(format!(
                "file too small for MAT header: {} bytes",
                buf.len()
            )));
        }
        let text_bytes = &buf[..TEXT_LEN];
        if text_bytes.starts_with(b"MATLAB 7.3") {
            return Err(ConvError::Format(
                "HDF5-based MAT files (v7.3) are not supported".into(),
            ));
        }
        let endian = match &buf[126..128] {
            b"IM" => Endian::Little,
            b"MI" => Endian::Big,
            other => {
                return Err(ConvError::Format(format!(
                    "bad endian indicator {other:?}"
                )));
            }
        };
        let version = endian.u16([buf[124], buf[125]]);
        if version != VERSION {
            tracing::debug!("unexpected MAT version 0x{version:04x}, reading anyway");
        }
        let text = String::from_utf8_lossy(text_bytes)
            .trim_end_matches(['\0', ' '])
            .to_string();
        Ok(Self {
            text,
            version,
            endian,
        })
    }
}
