use super::header::Endian;
use super::value::Numbers;
use crate::error::{ConvError, Result};
use flate2::read::ZlibDecoder;
use std::io::Read;

pub const MI_INT8: u32 = 1;
pub const MI_UINT8: u32 = 2;
pub const MI_INT16: u32 = 3;
pub const MI_UINT16: u32 = 4;
pub const MI_INT32: u32 = 5;
pub const MI_UINT32: u32 = 6;
pub const MI_SINGLE: u32 = 7;
pub const MI_DOUBLE: u32 = 9;
pub const MI_INT64: u32 = 12;
pub const MI_UINT64: u32 = 13;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8: u32 = 16;
pub const MI_UTF16: u32 = 17;
pub const MI_UTF32: u32 = 18;

pub const TAG_LEN: usize = 8;

/// A data element borrowed from its enclosing buffer.
#[derive(Clone, Copy, Debug)]
pub struct RawElement<'a> {
    pub ty: u32,
    pub data: &'a [u8],
}

/// Walks consecutive tagged data elements in one buffer.
pub struct ElementReader<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ElementReader<'a> {
    pub fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self {
            buf,
            pos: 0,
            endian,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn word(&self, at: usize) -> Result<u32> {
        let b = self
            .buf
            .get(at..at + 4)
            .ok_or_else(|| ConvError::Format(format!("truncated tag at offset {at}")))?;
        Ok(self.endian.u32([b[0], b[1], b[2], b[3]]))
    }

    pub fn next_element(&mut self) -> Result<Option<RawElement<'a>>> {
        if self.is_done() {
            return Ok(None);
        }
        let start = self.pos;
        let first = self.word(start)?;

        // Small element: size and type share the first word, data fits in the second.
        if first >> 16 != 0 {
            let nbytes = (first >> 16) as usize;
            let ty = first & 0xFFFF;
            if nbytes > 4 {
                return Err(ConvError::Format(format!(
                    "small element at offset {start} claims {nbytes} bytes"
                )));
            }
            let data = self
                .buf
                .get(start + 4..start + 4 + nbytes)
                .ok_or_else(|| ConvError::Format(format!("truncated element at {start}")))?;
            self.pos = (start + TAG_LEN).min(self.buf.len());
            return Ok(Some(RawElement { ty, data }));
        }

        let ty = first;
        let nbytes = self.word(start + 4)? as usize;
        let body = start + TAG_LEN;
        let data = self.buf.get(body..body + nbytes).ok_or_else(|| {
            ConvError::Format(format!(
                "element type {ty} at offset {start} needs {nbytes} bytes, {} left",
                self.buf.len().saturating_sub(body)
            ))
        })?;
        let padded = if ty == MI_COMPRESSED {
            nbytes
        } else {
            nbytes.div_ceil(8) * 8
        };
        self.pos = (body + padded).min(self.buf.len());
        Ok(Some(RawElement { ty, data }))
    }

    /// Next element, which must exist.
    pub fn expect_element(&mut self, what: &str) -> Result<RawElement<'a>> {
        self.next_element()?
            .ok_or_else(|| ConvError::Format(format!("missing {what} sub-element")))
    }
}

/// Inflate the payload of a `miCOMPRESSED` element.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 4);
    ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

fn words<const N: usize>(data: &[u8]) -> impl Iterator<Item = [u8; N]> + '_ {
    data.chunks_exact(N).map(|c| {
        let mut w = [0u8; N];
        w.copy_from_slice(c);
        w
    })
}

fn element_size(ty: u32) -> Option<usize> {
    Some(match ty {
        MI_INT8 | MI_UINT8 | MI_UTF8 => 1,
        MI_INT16 | MI_UINT16 | MI_UTF16 => 2,
        MI_INT32 | MI_UINT32 | MI_SINGLE | MI_UTF32 => 4,
        MI_DOUBLE | MI_INT64 | MI_UINT64 => 8,
        _ => return None,
    })
}

/// Decode a numeric element into the natural family of its stored type.
pub fn decode_numbers(el: RawElement<'_>, e: Endian) -> Result<Numbers> {
    let size = element_size(el.ty)
        .ok_or_else(|| ConvError::Format(format!("element type {} is not numeric", el.ty)))?;
    if el.data.len() % size != 0 {
        return Err(ConvError::Format(format!(
            "element type {} has {} bytes, not a multiple of {size}",
            el.ty,
            el.data.len()
        )));
    }
    let d = el.data;
    Ok(match el.ty {
        MI_DOUBLE => Numbers::F64(words::<8>(d).map(|w| f64::from_bits(e.u64(w))).collect()),
        MI_SINGLE => Numbers::F64(
            words::<4>(d)
                .map(|w| f32::from_bits(e.u32(w)) as f64)
                .collect(),
        ),
        MI_INT8 => Numbers::I64(d.iter().map(|&b| b as i8 as i64).collect()),
        MI_INT16 => Numbers::I64(words::<2>(d).map(|w| e.u16(w) as i16 as i64).collect()),
        MI_INT32 => Numbers::I64(words::<4>(d).map(|w| e.u32(w) as i32 as i64).collect()),
        MI_INT64 => Numbers::I64(words::<8>(d).map(|w| e.u64(w) as i64).collect()),
        MI_UINT8 | MI_UTF8 => Numbers::U64(d.iter().map(|&b| b as u64).collect()),
        MI_UINT16 | MI_UTF16 => Numbers::U64(words::<2>(d).map(|w| e.u16(w) as u64).collect()),
        MI_UINT32 | MI_UTF32 => Numbers::U64(words::<4>(d).map(|w| e.u32(w) as u64).collect()),
        MI_UINT64 => Numbers::U64(words::<8>(d).map(|w| e.u64(w)).collect()),
        other => {
            return Err(ConvError::Format(format!(
                "element type {other} is not numeric"
            )));
        }
    })
}

/// Decode `miINT32`-style integers (dimensions, field name length).
pub fn decode_i32s(el: RawElement<'_>, e: Endian) -> Result<Vec<i64>> {
    match decode_numbers(el, e)? {
        Numbers::I64(v) => Ok(v),
        Numbers::U64(v) => Ok(v.into_iter().map(|x| x as i64).collect()),
        Numbers::F64(_) => Err(ConvError::Format(
            "expected integer element, found floating point".into(),
        )),
    }
}

/// Decode the characters of a char array element as Unicode scalars.
pub fn decode_chars(el: RawElement<'_>, e: Endian) -> Result<Vec<char>> {
    Ok(match el.ty {
        MI_UTF8 => String::from_utf8_lossy(el.data).chars().collect(),
        MI_UTF16 => {
            let units: Vec<u16> = words::<2>(el.data).map(|w| e.u16(w)).collect();
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        _ => {
            let codes = match decode_numbers(el, e)? {
                Numbers::U64(v) => v,
                Numbers::I64(v) => v.into_iter().map(|x| x as u64).collect(),
                Numbers::F64(v) => v.into_iter().map(|x| x as u64).collect(),
            };
            codes
                .into_iter()
                .map(|c| {
                    u32::try_from(c)
                        .ok()
                        .and_then(char::from_u32)
                        .unwrap_or(char::REPLACEMENT_CHARACTER)
                })
                .collect()
        }
    })
}

/// Array names and field names: bytes up to the first NUL.
pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
