//! Minimal Level 5 MAT writer for building fixtures.
#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use npx_core::Converter;
use npx_core::collect::Collected;
use npx_core::error::{ConvError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

const CELL: u32 = 1;
const STRUCT: u32 = 2;
const CHAR: u32 = 4;
const SPARSE: u32 = 5;
const DOUBLE: u32 = 6;
const UINT8: u32 = 9;
const INT32: u32 = 12;

const FIELD_NAME_LEN: usize = 32;

#[derive(Clone, Debug)]
pub enum V {
    Double(Vec<usize>, Vec<f64>),
    /// Complex double: dims, real part, imaginary part.
    Complex(Vec<usize>, Vec<f64>, Vec<f64>),
    Int32(Vec<usize>, Vec<i32>),
    Logical(Vec<usize>, Vec<bool>),
    Str(String),
    Cell(Vec<usize>, Vec<V>),
    /// 1x1 struct, fields in declared order.
    Struct(Vec<(String, V)>),
    /// Sparse double with no stored entries.
    Sparse(Vec<usize>),
    /// Struct with arbitrary dims and no fields.
    FieldlessStruct(Vec<usize>),
    Empty,
}

pub fn scalar(x: f64) -> V {
    V::Double(vec![1, 1], vec![x])
}

pub fn text(s: &str) -> V {
    V::Str(s.to_owned())
}

pub fn strings(items: &[&str]) -> V {
    V::Cell(vec![1, items.len()], items.iter().map(|s| text(s)).collect())
}

pub fn structure(fields: Vec<(&str, V)>) -> V {
    V::Struct(fields.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
}

/// Byte order of the written file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Little,
    Big,
}

impl Order {
    fn u16(self, x: u16) -> [u8; 2] {
        match self {
            Order::Little => x.to_le_bytes(),
            Order::Big => x.to_be_bytes(),
        }
    }

    fn u32(self, x: u32) -> [u8; 4] {
        match self {
            Order::Little => x.to_le_bytes(),
            Order::Big => x.to_be_bytes(),
        }
    }

    fn i32(self, x: i32) -> [u8; 4] {
        self.u32(x as u32)
    }

    fn f64(self, x: f64) -> [u8; 8] {
        match self {
            Order::Little => x.to_le_bytes(),
            Order::Big => x.to_be_bytes(),
        }
    }

    fn marker(self) -> &'static [u8; 2] {
        match self {
            Order::Little => b"IM",
            Order::Big => b"MI",
        }
    }
}

struct Writer {
    order: Order,
}

impl Writer {
    fn element(&self, out: &mut Vec<u8>, ty: u32, data: &[u8]) {
        out.extend_from_slice(&self.order.u32(ty));
        out.extend_from_slice(&self.order.u32(data.len() as u32));
        out.extend_from_slice(data);
        let pad = (8 - data.len() % 8) % 8;
        out.extend(std::iter::repeat_n(0u8, pad));
    }

    fn small_i32(&self, out: &mut Vec<u8>, value: i32) {
        out.extend_from_slice(&self.order.u32((4u32 << 16) | MI_INT32));
        out.extend_from_slice(&self.order.i32(value));
    }

    fn doubles(&self, out: &mut Vec<u8>, data: &[f64]) {
        let bytes: Vec<u8> = data.iter().flat_map(|&x| self.order.f64(x)).collect();
        self.element(out, MI_DOUBLE, &bytes);
    }

    fn header(&self, out: &mut Vec<u8>, class: u32, flags: u32, dims: &[usize], name: &str) {
        let mut f = Vec::new();
        f.extend_from_slice(&self.order.u32(class | flags));
        f.extend_from_slice(&self.order.u32(0));
        self.element(out, MI_UINT32, &f);
        let dims: Vec<u8> = dims.iter().flat_map(|&d| self.order.i32(d as i32)).collect();
        self.element(out, MI_INT32, &dims);
        self.element(out, MI_INT8, name.as_bytes());
    }

    fn matrix(&self, name: &str, v: &V) -> Vec<u8> {
        let mut body = Vec::new();
        match v {
            V::Empty => {}
            V::Double(dims, data) => {
                self.header(&mut body, DOUBLE, 0, dims, name);
                self.doubles(&mut body, data);
            }
            V::Complex(dims, re, im) => {
                self.header(&mut body, DOUBLE, 0x0800, dims, name);
                self.doubles(&mut body, re);
                self.doubles(&mut body, im);
            }
            V::Int32(dims, data) => {
                self.header(&mut body, INT32, 0, dims, name);
                let bytes: Vec<u8> = data.iter().flat_map(|&x| self.order.i32(x)).collect();
                self.element(&mut body, MI_INT32, &bytes);
            }
            V::Logical(dims, data) => {
                self.header(&mut body, UINT8, 0x0200, dims, name);
                let bytes: Vec<u8> = data.iter().map(|&b| b as u8).collect();
                self.element(&mut body, MI_UINT8, &bytes);
            }
            V::Str(s) => {
                let units: Vec<u16> = s.encode_utf16().collect();
                self.header(&mut body, CHAR, 0, &[1, units.len()], name);
                let bytes: Vec<u8> = units.iter().flat_map(|&u| self.order.u16(u)).collect();
                self.element(&mut body, MI_UINT16, &bytes);
            }
            V::Cell(dims, cells) => {
                self.header(&mut body, CELL, 0, dims, name);
                for c in cells {
                    body.extend(self.matrix("", c));
                }
            }
            V::Struct(fields) => {
                self.header(&mut body, STRUCT, 0, &[1, 1], name);
                self.small_i32(&mut body, FIELD_NAME_LEN as i32);
                let mut names = Vec::new();
                for (k, _) in fields {
                    let mut slot = [0u8; FIELD_NAME_LEN];
                    slot[..k.len()].copy_from_slice(k.as_bytes());
                    names.extend_from_slice(&slot);
                }
                self.element(&mut body, MI_INT8, &names);
                for (_, fv) in fields {
                    body.extend(self.matrix("", fv));
                }
            }
            V::Sparse(dims) => {
                self.header(&mut body, SPARSE, 0, dims, name);
                self.element(&mut body, MI_INT32, &[]);
                let jc: Vec<u8> = (0..=dims[1]).flat_map(|_| self.order.i32(0)).collect();
                self.element(&mut body, MI_INT32, &jc);
                self.doubles(&mut body, &[]);
            }
            V::FieldlessStruct(dims) => {
                self.header(&mut body, STRUCT, 0, dims, name);
                self.small_i32(&mut body, FIELD_NAME_LEN as i32);
                self.element(&mut body, MI_INT8, &[]);
            }
        }
        let mut out = Vec::new();
        self.element(&mut out, MI_MATRIX, &body);
        out
    }

    fn file(&self, vars: &[(&str, V)], compress: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(1024);
        let mut text = b"MATLAB 5.0 MAT-file, written by npx-core tests".to_vec();
        text.resize(116, b' ');
        out.extend_from_slice(&text);
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&self.order.u16(0x0100));
        out.extend_from_slice(self.order.marker());
        for (name, v) in vars {
            let m = self.matrix(name, v);
            if compress {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(&m).unwrap();
                let z = enc.finish().unwrap();
                out.extend_from_slice(&self.order.u32(MI_COMPRESSED));
                out.extend_from_slice(&self.order.u32(z.len() as u32));
                out.extend_from_slice(&z);
            } else {
                out.extend(m);
            }
        }
        out
    }
}

/// A complete little-endian `miMATRIX` element (tag included).
pub fn matrix(name: &str, v: &V) -> Vec<u8> {
    Writer {
        order: Order::Little,
    }
    .matrix(name, v)
}

pub fn mat_bytes(vars: &[(&str, V)], compress: bool) -> Vec<u8> {
    mat_bytes_in(Order::Little, vars, compress)
}

pub fn mat_bytes_in(order: Order, vars: &[(&str, V)], compress: bool) -> Vec<u8> {
    Writer { order }.file(vars, compress)
}

pub fn write_mat(path: &Path, vars: &[(&str, V)], compress: bool) {
    fs::write(path, mat_bytes(vars, compress)).unwrap();
}

pub fn info_struct(channels: &[&str]) -> V {
    structure(vec![
        ("fs", scalar(500.0)),
        ("channels", strings(channels)),
        ("subject", text("anon")),
    ])
}

pub fn data_struct() -> V {
    structure(vec![(
        "samples",
        V::Double(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
    )])
}

pub fn marker_struct() -> V {
    structure(vec![
        ("latency", V::Int32(vec![1, 2], vec![100, 250])),
        ("label", strings(&["start", "stop"])),
    ])
}

/// Write the three MAT files a real conversion would leave behind.
pub fn write_study(dir: &Path, prefix: &str, compress: bool) {
    let files = [
        ("info", info_struct(&["Fp1", "Fp2", "Cz"])),
        ("data", data_struct()),
        ("marker", marker_struct()),
    ];
    for (which, v) in files {
        let var = format!("NP_{which}");
        write_mat(
            &dir.join(format!("{prefix}{which}.mat")),
            &[(var.as_str(), v)],
            compress,
        );
    }
}

/// Stands in for Octave: emits fixture MAT files, fails for names containing "bad".
pub struct FakeConverter {
    pub compress: bool,
}

impl Converter for FakeConverter {
    fn convert(&self, raw_file: &Path, workdir: &Path) -> Result<()> {
        let name = raw_file.to_string_lossy();
        if name.contains("bad") {
            return Err(ConvError::Format(format!("cannot decode {name}")));
        }
        write_study(workdir, &Collected::study_prefix(&name), self.compress);
        Ok(())
    }
}
