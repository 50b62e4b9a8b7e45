use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassId {
    Cell = 1,
    Struct = 2,
    Object = 3,
    Char = 4,
    Sparse = 5,
    Double = 6,
    Single = 7,
    Int8 = 8,
    Uint8 = 9,
    Int16 = 10,
    Uint16 = 11,
    Int32 = 12,
    Uint32 = 13,
    Int64 = 14,
    Uint64 = 15,
}

impl ClassId {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            1 => Self::Cell,
            2 => Self::Struct,
            3 => Self::Object,
            4 => Self::Char,
            5 => Self::Sparse,
            6 => Self::Double,
            7 => Self::Single,
            8 => Self::Int8,
            9 => Self::Uint8,
            10 => Self::Int16,
            11 => Self::Uint16,
            12 => Self::Int32,
            13 => Self::Uint32,
            14 => Self::Int64,
            15 => Self::Uint64,
            _ => return None,
        })
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Double | Self::Single)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64)
    }
}

/// Numeric payload, widened to the largest type of its family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Numbers {
    F64(#[serde(with = "float_seq")] Vec<f64>),
    I64(Vec<i64>),
    U64(Vec<u64>),
}

impl Numbers {
    pub fn len(&self) -> usize {
        match self {
            Numbers::F64(v) => v.len(),
            Numbers::I64(v) => v.len(),
            Numbers::U64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            Numbers::F64(v) => v.get(i).copied(),
            Numbers::I64(v) => v.get(i).map(|&x| x as f64),
            Numbers::U64(v) => v.get(i).map(|&x| x as f64),
        }
    }

    /// Convert a payload stored in a narrower element type to the family of `class`.
    pub fn cast_to(self, class: ClassId) -> Numbers {
        if class.is_float() {
            match self {
                Numbers::F64(v) => Numbers::F64(v),
                Numbers::I64(v) => Numbers::F64(v.into_iter().map(|x| x as f64).collect()),
                Numbers::U64(v) => Numbers::F64(v.into_iter().map(|x| x as f64).collect()),
            }
        } else if class.is_signed() {
            match self {
                Numbers::I64(v) => Numbers::I64(v),
                Numbers::F64(v) => Numbers::I64(v.into_iter().map(|x| x as i64).collect()),
                Numbers::U64(v) => Numbers::I64(v.into_iter().map(|x| x as i64).collect()),
            }
        } else {
            match self {
                Numbers::U64(v) => Numbers::U64(v),
                Numbers::F64(v) => Numbers::U64(v.into_iter().map(|x| x as u64).collect()),
                Numbers::I64(v) => Numbers::U64(v.into_iter().map(|x| x as u64).collect()),
            }
        }
    }
}

/// Float sequences for text formats, which have no NaN or infinity:
/// non-finite values are written as `"NaN"`, `"inf"` and `"-inf"`.
/// Binary formats keep plain floats. Reading accepts both, and `null`
/// (as older JSON snapshots hold) reads back as NaN.
mod float_seq {
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const NAN: &str = "NaN";
    const INF: &str = "inf";
    const NEG_INF: &str = "-inf";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Float {
        Number(Option<f64>),
        Named(String),
    }

    pub fn serialize<S: Serializer>(values: &[f64], s: S) -> Result<S::Ok, S::Error> {
        if !s.is_human_readable() {
            return values.serialize(s);
        }
        let mut seq = s.serialize_seq(Some(values.len()))?;
        for &x in values {
            if x.is_nan() {
                seq.serialize_element(NAN)?;
            } else if x == f64::INFINITY {
                seq.serialize_element(INF)?;
            } else if x == f64::NEG_INFINITY {
                seq.serialize_element(NEG_INF)?;
            } else {
                seq.serialize_element(&x)?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Float>::deserialize(d)?
            .into_iter()
            .map(|f| match f {
                Float::Number(x) => Ok(x.unwrap_or(f64::NAN)),
                Float::Named(name) => match name.as_str() {
                    NAN => Ok(f64::NAN),
                    INF => Ok(f64::INFINITY),
                    NEG_INF => Ok(f64::NEG_INFINITY),
                    other => Err(D::Error::custom(format!("not a float: {other:?}"))),
                },
            })
            .collect()
    }
}

/// One decoded MAT array. Data is column-major, as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatValue {
    Numeric {
        class: ClassId,
        dims: Vec<usize>,
        real: Numbers,
        imag: Option<Numbers>,
    },
    Logical {
        dims: Vec<usize>,
        data: Vec<bool>,
    },
    Char {
        dims: Vec<usize>,
        rows: Vec<String>,
    },
    Cell {
        dims: Vec<usize>,
        cells: Vec<MatValue>,
    },
    Struct {
        dims: Vec<usize>,
        /// Set for object arrays.
        class_name: Option<String>,
        /// Declared field order.
        fields: Vec<String>,
        elements: Vec<BTreeMap<String, MatValue>>,
    },
}

impl MatValue {
    /// The empty `[]` double matrix.
    pub fn empty() -> Self {
        MatValue::Numeric {
            class: ClassId::Double,
            dims: vec![0, 0],
            real: Numbers::F64(Vec::new()),
            imag: None,
        }
    }

    pub fn dims(&self) -> &[usize] {
        match self {
            MatValue::Numeric { dims, .. }
            | MatValue::Logical { dims, .. }
            | MatValue::Char { dims, .. }
            | MatValue::Cell { dims, .. }
            | MatValue::Struct { dims, .. } => dims,
        }
    }

    pub fn numel(&self) -> usize {
        numel(self.dims())
    }

    pub fn class(&self) -> ClassId {
        match self {
            MatValue::Numeric { class, .. } => *class,
            MatValue::Logical { .. } => ClassId::Uint8,
            MatValue::Char { .. } => ClassId::Char,
            MatValue::Cell { .. } => ClassId::Cell,
            MatValue::Struct {
                class_name: Some(_),
                ..
            } => ClassId::Object,
            MatValue::Struct { .. } => ClassId::Struct,
        }
    }

    pub fn as_rows(&self) -> Option<&[String]> {
        match self {
            MatValue::Char { rows, .. } => Some(rows),
            _ => None,
        }
    }

    /// First row of a char array; `""` for an empty one.
    pub fn as_str(&self) -> Option<&str> {
        self.as_rows()
            .map(|rows| rows.first().map(String::as_str).unwrap_or(""))
    }

    pub fn as_cells(&self) -> Option<&[MatValue]> {
        match self {
            MatValue::Cell { cells, .. } => Some(cells),
            _ => None,
        }
    }

    pub fn struct_element(&self, i: usize) -> Option<&BTreeMap<String, MatValue>> {
        match self {
            MatValue::Struct { elements, .. } => elements.get(i),
            _ => None,
        }
    }

    pub fn field_names(&self) -> Option<&[String]> {
        match self {
            MatValue::Struct { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn scalar(&self) -> Option<f64> {
        match self {
            MatValue::Numeric { real, .. } if real.len() == 1 => real.get_f64(0),
            _ => None,
        }
    }
}

/// Element count of `dims`, saturating at `usize::MAX`.
pub fn numel(dims: &[usize]) -> usize {
    dims.iter().fold(1usize, |n, &d| n.saturating_mul(d))
}

/// Element count of `dims`, `None` on overflow.
pub fn checked_numel(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |n, &d| n.checked_mul(d))
}
