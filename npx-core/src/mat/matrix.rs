use super::element::{
    ElementReader, MI_COMPRESSED, MI_MATRIX, RawElement, TAG_LEN, decode_chars, decode_i32s,
    decode_name, decode_numbers, inflate,
};
use super::header::Endian;
use super::value::{ClassId, MatValue, Numbers, checked_numel, numel};
use crate::error::{ConvError, Result};
use std::collections::BTreeMap;

const FLAG_COMPLEX: u32 = 0x0800;
const FLAG_LOGICAL: u32 = 0x0200;

/// A named top-level variable.
pub type Variable = (String, MatValue);

/// Decode one top-level element; `None` for elements that are not arrays.
pub fn decode_variable(el: RawElement<'_>, endian: Endian) -> Result<Option<Variable>> {
    match el.ty {
        MI_MATRIX => decode_matrix(el.data, endian).map(Some),
        MI_COMPRESSED => {
            let inflated = inflate(el.data)?;
            let mut r = ElementReader::new(&inflated, endian);
            match r.next_element()? {
                Some(inner) => decode_variable(inner, endian),
                None => Ok(None),
            }
        }
        other => {
            tracing::debug!("ignoring top-level element of type {other}");
            Ok(None)
        }
    }
}

/// Decode a nested array; cells and struct fields must be `miMATRIX`.
fn decode_nested(el: RawElement<'_>, endian: Endian) -> Result<MatValue> {
    if el.ty != MI_MATRIX {
        return Err(ConvError::Format(format!(
            "expected nested miMATRIX, found element type {}",
            el.ty
        )));
    }
    Ok(decode_matrix(el.data, endian)?.1)
}

/// Decode the body of an `miMATRIX` element into its name and value.
pub fn decode_matrix(data: &[u8], endian: Endian) -> Result<Variable> {
    // Empty cells and fields are written as a zero-length matrix.
    if data.is_empty() {
        return Ok((String::new(), MatValue::empty()));
    }
    let mut r = ElementReader::new(data, endian);

    let flags_el = r.expect_element("array flags")?;
    let flags = decode_i32s(flags_el, endian)?;
    let flags = *flags
        .first()
        .ok_or_else(|| ConvError::Format("empty array flags".into()))? as u32;
    let class_byte = (flags & 0xFF) as u8;
    let class = ClassId::from_u8(class_byte)
        .ok_or_else(|| ConvError::Format(format!("unknown array class {class_byte}")))?;

    let dims = decode_i32s(r.expect_element("dimensions")?, endian)?
        .into_iter()
        .map(|d| {
            usize::try_from(d).map_err(|_| ConvError::Format(format!("negative dimension {d}")))
        })
        .collect::<Result<Vec<usize>>>()?;
    let count = checked_numel(&dims)
        .ok_or_else(|| ConvError::Format(format!("dimensions {dims:?} overflow")))?;
    let name = decode_name(r.expect_element("array name")?.data);

    let value = match class {
        ClassId::Cell => {
            // every cell is at least one tag
            fits(&name, count, TAG_LEN, r.remaining())?;
            let mut cells = Vec::with_capacity(count);
            for _ in 0..count {
                cells.push(decode_nested(r.expect_element("cell")?, endian)?);
            }
            MatValue::Cell { dims, cells }
        }
        ClassId::Struct | ClassId::Object => {
            let class_name = if class == ClassId::Object {
                Some(decode_name(r.expect_element("class name")?.data))
            } else {
                None
            };
            decode_struct(&mut r, &name, dims, count, class_name, data.len(), endian)?
        }
        ClassId::Char => {
            let chars = match r.next_element()? {
                Some(el) => decode_chars(el, endian)?,
                None => Vec::new(),
            };
            let rows = char_rows(&name, &dims, &chars)?;
            MatValue::Char { dims, rows }
        }
        ClassId::Sparse => {
            return Err(ConvError::Format(format!(
                "sparse array {name:?} is not supported"
            )));
        }
        _ if flags & FLAG_LOGICAL != 0 => {
            let real = match r.next_element()? {
                Some(el) => decode_numbers(el, endian)?,
                None => Numbers::U64(Vec::new()),
            };
            check_len(&name, "logical", real.len(), count, &dims)?;
            let data = (0..real.len())
                .map(|i| real.get_f64(i).is_some_and(|x| x != 0.0))
                .collect();
            MatValue::Logical { dims, data }
        }
        _ => {
            let real = match r.next_element()? {
                Some(el) => decode_numbers(el, endian)?.cast_to(class),
                None => Numbers::F64(Vec::new()).cast_to(class),
            };
            check_len(&name, "real", real.len(), count, &dims)?;
            let imag = if flags & FLAG_COMPLEX != 0 {
                let el = r.expect_element("imaginary part")?;
                let imag = decode_numbers(el, endian)?.cast_to(class);
                check_len(&name, "imaginary", imag.len(), count, &dims)?;
                Some(imag)
            } else {
                None
            };
            MatValue::Numeric {
                class,
                dims,
                real,
                imag,
            }
        }
    };
    Ok((name, value))
}

fn check_len(name: &str, part: &str, got: usize, count: usize, dims: &[usize]) -> Result<()> {
    if got != count {
        return Err(ConvError::Format(format!(
            "array {name:?} has {got} {part} values for dims {dims:?}"
        )));
    }
    Ok(())
}

/// Reject element counts the remaining bytes cannot possibly encode.
fn fits(name: &str, count: usize, per_element: usize, remaining: usize) -> Result<()> {
    match count.checked_mul(per_element) {
        Some(needed) if needed <= remaining => Ok(()),
        _ => Err(ConvError::Format(format!(
            "array {name:?} claims {count} elements, only {remaining} bytes left"
        ))),
    }
}

fn decode_struct(
    r: &mut ElementReader<'_>,
    name: &str,
    dims: Vec<usize>,
    count: usize,
    class_name: Option<String>,
    body_len: usize,
    endian: Endian,
) -> Result<MatValue> {
    let name_len = decode_i32s(r.expect_element("field name length")?, endian)?
        .first()
        .copied()
        .unwrap_or(0);
    let name_len = usize::try_from(name_len)
        .map_err(|_| ConvError::Format(format!("bad field name length {name_len}")))?;
    let names_el = r.expect_element("field names")?;
    let fields: Vec<String> = if name_len == 0 {
        Vec::new()
    } else {
        names_el.data.chunks(name_len).map(decode_name).collect()
    };

    if fields.is_empty() {
        // fieldless elements carry no bytes; bound them by the array body instead
        fits(name, count, 1, body_len)?;
    } else {
        fits(name, count, fields.len() * TAG_LEN, r.remaining())?;
    }
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        let mut element = BTreeMap::new();
        for field in &fields {
            let value = decode_nested(r.expect_element("struct field")?, endian)?;
            element.insert(field.clone(), value);
        }
        elements.push(element);
    }
    Ok(MatValue::Struct {
        dims,
        class_name,
        fields,
        elements,
    })
}

/// Split column-major characters into rows.
fn char_rows(name: &str, dims: &[usize], chars: &[char]) -> Result<Vec<String>> {
    let nrows = dims.first().copied().unwrap_or(0);
    if nrows == 0 || chars.is_empty() {
        return Ok(Vec::new());
    }
    let ncols = numel(&dims[1..]);
    if chars.len() != nrows.saturating_mul(ncols) {
        // multi-byte UTF-8 payloads do not line up with dims; keep the text whole
        if nrows == 1 {
            return Ok(vec![chars.iter().collect()]);
        }
        return Err(ConvError::Format(format!(
            "char array {name:?} has {} characters for dims {dims:?}",
            chars.len()
        )));
    }
    Ok((0..nrows)
        .map(|row| {
            (0..ncols)
                .filter_map(|col| chars.get(col * nrows + row))
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_column_major() {
        // ["ab"; "cd"] stored as a c b d
        let rows = char_rows("c", &[2, 2], &['a', 'c', 'b', 'd']).unwrap();
        assert_eq!(rows, vec!["ab", "cd"]);
        assert!(char_rows("c", &[0, 0], &[]).unwrap().is_empty());
        assert_eq!(
            char_rows("c", &[1, 3], &['F', 'p', '1']).unwrap(),
            vec!["Fp1"]
        );
    }

    #[test]
    fn multi_row_char_length_mismatch_is_rejected() {
        let err = char_rows("c", &[usize::MAX, 1], &['a']).unwrap_err();
        assert!(matches!(err, ConvError::Format(_)));
    }

    #[test]
    fn element_budget() {
        assert!(fits("a", 2, TAG_LEN, 16).is_ok());
        assert!(fits("a", 3, TAG_LEN, 16).is_err());
        assert!(fits("a", usize::MAX, TAG_LEN, 16).is_err());
    }

    #[test]
    fn zero_length_matrix_is_empty() {
        let (name, v) = decode_matrix(&[], Endian::Little).unwrap();
        assert!(name.is_empty());
        assert_eq!(v, MatValue::empty());
    }
}
