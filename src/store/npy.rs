//! NumPy `.npy` (format version 1.0) reading and writing for `u8` arrays

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use lazy_static::lazy_static;
use ndarray::Array3;
use regex::Regex;

use crate::errors::{ScoutError, ScoutResult};

const MAGIC: &[u8] = b"\x93NUMPY";

/// Magic, version and header length field
const PREAMBLE_LEN: usize = 10;

lazy_static! {
    static ref DESCR: Regex = Regex::new(r"'descr':\s*'([^']*)'").unwrap();
    static ref FORTRAN_ORDER: Regex = Regex::new(r"'fortran_order':\s*(True|False)").unwrap();
    static ref SHAPE: Regex = Regex::new(r"'shape':\s*\(([^)]*)\)").unwrap();
}

/// Header dictionary, padded so the data starts on a 64-byte boundary
fn header(shape: &[usize]) -> String {
    let dims = match shape {
        [single] => format!("{},", single),
        _ => shape.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", "),
    };
    let dict = format!("{{'descr': '|u1', 'fortran_order': False, 'shape': ({}), }}", dims);

    let unpadded = PREAMBLE_LEN + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    format!("{}{}\n", dict, " ".repeat(padding))
}

/// Writes a row-major `u8` array
pub fn write_npy<W: Write>(writer: &mut W, array: &Array3<u8>) -> ScoutResult<()> {
    let header = header(array.shape());

    writer.write_all(MAGIC)?;
    writer.write_all(&[0x01, 0x00])?;
    writer.write_u16::<LittleEndian>(header.len() as u16)?;
    writer.write_all(header.as_bytes())?;

    match array.as_slice() {
        Some(data) => writer.write_all(data)?,
        None => {
            let data: Vec<u8> = array.iter().copied().collect();
            writer.write_all(&data)?;
        }
    }

    Ok(())
}

/// Reads a 3-dimensional `u8` array
pub fn read_npy<R: Read>(reader: &mut R) -> ScoutResult<Array3<u8>> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(ScoutError::ArrayFormatError("Missing NUMPY magic".to_string()));
    }

    let major = reader.read_u8()?;
    let _minor = reader.read_u8()?;
    let header_len = match major {
        1 => reader.read_u16::<LittleEndian>()? as usize,
        2 | 3 => reader.read_u32::<LittleEndian>()? as usize,
        v => return Err(ScoutError::ArrayFormatError(format!("Unsupported npy version {}", v))),
    };

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8_lossy(&header);

    let descr = DESCR.captures(&header).map(|c| c[1].to_string()).unwrap_or_default();
    if descr != "|u1" && descr != "<u1" && descr != "u1" {
        return Err(ScoutError::ArrayFormatError(format!("Unsupported dtype '{}'", descr)));
    }

    let fortran = FORTRAN_ORDER.captures(&header).map(|c| &c[1] == "True").unwrap_or(false);
    if fortran {
        return Err(ScoutError::ArrayFormatError("Fortran-ordered arrays are not supported".to_string()));
    }

    let shape = SHAPE.captures(&header)
        .ok_or_else(|| ScoutError::ArrayFormatError("Header has no shape".to_string()))?[1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>()
            .map_err(|_| ScoutError::ArrayFormatError(format!("Bad dimension '{}'", s))))
        .collect::<ScoutResult<Vec<usize>>>()?;

    if shape.len() != 3 {
        return Err(ScoutError::ArrayFormatError(format!("Expected 3 dimensions, got {:?}", shape)));
    }

    let mut data = vec![0u8; shape.iter().product()];
    reader.read_exact(&mut data)?;

    Array3::from_shape_vec((shape[0], shape[1], shape[2]), data)
        .map_err(|e| ScoutError::ArrayFormatError(e.to_string()))
}

pub fn save_npy(path: &Path, array: &Array3<u8>) -> ScoutResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_npy(&mut writer, array)?;
    writer.flush()?;
    Ok(())
}

pub fn load_npy(path: &Path) -> ScoutResult<Array3<u8>> {
    let mut reader = BufReader::new(File::open(path)?);
    read_npy(&mut reader)
}
