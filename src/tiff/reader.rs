//! TIFF file reader implementation
//!
//! This module implements the TIFF/BigTIFF reader that uses the Strategy
//! pattern to handle different byte orders. It works on any seekable
//! source, so the same code reads local files and remote COG assets.

use log::{debug, trace, warn};
use std::io::{Cursor, Read, SeekFrom};

use crate::errors::{ScoutError, ScoutResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, header};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;
use crate::tiff::validation;

/// Upper bound on IFDs followed in one file
const MAX_IFDS: usize = 100;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader {
    /// Current byte order handler
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Whether currently reading BigTIFF format
    is_big_tiff: bool,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            is_big_tiff: false,
        }
    }

    fn handler(&self) -> ScoutResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref()
            .ok_or_else(|| ScoutError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Reads the header and the full IFD chain
    ///
    /// 1. Detect byte order (little/big endian)
    /// 2. Check for TIFF or BigTIFF format
    /// 3. Read all IFDs (Image File Directories)
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> ScoutResult<TIFF> {
        reader.seek(SeekFrom::Start(0))?;

        let byte_order = ByteOrder::detect(reader)?;
        let handler = byte_order.create_handler();

        let version = handler.read_u16(reader)?;
        self.is_big_tiff = match version {
            header::TIFF_VERSION => false,
            header::BIG_TIFF_VERSION => {
                validation::validate_bigtiff_header(reader, handler.as_ref())?;
                true
            },
            other => return Err(ScoutError::UnsupportedVersion(other)),
        };
        self.byte_order_handler = Some(handler);

        let first_ifd_offset = self.read_offset(reader)?;
        debug!("{} {}, first IFD at {}",
               byte_order.name(), if self.is_big_tiff { "BigTIFF" } else { "TIFF" }, first_ifd_offset);

        let file_size = validation::get_file_size(reader)?;
        validation::validate_ifd_offset(first_ifd_offset, file_size)?;

        let mut tiff = TIFF::new(self.is_big_tiff, byte_order);
        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset, file_size)?;

        if tiff.ifds.is_empty() {
            return Err(ScoutError::InvalidHeader);
        }

        debug!("Read {} IFDs", tiff.ifds.len());
        Ok(tiff)
    }

    /// Reads a chain of IFDs starting from the given offset
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, first_ifd_offset: u64, file_size: u64) -> ScoutResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut ifd_offset = first_ifd_offset;

        while ifd_offset != 0 && ifds.len() < MAX_IFDS {
            if ifd_offset >= file_size {
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", ifd_offset, file_size);
                break;
            }

            let ifd = self.read_ifd(reader, ifd_offset, ifds.len())?;

            // The entries were just consumed, so the reader sits on the next offset
            let next_ifd_offset = match self.read_offset(reader) {
                Ok(offset) => offset,
                Err(e) => {
                    warn!("Error reading next IFD offset: {}", e);
                    ifds.push(ifd);
                    break;
                }
            };

            if next_ifd_offset != 0 && (next_ifd_offset >= file_size || next_ifd_offset < 8) {
                warn!("Invalid next IFD offset: {}, stopping IFD chain", next_ifd_offset);
                ifds.push(ifd);
                break;
            }

            ifds.push(ifd);
            ifd_offset = next_ifd_offset;
        }

        Ok(ifds)
    }

    /// Reads an IFD from the reader
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> ScoutResult<IFD> {
        reader.seek(SeekFrom::Start(offset))?;

        let handler = self.handler()?;
        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };
        trace!("IFD #{} has {} entries", number, entry_count);

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            let entry = self.read_ifd_entry(reader)?;
            ifd.add_entry(entry);
        }

        Ok(ifd)
    }

    /// Reads a single IFD entry
    ///
    /// Single inline values are decoded according to their field type so
    /// that a SHORT stored in a big-endian file reads the same as in a
    /// little-endian one.
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader) -> ScoutResult<IFDEntry> {
        let handler = self.handler()?;

        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        let mut raw_value = vec![0u8; if self.is_big_tiff { 8 } else { 4 }];
        reader.read_exact(&mut raw_value)?;

        let mut entry = IFDEntry::with_raw(tag, field_type, count, 0, raw_value);
        let mut field = Cursor::new(entry.raw_value.clone());

        entry.value_offset = if entry.is_value_inline(self.is_big_tiff) && count >= 1 {
            read_scalar(&mut field, handler, field_type)?
        } else if self.is_big_tiff {
            handler.read_u64(&mut field)?
        } else {
            handler.read_u32(&mut field)? as u64
        };

        Ok(entry)
    }

    /// Reads a 4 or 8 byte offset depending on the format
    fn read_offset(&self, reader: &mut dyn SeekableReader) -> ScoutResult<u64> {
        let handler = self.handler()?;
        if self.is_big_tiff {
            Ok(handler.read_u64(reader)?)
        } else {
            Ok(handler.read_u32(reader)? as u64)
        }
    }

    /// Returns the bytes holding an entry's values, wherever they are stored
    fn entry_bytes(&self, reader: &mut dyn SeekableReader, entry: &IFDEntry) -> ScoutResult<Vec<u8>> {
        let len = entry.byte_len() as usize;
        if entry.is_value_inline(self.is_big_tiff) {
            return Ok(entry.raw_value.iter().take(len).copied().collect());
        }

        reader.seek(SeekFrom::Start(entry.value_offset))?;
        let mut buffer = vec![0u8; len];
        reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Reads a tag's values as unsigned integers
    ///
    /// Used for strip/tile offsets and byte counts, bits per sample and the
    /// GeoKey directory.
    pub fn read_tag_u64s(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> ScoutResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(ScoutError::TagNotFound(tag))?;
        let handler = self.handler()?;

        if entry.raw_value.is_empty() {
            // Entry built in memory without its value field
            return Ok(vec![entry.value_offset]);
        }

        let bytes = self.entry_bytes(reader, entry)?;
        let mut cursor = Cursor::new(bytes);
        let mut values = Vec::with_capacity(entry.count as usize);
        for _ in 0..entry.count {
            values.push(read_scalar(&mut cursor, handler, entry.field_type)?);
        }

        Ok(values)
    }

    /// Reads a tag's values as doubles (pixel scale, tiepoints, transformation)
    pub fn read_tag_f64s(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> ScoutResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(ScoutError::TagNotFound(tag))?;
        if entry.field_type != field_types::DOUBLE {
            return Err(ScoutError::UnsupportedFieldType(entry.field_type));
        }

        let handler = self.handler()?;
        let bytes = self.entry_bytes(reader, entry)?;
        let mut cursor = Cursor::new(bytes);
        let mut values = Vec::with_capacity(entry.count as usize);
        for _ in 0..entry.count {
            values.push(handler.read_f64(&mut cursor)?);
        }

        Ok(values)
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Byte order of the file that was read last
    pub fn byte_order(&self) -> Option<ByteOrder> {
        self.byte_order_handler.as_ref().map(|h| h.byte_order())
    }
}

/// Reads one integer value of the given field type
fn read_scalar(reader: &mut dyn SeekableReader, handler: &dyn ByteOrderHandler, field_type: u16) -> ScoutResult<u64> {
    let value = match field_type {
        field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED | field_types::ASCII => {
            let mut byte = [0u8; 1];
            reader.read_exact(&mut byte)?;
            byte[0] as u64
        },
        field_types::SHORT | field_types::SSHORT => handler.read_u16(reader)? as u64,
        field_types::LONG | field_types::SLONG => handler.read_u32(reader)? as u64,
        field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => handler.read_u64(reader)?,
        other => return Err(ScoutError::UnsupportedFieldType(other)),
    };

    Ok(value)
}
