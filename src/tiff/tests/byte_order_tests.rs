//! Tests for byte order detection and the endian-specific readers

use std::io::Cursor;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};

fn header(marker: &[u8; 2]) -> Cursor<Vec<u8>> {
    Cursor::new(vec![marker[0], marker[1], 0, 0])
}

#[test]
fn detects_both_markers() {
    assert_eq!(ByteOrder::detect(&mut header(b"II")).unwrap(), ByteOrder::LittleEndian);
    assert_eq!(ByteOrder::detect(&mut header(b"MM")).unwrap(), ByteOrder::BigEndian);
    assert!(ByteOrder::detect(&mut header(b"XY")).is_err());
}

#[test]
fn little_endian_reads_offsets_and_doubles() {
    let mut buffer = Vec::new();
    buffer.write_u16::<LittleEndian>(42).unwrap();
    buffer.write_u32::<LittleEndian>(0x0001_0008).unwrap();
    buffer.write_u64::<LittleEndian>(0x0000_0001_0000_0010).unwrap();
    buffer.write_f64::<LittleEndian>(9150000.0).unwrap();
    let mut cursor = Cursor::new(buffer);

    let handler = LittleEndianHandler;
    assert_eq!(handler.read_u16(&mut cursor).unwrap(), 42);
    assert_eq!(handler.read_u32(&mut cursor).unwrap(), 0x0001_0008);
    assert_eq!(handler.read_u64(&mut cursor).unwrap(), 0x0000_0001_0000_0010);
    assert_eq!(handler.read_f64(&mut cursor).unwrap(), 9150000.0);
}

#[test]
fn big_endian_reads_offsets_and_doubles() {
    let mut buffer = Vec::new();
    buffer.write_u16::<BigEndian>(43).unwrap();
    buffer.write_u32::<BigEndian>(0xDEAD_BEEF).unwrap();
    buffer.write_f64::<BigEndian>(-0.000269494585236).unwrap();
    let mut cursor = Cursor::new(buffer);

    let handler = ByteOrder::BigEndian.create_handler();
    assert_eq!(handler.read_u16(&mut cursor).unwrap(), 43);
    assert_eq!(handler.read_u32(&mut cursor).unwrap(), 0xDEAD_BEEF);
    assert_eq!(handler.read_f64(&mut cursor).unwrap(), -0.000269494585236);
}

#[test]
fn short_input_is_an_error() {
    let mut cursor = Cursor::new(vec![0x01]);
    assert!(BigEndianHandler.read_u16(&mut cursor).is_err());
}
