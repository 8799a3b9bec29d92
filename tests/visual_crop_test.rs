//! Crops a true-colour GeoTIFF laid out the way GDAL writes Sentinel-2
//! `visual` COGs: a structural-metadata block ahead of the IFD, SHORT
//! dimensions, multi-value tags stored out of line, deflate with horizontal
//! differencing and sized tile leaders.

use std::io::{Cursor, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;

use pondscout::coordinate::{BoundingBox, CoordinateSystem, CoordinateTransformer, Point};
use pondscout::imagery::crop_visual;
use pondscout::tiff::TiffReader;

const SIZE: u32 = 40;
const TILE: u32 = 16;
const PIXEL: f64 = 10.0;
const BLUE: u8 = 200;

const SHORT: u16 = 3;
const LONG: u16 = 4;
const ASCII: u16 = 2;
const DOUBLE: u16 = 12;

struct Entry {
    tag: u16,
    field_type: u16,
    count: u32,
    data: Vec<u8>,
}

fn shorts(tag: u16, values: &[u16]) -> Entry {
    let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    Entry { tag, field_type: SHORT, count: values.len() as u32, data }
}

fn longs(tag: u16, values: &[u32]) -> Entry {
    let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    Entry { tag, field_type: LONG, count: values.len() as u32, data }
}

fn doubles(tag: u16, values: &[f64]) -> Entry {
    let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    Entry { tag, field_type: DOUBLE, count: values.len() as u32, data }
}

fn ascii(tag: u16, text: &str) -> Entry {
    let mut data = text.as_bytes().to_vec();
    data.push(0);
    Entry { tag, field_type: ASCII, count: data.len() as u32, data }
}

/// Red encodes the column, green the row, blue is constant
fn rgb(col: u32, row: u32) -> [u8; 3] {
    [(col * 6) as u8, (row * 6) as u8, BLUE]
}

/// Deflated tiles in row-major order, edge tiles padded with zeros
fn encode_tiles() -> Vec<Vec<u8>> {
    let across = (SIZE + TILE - 1) / TILE;
    let mut tiles = Vec::new();

    for ty in 0..across {
        for tx in 0..across {
            let mut raw = Vec::with_capacity((TILE * TILE * 3) as usize);
            for r in 0..TILE {
                let mut row: Vec<u8> = Vec::with_capacity((TILE * 3) as usize);
                for c in 0..TILE {
                    let (col, line) = (tx * TILE + c, ty * TILE + r);
                    if col < SIZE && line < SIZE {
                        row.extend_from_slice(&rgb(col, line));
                    } else {
                        row.extend_from_slice(&[0, 0, 0]);
                    }
                }
                for i in (3..row.len()).rev() {
                    row[i] = row[i].wrapping_sub(row[i - 3]);
                }
                raw.extend_from_slice(&row);
            }

            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&raw).unwrap();
            tiles.push(encoder.finish().unwrap());
        }
    }

    tiles
}

fn entries(origin: (f64, f64), offsets: &[u32], counts: &[u32]) -> Vec<Entry> {
    vec![
        shorts(256, &[SIZE as u16]),
        shorts(257, &[SIZE as u16]),
        shorts(258, &[8, 8, 8]),
        shorts(259, &[8]),
        shorts(262, &[2]),
        shorts(277, &[3]),
        shorts(284, &[1]),
        shorts(317, &[2]),
        shorts(322, &[TILE as u16]),
        shorts(323, &[TILE as u16]),
        longs(324, offsets),
        longs(325, counts),
        shorts(339, &[1, 1, 1]),
        doubles(33550, &[PIXEL, PIXEL, 0.0]),
        doubles(33922, &[0.0, 0.0, 0.0, origin.0, origin.1, 0.0]),
        shorts(34735, &[
            1, 1, 0, 4,
            1024, 0, 1, 1,
            1025, 0, 1, 1,
            1026, 34737, 22, 0,
            3072, 0, 1, 32748,
        ]),
        ascii(34737, "WGS 84 / UTM zone 48S|"),
        ascii(42113, "0"),
    ]
}

/// Classic little-endian TIFF with the IFD ahead of the tile data
fn visual_cog(origin: (f64, f64)) -> Vec<u8> {
    let ghost = b"GDAL_STRUCTURAL_METADATA_SIZE=000140 bytes\n\
LAYOUT=IFDS_BEFORE_DATA\nBLOCK_ORDER=ROW_MAJOR\nBLOCK_LEADER=SIZE_AS_UINT4\n\
BLOCK_TRAILER=LAST_4_BYTES_REPEATED\nKNOWN_INCOMPATIBLE_EDITION=NO\n ";
    let tiles = encode_tiles();
    let counts: Vec<u32> = tiles.iter().map(|t| t.len() as u32).collect();

    let ifd_offset = (8 + ghost.len() + 1) & !1;
    let placeholder = vec![0u32; tiles.len()];
    let layout = entries(origin, &placeholder, &counts);
    let ifd_end = ifd_offset + 2 + 12 * layout.len() + 4;
    let extras: usize = layout.iter()
        .filter(|e| e.data.len() > 4)
        .map(|e| (e.data.len() + 1) & !1)
        .sum();

    // Each tile is preceded by its size and followed by its last 4 bytes
    let mut offsets = Vec::with_capacity(tiles.len());
    let mut position = ifd_end + extras;
    for tile in &tiles {
        offsets.push((position + 4) as u32);
        position += 4 + tile.len() + 4;
    }

    let mut out = Vec::with_capacity(position);
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&(ifd_offset as u32).to_le_bytes());
    out.extend_from_slice(ghost);
    out.resize(ifd_offset, 0);

    let entries = entries(origin, &offsets, &counts);
    let mut extra_data = Vec::new();
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in &entries {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.field_type.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        if entry.data.len() <= 4 {
            let mut inline = entry.data.clone();
            inline.resize(4, 0);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&((ifd_end + extra_data.len()) as u32).to_le_bytes());
            extra_data.extend_from_slice(&entry.data);
            if extra_data.len() % 2 == 1 {
                extra_data.push(0);
            }
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&extra_data);

    for tile in &tiles {
        out.extend_from_slice(&(tile.len() as u32).to_le_bytes());
        out.extend_from_slice(tile);
        out.extend_from_slice(&tile[tile.len() - 4..]);
    }

    assert_eq!(out.len(), position);
    out
}

fn utm_48s() -> CoordinateSystem {
    CoordinateSystem::UTM(48, false)
}

/// Raster origin placing `(lat, lon)` at the centre of the grid
fn origin_around(lat: f64, lon: f64) -> (f64, f64) {
    let center = CoordinateTransformer
        .transform_point(&Point::from_lat_lon(lat, lon), &CoordinateSystem::WGS84, &utm_48s())
        .unwrap();
    let half = SIZE as f64 * PIXEL / 2.0;
    ((center.x - half).round(), (center.y + half).round())
}

#[test]
fn out_of_line_layout_tags_are_read() {
    let bytes = visual_cog((700000.0, 9150000.0));
    let mut reader = TiffReader::new();
    let mut cursor = Cursor::new(bytes);
    let tiff = reader.read(&mut cursor).unwrap();

    let ifd = tiff.main_ifd().unwrap();
    assert_eq!(ifd.get_dimensions(), Some((SIZE as u64, SIZE as u64)));
    assert_eq!(reader.read_tag_u64s(&mut cursor, ifd, 339).unwrap(), vec![1, 1, 1]);
    assert_eq!(reader.read_tag_u64s(&mut cursor, ifd, 258).unwrap(), vec![8, 8, 8]);
}

#[test]
fn visual_asset_is_cropped_around_a_pond() {
    let (lat, lon) = (-7.675039, 107.769191);
    let origin = origin_around(lat, lon);
    let bbox = BoundingBox::around(lat, lon, 50.0);

    let image = crop_visual(Cursor::new(visual_cog(origin)), &bbox).unwrap();

    let native = CoordinateTransformer
        .transform_bbox(&bbox, &CoordinateSystem::WGS84, &utm_48s())
        .unwrap();
    let first_col = ((native.min_x - origin.0) / PIXEL).floor() as u32;
    let first_row = ((origin.1 - native.max_y) / PIXEL).floor() as u32;
    let last_col = ((native.max_x - origin.0) / PIXEL).ceil() as u32;
    let last_row = ((origin.1 - native.min_y) / PIXEL).ceil() as u32;

    assert_eq!(image.width(), (last_col - first_col) as usize);
    assert_eq!(image.height(), (last_row - first_row) as usize);
    assert!((10..=12).contains(&image.width()), "width {}", image.width());

    let view = image.view();
    for r in 0..image.height() {
        for c in 0..image.width() {
            let expected = rgb(first_col + c as u32, first_row + r as u32);
            let actual = [view[[0, r, c]], view[[1, r, c]], view[[2, r, c]]];
            assert_eq!(actual, expected, "row {} col {}", r, c);
        }
    }
}
