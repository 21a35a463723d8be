//! Minimal IPTC-IIM parser for JPEG and TIFF files.
//!
//! Extracts two fields from IPTC Record 2:
//! - ObjectName (2:05): title
//! - By-line (2:80): creator
//!
//! For JPEG: reads from APP13 marker (Photoshop 8BIM resource 0x0404).
//! For TIFF: reads from IFD tag 33723 (IPTC-NAA, raw IIM bytes) or 34377
//! (Photoshop resources).
//!
//! The container is detected from the leading bytes, not the file extension,
//! so misnamed files still parse.

/// IPTC metadata extracted from an image file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IptcData {
    pub object_name: Option<String>,
    pub byline: Option<String>,
}

impl IptcData {
    fn is_empty(&self) -> bool {
        self.object_name.is_none() && self.byline.is_none()
    }
}

/// Read IPTC metadata from raw file bytes.
/// Returns default (empty) metadata for other containers or on any parse failure.
pub fn read_iptc(data: &[u8]) -> IptcData {
    if data.starts_with(&[0xFF, 0xD8]) {
        read_iptc_from_jpeg(data)
    } else if data.starts_with(b"II") || data.starts_with(b"MM") {
        read_iptc_from_tiff(data)
    } else {
        IptcData::default()
    }
}

// ---------------------------------------------------------------------------
// IPTC-IIM record parsing
// ---------------------------------------------------------------------------

/// Parse raw IPTC-IIM bytes into structured metadata.
///
/// IIM record format (each dataset):
///   Byte 0:    0x1C (tag marker)
///   Byte 1:    Record number (we want 0x02)
///   Byte 2:    Dataset number (0x05=ObjectName, 0x50=By-line)
///   Bytes 3-4: Data length (big-endian u16)
///   Bytes 5+:  Data (UTF-8/ASCII string)
///
/// By-line is repeatable; the first non-empty one wins.
fn parse_iptc_iim(data: &[u8]) -> IptcData {
    let mut result = IptcData::default();
    let mut pos = 0;

    while pos + 5 <= data.len() {
        if data[pos] != 0x1C {
            pos += 1;
            continue;
        }

        let record = data[pos + 1];
        let dataset = data[pos + 2];
        let length = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as usize;
        pos += 5;

        if pos + length > data.len() {
            break;
        }

        if record == 2 {
            let value = String::from_utf8_lossy(&data[pos..pos + length])
                .trim()
                .to_string();

            if !value.is_empty() {
                match dataset {
                    5 => result.object_name = Some(value),
                    80 if result.byline.is_none() => result.byline = Some(value),
                    _ => {}
                }
            }
        }

        pos += length;
    }

    result
}

// ---------------------------------------------------------------------------
// JPEG: extract IPTC from APP13 / Photoshop 8BIM
// ---------------------------------------------------------------------------

fn read_iptc_from_jpeg(data: &[u8]) -> IptcData {
    let Some(iptc_bytes) = find_jpeg_app13_iptc(data) else {
        return IptcData::default();
    };
    parse_iptc_iim(iptc_bytes)
}

const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const BIM_MARKER: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;

/// Find the raw IPTC-IIM bytes inside a JPEG's APP13 segment.
fn find_jpeg_app13_iptc(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 0;
    while pos + 4 < data.len() {
        if data[pos] == 0xFF && data[pos + 1] == 0xED {
            let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let seg_start = pos + 4;
            let seg_end = (pos + 2 + seg_len).min(data.len());
            if seg_start <= seg_end
                && let Some(iptc) = extract_iptc_from_8bim(&data[seg_start..seg_end])
            {
                return Some(iptc);
            }
        }

        // Advance: if 0xFF, skip marker + length; otherwise byte-by-byte
        if data[pos] == 0xFF && pos + 3 < data.len() && data[pos + 1] != 0x00 {
            let marker = data[pos + 1];
            // SOS (0xDA) means image data starts, stop scanning
            if marker == 0xDA {
                break;
            }
            // Markers without length field
            if marker == 0xD8 || marker == 0xD9 || (0xD0..=0xD7).contains(&marker) {
                pos += 2;
            } else {
                let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                pos += 2 + len;
            }
        } else {
            pos += 1;
        }
    }
    None
}

/// Extract IPTC-IIM bytes from a Photoshop 8BIM resource block.
fn extract_iptc_from_8bim(segment: &[u8]) -> Option<&[u8]> {
    let data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);

    let mut pos = 0;
    while pos + 12 <= data.len() {
        // Each resource: "8BIM" (4) + resource_id (2) + pascal_string + data_len (4) + data
        if &data[pos..pos + 4] != BIM_MARKER {
            pos += 1;
            continue;
        }
        pos += 4;

        let resource_id = u16::from_be_bytes([data[pos], data[pos + 1]]);
        pos += 2;

        // Pascal string: 1 byte length + string, padded to even total
        let pascal_len = data[pos] as usize;
        pos += 1 + pascal_len + ((1 + pascal_len) % 2);

        if pos + 4 > data.len() {
            break;
        }
        let res_len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        pos += 4;

        if pos + res_len > data.len() {
            break;
        }

        if resource_id == IPTC_RESOURCE_ID {
            return Some(&data[pos..pos + res_len]);
        }

        pos += res_len + (res_len % 2);
    }

    None
}

// ---------------------------------------------------------------------------
// TIFF: extract IPTC from IFD tags
// ---------------------------------------------------------------------------

/// Read IPTC-IIM from a TIFF file.
///
/// Looks for IFD tag 33723 (IPTC-NAA, raw IIM bytes) first,
/// then tag 34377 (Photoshop 8BIM resource block).
fn read_iptc_from_tiff(data: &[u8]) -> IptcData {
    if data.len() < 8 {
        return IptcData::default();
    }

    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return IptcData::default(),
    };

    let read_u16 = |offset: usize| -> Option<u16> {
        let bytes: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
        Some(if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    };

    let read_u32 = |offset: usize| -> Option<u32> {
        let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    };

    if read_u16(2) != Some(42) {
        return IptcData::default();
    }

    // TIFF type sizes: count is number of values, not bytes.
    let type_size = |typ: u16| -> usize {
        match typ {
            1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
            3 | 8 => 2,         // SHORT, SSHORT
            4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
            5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
            _ => 1,
        }
    };

    let mut ifd_offset = read_u32(4).unwrap_or(0) as usize;
    // Bounded so a cyclic IFD chain cannot spin forever.
    let mut remaining_ifds = 16;

    while ifd_offset > 0 && remaining_ifds > 0 {
        remaining_ifds -= 1;
        let Some(entry_count) = read_u16(ifd_offset) else {
            break;
        };
        let entry_count = entry_count as usize;
        let entries_start = ifd_offset + 2;

        for i in 0..entry_count {
            let entry_offset = entries_start + i * 12;
            let (Some(tag), Some(typ), Some(count), Some(value_offset)) = (
                read_u16(entry_offset),
                read_u16(entry_offset + 2),
                read_u32(entry_offset + 4),
                read_u32(entry_offset + 8),
            ) else {
                return IptcData::default();
            };
            let byte_len = (count as usize).saturating_mul(type_size(typ));
            let value_offset = value_offset as usize;
            let Some(value) = data.get(value_offset..value_offset.saturating_add(byte_len)) else {
                continue;
            };

            let result = match tag {
                33723 => parse_iptc_iim(value),
                34377 => extract_iptc_from_8bim(value)
                    .map(parse_iptc_iim)
                    .unwrap_or_default(),
                _ => continue,
            };
            if !result.is_empty() {
                return result;
            }
        }

        ifd_offset = read_u32(entries_start + entry_count * 12).unwrap_or(0) as usize;
    }

    IptcData::default()
}
