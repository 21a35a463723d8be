//! Minimal XMP packet reader.
//!
//! XMP is stored as an uncompressed XML packet in every container we index
//! (JPEG APP1, PNG iTXt, TIFF tag 700, WebP `XMP ` chunk), so the packet is
//! located by scanning the raw bytes for `<x:xmpmeta` rather than by walking
//! each container's structure.
//!
//! Extracts the first list item of:
//! - `dc:title` (an `rdf:Alt`): title
//! - `dc:creator` (an `rdf:Seq`): creator

const PACKET_START: &[u8] = b"<x:xmpmeta";
const PACKET_END: &[u8] = b"</x:xmpmeta>";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpData {
    pub title: Option<String>,
    pub creator: Option<String>,
}

/// Read Dublin Core title and creator from the first XMP packet in `data`.
pub fn read_xmp(data: &[u8]) -> XmpData {
    let Some(start) = find_bytes(data, PACKET_START) else {
        return XmpData::default();
    };
    let end = find_bytes(&data[start..], PACKET_END)
        .map(|e| start + e + PACKET_END.len())
        .unwrap_or(data.len());
    let packet = String::from_utf8_lossy(&data[start..end]);

    XmpData {
        title: first_list_item(&packet, "dc:title"),
        creator: first_list_item(&packet, "dc:creator"),
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Text of the first non-empty `<rdf:li>` inside `<element>…</element>`.
fn first_list_item(packet: &str, element: &str) -> Option<String> {
    let open = format!("<{element}");
    let close = format!("</{element}>");

    let mut search_from = 0;
    let body_start = loop {
        let found = search_from + packet[search_from..].find(&open)?;
        let after = found + open.len();
        // Reject prefixes of longer names such as `dc:titleAlt`.
        match packet[after..].chars().next() {
            Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r') => break after,
            _ => search_from = after,
        }
    };
    let body_end = body_start + packet[body_start..].find(&close)?;
    let body = &packet[body_start..body_end];

    let mut rest = body;
    while let Some(li) = rest.find("<rdf:li") {
        let tag_end = li + rest[li..].find('>')?;
        if rest[..tag_end].ends_with('/') {
            rest = &rest[tag_end + 1..];
            continue;
        }
        let content_start = tag_end + 1;
        let content_end = content_start + rest[content_start..].find("</rdf:li>")?;
        let value = unescape(rest[content_start..content_end].trim());
        if !value.is_empty() {
            return Some(value);
        }
        rest = &rest[content_end..];
    }
    None
}

/// Decode the five predefined XML entities and numeric character references.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
