//! GPX track extraction.
//!
//! Only `<trkpt>` elements matter; everything else in the file (metadata,
//! waypoints, extensions) is skipped. Track points with a missing or
//! non-numeric `lat`/`lon` attribute are dropped rather than failing the
//! whole file.

use anyhow::{anyhow, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use model::GeoPoint;

/// Extract ordered track points from GPX XML.
///
/// Returns an error only when the XML itself is malformed; a well-formed
/// file with no track points yields an empty vector.
pub fn parse_gpx_track(xml: &str) -> Result<Vec<GeoPoint>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut points = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    if let Some(p) = trkpt_point(e) {
                        points.push(p);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(anyhow!("invalid GPX at byte {}: {e}", reader.buffer_position())),
        }
    }
    Ok(points)
}

fn trkpt_point(e: &BytesStart<'_>) -> Option<GeoPoint> {
    let mut lat = None;
    let mut lon = None;
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().ok()?;
        match attr.key.local_name().as_ref() {
            b"lat" => lat = value.trim().parse::<f64>().ok(),
            b"lon" => lon = value.trim().parse::<f64>().ok(),
            _ => {}
        }
    }
    Some(GeoPoint { lat: lat?, lon: lon? })
}
