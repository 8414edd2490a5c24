//! GPX 1.1 track export

use chrono_tz::Tz;

use crate::models::location_point::LocationPoint;

pub const GPX_CONTENT_TYPE: &str = "application/gpx+xml";

/// ISO local date-time, no offset
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Render a single-segment track. Points are written in the order given,
/// their times shown in `tz`.
pub fn export_gpx(name: &str, points: &[LocationPoint], tz: Tz) -> String {
    let mut out = String::with_capacity(256 + points.len() * 96);

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(
        "<gpx version=\"1.1\" creator=\"stride-tracker\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n",
    );
    out.push_str("  <trk>\n");
    out.push_str(&format!("    <name>{}</name>\n", escape_xml(name)));
    out.push_str("    <trkseg>\n");

    for point in points {
        let local = point.timestamp.with_timezone(&tz);
        out.push_str(&format!(
            "      <trkpt lat=\"{}\" lon=\"{}\"><time>{}</time></trkpt>\n",
            point.latitude,
            point.longitude,
            local.format(TIME_FORMAT)
        ));
    }

    out.push_str("    </trkseg>\n");
    out.push_str("  </trk>\n");
    out.push_str("</gpx>\n");
    out
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
