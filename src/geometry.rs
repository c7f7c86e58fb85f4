//! Slice geometry derived from ImageOrientationPatient / ImagePositionPatient.

/// Minimum dot product between two slice normals for them to count as the
/// same orientation (roughly 0.8 degrees). Not derived from any protocol;
/// acquisitions with coarser jitter will be split.
pub const NORMAL_DOT_TOLERANCE: f64 = 0.9999;

/// Position used for slices without ImagePositionPatient.
pub const DEGENERATE_POSITION: [f64; 3] = [-1.0, -1.0, -1.0];

/// Split a multi-valued decimal string. Both the DICOM `\` separator and
/// commas are accepted. Returns `None` if any component fails to parse.
pub fn parse_values(text: &str) -> Option<Vec<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.split(['\\', ','])
        .map(|component| component.trim().parse::<f64>().ok())
        .collect()
}

/// Canonical textual form of a multi-valued attribute: trimmed components
/// joined with `\`.
pub fn normalize_values(text: &str) -> String {
    let text = text.trim_end_matches('\0').trim();
    if text.is_empty() {
        return String::new();
    }
    text.split(['\\', ','])
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\\")
}

pub fn parse_orientation(text: &str) -> Option<[f64; 6]> {
    parse_values(text)?.try_into().ok()
}

pub fn parse_position(text: &str) -> Option<[f64; 3]> {
    parse_values(text)?.try_into().ok()
}

#[inline]
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0].mul_add(b[0], a[1].mul_add(b[1], a[2] * b[2]))
}

#[inline]
fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Unit normal of the slice plane: row cosines x column cosines.
///
/// `None` when the orientation does not hold six values or the two
/// direction cosines are parallel.
pub fn slice_normal(orientation: &str) -> Option<[f64; 3]> {
    let cosines = parse_orientation(orientation)?;
    let row = [cosines[0], cosines[1], cosines[2]];
    let column = [cosines[3], cosines[4], cosines[5]];
    let normal = cross(&row, &column);
    let length = dot(&normal, &normal).sqrt();
    if !length.is_normal() {
        return None;
    }
    Some(normal.map(|component| component / length))
}
