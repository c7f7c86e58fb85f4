//! Checks that narrow a [`SeriesTable`] down to a single volume.
//!
//! [`retain_series_identity`] must run before [`retain_orientation`] so the
//! orientation tolerance is only applied inside one series.

use std::collections::HashSet;

use crate::{
    diagnostics::{Diagnostic, Diagnostics},
    geometry::{NORMAL_DOT_TOLERANCE, dot},
    series_table::{AttributeRecord, ReferenceDescriptor, SeriesTable},
};

/// Raised when several files share one slice position, i.e. the directory
/// holds more than one volume (typically a dynamic series).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultiVolumeSignal {
    pub files: usize,
    pub unique_positions: usize,
}

/// Remove every record whose SeriesInstanceUID differs from the reference.
pub fn retain_series_identity(
    table: &mut SeriesTable,
    reference: &ReferenceDescriptor,
    diagnostics: &mut impl Diagnostics,
) {
    table.records.retain(|record| {
        if record.series_uid == reference.series_uid {
            return true;
        }
        diagnostics.report(Diagnostic::SeriesMismatch {
            path: record.path.clone(),
            expected: reference.series_uid.clone(),
            found: record.series_uid.clone(),
        });
        false
    });
}

/// Remove every record whose orientation differs from the reference by more
/// than [`NORMAL_DOT_TOLERANCE`].
pub fn retain_orientation(
    table: &mut SeriesTable,
    reference: &ReferenceDescriptor,
    diagnostics: &mut impl Diagnostics,
) {
    table.records.retain(|record| {
        let dot_normals = match orientation_matches(record, reference) {
            Ok(()) => return true,
            Err(dot_normals) => dot_normals,
        };
        diagnostics.report(Diagnostic::OrientationMismatch {
            path: record.path.clone(),
            dot: dot_normals,
        });
        false
    });
}

/// `Err` carries the dot product of the normals, if both were available.
fn orientation_matches(
    record: &AttributeRecord,
    reference: &ReferenceDescriptor,
) -> Result<(), Option<f64>> {
    if record.orientation == reference.orientation {
        return Ok(());
    }
    let (Some(normal), Some(reference_normal)) = (record.normal, reference.normal) else {
        return Err(None);
    };
    let dot_normals = dot(&normal, &reference_normal);
    if dot_normals >= NORMAL_DOT_TOLERANCE {
        Ok(())
    } else {
        Err(Some(dot_normals))
    }
}

/// Detect repeated slice positions. Records without a position all share the
/// empty position and therefore count as repeats of each other.
pub fn detect_multi_volume(
    table: &SeriesTable,
    diagnostics: &mut impl Diagnostics,
) -> Option<MultiVolumeSignal> {
    let unique_positions = table
        .records
        .iter()
        .map(|record| record.position.as_str())
        .collect::<HashSet<_>>()
        .len();

    if unique_positions < table.len() {
        let signal = MultiVolumeSignal {
            files: table.len(),
            unique_positions,
        };
        diagnostics.report(Diagnostic::MultiVolumetric {
            files: signal.files,
            unique_positions,
        });
        Some(signal)
    } else {
        None
    }
}
