use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::{
    enums::ReadMode,
    geometry::{DEGENERATE_POSITION, dot, parse_position, slice_normal},
    source::{SliceAttributes, SliceSource, SourceError},
};

/// Identity and orientation of the seed file. Every candidate is measured
/// against it.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceDescriptor {
    pub path: PathBuf,
    pub series_uid: String,
    pub orientation: String,
    pub normal: Option<[f64; 3]>,
}

impl ReferenceDescriptor {
    pub fn from_attributes(path: impl Into<PathBuf>, attributes: &SliceAttributes) -> Self {
        let orientation = attributes.orientation.clone().unwrap_or_default();
        Self {
            path: path.into(),
            series_uid: attributes.series_uid.clone().unwrap_or_default(),
            normal: slice_normal(&orientation),
            orientation,
        }
    }
}

/// Attributes of one candidate file. Absent attributes are stored as empty
/// strings, never as an error.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeRecord {
    pub path: PathBuf,
    pub series_uid: String,
    pub orientation: String,
    pub normal: Option<[f64; 3]>,
    pub position: String,
    pub position_lps: [f64; 3],
    /// Position projected onto the reference normal; the sort key.
    pub projection: f64,
    /// Projection is meaningless: no position or no reference normal.
    pub degenerate: bool,
}

impl AttributeRecord {
    pub fn new(
        path: impl Into<PathBuf>,
        attributes: SliceAttributes,
        reference: &ReferenceDescriptor,
    ) -> Self {
        let orientation = attributes.orientation.unwrap_or_default();
        let position = attributes.position.unwrap_or_default();
        let parsed_position = parse_position(&position);

        let position_lps = parsed_position.unwrap_or(DEGENERATE_POSITION);
        let projection = dot(&position_lps, &reference.normal.unwrap_or_default());

        Self {
            path: path.into(),
            series_uid: attributes.series_uid.unwrap_or_default(),
            normal: slice_normal(&orientation),
            orientation,
            position,
            position_lps,
            projection,
            degenerate: parsed_position.is_none() || reference.normal.is_none(),
        }
    }
}

/// The candidate records, in enumeration order until sequenced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesTable {
    pub records: Vec<AttributeRecord>,
}

impl SeriesTable {
    /// Read every candidate once. Recognition is part of that read: files the
    /// source does not recognize or cannot read are left out without comment.
    pub fn build<S: SliceSource>(
        source: &S,
        candidates: &[PathBuf],
        reference: &ReferenceDescriptor,
        read_mode: ReadMode,
    ) -> Self {
        let read = |path: &PathBuf| Self::read_record(source, path, reference);

        let records = match read_mode {
            ReadMode::Parallel => candidates
                .par_iter()
                .map(read)
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect(),
            ReadMode::Sequential => candidates.iter().filter_map(read).collect(),
        };

        Self { records }
    }

    fn read_record<S: SliceSource>(
        source: &S,
        path: &Path,
        reference: &ReferenceDescriptor,
    ) -> Option<AttributeRecord> {
        match source.read_attributes(path) {
            Ok(attributes) => Some(AttributeRecord::new(path, attributes, reference)),
            Err(SourceError::UnsupportedSopClass(sop_class)) => {
                trace!(path = %path.display(), %sop_class, "Skipping unrecognized file");
                None
            }
            Err(error) => {
                trace!(path = %path.display(), %error, "Skipping unreadable file");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.records.iter().map(|record| record.path.as_path())
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.records.into_iter().map(|record| record.path).collect()
    }
}
