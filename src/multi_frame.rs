//! Enhanced multi-frame header synthesized from a sequence of single-frame
//! files.
//!
//! Attributes that are constant across the volume go into one shared
//! functional group, read from the first file of the sequence only. The first
//! file is assumed to be representative of the whole series; nothing checks
//! that the remaining files agree. Each file contributes one per-frame group
//! holding its own position.

use dicom::{
    core::{DataElement, PrimitiveValue, Tag, VR, value::DataSetSequence},
    object::{InMemDicomObject, mem::InMemElement},
};
use dicom_dictionary_std::tags;
use std::path::PathBuf;
use thiserror::Error;

use crate::{
    geometry::parse_values,
    source::{SliceAttributes, SliceSource, SourceError},
};

/// FrameAcquisitionDuration written when the duration is not known.
pub const FRAME_ACQUISITION_DURATION_UNKNOWN: f64 = -1.0;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Cannot synthesize a multi-frame header without frames")]
    EmptySeries,

    #[error("Frame {index} ({path}) could not be read: {source}")]
    FrameUnreadable {
        index: usize,
        path: PathBuf,
        source: SourceError,
    },
}

/// Attributes shared by all frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharedFunctionalGroups {
    pub pixel_spacing: Option<String>,
    pub slice_thickness: Option<String>,
    pub orientation: Option<String>,
    pub receive_coil_name: Option<String>,
}

/// Timing of a single frame. Single-frame sources carry no frame timing, so
/// the datetimes stay empty and the duration is unknown.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameContent {
    pub acquisition_datetime: Option<String>,
    pub reference_datetime: Option<String>,
    pub acquisition_duration: f64,
}

impl Default for FrameContent {
    fn default() -> Self {
        Self {
            acquisition_datetime: None,
            reference_datetime: None,
            acquisition_duration: FRAME_ACQUISITION_DURATION_UNKNOWN,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerFrameFunctionalGroups {
    pub frame_content: FrameContent,
    pub position: Option<String>,
}

/// Multi-frame description of an ordered series. The number of frames is
/// fixed when the header is synthesized.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiFrameHeader {
    study_uid: Option<String>,
    rows: Option<u16>,
    columns: Option<u16>,
    shared: SharedFunctionalGroups,
    per_frame: Vec<PerFrameFunctionalGroups>,
}

/// Build the header for `ordered`, which must be in final stacking order.
///
/// `seed` holds the attributes of `ordered[0]` and provides the top level and
/// shared attributes. Every file is read once more for its per-frame group.
pub fn synthesize<S: SliceSource>(
    source: &S,
    ordered: &[PathBuf],
    seed: &SliceAttributes,
) -> Result<MultiFrameHeader, SynthesisError> {
    if ordered.is_empty() {
        return Err(SynthesisError::EmptySeries);
    }

    let shared = SharedFunctionalGroups {
        pixel_spacing: seed.pixel_spacing.clone(),
        slice_thickness: seed.slice_thickness.clone(),
        orientation: seed.orientation.clone(),
        receive_coil_name: seed.receive_coil_name.clone(),
    };

    let per_frame = ordered
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let attributes =
                source
                    .read_attributes(path)
                    .map_err(|error| SynthesisError::FrameUnreadable {
                        index,
                        path: path.clone(),
                        source: error,
                    })?;
            Ok(PerFrameFunctionalGroups {
                frame_content: FrameContent::default(),
                position: attributes.position,
            })
        })
        .collect::<Result<Vec<_>, SynthesisError>>()?;

    Ok(MultiFrameHeader {
        study_uid: seed.study_uid.clone(),
        rows: seed.rows,
        columns: seed.columns,
        shared,
        per_frame,
    })
}

impl MultiFrameHeader {
    pub fn number_of_frames(&self) -> usize {
        self.per_frame.len()
    }

    pub fn study_uid(&self) -> Option<&str> {
        self.study_uid.as_deref()
    }

    pub fn rows(&self) -> Option<u16> {
        self.rows
    }

    pub fn columns(&self) -> Option<u16> {
        self.columns
    }

    pub fn shared(&self) -> &SharedFunctionalGroups {
        &self.shared
    }

    pub fn per_frame(&self) -> &[PerFrameFunctionalGroups] {
        &self.per_frame
    }

    /// Voxel spacing as (row spacing, column spacing, slice thickness).
    pub fn spacing(&self) -> Option<(f32, f32, f32)> {
        let pixel_spacing = parse_values(self.shared.pixel_spacing.as_deref()?)?;
        let slice_thickness = self.shared.slice_thickness.as_deref()?.trim().parse().ok()?;
        match pixel_spacing[..] {
            [row, column] => Some((row as f32, column as f32, slice_thickness)),
            _ => None,
        }
    }

    /// Render as an enhanced multi-frame data set: NumberOfFrames plus the
    /// Shared and Per-frame Functional Groups sequences.
    pub fn to_dicom_object(&self) -> InMemDicomObject {
        let shared = &self.shared;
        let shared_item = InMemDicomObject::from_element_iter([
            sequence(
                tags::PIXEL_MEASURES_SEQUENCE,
                [item([
                    string_element(tags::PIXEL_SPACING, VR::DS, &shared.pixel_spacing),
                    string_element(tags::SLICE_THICKNESS, VR::DS, &shared.slice_thickness),
                ])],
            ),
            sequence(
                tags::PLANE_ORIENTATION_SEQUENCE,
                [item([string_element(
                    tags::IMAGE_ORIENTATION_PATIENT,
                    VR::DS,
                    &shared.orientation,
                )])],
            ),
            sequence(
                tags::MR_RECEIVE_COIL_SEQUENCE,
                [item([string_element(
                    tags::RECEIVE_COIL_NAME,
                    VR::SH,
                    &shared.receive_coil_name,
                )])],
            ),
        ]);

        let per_frame_items = self.per_frame.iter().map(|frame| {
            let content = &frame.frame_content;
            item([
                sequence(
                    tags::FRAME_CONTENT_SEQUENCE,
                    [item([
                        string_element(
                            tags::FRAME_ACQUISITION_DATE_TIME,
                            VR::DT,
                            &content.acquisition_datetime,
                        ),
                        string_element(
                            tags::FRAME_REFERENCE_DATE_TIME,
                            VR::DT,
                            &content.reference_datetime,
                        ),
                        DataElement::new(
                            tags::FRAME_ACQUISITION_DURATION,
                            VR::FD,
                            PrimitiveValue::from(content.acquisition_duration),
                        ),
                    ])],
                ),
                sequence(
                    tags::PLANE_POSITION_SEQUENCE,
                    [item([string_element(
                        tags::IMAGE_POSITION_PATIENT,
                        VR::DS,
                        &frame.position,
                    )])],
                ),
            ])
        });

        let mut dicom_object = InMemDicomObject::from_element_iter([
            DataElement::new(
                tags::NUMBER_OF_FRAMES,
                VR::IS,
                PrimitiveValue::from(self.number_of_frames().to_string()),
            ),
            sequence(tags::SHARED_FUNCTIONAL_GROUPS_SEQUENCE, [shared_item]),
            sequence(tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE, per_frame_items),
        ]);

        if let Some(study_uid) = &self.study_uid {
            dicom_object.put(DataElement::new(
                tags::STUDY_INSTANCE_UID,
                VR::UI,
                PrimitiveValue::from(study_uid.as_str()),
            ));
        }
        if let Some(rows) = self.rows {
            dicom_object.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)));
        }
        if let Some(columns) = self.columns {
            dicom_object.put(DataElement::new(
                tags::COLUMNS,
                VR::US,
                PrimitiveValue::from(columns),
            ));
        }

        dicom_object
    }
}

fn item(elements: impl IntoIterator<Item = InMemElement>) -> InMemDicomObject {
    InMemDicomObject::from_element_iter(elements)
}

fn sequence(tag: Tag, items: impl IntoIterator<Item = InMemDicomObject>) -> InMemElement {
    DataElement::new(
        tag,
        VR::SQ,
        DataSetSequence::from(items.into_iter().collect::<Vec<_>>()),
    )
}

/// Absent values become empty elements, as the attribute is still required.
fn string_element(tag: Tag, vr: VR, value: &Option<String>) -> InMemElement {
    match value {
        Some(value) => DataElement::new(tag, vr, PrimitiveValue::from(value.as_str())),
        None => DataElement::empty(tag, vr),
    }
}
