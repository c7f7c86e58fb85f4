use dicom::{
    object::{DefaultDicomObject, OpenFileOptions, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::{tags, uids};
use ndarray::{Array2, s};
use std::path::Path;
use thiserror::Error;

use crate::geometry::normalize_values;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("Unsupported SOP class {0:?}")]
    UnsupportedSopClass(String),

    #[error("Pixel data could not be decoded: {0}")]
    Pixel(String),
}

/// The fixed set of attributes the series resolution looks at. Every field is
/// optional: a slice with missing geometry is degraded, not rejected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliceAttributes {
    pub series_uid: Option<String>,
    pub study_uid: Option<String>,
    /// Six direction cosines, `\` separated.
    pub orientation: Option<String>,
    /// Three coordinates, `\` separated.
    pub position: Option<String>,
    /// Row and column spacing, `\` separated.
    pub pixel_spacing: Option<String>,
    pub slice_thickness: Option<String>,
    pub receive_coil_name: Option<String>,
    pub rows: Option<u16>,
    pub columns: Option<u16>,
}

/// Read access to single-slice files of one format.
///
/// Implementations must be pure: reading the same file twice yields the same
/// result. The series resolution re-reads files in every stage instead of
/// caching them, so each stage sees the files as they are on disk.
pub trait SliceSource: Sync {
    /// Whether the file is of the kind this source understands. Files that
    /// are not recognized are skipped without diagnostics.
    fn is_recognized(&self, path: &Path) -> bool;

    /// Reads the slice attributes. A file that is not recognized fails with
    /// [`SourceError::UnsupportedSopClass`], so one call both checks and reads.
    fn read_attributes(&self, path: &Path) -> Result<SliceAttributes, SourceError>;

    /// First frame of the file as a `(rows, columns)` array.
    fn read_pixels(&self, path: &Path) -> Result<Array2<u16>, SourceError>;
}

/// [`SliceSource`] for single-frame DICOM image storage files.
pub struct DicomSource {
    sop_classes: Vec<String>,
}

impl Default for DicomSource {
    fn default() -> Self {
        Self::with_sop_classes([uids::MR_IMAGE_STORAGE, uids::CT_IMAGE_STORAGE])
    }
}

impl DicomSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only files whose media storage SOP class is one of `sop_classes`.
    pub fn with_sop_classes<I, S>(sop_classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sop_classes: sop_classes.into_iter().map(Into::into).collect(),
        }
    }

    fn open_header(path: &Path) -> Result<DefaultDicomObject, SourceError> {
        Ok(OpenFileOptions::new()
            .read_until(tags::PIXEL_DATA)
            .open_file(path)?)
    }

    fn accepts(&self, sop_class: &str) -> bool {
        self.sop_classes.iter().any(|accepted| accepted == sop_class)
    }

    fn sop_class(dicom_object: &DefaultDicomObject) -> String {
        let from_meta = dicom_object.meta().media_storage_sop_class_uid();
        if !from_meta.is_empty() {
            return from_meta.to_string();
        }
        Self::string_value(dicom_object, tags::SOP_CLASS_UID).unwrap_or_default()
    }

    fn string_value(
        dicom_object: &DefaultDicomObject,
        tag: dicom::core::Tag,
    ) -> Option<String> {
        let value = dicom_object.element(tag).ok()?.to_str().ok()?;
        Some(value.trim_end_matches('\0').trim().to_string())
    }

    fn multi_value(dicom_object: &DefaultDicomObject, tag: dicom::core::Tag) -> Option<String> {
        let value = dicom_object.element(tag).ok()?.to_str().ok()?;
        Some(normalize_values(&value))
    }

    fn u16_value(dicom_object: &DefaultDicomObject, tag: dicom::core::Tag) -> Option<u16> {
        dicom_object.element(tag).ok()?.to_int::<u16>().ok()
    }
}

impl SliceSource for DicomSource {
    fn is_recognized(&self, path: &Path) -> bool {
        match Self::open_header(path) {
            Ok(dicom_object) => self.accepts(&Self::sop_class(&dicom_object)),
            Err(_) => false,
        }
    }

    fn read_attributes(&self, path: &Path) -> Result<SliceAttributes, SourceError> {
        let dicom_object = Self::open_header(path)?;
        let sop_class = Self::sop_class(&dicom_object);
        if !self.accepts(&sop_class) {
            return Err(SourceError::UnsupportedSopClass(sop_class));
        }

        Ok(SliceAttributes {
            series_uid: Self::string_value(&dicom_object, tags::SERIES_INSTANCE_UID),
            study_uid: Self::string_value(&dicom_object, tags::STUDY_INSTANCE_UID),
            orientation: Self::multi_value(&dicom_object, tags::IMAGE_ORIENTATION_PATIENT),
            position: Self::multi_value(&dicom_object, tags::IMAGE_POSITION_PATIENT),
            pixel_spacing: Self::multi_value(&dicom_object, tags::PIXEL_SPACING),
            slice_thickness: Self::string_value(&dicom_object, tags::SLICE_THICKNESS),
            receive_coil_name: Self::string_value(&dicom_object, tags::RECEIVE_COIL_NAME),
            rows: Self::u16_value(&dicom_object, tags::ROWS),
            columns: Self::u16_value(&dicom_object, tags::COLUMNS),
        })
    }

    fn read_pixels(&self, path: &Path) -> Result<Array2<u16>, SourceError> {
        let dicom_object = open_file(path)?;
        let pixel_data = dicom_object
            .decode_pixel_data()
            .map_err(|e| SourceError::Pixel(e.to_string()))?;
        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .with_voi_lut(VoiLutOption::Identity);
        pixel_data
            .to_ndarray_with_options::<u16>(&options)
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
            .map_err(|e| SourceError::Pixel(e.to_string()))
    }
}
