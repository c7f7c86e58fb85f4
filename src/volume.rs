use ndarray::{Array3, ArrayView2, s};
use std::path::PathBuf;

use crate::{multi_frame::MultiFrameHeader, series_resolver::SeriesResolution};

/// Pixel data of a resolved series together with its synthesized header.
/// Frame `i` of `data` comes from `files[i]`.
#[derive(Debug)]
pub struct Volume {
    data: Array3<u16>,
    header: MultiFrameHeader,
    resolution: SeriesResolution,
}

impl Volume {
    pub fn new(data: Array3<u16>, header: MultiFrameHeader, resolution: SeriesResolution) -> Self {
        Self {
            data,
            header,
            resolution,
        }
    }

    /// Get the dimensions of the volume (frames, rows, columns)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<u16> {
        &self.data
    }

    /// Get a mutable reference to the underlying data
    pub fn data_mut(&mut self) -> &mut Array3<u16> {
        &mut self.data
    }

    pub fn header(&self) -> &MultiFrameHeader {
        &self.header
    }

    /// Source files in frame order.
    pub fn files(&self) -> &[PathBuf] {
        self.resolution.files()
    }

    pub fn resolution(&self) -> &SeriesResolution {
        &self.resolution
    }

    /// Voxel spacing (row spacing, column spacing, slice thickness), if the
    /// first file carried it.
    pub fn spacing(&self) -> Option<(f32, f32, f32)> {
        self.header.spacing()
    }

    pub fn frame(&self, index: usize) -> Option<ArrayView2<'_, u16>> {
        (index < self.data.dim().0).then(|| self.data.slice(s![index, .., ..]))
    }

    /// `true` when the directory held several volumes and only the input file
    /// was loaded.
    pub fn is_single_file_fallback(&self) -> bool {
        self.resolution.is_multi_volume()
    }
}
