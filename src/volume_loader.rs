use crate::{
    diagnostics::{Diagnostics, TracingDiagnostics},
    enums::SeriesOptions,
    multi_frame::{SynthesisError, synthesize},
    series_resolver::{SeriesError, SeriesResolution, SeriesResolver},
    source::{SliceSource, SourceError},
    volume::Volume,
};

use ndarray::{Array3, Axis};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use web_time::Instant;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("Inconsistent image dimensions in frame {index} ({path}): expected {expected:?}, found {found:?}")]
    InconsistentDimensions {
        index: usize,
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Buffer holds {frames} frames but {files} files were given")]
    FrameCountMismatch { frames: usize, files: usize },

    #[error("Missing Rows/Columns in {0}")]
    MissingDimensions(PathBuf),

    #[error("Could not read {path}: {source}")]
    Source { path: PathBuf, source: SourceError },

    #[error("Pixel data of frame {index} ({path}) could not be loaded: {source}")]
    Pixel {
        index: usize,
        path: PathBuf,
        source: SourceError,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load the volume the given DICOM file belongs to.
    ///
    /// The other files of the series are looked up in the same directory.
    /// If the directory holds several volumes, the result contains only the
    /// given file.
    ///
    /// # Errors
    ///
    /// Returns error if the input file cannot be read, or if a file of the
    /// resolved series cannot be decoded or has differing dimensions
    pub fn load_from_seed(
        seed: impl AsRef<Path>,
        options: SeriesOptions,
    ) -> Result<Volume, VolumeLoaderError> {
        Self::load_with(&SeriesResolver::new(options), seed, &mut TracingDiagnostics)
    }

    /// Like [`VolumeLoader::load_from_seed`] with a custom resolver and
    /// diagnostics receiver.
    pub fn load_with<S: SliceSource>(
        resolver: &SeriesResolver<S>,
        seed: impl AsRef<Path>,
        diagnostics: &mut impl Diagnostics,
    ) -> Result<Volume, VolumeLoaderError> {
        let resolution = resolver.resolve_with(seed, diagnostics)?;
        Self::assemble(resolver.source(), resolution)
    }

    /// Synthesize the header and load the pixels of an already resolved
    /// series.
    pub fn assemble<S: SliceSource>(
        source: &S,
        resolution: SeriesResolution,
    ) -> Result<Volume, VolumeLoaderError> {
        let files = resolution.files();
        let first = files.first().ok_or(SynthesisError::EmptySeries)?;
        let seed_header = source
            .read_attributes(first)
            .map_err(|error| VolumeLoaderError::Source {
                path: first.clone(),
                source: error,
            })?;
        let header = synthesize(source, files, &seed_header)?;

        let (Some(rows), Some(columns)) = (header.rows(), header.columns()) else {
            return Err(VolumeLoaderError::MissingDimensions(first.clone()));
        };
        let mut data = Array3::<u16>::zeros((files.len(), rows as usize, columns as usize));
        Self::load_pixels(source, files, &mut data)?;

        Ok(Volume::new(data, header, resolution))
    }

    /// Decode every file into its frame of `buffer`: `ordered[i]` is written
    /// to `buffer[i, .., ..]`. The order must be the one used to synthesize
    /// the header.
    pub fn load_pixels<S: SliceSource>(
        source: &S,
        ordered: &[PathBuf],
        buffer: &mut Array3<u16>,
    ) -> Result<(), VolumeLoaderError> {
        let (frames, rows, columns) = buffer.dim();
        if frames != ordered.len() {
            return Err(VolumeLoaderError::FrameCountMismatch {
                frames,
                files: ordered.len(),
            });
        }

        let start = Instant::now();
        buffer
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(ordered.par_iter())
            .enumerate()
            .try_for_each(|(index, (mut frame, path))| {
                let pixels =
                    source
                        .read_pixels(path)
                        .map_err(|error| VolumeLoaderError::Pixel {
                            index,
                            path: path.clone(),
                            source: error,
                        })?;
                if pixels.dim() != (rows, columns) {
                    return Err(VolumeLoaderError::InconsistentDimensions {
                        index,
                        path: path.clone(),
                        expected: (rows, columns),
                        found: pixels.dim(),
                    });
                }
                frame.assign(&pixels);
                Ok(())
            })?;
        debug!(frames, elapsed = ?start.elapsed(), "Loaded pixel data");

        Ok(())
    }
}
