use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use web_time::Instant;

use crate::{
    candidates::list_files,
    consistency::{
        MultiVolumeSignal, detect_multi_volume, retain_orientation, retain_series_identity,
    },
    diagnostics::{Diagnostic, Diagnostics, TracingDiagnostics},
    enums::SeriesOptions,
    sequencer::sequence,
    series_table::{ReferenceDescriptor, SeriesTable},
    source::{DicomSource, SliceSource, SourceError},
};

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Input file {path} could not be read: {source}")]
    SeedUnreadable { path: PathBuf, source: SourceError },

    #[error("Input file {0} is not of a supported image type")]
    SeedNotRecognized(PathBuf),

    #[error("Cannot list directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of resolving the series around a seed file.
#[derive(Clone, Debug, PartialEq)]
pub enum SeriesResolution {
    /// A single volume, files in stacking order. `degenerate` lists the files
    /// whose position could not be used for ordering; if it is not empty the
    /// order is unreliable.
    Volume {
        files: Vec<PathBuf>,
        degenerate: Vec<PathBuf>,
    },
    /// The directory holds more than one volume. Only the seed is used.
    MultiVolume {
        seed: PathBuf,
        signal: MultiVolumeSignal,
    },
}

impl SeriesResolution {
    /// Files to load, in stacking order.
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::Volume { files, .. } => files,
            Self::MultiVolume { seed, .. } => std::slice::from_ref(seed),
        }
    }

    pub fn into_files(self) -> Vec<PathBuf> {
        match self {
            Self::Volume { files, .. } => files,
            Self::MultiVolume { seed, .. } => vec![seed],
        }
    }

    pub fn is_multi_volume(&self) -> bool {
        matches!(self, Self::MultiVolume { .. })
    }

    /// Whether the slice order rests on missing positions.
    pub fn has_degenerate_positions(&self) -> bool {
        matches!(self, Self::Volume { degenerate, .. } if !degenerate.is_empty())
    }
}

/// Finds the files that form one volume together with a seed file.
///
/// Each call reads the directory and the files afresh; nothing is cached
/// between calls or between the stages of one call.
pub struct SeriesResolver<S = DicomSource> {
    source: S,
    options: SeriesOptions,
}

impl SeriesResolver<DicomSource> {
    pub fn new(options: SeriesOptions) -> Self {
        Self::with_source(DicomSource::default(), options)
    }
}

impl Default for SeriesResolver<DicomSource> {
    fn default() -> Self {
        Self::new(SeriesOptions::default())
    }
}

impl<S: SliceSource> SeriesResolver<S> {
    pub fn with_source(source: S, options: SeriesOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &SeriesOptions {
        &self.options
    }

    /// Resolve the series of `seed` from the files in its directory, logging
    /// diagnostics through `tracing`.
    pub fn resolve(&self, seed: impl AsRef<Path>) -> Result<SeriesResolution, SeriesError> {
        self.resolve_with(seed, &mut TracingDiagnostics)
    }

    pub fn resolve_with(
        &self,
        seed: impl AsRef<Path>,
        diagnostics: &mut impl Diagnostics,
    ) -> Result<SeriesResolution, SeriesError> {
        let seed = seed.as_ref();
        let directory = match seed.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let candidates = list_files(directory).map_err(|source| SeriesError::Io {
            path: directory.to_path_buf(),
            source,
        })?;
        debug!(
            directory = %directory.display(),
            candidates = candidates.len(),
            "Listed candidate files"
        );

        self.resolve_candidates(seed, &candidates, diagnostics)
    }

    /// Resolve the series of `seed` among an explicit candidate list, which
    /// should contain the seed itself. If it does not, or the seed cannot be
    /// read with the other candidates, the result is the seed alone.
    pub fn resolve_candidates(
        &self,
        seed: &Path,
        candidates: &[PathBuf],
        diagnostics: &mut impl Diagnostics,
    ) -> Result<SeriesResolution, SeriesError> {
        let start = Instant::now();
        let reference = self.reference(seed)?;

        let mut table =
            SeriesTable::build(&self.source, candidates, &reference, self.options.read_mode);
        let recognized = table.len();
        debug!(recognized, elapsed = ?start.elapsed(), "Read series attributes");

        if !table.paths().any(|path| path == seed) {
            info!(
                seed = %seed.display(),
                "Input file is not among the readable candidates, only reading the input file"
            );
            return Ok(SeriesResolution::Volume {
                files: vec![seed.to_path_buf()],
                degenerate: Vec::new(),
            });
        }

        retain_series_identity(&mut table, &reference, diagnostics);
        retain_orientation(&mut table, &reference, diagnostics);

        if let Some(signal) = detect_multi_volume(&table, diagnostics) {
            info!(
                seed = %seed.display(),
                files = signal.files,
                "Multiple volumes in directory, only reading the input file"
            );
            return Ok(SeriesResolution::MultiVolume {
                seed: seed.to_path_buf(),
                signal,
            });
        }

        sequence(&mut table, self.options.order);

        let degenerate: Vec<PathBuf> = table
            .records
            .iter()
            .filter(|record| record.degenerate)
            .map(|record| record.path.clone())
            .collect();
        for path in &degenerate {
            diagnostics.report(Diagnostic::DegeneratePosition { path: path.clone() });
        }

        let files = table.into_paths();
        debug!(
            files = files.len(),
            excluded = recognized - files.len(),
            elapsed = ?start.elapsed(),
            "Resolved series"
        );
        for path in &files {
            debug!(path = %path.display(), "File in series");
        }

        Ok(SeriesResolution::Volume { files, degenerate })
    }

    fn reference(&self, seed: &Path) -> Result<ReferenceDescriptor, SeriesError> {
        let attributes = self.source.read_attributes(seed).map_err(|source| match source {
            SourceError::UnsupportedSopClass(_) => {
                SeriesError::SeedNotRecognized(seed.to_path_buf())
            }
            source => SeriesError::SeedUnreadable {
                path: seed.to_path_buf(),
                source,
            },
        })?;
        Ok(ReferenceDescriptor::from_attributes(seed, &attributes))
    }
}
