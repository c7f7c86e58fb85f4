use std::path::PathBuf;
use tracing::warn;

/// Non-fatal findings raised while resolving a series.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// The file belongs to another SeriesInstanceUID and was excluded.
    SeriesMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
    /// The slice normal deviates from the reference beyond tolerance and the
    /// file was excluded. `dot` is `None` when either normal was unavailable.
    OrientationMismatch { path: PathBuf, dot: Option<f64> },
    /// The file has no usable position; its place in the stack is a guess.
    DegeneratePosition { path: PathBuf },
    /// Repeated slice positions: more than one volume in the directory.
    MultiVolumetric { files: usize, unique_positions: usize },
}

/// Receiver for [`Diagnostic`]s, passed explicitly into a resolution.
pub trait Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Emits each diagnostic as a `tracing` warning.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::SeriesMismatch {
                path,
                expected,
                found,
            } => warn!(
                path = %path.display(),
                %expected,
                %found,
                "SeriesInstanceUID differs from the input file, removing file from series"
            ),
            Diagnostic::OrientationMismatch { path, dot } => warn!(
                path = %path.display(),
                ?dot,
                "ImageOrientationPatient differs from the input file, removing file from series"
            ),
            Diagnostic::DegeneratePosition { path } => warn!(
                path = %path.display(),
                "No usable ImagePositionPatient, slice order is unreliable"
            ),
            Diagnostic::MultiVolumetric {
                files,
                unique_positions,
            } => warn!(
                files,
                unique_positions, "Multi-volumetric data, repeated slice locations"
            ),
        }
    }
}

/// Collects diagnostics for later inspection.
impl Diagnostics for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for &mut D {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}
