//! # DICOM-series library
//!
//! This crate turns a directory of single-frame DICOM images into one
//! ordered, multi-frame volume.

//!
//! Starting from one input file, every file in the same directory is
//! inspected. Only files belonging to the same series (Series Instance UID)
//! and sharing the input file's orientation (Image Orientation Patient, to
//! within [`geometry::NORMAL_DOT_TOLERANCE`]) are kept. The remaining slices
//! are sorted by their position along the slice normal and combined into:
//!  - an enhanced multi-frame header with shared and per-frame functional
//!    groups ([`multi_frame::MultiFrameHeader`])
//!  - a pixel volume with one frame per file
//!
//!  If several files share one slice position the directory holds more than
//!  one volume (e.g. a dynamic series). Such data is not separated; only the
//!  input file is loaded and the caller is told so.
//!
//!  Attribute reads are done in parallel using rayon. Problems with
//!  individual files are reported through a [`diagnostics::Diagnostics`]
//!  receiver, by default as `tracing` warnings.
//!
//! # Examples
//!
//! ## Loading the volume of a DICOM file
//!
//! ```no_run
//! # use dicom_series::{VolumeLoader, SeriesOptions, SliceOrder};
//! let volume = VolumeLoader::load_from_seed(
//!     "dicom/IM_0001",
//!     SeriesOptions::default().with_order(SliceOrder::Ascending),
//! )
//! .expect("should have loaded the series of the input file");
//! println!(
//!     "{} frames of {}x{}",
//!     volume.header().number_of_frames(),
//!     volume.dim().1,
//!     volume.dim().2
//! );
//! ```
//!
//! ## Resolving the series only
//!
//! ```no_run
//! # use dicom_series::{SeriesResolver, SeriesResolution, SeriesOptions};
//! let resolver = SeriesResolver::new(SeriesOptions::default());
//! match resolver.resolve("dicom/IM_0001").expect("input file should be readable") {
//!     SeriesResolution::Volume { files, .. } => println!("{} slices", files.len()),
//!     SeriesResolution::MultiVolume { seed, .. } => println!("only {}", seed.display()),
//! }
//! ```

pub mod candidates;
pub mod consistency;
pub mod diagnostics;
pub mod enums;
pub mod geometry;
pub mod multi_frame;
pub mod sequencer;
pub mod series_resolver;
pub mod series_table;
pub mod source;
pub mod volume;
pub mod volume_loader;

pub use diagnostics::{Diagnostic, Diagnostics, TracingDiagnostics};
pub use enums::{ReadMode, SeriesOptions, SliceOrder};
pub use multi_frame::MultiFrameHeader;
pub use series_resolver::{SeriesError, SeriesResolution, SeriesResolver};
pub use source::{DicomSource, SliceAttributes, SliceSource, SourceError};
pub use volume::Volume;
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
