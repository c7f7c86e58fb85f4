use dicom::{
    core::{DataElement, PrimitiveValue, VR},
    object::{FileMetaTableBuilder, InMemDicomObject},
};
use dicom_dictionary_std::{tags, uids};
use dicom_series::{
    Diagnostic, DicomSource, ReadMode, SeriesError, SeriesOptions, SeriesResolution,
    SeriesResolver, SliceOrder, SliceSource, VolumeLoader,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::{TempDir, tempdir};

const AXIAL: &str = "1\\0\\0\\0\\1\\0";

struct Slice<'a> {
    series: &'a str,
    orientation: &'a str,
    position: &'a str,
    pixel: u16,
    sop_class: &'a str,
}

impl<'a> Slice<'a> {
    fn new(series: &'a str, position: &'a str) -> Self {
        Self {
            series,
            orientation: AXIAL,
            position,
            pixel: 0,
            sop_class: uids::MR_IMAGE_STORAGE,
        }
    }

    fn orientation(mut self, orientation: &'a str) -> Self {
        self.orientation = orientation;
        self
    }

    fn pixel(mut self, pixel: u16) -> Self {
        self.pixel = pixel;
        self
    }

    fn sop_class(mut self, sop_class: &'a str) -> Self {
        self.sop_class = sop_class;
        self
    }

    fn write(self, dir: &Path, name: &str) -> PathBuf {
        let sop_instance_uid = format!("2.25.{}", name.bytes().map(u32::from).sum::<u32>());
        let obj = InMemDicomObject::from_element_iter([
            DataElement::new(tags::SOP_CLASS_UID, VR::UI, PrimitiveValue::from(self.sop_class)),
            DataElement::new(
                tags::SOP_INSTANCE_UID,
                VR::UI,
                PrimitiveValue::from(sop_instance_uid.as_str()),
            ),
            DataElement::new(tags::STUDY_INSTANCE_UID, VR::UI, PrimitiveValue::from("1.2.3")),
            DataElement::new(tags::SERIES_INSTANCE_UID, VR::UI, PrimitiveValue::from(self.series)),
            DataElement::new(
                tags::IMAGE_ORIENTATION_PATIENT,
                VR::DS,
                PrimitiveValue::from(self.orientation),
            ),
            DataElement::new(
                tags::IMAGE_POSITION_PATIENT,
                VR::DS,
                PrimitiveValue::from(self.position),
            ),
            DataElement::new(tags::PIXEL_SPACING, VR::DS, PrimitiveValue::from("0.5\\0.5")),
            DataElement::new(tags::SLICE_THICKNESS, VR::DS, PrimitiveValue::from("5")),
            DataElement::new(tags::RECEIVE_COIL_NAME, VR::SH, PrimitiveValue::from("HEAD")),
            DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
            DataElement::new(
                tags::PHOTOMETRIC_INTERPRETATION,
                VR::CS,
                PrimitiveValue::from("MONOCHROME2"),
            ),
            DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(2_u16)),
            DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(2_u16)),
            DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)),
            DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)),
            DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)),
            DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)),
            DataElement::new(
                tags::PIXEL_DATA,
                VR::OW,
                PrimitiveValue::U16(vec![self.pixel; 4].into()),
            ),
        ]);
        let file_obj = obj
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                    .media_storage_sop_class_uid(self.sop_class)
                    .media_storage_sop_instance_uid(sop_instance_uid.as_str()),
            )
            .unwrap();
        let path = dir.join(name);
        file_obj.write_to_file(&path).unwrap();
        path
    }
}

fn resolve(seed: &Path, order: SliceOrder) -> (SeriesResolution, Vec<Diagnostic>) {
    let resolver = SeriesResolver::new(SeriesOptions::default().with_order(order));
    let mut diagnostics = Vec::new();
    let resolution = resolver.resolve_with(seed, &mut diagnostics).unwrap();
    (resolution, diagnostics)
}

fn names(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn axial_series(dir: &TempDir) -> Vec<PathBuf> {
    vec![
        Slice::new("1.2.3.4", "0\\0\\5").pixel(5).write(dir.path(), "img2"),
        Slice::new("1.2.3.4", "0\\0\\10").pixel(10).write(dir.path(), "img10"),
        Slice::new("1.2.3.4", "0\\0\\0").pixel(1).write(dir.path(), "img1"),
    ]
}

#[test]
fn resolves_every_slice_of_a_consistent_series() {
    let dir = tempdir().unwrap();
    let files = axial_series(&dir);
    fs::write(dir.path().join("notes.txt"), "not a DICOM file").unwrap();
    Slice::new("1.2.3.4", "0\\0\\20")
        .sop_class(uids::SECONDARY_CAPTURE_IMAGE_STORAGE)
        .write(dir.path(), "screenshot");

    let (ascending, diagnostics) = resolve(&files[0], SliceOrder::Ascending);
    let (descending, _) = resolve(&files[0], SliceOrder::Descending);

    assert_eq!(names(ascending.files()), ["img1", "img2", "img10"]);
    assert_eq!(names(descending.files()), ["img10", "img2", "img1"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn sequential_and_parallel_reads_agree() {
    let dir = tempdir().unwrap();
    let files = axial_series(&dir);

    let resolutions: Vec<_> = [ReadMode::Parallel, ReadMode::Sequential]
        .into_iter()
        .map(|read_mode| {
            SeriesResolver::new(SeriesOptions::default().with_read_mode(read_mode))
                .resolve(&files[1])
                .unwrap()
        })
        .collect();

    assert_eq!(resolutions[0], resolutions[1]);
}

#[test]
fn files_of_another_series_are_excluded() {
    let dir = tempdir().unwrap();
    let seed = Slice::new("A", "0\\0\\0").write(dir.path(), "S");
    Slice::new("B", "0\\0\\5").write(dir.path(), "T");

    let (resolution, diagnostics) = resolve(&seed, SliceOrder::Ascending);

    assert_eq!(names(resolution.files()), ["S"]);
    assert!(matches!(
        &diagnostics[..],
        [Diagnostic::SeriesMismatch { path, .. }] if path.ends_with("T")
    ));
}

#[test]
fn orientation_tolerance_is_applied_to_slice_normals() {
    let dir = tempdir().unwrap();
    let seed = Slice::new("A", "0\\0\\0").write(dir.path(), "1");
    // ~0.5 degrees about x: kept
    Slice::new("A", "0\\0\\5")
        .orientation("1\\0\\0\\0\\0.99996192\\0.00872654")
        .write(dir.path(), "2");
    // ~1 degree about x: removed
    Slice::new("A", "0\\0\\10")
        .orientation("1\\0\\0\\0\\0.99984770\\0.01745241")
        .write(dir.path(), "3");

    let (resolution, diagnostics) = resolve(&seed, SliceOrder::Ascending);

    assert_eq!(names(resolution.files()), ["1", "2"]);
    assert!(matches!(
        &diagnostics[..],
        [Diagnostic::OrientationMismatch { dot: Some(_), .. }]
    ));
}

#[test]
fn repeated_positions_fall_back_to_the_input_file() {
    let dir = tempdir().unwrap();
    let files = axial_series(&dir);
    Slice::new("1.2.3.4", "0\\0\\0").pixel(2).write(dir.path(), "img1b");

    let (resolution, diagnostics) = resolve(&files[0], SliceOrder::Ascending);

    assert!(resolution.is_multi_volume());
    assert_eq!(resolution.files(), [files[0].clone()]);
    assert!(matches!(
        &diagnostics[..],
        [Diagnostic::MultiVolumetric {
            files: 4,
            unique_positions: 3
        }]
    ));
}

#[test]
fn loads_pixels_in_stacking_order() {
    let dir = tempdir().unwrap();
    let files = axial_series(&dir);

    let volume = VolumeLoader::load_from_seed(
        &files[0],
        SeriesOptions::default().with_order(SliceOrder::Ascending),
    )
    .unwrap();

    assert_eq!(volume.dim(), (3, 2, 2));
    assert_eq!(names(volume.files()), ["img1", "img2", "img10"]);
    assert_eq!(volume.spacing(), Some((0.5, 0.5, 5.0)));

    let frame_values: Vec<u16> = (0..3)
        .map(|i| {
            let frame = volume.frame(i).unwrap();
            let first = frame[[0, 0]];
            assert!(frame.iter().all(|&v| v == first));
            first
        })
        .collect();
    assert!(frame_values.windows(2).all(|pair| pair[0] < pair[1]));

    let header = volume.header();
    assert_eq!(header.number_of_frames(), 3);
    assert_eq!(header.study_uid(), Some("1.2.3"));
    let positions: Vec<_> = header
        .per_frame()
        .iter()
        .map(|frame| frame.position.clone().unwrap())
        .collect();
    assert_eq!(positions, ["0\\0\\0", "0\\0\\5", "0\\0\\10"]);

    let dicom_object = header.to_dicom_object();
    assert_eq!(
        dicom_object
            .element(tags::NUMBER_OF_FRAMES)
            .unwrap()
            .to_int::<u32>()
            .unwrap(),
        3
    );
}

#[test]
fn unreadable_input_file_is_fatal() {
    let dir = tempdir().unwrap();
    axial_series(&dir);
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "not a DICOM file").unwrap();
    let resolver = SeriesResolver::new(SeriesOptions::default());

    assert!(matches!(
        resolver.resolve(&notes),
        Err(SeriesError::SeedUnreadable { .. })
    ));
    assert!(matches!(
        resolver.resolve(dir.path().join("absent")),
        Err(SeriesError::SeedUnreadable { .. })
    ));
}

#[test]
fn input_file_of_unsupported_type_is_not_recognized() {
    let dir = tempdir().unwrap();
    let files = axial_series(&dir);
    let screenshot = Slice::new("1.2.3.4", "0\\0\\20")
        .sop_class(uids::SECONDARY_CAPTURE_IMAGE_STORAGE)
        .write(dir.path(), "screenshot");
    let source = DicomSource::default();

    assert!(source.is_recognized(&files[0]));
    assert!(!source.is_recognized(&screenshot));
    assert!(!source.is_recognized(&dir.path().join("absent")));
    assert!(matches!(
        SeriesResolver::new(SeriesOptions::default()).resolve(&screenshot),
        Err(SeriesError::SeedNotRecognized(path)) if path == screenshot
    ));
    assert!(
        SeriesResolver::with_source(
            DicomSource::with_sop_classes([uids::SECONDARY_CAPTURE_IMAGE_STORAGE]),
            SeriesOptions::default(),
        )
        .resolve(&screenshot)
        .is_ok()
    );
}
