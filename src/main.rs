use std::{env, path::PathBuf, process::ExitCode};

use dicom_series::{SeriesOptions, VolumeLoader};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let seed = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("dicom/IM_0001"));

    match VolumeLoader::load_from_seed(&seed, SeriesOptions::default()) {
        Ok(volume) => {
            let (frames, rows, columns) = volume.dim();
            println!("{frames} frames of {rows}x{columns}");
            if volume.is_single_file_fallback() {
                println!("multi-volumetric directory, loaded {} only", seed.display());
            }
            for path in volume.files() {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
