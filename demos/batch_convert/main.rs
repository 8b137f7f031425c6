//! An application converting every TIFF, LSM and OME-TIFF file of a
//! directory into NIfTI-1 volumes, one file after the other.

extern crate tiff2nii;

use log::{error, info};
use std::env;
use std::fs;
use std::path::Path;
use tiff2nii::ConvertOptions;

fn is_stack(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ["tif", "tiff", "lsm"].contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let dir = args.next().expect("Path to a directory is required");
    let mut paths: Vec<_> = fs::read_dir(&dir)
        .expect("Failed to list directory")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_stack(p))
        .collect();
    paths.sort();

    let options = ConvertOptions::new().verbose(true);
    let mut failed = 0;
    for input in &paths {
        let output = input.with_extension("nii");
        match options.convert_file(input, &output) {
            Ok(converted) => {
                for d in &converted.diagnostics {
                    info!("{}: {}", input.display(), d);
                }
                info!("{} -> {}", input.display(), output.display());
            }
            Err(e) => {
                error!("{}: {}", input.display(), e);
                failed += 1;
            }
        }
    }
    println!("{} of {} files converted", paths.len() - failed, paths.len());
}
