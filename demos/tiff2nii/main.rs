//! An application for converting one TIFF stack into a NIfTI-1 file.
//!
//! Usage: `tiff2nii <input.tif> [stack group]`. The volume is written next
//! to the input, with the `.nii` extension.

extern crate tiff2nii;

use std::env;
use tiff2nii::ConvertOptions;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let input = args.next().expect("Path to TIFF file is required");
    let group = args
        .next()
        .map(|g| g.parse::<usize>().expect("Stack group must be a number"))
        .unwrap_or(0);
    let output = std::path::Path::new(&input).with_extension("nii");

    let converted = ConvertOptions::new()
        .verbose(true)
        .stack_group(group)
        .convert_file(&input, &output)
        .expect("Failed to convert TIFF file");

    for (i, config) in converted.stack_configs.iter().enumerate() {
        println!("stack group {}: {}", i, config);
    }
    println!("{} bytes written to {}", converted.nifti.len(), output.display());
}
