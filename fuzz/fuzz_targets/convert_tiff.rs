#![no_main]
use libfuzzer_sys::fuzz_target;
use tiff2nii::{convert_stack, NiftiHeader};

fuzz_target!(|data: &[u8]| {
    if let Ok(converted) = convert_stack(data, false, 1) {
        let header = NiftiHeader::from_reader(&converted.nifti[..]).unwrap();
        assert!(header.data_type().is_some());
    }
});
