#![no_main]
use libfuzzer_sys::fuzz_target;
use tiff2nii::NiftiHeader;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = NiftiHeader::from_reader(data) {
        let _ = header.data_type();
        let _ = header.sform();
        let _ = header.xyzt_to_space();
        let _ = header.xyzt_to_time();
        let _ = header.description();
        let mut out = Vec::new();
        header.write_to(&mut out).unwrap();
        assert_eq!(out.len(), 352);
    }
});
