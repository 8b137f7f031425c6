#![no_main]
use libfuzzer_sys::fuzz_target;
use tiff2nii::metadata::MetadataSource;
use tiff2nii::order::{SliceLayout, SliceMapping};
use tiff2nii::{DimensionSpec, FileDirectory};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let directory = FileDirectory::default().with_image_description(text);
    let metadata = MetadataSource::detect(&directory);
    let (spec, layout): (DimensionSpec, SliceLayout) =
        DimensionSpec::resolve(&metadata, &directory, 16, 16);
    let mapping = SliceMapping::new(spec, &layout, 12);
    assert!(mapping.order.is_bijection());
});
