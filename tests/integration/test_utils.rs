//! Helpers that write small volumes in every supported format.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use ndarray::{Array2, Array3};
use tiff::encoder::{TiffEncoder, colortype};

/// `z * 1000 + y * 10 + x`, so every sample names its own position.
pub fn ramp_u16(depth: usize, height: usize, width: usize) -> Array3<u16> {
    Array3::from_shape_fn((depth, height, width), |(z, y, x)| {
        (z * 1000 + y * 10 + x) as u16
    })
}

/// Write `<stem>.vgi` and `<stem>.vol` holding `data` as unsigned 16-bit.
/// Returns the header path.
pub fn write_vgi(dir: &Path, stem: &str, data: &Array3<u16>) -> PathBuf {
    let (depth, height, width) = data.dim();
    let header = format!(
        "{{volume1}}\n\
         [file1]\n\
         RegionOfInterestStart = 0 0 0\n\
         FileFormat = raw\n\
         Size = {width} {height} {depth}\n\
         Name = {stem}.vol\n\
         Datatype = unsigned integer\n\
         datarange = 0 65535\n\
         BitsPerElement = 16\n\
         {{volumeprimitive12}}\n\
         [geometry]\n\
         status = visible\n"
    );
    let header_path = dir.join(format!("{stem}.vgi"));
    fs::write(&header_path, header).unwrap();

    let blob: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
    fs::write(dir.join(format!("{stem}.vol")), blob).unwrap();
    header_path
}

/// Write a `.txm` compound file with one `Image<n>` stream per slice.
pub fn write_txm(path: &Path, data: &Array3<u16>, global_range: Option<(f32, f32)>) {
    let (depth, height, width) = data.dim();
    let mut comp = cfb::create(path).unwrap();

    comp.create_storage("/ImageInfo").unwrap();
    write_stream(&mut comp, "/ImageInfo/ImageWidth", &(width as u32).to_le_bytes());
    write_stream(&mut comp, "/ImageInfo/ImageHeight", &(height as u32).to_le_bytes());
    write_stream(&mut comp, "/ImageInfo/DataType", &5u32.to_le_bytes());

    if let Some((min, max)) = global_range {
        comp.create_storage("/GlobalMinMax").unwrap();
        write_stream(&mut comp, "/GlobalMinMax/GlobalMin", &min.to_le_bytes());
        write_stream(&mut comp, "/GlobalMinMax/GlobalMax", &max.to_le_bytes());
    }

    // 100 images per storage, numbered from 1
    for z in 0..depth {
        let storage = format!("/ImageData{}", z / 100 + 1);
        if z % 100 == 0 {
            comp.create_storage(&storage).unwrap();
        }
        let bytes: Vec<u8> = data
            .index_axis(ndarray::Axis(0), z)
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        write_stream(&mut comp, &format!("{storage}/Image{}", z + 1), &bytes);
    }
    comp.flush().unwrap();
}

fn write_stream(comp: &mut cfb::CompoundFile<File>, path: &str, bytes: &[u8]) {
    let mut stream = comp.create_stream(path).unwrap();
    stream.write_all(bytes).unwrap();
    stream.flush().unwrap();
}

/// Write `data` as a multi-page 16-bit TIFF.
pub fn write_tiff_stack(path: &Path, data: &Array3<u16>) {
    let (_, height, width) = data.dim();
    let mut encoder = TiffEncoder::new(File::create(path).unwrap()).unwrap();
    for plane in data.outer_iter() {
        let samples: Vec<u16> = plane.iter().copied().collect();
        encoder
            .write_image::<colortype::Gray16>(width as u32, height as u32, &samples)
            .unwrap();
    }
}

/// Write one single-page TIFF per slice into `dir`, named `slice_000.tif`...
pub fn write_tiff_folder(dir: &Path, data: &Array3<u16>) {
    let (_, height, width) = data.dim();
    for (z, plane) in data.outer_iter().enumerate() {
        let path = dir.join(format!("slice_{z:03}.tif"));
        let mut encoder = TiffEncoder::new(File::create(path).unwrap()).unwrap();
        let samples: Vec<u16> = plane.iter().copied().collect();
        encoder
            .write_image::<colortype::Gray16>(width as u32, height as u32, &samples)
            .unwrap();
    }
}

/// Write one 8-bit PNG per plane into `dir`, named `img_000.png`...
pub fn write_png_folder(dir: &Path, planes: &[Array2<u8>]) {
    for (z, plane) in planes.iter().enumerate() {
        let (height, width) = plane.dim();
        let image = GrayImage::from_fn(width as u32, height as u32, |x, y| {
            Luma([plane[[y as usize, x as usize]]])
        });
        image.save(dir.join(format!("img_{z:03}.png"))).unwrap();
    }
}
