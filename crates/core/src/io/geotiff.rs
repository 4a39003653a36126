//! Single-band GeoTIFF reading and writing on top of the `tiff` crate.
//!
//! North-up grids carry their georeference in the ModelPixelScale /
//! ModelTiepoint tags; rotated or south-up grids use ModelTransformation.
//! The CRS lives in the GeoKeyDirectory (EPSG codes only). Output is always
//! 32-bit float with NaN as no-data, flagged in the GDAL_NODATA tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const KEY_MODEL_TYPE: u16 = 1024;
const KEY_RASTER_TYPE: u16 = 1025;
const KEY_GEOGRAPHIC_TYPE: u16 = 2048;
const KEY_PROJECTED_CS_TYPE: u16 = 3072;

/// Read band 1 of a GeoTIFF file
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode(BufReader::new(file))
}

/// Read band 1 of an in-memory GeoTIFF
pub fn read_geotiff_from_buffer<T: RasterElement>(data: &[u8]) -> Result<Raster<T>> {
    decode(Cursor::new(data))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

fn decode<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let data: Vec<T> = match decoder.read_image()? {
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    // Multi-sample images decode to rows * cols * samples values
    if data.len() != rows * cols {
        return Err(Error::UnsupportedDataType(format!(
            "expected a single-band image, got {} samples for {}x{} pixels",
            data.len(),
            cols,
            rows
        )));
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_transform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));

    let nodata = decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim_end_matches('\0').trim().parse::<f64>().ok())
        .and_then(num_traits::cast::<f64, T>);
    raster.set_nodata(nodata.or_else(|| {
        let nan: Option<T> = num_traits::cast(f64::NAN);
        nan.filter(|v| v.is_nodata(None))
    }));

    Ok(raster)
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::ModelTransformationTag) {
        if m.len() >= 8 {
            // Row-major 4x4: x = m0*col + m1*row + m3, y = m4*col + m5*row + m7
            return Some(GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }

    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder
        .get_tag_u16_vec(Tag::GeoKeyDirectoryTag)
        .ok()?;

    // Header is 4 shorts, then (key, location, count, value) entries
    keys.get(4..)?
        .chunks_exact(4)
        .filter(|entry| entry[1] == 0)
        .find(|entry| entry[0] == KEY_PROJECTED_CS_TYPE || entry[0] == KEY_GEOGRAPHIC_TYPE)
        .map(|entry| CRS::from_epsg(entry[3] as u32))
}

fn geo_keys(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs.and_then(CRS::epsg).and_then(|c| u16::try_from(c).ok());
    // EPSG 4000-4999 are geographic systems
    let geographic = epsg.is_some_and(|c| (4000..5000).contains(&c));

    let mut entries: Vec<[u16; 4]> = vec![
        [KEY_MODEL_TYPE, 0, 1, if geographic { 2 } else { 1 }],
        [KEY_RASTER_TYPE, 0, 1, 1],
    ];
    if let Some(code) = epsg {
        let key = if geographic {
            KEY_GEOGRAPHIC_TYPE
        } else {
            KEY_PROJECTED_CS_TYPE
        };
        entries.push([key, 0, 1, code]);
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.iter().flatten());
    keys
}

/// Scale + tiepoint can only express unrotated grids with rows running south
fn is_north_up(gt: &GeoTransform) -> bool {
    gt.row_rotation == 0.0 && gt.col_rotation == 0.0 && gt.pixel_height < 0.0
}

/// Write a raster as a 32-bit float GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode(raster, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Encode a raster as a 32-bit float GeoTIFF in memory
pub fn write_geotiff_to_buffer<T: RasterElement>(raster: &Raster<T>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode(raster, &mut Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                f32::NAN
            } else {
                num_traits::cast(v).unwrap_or(f32::NAN)
            }
        })
        .collect();

    let mut image = encoder.new_image::<Gray32Float>(cols as u32, rows as u32)?;

    let gt = raster.transform();
    if is_north_up(gt) {
        let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &scale[..])?;

        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
    } else {
        #[rustfmt::skip]
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        image
            .encoder()
            .write_tag(Tag::ModelTransformationTag, &matrix[..])?;
    }

    let keys = geo_keys(raster.crs());
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &keys[..])?;
    image.encoder().write_tag(Tag::GdalNodata, "nan")?;

    image.write_data(&data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raster() -> Raster<f64> {
        let mut r = Raster::from_vec(vec![0.1, 0.2, f64::NAN, 0.4, 0.5, 0.6], 2, 3).unwrap();
        r.set_transform(GeoTransform::new(300_000.0, 1_500_000.0, 10.0, -10.0));
        r.set_crs(Some(CRS::from_epsg(32643)));
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn test_buffer_roundtrip_keeps_georeference() {
        let original = sample_raster();
        let bytes = write_geotiff_to_buffer(&original).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.shape(), (2, 3));
        assert_eq!(back.transform(), original.transform());
        assert_eq!(back.crs().and_then(|c| c.epsg()), Some(32643));
        assert!(back.get(0, 2).unwrap().is_nan());
        assert!((back.get(1, 1).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ndvi.tif");
        write_geotiff(&sample_raster(), &path).unwrap();

        let back: Raster<f64> = read_geotiff(&path).unwrap();
        assert!((back.get(0, 0).unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_tags_read_back_without_override() {
        let bytes = write_geotiff_to_buffer(&sample_raster()).unwrap();
        let mut decoder = Decoder::new(Cursor::new(&bytes[..])).unwrap();

        let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).unwrap();
        assert_eq!(&scale[..2], &[10.0, 10.0]);
        let nodata = decoder.get_tag_ascii_string(Tag::GdalNodata).unwrap();
        assert_eq!(nodata.trim_end_matches('\0'), "nan");
        assert_eq!(read_crs(&mut decoder), Some(CRS::from_epsg(32643)));

        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();
        assert!(back.nodata().is_some_and(|v| v.is_nan()));
        assert_eq!(back.bounds(), (300_000.0, 1_499_980.0, 300_030.0, 1_500_000.0));
    }

    #[test]
    fn test_rotated_grid_keeps_full_transform() {
        let mut r = sample_raster();
        r.set_transform(GeoTransform::from_gdal([1000.0, 10.0, 2.0, 5000.0, 3.0, -10.0]));
        let bytes = write_geotiff_to_buffer(&r).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(back.transform(), r.transform());
    }

    #[test]
    fn test_south_up_grid_keeps_orientation() {
        let mut r = sample_raster();
        r.set_transform(GeoTransform::new(300_000.0, 1_500_000.0, 10.0, 10.0));
        let bytes = write_geotiff_to_buffer(&r).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(back.transform().pixel_height, 10.0);
        assert_eq!(back.transform(), r.transform());
    }

    #[test]
    fn test_geo_keys_for_geographic_crs() {
        let keys = geo_keys(Some(&CRS::wgs84()));
        assert_eq!(&keys[..4], &[1, 1, 0, 3]);
        assert!(keys.chunks_exact(4).any(|e| e == [KEY_GEOGRAPHIC_TYPE, 0, 1, 4326]));
        assert!(keys.chunks_exact(4).any(|e| e == [KEY_MODEL_TYPE, 0, 1, 2]));
    }
}
