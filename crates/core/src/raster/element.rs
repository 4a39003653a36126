//! Cell value trait shared by every raster

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Types that can live in a raster cell.
///
/// Composites and index rasters are `f64`; the trait exists so GeoTIFF
/// readers can decode integer reflectance bands without a detour.
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Value written where a cell has no data
    fn default_nodata() -> Self;

    /// Whether this value is no-data, given the raster's declared no-data value
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Lossy conversion to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_int_element {
    ($($t:ty),*) => {
        $(
            impl RasterElement for $t {
                fn default_nodata() -> Self {
                    <$t>::MAX
                }

                fn is_nodata(&self, nodata: Option<Self>) -> bool {
                    nodata.is_some_and(|nd| *self == nd)
                }
            }
        )*
    };
}

macro_rules! impl_float_element {
    ($($t:ty),*) => {
        $(
            impl RasterElement for $t {
                fn default_nodata() -> Self {
                    <$t>::NAN
                }

                fn is_nodata(&self, nodata: Option<Self>) -> bool {
                    if self.is_nan() {
                        return true;
                    }
                    match nodata {
                        Some(nd) if !nd.is_nan() => (self - nd).abs() < <$t>::EPSILON * 100.0,
                        _ => false,
                    }
                }
            }
        )*
    };
}

impl_int_element!(u8, u16, i16, i32);
impl_float_element!(f32, f64);
