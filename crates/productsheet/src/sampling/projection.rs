//! Coordinate reference system transforms.

use geo::{Coord, Geometry, MapCoords};
use proj4rs::Proj;

use crate::error::{ProductSheetError, Result};
use crate::input::SpatialRef;

/// EPSG code of WGS84 geographic coordinates.
pub const WGS84: u32 = 4326;

/// EPSG code of spherical Web Mercator.
pub const WEB_MERCATOR: u32 = 3857;

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";
const WEB_MERCATOR_PROJ: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs";

/// Latitude limit of the Web Mercator square.
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// A coordinate reference system usable for transforms.
struct Crs {
    code: u32,
    proj: Proj,
    geographic: bool,
}

impl Crs {
    fn from_epsg(code: u32) -> Result<Self> {
        let definition = match code {
            WGS84 => WGS84_PROJ,
            WEB_MERCATOR => WEB_MERCATOR_PROJ,
            other => u16::try_from(other)
                .ok()
                .and_then(crs_definitions::from_code)
                .map(|def| def.proj4)
                .ok_or_else(|| {
                    ProductSheetError::Projection(format!("Unknown EPSG code {}", other))
                })?,
        };

        let proj = Proj::from_proj_string(definition).map_err(|e| {
            ProductSheetError::Projection(format!("EPSG:{}: {}", code, e))
        })?;
        let geographic =
            definition.contains("+proj=longlat") || definition.contains("+proj=latlong");

        Ok(Self {
            code,
            proj,
            geographic,
        })
    }
}

/// Transforms geometries between two coordinate reference systems.
pub struct Reprojector {
    src: Crs,
    dst: Crs,
}

impl Reprojector {
    /// Create a transform between two EPSG codes.
    pub fn new(src: u32, dst: u32) -> Result<Self> {
        Ok(Self {
            src: Crs::from_epsg(src)?,
            dst: Crs::from_epsg(dst)?,
        })
    }

    /// WGS84 to Web Mercator, used for planar distances.
    pub fn web_mercator() -> Result<Self> {
        Self::new(WGS84, WEB_MERCATOR)
    }

    /// Create a transform from a layer's declared spatial reference.
    ///
    /// Undefined geographic coordinates are taken as WGS84.
    pub fn from_spatial_ref(layer: &str, spatial_ref: &SpatialRef, dst: u32) -> Result<Self> {
        let src = match spatial_ref {
            SpatialRef::Epsg(code) => *code,
            SpatialRef::UndefinedGeographic => WGS84,
            SpatialRef::UndefinedCartesian => {
                return Err(ProductSheetError::UnsupportedSrs {
                    layer: layer.to_string(),
                    message: "undefined Cartesian coordinates cannot be reprojected".to_string(),
                });
            }
            SpatialRef::Other { organization, id } => {
                return Err(ProductSheetError::UnsupportedSrs {
                    layer: layer.to_string(),
                    message: format!("{}:{} is not an EPSG reference", organization, id),
                });
            }
        };
        Self::new(src, dst)
    }

    /// Returns true if source and target are the same system.
    pub fn is_identity(&self) -> bool {
        self.src.code == self.dst.code
    }

    /// Transform a single coordinate.
    pub fn transform_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        if self.is_identity() {
            return Ok(coord);
        }

        let (mut x, mut y) = (coord.x, coord.y);
        if self.dst.code == WEB_MERCATOR && self.src.geographic {
            y = y.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
        }
        if self.src.geographic {
            x = x.to_radians();
            y = y.to_radians();
        }

        let mut point = (x, y, 0.0);
        proj4rs::transform::transform(&self.src.proj, &self.dst.proj, &mut point)
            .map_err(|e| ProductSheetError::Projection(e.to_string()))?;

        let (mut x, mut y) = (point.0, point.1);
        if self.dst.geographic {
            x = x.to_degrees();
            y = y.to_degrees();
        }
        if !x.is_finite() || !y.is_finite() {
            return Err(ProductSheetError::Projection(format!(
                "Coordinate ({}, {}) has no image in EPSG:{}",
                coord.x, coord.y, self.dst.code
            )));
        }
        Ok(Coord { x, y })
    }

    /// Transform every coordinate of a geometry.
    pub fn transform(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        if self.is_identity() {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|c| self.transform_coord(c))
    }
}
