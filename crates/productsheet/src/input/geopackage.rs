//! GeoPackage container access.
//!
//! A GeoPackage is an SQLite database. Layers are listed in `gpkg_contents`,
//! spatial layers register their geometry column in `gpkg_geometry_columns`,
//! and geometries are stored as GeoPackage binary blobs (a `GP` header
//! followed by WKB).

use std::path::Path;

use geo::Geometry;
use geozero::ToGeo;
use geozero::wkb::GpkgWkb;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use super::source::{
    AttributeValue, Feature, GeometryColumn, LayerData, LayerSource, SchemaField, SpatialRef,
};
use crate::error::{ProductSheetError, Result};
use crate::schema::FieldType;

/// Flag bit marking an empty geometry in the GeoPackage binary header.
const GPKG_EMPTY_FLAG: u8 = 0b0001_0000;

/// An open, read-only GeoPackage.
pub struct GeoPackage {
    conn: Connection,
}

impl GeoPackage {
    /// Open a GeoPackage read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProductSheetError::MissingInput(format!(
                "GeoPackage not found: {}",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// List layer names in registration order.
    pub fn list_layers(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT table_name FROM gpkg_contents ORDER BY rowid")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Get the registered geometry column of a layer, if it has one.
    pub fn geometry_column(&self, layer: &str) -> Result<Option<GeometryColumn>> {
        if !self.has_table("gpkg_geometry_columns")? {
            return Ok(None);
        }
        let column = self
            .conn
            .query_row(
                "SELECT column_name, srs_id \
                 FROM gpkg_geometry_columns WHERE table_name = ?1",
                [layer],
                |row| {
                    Ok(GeometryColumn {
                        column_name: row.get(0)?,
                        srs_id: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(column)
    }

    /// Get the attribute schema of a layer.
    ///
    /// The integer primary key and the geometry column are not attributes.
    pub fn layer_schema(&self, layer: &str) -> Result<Vec<SchemaField>> {
        let geometry = self.geometry_column(layer)?;
        let columns = self.table_columns(layer)?;

        Ok(columns
            .into_iter()
            .filter(|c| !c.is_integer_pk())
            .filter(|c| {
                geometry
                    .as_ref()
                    .map(|g| !g.column_name.eq_ignore_ascii_case(&c.name))
                    .unwrap_or(true)
            })
            .map(|c| SchemaField::new(c.name, FieldType::from_declared(&c.declared_type)))
            .collect())
    }

    /// Read every row of a layer in primary-key order.
    pub fn read_layer(&self, layer: &str) -> Result<LayerData> {
        let geometry = self.geometry_column(layer)?;
        let columns = self.table_columns(layer)?;
        let schema = self.layer_schema(layer)?;

        let order_by = columns
            .iter()
            .find(|c| c.is_integer_pk())
            .map(|c| quote_ident(&c.name))
            .unwrap_or_else(|| "rowid".to_string());

        let mut select: Vec<String> = Vec::new();
        if let Some(ref g) = geometry {
            select.push(quote_ident(&g.column_name));
        }
        select.extend(schema.iter().map(|f| quote_ident(&f.name)));
        if select.is_empty() {
            select.push("NULL".to_string());
        }

        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            select.join(", "),
            quote_ident(layer),
            order_by
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let offset = usize::from(geometry.is_some());
        let mut rows = stmt.query([])?;

        let mut features = Vec::new();
        while let Some(row) = rows.next()? {
            let geom = if geometry.is_some() {
                match row.get_ref(0)? {
                    ValueRef::Blob(blob) => decode_geometry(blob)?,
                    _ => None,
                }
            } else {
                None
            };

            let mut attributes = Vec::with_capacity(schema.len());
            for i in 0..schema.len() {
                attributes.push(AttributeValue::from(row.get_ref(i + offset)?));
            }
            features.push(Feature::new(geom, attributes));
        }

        debug!(layer, features = features.len(), "read layer");
        Ok(LayerData::new(layer, schema, geometry, features))
    }

    /// Resolve a layer's `srs_id` to a spatial reference.
    pub fn spatial_ref(&self, srs_id: i64) -> Result<SpatialRef> {
        match srs_id {
            0 => return Ok(SpatialRef::UndefinedGeographic),
            -1 => return Ok(SpatialRef::UndefinedCartesian),
            _ => {}
        }

        let row = self
            .conn
            .query_row(
                "SELECT organization, organization_coordsys_id \
                 FROM gpkg_spatial_ref_sys WHERE srs_id = ?1",
                [srs_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        Ok(match row {
            Some((org, id)) if org.eq_ignore_ascii_case("epsg") => match u32::try_from(id) {
                Ok(code) => SpatialRef::Epsg(code),
                Err(_) => SpatialRef::Other {
                    organization: org,
                    id,
                },
            },
            Some((organization, id)) => SpatialRef::Other { organization, id },
            // Unregistered ids follow the EPSG numbering by convention.
            None => match u32::try_from(srs_id) {
                Ok(code) => SpatialRef::Epsg(code),
                Err(_) => SpatialRef::Other {
                    organization: "unknown".to_string(),
                    id: srs_id,
                },
            },
        })
    }

    fn has_table(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn table_columns(&self, table: &str) -> Result<Vec<TableColumn>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(TableColumn {
                    name: row.get(1)?,
                    declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    pk: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

impl LayerSource for GeoPackage {
    fn layer_names(&self) -> Result<Vec<String>> {
        self.list_layers()
    }

    fn load_layer(&self, name: &str) -> Result<LayerData> {
        self.read_layer(name)
    }

    fn resolve_srs(&self, srs_id: i64) -> Result<SpatialRef> {
        self.spatial_ref(srs_id)
    }
}

/// Column as reported by `PRAGMA table_info`.
#[derive(Debug)]
struct TableColumn {
    name: String,
    declared_type: String,
    pk: i64,
}

impl TableColumn {
    fn is_integer_pk(&self) -> bool {
        self.pk > 0 && self.declared_type.eq_ignore_ascii_case("INTEGER")
    }
}

/// Decode a GeoPackage geometry blob.
///
/// Returns `None` for zero-length blobs and blobs flagged as empty.
pub fn decode_geometry(blob: &[u8]) -> Result<Option<Geometry<f64>>> {
    if blob.is_empty() {
        return Ok(None);
    }
    if blob.len() >= 4 && blob[0] == b'G' && blob[1] == b'P' && blob[3] & GPKG_EMPTY_FLAG != 0 {
        return Ok(None);
    }
    let geometry = GpkgWkb(blob.to_vec()).to_geo()?;
    Ok(Some(geometry))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
