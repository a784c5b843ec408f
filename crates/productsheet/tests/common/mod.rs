//! GeoPackage fixtures built directly through SQLite.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

/// GeoPackage binary header (little endian, no envelope) followed by WKB.
fn gpkg_header(srs_id: i32) -> Vec<u8> {
    let mut blob = vec![b'G', b'P', 0, 0b0000_0001];
    blob.extend_from_slice(&srs_id.to_le_bytes());
    blob
}

/// Encode a point geometry blob.
pub fn point_blob(x: f64, y: f64, srs_id: i32) -> Vec<u8> {
    let mut blob = gpkg_header(srs_id);
    blob.push(1);
    blob.extend_from_slice(&1u32.to_le_bytes());
    blob.extend_from_slice(&x.to_le_bytes());
    blob.extend_from_slice(&y.to_le_bytes());
    blob
}

/// Encode a line string geometry blob.
pub fn line_blob(coords: &[(f64, f64)], srs_id: i32) -> Vec<u8> {
    let mut blob = gpkg_header(srs_id);
    blob.push(1);
    blob.extend_from_slice(&2u32.to_le_bytes());
    blob.extend_from_slice(&(coords.len() as u32).to_le_bytes());
    for (x, y) in coords {
        blob.extend_from_slice(&x.to_le_bytes());
        blob.extend_from_slice(&y.to_le_bytes());
    }
    blob
}

/// A minimal GeoPackage under construction.
pub struct GpkgFixture {
    path: PathBuf,
    conn: Connection,
}

impl GpkgFixture {
    /// Create an empty GeoPackage with the required system tables.
    pub fn create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).expect("Failed to create GeoPackage");
        conn.execute_batch(
            "CREATE TABLE gpkg_spatial_ref_sys (
                 srs_name TEXT NOT NULL,
                 srs_id INTEGER PRIMARY KEY,
                 organization TEXT NOT NULL,
                 organization_coordsys_id INTEGER NOT NULL,
                 definition TEXT NOT NULL,
                 description TEXT
             );
             INSERT INTO gpkg_spatial_ref_sys VALUES
                 ('Undefined cartesian SRS', -1, 'NONE', -1, 'undefined', NULL),
                 ('Undefined geographic SRS', 0, 'NONE', 0, 'undefined', NULL),
                 ('WGS 84 geodetic', 4326, 'EPSG', 4326, 'GEOGCS[\"WGS 84\"]', NULL),
                 ('WGS 84 / Pseudo-Mercator', 3857, 'EPSG', 3857, 'PROJCS[\"WGS 84 / Pseudo-Mercator\"]', NULL);
             CREATE TABLE gpkg_contents (
                 table_name TEXT NOT NULL PRIMARY KEY,
                 data_type TEXT NOT NULL,
                 identifier TEXT,
                 description TEXT DEFAULT '',
                 last_change DATETIME,
                 min_x DOUBLE, min_y DOUBLE, max_x DOUBLE, max_y DOUBLE,
                 srs_id INTEGER
             );
             CREATE TABLE gpkg_geometry_columns (
                 table_name TEXT NOT NULL,
                 column_name TEXT NOT NULL,
                 geometry_type_name TEXT NOT NULL,
                 srs_id INTEGER NOT NULL,
                 z TINYINT NOT NULL,
                 m TINYINT NOT NULL,
                 CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name)
             );",
        )
        .expect("Failed to create system tables");
        Self { path, conn }
    }

    fn create_table(&self, name: &str, geometry: bool, fields: &[(&str, &str)]) {
        let mut columns = vec!["fid INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        if geometry {
            columns.push("geom BLOB".to_string());
        }
        columns.extend(fields.iter().map(|(n, t)| format!("\"{}\" {}", n, t)));
        self.conn
            .execute(&format!("CREATE TABLE \"{}\" ({})", name, columns.join(", ")), [])
            .expect("Failed to create layer table");
    }

    /// Add a spatial layer; each row is a geometry blob plus attribute values.
    pub fn layer(
        &self,
        name: &str,
        geometry_type: &str,
        srs_id: i64,
        fields: &[(&str, &str)],
        rows: Vec<(Option<Vec<u8>>, Vec<Value>)>,
    ) -> &Self {
        self.create_table(name, true, fields);
        self.conn
            .execute(
                "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id) VALUES (?1, 'features', ?1, ?2)",
                params![name, srs_id],
            )
            .expect("Failed to register layer");
        self.conn
            .execute(
                "INSERT INTO gpkg_geometry_columns VALUES (?1, 'geom', ?2, ?3, 0, 0)",
                params![name, geometry_type, srs_id],
            )
            .expect("Failed to register geometry column");

        let placeholders: Vec<String> = (1..=fields.len() + 1).map(|i| format!("?{}", i)).collect();
        let mut columns = vec!["geom".to_string()];
        columns.extend(fields.iter().map(|(n, _)| format!("\"{}\"", n)));
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            name,
            columns.join(", "),
            placeholders.join(", ")
        );
        for (geometry, values) in rows {
            let mut row = vec![geometry.map(Value::Blob).unwrap_or(Value::Null)];
            row.extend(values);
            self.conn
                .execute(&sql, params_from_iter(row))
                .expect("Failed to insert feature");
        }
        self
    }

    /// Add an attribute-only table, such as a code list.
    pub fn attributes(&self, name: &str, fields: &[(&str, &str)], rows: Vec<Vec<Value>>) -> &Self {
        self.create_table(name, false, fields);
        self.conn
            .execute(
                "INSERT INTO gpkg_contents (table_name, data_type, identifier) VALUES (?1, 'attributes', ?1)",
                params![name],
            )
            .expect("Failed to register table");

        let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{}", i)).collect();
        let columns: Vec<String> = fields.iter().map(|(n, _)| format!("\"{}\"", n)).collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            name,
            columns.join(", "),
            placeholders.join(", ")
        );
        for values in rows {
            self.conn
                .execute(&sql, params_from_iter(values))
                .expect("Failed to insert row");
        }
        self
    }

    /// Register a table in `gpkg_contents` without creating it.
    pub fn register_only(&self, name: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO gpkg_contents (table_name, data_type, identifier) VALUES (?1, 'attributes', ?1)",
                params![name],
            )
            .expect("Failed to register table");
        self
    }

    /// Close the database and return its path.
    pub fn finish(self) -> PathBuf {
        drop(self.conn);
        self.path
    }
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// `count` points spread eastwards from (10, 60), with name and surface.
pub fn road_rows(count: usize) -> Vec<(Option<Vec<u8>>, Vec<Value>)> {
    (0..count)
        .map(|i| {
            let surface = if i % 2 == 0 { "paved" } else { "gravel" };
            (
                Some(point_blob(10.0 + i as f64 * 0.01, 60.0, 4326)),
                vec![text(&format!("Road {}", i)), text(surface), Value::Integer(i as i64)],
            )
        })
        .collect()
}

pub const ROAD_FIELDS: &[(&str, &str)] = &[("name", "TEXT"), ("surface", "TEXT(10)"), ("lanes", "INTEGER")];

/// Write a roads GeoPackage with one point layer and a surface code list.
pub fn roads_gpkg(dir: &Path, stem: &str, count: usize) -> PathBuf {
    let fixture = GpkgFixture::create(dir.join(format!("{}.gpkg", stem)));
    fixture
        .layer("roads", "POINT", 4326, ROAD_FIELDS, road_rows(count))
        .attributes(
            "code_roads_surface",
            &[("code", "TEXT")],
            vec![vec![text("paved")], vec![text("gravel")], vec![text("paved")]],
        );
    fixture.finish()
}

/// Write a CSV metadata table.
pub fn metadata_csv(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("metadata.csv");
    std::fs::write(&path, content).expect("Failed to write metadata");
    path
}
