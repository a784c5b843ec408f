//! Geometry helpers shared by the sampler and the base map.

use geo::{
    BooleanOps, Centroid, Coord, Geometry, GeometryCollection, LineString, MultiPolygon, Point,
    Polygon, SimplifyVwPreserve,
};
use indexmap::IndexSet;

use crate::input::Feature;

/// Name of a geometry's type, as shown in product sheets.
pub fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) | Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Distinct geometry types of a layer's features, in first-seen order.
pub fn observed_geometry_types(features: &[Feature]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
        let name = geometry_type_name(geometry);
        if !types.iter().any(|t| t == name) {
            types.push(name.to_string());
        }
    }
    types
}

/// Centroid of the union of `geometries`.
///
/// Coincident geometries count once: polygons are unioned, identical line
/// segments and identical points are merged. Only the highest dimension
/// present contributes, so points next to polygons do not move the result.
pub fn union_centroid<'a>(
    geometries: impl IntoIterator<Item = &'a Geometry<f64>>,
) -> Option<Point<f64>> {
    let mut parts = Parts::default();
    for geometry in geometries {
        parts.add(geometry);
    }

    areal_centroid(parts.polygons)
        .or_else(|| linear_centroid(&parts.segments))
        .or_else(|| puntal_centroid(&parts.points))
}

/// Geometries split by dimension, with duplicates merged.
#[derive(Default)]
struct Parts {
    polygons: Vec<MultiPolygon<f64>>,
    segments: IndexSet<[CoordKey; 2]>,
    points: IndexSet<CoordKey>,
}

impl Parts {
    fn add(&mut self, geometry: &Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.add_point(p.0),
            Geometry::MultiPoint(mp) => mp.0.iter().for_each(|p| self.add_point(p.0)),
            Geometry::Line(l) => self.add_segment(l.start, l.end),
            Geometry::LineString(ls) => self.add_line_string(ls),
            Geometry::MultiLineString(mls) => mls.0.iter().for_each(|ls| self.add_line_string(ls)),
            Geometry::Polygon(p) => self.polygons.push(MultiPolygon(vec![p.clone()])),
            Geometry::MultiPolygon(mp) => self.polygons.push(mp.clone()),
            Geometry::Rect(r) => self.polygons.push(MultiPolygon(vec![r.to_polygon()])),
            Geometry::Triangle(t) => self.polygons.push(MultiPolygon(vec![t.to_polygon()])),
            Geometry::GeometryCollection(gc) => gc.0.iter().for_each(|g| self.add(g)),
        }
    }

    fn add_point(&mut self, coord: Coord<f64>) {
        self.points.insert(CoordKey::new(coord));
    }

    fn add_line_string(&mut self, line_string: &LineString<f64>) {
        if line_string.0.len() == 1 {
            self.add_point(line_string.0[0]);
        }
        for line in line_string.lines() {
            self.add_segment(line.start, line.end);
        }
    }

    fn add_segment(&mut self, start: Coord<f64>, end: Coord<f64>) {
        let (a, b) = (CoordKey::new(start), CoordKey::new(end));
        if a == b {
            self.add_point(start);
        } else if a < b {
            self.segments.insert([a, b]);
        } else {
            self.segments.insert([b, a]);
        }
    }
}

/// Bit pattern of a coordinate, with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct CoordKey(u64, u64);

impl CoordKey {
    fn new(coord: Coord<f64>) -> Self {
        Self((coord.x + 0.0).to_bits(), (coord.y + 0.0).to_bits())
    }

    fn coord(self) -> Coord<f64> {
        Coord {
            x: f64::from_bits(self.0),
            y: f64::from_bits(self.1),
        }
    }
}

/// Cascaded pairwise union, then the area-weighted centroid.
fn areal_centroid(mut polygons: Vec<MultiPolygon<f64>>) -> Option<Point<f64>> {
    if polygons.is_empty() {
        return None;
    }
    while polygons.len() > 1 {
        polygons = polygons
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => a.union(b),
                [a] => a.clone(),
                _ => MultiPolygon(Vec::<Polygon<f64>>::new()),
            })
            .collect();
    }
    polygons.pop().and_then(|union| union.centroid())
}

/// Length-weighted centroid of distinct segments.
fn linear_centroid(segments: &IndexSet<[CoordKey; 2]>) -> Option<Point<f64>> {
    let (mut sum_x, mut sum_y, mut total) = (0.0, 0.0, 0.0);
    for [a, b] in segments {
        let (a, b) = (a.coord(), b.coord());
        let length = (b.x - a.x).hypot(b.y - a.y);
        sum_x += (a.x + b.x) / 2.0 * length;
        sum_y += (a.y + b.y) / 2.0 * length;
        total += length;
    }
    (total > 0.0).then(|| Point::new(sum_x / total, sum_y / total))
}

/// Mean of distinct points.
fn puntal_centroid(points: &IndexSet<CoordKey>) -> Option<Point<f64>> {
    if points.is_empty() {
        return None;
    }
    let (sum_x, sum_y) = points
        .iter()
        .map(|key| key.coord())
        .fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));
    let n = points.len() as f64;
    Some(Point::new(sum_x / n, sum_y / n))
}

/// Simplify a geometry without introducing self-intersections.
///
/// `tolerance` is a distance in coordinate units; the Visvalingam-Whyatt
/// area threshold is its square. Points are returned unchanged.
pub fn simplify_preserving(geometry: &Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    if tolerance <= 0.0 {
        return geometry.clone();
    }
    let epsilon = tolerance * tolerance;

    match geometry {
        Geometry::LineString(g) => Geometry::LineString(g.simplify_vw_preserve(&epsilon)),
        Geometry::MultiLineString(g) => {
            Geometry::MultiLineString(g.simplify_vw_preserve(&epsilon))
        }
        Geometry::Polygon(g) => Geometry::Polygon(g.simplify_vw_preserve(&epsilon)),
        Geometry::MultiPolygon(g) => Geometry::MultiPolygon(g.simplify_vw_preserve(&epsilon)),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection(
            gc.0.iter()
                .map(|g| simplify_preserving(g, tolerance))
                .collect(),
        )),
        other => other.clone(),
    }
}
