use std::{fs, path::Path};

use glam::Vec2;

use crate::core::PolygonFace;

/// Loads 2D collidable geometry from a Blender-style wavefront .obj export.
///
/// Only the wireframe subset matters here: `v` vertex positions (z ignored),
/// `vn` vertex normals, and `l` line segments between 1-based vertex
/// indices.  Faces, materials and smooth-shading markers are skipped.  Any
/// failure short of an I/O panic degrades to an empty geometry set with a
/// diagnostic; a missing mesh must never take the simulation down.
pub struct BlenderLoad {
    polygons: Vec<PolygonFace>,
}

impl BlenderLoad {
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::from_str(&content),
            Err(err) => {
                log::warn!("could not open mesh file {}: {}", path.display(), err);
                Self {
                    polygons: Vec::new(),
                }
            }
        }
    }

    pub fn from_str(content: &str) -> Self {
        let mut lines = content.lines();

        // a Blender export introduces itself in the first line
        match lines.next() {
            Some(header) if header.contains("OBJ") => {}
            _ => {
                log::warn!("mesh file is missing the OBJ header line; ignoring it");
                return Self {
                    polygons: Vec::new(),
                };
            }
        }

        let mut positions: Vec<Vec2> = Vec::new();
        let mut normals: Vec<Vec2> = Vec::new();
        let mut polygons: Vec<PolygonFace> = Vec::new();
        let mut reported_bad_number = false;

        for line in lines {
            let mut fields = line.split_whitespace();
            let Some(header) = fields.next() else {
                continue;
            };

            match header {
                "o" => {
                    // object names are irrelevant; all geometry lands in one
                    // flat collection
                }
                "v" => {
                    let x = parse_coord(fields.next(), &mut reported_bad_number);
                    let y = parse_coord(fields.next(), &mut reported_bad_number);
                    positions.push(Vec2::new(x, y));
                }
                "vn" => {
                    let x = parse_coord(fields.next(), &mut reported_bad_number);
                    let y = parse_coord(fields.next(), &mut reported_bad_number);
                    normals.push(Vec2::new(x, y));
                }
                "l" => {
                    // .obj indices are 1-based
                    let i1 = fields
                        .next()
                        .and_then(|f| f.parse::<usize>().ok())
                        .and_then(|i| i.checked_sub(1));
                    let i2 = fields
                        .next()
                        .and_then(|f| f.parse::<usize>().ok())
                        .and_then(|i| i.checked_sub(1));
                    let (Some(i1), Some(i2)) = (i1, i2) else {
                        log::warn!("skipping malformed line segment '{}'", line);
                        continue;
                    };
                    let (Some(p1), Some(p2)) =
                        (positions.get(i1).copied(), positions.get(i2).copied())
                    else {
                        log::warn!("skipping line segment with out-of-range vertex '{}'", line);
                        continue;
                    };
                    // wireframe exports rarely carry normals for lines; take
                    // the normal at the same index when one exists
                    let n1 = normals.get(i1).copied().unwrap_or(Vec2::ZERO);
                    let n2 = normals.get(i2).copied().unwrap_or(Vec2::ZERO);
                    polygons.push(PolygonFace::new(p1, n1, p2, n2));
                }
                "f" | "usemtl" | "s" | "mtllib" | "#" => {}
                _ => {
                    log::debug!("unknown line header in mesh file: '{}'", line);
                }
            }
        }

        Self { polygons }
    }

    pub fn polygons(&self) -> &[PolygonFace] {
        &self.polygons
    }

    pub fn into_polygons(self) -> Vec<PolygonFace> {
        self.polygons
    }
}

fn parse_coord(field: Option<&str>, reported: &mut bool) -> f32 {
    match field.map(str::parse::<f32>) {
        Some(Ok(value)) => value,
        _ => {
            if !*reported {
                log::warn!("malformed numeric field in mesh file; using 0.0");
                *reported = true;
            }
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALL_MESH: &str = "\
# Blender v2.78 (sub 0) OBJ File: 'arena.blend'
# www.blender.org
mtllib arena.mtl
o LeftWall
v 0.0 -1.0 0.0
v 0.0 1.0 0.0
vn -1.0 0.0 0.0
vn -1.0 0.0 0.0
usemtl None
s off
l 1 2
";

    #[test]
    fn test_loads_line_segments_with_normals() {
        let load = BlenderLoad::from_str(WALL_MESH);
        assert_eq!(load.polygons().len(), 1);

        let face = &load.polygons()[0];
        assert_eq!(face.p1(), Vec2::new(0.0, -1.0));
        assert_eq!(face.p2(), Vec2::new(0.0, 1.0));
        assert_eq!(face.n1(), Vec2::new(-1.0, 0.0));
        assert_eq!(face.n2(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_missing_obj_header_yields_empty_geometry() {
        let load = BlenderLoad::from_str("v 0.0 0.0 0.0\nv 1.0 0.0 0.0\nl 1 2\n");
        assert!(load.polygons().is_empty());
    }

    #[test]
    fn test_missing_file_yields_empty_geometry() {
        let load = BlenderLoad::from_file("definitely/not/a/mesh.obj");
        assert!(load.polygons().is_empty());
    }

    #[test]
    fn test_malformed_numbers_become_zero() {
        let mesh = "\
# OBJ File
o Broken
v oops -1.0 0.0
v 0.0 1.0 0.0
l 1 2
";
        let load = BlenderLoad::from_str(mesh);
        assert_eq!(load.polygons().len(), 1);
        assert_eq!(load.polygons()[0].p1(), Vec2::new(0.0, -1.0));
        // missing normals default to zero vectors
        assert_eq!(load.polygons()[0].n1(), Vec2::ZERO);
    }

    #[test]
    fn test_out_of_range_indices_skip_the_segment() {
        let mesh = "\
# OBJ File
o Broken
v 0.0 0.0 0.0
l 1 7
";
        let load = BlenderLoad::from_str(mesh);
        assert!(load.polygons().is_empty());
    }
}
