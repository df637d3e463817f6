//! Wavefront OBJ mesh loading.
//!
//! Supports `v`, `vt`, `vn`, `usemtl` and polygonal `f` records in any of the
//! `v`, `v/vt`, `v//vn` and `v/vt/vn` forms. Polygons are fan-triangulated.
//! Material libraries are not read; `usemtl` names are matched against the
//! materials handed to the loader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::material::Material;
use crate::model::Model;
use crate::point3d::Point3D;
use crate::triangle::{Triangle, Vertex};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("mesh file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("line {line}: {kind} index {index} out of range (have {count})")]
    IndexOutOfRange { line: usize, kind: &'static str, index: i64, count: usize },
}

fn malformed(line: usize, message: impl Into<String>) -> LoadError {
    LoadError::Malformed { line, message: message.into() }
}

/// One corner of a face, already resolved to zero-based indices.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Corner {
    v: usize,
    vt: Option<usize>,
    vn: Option<usize>,
}

#[derive(Debug)]
struct Face {
    corners: Vec<Corner>,
    material: Option<usize>,
}

#[derive(Debug, Default)]
struct ObjData {
    positions: Vec<Point3D>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<Point3D>,
    faces: Vec<Face>,
}

/// Loads `path` into a model named after the file stem.
pub fn load_obj(path: impl AsRef<Path>, materials: Vec<Material>) -> Result<Model, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let name = path.file_stem().map_or_else(|| "mesh".to_string(), |s| s.to_string_lossy().into_owned());

    let model = parse_obj(BufReader::new(file), &name, materials).map_err(|e| match e {
        LoadError::Io { source, .. } => LoadError::Io { path: path.to_path_buf(), source },
        other => other,
    })?;
    info!("loaded {} ({} triangles, {} materials)", path.display(), model.triangles().len(), model.materials().len());
    Ok(model)
}

/// Parses OBJ text from any reader.
pub fn parse_obj<R: BufRead>(reader: R, name: &str, materials: Vec<Material>) -> Result<Model, LoadError> {
    let data = read_records(reader, &materials)?;
    let triangles = fan_triangulate(&data);
    if triangles.is_empty() {
        warn!("{name}: mesh has no faces");
    }
    Ok(Model::new(name, triangles, materials))
}

fn read_records<R: BufRead>(reader: R, materials: &[Material]) -> Result<ObjData, LoadError> {
    let mut data = ObjData::default();
    let mut current_material = None;

    for (number, line) in reader.lines().enumerate() {
        let line_no = number + 1;
        let line = line.map_err(|source| LoadError::Io { path: PathBuf::new(), source })?;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        if keyword.starts_with('#') {
            continue;
        }
        let args: Vec<&str> = tokens.collect();

        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&args, line_no)?;
                data.positions.push(Point3D::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&args, line_no)?;
                data.texcoords.push([u, v]);
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&args, line_no)?;
                data.normals.push(Point3D::new(x, y, z));
            }
            "usemtl" => {
                let wanted = args.first().copied().unwrap_or_default();
                current_material = materials.iter().position(|m| m.name == wanted);
                if current_material.is_none() {
                    warn!("line {line_no}: unknown material {wanted:?}, using default surface");
                }
            }
            "f" => {
                if args.len() < 3 {
                    return Err(malformed(line_no, format!("face needs at least 3 vertices, got {}", args.len())));
                }
                let corners = args
                    .iter()
                    .map(|part| parse_corner(part, &data, line_no))
                    .collect::<Result<Vec<_>, _>>()?;
                data.faces.push(Face { corners, material: current_material });
            }
            _ => {}
        }
    }

    Ok(data)
}

fn parse_floats<const N: usize>(args: &[&str], line: usize) -> Result<[f32; N], LoadError> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let token = args.get(i).ok_or_else(|| malformed(line, format!("expected {N} numbers")))?;
        *slot = token.parse().map_err(|_| malformed(line, format!("bad number {token:?}")))?;
    }
    Ok(out)
}

/// Resolves a one-based (or negative, relative) OBJ index against `count` entries.
fn resolve_index(token: &str, count: usize, kind: &'static str, line: usize) -> Result<usize, LoadError> {
    let index: i64 = token.parse().map_err(|_| malformed(line, format!("bad {kind} index {token:?}")))?;
    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => count as i64 + i,
        _ => -1,
    };
    if resolved < 0 || resolved >= count as i64 {
        return Err(LoadError::IndexOutOfRange { line, kind, index, count });
    }
    Ok(resolved as usize)
}

fn parse_corner(part: &str, data: &ObjData, line: usize) -> Result<Corner, LoadError> {
    let mut fields = part.split('/');
    let v = match fields.next() {
        Some(t) if !t.is_empty() => resolve_index(t, data.positions.len(), "vertex", line)?,
        _ => return Err(malformed(line, format!("missing vertex index in {part:?}"))),
    };
    let vt = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, data.texcoords.len(), "texcoord", line)?),
        _ => None,
    };
    let vn = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, data.normals.len(), "normal", line)?),
        _ => None,
    };
    if fields.next().is_some() {
        return Err(malformed(line, format!("too many fields in {part:?}")));
    }
    Ok(Corner { v, vt, vn })
}

fn fan_triangulate(data: &ObjData) -> Vec<Triangle> {
    let vertex = |c: Corner| {
        Vertex::new(
            data.positions[c.v],
            c.vt.map_or([0.0; 2], |i| data.texcoords[i]),
            c.vn.map_or(Point3D::ZERO, |i| data.normals[i]),
        )
    };

    let mut triangles = Vec::new();
    for face in &data.faces {
        let first = face.corners[0];
        for pair in face.corners[1..].windows(2) {
            triangles.push(Triangle::new(vertex(first), vertex(pair[0]), vertex(pair[1]), face.material));
        }
    }
    triangles
}
