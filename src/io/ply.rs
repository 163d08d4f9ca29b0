use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array2, Axis};
use ply_rs::ply::{
    self, Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::{parser, writer::Writer};

use super::Geometry;
use crate::error::{Error, Result};

#[derive(Debug)]
struct Vertex {
    point: [f32; 3],
    color: [u8; 3],
}

impl ply::PropertyAccess for Vertex {
    fn new() -> Self {
        Vertex {
            point: [0f32; 3],
            color: [0u8; 3],
        }
    }

    fn set_property(&mut self, key: String, property: ply::Property) {
        match (key.as_ref(), property) {
            ("x", ply::Property::Float(v)) => self.point[0] = v,
            ("y", ply::Property::Float(v)) => self.point[1] = v,
            ("z", ply::Property::Float(v)) => self.point[2] = v,
            ("red", ply::Property::UChar(v)) => self.color[0] = v,
            ("green", ply::Property::UChar(v)) => self.color[1] = v,
            ("blue", ply::Property::UChar(v)) => self.color[2] = v,
            (_, _) => (),
        }
    }
}

/// Reads the vertices and colors of a PLY point cloud. Other elements are ignored.
pub fn read_ply<P: AsRef<Path>>(filepath: P) -> Result<Geometry> {
    let mut f = BufReader::new(File::open(filepath)?);

    let vertex_parser = parser::Parser::<Vertex>::new();
    let header = vertex_parser.read_header(&mut f)?;

    let element = header
        .elements
        .get("vertex")
        .ok_or_else(|| Error::parser("PLY file without vertex element"))?;
    let vertices = vertex_parser.read_payload_for_element(&mut f, element, &header)?;

    let mut geometry = Geometry::from_points(Array2::<f32>::from_shape_fn(
        (vertices.len(), 3),
        |(i, c)| vertices[i].point[c],
    ));
    if ["red", "green", "blue"]
        .iter()
        .all(|k| element.properties.contains_key(*k))
    {
        geometry.colors = Some(Array2::<u8>::from_shape_fn(
            (vertices.len(), 3),
            |(i, c)| vertices[i].color[c],
        ));
    }

    Ok(geometry)
}

/// Writes the points, vertex colors and faces of a geometry as an ASCII PLY file.
pub fn write_ply<P: AsRef<Path>>(filepath: P, geom: &Geometry) -> Result<()> {
    let mut ply = Ply::<DefaultElement>::new();
    let mut vertex_element = ElementDef::new("vertex".to_string());
    ["x", "y", "z"].iter().for_each(|key| {
        vertex_element.properties.add(PropertyDef::new(
            key.to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
    });

    let mut vertex_array: Vec<DefaultElement> = geom
        .points
        .axis_iter(Axis(0))
        .map(|point| {
            let mut elem = DefaultElement::new();
            elem.insert("x".to_string(), Property::Float(point[0]));
            elem.insert("y".to_string(), Property::Float(point[1]));
            elem.insert("z".to_string(), Property::Float(point[2]));
            elem
        })
        .collect();

    if let Some(colors) = &geom.colors {
        ["red", "green", "blue"].iter().for_each(|key| {
            vertex_element.properties.add(PropertyDef::new(
                key.to_string(),
                PropertyType::Scalar(ScalarType::UChar),
            ));
        });

        colors
            .axis_iter(Axis(0))
            .zip(vertex_array.iter_mut())
            .for_each(|(color, vertex)| {
                vertex.insert("red".to_string(), Property::UChar(color[0]));
                vertex.insert("green".to_string(), Property::UChar(color[1]));
                vertex.insert("blue".to_string(), Property::UChar(color[2]));
            });
    }

    ply.header.elements.add(vertex_element);
    ply.payload.insert("vertex".to_string(), vertex_array);

    if let Some(faces) = &geom.faces {
        let mut face_element = ElementDef::new("face".to_string());
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        let face_array: Vec<DefaultElement> = faces
            .axis_iter(Axis(0))
            .map(|face| {
                let mut elem = DefaultElement::new();
                elem.insert(
                    "vertex_indices".to_string(),
                    Property::ListInt(face.iter().map(|f| *f as i32).collect()),
                );
                elem
            })
            .collect();

        ply.header.elements.add(face_element);
        ply.payload.insert("face".to_string(), face_array);
    }

    ply.make_consistent()
        .map_err(|err| Error::parser(format!("Inconsistent PLY data: {err:?}")))?;
    ply.header.encoding = Encoding::Ascii;

    let mut buf = BufWriter::new(File::create(filepath)?);
    Writer::new().write_ply(&mut buf, &mut ply)?;

    Ok(())
}
