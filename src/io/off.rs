use ndarray::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use super::Geometry;
use crate::error::{Error, Result};

struct TextParserContext<R: BufRead> {
    reader: R,
    filepath: String,
    line_count: usize,
}

impl<R: BufRead> TextParserContext<R> {
    /// Reads the next non-empty, non-comment line and increases the line counter. The
    /// line is trimmed.
    fn read_line(&mut self) -> Result<String> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(self.gen_error("unexpected end of file".to_string()));
            }
            self.line_count += 1;
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                return Ok(line.to_string());
            }
        }
    }

    /// Formats an error message by putting the file name, the current line and the
    /// supplied message.
    fn gen_error(&self, message: String) -> Error {
        Error::parser(format!(
            "{}:{}: {}",
            self.filepath, self.line_count, message
        ))
    }
}

fn parse_values<T: FromStr>(line: &str) -> Option<Vec<T>> {
    line.split_whitespace()
        .map(|value| value.parse::<T>().ok())
        .collect()
}

fn read_off_vertices<R: BufRead>(
    num_vertices: usize,
    parser_context: &mut TextParserContext<R>,
) -> Result<Array2<f32>> {
    let mut vertices = Array2::<f32>::zeros((num_vertices, 3));
    for i in 0..num_vertices {
        let line = parser_context.read_line()?;
        match parse_values::<f32>(&line).as_deref() {
            Some([x, y, z, ..]) => {
                vertices[[i, 0]] = *x;
                vertices[[i, 1]] = *y;
                vertices[[i, 2]] = *z;
            }
            _ => return Err(parser_context.gen_error(format!("Invalid vertex. Got `{line}`"))),
        }
    }

    Ok(vertices)
}

/// Parses one face line: `n i_1 .. i_n [r g b]`.
fn read_off_face<R: BufRead>(
    num_vertices: usize,
    parser_context: &mut TextParserContext<R>,
) -> Result<(Vec<usize>, Option<[u8; 3]>)> {
    let line = parser_context.read_line()?;
    let values = line.split_whitespace().collect::<Vec<_>>();

    let arity = values
        .first()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|arity| *arity >= 3 && values.len() > *arity)
        .ok_or_else(|| parser_context.gen_error(format!("Invalid face. Got `{line}`")))?;

    let indices = values[1..=arity]
        .iter()
        .map(|value| value.parse::<usize>().ok().filter(|i| *i < num_vertices))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| parser_context.gen_error(format!("Invalid face indices. Got `{line}`")))?;

    let color = match parse_values::<u8>(&values[arity + 1..].join(" ")).as_deref() {
        Some([]) => None,
        Some([r, g, b, ..]) => Some([*r, *g, *b]),
        _ => return Err(parser_context.gen_error(format!("Invalid face color. Got `{line}`"))),
    };

    Ok((indices, color))
}

/// Faces with a common arity are kept as they are; mixed faces are fan triangulated.
fn faces_to_array(faces: &[Vec<usize>], colors: &[Option<[u8; 3]>]) -> (Array2<usize>, Array2<u8>) {
    let arity = faces.first().map_or(3, Vec::len);
    if faces.iter().all(|face| face.len() == arity) {
        let face_array =
            Array2::from_shape_fn((faces.len(), arity), |(i, c)| faces[i][c]);
        let color_array =
            Array2::from_shape_fn((faces.len(), 3), |(i, c)| colors[i].map_or(0, |rgb| rgb[c]));
        return (face_array, color_array);
    }

    let mut triangles = Vec::new();
    let mut triangle_colors = Vec::new();
    for (face, color) in faces.iter().zip(colors.iter()) {
        for k in 1..face.len() - 1 {
            triangles.extend([face[0], face[k], face[k + 1]]);
            triangle_colors.extend(color.unwrap_or_default());
        }
    }
    (
        Array2::from_shape_vec((triangles.len() / 3, 3), triangles)
            .unwrap_or_else(|_| Array2::zeros((0, 3))),
        Array2::from_shape_vec((triangle_colors.len() / 3, 3), triangle_colors)
            .unwrap_or_else(|_| Array2::zeros((0, 3))),
    )
}

/// Reads an OFF file with triangle or quad faces and optional per face RGB colors.
pub fn read_off<P: AsRef<Path>>(filepath: P) -> Result<Geometry> {
    let file = File::open(&filepath)?;

    let mut parser_context = TextParserContext {
        reader: BufReader::new(file),
        filepath: filepath.as_ref().display().to_string(),
        line_count: 0,
    };

    let header = parser_context.read_line()?;
    if header != "OFF" {
        return Err(parser_context.gen_error(format!(
            "file header does not start with 'OFF', got '{header}' instead"
        )));
    }

    let dims = parser_context.read_line()?;
    let (num_vertices, num_faces) = match parse_values::<usize>(&dims).as_deref() {
        Some([v, f, _]) => (*v, *f),
        _ => {
            return Err(parser_context.gen_error(format!("Invalid size formats. Got `{dims}`")))
        }
    };

    let points = read_off_vertices(num_vertices, &mut parser_context)?;
    let mut faces = Vec::with_capacity(num_faces);
    let mut colors = Vec::with_capacity(num_faces);
    for _ in 0..num_faces {
        let (face, color) = read_off_face(num_vertices, &mut parser_context)?;
        faces.push(face);
        colors.push(color);
    }

    let has_colors = !colors.is_empty() && colors.iter().all(Option::is_some);
    let (faces, face_colors) = faces_to_array(&faces, &colors);
    Ok(Geometry {
        points,
        colors: None,
        faces: Some(faces),
        face_colors: has_colors.then_some(face_colors),
    })
}

/// Writes the points and faces of a geometry as OFF. Per face colors, when present,
/// follow the vertex indices of each face.
pub fn write_off<P: AsRef<Path>>(filepath: P, geometry: &Geometry) -> Result<()> {
    let mut out = BufWriter::new(File::create(filepath)?);
    let empty_faces = Array2::<usize>::zeros((0, 3));
    let faces = geometry.faces.as_ref().unwrap_or(&empty_faces);

    writeln!(out, "OFF")?;
    writeln!(out, "{} {} 0", geometry.len_vertices(), faces.nrows())?;
    for point in geometry.points.axis_iter(Axis(0)) {
        writeln!(out, "{} {} {}", point[0], point[1], point[2])?;
    }

    for (i, face) in faces.axis_iter(Axis(0)).enumerate() {
        write!(out, "{}", face.len())?;
        for index in face.iter() {
            write!(out, " {index}")?;
        }
        if let Some(colors) = &geometry.face_colors {
            write!(out, " {} {} {}", colors[[i, 0]], colors[[i, 1]], colors[[i, 2]])?;
        }
        writeln!(out)?;
    }
    out.flush()?;

    Ok(())
}
