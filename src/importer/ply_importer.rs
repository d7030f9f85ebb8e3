use std::path::Path;

use anyhow::{anyhow, bail, Context};
use asset_common::scene::{ImageData, ImportedMaterial, MeshData, MeshPrimitive, TextureData};
use ultraviolet::{Mat4, Vec3, Vec4};

use super::{Importer, ObjectData, ObjectInstance, SceneData};

/// Stanford `.ply` meshes, ASCII or binary. Reads positions, normals, vertex
/// colors and per-vertex object ids. There is no scene graph, only one mesh.
#[derive(Default)]
pub struct PlyImporter {
    mesh: Option<MeshData>,
}

impl PlyImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(bytes: &[u8]) -> anyhow::Result<MeshData> {
        let (header, body_start) = parse_header(bytes)?;
        let body = &bytes[body_start..];
        let mut source = match header.format {
            Format::Ascii => {
                let text = std::str::from_utf8(body).context("ASCII body is not UTF-8")?;
                Source::Ascii(text.split_ascii_whitespace())
            }
            Format::BinaryLittleEndian => Source::Binary {
                bytes: body,
                position: 0,
                big_endian: false,
            },
            Format::BinaryBigEndian => Source::Binary {
                bytes: body,
                position: 0,
                big_endian: true,
            },
        };

        let mut mesh = MeshData::new(MeshPrimitive::Triangles, Vec::new(), Vec::new());
        for element in &header.elements {
            match element.name.as_str() {
                "vertex" => read_vertices(element, &mut source, &mut mesh)?,
                "face" => read_faces(element, &mut source, &mut mesh)?,
                _ => {
                    for _ in 0..element.count {
                        for property in &element.properties {
                            property.skip(&mut source)?;
                        }
                    }
                }
            }
        }

        if let Some(index) = mesh
            .indices
            .iter()
            .find(|&&index| index as usize >= mesh.positions.len())
        {
            bail!("Face index {} is out of bounds", index);
        }
        Ok(mesh)
    }
}

impl Importer for PlyImporter {
    fn open_file(&mut self, path: &Path) -> anyhow::Result<()> {
        self.mesh = None;
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
        let mesh = Self::parse(&bytes).with_context(|| format!("Failed to parse PLY {:?}", path))?;
        self.mesh = Some(mesh);
        Ok(())
    }

    fn mesh_count(&self) -> usize {
        self.mesh.iter().count()
    }

    fn mesh(&self, id: usize) -> Option<MeshData> {
        if id == 0 {
            self.mesh.clone()
        } else {
            None
        }
    }

    fn material_count(&self) -> usize {
        0
    }

    fn material(&self, _id: usize) -> Option<ImportedMaterial> {
        None
    }

    fn texture_count(&self) -> usize {
        0
    }

    fn texture(&self, _id: usize) -> Option<TextureData> {
        None
    }

    fn image2d_level_count(&self, _image: usize) -> usize {
        0
    }

    fn image2d(&self, _image: usize, _level: usize) -> Option<ImageData> {
        None
    }

    fn object3d_count(&self) -> usize {
        self.mesh_count()
    }

    fn object3d(&self, id: usize) -> Option<ObjectData> {
        (id == 0 && self.mesh.is_some()).then(|| ObjectData {
            transformation: Mat4::identity(),
            instance: ObjectInstance::Mesh {
                mesh: 0,
                material: None,
            },
            children: Vec::new(),
        })
    }

    fn default_scene(&self) -> Option<usize> {
        None
    }

    fn scene(&self, _id: usize) -> Option<SceneData> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> anyhow::Result<Self> {
        Ok(match name {
            "char" | "int8" => ScalarType::I8,
            "uchar" | "uint8" => ScalarType::U8,
            "short" | "int16" => ScalarType::I16,
            "ushort" | "uint16" => ScalarType::U16,
            "int" | "int32" => ScalarType::I32,
            "uint" | "uint32" => ScalarType::U32,
            "float" | "float32" => ScalarType::F32,
            "double" | "float64" => ScalarType::F64,
            _ => bail!("Unknown property type {}", name),
        })
    }

    fn size(&self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }
}

#[derive(Clone, Debug)]
enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

#[derive(Clone, Debug)]
struct Property {
    name: String,
    kind: PropertyKind,
}

impl Property {
    fn skip(&self, source: &mut Source<'_>) -> anyhow::Result<()> {
        match self.kind {
            PropertyKind::Scalar(ty) => {
                source.read(ty)?;
            }
            PropertyKind::List { count, item } => {
                let count = source.read(count)? as usize;
                for _ in 0..count {
                    source.read(item)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

struct Header {
    format: Format,
    elements: Vec<Element>,
}

fn parse_header(bytes: &[u8]) -> anyhow::Result<(Header, usize)> {
    const END: &[u8] = b"end_header";
    let end = bytes
        .windows(END.len())
        .position(|window| window == END)
        .ok_or_else(|| anyhow!("Missing end_header"))?;
    let body_start = bytes[end..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|newline| end + newline + 1)
        .unwrap_or(bytes.len());
    let text = std::str::from_utf8(&bytes[..end]).context("Header is not UTF-8")?;

    let mut lines = text.lines().map(str::trim);
    if lines.next() != Some("ply") {
        bail!("Not a PLY file");
    }

    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();
    for line in lines {
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        match tokens.as_slice() {
            ["format", "ascii", _] => format = Some(Format::Ascii),
            ["format", "binary_little_endian", _] => format = Some(Format::BinaryLittleEndian),
            ["format", "binary_big_endian", _] => format = Some(Format::BinaryBigEndian),
            ["element", name, count] => elements.push(Element {
                name: name.to_string(),
                count: count
                    .parse()
                    .with_context(|| format!("Invalid element count {}", count))?,
                properties: Vec::new(),
            }),
            ["property", "list", count, item, name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| anyhow!("Property {} outside of an element", name))?;
                element.properties.push(Property {
                    name: name.to_string(),
                    kind: PropertyKind::List {
                        count: ScalarType::parse(count)?,
                        item: ScalarType::parse(item)?,
                    },
                });
            }
            ["property", ty, name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| anyhow!("Property {} outside of an element", name))?;
                element.properties.push(Property {
                    name: name.to_string(),
                    kind: PropertyKind::Scalar(ScalarType::parse(ty)?),
                });
            }
            ["comment", ..] | ["obj_info", ..] | [] => {}
            _ => log::warn!("Ignoring PLY header line {:?}", line),
        }
    }

    let format = format.ok_or_else(|| anyhow!("Missing format line"))?;
    Ok((Header { format, elements }, body_start))
}

enum Source<'a> {
    Ascii(std::str::SplitAsciiWhitespace<'a>),
    Binary {
        bytes: &'a [u8],
        position: usize,
        big_endian: bool,
    },
}

impl Source<'_> {
    fn read(&mut self, ty: ScalarType) -> anyhow::Result<f64> {
        match self {
            Source::Ascii(tokens) => {
                let token = tokens.next().ok_or_else(|| anyhow!("Unexpected end of data"))?;
                token
                    .parse::<f64>()
                    .with_context(|| format!("Invalid number {}", token))
            }
            Source::Binary {
                bytes,
                position,
                big_endian,
            } => {
                let size = ty.size();
                let raw = bytes
                    .get(*position..*position + size)
                    .ok_or_else(|| anyhow!("Unexpected end of data"))?;
                *position += size;
                let mut buffer = [0u8; 8];
                buffer[..size].copy_from_slice(raw);
                if *big_endian {
                    buffer[..size].reverse();
                }
                Ok(match ty {
                    ScalarType::I8 => i8::from_le_bytes([buffer[0]]) as f64,
                    ScalarType::U8 => buffer[0] as f64,
                    ScalarType::I16 => i16::from_le_bytes([buffer[0], buffer[1]]) as f64,
                    ScalarType::U16 => u16::from_le_bytes([buffer[0], buffer[1]]) as f64,
                    ScalarType::I32 => {
                        i32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as f64
                    }
                    ScalarType::U32 => {
                        u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as f64
                    }
                    ScalarType::F32 => {
                        f32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as f64
                    }
                    ScalarType::F64 => f64::from_le_bytes(buffer),
                })
            }
        }
    }
}

fn read_vertices(element: &Element, source: &mut Source<'_>, mesh: &mut MeshData) -> anyhow::Result<()> {
    let has = |name: &str| element.properties.iter().any(|p| p.name == name);
    let has_normals = has("nx") && has("ny") && has("nz");
    let has_colors = has("red") && has("green") && has("blue");
    let has_object_ids = has("object_id") || has("objectId");

    for _ in 0..element.count {
        let mut position = Vec3::zero();
        let mut normal = Vec3::zero();
        let mut color = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let mut object_id = 0u32;
        for property in &element.properties {
            let PropertyKind::Scalar(ty) = property.kind else {
                property.skip(source)?;
                continue;
            };
            let value = source.read(ty)?;
            // 8 bit colors are normalized, float colors are taken as is
            let channel = if ty == ScalarType::U8 {
                value as f32 / 255.0
            } else {
                value as f32
            };
            match property.name.as_str() {
                "x" => position.x = value as f32,
                "y" => position.y = value as f32,
                "z" => position.z = value as f32,
                "nx" => normal.x = value as f32,
                "ny" => normal.y = value as f32,
                "nz" => normal.z = value as f32,
                "red" => color.x = channel,
                "green" => color.y = channel,
                "blue" => color.z = channel,
                "alpha" => color.w = channel,
                "object_id" | "objectId" => object_id = value as u32,
                _ => {}
            }
        }
        mesh.positions.push(position);
        if has_normals {
            mesh.normals.push(normal);
        }
        if has_colors {
            mesh.colors.push(color);
        }
        if has_object_ids {
            mesh.object_ids.push(object_id);
        }
    }
    Ok(())
}

fn read_faces(element: &Element, source: &mut Source<'_>, mesh: &mut MeshData) -> anyhow::Result<()> {
    for _ in 0..element.count {
        for property in &element.properties {
            match property.kind {
                PropertyKind::List { count, item }
                    if property.name == "vertex_indices" || property.name == "vertex_index" =>
                {
                    let count = source.read(count)? as usize;
                    let mut polygon = Vec::with_capacity(count);
                    for _ in 0..count {
                        polygon.push(source.read(item)? as u32);
                    }
                    // triangle fan
                    for i in 1..polygon.len().saturating_sub(1) {
                        mesh.indices
                            .extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
                    }
                }
                _ => property.skip(source)?,
            }
        }
    }
    Ok(())
}
