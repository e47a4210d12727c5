use std::path::Path;

use crate::volume::buffer::{FieldData, ScalarField, VolumeBuffer};
use crate::volume::loader::VolumeError;

/// Upper bound on the tuple count honored when pre-allocating a field.
const MAX_PREALLOC_TUPLES: usize = 1 << 24;

/// Reads a legacy ASCII VTK STRUCTURED_POINTS file carrying one or more
/// scalar fields over a shared grid geometry.
pub fn load_file(path: &Path) -> Result<VolumeBuffer, VolumeError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

/// Parses the legacy format's keyword stream: DIMENSIONS/SPACING/ORIGIN for
/// geometry, then SCALARS and FIELD blocks for the data arrays. Each field is
/// normalized to [0, 1] independently, with its original min/max recorded.
pub fn parse(text: &str) -> Result<VolumeBuffer, VolumeError> {
    let mut tokens = text.split_ascii_whitespace().peekable();

    let mut dims: [u32; 3] = [0; 3];
    let mut spacing = [1.0f64; 3];
    let mut origin = [0.0f32; 3];
    let mut point_count: usize = 0;
    let mut fields: Vec<ScalarField> = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            "BINARY" => {
                return Err(VolumeError::MalformedVtk(
                    "binary VTK files are not supported".into(),
                ));
            }
            "DIMENSIONS" => {
                for dim in &mut dims {
                    *dim = next_number(&mut tokens, "DIMENSIONS")?;
                }
            }
            "SPACING" | "ASPECT_RATIO" => {
                for s in &mut spacing {
                    *s = next_number(&mut tokens, "SPACING")?;
                }
            }
            "ORIGIN" => {
                for o in &mut origin {
                    *o = next_number(&mut tokens, "ORIGIN")?;
                }
            }
            "POINT_DATA" => {
                point_count = next_number(&mut tokens, "POINT_DATA")?;
            }
            "SCALARS" => {
                let name = next_token(&mut tokens, "SCALARS name")?.to_owned();
                let _type = next_token(&mut tokens, "SCALARS type")?;
                // Optional component count before the LOOKUP_TABLE line.
                let mut components: usize = 1;
                if let Some(peeked) = tokens.peek() {
                    if let Ok(n) = peeked.parse::<usize>() {
                        components = n.max(1);
                        tokens.next();
                    }
                }
                if tokens.next() != Some("LOOKUP_TABLE") {
                    return Err(VolumeError::MalformedVtk(format!(
                        "SCALARS {name} is missing its LOOKUP_TABLE line"
                    )));
                }
                let _table = next_token(&mut tokens, "LOOKUP_TABLE name")?;
                fields.push(read_field(&mut tokens, name, components, point_count)?);
            }
            "FIELD" => {
                let _field_name = next_token(&mut tokens, "FIELD name")?;
                let arrays: usize = next_number(&mut tokens, "FIELD array count")?;
                for _ in 0..arrays {
                    let name = next_token(&mut tokens, "FIELD array name")?.to_owned();
                    let components: usize = next_number(&mut tokens, "FIELD components")?;
                    let tuples: usize = next_number(&mut tokens, "FIELD tuples")?;
                    let _type = next_token(&mut tokens, "FIELD type")?;
                    fields.push(read_field(
                        &mut tokens,
                        name,
                        components.max(1),
                        tuples,
                    )?);
                }
            }
            _ => {}
        }
    }

    if dims.iter().any(|&d| d == 0) {
        return Err(VolumeError::MalformedVtk("missing or zero DIMENSIONS".into()));
    }
    if fields.is_empty() {
        return Err(VolumeError::MalformedVtk("no scalar fields found".into()));
    }
    let voxels = dims[0] as usize * dims[1] as usize * dims[2] as usize;
    if fields.iter().any(|f| f.data.len() != voxels) {
        return Err(VolumeError::MalformedVtk(
            "field size does not match DIMENSIONS".into(),
        ));
    }

    let mut volume = VolumeBuffer::new(dims[0], dims[1], dims[2], spacing, fields);
    volume.origin = glam::Vec3::from_array(origin);
    Ok(volume)
}

/// Reads `tuples` tuples of `components` values, keeping the first component
/// of each, then normalizes to [0, 1]. A degenerate value range collapses to
/// a constant 0.5 field.
fn read_field<'a, I>(
    tokens: &mut I,
    name: String,
    components: usize,
    tuples: usize,
) -> Result<ScalarField, VolumeError>
where
    I: Iterator<Item = &'a str>,
{
    // The declared count is untrusted; cap the reservation and let the
    // token stream run dry on short files.
    let mut data = Vec::with_capacity(tuples.min(MAX_PREALLOC_TUPLES));
    for _ in 0..tuples {
        for component in 0..components {
            let value: f32 = next_number(tokens, "field value")?;
            if component == 0 {
                data.push(value);
            }
        }
    }

    let (min, max) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if max - min > 1e-6 {
        let range = max - min;
        for v in &mut data {
            *v = (*v - min) / range;
        }
    } else {
        for v in &mut data {
            *v = 0.5;
        }
    }

    Ok(ScalarField {
        name,
        data: FieldData::F32(data),
        min,
        max,
    })
}

fn next_token<'a, I>(tokens: &mut I, what: &str) -> Result<&'a str, VolumeError>
where
    I: Iterator<Item = &'a str>,
{
    tokens
        .next()
        .ok_or_else(|| VolumeError::MalformedVtk(format!("unexpected end of file at {what}")))
}

fn next_number<'a, I, T>(tokens: &mut I, what: &str) -> Result<T, VolumeError>
where
    I: Iterator<Item = &'a str>,
    T: std::str::FromStr,
{
    let token = next_token(tokens, what)?;
    token
        .parse()
        .map_err(|_| VolumeError::MalformedVtk(format!("cannot parse {token:?} in {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "# vtk DataFile Version 3.0\n\
        sample grid\n\
        ASCII\n\
        DATASET STRUCTURED_POINTS\n\
        DIMENSIONS 2 2 2\n\
        SPACING 1.0 1.0 2.0\n\
        ORIGIN 0 0 0\n\
        POINT_DATA 8\n";

    #[test]
    fn parses_scalars_block_and_normalizes() {
        let text = format!(
            "{HEADER}SCALARS density float 1\nLOOKUP_TABLE default\n0 1 2 3 4 5 6 7\n"
        );
        let volume = parse(&text).unwrap();
        assert_eq!((volume.width, volume.height, volume.depth), (2, 2, 2));
        assert_eq!(volume.spacing, [1.0, 1.0, 2.0]);
        assert_eq!(volume.field_count(), 1);

        let field = &volume.fields[0];
        assert_eq!(field.name, "density");
        assert_eq!(field.min, 0.0);
        assert_eq!(field.max, 7.0);
        let FieldData::F32(data) = &field.data else {
            panic!("expected f32 field");
        };
        assert_eq!(data[0], 0.0);
        assert_eq!(data[7], 1.0);
    }

    #[test]
    fn scalars_component_count_is_optional() {
        let text = format!(
            "{HEADER}SCALARS density float\nLOOKUP_TABLE default\n0 1 2 3 4 5 6 7\n"
        );
        assert!(parse(&text).is_ok());
    }

    #[test]
    fn parses_multi_field_block() {
        let text = format!(
            "{HEADER}FIELD FieldData 2\n\
             pressure 1 8 float\n1 2 3 4 5 6 7 8\n\
             temperature 1 8 float\n8 7 6 5 4 3 2 1\n"
        );
        let volume = parse(&text).unwrap();
        assert_eq!(volume.field_count(), 2);
        assert_eq!(volume.fields[0].name, "pressure");
        assert_eq!(volume.fields[1].name, "temperature");
    }

    #[test]
    fn constant_field_collapses_to_half() {
        let text = format!(
            "{HEADER}SCALARS flat float 1\nLOOKUP_TABLE default\n3 3 3 3 3 3 3 3\n"
        );
        let volume = parse(&text).unwrap();
        let FieldData::F32(data) = &volume.fields[0].data else {
            panic!("expected f32 field");
        };
        assert!(data.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn truncated_data_is_rejected() {
        let text = format!("{HEADER}SCALARS density float 1\nLOOKUP_TABLE default\n0 1 2\n");
        assert!(matches!(parse(&text), Err(VolumeError::MalformedVtk(_))));
    }

    #[test]
    fn missing_dimensions_is_rejected() {
        let text = "ASCII\nPOINT_DATA 8\nSCALARS d float 1\nLOOKUP_TABLE default\n\
                    0 1 2 3 4 5 6 7\n";
        assert!(matches!(parse(text), Err(VolumeError::MalformedVtk(_))));
    }

    #[test]
    fn binary_files_are_rejected() {
        let text = "# vtk DataFile Version 3.0\nx\nBINARY\n";
        assert!(matches!(parse(text), Err(VolumeError::MalformedVtk(_))));
    }

    #[test]
    fn absurd_declared_tuple_count_is_rejected() {
        let text = format!(
            "{HEADER}FIELD FieldData 1\npressure 1 999999999999 float\n1 2 3\n"
        );
        assert!(matches!(parse(&text), Err(VolumeError::MalformedVtk(_))));
    }

    #[test]
    fn field_size_must_match_dimensions() {
        let text = format!(
            "{HEADER}FIELD FieldData 1\npressure 1 4 float\n1 2 3 4\n"
        );
        assert!(matches!(parse(&text), Err(VolumeError::MalformedVtk(_))));
    }
}
