use glam::Vec3;

/// Builds the 12 edges of an axis-aligned box of size `(w, h, d) * scale`
/// centered at the origin, as an interleaved position+color line list
/// (24 vertices, 6 floats each). Each edge is tinted by its dominant axis
/// for orientation cues: X red, Y green, Z blue.
pub fn bounding_box_lines(w: f32, h: f32, d: f32, scale: f32) -> Vec<f32> {
    let half = 0.5 * scale * Vec3::new(w, h, d);
    let (x0, x1) = (-half.x, half.x);
    let (y0, y1) = (-half.y, half.y);
    let (z0, z1) = (-half.z, half.z);

    let edges: [(Vec3, Vec3); 12] = [
        // bottom face
        (Vec3::new(x0, y0, z0), Vec3::new(x1, y0, z0)),
        (Vec3::new(x1, y0, z0), Vec3::new(x1, y1, z0)),
        (Vec3::new(x1, y1, z0), Vec3::new(x0, y1, z0)),
        (Vec3::new(x0, y1, z0), Vec3::new(x0, y0, z0)),
        // top face
        (Vec3::new(x0, y0, z1), Vec3::new(x1, y0, z1)),
        (Vec3::new(x1, y0, z1), Vec3::new(x1, y1, z1)),
        (Vec3::new(x1, y1, z1), Vec3::new(x0, y1, z1)),
        (Vec3::new(x0, y1, z1), Vec3::new(x0, y0, z1)),
        // verticals
        (Vec3::new(x0, y0, z0), Vec3::new(x0, y0, z1)),
        (Vec3::new(x1, y0, z0), Vec3::new(x1, y0, z1)),
        (Vec3::new(x1, y1, z0), Vec3::new(x1, y1, z1)),
        (Vec3::new(x0, y1, z0), Vec3::new(x0, y1, z1)),
    ];

    let mut vertices = Vec::with_capacity(edges.len() * 12);
    for (a, b) in edges {
        let dir = b - a;
        let color = if dir.x.abs() > 0.0 && dir.y == 0.0 && dir.z == 0.0 {
            Vec3::X
        } else if dir.y.abs() > 0.0 && dir.x == 0.0 && dir.z == 0.0 {
            Vec3::Y
        } else if dir.z.abs() > 0.0 && dir.x == 0.0 && dir.y == 0.0 {
            Vec3::Z
        } else {
            Vec3::ONE
        };
        for p in [a, b] {
            vertices.extend_from_slice(&[p.x, p.y, p.z, color.x, color.y, color.z]);
        }
    }
    vertices
}

/// Two triangles covering normalized device coordinates, used as the
/// ray-generation surface: every pixel unprojects to a world-space ray.
pub fn fullscreen_quad() -> [f32; 12] {
    [
        -1.0, -1.0, //
        1.0, -1.0, //
        1.0, 1.0, //
        -1.0, -1.0, //
        1.0, 1.0, //
        -1.0, 1.0,
    ]
}

/// World-space quad of the slice at `index` along `axis` (0 = Z, 1 = Y,
/// 2 = X), positioned at the voxel center inside the physical box. The index
/// must already be clamped to the axis extent. Returns 6 vertices
/// (two triangles), 3 floats each.
pub fn slice_quad(axis: u8, index: u32, box_min: Vec3, box_max: Vec3, dims: [u32; 3]) -> [f32; 18] {
    let extent = match axis {
        0 => dims[2],
        1 => dims[1],
        _ => dims[0],
    }
    .max(1);
    let s = (index as f32 + 0.5) / extent as f32;

    let (p0, p1, p2, p3) = match axis {
        0 => {
            let z = box_min.z + (box_max.z - box_min.z) * s;
            (
                Vec3::new(box_min.x, box_min.y, z),
                Vec3::new(box_max.x, box_min.y, z),
                Vec3::new(box_max.x, box_max.y, z),
                Vec3::new(box_min.x, box_max.y, z),
            )
        }
        1 => {
            let y = box_min.y + (box_max.y - box_min.y) * s;
            (
                Vec3::new(box_min.x, y, box_min.z),
                Vec3::new(box_max.x, y, box_min.z),
                Vec3::new(box_max.x, y, box_max.z),
                Vec3::new(box_min.x, y, box_max.z),
            )
        }
        _ => {
            let x = box_min.x + (box_max.x - box_min.x) * s;
            (
                Vec3::new(x, box_min.y, box_min.z),
                Vec3::new(x, box_max.y, box_min.z),
                Vec3::new(x, box_max.y, box_max.z),
                Vec3::new(x, box_min.y, box_max.z),
            )
        }
    };

    let mut out = [0.0f32; 18];
    for (i, p) in [p0, p1, p2, p0, p2, p3].into_iter().enumerate() {
        out[i * 3] = p.x;
        out[i * 3 + 1] = p.y;
        out[i * 3 + 2] = p.z;
    }
    out
}
