use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use starscape_render::{
    Geometry, GeometryId, Material, MeshData, NodeKind, PerspectiveCamera, Scene,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Drawing-buffer size in pixels in `xy`.
    pub viewport: [f32; 4],
    /// Summed ambient light, premultiplied by intensity.
    pub ambient: [f32; 4],
    pub light_color: [f32; 4],
    /// Direction the directional light travels in.
    pub light_dir: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct StarInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct MeshInstance {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Everything one frame uploads, gathered from the scene on the CPU.
#[derive(Debug)]
pub(crate) struct FrameData {
    pub uniforms: Uniforms,
    pub stars: Vec<StarInstance>,
    pub meshes: Vec<(GeometryId, MeshInstance)>,
}

pub(crate) fn collect_frame(
    scene: &Scene,
    camera: &PerspectiveCamera,
    size: (u32, u32),
) -> FrameData {
    let resources = scene.resources();
    let mut ambient = Vec3::ZERO;
    let mut light: Option<(Vec3, Vec3)> = None;
    let mut stars = Vec::new();
    let mut meshes = Vec::new();

    for node in scene.nodes() {
        match node.kind {
            NodeKind::AmbientLight { color, intensity } => {
                ambient += Vec3::new(color.r, color.g, color.b) * intensity;
            }
            NodeKind::DirectionalLight {
                color,
                intensity,
                direction,
            } => {
                if light.is_none() {
                    light = Some((Vec3::new(color.r, color.g, color.b) * intensity, direction));
                }
            }
            NodeKind::Points { geometry, material } => {
                let (Some(Geometry::Points { positions }), Some(Material::Points { color, size })) =
                    (resources.geometry(geometry), resources.material(material))
                else {
                    continue;
                };
                let model = node.transform.matrix();
                stars.extend(positions.iter().map(|p| StarInstance {
                    position: model.transform_point3(*p).to_array(),
                    size: *size,
                    color: color.to_array(),
                }));
            }
            NodeKind::Mesh { geometry, material } => {
                let (Some(Geometry::Mesh(_)), Some(Material::Lit { color })) =
                    (resources.geometry(geometry), resources.material(material))
                else {
                    continue;
                };
                meshes.push((geometry, mesh_instance(node.transform.matrix(), color.to_array())));
            }
        }
    }

    let (light_color, light_dir) = light.unwrap_or((Vec3::ZERO, Vec3::NEG_Z));
    let uniforms = Uniforms {
        view_proj: camera.view_projection().to_cols_array_2d(),
        viewport: [size.0 as f32, size.1 as f32, 0.0, 0.0],
        ambient: ambient.extend(1.0).to_array(),
        light_color: light_color.extend(1.0).to_array(),
        light_dir: light_dir.normalize_or(Vec3::NEG_Z).extend(0.0).to_array(),
    };

    FrameData {
        uniforms,
        stars,
        meshes,
    }
}

fn mesh_instance(model: Mat4, color: [f32; 4]) -> MeshInstance {
    let cols = model.to_cols_array_2d();
    MeshInstance {
        model_0: cols[0],
        model_1: cols[1],
        model_2: cols[2],
        model_3: cols[3],
        color,
    }
}

/// Interleave positions and normals for upload.
pub(crate) fn mesh_vertices(mesh: &MeshData) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .zip(mesh.normals.iter().chain(std::iter::repeat(&Vec3::Z)))
        .map(|(p, n)| Vertex {
            position: p.to_array(),
            normal: n.to_array(),
        })
        .collect()
}
