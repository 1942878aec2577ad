use glam::Vec3;
use wgpu::util::DeviceExt;
use bytemuck::NoUninit;

use crate::config::LightingConfig;
use crate::model::TurretId;

#[repr(C)]
#[derive(Debug, Clone, Copy, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

// Corner order per face is counter-clockwise seen from outside
const BOX_FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
    ([1.0, 0.0, 0.0], [[1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]]),
    ([-1.0, 0.0, 0.0], [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]]),
    ([0.0, 1.0, 0.0], [[0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]),
    ([0.0, -1.0, 0.0], [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
    ([0.0, 0.0, 1.0], [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]]),
    ([0.0, 0.0, -1.0], [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]),
];

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Append an axis-aligned box spanning `min..max`.
    pub fn push_box(&mut self, min: Vec3, max: Vec3, color: [f32; 4]) {
        let size = max - min;
        for (normal, corners) in BOX_FACES {
            let base = self.vertices.len() as u32;
            for c in corners {
                let pos = min + Vec3::from(c) * size;
                self.vertices.push(Vertex { pos: pos.to_array(), normal, color });
            }
            self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    /// Append a box centred on `center` with half sizes `half`.
    pub fn push_centered_box(&mut self, center: Vec3, half: Vec3, color: [f32; 4]) {
        self.push_box(center - half, center + half, color);
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {

        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

const REGOLITH: [f32; 4] = [0.55, 0.54, 0.52, 1.0];
const HULL: [f32; 4] = [0.82, 0.82, 0.85, 1.0];
const PANEL: [f32; 4] = [0.25, 0.3, 0.45, 1.0];
const GUNMETAL: [f32; 4] = [0.35, 0.36, 0.38, 1.0];
const SHUTTLE_WHITE: [f32; 4] = [0.92, 0.9, 0.86, 1.0];
const LAMP: [f32; 4] = [1.0, 0.95, 0.7, 1.0];
const BEACON: [f32; 4] = [0.9, 0.1, 0.1, 1.0];

/// Ground plate, habitat modules and lamp posts.
pub fn create_base_mesh() -> Mesh {
    let mut mesh = Mesh::empty();
    mesh.push_box(Vec3::new(-30.0, -0.2, -30.0), Vec3::new(30.0, 0.0, 30.0), REGOLITH);

    // Habitat
    mesh.push_box(Vec3::new(-2.0, 0.0, 0.5), Vec3::new(1.5, 1.4, 3.0), HULL);
    mesh.push_box(Vec3::new(1.5, 0.0, 1.2), Vec3::new(4.5, 0.9, 2.4), HULL);
    mesh.push_box(Vec3::new(-5.0, 0.0, -4.0), Vec3::new(-2.5, 1.1, -1.0), HULL);
    // Solar array
    mesh.push_box(Vec3::new(5.0, 0.8, -6.0), Vec3::new(9.0, 0.85, -3.5), PANEL);
    mesh.push_box(Vec3::new(6.9, 0.0, -4.85), Vec3::new(7.1, 0.8, -4.65), GUNMETAL);

    // Lamp posts sit under the two point lights
    for lamp in LightingConfig::default().lamp_positions {
        mesh.push_box(Vec3::new(lamp.x - 0.02, 0.0, lamp.z - 0.02), Vec3::new(lamp.x + 0.02, lamp.y - 0.04, lamp.z + 0.02), GUNMETAL);
        mesh.push_centered_box(lamp, Vec3::splat(0.04), LAMP);
    }

    // Landing pad
    mesh.push_box(Vec3::new(1.27, 0.0, -2.23), Vec3::new(3.27, 0.02, -0.23), GUNMETAL);
    mesh
}

/// Pedestal at the turret's pivot plus a barrel that spins with it.
pub fn create_turret_mesh(turret: TurretId) -> Mesh {
    let pivot = turret.pivot().pivot;
    let mut mesh = Mesh::empty();
    mesh.push_box(Vec3::new(pivot.x - 0.6, 0.0, pivot.z - 0.6), Vec3::new(pivot.x + 0.6, pivot.y - 0.3, pivot.z + 0.6), GUNMETAL);
    mesh.push_centered_box(pivot, Vec3::new(0.5, 0.3, 0.5), HULL);
    mesh.push_box(pivot + Vec3::new(0.5, -0.08, -0.08), pivot + Vec3::new(2.0, 0.08, 0.08), GUNMETAL);
    mesh
}

/// Shuttle resting on the landing pad; the beacon sits where the red light is.
pub fn create_shuttle_mesh() -> Mesh {
    let pad = LightingConfig::default().red_light_position;
    let mut mesh = Mesh::empty();
    mesh.push_box(Vec3::new(pad.x - 0.35, 0.02, pad.z - 0.8), Vec3::new(pad.x + 0.35, 0.6, pad.z + 0.8), SHUTTLE_WHITE);
    mesh.push_box(Vec3::new(pad.x - 0.9, 0.2, pad.z - 0.3), Vec3::new(pad.x + 0.9, 0.28, pad.z + 0.4), SHUTTLE_WHITE);
    mesh.push_box(Vec3::new(pad.x - 0.05, 0.6, pad.z + 0.4), Vec3::new(pad.x + 0.05, 0.95, pad.z + 0.8), SHUTTLE_WHITE);
    mesh.push_centered_box(pad, Vec3::splat(0.05), BEACON);
    mesh
}

/// Unit cube around the eye. Colour comes from the sky shader.
pub fn create_sky_mesh() -> Mesh {
    let mut mesh = Mesh::empty();
    mesh.push_box(Vec3::splat(-1.0), Vec3::splat(1.0), [1.0; 4]);
    mesh
}

/// Meshes in `SceneObject::ALL` order: base, turrets, shuttle, sky.
pub fn create_outpost_meshes() -> [Mesh; 6] {
    [
        create_base_mesh(),
        create_turret_mesh(TurretId::First),
        create_turret_mesh(TurretId::Second),
        create_turret_mesh(TurretId::Third),
        create_shuttle_mesh(),
        create_sky_mesh(),
    ]
}
