// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Spincube: a rotating cube driving the submission harness.
//
// W/S and A/D rotate the cube, the mouse wheel zooms the field of view,
// V toggles vsync, F11 or Alt+Enter toggles fullscreen, Escape quits.

use std::mem;
use std::time::Duration;

use anyhow::Result;
use glam::{Mat4, Vec3};
use spindle_core::gpu::QueueKind;
use spindle_infra::{
    FrameControl, FrameDriver, GpuHarness, HarnessConfig, InputEvent, Runtime,
};
use wgpu::util::DeviceExt;

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;
const MIN_FOV: f32 = 12.0;
const MAX_FOV: f32 = 90.0;
const ROTATION_SPEED: f32 = 0.6; // radians per second while a key is held

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.6,
    b: 0.8,
    a: 1.0,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: [f32; 3],
}

impl Vertex {
    const fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // @location(0): position
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                // @location(1): color
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: mem::size_of::<[f32; 3]>() as u64,
                    shader_location: 1,
                },
            ],
        }
    }
}

const VERTICES: &[Vertex] = &[
    Vertex { position: [-1.0, -1.0, -1.0], color: [0.0, 0.0, 0.0] },
    Vertex { position: [-1.0, 1.0, -1.0], color: [0.0, 1.0, 0.0] },
    Vertex { position: [1.0, 1.0, -1.0], color: [1.0, 1.0, 0.0] },
    Vertex { position: [1.0, -1.0, -1.0], color: [1.0, 0.0, 0.0] },
    Vertex { position: [-1.0, -1.0, 1.0], color: [0.0, 0.0, 1.0] },
    Vertex { position: [-1.0, 1.0, 1.0], color: [0.0, 1.0, 1.0] },
    Vertex { position: [1.0, 1.0, 1.0], color: [1.0, 1.0, 1.0] },
    Vertex { position: [1.0, -1.0, 1.0], color: [1.0, 0.0, 1.0] },
];

const INDICES: &[u16] = &[
    0, 1, 2, 0, 2, 3, //
    4, 6, 5, 4, 7, 6, //
    4, 5, 1, 4, 1, 0, //
    3, 2, 6, 3, 6, 7, //
    1, 5, 6, 1, 6, 2, //
    4, 0, 3, 4, 3, 7, //
];

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    mvp: [[f32; 4]; 4],
}

struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

fn create_depth_target(device: &wgpu::Device, width: u32, height: u32) -> DepthTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Depth Texture View"),
        ..Default::default()
    });
    DepthTarget {
        _texture: texture,
        view,
    }
}

/// Uploads `contents` into a device-local buffer through the copy queue,
/// waiting on the copy's own fence before returning.
fn upload_through_copy_queue(
    gpu: &mut GpuHarness,
    label: &str,
    contents: &[u8],
    usage: wgpu::BufferUsages,
) -> Result<wgpu::Buffer> {
    let device = gpu.device().clone();
    let staging_label = format!("{label} Staging");
    let staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&staging_label),
        contents,
        usage: wgpu::BufferUsages::COPY_SRC,
    });
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: contents.len() as u64,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let queue = gpu.queue_mut(QueueKind::Copy);
    let list = queue.acquire_list()?;
    queue.backend().with_encoder(list, |encoder| {
        encoder.copy_buffer_to_buffer(&staging, 0, &buffer, 0, contents.len() as u64);
    })?;
    let fence = queue.execute(list)?;
    queue.wait_for_fence_value(fence)?;

    Ok(buffer)
}

#[derive(Default)]
struct HeldKeys {
    w: bool,
    s: bool,
    a: bool,
    d: bool,
}

struct SpinCube {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    depth: DepthTarget,
    fov: f32,
    x_rotation: f32,
    y_rotation: f32,
    held: HeldKeys,
}

impl FrameDriver for SpinCube {
    fn create(gpu: &mut GpuHarness) -> Result<Self> {
        log::info!("Loading cube content...");

        let vertex_buffer = upload_through_copy_queue(
            gpu,
            "Cube Vertex Buffer",
            bytemuck::cast_slice(VERTICES),
            wgpu::BufferUsages::VERTEX,
        )?;
        let index_buffer = upload_through_copy_queue(
            gpu,
            "Cube Index Buffer",
            bytemuck::cast_slice(INDICES),
            wgpu::BufferUsages::INDEX,
        )?;

        let device = gpu.device();
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: mem::size_of::<SceneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cube Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cube Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let surface_format = gpu.surface().backend().format();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cube Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                // The cube is wound for a left-handed projection.
                front_face: wgpu::FrontFace::Cw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let (width, height) = gpu.surface().size();
        let depth = create_depth_target(device, width, height);

        log::info!("Cube content loaded.");
        Ok(Self {
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
            pipeline,
            depth,
            fov: 45.0,
            x_rotation: 0.0,
            y_rotation: 0.0,
            held: HeldKeys::default(),
        })
    }

    fn update(&mut self, dt: Duration) {
        let dt = dt.as_secs_f32();
        let x_direction = (self.held.w as i32 - self.held.s as i32) as f32;
        let y_direction = (self.held.a as i32 - self.held.d as i32) as f32;
        self.x_rotation += x_direction * ROTATION_SPEED * dt;
        self.y_rotation += y_direction * ROTATION_SPEED * dt;
    }

    fn render(&mut self, gpu: &mut GpuHarness) -> Result<()> {
        let (width, height) = gpu.surface().size();
        let aspect = width as f32 / height as f32;

        let model = Mat4::from_rotation_x(self.x_rotation) * Mat4::from_rotation_y(self.y_rotation);
        let view = Mat4::look_at_lh(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_lh(self.fov.to_radians(), aspect, NEAR_PLANE, FAR_PLANE);
        let uniform = SceneUniform {
            mvp: (projection * view * model).to_cols_array_2d(),
        };
        gpu.context()
            .queue()
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let (graphics, surface) = gpu.frame_parts();
        let list = graphics.acquire_list()?;
        {
            let back_buffer = surface.backend_mut().acquire()?;
            graphics.backend().with_encoder(list, |encoder| {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Cube Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: back_buffer,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });

                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..INDICES.len() as u32, 0, 0..1);
            })?;
        }

        let fence = graphics.execute(list)?;
        let index = surface.present(fence)?;
        // Block until the buffer that just became current is free again;
        // this is what bounds the frames in flight.
        graphics.wait_for_fence_value(surface.fence_for(index))?;

        Ok(())
    }

    fn handle_input(&mut self, gpu: &mut GpuHarness, event: &InputEvent) -> FrameControl {
        match event {
            InputEvent::KeyPressed { key_code, alt } => match key_code.as_str() {
                "Escape" => return FrameControl::Exit,
                "F11" => gpu.toggle_fullscreen(),
                "Enter" if *alt => gpu.toggle_fullscreen(),
                "KeyV" => gpu.toggle_vsync(),
                "KeyW" => self.held.w = true,
                "KeyS" => self.held.s = true,
                "KeyA" => self.held.a = true,
                "KeyD" => self.held.d = true,
                _ => {}
            },
            InputEvent::KeyReleased { key_code } => match key_code.as_str() {
                "KeyW" => self.held.w = false,
                "KeyS" => self.held.s = false,
                "KeyA" => self.held.a = false,
                "KeyD" => self.held.d = false,
                _ => {}
            },
            InputEvent::MouseWheelScrolled { delta_y, .. } => {
                self.fov = (self.fov - delta_y).clamp(MIN_FOV, MAX_FOV);
                log::debug!("Field of view: {:.1}", self.fov);
            }
            _ => {}
        }
        FrameControl::Continue
    }

    fn resized(&mut self, gpu: &mut GpuHarness, width: u32, height: u32) {
        // The old depth buffer may still be referenced by in-flight frames.
        if let Err(e) = gpu.flush_all() {
            log::error!("Flush before depth resize failed: {e}");
            return;
        }
        self.depth = create_depth_target(gpu.device(), width, height);
        log::info!("Depth buffer recreated at {width}x{height}");
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    Runtime::<SpinCube>::run(HarnessConfig {
        title: "Spincube".to_string(),
        ..HarnessConfig::default()
    })?;
    Ok(())
}
