use core::cell::RefCell;
use std::collections::HashMap;

use state::InitCell;
use wgpu::util::DeviceExt;

use crate::items::TextureRef;

use super::{rgba8_len, AttribPointer, BufferId, BufferTarget, GraphicsDevice, ProgramId, TextureId, VertexArrayId};

struct Handles {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    texture_bgl: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    /// Bound when no texture is, so every pipeline shares one layout.
    blank: wgpu::BindGroup,
}

struct Buffer {
    target: BufferTarget,
    label: String,
    gpu: Option<wgpu::Buffer>,
}

#[derive(Default)]
struct VertexArray {
    attribs: Vec<AttribPointer>,
    vertex: BufferId,
    index: BufferId,
}

struct Program {
    label: String,
    source: &'static str,
    module: Option<wgpu::ShaderModule>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    buffers: HashMap<BufferId, Buffer>,
    vaos: HashMap<VertexArrayId, VertexArray>,
    programs: HashMap<ProgramId, Program>,
    textures: HashMap<TextureId, wgpu::BindGroup>,
    pipelines: HashMap<(ProgramId, VertexArrayId), wgpu::RenderPipeline>,

    bound_vao: VertexArrayId,
    program: ProgramId,
    texture: TextureId,

    /// Color target of the frame in progress.
    target: Option<wgpu::TextureView>,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// [`GraphicsDevice`] backed by wgpu.
///
/// Created empty so buffers can subscribe before the GPU exists; the runtime
/// calls [`WgpuDevice::attach`] once adapter and device are up.
///
/// Every `draw_indexed` records and submits its own render pass (load, no
/// clear). Queue writes are staged before the next submit, so submitting per
/// draw keeps a buffer rewritten mid-frame from clobbering earlier draws.
#[derive(Default)]
pub struct WgpuDevice {
    gpu: InitCell<Handles>,
    state: RefCell<State>,
}

impl WgpuDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds this device to a wgpu device. Returns `false` if already attached.
    pub fn attach(&self, device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> bool {
        if self.gpu.try_get().is_some() {
            return false;
        }

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kestrel texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kestrel pipeline layout"),
            bind_group_layouts: &[&texture_bgl],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("kestrel sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let blank_view = upload_rgba8(&device, &queue, "kestrel blank texture", 1, 1, &[255; 4]);
        let blank = texture_bind_group(&device, &texture_bgl, &sampler, &blank_view);

        let attached = self.gpu.set(Handles {
            device,
            queue,
            format,
            texture_bgl,
            pipeline_layout,
            sampler,
            blank,
        });

        log::info!("wgpu device attached (format: {format:?})");
        attached
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.gpu.try_get().is_some()
    }

    /// Directs subsequent draws to `view` until [`WgpuDevice::end_frame`].
    pub fn begin_frame(&self, view: wgpu::TextureView) {
        self.state.borrow_mut().target = Some(view);
    }

    pub fn end_frame(&self) {
        self.state.borrow_mut().target = None;
    }

    fn pipeline(&self, gpu: &Handles, s: &mut State, program: ProgramId, vao: VertexArrayId) -> Option<wgpu::RenderPipeline> {
        if let Some(p) = s.pipelines.get(&(program, vao)) {
            return Some(p.clone());
        }

        let attribs = s.vaos.get(&vao)?.attribs.clone();
        let Some(stride) = attribs.first().map(|a| a.stride) else {
            log::warn!("wgpu: {vao:?} has no attributes");
            return None;
        };
        let attributes: Vec<wgpu::VertexAttribute> = attribs
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: vertex_format(a.components),
                offset: a.offset as u64,
                shader_location: a.location,
            })
            .collect();

        let prog = s.programs.get_mut(&program)?;
        let module = prog
            .module
            .get_or_insert_with(|| {
                gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&prog.label),
                    source: wgpu::ShaderSource::Wgsl(prog.source.into()),
                })
            })
            .clone();

        let pipeline = gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&prog.label),
            layout: Some(&gpu.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: stride as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("wgpu: built pipeline for {} on {vao:?}", prog.label);
        s.pipelines.insert((program, vao), pipeline.clone());
        Some(pipeline)
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_vertex_array(&self, _label: &str) -> VertexArrayId {
        let mut s = self.state.borrow_mut();
        let id = VertexArrayId::from_raw(s.next());
        s.vaos.insert(id, VertexArray::default());
        id
    }

    fn create_buffer(&self, target: BufferTarget, label: &str) -> BufferId {
        let mut s = self.state.borrow_mut();
        let id = BufferId::from_raw(s.next());
        s.buffers.insert(
            id,
            Buffer {
                target,
                label: label.to_string(),
                gpu: None,
            },
        );
        id
    }

    fn attach_buffer(&self, vao: VertexArrayId, buffer: BufferId) {
        let mut s = self.state.borrow_mut();
        let Some(target) = s.buffers.get(&buffer).map(|b| b.target) else { return };
        if let Some(v) = s.vaos.get_mut(&vao) {
            match target {
                BufferTarget::Vertex => v.vertex = buffer,
                BufferTarget::Index => v.index = buffer,
            }
        }
    }

    fn buffer_data(&self, buffer: BufferId, data: &[u8]) {
        let Some(gpu) = self.gpu.try_get() else {
            log::error!("wgpu: buffer_data on {buffer:?} before the device was attached");
            return;
        };
        let mut s = self.state.borrow_mut();
        let Some(b) = s.buffers.get_mut(&buffer) else { return };

        let usage = match b.target {
            BufferTarget::Vertex => wgpu::BufferUsages::VERTEX,
            BufferTarget::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;

        b.gpu = Some(gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&b.label),
            contents: data,
            usage,
        }));
    }

    fn buffer_sub_data(&self, buffer: BufferId, offset: u64, data: &[u8]) {
        let Some(gpu) = self.gpu.try_get() else { return };
        let s = self.state.borrow();
        let Some(buf) = s.buffers.get(&buffer).and_then(|b| b.gpu.as_ref()) else { return };

        if offset + data.len() as u64 > buf.size() {
            log::warn!("wgpu: write of {} bytes at {offset} overruns {buffer:?}", data.len());
            return;
        }
        gpu.queue.write_buffer(buf, offset, data);
    }

    fn vertex_attrib(&self, vao: VertexArrayId, attrib: AttribPointer) {
        let mut s = self.state.borrow_mut();
        if let Some(v) = s.vaos.get_mut(&vao) {
            v.attribs.push(attrib);
        }
        s.pipelines.retain(|(_, v), _| *v != vao);
    }

    fn bind_vertex_array(&self, vao: VertexArrayId) {
        self.state.borrow_mut().bound_vao = vao;
    }

    fn create_program(&self, label: &str, source: &'static str) -> ProgramId {
        let mut s = self.state.borrow_mut();
        let id = ProgramId::from_raw(s.next());
        s.programs.insert(
            id,
            Program {
                label: label.to_string(),
                source,
                module: None,
            },
        );
        id
    }

    fn use_program(&self, program: ProgramId) {
        self.state.borrow_mut().program = program;
    }

    fn create_texture_rgba8(&self, label: &str, width: u32, height: u32, pixels: &[u8]) -> TextureRef {
        let Some(gpu) = self.gpu.try_get() else {
            log::error!("wgpu: texture '{label}' created before the device was attached");
            return TextureRef::default();
        };
        if width == 0 || height == 0 || rgba8_len(width, height) != Some(pixels.len()) {
            log::error!("wgpu: texture '{label}' has {} bytes for {width}x{height}", pixels.len());
            return TextureRef::default();
        }

        let view = upload_rgba8(&gpu.device, &gpu.queue, label, width, height, pixels);
        let bind_group = texture_bind_group(&gpu.device, &gpu.texture_bgl, &gpu.sampler, &view);

        let mut s = self.state.borrow_mut();
        let id = TextureId::from_raw(s.next());
        s.textures.insert(id, bind_group);
        TextureRef::new(id, width, height)
    }

    fn bind_texture(&self, texture: TextureId) {
        self.state.borrow_mut().texture = texture;
    }

    fn draw_indexed(&self, first_index: u32, index_count: u32) {
        let Some(gpu) = self.gpu.try_get() else { return };
        let mut s = self.state.borrow_mut();

        let Some(view) = s.target.clone() else {
            log::warn!("wgpu: draw outside of a frame ignored");
            return;
        };

        let (vao, program) = (s.bound_vao, s.program);
        let Some((vertex, index)) = s.vaos.get(&vao).map(|v| (v.vertex, v.index)) else {
            log::warn!("wgpu: draw with no vertex array bound");
            return;
        };
        let vb = s.buffers.get(&vertex).and_then(|b| b.gpu.clone());
        let ib = s.buffers.get(&index).and_then(|b| b.gpu.clone());
        let (Some(vb), Some(ib)) = (vb, ib) else {
            log::warn!("wgpu: {vao:?} has no uploaded vertex/index buffers");
            return;
        };

        let Some(pipeline) = self.pipeline(gpu, &mut s, program, vao) else { return };
        let bind_group = s.textures.get(&s.texture).unwrap_or(&gpu.blank).clone();
        let group = batch_group_label(s.programs.get(&program).map_or("", |p| p.label.as_str()));
        drop(s);

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kestrel draw encoder"),
        });
        encoder.push_debug_group(&group);
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kestrel batch pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            rpass.set_vertex_buffer(0, vb.slice(..));
            rpass.set_index_buffer(ib.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(first_index..first_index + index_count, 0, 0..1);
        }
        encoder.pop_debug_group();
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    fn delete_buffer(&self, buffer: BufferId) {
        self.state.borrow_mut().buffers.remove(&buffer);
    }

    fn delete_vertex_array(&self, vao: VertexArrayId) {
        let mut s = self.state.borrow_mut();
        s.vaos.remove(&vao);
        s.pipelines.retain(|(_, v), _| *v != vao);
    }
}

/// Debug group name for one batch pass, e.g. `kestrel rect shader` -> `kestrel rect batch`.
fn batch_group_label(program_label: &str) -> String {
    match program_label.strip_suffix(" shader") {
        Some(kind) => format!("{kind} batch"),
        None if program_label.is_empty() => "kestrel batch".to_string(),
        None => format!("{program_label} batch"),
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

fn upload_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("kestrel texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_device_still_hands_out_handles() {
        let dev = WgpuDevice::new();
        assert!(!dev.is_attached());

        let vao = dev.create_vertex_array("v");
        let buf = dev.create_buffer(BufferTarget::Vertex, "b");
        assert!(!vao.is_null() && !buf.is_null());
        assert_ne!(vao.raw(), buf.raw());

        // No GPU yet: these are logged and ignored.
        dev.buffer_data(buf, &[0; 16]);
        dev.draw_indexed(0, 6);
        assert!(dev.create_texture_rgba8("t", 1, 1, &[0; 4]).id.is_null());
    }

    #[test]
    fn vertex_formats_by_component_count() {
        assert_eq!(vertex_format(1), wgpu::VertexFormat::Float32);
        assert_eq!(vertex_format(4), wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn batch_passes_are_grouped_by_item_kind() {
        for kind in crate::items::ItemKind::ALL {
            assert_eq!(batch_group_label(&format!("kestrel {kind} shader")), format!("kestrel {kind} batch"));
        }
        assert_eq!(batch_group_label(""), "kestrel batch");
        assert_eq!(batch_group_label("overlay"), "overlay batch");
    }
}
