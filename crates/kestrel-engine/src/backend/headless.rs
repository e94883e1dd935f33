use core::cell::RefCell;
use std::collections::HashMap;

use crate::items::TextureRef;

use super::{rgba8_len, AttribPointer, BufferId, BufferTarget, GraphicsDevice, ProgramId, TextureId, VertexArrayId};

/// A recorded `draw_indexed` call with the state bound at the time.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub vao: VertexArrayId,
    pub program: ProgramId,
    pub texture: TextureId,
    pub first_index: u32,
    pub index_count: u32,
}

#[derive(Debug)]
struct Buffer {
    target: BufferTarget,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct VertexArray {
    attribs: Vec<AttribPointer>,
    vertex: BufferId,
    index: BufferId,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    buffers: HashMap<BufferId, Buffer>,
    vaos: HashMap<VertexArrayId, VertexArray>,
    programs: HashMap<ProgramId, String>,
    textures: HashMap<TextureId, (u32, u32)>,

    bound_vao: VertexArrayId,
    program: ProgramId,
    texture: TextureId,

    draws: Vec<DrawCall>,
    deleted_buffers: Vec<BufferId>,
    deleted_vaos: Vec<VertexArrayId>,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory device that records every call.
///
/// Buffer stores are plain byte vectors, so tests can read back exactly what
/// a buffer uploaded and where.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    state: RefCell<State>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of a live buffer.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).map(|b| b.data.clone())
    }

    pub fn buffer_target(&self, buffer: BufferId) -> Option<BufferTarget> {
        self.state.borrow().buffers.get(&buffer).map(|b| b.target)
    }

    /// Attribute pointers declared on `vao`, in declaration order.
    pub fn attribs(&self, vao: VertexArrayId) -> Vec<AttribPointer> {
        self.state
            .borrow()
            .vaos
            .get(&vao)
            .map(|v| v.attribs.clone())
            .unwrap_or_default()
    }

    /// `(vertex, index)` buffers attached to `vao`.
    pub fn attached(&self, vao: VertexArrayId) -> Option<(BufferId, BufferId)> {
        self.state.borrow().vaos.get(&vao).map(|v| (v.vertex, v.index))
    }

    pub fn program_label(&self, program: ProgramId) -> Option<String> {
        self.state.borrow().programs.get(&program).cloned()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn clear_draws(&self) {
        self.state.borrow_mut().draws.clear();
    }

    /// Every buffer deletion, including repeats.
    pub fn deleted_buffers(&self) -> Vec<BufferId> {
        self.state.borrow().deleted_buffers.clone()
    }

    pub fn deleted_vertex_arrays(&self) -> Vec<VertexArrayId> {
        self.state.borrow().deleted_vaos.clone()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_array_count(&self) -> usize {
        self.state.borrow().vaos.len()
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_vertex_array(&self, _label: &str) -> VertexArrayId {
        let mut s = self.state.borrow_mut();
        let id = VertexArrayId::from_raw(s.next());
        s.vaos.insert(id, VertexArray::default());
        id
    }

    fn create_buffer(&self, target: BufferTarget, _label: &str) -> BufferId {
        let mut s = self.state.borrow_mut();
        let id = BufferId::from_raw(s.next());
        s.buffers.insert(id, Buffer { target, data: Vec::new() });
        id
    }

    fn attach_buffer(&self, vao: VertexArrayId, buffer: BufferId) {
        let mut s = self.state.borrow_mut();
        let Some(target) = s.buffers.get(&buffer).map(|b| b.target) else {
            log::warn!("headless: attach of unknown {buffer:?}");
            return;
        };
        let Some(v) = s.vaos.get_mut(&vao) else {
            log::warn!("headless: attach to unknown {vao:?}");
            return;
        };
        match target {
            BufferTarget::Vertex => v.vertex = buffer,
            BufferTarget::Index => v.index = buffer,
        }
    }

    fn buffer_data(&self, buffer: BufferId, data: &[u8]) {
        if let Some(b) = self.state.borrow_mut().buffers.get_mut(&buffer) {
            b.data = data.to_vec();
        }
    }

    fn buffer_sub_data(&self, buffer: BufferId, offset: u64, data: &[u8]) {
        let mut s = self.state.borrow_mut();
        let Some(b) = s.buffers.get_mut(&buffer) else { return };

        let start = offset as usize;
        let end = start + data.len();
        if end > b.data.len() {
            log::warn!("headless: write of {} bytes at {offset} overruns {buffer:?}", data.len());
            return;
        }
        b.data[start..end].copy_from_slice(data);
    }

    fn vertex_attrib(&self, vao: VertexArrayId, attrib: AttribPointer) {
        if let Some(v) = self.state.borrow_mut().vaos.get_mut(&vao) {
            v.attribs.push(attrib);
        }
    }

    fn bind_vertex_array(&self, vao: VertexArrayId) {
        self.state.borrow_mut().bound_vao = vao;
    }

    fn create_program(&self, label: &str, _source: &'static str) -> ProgramId {
        let mut s = self.state.borrow_mut();
        let id = ProgramId::from_raw(s.next());
        s.programs.insert(id, label.to_string());
        id
    }

    fn use_program(&self, program: ProgramId) {
        self.state.borrow_mut().program = program;
    }

    fn create_texture_rgba8(&self, _label: &str, width: u32, height: u32, pixels: &[u8]) -> TextureRef {
        if rgba8_len(width, height) != Some(pixels.len()) {
            log::error!("headless: {width}x{height} texture got {} bytes", pixels.len());
            return TextureRef::default();
        }
        let mut s = self.state.borrow_mut();
        let id = TextureId::from_raw(s.next());
        s.textures.insert(id, (width, height));
        TextureRef::new(id, width, height)
    }

    fn bind_texture(&self, texture: TextureId) {
        self.state.borrow_mut().texture = texture;
    }

    fn draw_indexed(&self, first_index: u32, index_count: u32) {
        let mut s = self.state.borrow_mut();
        let call = DrawCall {
            vao: s.bound_vao,
            program: s.program,
            texture: s.texture,
            first_index,
            index_count,
        };
        s.draws.push(call);
    }

    fn delete_buffer(&self, buffer: BufferId) {
        let mut s = self.state.borrow_mut();
        s.buffers.remove(&buffer);
        s.deleted_buffers.push(buffer);
    }

    fn delete_vertex_array(&self, vao: VertexArrayId) {
        let mut s = self.state.borrow_mut();
        s.vaos.remove(&vao);
        if s.bound_vao == vao {
            s.bound_vao = VertexArrayId::NULL;
        }
        s.deleted_vaos.push(vao);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::AttribType;

    #[test]
    fn sub_data_writes_in_place_and_rejects_overruns() {
        let dev = HeadlessDevice::new();
        let buf = dev.create_buffer(BufferTarget::Vertex, "t");
        dev.buffer_data(buf, &[0; 8]);

        dev.buffer_sub_data(buf, 4, &[1, 2, 3, 4]);
        assert_eq!(dev.buffer_contents(buf).unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 4]);

        dev.buffer_sub_data(buf, 6, &[9, 9, 9, 9]);
        assert_eq!(dev.buffer_contents(buf).unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn draws_capture_bound_state() {
        let dev = HeadlessDevice::new();
        let vao = dev.create_vertex_array("v");
        let prog = dev.create_program("p", "");
        let tex = dev.create_texture_rgba8("t", 1, 1, &[255; 4]);

        dev.bind_vertex_array(vao);
        dev.use_program(prog);
        dev.bind_texture(tex.id);
        dev.draw_indexed(6, 12);

        assert_eq!(
            dev.draws(),
            vec![DrawCall {
                vao,
                program: prog,
                texture: tex.id,
                first_index: 6,
                index_count: 12
            }]
        );
    }

    #[test]
    fn attach_routes_by_target() {
        let dev = HeadlessDevice::new();
        let vao = dev.create_vertex_array("v");
        let vb = dev.create_buffer(BufferTarget::Vertex, "vb");
        let ib = dev.create_buffer(BufferTarget::Index, "ib");
        dev.attach_buffer(vao, ib);
        dev.attach_buffer(vao, vb);
        dev.vertex_attrib(
            vao,
            AttribPointer { location: 0, components: 2, ty: AttribType::Float, stride: 8, offset: 0 },
        );

        assert_eq!(dev.attached(vao), Some((vb, ib)));
        assert_eq!(dev.attribs(vao).len(), 1);
    }

    #[test]
    fn texture_size_mismatch_yields_null() {
        let dev = HeadlessDevice::new();
        assert!(dev.create_texture_rgba8("bad", 2, 2, &[0; 4]).id.is_null());
    }

    #[test]
    fn oversized_texture_dimensions_yield_null() {
        let dev = HeadlessDevice::new();
        assert!(dev.create_texture_rgba8("huge", u32::MAX, u32::MAX, &[0; 16]).id.is_null());
        // 0x4000_0000 * 4 * 4 wraps to 0 in u32.
        assert!(dev.create_texture_rgba8("wraps", 0x4000_0000, 4, &[]).id.is_null());
        assert!(!dev.create_texture_rgba8("ok", 2, 2, &[0; 16]).id.is_null());
    }
}
