use core::cell::RefCell;
use core::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::backend::{AttribPointer, BufferId, BufferTarget, GraphicsDevice, VertexArrayId};
use crate::bus::ids::{BatchSize, BATCH_SIZE_SET, GL_INITIALIZED, SYSTEM_SHUTTING_DOWN, VIEWPORT_SIZE_CHANGED};
use crate::bus::{NotificationBus, Subscription};
use crate::config::BatchConfig;
use crate::coords::Viewport;
use crate::error::Result;
use crate::items::{BatchItem, INDICES_PER_ITEM, VERTICES_PER_ITEM};
use crate::layout::VertexLayout;

use super::{BufferError, BufferState};

struct Core<I> {
    device: Rc<dyn GraphicsDevice>,
    layout: VertexLayout,
    floats_per_vertex: u32,
    state: BufferState,
    capacity: u32,
    viewport: Viewport,
    vao: VertexArrayId,
    vbo: BufferId,
    ibo: BufferId,
    _item: PhantomData<I>,
}

impl<I: BatchItem> Core<I> {
    fn ensure_initialized(&self) -> Result<(), BufferError> {
        match self.state {
            BufferState::Initialized => Ok(()),
            BufferState::Disposed => Err(BufferError::Disposed { kind: I::KIND }),
            state => Err(BufferError::NotInitialized { kind: I::KIND, state }),
        }
    }

    fn item_bytes(&self) -> u32 {
        VERTICES_PER_ITEM * self.layout.stride()
    }

    fn generate_data(&self) -> Vec<f32> {
        let len = self.capacity as usize * VERTICES_PER_ITEM as usize * self.floats_per_vertex as usize;
        vec![0.0; len]
    }

    fn generate_indices(&self) -> Vec<u32> {
        let mut indices = Vec::with_capacity((self.capacity * INDICES_PER_ITEM) as usize);
        for i in 0..self.capacity {
            let base = i * VERTICES_PER_ITEM;
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
        }
        indices
    }

    fn init(&mut self) -> Result<()> {
        if self.state != BufferState::Uninitialized {
            log::debug!("{} buffer: ignoring device init in state {}", I::KIND, self.state);
            return Ok(());
        }

        let name = I::KIND.name();
        self.vao = self.device.create_vertex_array(name);
        self.device.bind_vertex_array(self.vao);
        self.create_buffers();
        self.setup_vao()?;

        self.state = BufferState::Initialized;
        log::debug!(
            "{name} buffer initialized: capacity {}, stride {} bytes",
            self.capacity,
            self.layout.stride()
        );
        Ok(())
    }

    fn create_buffers(&mut self) {
        let name = I::KIND.name();
        self.vbo = self.device.create_buffer(BufferTarget::Vertex, name);
        self.ibo = self.device.create_buffer(BufferTarget::Index, name);
        self.device.attach_buffer(self.vao, self.vbo);
        self.device.attach_buffer(self.vao, self.ibo);
        self.device.buffer_data(self.vbo, bytemuck::cast_slice(&self.generate_data()));
        self.device.buffer_data(self.ibo, bytemuck::cast_slice(&self.generate_indices()));
    }

    fn setup_vao(&self) -> Result<()> {
        let stride = self.layout.stride();
        for (location, field) in self.layout.fields().iter().enumerate() {
            self.device.vertex_attrib(
                self.vao,
                AttribPointer {
                    location: location as u32,
                    components: field.element_count,
                    ty: self.layout.pointer_type(field)?,
                    stride,
                    offset: field.offset,
                },
            );
        }
        Ok(())
    }

    fn set_capacity(&mut self, capacity: u32) {
        if capacity == 0 {
            log::warn!("{} buffer: ignoring batch size 0", I::KIND);
            return;
        }
        if capacity == self.capacity {
            return;
        }
        self.capacity = capacity;

        if self.state == BufferState::Initialized {
            self.device.delete_buffer(self.vbo);
            self.device.delete_buffer(self.ibo);
            self.create_buffers();
            log::debug!("{} buffer resized to {capacity} items", I::KIND);
        }
    }

    fn dispose(&mut self) {
        match self.state {
            BufferState::Disposed => return,
            BufferState::Initialized => {
                self.device.delete_buffer(self.vbo);
                self.device.delete_buffer(self.ibo);
                self.device.delete_vertex_array(self.vao);
            }
            BufferState::Uninitialized => {}
        }
        self.vao = VertexArrayId::NULL;
        self.vbo = BufferId::NULL;
        self.ibo = BufferId::NULL;
        self.state = BufferState::Disposed;
        log::debug!("{} buffer disposed", I::KIND);
    }
}

/// GPU vertex/index storage for one item kind.
///
/// Construction only subscribes to the bus. Device objects are created when
/// `GL_INITIALIZED` is delivered, resized on `BATCH_SIZE_SET`, and released on
/// `SYSTEM_SHUTTING_DOWN`, on [`GpuBuffer::dispose`] or on drop.
///
/// The vertex buffer holds `capacity` quads; item `slot` occupies the byte
/// range `[slot * item_bytes, (slot + 1) * item_bytes)`.
pub struct GpuBuffer<I: BatchItem> {
    core: Rc<RefCell<Core<I>>>,
    subscriptions: Rc<RefCell<Vec<Subscription>>>,
}

impl<I: BatchItem> GpuBuffer<I> {
    pub fn new(device: Rc<dyn GraphicsDevice>, bus: &NotificationBus, config: BatchConfig) -> Result<Self> {
        let layout = VertexLayout::validate::<I::Vertex>()?;
        for field in layout.fields() {
            layout.pointer_type(field)?;
        }
        // Every field binds as float, so the stride is a whole number of floats.
        let floats_per_vertex = layout.stride() / 4;

        let core = Rc::new(RefCell::new(Core::<I> {
            device,
            layout,
            floats_per_vertex,
            state: BufferState::Uninitialized,
            capacity: config.batch_size,
            viewport: Viewport::default(),
            vao: VertexArrayId::NULL,
            vbo: BufferId::NULL,
            ibo: BufferId::NULL,
            _item: PhantomData,
        }));
        let subscriptions: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::with_capacity(4)));

        let name = format!("GpuBuffer<{}>", I::KIND);
        let weak = Rc::downgrade(&core);

        let w = Weak::clone(&weak);
        let init = bus.subscribe(GL_INITIALIZED, name.clone(), move |_| {
            if let Some(core) = w.upgrade() {
                core.borrow_mut().init()?;
            }
            Ok(())
        });

        let w = Weak::clone(&weak);
        let sub_name = name.clone();
        let resize = bus.subscribe(BATCH_SIZE_SET, name.clone(), move |n| {
            let BatchSize(size) = *n.data::<BatchSize>(&sub_name)?;
            if let Some(core) = w.upgrade() {
                core.borrow_mut().set_capacity(size);
            }
            Ok(())
        });

        let w = Weak::clone(&weak);
        let sub_name = name.clone();
        let viewport = bus.subscribe(VIEWPORT_SIZE_CHANGED, name.clone(), move |n| {
            let viewport = *n.data::<Viewport>(&sub_name)?;
            if let Some(core) = w.upgrade() {
                core.borrow_mut().viewport = viewport;
            }
            Ok(())
        });

        let w = weak;
        let subs = Rc::downgrade(&subscriptions);
        let shutdown = bus.subscribe(SYSTEM_SHUTTING_DOWN, name, move |_| {
            if let Some(core) = w.upgrade() {
                core.borrow_mut().dispose();
            }
            if let Some(subs) = subs.upgrade() {
                subs.borrow().iter().for_each(Subscription::dispose);
            }
            Ok(())
        });

        subscriptions.borrow_mut().extend([init, resize, viewport, shutdown]);

        Ok(Self { core, subscriptions })
    }

    #[inline]
    pub fn state(&self) -> BufferState {
        self.core.borrow().state
    }

    /// Items the buffer holds.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.core.borrow().capacity
    }

    /// Viewport used to convert item positions to clip space.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.core.borrow().viewport
    }

    pub fn layout(&self) -> VertexLayout {
        self.core.borrow().layout.clone()
    }

    /// Bytes one item occupies in the vertex buffer.
    pub fn item_bytes(&self) -> u32 {
        self.core.borrow().item_bytes()
    }

    pub fn vertex_array(&self) -> VertexArrayId {
        self.core.borrow().vao
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.core.borrow().vbo
    }

    pub fn index_buffer(&self) -> BufferId {
        self.core.borrow().ibo
    }

    /// Initial vertex data: every vertex of every slot zeroed.
    ///
    /// `capacity * 4 * floats_per_vertex` floats.
    pub fn generate_data(&self) -> Vec<f32> {
        self.core.borrow().generate_data()
    }

    /// Two triangles per quad: `0,1,2, 2,1,3`, offset by 4 per slot.
    pub fn generate_indices(&self) -> Vec<u32> {
        self.core.borrow().generate_indices()
    }

    /// Binds the buffer's vertex array ahead of uploads and draws.
    pub fn prepare_for_upload(&self) -> Result<()> {
        let core = self.core.borrow();
        core.ensure_initialized()?;
        core.device.bind_vertex_array(core.vao);
        Ok(())
    }

    /// Writes the vertices of `item` into `slot`, leaving every other slot untouched.
    pub fn upload_vertex_data(&self, item: &I, slot: u32) -> Result<()> {
        let core = self.core.borrow();
        core.ensure_initialized()?;
        if slot >= core.capacity {
            return Err(BufferError::SlotOutOfRange {
                kind: I::KIND,
                slot,
                capacity: core.capacity,
            }
            .into());
        }

        let vertices = item.vertices(core.viewport);
        let offset = slot as u64 * core.item_bytes() as u64;
        core.device.buffer_sub_data(core.vbo, offset, bytemuck::cast_slice(&vertices));
        Ok(())
    }

    /// Releases GPU handles and bus subscriptions. Repeat calls do nothing.
    pub fn dispose(&self) {
        self.core.borrow_mut().dispose();
        self.subscriptions.borrow().iter().for_each(Subscription::dispose);
    }
}

impl<I: BatchItem> Drop for GpuBuffer<I> {
    fn drop(&mut self) {
        self.dispose();
    }
}
