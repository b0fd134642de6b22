//! GPU context management for buffer, scratch, and pipeline operations.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use bytemuck::Zeroable as _;
use wgpu::util::DeviceExt as _;

use super::allocator::Allocator;
use super::pipelines::PipelineCache;
use crate::{Buffer, Element, Error};

/// Fixed warp/subgroup size the planner and kernel template assume as the
/// base case for the shared-memory segment tree (see `engine::plan`).
pub(crate) const WARP_SIZE: u32 = 32;

/// Global pool of contexts keyed by adapter index, so repeated
/// [`Context::with_adapter_index`] calls for the same adapter share one
/// device/queue/pipeline-cache triple instead of creating a new one.
type ContextPool = OnceLock<Mutex<HashMap<usize, Arc<Inner>>>>;

static POOL: ContextPool = OnceLock::new();

struct Inner {
    adapter_index: Option<usize>,
    adapter_name: String,
    device: wgpu::Device,
    queue: wgpu::Queue,
    allocator: Allocator,
    pipelines: PipelineCache,
}

/// Central GPU context for buffer, scratch-memory, and kernel-pipeline
/// management.
///
/// Wraps a `wgpu::Device`/`Queue` pair, a pooled scratch [`Allocator`], and a
/// process-wide compute-pipeline cache keyed by the engine's kernel
/// signature hash. Contexts created from an adapter index are pooled:
/// requesting the same index twice returns a clone of the same underlying
/// resources.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Creates a context using a high-performance adapter, blocking on
    /// adapter/device negotiation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if no suitable adapter is found or device
    /// creation fails.
    pub fn new() -> Result<Self, Error> {
        pollster::block_on(Self::new_async())
    }

    /// Asynchronous counterpart of [`Context::new`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if no suitable adapter is found or device
    /// creation fails.
    pub async fn new_async() -> Result<Self, Error> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::Device(format!("no suitable GPU adapter found: {e}")))?;

        Self::with_adapter_async(&adapter).await
    }

    /// Alias for [`Context::new`], matching the naming some call sites in
    /// this crate's kernels and tests prefer.
    ///
    /// # Errors
    ///
    /// See [`Context::new`].
    pub fn try_default() -> Result<Self, Error> {
        Self::new()
    }

    /// Creates (or reuses a pooled) context for the adapter at `adapter_index`
    /// in `wgpu::Instance::enumerate_adapters`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if no adapter exists at the given index or
    /// device creation fails.
    pub fn with_adapter_index(adapter_index: usize) -> Result<Self, Error> {
        let pool = POOL.get_or_init(|| Mutex::new(HashMap::new()));
        let mut pool = pool.lock().map_err(|e| Error::Device(e.to_string()))?;

        if let Some(inner) = pool.get(&adapter_index) {
            return Ok(Self {
                inner: Arc::clone(inner),
            });
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapters: Vec<_> = instance.enumerate_adapters(wgpu::Backends::all());
        let adapter = adapters
            .into_iter()
            .nth(adapter_index)
            .ok_or_else(|| Error::Device(format!("no adapter at index {adapter_index}")))?;

        let ctx = pollster::block_on(Self::build(&adapter, Some(adapter_index)))?;
        pool.insert(adapter_index, Arc::clone(&ctx.inner));

        Ok(ctx)
    }

    /// Creates a context from an already-negotiated `wgpu::Adapter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if device creation fails.
    pub fn with_adapter(adapter: &wgpu::Adapter) -> Result<Self, Error> {
        pollster::block_on(Self::with_adapter_async(adapter))
    }

    /// Asynchronous counterpart of [`Context::with_adapter`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if device creation fails.
    pub async fn with_adapter_async(adapter: &wgpu::Adapter) -> Result<Self, Error> {
        Self::build(adapter, None).await
    }

    async fn build(adapter: &wgpu::Adapter, adapter_index: Option<usize>) -> Result<Self, Error> {
        let adapter_name = adapter.get_info().name;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .map_err(|e| Error::Device(format!("failed to create device: {e}")))?;

        let allocator = Allocator::new(device.clone());

        Ok(Self {
            inner: Arc::new(Inner {
                adapter_index,
                adapter_name,
                device,
                queue,
                allocator,
                pipelines: PipelineCache::default(),
            }),
        })
    }

    /// Creates an uninitialized GPU buffer with the given number of elements.
    ///
    /// The buffer is padded to a multiple of 4 elements for vec4 optimization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if buffer size overflows.
    pub fn create_buffer<T: Element>(&self, len: usize) -> Result<Buffer<T>, Error> {
        let padded_len = len
            .div_ceil(4)
            .checked_mul(4)
            .ok_or_else(|| Error::Device("buffer length overflow".into()))?;
        let size: u64 = padded_len
            .checked_mul(core::mem::size_of::<T::Native>())
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| Error::Device("buffer size overflow".into()))?;

        let buffer = self.inner.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Buffer::new(buffer, len))
    }

    /// Creates a GPU buffer initialized with data copied from a slice.
    ///
    /// The buffer is padded to a multiple of 4 elements with zeros.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if buffer length overflows.
    pub fn create_buffer_from_slice<T: Element>(&self, data: &[T]) -> Result<Buffer<T>, Error> {
        let padded_len = data
            .len()
            .div_ceil(4)
            .checked_mul(4)
            .ok_or_else(|| Error::Device("buffer length overflow".into()))?;
        let mut padded_data: Vec<T::Native> = data.iter().map(|v| v.to_native()).collect();
        padded_data.resize(padded_len, T::Native::zeroed());

        let buffer = self
            .inner
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: None,
                contents: bytemuck::cast_slice(&padded_data),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            });

        Ok(Buffer::new(buffer, data.len()))
    }

    /// Creates a uniform buffer holding a single `Pod` value, used to pass a
    /// reduction plan's launch arguments to a generated kernel.
    pub(crate) fn create_uniform_buffer<P: bytemuck::Pod>(&self, params: &P) -> wgpu::Buffer {
        self.inner
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("reduce_params"),
                contents: bytemuck::bytes_of(params),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
    }

    /// Allocates a scratch buffer of at least `size` bytes from the pooled
    /// [`Allocator`], for the inter-block partial-result buffer a large-`N`
    /// reduction needs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if `size` exceeds the device's maximum
    /// buffer size.
    pub(crate) fn allocate_scratch(&self, size: u64) -> Result<wgpu::Buffer, Error> {
        self.inner.allocator.allocate(size)
    }

    /// Returns a scratch buffer to the pool for reuse by a later launch.
    pub(crate) fn release_scratch(&self, buffer: wgpu::Buffer) {
        self.inner.allocator.release(buffer);
    }

    /// Copies buffer contents from GPU to CPU memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if the read operation fails.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn read_buffer<T: Element>(&self, buffer: &Buffer<T>) -> Result<Vec<T>, Error> {
        pollster::block_on(self.read_buffer_async(buffer))
    }

    /// Asynchronous counterpart of [`Context::read_buffer`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if the read operation fails.
    pub async fn read_buffer_async<T: Element>(&self, buffer: &Buffer<T>) -> Result<Vec<T>, Error> {
        if buffer.is_empty() {
            return Ok(Vec::new());
        }

        let size: u64 = buffer
            .len()
            .checked_mul(core::mem::size_of::<T::Native>())
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| Error::Device("buffer size overflow".into()))?;

        let staging = self.inner.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .inner
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        encoder.copy_buffer_to_buffer(buffer.inner(), 0, &staging, 0, size);
        self.inner.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = futures_channel_oneshot();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.poll()?;

        rx.recv()
            .map_err(|_| Error::Device("internal channel error".into()))?
            .map_err(|e| Error::Device(format!("buffer mapping failed: {e}")))?;

        let data = slice.get_mapped_range();
        let native: &[T::Native] = bytemuck::cast_slice(&data);
        let result: Vec<T> = native[..buffer.len()].iter().map(|&v| T::from_native(v)).collect();
        drop(data);
        staging.unmap();

        Ok(result)
    }

    /// Blocks until all previously submitted GPU work has completed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if polling the device fails.
    pub fn poll(&self) -> Result<(), Error> {
        self.inner
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| Error::Device(format!("device poll failed: {e}")))?;
        Ok(())
    }

    /// Returns the pooled adapter index this context was created from, if
    /// any (`None` for contexts built from an ad hoc `wgpu::Adapter`).
    pub(crate) fn adapter_index(&self) -> Option<usize> {
        self.inner.adapter_index
    }

    /// Returns the wgpu device.
    pub(crate) fn device(&self) -> &wgpu::Device {
        &self.inner.device
    }

    /// Returns the wgpu queue.
    pub(crate) fn queue(&self) -> &wgpu::Queue {
        &self.inner.queue
    }

    /// Returns the warp/subgroup size the intra-block reduction strategy is
    /// built around. Fixed at 32 — `wgpu` exposes no portable way to query
    /// the backend's native subgroup width across all compute backends.
    pub(crate) fn warp_size(&self) -> u32 {
        WARP_SIZE
    }

    /// Returns the largest workgroup size (`@workgroup_size` product) the
    /// device supports, per `wgpu::Limits`.
    pub(crate) fn max_block_size(&self) -> u32 {
        self.inner.device.limits().max_compute_invocations_per_workgroup
    }

    /// Gets or compiles the compute pipeline for kernel cache key `key`.
    ///
    /// On a cache miss, `source` is read from the on-disk source cache
    /// (`$GPUREDUCE_KERNEL_CACHE_DIR/<key>.wgsl`) if present, otherwise
    /// generated via `generate` and written there for subsequent process
    /// starts. Compiled pipelines themselves live only in the in-process
    /// cache: `wgpu` gives no portable way to serialize a compiled binary
    /// across backends.
    pub(crate) fn get_or_create_kernel_pipeline(
        &self,
        key: u64,
        label: &'static str,
        generate: impl FnOnce() -> String,
    ) -> Arc<wgpu::ComputePipeline> {
        self.inner.pipelines.create_compute_pipeline(
            &self.inner.device,
            key,
            || Self::resolve_source(key, generate),
            label,
        )
    }

    fn resolve_source(key: u64, generate: impl FnOnce() -> String) -> String {
        let Ok(dir) = std::env::var("GPUREDUCE_KERNEL_CACHE_DIR") else {
            return generate();
        };

        let path = std::path::Path::new(&dir).join(format!("{key:016x}.wgsl"));
        if let Ok(cached) = std::fs::read_to_string(&path) {
            return cached;
        }

        let source = generate();
        if std::fs::create_dir_all(&dir).is_ok() {
            let _ = std::fs::write(&path, &source);
        }
        source
    }
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
            .field("adapter_index", &self.inner.adapter_index)
            .field("adapter_name", &self.inner.adapter_name)
            .field("allocator", &self.inner.allocator)
            .field("pipelines", &self.inner.pipelines)
            .finish()
    }
}

/// Small `std::sync::mpsc`-backed stand-in for a oneshot channel, so
/// `read_buffer_async` doesn't need an extra async-channel dependency the
/// rest of this crate's stack doesn't otherwise use.
fn futures_channel_oneshot<T>() -> (
    std::sync::mpsc::Sender<T>,
    std::sync::mpsc::Receiver<T>,
) {
    std::sync::mpsc::channel()
}
