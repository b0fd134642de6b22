//! Compute pipeline cache.
//!
//! Pipelines are keyed by a `u64` (the engine's kernel cache key — an FNV-1a
//! hash of the kernel's static signature) rather than by `TypeId`, since a
//! single element type backs many distinct kernels (one per operator/rank
//! signature) and the reverse: several signatures can share an element type.

use alloc::string::String;
use alloc::sync::Arc;

use spin::RwLock;
use wgpu::naga::FastHashMap;

/// Thread-safe cache for compute pipelines keyed by kernel cache key.
#[derive(Default)]
pub(crate) struct PipelineCache {
    cache: RwLock<FastHashMap<u64, Arc<wgpu::ComputePipeline>>>,
}

impl PipelineCache {
    /// Gets or creates a cached compute pipeline.
    ///
    /// `shader` is only invoked on a cache miss.
    pub(crate) fn create_compute_pipeline(
        &self,
        device: &wgpu::Device,
        key: u64,
        shader: impl FnOnce() -> String,
        label: &'static str,
    ) -> Arc<wgpu::ComputePipeline> {
        if let Some(pipeline) = self.cache.read().get(&key) {
            return Arc::clone(pipeline);
        }

        let mut cache = self.cache.write();

        if let Some(pipeline) = cache.get(&key) {
            return Arc::clone(pipeline);
        }

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader().into()),
        });

        let pipeline = Arc::new(
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: None,
                module: &shader_module,
                entry_point: Some("main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            }),
        );

        cache.insert(key, Arc::clone(&pipeline));

        pipeline
    }

    /// Returns the number of cached compute pipelines.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Returns `true` if cache is empty.
    #[must_use]
    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for PipelineCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PipelineCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
