//! GPU rendering context
//!
//! Owns the wgpu instance, adapter, device and queue for one projection
//! engine. Everything is created in [`GpuContext::new`]; if any step fails
//! nothing partially initialised escapes, and dropping the context releases
//! the device.
//!
//! Every state-changing GPU call made through [`GpuContext::checked`] runs
//! inside validation and out-of-memory error scopes. A reported error is
//! turned into [`ProjectionError::Gpu`] and is not retried.

use tracing::{debug, info, warn};

use crate::error::{ProjectionError, Result};

/// Headless GPU context (no surface, no window)
pub struct GpuContext {
    adapter_info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquire an adapter and create a device
    ///
    /// # Errors
    ///
    /// - [`ProjectionError::AdapterUnavailable`] if no adapter exists
    /// - [`ProjectionError::DeviceCreation`] if the adapter refuses a device
    pub fn new(low_power: bool) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let power_preference = if low_power {
            wgpu::PowerPreference::LowPower
        } else {
            wgpu::PowerPreference::HighPerformance
        };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(ProjectionError::AdapterUnavailable)?;

        let adapter_info = adapter.get_info();
        info!("GPU adapter: {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pano-projection"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                ..Default::default()
            },
            None,
        ))
        .map_err(|e| ProjectionError::DeviceCreation(e.to_string()))?;

        debug!("GPU device created, max texture size {}", device.limits().max_texture_dimension_2d);

        Ok(Self {
            adapter_info,
            device,
            queue,
        })
    }

    /// Logical device
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Submission queue
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Adapter description
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Largest texture edge the device accepts
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Run `f` and fail if the device reported an error while it ran
    pub fn checked<T>(&self, operation: &'static str, f: impl FnOnce(&wgpu::Device, &wgpu::Queue) -> T) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = f(&self.device, &self.queue);

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match validation.or(out_of_memory) {
            Some(error) => Err(ProjectionError::gpu(operation, error.to_string())),
            None => Ok(value),
        }
    }

    /// Block until all submitted GPU work has completed
    ///
    /// Returns whether the submission queue is empty afterwards.
    pub fn finish(&self) -> bool {
        let idle = self.device.poll(wgpu::Maintain::Wait).is_queue_empty();
        if !idle {
            warn!("GPU queue still holds submissions after waiting");
        }
        idle
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .finish()
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        debug!("Releasing GPU context on {}", self.adapter_info.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_drains_queue() {
        let gpu = match GpuContext::new(true) {
            Ok(gpu) => gpu,
            Err(e) => {
                eprintln!("Skipping GPU test: {}", e);
                return;
            }
        };

        let encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("empty") });
        gpu.queue().submit(std::iter::once(encoder.finish()));

        assert!(gpu.finish());
        assert!(gpu.finish());
    }
}
