//! # Buffer State Module
//!
//! A registry of named GPU buffers. Buffers are created, written and looked up by a
//! static name, and every buffer tracks how much of it has actually been used.
//!
//! Growable buffers are recreated with double the needed size when a write would not fit,
//! which is how the instance buffer follows the block count of whatever image is loaded.

use std::collections::HashMap;

use wgpu::{util::DeviceExt, Buffer, Device, Queue};

use super::error::RenderError;

/// Memory bookkeeping for one buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BufferAnalytics {
    /// Total memory allocated for the buffer in bytes
    allocated_memory: u64,
    /// Highest byte written so far
    used_memory: u64,
    /// Number of writes, including the initial upload
    times_written: u64,
}

/// Central registry for the GPU buffers the renderer uses.
#[derive(Default)]
pub struct BufferState {
    buffers: HashMap<&'static str, Buffer>,
    buffer_analytics: HashMap<&'static str, BufferAnalytics>,
}

impl BufferState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer, replacing any buffer with the same name.
    pub fn create_buffer(
        &mut self,
        device: &Device,
        buffer_name: &'static str,
        buffer_descriptor: &wgpu::BufferDescriptor,
    ) {
        let buffer = device.create_buffer(buffer_descriptor);
        self.buffers.insert(buffer_name, buffer);
        self.buffer_analytics.insert(
            buffer_name,
            BufferAnalytics {
                allocated_memory: buffer_descriptor.size,
                ..Default::default()
            },
        );
    }

    /// Creates a buffer filled with `init_descriptor.contents`.
    pub fn create_buffer_init(
        &mut self,
        device: &Device,
        buffer_name: &'static str,
        init_descriptor: &wgpu::util::BufferInitDescriptor,
    ) {
        let size = init_descriptor.contents.len() as u64;
        let buffer = device.create_buffer_init(init_descriptor);
        self.buffers.insert(buffer_name, buffer);
        self.buffer_analytics.insert(
            buffer_name,
            BufferAnalytics {
                allocated_memory: size,
                used_memory: size,
                times_written: 1,
            },
        );
    }

    /// Writes raw bytes into an existing buffer.
    ///
    /// # Errors
    /// [`RenderError::MissingBuffer`] for an unknown name and
    /// [`RenderError::BufferOverflow`] when the data does not fit
    pub fn write_buffer(
        &mut self,
        queue: &Queue,
        buffer_name: &'static str,
        offset: wgpu::BufferAddress,
        data: &[u8],
    ) -> Result<(), RenderError> {
        let buffer = self
            .buffers
            .get(buffer_name)
            .ok_or(RenderError::MissingBuffer(buffer_name))?;
        let analytics = self
            .buffer_analytics
            .get_mut(buffer_name)
            .ok_or(RenderError::MissingBuffer(buffer_name))?;

        let data_size = data.len() as u64;
        if offset + data_size > analytics.allocated_memory {
            return Err(RenderError::BufferOverflow {
                name: buffer_name,
                offset,
                size: data_size,
                capacity: analytics.allocated_memory,
            });
        }

        queue.write_buffer(buffer, offset, data);
        analytics.used_memory = analytics.used_memory.max(offset + data_size);
        analytics.times_written += 1;
        Ok(())
    }

    /// Writes `data` from offset zero, first recreating the buffer if it is too small.
    ///
    /// A recreated buffer gets twice the requested size so a slowly growing payload does
    /// not reallocate every frame.
    pub fn write_or_grow(
        &mut self,
        device: &Device,
        queue: &Queue,
        buffer_name: &'static str,
        usage: wgpu::BufferUsages,
        data: &[u8],
    ) -> Result<(), RenderError> {
        let needed = data.len() as u64;
        if needed > self.capacity(buffer_name) {
            let size = (needed * 2).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
            log::debug!("Growing buffer '{}' to {} bytes", buffer_name, size);
            self.create_buffer(
                device,
                buffer_name,
                &wgpu::BufferDescriptor {
                    label: Some(buffer_name),
                    size,
                    usage: usage | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                },
            );
        }

        self.write_buffer(queue, buffer_name, 0, data)
    }

    /// Looks up a buffer by name.
    pub fn get_buffer(&self, buffer_name: &'static str) -> Result<&Buffer, RenderError> {
        self.buffers
            .get(buffer_name)
            .ok_or(RenderError::MissingBuffer(buffer_name))
    }

    /// Allocated size in bytes, zero for unknown buffers.
    pub fn capacity(&self, buffer_name: &'static str) -> u64 {
        self.buffer_analytics
            .get(buffer_name)
            .map_or(0, |analytics| analytics.allocated_memory)
    }

    /// Total allocated memory across all buffers in bytes.
    pub fn get_total_allocated_memory(&self) -> u64 {
        self.buffer_analytics
            .values()
            .map(|analytics| analytics.allocated_memory)
            .sum()
    }

    /// Total used memory across all buffers in bytes.
    pub fn get_total_used_memory(&self) -> u64 {
        self.buffer_analytics
            .values()
            .map(|analytics| analytics.used_memory)
            .sum()
    }
}
