//! 上传堆缓冲区
//!
//! 三角形课程的所有缓冲区都放在 `D3D12_HEAP_TYPE_UPLOAD` 上，CPU 直接写入，
//! GPU 直接读取，不经过拷贝队列。常量缓冲区保持持久映射。

use bytemuck::Pod;
use tracing::debug;
use windows::core::HSTRING;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use crate::core::error::{GraphicsError, NativeResultExt, Result};
use crate::renderer::resource::{BufferDescriptor, BufferUsage};

pub struct UploadBuffer {
    pub resource: ID3D12Resource,
    pub desc: BufferDescriptor,
    /// 持久映射的 CPU 地址（仅常量缓冲区）
    mapped: Option<*mut u8>,
}

impl UploadBuffer {
    /// 创建缓冲区并写入初始数据
    ///
    /// 顶点和索引缓冲区写完立即 Unmap；常量缓冲区保持映射直到销毁。
    pub fn new<T: Pod>(device: &ID3D12Device2, desc: BufferDescriptor, data: &[T]) -> Result<Self> {
        let size = desc.aligned_size();
        if size == 0 {
            return Err(GraphicsError::ResourceCreation(format!("{}: buffer is empty", desc.name)).into());
        }

        let heap_props = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_UPLOAD,
            ..Default::default()
        };
        let resource_desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
            Width: size,
            Height: 1,
            DepthOrArraySize: 1,
            MipLevels: 1,
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
            ..Default::default()
        };

        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            device
                .CreateCommittedResource(
                    &heap_props,
                    D3D12_HEAP_FLAG_NONE,
                    &resource_desc,
                    D3D12_RESOURCE_STATE_GENERIC_READ,
                    None,
                    &mut resource,
                )
                .native("CreateCommittedResource()")?;
        }
        let resource = resource.ok_or_else(|| {
            GraphicsError::ResourceCreation(format!("{}: CreateCommittedResource() returned nothing", desc.name))
        })?;
        unsafe { resource.SetName(&HSTRING::from(desc.name)) }.ok();

        let mut buffer = Self {
            resource,
            desc,
            mapped: None,
        };

        // CPU 不读取，读范围为空
        let read_range = D3D12_RANGE { Begin: 0, End: 0 };
        let mut ptr = std::ptr::null_mut();
        unsafe {
            buffer
                .resource
                .Map(0, Some(&read_range), Some(&mut ptr))
                .native("Map()")?;
        }
        let ptr = ptr as *mut u8;
        buffer.mapped = Some(ptr);
        buffer.write(data)?;

        if buffer.desc.usage != BufferUsage::Constant {
            unsafe { buffer.resource.Unmap(0, None) };
            buffer.mapped = None;
        }

        debug!(
            name = buffer.desc.name,
            usage = ?buffer.desc.usage,
            size,
            "Upload buffer created"
        );
        Ok(buffer)
    }

    /// 写入数据（缓冲区必须处于映射状态）
    pub fn write<T: Pod>(&mut self, data: &[T]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let ptr = self.mapped.ok_or_else(|| {
            GraphicsError::ResourceCreation(format!("{}: buffer is not mapped", self.desc.name))
        })?;
        if bytes.len() as u64 > self.desc.aligned_size() {
            return Err(GraphicsError::ResourceCreation(format!(
                "{}: write of {} bytes exceeds buffer size {}",
                self.desc.name,
                bytes.len(),
                self.desc.aligned_size()
            ))
            .into());
        }

        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len()) };
        Ok(())
    }

    pub fn gpu_address(&self) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() }
    }

    pub fn vertex_view(&self) -> D3D12_VERTEX_BUFFER_VIEW {
        D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: self.gpu_address(),
            SizeInBytes: self.desc.size as u32,
            StrideInBytes: self.desc.stride,
        }
    }

    /// 索引视图，步长 2 为 16 位索引，否则为 32 位
    pub fn index_view(&self) -> D3D12_INDEX_BUFFER_VIEW {
        D3D12_INDEX_BUFFER_VIEW {
            BufferLocation: self.gpu_address(),
            SizeInBytes: self.desc.size as u32,
            Format: if self.desc.stride == 2 {
                DXGI_FORMAT_R16_UINT
            } else {
                DXGI_FORMAT_R32_UINT
            },
        }
    }
}

impl Drop for UploadBuffer {
    fn drop(&mut self) {
        if self.mapped.take().is_some() {
            unsafe { self.resource.Unmap(0, None) };
        }
    }
}
