//! DirectX 12 课程阶段
//!
//! - `DeviceStage`: 只完成设备初始化，主循环中什么都不画
//! - `TriangleRenderer`: 完整的三角形渲染

use std::mem::ManuallyDrop;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};
use windows::Win32::Foundation::RECT;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use winit::window::Window;

use super::buffer::UploadBuffer;
use super::pipeline;
use super::{Dx12Context, Dx12Device};
use crate::core::error::{NativeResultExt, Result};
use crate::core::Config;
use crate::renderer::resource::{BufferDescriptor, BufferUsage, SceneConstants};
use crate::renderer::shaders::ShaderSet;
use crate::renderer::stage::RenderStage;
use crate::renderer::vertex::{TRIANGLE_INDICES, TRIANGLE_VERTICES};

/// 顶点颜色的色调（白色，不改变颜色）
const TINT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// 设备阶段：调试层、工厂、适配器和设备
pub struct DeviceStage {
    device: Dx12Device,
    window: Arc<Window>,
}

impl DeviceStage {
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let device = Dx12Device::new(&window, config)?;
        Ok(Self { device, window })
    }
}

impl RenderStage for DeviceStage {
    fn name(&self) -> &'static str {
        "HelloDevice"
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn resize(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, _delta_time: f32) {}

    fn render(&mut self) -> Result<()> {
        trace!(adapter = %self.device.adapter_info.description, "Device stage has nothing to draw");
        Ok(())
    }
}

/// 三角形渲染器
///
/// 字段顺序即销毁顺序：先释放缓冲区和管线，再释放上下文（会等待 GPU 空闲），
/// 然后是设备，最后是窗口。
pub struct TriangleRenderer {
    vertex_buffer: UploadBuffer,
    index_buffer: UploadBuffer,
    constant_buffer: UploadBuffer,
    command_list: ID3D12GraphicsCommandList,
    command_allocator: ID3D12CommandAllocator,
    pipeline_state: ID3D12PipelineState,
    root_signature: ID3D12RootSignature,
    context: Dx12Context,
    device: Dx12Device,
    window: Arc<Window>,

    viewport: D3D12_VIEWPORT,
    scissor_rect: RECT,
    clear_color: [f32; 4],
    vsync: bool,
    rotation_speed: f32,
    elapsed: f32,
}

impl TriangleRenderer {
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let device = Dx12Device::new(&window, config)?;

        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let context = Dx12Context::new(&device, width, height)?;
        let d3d = &device.device;

        let root_signature = pipeline::create_root_signature(d3d)?;
        let shaders = ShaderSet::load(&config.shaders, pipeline::compile_hlsl)?;
        let pipeline_state = pipeline::create_pipeline_state(d3d, &root_signature, &shaders)?;
        info!("Pipeline state created");

        let (command_allocator, command_list) = unsafe {
            let allocator: ID3D12CommandAllocator = d3d
                .CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
                .native("CreateCommandAllocator()")?;
            let list: ID3D12GraphicsCommandList = d3d
                .CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &allocator, &pipeline_state)
                .native("CreateCommandList()")?;
            // 命令列表创建后处于录制状态，先关闭，每帧再 Reset
            list.Close().native("Close()")?;
            (allocator, list)
        };
        debug!("Command allocator and list created");

        let vertex_buffer = UploadBuffer::new(
            d3d,
            BufferDescriptor::for_slice(&TRIANGLE_VERTICES, BufferUsage::Vertex, "Triangle Vertices"),
            &TRIANGLE_VERTICES,
        )?;
        let index_buffer = UploadBuffer::new(
            d3d,
            BufferDescriptor::for_slice(&TRIANGLE_INDICES, BufferUsage::Index, "Triangle Indices"),
            &TRIANGLE_INDICES,
        )?;
        let constants = [SceneConstants::new(width, height, 0.0, TINT)];
        let constant_buffer = UploadBuffer::new(
            d3d,
            BufferDescriptor::for_slice(&constants, BufferUsage::Constant, "Scene Constants"),
            &constants,
        )?;
        info!(
            vertices = vertex_buffer.desc.element_count(),
            indices = index_buffer.desc.element_count(),
            "Triangle buffers uploaded"
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            constant_buffer,
            command_list,
            command_allocator,
            pipeline_state,
            root_signature,
            context,
            device,
            window,
            viewport: viewport(width, height),
            scissor_rect: scissor_rect(width, height),
            clear_color: config.graphics.clear_color,
            vsync: config.graphics.vsync,
            rotation_speed: config.graphics.rotation_speed,
            elapsed: 0.0,
        })
    }

    fn record_commands(&self) -> Result<()> {
        let target = self.context.current_render_target();
        let rtv = self.context.current_rtv();
        let list = &self.command_list;

        unsafe {
            self.command_allocator
                .Reset()
                .native("ID3D12CommandAllocator::Reset()")?;
            list.Reset(&self.command_allocator, &self.pipeline_state)
                .native("ID3D12GraphicsCommandList::Reset()")?;

            list.SetGraphicsRootSignature(&self.root_signature);
            list.SetGraphicsRootConstantBufferView(0, self.constant_buffer.gpu_address());
            list.RSSetViewports(&[self.viewport]);
            list.RSSetScissorRects(&[self.scissor_rect]);

            list.ResourceBarrier(&[transition_barrier(
                target,
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
            )]);

            list.ClearRenderTargetView(rtv, &self.clear_color, None);
            list.OMSetRenderTargets(1, Some(&rtv), false, None);
            list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            list.IASetVertexBuffers(0, Some(&[self.vertex_buffer.vertex_view()]));
            list.IASetIndexBuffer(Some(&self.index_buffer.index_view()));
            list.DrawIndexedInstanced(self.index_buffer.desc.element_count(), 1, 0, 0, 0);

            list.ResourceBarrier(&[transition_barrier(
                target,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_STATE_PRESENT,
            )]);

            list.Close().native("ID3D12GraphicsCommandList::Close()")?;
        }
        Ok(())
    }
}

impl RenderStage for TriangleRenderer {
    fn name(&self) -> &'static str {
        "HelloTriangle"
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.context.resize(&self.device.device, width, height)?;
        self.viewport = viewport(width, height);
        self.scissor_rect = scissor_rect(width, height);
        Ok(())
    }

    fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
    }

    fn render(&mut self) -> Result<()> {
        let angle = self.elapsed * self.rotation_speed;
        let constants = [SceneConstants::new(self.context.width, self.context.height, angle, TINT)];
        self.constant_buffer.write(&constants)?;

        self.record_commands()?;

        self.context.execute(&self.command_list);
        self.context.present(self.vsync)?;
        self.context.wait_for_previous_frame()?;

        trace!(frame_index = self.context.frame_index, "Frame completed");
        Ok(())
    }
}

impl Drop for TriangleRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.context.flush() {
            warn!(error = %e, "Failed to wait for GPU before releasing triangle resources");
        }
        debug!("TriangleRenderer destroyed");
    }
}

fn viewport(width: u32, height: u32) -> D3D12_VIEWPORT {
    D3D12_VIEWPORT {
        TopLeftX: 0.0,
        TopLeftY: 0.0,
        Width: width as f32,
        Height: height as f32,
        MinDepth: 0.0,
        MaxDepth: 1.0,
    }
}

fn scissor_rect(width: u32, height: u32) -> RECT {
    RECT {
        left: 0,
        top: 0,
        right: width as i32,
        bottom: height as i32,
    }
}

/// 资源状态转换屏障
///
/// 屏障只借用资源指针，不增加引用计数，所以用 `transmute_copy` 而不是 `clone`。
fn transition_barrier(
    resource: &ID3D12Resource,
    state_before: D3D12_RESOURCE_STATES,
    state_after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: state_before,
                StateAfter: state_after,
            }),
        },
    }
}
