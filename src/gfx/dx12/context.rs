//! DirectX 12 呈现上下文
//!
//! 封装命令队列、交换链、RTV 描述符堆和 Fence，负责每帧的呈现与同步。
//!
//! # 初始化流程
//!
//! 1. 创建直接命令队列
//! 2. 创建 flip-discard 交换链（`FRAME_COUNT` 个缓冲）
//! 3. 创建 RTV 描述符堆，为每个后备缓冲创建渲染目标视图
//! 4. 创建 Fence 和等待事件

use tracing::{debug, info, warn};
use windows::core::Interface;
use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_EVENT, WAIT_OBJECT_0};
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::System::Threading::{CreateEventW, WaitForSingleObject, INFINITE};

use super::{Dx12Device, FRAME_COUNT};
use crate::core::error::{GraphicsError, HelloDxError, NativeResultExt, Result};
use crate::renderer::sync::{FenceManager, FenceValue};

/// 后备缓冲格式
pub const BACK_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

pub struct Dx12Context {
    pub command_queue: ID3D12CommandQueue,
    pub swap_chain: IDXGISwapChain3,
    pub rtv_heap: ID3D12DescriptorHeap,
    pub rtv_descriptor_size: usize,
    pub render_targets: Vec<ID3D12Resource>,
    /// 当前后备缓冲索引
    pub frame_index: u32,
    fence: ID3D12Fence,
    fence_event: HANDLE,
    fences: FenceManager,
    pub width: u32,
    pub height: u32,
    swap_chain_flags: DXGI_SWAP_CHAIN_FLAG,
    tearing_supported: bool,
}

impl Dx12Context {
    pub fn new(device: &Dx12Device, width: u32, height: u32) -> Result<Self> {
        let d3d = &device.device;

        unsafe {
            let queue_desc = D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                ..Default::default()
            };
            let command_queue: ID3D12CommandQueue =
                d3d.CreateCommandQueue(&queue_desc).native("CreateCommandQueue()")?;
            command_queue.SetName(windows::core::w!("Direct Queue")).ok();
            debug!("Command queue created");

            let swap_chain_flags = if device.tearing_supported {
                DXGI_SWAP_CHAIN_FLAG_ALLOW_TEARING
            } else {
                DXGI_SWAP_CHAIN_FLAG(0)
            };

            let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
                Width: width,
                Height: height,
                Format: BACK_BUFFER_FORMAT,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: FRAME_COUNT,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
                Flags: swap_chain_flags.0 as u32,
                ..Default::default()
            };

            let swap_chain: IDXGISwapChain1 = device
                .factory
                .CreateSwapChainForHwnd(&command_queue, device.hwnd, &swap_chain_desc, None, None)
                .map_err(|e| {
                    GraphicsError::SwapchainError(format!("CreateSwapChainForHwnd() failed: {}", e))
                })?;
            let swap_chain: IDXGISwapChain3 =
                swap_chain.cast().native("QueryInterface(IDXGISwapChain3)")?;
            let frame_index = swap_chain.GetCurrentBackBufferIndex();
            info!(width, height, buffers = FRAME_COUNT, tearing = device.tearing_supported, "Swap chain created");

            let rtv_heap: ID3D12DescriptorHeap = d3d
                .CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                    Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                    NumDescriptors: FRAME_COUNT,
                    Flags: D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
                    NodeMask: 0,
                })
                .native("CreateDescriptorHeap()")?;
            let rtv_descriptor_size =
                d3d.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) as usize;

            let render_targets = create_render_targets(d3d, &swap_chain, &rtv_heap, rtv_descriptor_size)?;

            let fence: ID3D12Fence = d3d
                .CreateFence(0, D3D12_FENCE_FLAG_NONE)
                .native("CreateFence()")?;
            let fence_event = CreateEventW(None, false, false, None).native("CreateEventW()")?;
            debug!("Fence created");

            Ok(Self {
                command_queue,
                swap_chain,
                rtv_heap,
                rtv_descriptor_size,
                render_targets,
                frame_index,
                fence,
                fence_event,
                fences: FenceManager::new(),
                width,
                height,
                swap_chain_flags,
                tearing_supported: device.tearing_supported,
            })
        }
    }

    /// 当前后备缓冲
    pub fn current_render_target(&self) -> &ID3D12Resource {
        &self.render_targets[self.frame_index as usize]
    }

    /// 当前后备缓冲的 RTV
    pub fn current_rtv(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        rtv_handle(&self.rtv_heap, self.rtv_descriptor_size, self.frame_index)
    }

    /// 提交命令列表
    pub fn execute(&self, command_list: &ID3D12GraphicsCommandList) {
        let command_lists = [Some(command_list.clone().into())];
        unsafe { self.command_queue.ExecuteCommandLists(&command_lists) };
    }

    /// 呈现当前后备缓冲
    ///
    /// 关闭垂直同步且支持撕裂时使用 `DXGI_PRESENT_ALLOW_TEARING`。
    pub fn present(&mut self, vsync: bool) -> Result<()> {
        let (interval, flags) = if vsync {
            (1, DXGI_PRESENT(0))
        } else if self.tearing_supported {
            (0, DXGI_PRESENT_ALLOW_TEARING)
        } else {
            (0, DXGI_PRESENT(0))
        };

        unsafe { self.swap_chain.Present(interval, flags) }
            .ok()
            .native("Present()")?;
        Ok(())
    }

    /// Signal 并阻塞等待 GPU 完成，随后更新后备缓冲索引
    ///
    /// 每帧都等待，简单但不能让 CPU 和 GPU 并行工作。
    pub fn wait_for_previous_frame(&mut self) -> Result<()> {
        let value = self.fences.next_value();
        unsafe {
            self.command_queue
                .Signal(&self.fence, value.value())
                .native("Signal()")?;

            self.fences
                .update_completed_value(FenceValue::new(self.fence.GetCompletedValue()));

            if !self.fences.is_completed(value) {
                self.fence
                    .SetEventOnCompletion(value.value(), self.fence_event)
                    .native("SetEventOnCompletion()")?;
                check_wait(WaitForSingleObject(self.fence_event, INFINITE))?;
                self.fences
                    .update_completed_value(FenceValue::new(self.fence.GetCompletedValue()));
            }

            self.frame_index = self.swap_chain.GetCurrentBackBufferIndex();
        }
        Ok(())
    }

    /// 等待所有已提交的 GPU 工作完成
    pub fn flush(&mut self) -> Result<()> {
        self.wait_for_previous_frame()?;
        debug!(fence = self.fences.last_signaled().value(), "GPU work flushed");
        Ok(())
    }

    /// 调整交换链大小
    ///
    /// 宽或高为 0（窗口最小化）时不做任何事。
    pub fn resize(&mut self, device: &ID3D12Device2, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            debug!(width, height, "Ignoring resize to empty client area");
            return Ok(());
        }
        if width == self.width && height == self.height {
            return Ok(());
        }

        // 后备缓冲仍被引用时 ResizeBuffers 会失败
        self.flush()?;
        self.render_targets.clear();

        unsafe {
            self.swap_chain
                .ResizeBuffers(FRAME_COUNT, width, height, BACK_BUFFER_FORMAT, self.swap_chain_flags)
                .map_err(|e| GraphicsError::SwapchainError(format!("ResizeBuffers() failed: {}", e)))?;
            self.frame_index = self.swap_chain.GetCurrentBackBufferIndex();
        }

        self.render_targets =
            create_render_targets(device, &self.swap_chain, &self.rtv_heap, self.rtv_descriptor_size)?;
        self.width = width;
        self.height = height;

        info!(width, height, "Swap chain resized");
        Ok(())
    }
}

impl Drop for Dx12Context {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "Failed to flush GPU work before shutdown");
        }
        unsafe {
            let _ = CloseHandle(self.fence_event);
        }
        debug!("Dx12Context destroyed");
    }
}

/// 无限等待只应以事件触发结束，其余返回值（如 `WAIT_FAILED`）都视为错误
fn check_wait(result: WAIT_EVENT) -> Result<()> {
    if result == WAIT_OBJECT_0 {
        Ok(())
    } else {
        Err(HelloDxError::Runtime(format!(
            "WaitForSingleObject() returned 0x{:08X}",
            result.0
        )))
    }
}

fn rtv_handle(heap: &ID3D12DescriptorHeap, descriptor_size: usize, index: u32) -> D3D12_CPU_DESCRIPTOR_HANDLE {
    let start = unsafe { heap.GetCPUDescriptorHandleForHeapStart() };
    D3D12_CPU_DESCRIPTOR_HANDLE {
        ptr: start.ptr + index as usize * descriptor_size,
    }
}

fn create_render_targets(
    device: &ID3D12Device2,
    swap_chain: &IDXGISwapChain3,
    rtv_heap: &ID3D12DescriptorHeap,
    descriptor_size: usize,
) -> Result<Vec<ID3D12Resource>> {
    (0..FRAME_COUNT)
        .map(|i| unsafe {
            let target: ID3D12Resource = swap_chain.GetBuffer(i).native("GetBuffer()")?;
            device.CreateRenderTargetView(&target, None, rtv_handle(rtv_heap, descriptor_size, i));
            Ok(target)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Foundation::{WAIT_ABANDONED, WAIT_FAILED, WAIT_TIMEOUT};

    #[test]
    fn test_check_wait() {
        assert!(check_wait(WAIT_OBJECT_0).is_ok());

        let err = check_wait(WAIT_FAILED).unwrap_err();
        assert!(matches!(err, HelloDxError::Runtime(_)));
        assert!(err.to_string().contains("0xFFFFFFFF"));

        assert!(check_wait(WAIT_TIMEOUT).is_err());
        assert!(check_wait(WAIT_ABANDONED).is_err());
    }
}
