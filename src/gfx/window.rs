//! 窗口创建
//!
//! 使用 winit 创建课程窗口，并在 Windows 上取出 DXGI 需要的 `HWND`。

use std::sync::Arc;
use tracing::info;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

use crate::core::error::{HelloDxError, Result};
use crate::core::Config;

/// 根据配置创建窗口
///
/// 标题形如 `"HelloDX12 [HelloTriangle]"`，客户区大小即配置中的宽高（物理像素，
/// 与交换链缓冲区一致，不受 DPI 缩放影响；winit 会自动把边框和标题栏算进外框尺寸）。
pub fn create_window(event_loop: &EventLoop<()>, config: &Config) -> Result<Arc<Window>> {
    let title = format!("{} [{}]", config.window.title, config.graphics.stage.name());
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(client_size(config))
        .with_resizable(config.window.resizable)
        .build(event_loop)
        .map_err(|e| HelloDxError::Initialization(format!("Failed to create window: {}", e)))?;

    let size = window.inner_size();
    info!(width = size.width, height = size.height, "Window created");

    Ok(Arc::new(window))
}

/// 配置中的客户区尺寸，单位为物理像素
pub fn client_size(config: &Config) -> PhysicalSize<u32> {
    PhysicalSize::new(config.window.width, config.window.height)
}

/// 获取窗口的 Win32 句柄
#[cfg(target_os = "windows")]
pub fn hwnd(window: &Window) -> Result<windows::Win32::Foundation::HWND> {
    use raw_window_handle::{HasWindowHandle, RawWindowHandle};

    let handle = window
        .window_handle()
        .map_err(|e| HelloDxError::Initialization(format!("Failed to get window handle: {}", e)))?;

    match handle.as_raw() {
        RawWindowHandle::Win32(win32_handle) => Ok(windows::Win32::Foundation::HWND(
            win32_handle.hwnd.get() as *mut std::ffi::c_void,
        )),
        _ => Err(HelloDxError::Initialization(
            "Expected Win32 window handle on Windows platform".to_string(),
        )),
    }
}
