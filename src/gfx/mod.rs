//! 图形平台层
//!
//! - `window`：winit 窗口和 Win32 句柄
//! - `adapter`：与 API 无关的适配器选择策略
//! - `dx12`：DirectX 12 初始化和渲染（仅 Windows）

pub mod adapter;
pub mod window;
#[cfg(target_os = "windows")]
pub mod dx12;

pub use window::create_window;
