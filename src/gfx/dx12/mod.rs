//! DirectX 12 图形 API 实现模块
//!
//! 按原生 API 要求的顺序组织：
//! - `debug`: 调试层和信息队列过滤
//! - `device`: DXGI 工厂、适配器枚举和设备创建
//! - `context`: 命令队列、交换链、RTV 和 Fence
//! - `pipeline`: 根签名、着色器编译和管线状态对象
//! - `buffer`: 上传堆缓冲区
//! - `renderer`: `device` 和 `triangle` 两个课程阶段

pub mod buffer;
pub mod context;
pub mod debug;
pub mod device;
pub mod pipeline;
pub mod renderer;

pub use context::Dx12Context;
pub use device::Dx12Device;
pub use renderer::{DeviceStage, TriangleRenderer};

use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Dxgi::*;

use crate::core::config::{FeatureLevel, GpuPreference};

/// 交换链缓冲数量
pub const FRAME_COUNT: u32 = 2;

pub(crate) fn d3d_feature_level(level: FeatureLevel) -> D3D_FEATURE_LEVEL {
    match level {
        FeatureLevel::Level11_0 => D3D_FEATURE_LEVEL_11_0,
        FeatureLevel::Level11_1 => D3D_FEATURE_LEVEL_11_1,
        FeatureLevel::Level12_0 => D3D_FEATURE_LEVEL_12_0,
        FeatureLevel::Level12_1 => D3D_FEATURE_LEVEL_12_1,
        FeatureLevel::Level12_2 => D3D_FEATURE_LEVEL_12_2,
    }
}

pub(crate) fn dxgi_gpu_preference(preference: GpuPreference) -> DXGI_GPU_PREFERENCE {
    match preference {
        GpuPreference::Unspecified => DXGI_GPU_PREFERENCE_UNSPECIFIED,
        GpuPreference::MinimumPower => DXGI_GPU_PREFERENCE_MINIMUM_POWER,
        GpuPreference::HighPerformance => DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE,
    }
}
