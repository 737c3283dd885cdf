//! DXGI 工厂和 D3D12 设备
//!
//! # 初始化流程
//!
//! 1. 开启调试层（可选）
//! 2. 创建 DXGI 工厂，查询撕裂支持，禁用 Alt+Enter
//! 3. 按 GPU 偏好枚举适配器，第一个能以要求功能级别创建设备的胜出
//! 4. 设置信息队列过滤（调试层开启时）

use tracing::{debug, info};
use windows::core::Interface;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::*;
use winit::window::Window;

use super::{d3d_feature_level, debug as dx_debug, dxgi_gpu_preference};
use crate::core::config::Config;
use crate::core::error::{NativeResultExt, Result};
use crate::gfx::adapter::{select_adapter, AdapterInfo, AdapterPolicy};
use crate::gfx::window::hwnd;

/// 设备级对象集合
///
/// 字段按销毁顺序排列：设备先于工厂释放，调试接口最后释放。
pub struct Dx12Device {
    pub device: ID3D12Device2,
    pub adapter: IDXGIAdapter1,
    pub adapter_info: AdapterInfo,
    pub factory: IDXGIFactory6,
    /// 是否支持 `DXGI_FEATURE_PRESENT_ALLOW_TEARING`
    pub tearing_supported: bool,
    pub hwnd: HWND,
    _debug: Option<ID3D12Debug5>,
}

impl Dx12Device {
    pub fn new(window: &Window, config: &Config) -> Result<Self> {
        let debug = dx_debug::enable_debug_layer(&config.debug)?;

        let factory_flags = if debug.is_some() {
            DXGI_CREATE_FACTORY_DEBUG
        } else {
            DXGI_CREATE_FACTORY_FLAGS(0)
        };
        let factory: IDXGIFactory6 =
            unsafe { CreateDXGIFactory2(factory_flags) }.native("CreateDXGIFactory2()")?;
        debug!("DXGI factory created");

        let tearing_supported = check_tearing_support(&factory);
        debug!(tearing_supported, "Queried tearing support");

        let hwnd = hwnd(window)?;
        unsafe { factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER) }
            .native("MakeWindowAssociation()")?;

        let feature_level = d3d_feature_level(config.graphics.min_feature_level);
        let candidates = enumerate_adapters(&factory, config)?;
        let policy = AdapterPolicy {
            allow_software: config.graphics.allow_software_adapter,
        };

        let selected = select_adapter(candidates, policy, |_, adapter: &IDXGIAdapter1| {
            let mut device: Option<ID3D12Device2> = None;
            unsafe { D3D12CreateDevice(adapter, feature_level, &mut device) }.ok()?;
            device
        })?;

        info!(
            adapter = %selected.info.description,
            feature_level = config.graphics.min_feature_level.name(),
            "D3D12 device created"
        );

        if debug.is_some() {
            dx_debug::install_info_queue_filter(&selected.device)?;
        }

        Ok(Self {
            device: selected.device,
            adapter: selected.adapter,
            adapter_info: selected.info,
            factory,
            tearing_supported,
            hwnd,
            _debug: debug,
        })
    }
}

/// 查询撕裂（可变刷新率）支持
fn check_tearing_support(factory: &IDXGIFactory6) -> bool {
    let factory5: IDXGIFactory5 = match factory.cast() {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut allow_tearing: i32 = 0;
    let result = unsafe {
        factory5.CheckFeatureSupport(
            DXGI_FEATURE_PRESENT_ALLOW_TEARING,
            &mut allow_tearing as *mut i32 as *mut std::ffi::c_void,
            std::mem::size_of::<i32>() as u32,
        )
    };

    result.is_ok() && allow_tearing != 0
}

/// 按 GPU 偏好顺序枚举全部适配器
///
/// 软件适配器（Microsoft Basic Render Driver）也会出现在列表中，
/// 由选择策略决定是否跳过。
fn enumerate_adapters(
    factory: &IDXGIFactory6,
    config: &Config,
) -> Result<Vec<(AdapterInfo, IDXGIAdapter1)>> {
    let preference = dxgi_gpu_preference(config.graphics.gpu_preference);
    let mut adapters = Vec::new();

    for index in 0.. {
        let adapter: IDXGIAdapter1 =
            match unsafe { factory.EnumAdapterByGpuPreference(index, preference) } {
                Ok(adapter) => adapter,
                Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
                Err(e) => return Err(e).native("EnumAdapterByGpuPreference()"),
            };
        let info = adapter_info(index, &adapter)?;
        adapters.push((info, adapter));
    }

    debug!(count = adapters.len(), "Enumerated adapters");
    Ok(adapters)
}

fn adapter_info(index: u32, adapter: &IDXGIAdapter1) -> Result<AdapterInfo> {
    let desc = unsafe { adapter.GetDesc1() }.native("GetDesc1()")?;

    let len = desc
        .Description
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(desc.Description.len());
    let description = String::from_utf16_lossy(&desc.Description[..len]);

    Ok(AdapterInfo {
        index,
        description,
        vendor_id: desc.VendorId,
        device_id: desc.DeviceId,
        dedicated_video_memory: desc.DedicatedVideoMemory as u64,
        is_software: (desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32) != 0,
    })
}
