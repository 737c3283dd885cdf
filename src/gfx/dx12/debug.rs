//! D3D12 调试层
//!
//! 调试层必须在创建设备之前开启；信息队列过滤则在设备创建之后设置。

use tracing::{debug, info, warn};
use windows::core::Interface;
use windows::Win32::Graphics::Direct3D12::*;

use crate::core::config::DebugConfig;
use crate::core::error::{NativeResultExt, Result};

/// 开启调试层
///
/// 返回的接口需要一直持有到设备销毁。`enable_layer` 为 false 时返回 `None`。
pub fn enable_debug_layer(config: &DebugConfig) -> Result<Option<ID3D12Debug5>> {
    if !config.enable_layer {
        debug!("D3D12 debug layer disabled by configuration");
        return Ok(None);
    }

    unsafe {
        let mut debug: Option<ID3D12Debug> = None;
        D3D12GetDebugInterface(&mut debug).native("D3D12GetDebugInterface()")?;
        let debug = debug.ok_or_else(|| {
            crate::core::error::HelloDxError::Initialization(
                "D3D12GetDebugInterface() returned no interface".to_string(),
            )
        })?;

        let debug5: ID3D12Debug5 = debug.cast().native("QueryInterface(ID3D12Debug5)")?;

        debug5.EnableDebugLayer();
        debug5.SetEnableAutoName(config.auto_name);
        debug5.SetEnableGPUBasedValidation(config.gpu_validation_enabled());

        info!(
            auto_name = config.auto_name,
            gpu_validation = config.gpu_validation_enabled(),
            "D3D12 debug layer enabled"
        );
        if config.gpu_validation_enabled() {
            warn!("GPU-based validation is on, expect a large performance hit");
        }

        Ok(Some(debug5))
    }
}

/// 过滤信息队列中的噪音消息
///
/// 屏蔽 INFO 级别以及图形调试器抓帧时产生的 Map/Unmap 空范围警告。
/// 设备不支持 `ID3D12InfoQueue`（未开启调试层）时直接跳过。
pub fn install_info_queue_filter(device: &ID3D12Device2) -> Result<()> {
    let info_queue: ID3D12InfoQueue = match device.cast() {
        Ok(queue) => queue,
        Err(_) => {
            debug!("Device has no info queue, skipping message filter");
            return Ok(());
        }
    };

    let mut severities = [D3D12_MESSAGE_SEVERITY_INFO];
    let mut deny_ids = [
        D3D12_MESSAGE_ID_MAP_INVALID_NULLRANGE,
        D3D12_MESSAGE_ID_UNMAP_INVALID_NULLRANGE,
    ];

    let filter = D3D12_INFO_QUEUE_FILTER {
        AllowList: D3D12_INFO_QUEUE_FILTER_DESC::default(),
        DenyList: D3D12_INFO_QUEUE_FILTER_DESC {
            NumCategories: 0,
            pCategoryList: std::ptr::null_mut(),
            NumSeverities: severities.len() as u32,
            pSeverityList: severities.as_mut_ptr(),
            NumIDs: deny_ids.len() as u32,
            pIDList: deny_ids.as_mut_ptr(),
        },
    };

    unsafe {
        info_queue.PushStorageFilter(&filter).native("PushStorageFilter()")?;
    }

    debug!(denied_ids = deny_ids.len(), "Info queue filter installed");
    Ok(())
}
