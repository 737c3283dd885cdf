//! 适配器选择策略
//!
//! 与具体 API 无关的选择逻辑，DX12 后端负责枚举适配器并尝试创建设备。
//!
//! # 规则
//!
//! 1. 按枚举顺序（GPU 偏好排序）依次检查
//! 2. 软件适配器（WARP）默认跳过
//! 3. 第一个能以要求的功能级别创建设备的适配器胜出
//! 4. 一个都没有则返回 `GraphicsError::NoSuitableAdapter`

use tracing::{debug, info, warn};

use crate::core::error::{GraphicsError, Result};

/// 适配器信息（从 `DXGI_ADAPTER_DESC1` 提取）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    /// 枚举索引
    pub index: u32,
    /// 适配器名称
    pub description: String,
    pub vendor_id: u32,
    pub device_id: u32,
    /// 独占显存（字节）
    pub dedicated_video_memory: u64,
    /// 是否为软件适配器
    pub is_software: bool,
}

impl AdapterInfo {
    /// 独占显存（MiB）
    pub fn dedicated_video_memory_mib(&self) -> u64 {
        self.dedicated_video_memory / (1024 * 1024)
    }
}

/// 选择策略
#[derive(Debug, Clone, Copy, Default)]
pub struct AdapterPolicy {
    pub allow_software: bool,
}

/// 选择结果：胜出的适配器和它创建出的设备
#[derive(Debug)]
pub struct Selected<A, D> {
    pub info: AdapterInfo,
    pub adapter: A,
    pub device: D,
}

/// 从候选适配器中选出第一个可用的
///
/// `candidates` 按枚举顺序产出 `(信息, 原生句柄)`；
/// `create_device` 尝试在该适配器上创建设备，失败返回 `None`。
pub fn select_adapter<A, D, I, F>(
    candidates: I,
    policy: AdapterPolicy,
    mut create_device: F,
) -> Result<Selected<A, D>>
where
    I: IntoIterator<Item = (AdapterInfo, A)>,
    F: FnMut(&AdapterInfo, &A) -> Option<D>,
{
    for (info, adapter) in candidates {
        debug!(
            index = info.index,
            name = %info.description,
            vram_mib = info.dedicated_video_memory_mib(),
            software = info.is_software,
            "Found adapter"
        );

        if info.is_software && !policy.allow_software {
            warn!(index = info.index, name = %info.description, "Skipping software adapter");
            continue;
        }

        match create_device(&info, &adapter) {
            Some(device) => {
                info!(
                    index = info.index,
                    name = %info.description,
                    vendor_id = format_args!("0x{:04X}", info.vendor_id),
                    device_id = format_args!("0x{:04X}", info.device_id),
                    vram_mib = info.dedicated_video_memory_mib(),
                    "Adapter selected"
                );
                return Ok(Selected { info, adapter, device });
            }
            None => {
                debug!(index = info.index, "Device creation failed on adapter, trying next");
            }
        }
    }

    Err(GraphicsError::NoSuitableAdapter.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HelloDxError;

    fn adapter(index: u32, name: &str, is_software: bool) -> (AdapterInfo, u32) {
        (
            AdapterInfo {
                index,
                description: name.to_string(),
                vendor_id: 0x10DE,
                device_id: 0x2684,
                dedicated_video_memory: 8 * 1024 * 1024 * 1024,
                is_software,
            },
            index,
        )
    }

    #[test]
    fn test_first_hardware_adapter_wins() {
        let candidates = vec![adapter(0, "GPU A", false), adapter(1, "GPU B", false)];
        let selected = select_adapter(candidates, AdapterPolicy::default(), |_, &a| Some(a * 10)).unwrap();
        assert_eq!(selected.info.description, "GPU A");
        assert_eq!(selected.device, 0);
    }

    #[test]
    fn test_software_adapter_skipped() {
        let candidates = vec![
            adapter(0, "Microsoft Basic Render Driver", true),
            adapter(1, "GPU", false),
        ];
        let mut tried = Vec::new();
        let selected = select_adapter(candidates, AdapterPolicy::default(), |info, _| {
            tried.push(info.index);
            Some(())
        })
        .unwrap();

        assert_eq!(selected.info.index, 1);
        assert_eq!(tried, vec![1]);
    }

    #[test]
    fn test_software_adapter_allowed() {
        let candidates = vec![adapter(0, "Microsoft Basic Render Driver", true)];
        let policy = AdapterPolicy { allow_software: true };
        let selected = select_adapter(candidates, policy, |_, _| Some(())).unwrap();
        assert!(selected.info.is_software);
    }

    #[test]
    fn test_falls_through_on_device_failure() {
        // 第一块卡不支持要求的功能级别
        let candidates = vec![adapter(0, "Old GPU", false), adapter(1, "New GPU", false)];
        let selected = select_adapter(candidates, AdapterPolicy::default(), |info, _| {
            (info.index == 1).then_some("device")
        })
        .unwrap();
        assert_eq!(selected.info.description, "New GPU");
    }

    #[test]
    fn test_no_suitable_adapter() {
        let candidates = vec![adapter(0, "WARP", true), adapter(1, "Old GPU", false)];
        let result = select_adapter(candidates, AdapterPolicy::default(), |_, _| None::<()>);
        assert!(matches!(
            result,
            Err(HelloDxError::Graphics(GraphicsError::NoSuitableAdapter))
        ));
    }

    #[test]
    fn test_empty_enumeration() {
        let result = select_adapter(
            Vec::<(AdapterInfo, ())>::new(),
            AdapterPolicy::default(),
            |_, _| Some(()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_vram_mib() {
        let (info, _) = adapter(0, "GPU", false);
        assert_eq!(info.dedicated_video_memory_mib(), 8192);
    }
}
