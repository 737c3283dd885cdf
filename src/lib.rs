//! HelloDX12 - Direct3D 12 入门课程
//!
//! 依次完成窗口、调试层、DXGI 工厂、适配器和设备选择、交换链、
//! 根签名、管线状态、缓冲区和 Fence 的初始化，最终每帧绘制一个三角形。
//!
//! # 模块结构
//!
//! - `core`: 配置、日志、错误处理
//! - `math`: 常量缓冲区用到的矩阵
//! - `renderer`: 与 API 无关的渲染数据和课程阶段分发
//! - `gfx`: 窗口、适配器选择和 DirectX 12 实现
//!
//! # 使用示例
//!
//! ```no_run
//! use hello_dx12::core::Config;
//!
//! let mut config = Config::from_file_or_default("config.toml").unwrap();
//! config.apply_args(["--stage", "device", "--no-vsync"]).unwrap();
//! config.validate().unwrap();
//! ```

pub mod core;
pub mod gfx;
pub mod math;
pub mod renderer;
