//! 渲染器模块
//!
//! 与具体图形 API 无关的部分（顶点、资源描述、着色器加载、Fence 记账），
//! 以及按课程阶段选择实现的 `Renderer`。
//!
//! # 架构
//!
//! - `Renderer`：主循环唯一接触的类型
//! - `RenderStage`：各阶段实现的 trait，DX12 实现在 `gfx::dx12`

use std::sync::Arc;
use tracing::info;
use winit::window::Window;

use crate::core::config::LessonStage;
use crate::core::error::Result;
use crate::core::Config;

pub mod resource;
pub mod shaders;
pub mod stage;
pub mod sync;
pub mod vertex;

use stage::{RenderStage, WindowStage};

pub struct Renderer {
    stage: Box<dyn RenderStage>,
}

impl Renderer {
    /// 按配置的课程阶段创建渲染器
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let stage = create_stage(window, config)?;
        info!(stage = stage.name(), "Renderer initialized");
        Ok(Self { stage })
    }

    pub fn stage_name(&self) -> &'static str {
        self.stage.name()
    }

    pub fn window(&self) -> &Window {
        self.stage.window()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.stage.resize(width, height)
    }

    pub fn update(&mut self, delta_time: f32) {
        self.stage.update(delta_time);
    }

    pub fn render(&mut self) -> Result<()> {
        self.stage.render()
    }
}

fn create_stage(window: Arc<Window>, config: &Config) -> Result<Box<dyn RenderStage>> {
    match config.graphics.stage {
        LessonStage::Window => Ok(Box::new(WindowStage::new(window))),
        #[cfg(target_os = "windows")]
        LessonStage::Device => {
            info!("Initializing D3D12 device");
            Ok(Box::new(crate::gfx::dx12::DeviceStage::new(window, config)?))
        }
        #[cfg(target_os = "windows")]
        LessonStage::Triangle => {
            info!("Initializing D3D12 triangle renderer");
            Ok(Box::new(crate::gfx::dx12::TriangleRenderer::new(window, config)?))
        }
        #[cfg(not(target_os = "windows"))]
        stage @ (LessonStage::Device | LessonStage::Triangle) => {
            let _ = window;
            Err(crate::core::error::HelloDxError::Initialization(format!(
                "{} requires DirectX 12, which is only available on Windows",
                stage.name()
            )))
        }
    }
}
