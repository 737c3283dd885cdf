//! 课程阶段接口
//!
//! 每个课程阶段（`window` / `device` / `triangle`）都实现 `RenderStage`，
//! 主循环只通过这个 trait 驱动它们。

use std::sync::Arc;
use winit::window::Window;

use crate::core::error::Result;

/// 课程阶段的统一接口
///
/// 主循环每次迭代先调用 `update`，再调用 `render`。
pub trait RenderStage {
    /// 阶段名称（用于日志）
    fn name(&self) -> &'static str;

    /// 关联的窗口
    fn window(&self) -> &Window;

    /// 客户区尺寸变化
    ///
    /// 宽或高为 0 时实现应当忽略。
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// 推进动画状态，`delta_time` 单位为秒
    fn update(&mut self, delta_time: f32);

    /// 渲染一帧
    fn render(&mut self) -> Result<()>;
}

/// 只有窗口的阶段，`update` 和 `render` 都是空操作
pub struct WindowStage {
    window: Arc<Window>,
}

impl WindowStage {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl RenderStage for WindowStage {
    fn name(&self) -> &'static str {
        "HelloWindow"
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn resize(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, _delta_time: f32) {}

    fn render(&mut self) -> Result<()> {
        Ok(())
    }
}
