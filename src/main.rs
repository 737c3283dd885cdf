//! HelloDX12 - Direct3D 12 入门课程
//!
//! 通过配置文件或命令行参数选择课程阶段。
//!
//! # 使用方法
//!
//! ```bash
//! # 默认：绘制三角形
//! cargo run
//!
//! # 只创建窗口 / 只初始化设备
//! cargo run -- --stage window
//! cargo run -- --stage device
//!
//! # 允许 WARP，关闭调试层和垂直同步
//! cargo run -- --warp --no-debug --no-vsync
//! ```

use std::time::Instant;

use anyhow::Context;
use hello_dx12::core::{log, Config, HelloDxError};
use hello_dx12::gfx::create_window;
use hello_dx12::renderer::Renderer;
use tracing::{debug, error, info};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};

/// 任何错误都是致命的：写日志、打印到 stderr，以状态码 1 退出
fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// # 初始化流程
///
/// 1. 加载 config.toml（不存在时使用默认值）
/// 2. 应用命令行参数覆盖并验证
/// 3. 初始化日志系统
/// 4. 创建事件循环、窗口和渲染器
/// 5. 启动主循环：处理窗口事件，然后 `update` + `render`
fn run() -> anyhow::Result<()> {
    let mut config = Config::from_file_or_default("config.toml")?;
    config.apply_args(std::env::args().skip(1))?;
    config.validate()?;

    let log_file = config
        .logging
        .file_output
        .then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file);
    info!(version = env!("CARGO_PKG_VERSION"), "HelloDX12 starting...");

    info!(
        stage = config.graphics.stage.name(),
        width = config.window.width,
        height = config.window.height,
        vsync = config.graphics.vsync,
        debug_layer = config.debug.enable_layer,
        "Configuration loaded"
    );

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let window = create_window(&event_loop, &config)?;
    let mut renderer = Some(Renderer::new(window, &config)?);
    let mut failure: Option<HelloDxError> = None;
    let mut last_frame = Instant::now();

    info!("Entering main loop...");

    event_loop.run(|event, elwt| {
        if let Event::LoopExiting = event {
            // 先等 GPU 空闲并释放资源，窗口最后销毁
            renderer = None;
            return;
        }

        let Some(active) = renderer.as_mut() else {
            return;
        };

        let result = match event {
            // 只处理渲染器自己的窗口
            Event::WindowEvent { window_id, .. } if window_id != active.window().id() => Ok(()),
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!(stage = active.stage_name(), "Close requested, shutting down...");
                elwt.exit();
                Ok(())
            }
            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => {
                debug!(width = size.width, height = size.height, "Window resized");
                active.resize(size.width, size.height)
            }
            Event::AboutToWait => {
                let now = Instant::now();
                let delta_time = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                active.update(delta_time);
                active.render()
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            failure = Some(e);
            elwt.exit();
        }
    })?;

    match failure {
        Some(e) => Err(e.into()),
        None => {
            info!("HelloDX12 exited cleanly");
            Ok(())
        }
    }
}
