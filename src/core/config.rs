//! 配置管理模块
//!
//! 提供课程程序配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 800
//! height = 600
//! title = "HelloDX12"
//! resizable = true
//!
//! [graphics]
//! stage = "triangle"          # window, device, triangle
//! vsync = true
//! min_feature_level = "12_2"  # 11_0, 11_1, 12_0, 12_1, 12_2
//! gpu_preference = "high_performance"
//! allow_software_adapter = false
//! clear_color = [0.1, 0.1, 0.15, 1.0]
//! rotation_speed = 0.0        # 弧度/秒，0 表示静止
//!
//! [debug]
//! enable_layer = true
//! gpu_validation = true
//! auto_name = true
//!
//! [shaders]
//! vertex = "shaders/triangle_vs.cso"
//! pixel = "shaders/triangle_ps.cso"
//! source = "shaders/triangle.hlsl"
//!
//! [logging]
//! level = "info"
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};

/// 引擎配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 调试层配置
    #[serde(default)]
    pub debug: DebugConfig,

    /// 着色器路径
    #[serde(default)]
    pub shaders: ShaderConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 客户区宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 客户区高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 是否可调整大小
    #[serde(default = "default_resizable")]
    pub resizable: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 课程阶段
    #[serde(default = "default_stage")]
    pub stage: LessonStage,

    /// 垂直同步
    #[serde(default = "default_vsync")]
    pub vsync: bool,

    /// 创建设备时要求的最低功能级别
    #[serde(default = "default_feature_level")]
    pub min_feature_level: FeatureLevel,

    /// 枚举适配器时的 GPU 偏好
    #[serde(default = "default_gpu_preference")]
    pub gpu_preference: GpuPreference,

    /// 是否允许选择软件适配器（WARP）
    #[serde(default)]
    pub allow_software_adapter: bool,

    /// 清屏颜色（RGBA）
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],

    /// 三角形绕 z 轴的旋转速度（弧度/秒）
    #[serde(default)]
    pub rotation_speed: f32,
}

/// 课程阶段
///
/// 决定启动流程推进到哪一步，每个阶段都包含前一个阶段的全部内容。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStage {
    /// 仅窗口和消息循环
    Window,
    /// 调试层、工厂、适配器和设备
    Device,
    /// 完整管线，绘制一个三角形
    Triangle,
}

/// D3D 功能级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureLevel {
    #[serde(rename = "11_0")]
    Level11_0,
    #[serde(rename = "11_1")]
    Level11_1,
    #[serde(rename = "12_0")]
    Level12_0,
    #[serde(rename = "12_1")]
    Level12_1,
    #[serde(rename = "12_2")]
    Level12_2,
}

/// 适配器枚举顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuPreference {
    Unspecified,
    MinimumPower,
    HighPerformance,
}

/// 调试层配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 启用 D3D12 调试层
    #[serde(default = "default_debug_layer")]
    pub enable_layer: bool,

    /// 启用 GPU 端验证（仅在调试层开启时生效）
    #[serde(default = "default_debug_layer")]
    pub gpu_validation: bool,

    /// 自动为对象命名
    #[serde(default = "default_debug_layer")]
    pub auto_name: bool,
}

/// 着色器文件路径（相对工作目录）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// 顶点着色器字节码
    #[serde(default = "default_vertex_shader")]
    pub vertex: String,

    /// 像素着色器字节码
    #[serde(default = "default_pixel_shader")]
    pub pixel: String,

    /// 字节码缺失时用于运行时编译的 HLSL 源文件
    #[serde(default = "default_shader_source")]
    pub source: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_title() -> String { "HelloDX12".to_string() }
fn default_resizable() -> bool { true }
fn default_stage() -> LessonStage { LessonStage::Triangle }
fn default_vsync() -> bool { true }
fn default_feature_level() -> FeatureLevel { FeatureLevel::Level12_2 }
fn default_gpu_preference() -> GpuPreference { GpuPreference::HighPerformance }
fn default_clear_color() -> [f32; 4] { [0.1, 0.1, 0.15, 1.0] }
fn default_debug_layer() -> bool { cfg!(debug_assertions) }
fn default_vertex_shader() -> String { "shaders/triangle_vs.cso".to_string() }
fn default_pixel_shader() -> String { "shaders/triangle_ps.cso".to_string() }
fn default_shader_source() -> String { "shaders/triangle.hlsl".to_string() }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_file() -> String { "hello_dx12.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            resizable: default_resizable(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            stage: default_stage(),
            vsync: default_vsync(),
            min_feature_level: default_feature_level(),
            gpu_preference: default_gpu_preference(),
            allow_software_adapter: false,
            clear_color: default_clear_color(),
            rotation_speed: 0.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enable_layer: default_debug_layer(),
            gpu_validation: default_debug_layer(),
            auto_name: default_debug_layer(),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex: default_vertex_shader(),
            pixel: default_pixel_shader(),
            source: default_shader_source(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_file: default_log_file(),
        }
    }
}

impl DebugConfig {
    /// GPU 端验证是否实际生效
    pub fn gpu_validation_enabled(&self) -> bool {
        self.enable_layer && self.gpu_validation
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// 文件中缺失的字段使用默认值。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    ///
    /// 文件存在但无法解析时返回错误，避免悄悄忽略写错的配置。
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--stage <window|device|triangle>`: 课程阶段
    /// - `--width <value>` / `--height <value>`: 窗口尺寸
    /// - `--warp`: 允许软件适配器
    /// - `--no-debug`: 关闭调试层
    /// - `--no-vsync`: 关闭垂直同步
    pub fn apply_args<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if let Some(value) = value_after(&args, "--stage")? {
            self.graphics.stage = LessonStage::parse(value).ok_or_else(|| {
                ConfigError::InvalidValue {
                    field: "graphics.stage".to_string(),
                    reason: format!("unknown stage '{}'", value),
                }
            })?;
        }

        if let Some(value) = value_after(&args, "--width")? {
            self.window.width = parse_dimension("window.width", value)?;
        }

        if let Some(value) = value_after(&args, "--height")? {
            self.window.height = parse_dimension("window.height", value)?;
        }

        if args.iter().any(|a| a == "--warp") {
            self.graphics.allow_software_adapter = true;
        }

        if args.iter().any(|a| a == "--no-debug") {
            self.debug.enable_layer = false;
            self.debug.gpu_validation = false;
        }

        if args.iter().any(|a| a == "--no-vsync") {
            self.graphics.vsync = false;
        }

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }
            .into());
        }

        if self.graphics.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.clear_color".to_string(),
                reason: "Color components must be within [0, 1]".to_string(),
            }
            .into());
        }

        if !self.graphics.rotation_speed.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "graphics.rotation_speed".to_string(),
                reason: "Rotation speed must be a finite number".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// 取参数后面紧跟的值；参数出现但没有值时报错
fn value_after<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    let Some(idx) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };

    match args.get(idx + 1) {
        Some(value) if !value.starts_with("--") => Ok(Some(value.as_str())),
        _ => Err(ConfigError::InvalidValue {
            field: flag.trim_start_matches('-').to_string(),
            reason: format!("missing value after '{}'", flag),
        }
        .into()),
    }
}

fn parse_dimension(field: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a valid size", value),
        }
        .into()
    })
}

impl LessonStage {
    /// 解析命令行中的阶段名
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "window" => Some(LessonStage::Window),
            "device" => Some(LessonStage::Device),
            "triangle" => Some(LessonStage::Triangle),
            _ => None,
        }
    }

    /// 获取阶段名称
    pub fn name(&self) -> &'static str {
        match self {
            LessonStage::Window => "HelloWindow",
            LessonStage::Device => "HelloDevice",
            LessonStage::Triangle => "HelloTriangle",
        }
    }
}

impl FeatureLevel {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureLevel::Level11_0 => "11_0",
            FeatureLevel::Level11_1 => "11_1",
            FeatureLevel::Level12_0 => "12_0",
            FeatureLevel::Level12_1 => "12_1",
            FeatureLevel::Level12_2 => "12_2",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.graphics.stage, LessonStage::Triangle);
        assert_eq!(config.graphics.min_feature_level, FeatureLevel::Level12_2);
        assert_eq!(config.graphics.gpu_preference, GpuPreference::HighPerformance);
        assert!(!config.graphics.allow_software_adapter);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [graphics]
            stage = "device"
            min_feature_level = "12_0"

            [shaders]
            vertex = "build/vs.cso"
            "#,
        )
        .unwrap();

        assert_eq!(config.graphics.stage, LessonStage::Device);
        assert_eq!(config.graphics.min_feature_level, FeatureLevel::Level12_0);
        assert!(config.graphics.vsync);
        assert_eq!(config.shaders.vertex, "build/vs.cso");
        assert_eq!(config.shaders.pixel, "shaders/triangle_ps.cso");
        assert_eq!(config.window.title, "HelloDX12");
    }

    #[test]
    fn test_partial_debug_section_disables_validation() {
        let config = Config::from_toml_str("[debug]\nenable_layer = false\n").unwrap();

        assert!(!config.debug.enable_layer);
        assert!(!config.debug.gpu_validation_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml_str("[graphics]\nstage = \"cube\"");
        assert!(matches!(
            result,
            Err(crate::core::error::HelloDxError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = Config::from_file_or_default("does/not/exist.toml").unwrap();
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config
            .apply_args([
                "hello_dx12", "--stage", "window", "--width", "1024", "--height", "768", "--warp",
                "--no-vsync",
            ])
            .unwrap();

        assert_eq!(config.graphics.stage, LessonStage::Window);
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 768);
        assert!(config.graphics.allow_software_adapter);
        assert!(!config.graphics.vsync);
    }

    #[test]
    fn test_apply_args_unknown_stage() {
        let mut config = Config::default();
        assert!(config.apply_args(["hello_dx12", "--stage", "cube"]).is_err());
    }

    #[test]
    fn test_apply_args_bad_size() {
        let mut config = Config::default();
        let result = config.apply_args(["hello_dx12", "--width", "abc"]);
        assert!(matches!(
            result,
            Err(crate::core::error::HelloDxError::Config(ConfigError::InvalidValue { ref field, .. }))
                if field == "window.width"
        ));
        assert_eq!(config.window.width, 800);

        assert!(config.apply_args(["hello_dx12", "--height", "-5"]).is_err());
    }

    #[test]
    fn test_apply_args_missing_value() {
        let mut config = Config::default();
        assert!(config.apply_args(["hello_dx12", "--stage"]).is_err());
        assert!(config.apply_args(["hello_dx12", "--width", "--no-vsync"]).is_err());
        assert!(config.graphics.vsync);
    }

    #[test]
    fn test_no_debug_disables_validation() {
        let mut config = Config::default();
        config.debug.enable_layer = true;
        config.debug.gpu_validation = true;
        config.apply_args(["hello_dx12", "--no-debug"]).unwrap();

        assert!(!config.debug.enable_layer);
        assert!(!config.debug.gpu_validation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.window.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.clear_color = [0.0, 1.5, 0.0, 1.0];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.rotation_speed = f32::NAN;
        assert!(config.validate().is_err());

        // 调试层关闭时 GPU 验证被忽略，不算错误
        let mut config = Config::default();
        config.debug.enable_layer = false;
        config.debug.gpu_validation = true;
        assert!(config.validate().is_ok());
        assert!(!config.debug.gpu_validation_enabled());
    }

    #[test]
    fn test_stage_parse() {
        assert_eq!(LessonStage::parse("Triangle"), Some(LessonStage::Triangle));
        assert_eq!(LessonStage::parse("device"), Some(LessonStage::Device));
        assert_eq!(LessonStage::parse("mesh"), None);
        assert_eq!(LessonStage::Window.name(), "HelloWindow");
    }

    #[test]
    fn test_feature_level_ordering() {
        assert!(FeatureLevel::Level11_0 < FeatureLevel::Level12_2);
        assert_eq!(FeatureLevel::Level12_1.name(), "12_1");
    }
}
