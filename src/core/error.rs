//! 错误处理模块
//!
//! 定义了所有课程阶段共用的错误类型。
//!
//! # 设计原则
//!
//! - 首个失败即终止：不重试、不恢复，错误一路 `?` 传播到 `main`
//! - 原生调用失败时保留平台错误码（HRESULT）以及失败调用的名称
//! - 易于模式匹配和错误处理

use std::fmt;
use std::path::PathBuf;

/// 统一的 Result 类型
pub type Result<T> = std::result::Result<T, HelloDxError>;

/// 课程程序的错误类型
#[derive(Debug)]
pub enum HelloDxError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 着色器加载错误
    Shader(ShaderError),

    /// IO 错误
    Io(std::io::Error),

    /// 初始化错误
    Initialization(String),

    /// 运行时错误
    Runtime(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug)]
pub enum GraphicsError {
    /// 原生 API 调用失败
    ///
    /// `call` 是失败调用的字面描述（如 `"CreateDXGIFactory2()"`），
    /// `code` 是平台返回的 HRESULT。
    NativeCall { call: &'static str, code: i32 },

    /// 没有找到可用的适配器
    NoSuitableAdapter,

    /// 交换链错误
    SwapchainError(String),

    /// 资源创建失败
    ResourceCreation(String),
}

/// 着色器相关的错误
#[derive(Debug)]
pub enum ShaderError {
    /// 字节码文件不存在（且没有可用的 HLSL 源文件）
    FileNotFound(PathBuf),

    /// 文件不是 DXBC 容器
    InvalidBytecode { path: PathBuf, reason: String },

    /// 运行时编译失败，附带编译器日志
    Compilation { entry: String, log: String },
}

impl fmt::Display for HelloDxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelloDxError::Config(e) => write!(f, "Configuration error: {}", e),
            HelloDxError::Graphics(e) => write!(f, "Graphics error: {}", e),
            HelloDxError::Shader(e) => write!(f, "Shader error: {}", e),
            HelloDxError::Io(e) => write!(f, "IO error: {}", e),
            HelloDxError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
            HelloDxError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::NativeCall { call, code } => {
                write!(f, "{} failed (HRESULT 0x{:08X})", call, *code as u32)
            }
            GraphicsError::NoSuitableAdapter => write!(f, "Adapter was not created successfully"),
            GraphicsError::SwapchainError(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::FileNotFound(path) => {
                write!(f, "Shader byte-code not found: {}", path.display())
            }
            ShaderError::InvalidBytecode { path, reason } => {
                write!(f, "Invalid shader byte-code in {}: {}", path.display(), reason)
            }
            ShaderError::Compilation { entry, log } => {
                write!(f, "Failed to compile '{}': {}", entry, log)
            }
        }
    }
}

impl std::error::Error for HelloDxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HelloDxError::Io(e) => Some(e),
            HelloDxError::Config(e) => Some(e),
            HelloDxError::Graphics(e) => Some(e),
            HelloDxError::Shader(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for ShaderError {}

impl From<std::io::Error> for HelloDxError {
    fn from(err: std::io::Error) -> Self {
        HelloDxError::Io(err)
    }
}

impl From<ConfigError> for HelloDxError {
    fn from(err: ConfigError) -> Self {
        HelloDxError::Config(err)
    }
}

impl From<GraphicsError> for HelloDxError {
    fn from(err: GraphicsError) -> Self {
        HelloDxError::Graphics(err)
    }
}

impl From<ShaderError> for HelloDxError {
    fn from(err: ShaderError) -> Self {
        HelloDxError::Shader(err)
    }
}

/// 将 `windows` crate 的结果转换为带调用名的错误
///
/// ```ignore
/// let factory: IDXGIFactory6 = CreateDXGIFactory2(flags).native("CreateDXGIFactory2()")?;
/// ```
#[cfg(target_os = "windows")]
pub trait NativeResultExt<T> {
    fn native(self, call: &'static str) -> Result<T>;
}

#[cfg(target_os = "windows")]
impl<T> NativeResultExt<T> for windows::core::Result<T> {
    fn native(self, call: &'static str) -> Result<T> {
        self.map_err(|e| GraphicsError::NativeCall { call, code: e.code().0 }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_call_display() {
        let err: HelloDxError = GraphicsError::NativeCall {
            call: "CreateDXGIFactory2()",
            code: 0x887A0004u32 as i32,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Graphics error: CreateDXGIFactory2() failed (HRESULT 0x887A0004)"
        );
    }

    #[test]
    fn test_no_adapter_message() {
        let err = HelloDxError::from(GraphicsError::NoSuitableAdapter);
        assert!(err.to_string().ends_with("Adapter was not created successfully"));
    }

    #[test]
    fn test_io_error_source() {
        let err = HelloDxError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_shader_error_display() {
        let err = ShaderError::InvalidBytecode {
            path: PathBuf::from("shaders/triangle_vs.cso"),
            reason: "missing DXBC magic".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid shader byte-code in shaders/triangle_vs.cso: missing DXBC magic"
        );
    }
}
