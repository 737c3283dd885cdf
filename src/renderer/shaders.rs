//! 着色器字节码加载
//!
//! 三角形课程从相对路径读取两个预编译的着色器（顶点 + 像素）。
//! 文件必须是 DXBC 容器（fxc 和 dxc 的输出都以 `DXBC` 开头）。
//!
//! 如果预编译文件不存在但 HLSL 源文件存在，则交给调用方提供的编译器在运行时编译
//! （DX12 后端使用 `D3DCompile`）。
//!
//! # 查找顺序
//!
//! ```text
//! shaders/triangle_vs.cso ──存在──▶ 读取并校验
//!        │
//!      不存在
//!        ▼
//! shaders/triangle.hlsl ──存在──▶ 运行时编译
//!        │
//!      不存在
//!        ▼
//!   ShaderError::FileNotFound
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::config::ShaderConfig;
use crate::core::error::{Result, ShaderError};

/// DXBC 容器的魔数
pub const DXBC_MAGIC: &[u8; 4] = b"DXBC";

/// 着色器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    /// HLSL 入口函数名
    pub fn entry_point(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VSMain",
            ShaderStage::Pixel => "PSMain",
        }
    }

    /// 运行时编译使用的 profile
    pub fn target(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Pixel => "ps_5_0",
        }
    }
}

/// 字节码来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderOrigin {
    /// 预编译文件
    Precompiled(PathBuf),
    /// 从 HLSL 源文件运行时编译
    Source(PathBuf),
}

/// 一个阶段的着色器字节码
#[derive(Debug, Clone)]
pub struct ShaderBytecode {
    pub stage: ShaderStage,
    pub bytes: Vec<u8>,
    pub origin: ShaderOrigin,
}

/// 顶点 + 像素着色器
#[derive(Debug, Clone)]
pub struct ShaderSet {
    pub vertex: ShaderBytecode,
    pub pixel: ShaderBytecode,
}

impl ShaderSet {
    /// 按配置加载两个阶段的着色器
    ///
    /// `compile` 只在预编译文件缺失时被调用，参数为 HLSL 源文件路径和阶段。
    pub fn load<F>(config: &ShaderConfig, mut compile: F) -> Result<Self>
    where
        F: FnMut(&Path, ShaderStage) -> Result<Vec<u8>>,
    {
        let source = Path::new(&config.source);
        let vertex = load_stage(ShaderStage::Vertex, Path::new(&config.vertex), source, &mut compile)?;
        let pixel = load_stage(ShaderStage::Pixel, Path::new(&config.pixel), source, &mut compile)?;
        Ok(Self { vertex, pixel })
    }
}

/// 决定某个阶段的字节码来源
pub fn resolve_origin(bytecode_path: &Path, source_path: &Path) -> Result<ShaderOrigin> {
    if bytecode_path.is_file() {
        Ok(ShaderOrigin::Precompiled(bytecode_path.to_path_buf()))
    } else if source_path.is_file() {
        Ok(ShaderOrigin::Source(source_path.to_path_buf()))
    } else {
        Err(ShaderError::FileNotFound(bytecode_path.to_path_buf()).into())
    }
}

fn load_stage<F>(
    stage: ShaderStage,
    bytecode_path: &Path,
    source_path: &Path,
    compile: &mut F,
) -> Result<ShaderBytecode>
where
    F: FnMut(&Path, ShaderStage) -> Result<Vec<u8>>,
{
    let origin = resolve_origin(bytecode_path, source_path)?;
    let bytes = match &origin {
        ShaderOrigin::Precompiled(path) => read_bytecode(path)?,
        ShaderOrigin::Source(path) => {
            info!(
                stage = ?stage,
                source = %path.display(),
                "Pre-compiled shader missing, compiling from source"
            );
            compile(path, stage)?
        }
    };

    debug!(stage = ?stage, size = bytes.len(), "Shader byte-code loaded");
    Ok(ShaderBytecode { stage, bytes, origin })
}

/// 读取并校验一个预编译的着色器文件
pub fn read_bytecode(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ShaderError::FileNotFound(path.to_path_buf()).into(),
        _ => crate::core::error::HelloDxError::Io(e),
    })?;
    validate_bytecode(path, &bytes)?;
    Ok(bytes)
}

/// 检查 DXBC 容器头
pub fn validate_bytecode(path: &Path, bytes: &[u8]) -> Result<()> {
    if bytes.len() < DXBC_MAGIC.len() {
        return Err(ShaderError::InvalidBytecode {
            path: path.to_path_buf(),
            reason: format!("file is only {} bytes", bytes.len()),
        }
        .into());
    }

    if &bytes[..4] != DXBC_MAGIC {
        return Err(ShaderError::InvalidBytecode {
            path: path.to_path_buf(),
            reason: "missing DXBC magic".to_string(),
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HelloDxError;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hello_dx12_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fake_container() -> Vec<u8> {
        let mut bytes = DXBC_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 28]);
        bytes
    }

    fn shader_config(dir: &Path) -> ShaderConfig {
        ShaderConfig {
            vertex: dir.join("vs.cso").to_string_lossy().to_string(),
            pixel: dir.join("ps.cso").to_string_lossy().to_string(),
            source: dir.join("triangle.hlsl").to_string_lossy().to_string(),
        }
    }

    #[test]
    fn test_stage_entry_points() {
        assert_eq!(ShaderStage::Vertex.entry_point(), "VSMain");
        assert_eq!(ShaderStage::Pixel.target(), "ps_5_0");
    }

    #[test]
    fn test_validate_bytecode() {
        let path = Path::new("vs.cso");
        assert!(validate_bytecode(path, &fake_container()).is_ok());
        assert!(validate_bytecode(path, b"DX").is_err());
        assert!(validate_bytecode(path, b"MZ\x90\x00 not a shader").is_err());
    }

    #[test]
    fn test_missing_bytecode_and_source() {
        let dir = scratch_dir("missing");
        let result = ShaderSet::load(&shader_config(&dir), |_, _| Ok(fake_container()));
        match result {
            Err(HelloDxError::Shader(ShaderError::FileNotFound(path))) => {
                assert!(path.ends_with("vs.cso"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_precompiled_bytecode_is_used() {
        let dir = scratch_dir("precompiled");
        std::fs::write(dir.join("vs.cso"), fake_container()).unwrap();
        std::fs::write(dir.join("ps.cso"), fake_container()).unwrap();

        let set = ShaderSet::load(&shader_config(&dir), |_, _| {
            panic!("compiler must not run when byte-code exists")
        })
        .unwrap();

        assert_eq!(set.vertex.stage, ShaderStage::Vertex);
        assert!(matches!(set.pixel.origin, ShaderOrigin::Precompiled(_)));
        assert_eq!(&set.vertex.bytes[..4], DXBC_MAGIC);
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let dir = scratch_dir("bad_magic");
        std::fs::write(dir.join("vs.cso"), b"garbage bytes").unwrap();
        std::fs::write(dir.join("ps.cso"), fake_container()).unwrap();

        let result = ShaderSet::load(&shader_config(&dir), |_, _| Ok(fake_container()));
        assert!(matches!(
            result,
            Err(HelloDxError::Shader(ShaderError::InvalidBytecode { .. }))
        ));
    }

    #[test]
    fn test_source_fallback_compiles_missing_stage() {
        let dir = scratch_dir("fallback");
        std::fs::write(dir.join("vs.cso"), fake_container()).unwrap();
        std::fs::write(dir.join("triangle.hlsl"), "float4 PSMain() : SV_TARGET { return 1; }").unwrap();

        let mut compiled = Vec::new();
        let set = ShaderSet::load(&shader_config(&dir), |path, stage| {
            compiled.push((path.to_path_buf(), stage));
            Ok(fake_container())
        })
        .unwrap();

        assert!(matches!(set.vertex.origin, ShaderOrigin::Precompiled(_)));
        assert!(matches!(set.pixel.origin, ShaderOrigin::Source(_)));
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].1, ShaderStage::Pixel);
    }
}
