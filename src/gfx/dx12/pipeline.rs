//! 根签名、着色器编译和管线状态对象

use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::path::Path;

use tracing::{debug, info};
use windows::core::PCSTR;
use windows::Win32::Graphics::Direct3D::Fxc::*;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::context::BACK_BUFFER_FORMAT;
use crate::core::error::{GraphicsError, HelloDxError, NativeResultExt, Result, ShaderError};
use crate::renderer::shaders::{ShaderSet, ShaderStage};
use crate::renderer::vertex::COLOR_OFFSET;

/// 创建根签名：一个根 CBV 绑定到 `b0`，对所有阶段可见
pub fn create_root_signature(device: &ID3D12Device2) -> Result<ID3D12RootSignature> {
    let root_parameters = [D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            Descriptor: D3D12_ROOT_DESCRIPTOR {
                ShaderRegister: 0,
                RegisterSpace: 0,
            },
        },
        ShaderVisibility: D3D12_SHADER_VISIBILITY_ALL,
    }];

    let root_desc = D3D12_ROOT_SIGNATURE_DESC {
        NumParameters: root_parameters.len() as u32,
        pParameters: root_parameters.as_ptr(),
        NumStaticSamplers: 0,
        pStaticSamplers: std::ptr::null(),
        Flags: D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
    };

    unsafe {
        let mut signature: Option<ID3DBlob> = None;
        let mut error: Option<ID3DBlob> = None;
        if let Err(e) = D3D12SerializeRootSignature(
            &root_desc,
            D3D_ROOT_SIGNATURE_VERSION_1,
            &mut signature,
            Some(&mut error),
        ) {
            let detail = error.as_ref().map(blob_to_string).unwrap_or_else(|| e.to_string());
            return Err(GraphicsError::ResourceCreation(format!(
                "Failed to serialize root signature: {}",
                detail
            ))
            .into());
        }
        let signature = signature.ok_or_else(|| {
            GraphicsError::ResourceCreation("D3D12SerializeRootSignature() returned nothing".to_string())
        })?;

        let root_signature: ID3D12RootSignature = device
            .CreateRootSignature(
                0,
                std::slice::from_raw_parts(
                    signature.GetBufferPointer() as *const u8,
                    signature.GetBufferSize(),
                ),
            )
            .native("CreateRootSignature()")?;

        debug!("Root signature created");
        Ok(root_signature)
    }
}

/// 用 `D3DCompile` 编译 HLSL 源文件中的一个阶段
///
/// Debug 构建附带调试信息并跳过优化，便于在图形调试器中单步。
pub fn compile_hlsl(path: &Path, stage: ShaderStage) -> Result<Vec<u8>> {
    let source = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => HelloDxError::from(ShaderError::FileNotFound(path.to_path_buf())),
        _ => HelloDxError::Io(e),
    })?;

    let source_name = CString::new(path.display().to_string()).map_err(|e| {
        HelloDxError::Initialization(format!("Invalid shader path {}: {}", path.display(), e))
    })?;
    let entry = CString::new(stage.entry_point())
        .map_err(|e| HelloDxError::Initialization(e.to_string()))?;
    let target = CString::new(stage.target())
        .map_err(|e| HelloDxError::Initialization(e.to_string()))?;

    let flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    };

    let mut code: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;
    let result = unsafe {
        D3DCompile(
            source.as_ptr() as *const std::ffi::c_void,
            source.len(),
            PCSTR(source_name.as_ptr() as *const u8),
            None,
            None,
            PCSTR(entry.as_ptr() as *const u8),
            PCSTR(target.as_ptr() as *const u8),
            flags,
            0,
            &mut code,
            Some(&mut errors),
        )
    };

    if let Err(e) = result {
        let log = errors.as_ref().map(blob_to_string).unwrap_or_else(|| e.to_string());
        return Err(ShaderError::Compilation {
            entry: stage.entry_point().to_string(),
            log,
        }
        .into());
    }

    let code = code.ok_or_else(|| ShaderError::Compilation {
        entry: stage.entry_point().to_string(),
        log: "D3DCompile() produced no byte-code".to_string(),
    })?;
    let bytes = unsafe {
        std::slice::from_raw_parts(code.GetBufferPointer() as *const u8, code.GetBufferSize()).to_vec()
    };

    info!(entry = stage.entry_point(), target = stage.target(), size = bytes.len(), "Shader compiled");
    Ok(bytes)
}

/// 顶点输入布局：POSITION 位于偏移 0，COLOR 位于偏移 12
fn input_layout() -> [D3D12_INPUT_ELEMENT_DESC; 2] {
    [
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: windows::core::s!("POSITION"),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: 0,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: windows::core::s!("COLOR"),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32A32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: COLOR_OFFSET,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
    ]
}

/// 创建三角形的图形管线状态
///
/// 不剔除、不做深度测试、不混合，单个 RGBA8 渲染目标。
pub fn create_pipeline_state(
    device: &ID3D12Device2,
    root_signature: &ID3D12RootSignature,
    shaders: &ShaderSet,
) -> Result<ID3D12PipelineState> {
    let input_elements = input_layout();

    let mut pso_desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC::default();
    pso_desc.pRootSignature = ManuallyDrop::new(Some(root_signature.clone()));
    pso_desc.VS = D3D12_SHADER_BYTECODE {
        pShaderBytecode: shaders.vertex.bytes.as_ptr() as *const std::ffi::c_void,
        BytecodeLength: shaders.vertex.bytes.len(),
    };
    pso_desc.PS = D3D12_SHADER_BYTECODE {
        pShaderBytecode: shaders.pixel.bytes.as_ptr() as *const std::ffi::c_void,
        BytecodeLength: shaders.pixel.bytes.len(),
    };

    let mut blend = D3D12_BLEND_DESC {
        AlphaToCoverageEnable: false.into(),
        IndependentBlendEnable: false.into(),
        ..Default::default()
    };
    blend.RenderTarget[0] = D3D12_RENDER_TARGET_BLEND_DESC {
        BlendEnable: false.into(),
        LogicOpEnable: false.into(),
        SrcBlend: D3D12_BLEND_ONE,
        DestBlend: D3D12_BLEND_ZERO,
        BlendOp: D3D12_BLEND_OP_ADD,
        SrcBlendAlpha: D3D12_BLEND_ONE,
        DestBlendAlpha: D3D12_BLEND_ZERO,
        BlendOpAlpha: D3D12_BLEND_OP_ADD,
        LogicOp: D3D12_LOGIC_OP_NOOP,
        RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
    };
    pso_desc.BlendState = blend;

    pso_desc.RasterizerState = D3D12_RASTERIZER_DESC {
        FillMode: D3D12_FILL_MODE_SOLID,
        CullMode: D3D12_CULL_MODE_NONE,
        FrontCounterClockwise: false.into(),
        DepthBias: 0,
        DepthBiasClamp: 0.0,
        SlopeScaledDepthBias: 0.0,
        DepthClipEnable: true.into(),
        ..Default::default()
    };
    pso_desc.DepthStencilState = D3D12_DEPTH_STENCIL_DESC {
        DepthEnable: false.into(),
        StencilEnable: false.into(),
        ..Default::default()
    };
    pso_desc.SampleMask = u32::MAX;
    pso_desc.InputLayout = D3D12_INPUT_LAYOUT_DESC {
        pInputElementDescs: input_elements.as_ptr(),
        NumElements: input_elements.len() as u32,
    };
    pso_desc.PrimitiveTopologyType = D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE;
    pso_desc.NumRenderTargets = 1;
    pso_desc.RTVFormats[0] = BACK_BUFFER_FORMAT;
    pso_desc.SampleDesc = DXGI_SAMPLE_DESC { Count: 1, Quality: 0 };

    let pso: windows::core::Result<ID3D12PipelineState> =
        unsafe { device.CreateGraphicsPipelineState(&pso_desc) };

    // 描述结构里克隆的根签名引用需要手动释放
    drop(ManuallyDrop::into_inner(pso_desc.pRootSignature));

    let pso = pso.native("CreateGraphicsPipelineState()")?;
    debug!("Pipeline state created");
    Ok(pso)
}

fn blob_to_string(blob: &ID3DBlob) -> String {
    unsafe {
        let bytes = std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize());
        String::from_utf8_lossy(bytes).trim_end_matches('\0').trim_end().to_string()
    }
}
