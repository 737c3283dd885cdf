//! 资源描述模块
//!
//! 描述三角形课程用到的三种上传堆缓冲区（顶点、索引、常量），
//! 并处理 D3D12 常量缓冲区的 256 字节对齐要求。

use bytemuck::{Pod, Zeroable};

use crate::math::{matrix, Matrix4};

/// D3D12 常量缓冲区视图要求的对齐（`D3D12_CONSTANT_BUFFER_DATA_PLACEMENT_ALIGNMENT`）
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// 向上对齐到 `alignment`（必须是 2 的幂）
pub fn align_to(size: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

/// 缓冲区使用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// 顶点缓冲区
    Vertex,
    /// 索引缓冲区
    Index,
    /// 常量缓冲区（Uniform Buffer）
    Constant,
}

/// 缓冲区描述信息
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    /// 数据大小（字节，未对齐）
    pub size: u64,
    /// 单个元素的大小（顶点步长 / 索引宽度）
    pub stride: u32,
    /// 使用类型
    pub usage: BufferUsage,
    /// 调试名称
    pub name: &'static str,
}

impl BufferDescriptor {
    /// 根据一段数据创建描述符
    pub fn for_slice<T: Pod>(data: &[T], usage: BufferUsage, name: &'static str) -> Self {
        Self {
            size: std::mem::size_of_val(data) as u64,
            stride: std::mem::size_of::<T>() as u32,
            usage,
            name,
        }
    }

    /// 实际分配的大小
    ///
    /// 常量缓冲区对齐到 256 字节，其余缓冲区按原大小分配。
    pub fn aligned_size(&self) -> u64 {
        match self.usage {
            BufferUsage::Constant => align_to(self.size, CONSTANT_BUFFER_ALIGNMENT),
            _ => self.size,
        }
    }

    /// 元素个数
    pub fn element_count(&self) -> u32 {
        if self.stride == 0 {
            0
        } else {
            (self.size / self.stride as u64) as u32
        }
    }
}

/// 每帧上传到 `b0` 的常量
///
/// 与 `shaders/triangle.hlsl` 中的 `cbuffer SceneConstants` 一一对应，
/// 尾部填充使整个结构体正好占一个 256 字节的常量缓冲区槽位。
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneConstants {
    /// 宽高比修正后的 z 轴旋转，列主序
    pub transform: [[f32; 4]; 4],
    /// 与顶点颜色相乘的色调
    pub tint: [f32; 4],
    _padding: [[f32; 4]; 11],
}

impl SceneConstants {
    /// 根据窗口尺寸和旋转角度计算常量
    pub fn new(width: u32, height: u32, angle: f32, tint: [f32; 4]) -> Self {
        let transform: Matrix4 = matrix::aspect_correction(width, height) * matrix::rotation_z(angle);
        Self {
            transform: matrix::to_shader_layout(&transform),
            tint,
            _padding: [[0.0; 4]; 11],
        }
    }
}

impl Default for SceneConstants {
    fn default() -> Self {
        Self::new(1, 1, 0.0, [1.0; 4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::vertex::{Vertex, TRIANGLE_INDICES, TRIANGLE_VERTICES};

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(1, 256), 256);
        assert_eq!(align_to(80, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
    }

    #[test]
    fn test_scene_constants_fill_one_slot() {
        assert_eq!(std::mem::size_of::<SceneConstants>() as u64, CONSTANT_BUFFER_ALIGNMENT);
    }

    #[test]
    fn test_vertex_buffer_descriptor() {
        let desc = BufferDescriptor::for_slice(&TRIANGLE_VERTICES, BufferUsage::Vertex, "vertices");
        assert_eq!(desc.size, 84);
        assert_eq!(desc.stride, std::mem::size_of::<Vertex>() as u32);
        assert_eq!(desc.aligned_size(), 84);
        assert_eq!(desc.element_count(), 3);
    }

    #[test]
    fn test_index_buffer_descriptor() {
        let desc = BufferDescriptor::for_slice(&TRIANGLE_INDICES, BufferUsage::Index, "indices");
        assert_eq!(desc.size, 6);
        assert_eq!(desc.stride, 2);
        assert_eq!(desc.element_count(), 3);
    }

    #[test]
    fn test_constant_buffer_is_aligned() {
        let data = [0.0f32; 20];
        let desc = BufferDescriptor::for_slice(&data, BufferUsage::Constant, "constants");
        assert_eq!(desc.size, 80);
        assert_eq!(desc.aligned_size(), 256);
    }

    #[test]
    fn test_square_window_static_constants() {
        let constants = SceneConstants::new(600, 600, 0.0, [1.0; 4]);
        assert_eq!(constants.transform[0][0], 1.0);
        assert_eq!(constants.transform[1][1], 1.0);
        assert_eq!(constants.transform[3][3], 1.0);
        assert_eq!(constants.tint, [1.0; 4]);
    }
}
