//! 顶点数据定义
//!
//! 本模块定义了三角形课程使用的顶点结构体和硬编码的几何数据。
//!
//! # 设计说明
//!
//! - 使用 `#[repr(C)]` 确保内存布局与 HLSL 输入布局一致
//! - 实现 `Pod` 和 `Zeroable` trait，可以直接按字节拷贝到上传堆

use bytemuck::{Pod, Zeroable};

/// 顶点结构体
///
/// # 内存布局
///
/// - `position`：前 12 字节（3 个 f32），对应 `POSITION` 语义
/// - `color`：后 16 字节（4 个 f32），对应 `COLOR` 语义
///
/// 总大小：28 字节
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 顶点位置（NDC 坐标）
    pub position: [f32; 3],
    /// 顶点颜色（RGBA，范围 0.0-1.0）
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// `COLOR` 属性在顶点中的字节偏移
pub const COLOR_OFFSET: u32 = 12;

/// 三角形顶点：顶部红色、右下绿色、左下蓝色
pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex::new([0.0, 0.5, 0.5], [1.0, 0.0, 0.0, 1.0]),
    Vertex::new([0.5, -0.5, 0.5], [0.0, 1.0, 0.0, 1.0]),
    Vertex::new([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0, 1.0]),
];

/// 三角形索引（顺时针，D3D 默认正面）
pub const TRIANGLE_INDICES: [u16; 3] = [0, 1, 2];

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(mem::size_of::<Vertex>(), 28, "Vertex size should be 28 bytes");
        assert_eq!(mem::align_of::<Vertex>(), 4, "Vertex alignment should be 4 bytes");

        let vertex = Vertex::default();
        let vertex_ptr = &vertex as *const Vertex as usize;
        let position_ptr = &vertex.position as *const [f32; 3] as usize;
        let color_ptr = &vertex.color as *const [f32; 4] as usize;

        assert_eq!(position_ptr - vertex_ptr, 0, "position should be at offset 0");
        assert_eq!(color_ptr - vertex_ptr, COLOR_OFFSET as usize);
    }

    #[test]
    fn test_triangle_data() {
        assert_eq!(TRIANGLE_INDICES.len(), 3);
        assert!(TRIANGLE_INDICES.iter().all(|&i| (i as usize) < TRIANGLE_VERTICES.len()));

        // 所有顶点都在 NDC 范围内
        for v in TRIANGLE_VERTICES.iter() {
            assert!(v.position[0].abs() <= 1.0 && v.position[1].abs() <= 1.0);
            assert!((0.0..=1.0).contains(&v.position[2]));
            assert_eq!(v.color[3], 1.0);
        }
    }

    #[test]
    fn test_triangle_winding_is_clockwise() {
        let [a, b, c] = TRIANGLE_INDICES.map(|i| TRIANGLE_VERTICES[i as usize].position);
        let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
        assert!(cross < 0.0);
    }

    #[test]
    fn test_pod_bytes() {
        let bytes: &[u8] = bytemuck::cast_slice(&TRIANGLE_VERTICES);
        assert_eq!(bytes.len(), 3 * 28);
    }
}
