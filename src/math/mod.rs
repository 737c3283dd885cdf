//! 数学库模块
//!
//! 基于 `nalgebra`，只保留三角形课程用到的类型和矩阵辅助函数。
//!
//! 约定与 DirectX 一致：左手坐标系，NDC 的 x/y 范围为 [-1, 1]，z 范围为 [0, 1]。

pub use nalgebra::{Matrix4 as Mat4, Vector3 as Vec3};

pub type Vector3 = Vec3<f32>;
pub type Matrix4 = Mat4<f32>;

/// 矩阵辅助函数
pub mod matrix {
    use super::*;

    /// 缩放矩阵
    pub fn scaling(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
    }

    /// 绕 z 轴旋转（弧度）
    pub fn rotation_z(angle: f32) -> Matrix4 {
        Matrix4::from_axis_angle(&Vector3::z_axis(), angle)
    }

    /// 宽高比修正矩阵
    ///
    /// 在非正方形窗口中把较长的一边压缩，使 NDC 中的单位正方形显示为正方形。
    /// 宽或高为 0（窗口最小化）时返回单位矩阵。
    pub fn aspect_correction(width: u32, height: u32) -> Matrix4 {
        if width == 0 || height == 0 {
            return Matrix4::identity();
        }

        let aspect = width as f32 / height as f32;
        if aspect >= 1.0 {
            scaling(1.0 / aspect, 1.0, 1.0)
        } else {
            scaling(1.0, aspect, 1.0)
        }
    }

    /// 转换为常量缓冲区中的布局
    ///
    /// HLSL cbuffer 默认按列主序打包，这里逐列展开；着色器中使用 `mul(transform, v)`。
    pub fn to_shader_layout(m: &Matrix4) -> [[f32; 4]; 4] {
        let mut out = [[0.0; 4]; 4];
        for (col, dst) in out.iter_mut().enumerate() {
            for (row, value) in dst.iter_mut().enumerate() {
                *value = m[(row, col)];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::matrix::*;
    use super::*;
    use nalgebra::Vector4;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_zero_rotation_is_identity() {
        assert!((rotation_z(0.0) - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let v = rotation_z(std::f32::consts::FRAC_PI_2) * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!(approx(v.x, 0.0));
        assert!(approx(v.y, 1.0));
    }

    #[test]
    fn test_aspect_correction_wide_window() {
        // 800x600：x 方向被压缩到 0.75
        let m = aspect_correction(800, 600);
        let v = m * Vector4::new(1.0, 1.0, 0.5, 1.0);
        assert!(approx(v.x * 800.0, v.y * 600.0));
        assert!(approx(v.y, 1.0));
        assert!(approx(v.z, 0.5));
    }

    #[test]
    fn test_aspect_correction_tall_window() {
        let m = aspect_correction(600, 800);
        let v = m * Vector4::new(1.0, 1.0, 0.0, 1.0);
        assert!(approx(v.x, 1.0));
        assert!(approx(v.x * 600.0, v.y * 800.0));
    }

    #[test]
    fn test_aspect_correction_minimized() {
        assert_eq!(aspect_correction(0, 600), Matrix4::identity());
    }

    #[test]
    fn test_shader_layout_is_column_major() {
        let m = Matrix4::new(
            1.0, 2.0, 3.0, 4.0,
            5.0, 6.0, 7.0, 8.0,
            9.0, 10.0, 11.0, 12.0,
            13.0, 14.0, 15.0, 16.0,
        );
        let rows = to_shader_layout(&m);
        // 第一组是原矩阵的第一列
        assert_eq!(rows[0], [1.0, 5.0, 9.0, 13.0]);
        assert_eq!(rows[3], [4.0, 8.0, 12.0, 16.0]);
    }
}
