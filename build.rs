/// Build script for HelloDX12
///
/// # Shader Strategy:
/// - Pre-compiled byte-code (shaders/triangle_vs.cso, shaders/triangle_ps.cso) is read at runtime
/// - If it is missing, shaders/triangle.hlsl is compiled at runtime via D3DCompile
fn main() {
    println!("cargo:rerun-if-changed=shaders/triangle.hlsl");
}
