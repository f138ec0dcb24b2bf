// geometry/mod.rs
// 变换、插值与相机
pub mod camera;
pub mod interpolation;
pub mod transform;
