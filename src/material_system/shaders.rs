//! # 片元着色策略
//!
//! 每个三角形在光栅化前构造一个 [`TriangleShader`]，之后对覆盖的每个像素
//! 以重心坐标调用 [`FragmentShader::fragment`] 得到打包颜色。
//! 着色器只借用光源与材质，构造开销很小，可以在工作线程内逐三角形创建。

use crate::geometry::interpolation::{
    interpolate_normal, interpolate_point, perspective_correct_uv,
};
use crate::material_system::color::{Color, color_to_packed, rescale_to_unit};
use crate::material_system::light::Light;
use crate::material_system::materials::{Material, tbn};
use crate::material_system::texture::TextureProvider;
use nalgebra::{Point3, Vector2, Vector3};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 平面着色的环境光下限
pub const FLAT_AMBIENT: f32 = 0.1;

/// 渲染模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingMode {
    /// 仅绘制三角形边
    Wireframe,
    #[default]
    Flat,
    Phong,
    Textured,
}

impl FromStr for ShadingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wireframe" | "line" | "lines" => Ok(ShadingMode::Wireframe),
            "flat" | "lambert" => Ok(ShadingMode::Flat),
            "phong" => Ok(ShadingMode::Phong),
            "textured" | "texture" => Ok(ShadingMode::Textured),
            other => Err(format!(
                "未知的渲染模式 \"{other}\"，可选: wireframe, flat, phong, textured"
            )),
        }
    }
}

impl fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShadingMode::Wireframe => "wireframe",
            ShadingMode::Flat => "flat",
            ShadingMode::Phong => "phong",
            ShadingMode::Textured => "textured",
        };
        f.write_str(name)
    }
}

/// 由重心坐标计算片元颜色
pub trait FragmentShader {
    fn fragment(&self, bary: &Vector3<f32>) -> u32;
}

/// 构造三角形着色器所需的逐顶点数据
#[derive(Debug, Clone, Copy)]
pub struct ShadingInput<'a> {
    pub world: [Point3<f32>; 3],
    pub normals: [Vector3<f32>; 3],
    pub uvs: [Vector2<f32>; 3],
    /// 三个顶点裁剪空间 w 的倒数
    pub inv_w: [f32; 3],
    pub eye: Point3<f32>,
    pub lights: &'a [Light],
    pub material: &'a Material,
}

impl ShadingInput<'_> {
    fn face_normal(&self) -> Option<Vector3<f32>> {
        (self.world[1] - self.world[0])
            .cross(&(self.world[2] - self.world[0]))
            .try_normalize(1e-12)
    }

    fn centroid(&self) -> Point3<f32> {
        Point3::from((self.world[0].coords + self.world[1].coords + self.world[2].coords) / 3.0)
    }
}

#[inline]
fn reflect(incident: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    incident - normal * (2.0 * normal.dot(incident))
}

/// 平面着色：整个三角形一种颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatShader {
    color: u32,
}

impl FlatShader {
    /// 在重心处以面法线对所有光源做 Lambert 求和，只计算一次
    pub fn new(input: &ShadingInput<'_>) -> Self {
        let mut intensity = Color::new(FLAT_AMBIENT, FLAT_AMBIENT, FLAT_AMBIENT);
        if let Some(normal) = input.face_normal() {
            let centroid = input.centroid();
            for light in input.lights {
                let n_dot_l = normal.dot(&light.get_direction(&centroid)).max(0.0);
                intensity += light.get_intensity(&centroid) * n_dot_l;
            }
        }
        let color = rescale_to_unit(&intensity).component_mul(&input.material.albedo);
        Self {
            color: color_to_packed(&color),
        }
    }

    pub fn color(&self) -> u32 {
        self.color
    }
}

impl FragmentShader for FlatShader {
    #[inline]
    fn fragment(&self, _bary: &Vector3<f32>) -> u32 {
        self.color
    }
}

/// 逐像素 Phong 光照（环境 + 漫反射 + 镜面），使用第一个光源
#[derive(Debug, Clone, Copy)]
pub struct PhongShader<'a> {
    world: [Point3<f32>; 3],
    normals: [Vector3<f32>; 3],
    eye: Point3<f32>,
    light: Option<&'a Light>,
    material: &'a Material,
}

impl<'a> PhongShader<'a> {
    pub fn new(input: &ShadingInput<'a>) -> Self {
        Self {
            world: input.world,
            normals: input.normals,
            eye: input.eye,
            light: input.lights.first(),
            material: input.material,
        }
    }
}

impl FragmentShader for PhongShader<'_> {
    fn fragment(&self, bary: &Vector3<f32>) -> u32 {
        let material = self.material;
        let (Some(light), Some(normal)) = (self.light, interpolate_normal(bary, &self.normals))
        else {
            return color_to_packed(&material.ambient);
        };

        let frag_pos = interpolate_point(bary, &self.world);
        let light_dir = light.get_direction(&frag_pos);
        let light_color = light.get_intensity(&frag_pos);
        let view_dir = (self.eye - frag_pos).try_normalize(1e-12).unwrap_or(normal);

        let diffuse = normal.dot(&light_dir).max(0.0);
        let diffuse_color = light_color.component_mul(&material.diffuse) * diffuse;

        let reflect_dir = reflect(&-light_dir, &normal);
        let specular = view_dir.dot(&reflect_dir).max(0.0).powf(material.shininess);
        let specular_color = light_color.component_mul(&material.specular) * specular;

        color_to_packed(&(material.ambient + diffuse_color + specular_color))
    }
}

/// 贴图着色：透视校正 UV、法线贴图、漫反射与镜面贴图
#[derive(Debug, Clone, Copy)]
pub struct TextureShader<'a> {
    world: [Point3<f32>; 3],
    normals: [Vector3<f32>; 3],
    uvs: [Vector2<f32>; 3],
    inv_w: [f32; 3],
    tangent: Vector3<f32>,
    eye: Point3<f32>,
    light: Option<&'a Light>,
    material: &'a Material,
}

impl<'a> TextureShader<'a> {
    pub fn new(input: &ShadingInput<'a>) -> Self {
        Self {
            world: input.world,
            normals: input.normals,
            uvs: input.uvs,
            inv_w: input.inv_w,
            tangent: tbn::compute_tangent(&input.world, &input.uvs),
            eye: input.eye,
            light: input.lights.first(),
            material: input.material,
        }
    }

    /// 片元的纹理坐标，已截断到 [0, 1]
    pub fn uv_at(&self, bary: &Vector3<f32>) -> Vector2<f32> {
        let uv = perspective_correct_uv(bary, &self.uvs, &self.inv_w);
        Vector2::new(uv.x.clamp(0.0, 1.0), uv.y.clamp(0.0, 1.0))
    }
}

impl FragmentShader for TextureShader<'_> {
    fn fragment(&self, bary: &Vector3<f32>) -> u32 {
        let material = self.material;
        let uv = self.uv_at(bary);
        // 图像第一行对应 v = 1
        let (u, v) = (uv.x, 1.0 - uv.y);

        let sample = |map: &Option<Arc<dyn TextureProvider>>, fallback: &Color| {
            map.as_deref()
                .map_or(*fallback, |texture| material.sampling.sample(texture, u, v))
        };
        let diffuse_color = sample(&material.diffuse_map, &material.diffuse);
        let specular_color = sample(&material.specular_map, &material.specular);

        let Some(surface_normal) = interpolate_normal(bary, &self.normals) else {
            return color_to_packed(&material.ambient.component_mul(&diffuse_color));
        };
        let normal = match material.normal_map.as_deref() {
            Some(map) => {
                let (t, b) = tbn::orthonormal_basis(&self.tangent, &surface_normal);
                let encoded = material.sampling.sample(map, u, v) * 2.0 - Vector3::repeat(1.0);
                (t * encoded.x + b * encoded.y + surface_normal * encoded.z)
                    .try_normalize(1e-12)
                    .unwrap_or(surface_normal)
            }
            None => surface_normal,
        };

        let ambient = material.ambient.component_mul(&diffuse_color);
        let Some(light) = self.light else {
            return color_to_packed(&ambient);
        };

        let frag_pos = interpolate_point(bary, &self.world);
        let light_dir = light.get_direction(&frag_pos);
        let light_color = light.get_intensity(&frag_pos);
        let view_dir = (self.eye - frag_pos).try_normalize(1e-12).unwrap_or(normal);

        let diffuse = normal.dot(&light_dir).max(0.0);
        let reflect_dir = reflect(&-light_dir, &normal);
        let specular = view_dir.dot(&reflect_dir).max(0.0).powf(material.shininess);

        let color = ambient
            + light_color.component_mul(&diffuse_color) * diffuse
            + light_color.component_mul(&specular_color) * specular;
        color_to_packed(&color)
    }
}

/// 三种着色策略的静态分派
#[derive(Debug, Clone, Copy)]
pub enum TriangleShader<'a> {
    Flat(FlatShader),
    Phong(PhongShader<'a>),
    Textured(TextureShader<'a>),
}

impl<'a> TriangleShader<'a> {
    /// 按渲染模式构造，线框模式没有片元着色器
    pub fn for_mode(mode: ShadingMode, input: &ShadingInput<'a>) -> Option<Self> {
        match mode {
            ShadingMode::Wireframe => None,
            ShadingMode::Flat => Some(TriangleShader::Flat(FlatShader::new(input))),
            ShadingMode::Phong => Some(TriangleShader::Phong(PhongShader::new(input))),
            ShadingMode::Textured => Some(TriangleShader::Textured(TextureShader::new(input))),
        }
    }
}

impl FragmentShader for TriangleShader<'_> {
    #[inline]
    fn fragment(&self, bary: &Vector3<f32>) -> u32 {
        match self {
            TriangleShader::Flat(shader) => shader.fragment(bary),
            TriangleShader::Phong(shader) => shader.fragment(bary),
            TriangleShader::Textured(shader) => shader.fragment(bary),
        }
    }
}
