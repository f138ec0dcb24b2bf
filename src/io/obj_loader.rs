use crate::core::error::RenderResult;
use crate::io::mesh::{FaceIndex, Mesh, generate_smooth_vertex_normals};
use log::{debug, info, warn};
use nalgebra::{Point3, Vector2, Vector3};
use std::path::{Path, PathBuf};

/// OBJ 加载结果：合并后的网格以及 MTL 中引用的贴图路径
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub mesh: Mesh,
    pub diffuse_texture: Option<PathBuf>,
    pub normal_texture: Option<PathBuf>,
    pub specular_texture: Option<PathBuf>,
}

/// 从文件路径中提取基本文件名（不含扩展名）
fn get_basename_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 加载 OBJ 文件，所有子模型合并为一个网格
///
/// 缺失法线时按面平均生成平滑法线；缺失 UV 时所有角共用 (0, 0)。
pub fn load_obj_model<P: AsRef<Path>>(obj_path: P) -> RenderResult<LoadedModel> {
    let obj_path = obj_path.as_ref();
    info!("加载 OBJ 文件: {:?}", obj_path);
    let base_path = obj_path.parent().unwrap_or_else(|| Path::new("."));

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
    };
    let (models, materials_result) = tobj::load_obj(obj_path, &load_options)?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut faces = Vec::new();
    let mut needs_smooth_normals = false;
    let mut needs_default_uv = false;

    for model in &models {
        let mesh = &model.mesh;
        let vertex_offset = positions.len();
        let normal_offset = normals.len();
        let uv_offset = uvs.len();

        positions.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Point3::new(p[0], p[1], p[2])),
        );
        normals.extend(
            mesh.normals
                .chunks_exact(3)
                .map(|n| Vector3::new(n[0], n[1], n[2])),
        );
        uvs.extend(mesh.texcoords.chunks_exact(2).map(|t| Vector2::new(t[0], t[1])));

        let has_normals = mesh.normal_indices.len() == mesh.indices.len();
        let has_uvs = mesh.texcoord_indices.len() == mesh.indices.len();
        needs_smooth_normals |= !has_normals;
        needs_default_uv |= !has_uvs;

        debug!(
            "子模型 '{}': {} 个顶点, {} 个三角形, 法线: {}, UV: {}",
            model.name,
            mesh.positions.len() / 3,
            mesh.indices.len() / 3,
            has_normals,
            has_uvs
        );

        for (tri, corners) in mesh.indices.chunks_exact(3).enumerate() {
            let mut face = [FaceIndex::default(); 3];
            for (k, corner) in face.iter_mut().enumerate() {
                let i = tri * 3 + k;
                let vertex = vertex_offset + corners[k] as usize;
                corner.vertex = vertex;
                // 缺失的索引先标记，合并完所有子模型后统一补齐
                corner.normal = if has_normals {
                    normal_offset + mesh.normal_indices[i] as usize
                } else {
                    usize::MAX
                };
                corner.uv = if has_uvs {
                    uv_offset + mesh.texcoord_indices[i] as usize
                } else {
                    usize::MAX
                };
            }
            faces.push(face);
        }
    }

    if needs_smooth_normals {
        warn!("OBJ 缺少部分法线，生成平滑顶点法线");
        let triangles: Vec<[usize; 3]> = faces
            .iter()
            .map(|f| [f[0].vertex, f[1].vertex, f[2].vertex])
            .collect();
        let smooth_offset = normals.len();
        normals.extend(generate_smooth_vertex_normals(&positions, &triangles));
        for corner in faces.iter_mut().flatten() {
            if corner.normal == usize::MAX {
                corner.normal = smooth_offset + corner.vertex;
            }
        }
    }
    if needs_default_uv {
        let default_uv = uvs.len();
        uvs.push(Vector2::zeros());
        for corner in faces.iter_mut().flatten() {
            if corner.uv == usize::MAX {
                corner.uv = default_uv;
            }
        }
    }

    let mesh = Mesh::new(
        get_basename_from_path(obj_path),
        positions,
        normals,
        uvs,
        faces,
    )?;
    info!(
        "网格 '{}' 加载完成: {} 个顶点, {} 个三角形",
        mesh.name,
        mesh.positions().len(),
        mesh.faces().len()
    );

    let mut loaded = LoadedModel {
        mesh,
        diffuse_texture: None,
        normal_texture: None,
        specular_texture: None,
    };

    match materials_result {
        Ok(materials) => {
            if let Some(material) = materials.first() {
                info!("从 MTL 加载了 {} 个材质，使用 '{}'", materials.len(), material.name);
                let resolve = |name: &Option<String>| name.as_ref().map(|n| base_path.join(n));
                loaded.diffuse_texture = resolve(&material.diffuse_texture);
                loaded.normal_texture = resolve(&material.normal_texture);
                loaded.specular_texture = resolve(&material.specular_texture);
            }
        }
        Err(e) => warn!("加载 MTL 材质失败: {}，使用默认材质", e),
    }

    Ok(loaded)
}
