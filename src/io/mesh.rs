use crate::core::error::{RenderError, RenderResult};
use log::warn;
use nalgebra::{Point3, Vector2, Vector3};

/// 三角形一个角的索引三元组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceIndex {
    pub vertex: usize,
    pub normal: usize,
    pub uv: usize,
}

impl FaceIndex {
    pub fn new(vertex: usize, normal: usize, uv: usize) -> Self {
        Self { vertex, normal, uv }
    }

    /// 三个数组共用同一套索引
    pub fn uniform(index: usize) -> Self {
        Self::new(index, index, index)
    }
}

/// 渲染核心读取网格的接口，渲染期间只读
///
/// 实现者保证 `face` 返回的索引都在各自数组范围内。
pub trait MeshProvider: Send + Sync {
    fn vertex_count(&self) -> usize;
    fn normal_count(&self) -> usize;
    fn uv_count(&self) -> usize;
    fn face_count(&self) -> usize;

    fn position(&self, index: usize) -> Point3<f32>;
    fn normal(&self, index: usize) -> Vector3<f32>;
    fn uv(&self, index: usize) -> Vector2<f32>;
    fn face(&self, index: usize) -> [FaceIndex; 3];
}

/// 内存中的三角形网格
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    positions: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    uvs: Vec<Vector2<f32>>,
    faces: Vec<[FaceIndex; 3]>,
}

impl Mesh {
    /// 构造并校验所有面的索引
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Point3<f32>>,
        normals: Vec<Vector3<f32>>,
        uvs: Vec<Vector2<f32>>,
        faces: Vec<[FaceIndex; 3]>,
    ) -> RenderResult<Self> {
        for (face_index, face) in faces.iter().enumerate() {
            for corner in face {
                let checks = [
                    ("顶点", corner.vertex, positions.len()),
                    ("法线", corner.normal, normals.len()),
                    ("UV", corner.uv, uvs.len()),
                ];
                for (kind, index, len) in checks {
                    if index >= len {
                        return Err(RenderError::InvalidMesh {
                            face: face_index,
                            kind,
                            index,
                            len,
                        });
                    }
                }
            }
        }

        Ok(Self {
            name: name.into(),
            positions,
            normals,
            uvs,
            faces,
        })
    }

    /// 只有位置与三角形顶点索引时使用：生成平滑法线，UV 统一为 (0, 0)
    pub fn from_positions(
        name: impl Into<String>,
        positions: Vec<Point3<f32>>,
        triangles: &[[usize; 3]],
    ) -> RenderResult<Self> {
        let normals = generate_smooth_vertex_normals(&positions, triangles);
        let faces = triangles
            .iter()
            .map(|tri| {
                [
                    FaceIndex::new(tri[0], tri[0], 0),
                    FaceIndex::new(tri[1], tri[1], 0),
                    FaceIndex::new(tri[2], tri[2], 0),
                ]
            })
            .collect();
        Self::new(name, positions, normals, vec![Vector2::zeros()], faces)
    }

    /// 边长为 `size`、中心在原点的立方体，每个面各自带法线与 UV，逆时针朝外
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let corners = [
            Point3::new(-h, -h, -h),
            Point3::new(h, -h, -h),
            Point3::new(h, h, -h),
            Point3::new(-h, h, -h),
            Point3::new(-h, -h, h),
            Point3::new(h, -h, h),
            Point3::new(h, h, h),
            Point3::new(-h, h, h),
        ];
        // (四个角, 法线)，角按从外侧看逆时针排列
        let quads: [([usize; 4], Vector3<f32>); 6] = [
            ([4, 5, 6, 7], Vector3::z()),
            ([1, 0, 3, 2], -Vector3::z()),
            ([5, 1, 2, 6], Vector3::x()),
            ([0, 4, 7, 3], -Vector3::x()),
            ([7, 6, 2, 3], Vector3::y()),
            ([0, 1, 5, 4], -Vector3::y()),
        ];
        let uvs = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];

        let mut normals = Vec::with_capacity(6);
        let mut faces = Vec::with_capacity(12);
        for (n, (quad, normal)) in quads.iter().enumerate() {
            normals.push(*normal);
            let corner = |k: usize| FaceIndex::new(quad[k], n, k);
            faces.push([corner(0), corner(1), corner(2)]);
            faces.push([corner(0), corner(2), corner(3)]);
        }

        Mesh {
            name: "cube".to_string(),
            positions: corners.to_vec(),
            normals,
            uvs,
            faces,
        }
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn faces(&self) -> &[[FaceIndex; 3]] {
        &self.faces
    }
}

impl MeshProvider for Mesh {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn normal_count(&self) -> usize {
        self.normals.len()
    }

    fn uv_count(&self) -> usize {
        self.uvs.len()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn position(&self, index: usize) -> Point3<f32> {
        self.positions[index]
    }

    fn normal(&self, index: usize) -> Vector3<f32> {
        self.normals[index]
    }

    fn uv(&self, index: usize) -> Vector2<f32> {
        self.uvs[index]
    }

    fn face(&self, index: usize) -> [FaceIndex; 3] {
        self.faces[index]
    }
}

/// 面法线按面积加权累加到顶点后归一化，未使用的顶点取 +Y
pub fn generate_smooth_vertex_normals(
    positions: &[Point3<f32>],
    triangles: &[[usize; 3]],
) -> Vec<Vector3<f32>> {
    let mut vertex_normals = vec![Vector3::zeros(); positions.len()];

    for (i, tri) in triangles.iter().enumerate() {
        if tri.iter().any(|&idx| idx >= positions.len()) {
            warn!("面 {} 包含越界的顶点索引，跳过", i);
            continue;
        }
        let [i0, i1, i2] = *tri;
        let face_normal = (positions[i1] - positions[i0]).cross(&(positions[i2] - positions[i0]));
        vertex_normals[i0] += face_normal;
        vertex_normals[i1] += face_normal;
        vertex_normals[i2] += face_normal;
    }

    let mut zero_norm_count = 0;
    for normal in vertex_normals.iter_mut() {
        if normal.norm_squared() > 1e-12 {
            normal.normalize_mut();
        } else {
            *normal = Vector3::y();
            zero_norm_count += 1;
        }
    }
    if zero_norm_count > 0 {
        warn!("{} 个顶点的法线为零，设置为默认值 [0, 1, 0]", zero_norm_count);
    }

    vertex_normals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_index_is_rejected() {
        let result = Mesh::new(
            "bad",
            vec![Point3::origin(); 3],
            vec![Vector3::z()],
            vec![Vector2::zeros()],
            vec![[
                FaceIndex::uniform(0),
                FaceIndex::new(1, 0, 0),
                FaceIndex::new(2, 1, 0),
            ]],
        );
        match result {
            Err(RenderError::InvalidMesh {
                face, kind, index, len,
            }) => {
                assert_eq!((face, kind, index, len), (0, "法线", 1, 1));
            }
            other => panic!("期望 InvalidMesh，得到 {other:?}"),
        }
    }

    #[test]
    fn smooth_normals_for_flat_quad_point_up() {
        let mesh = Mesh::from_positions(
            "quad",
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        for i in 0..mesh.normal_count() {
            assert!((mesh.normal(i) - Vector3::y()).norm() < 1e-6);
        }
        assert_eq!(mesh.uv_count(), 1);
    }

    #[test]
    fn cube_faces_wind_outward() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.face_count(), 12);
        for f in 0..cube.face_count() {
            let [a, b, c] = cube.face(f);
            let (p0, p1, p2) = (cube.position(a.vertex), cube.position(b.vertex), cube.position(c.vertex));
            let geometric = (p1 - p0).cross(&(p2 - p0)).normalize();
            assert!((geometric - cube.normal(a.normal)).norm() < 1e-6, "面 {f}");
        }
    }
}
