use nalgebra::{Point3, Vector3};

/// 光源类型
#[derive(Debug, Clone, Copy)]
pub enum Light {
    /// 定向光，direction表示光线传播的方向
    Directional {
        direction: Vector3<f32>,
        intensity: Vector3<f32>,
    },
    /// 点光源，带位置和衰减因子
    Point {
        position: Point3<f32>,
        intensity: Vector3<f32>,
        /// 衰减因子: (常数项, 一次项, 二次项)
        attenuation: (f32, f32, f32),
    },
}

impl Light {
    /// 创建定向光源
    pub fn directional(direction: Vector3<f32>, intensity: Vector3<f32>) -> Self {
        Light::Directional {
            direction: direction.normalize(),
            intensity,
        }
    }

    /// 创建点光源，默认不衰减
    pub fn point(
        position: Point3<f32>,
        intensity: Vector3<f32>,
        attenuation: Option<(f32, f32, f32)>,
    ) -> Self {
        Light::Point {
            position,
            intensity,
            attenuation: attenuation.unwrap_or((1.0, 0.0, 0.0)),
        }
    }

    /// 获取光源的方向（从表面点指向光源）
    pub fn get_direction(&self, point: &Point3<f32>) -> Vector3<f32> {
        match self {
            Light::Directional { direction, .. } => -direction,
            Light::Point { position, .. } => (position - point).normalize(),
        }
    }

    /// 计算光源在给定点的强度（考虑衰减）
    pub fn get_intensity(&self, point: &Point3<f32>) -> Vector3<f32> {
        match self {
            Light::Directional { intensity, .. } => *intensity,
            Light::Point {
                position,
                intensity,
                attenuation,
            } => {
                let distance = (position - point).magnitude();
                let (constant, linear, quadratic) = *attenuation;
                let attenuation_factor =
                    1.0 / (constant + linear * distance + quadratic * distance * distance);

                intensity * attenuation_factor
            }
        }
    }

    /// 跟随相机的点光源需要每帧更新位置
    pub fn with_position(self, new_position: Point3<f32>) -> Self {
        match self {
            Light::Point {
                intensity,
                attenuation,
                ..
            } => Light::Point {
                position: new_position,
                intensity,
                attenuation,
            },
            directional => directional,
        }
    }
}

/// 默认三光源布置：跟随相机的白光 + 红光 + 绿光
pub fn default_lights(eye: Point3<f32>) -> Vec<Light> {
    vec![
        Light::point(eye, Vector3::new(0.8, 0.8, 0.8), None),
        Light::point(Point3::new(2.0, 2.0, 0.0), Vector3::new(0.5, 0.0, 0.0), None),
        Light::point(Point3::new(-2.0, 2.0, 0.0), Vector3::new(0.0, 0.5, 0.0), None),
    ]
}
