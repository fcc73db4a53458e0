//! Lighting model consumed by the rasterizer

use crate::math::Vec3;

/// Lighting interface: given the eye position, a surface point, the base
/// color and the surface normal, produce the lit color.
pub trait Light {
    fn get_color(&self, eye: Vec3, point: Vec3, base: Vec3, normal: Vec3) -> Vec3;
}

#[derive(Debug, Clone, Copy)]
pub enum LightKind {
    /// Parallel rays travelling along the stored direction.
    Directional(Vec3),
    /// Point source at the stored position.
    Point(Vec3),
}

/// Ambient + diffuse + specular light.
#[derive(Debug, Clone)]
pub struct PhongLight {
    pub kind: LightKind,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular_exp: f32,
}

impl PhongLight {
    pub fn directional(dir: Vec3) -> Self {
        Self {
            kind: LightKind::Directional(dir.normalize()),
            ambient: 0.4,
            diffuse: 0.6,
            specular_exp: 40.0,
        }
    }

    pub fn point(pos: Vec3) -> Self {
        Self {
            kind: LightKind::Point(pos),
            ambient: 0.4,
            diffuse: 0.6,
            specular_exp: 40.0,
        }
    }
}

impl Light for PhongLight {
    fn get_color(&self, eye: Vec3, point: Vec3, base: Vec3, normal: Vec3) -> Vec3 {
        let n = normal.normalize();
        let to_light = match self.kind {
            LightKind::Directional(dir) => -dir,
            LightKind::Point(pos) => (pos - point).normalize(),
        };

        let diffuse = n.dot(to_light).max(0.0);

        // Specular: reflect the light direction about the normal and
        // compare against the view direction.
        let reflected = n.scale(2.0 * n.dot(to_light)) - to_light;
        let to_eye = (eye - point).normalize();
        let specular = reflected.dot(to_eye).max(0.0).powf(self.specular_exp);

        base.scale(self.ambient + self.diffuse * diffuse) + Vec3::ONE.scale(specular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_light_brighter_than_facing_away() {
        let light = PhongLight::directional(Vec3::new(0.0, 0.0, -1.0));
        let eye = Vec3::new(0.0, 100.0, 100.0);
        let base = Vec3::new(0.5, 0.5, 0.5);
        let lit = light.get_color(eye, Vec3::ZERO, base, Vec3::new(0.0, 0.0, 1.0));
        let unlit = light.get_color(eye, Vec3::ZERO, base, Vec3::new(0.0, 0.0, -1.0));
        assert!(lit.x > unlit.x);
        // Facing away still receives the ambient term.
        assert!((unlit.x - 0.5 * 0.4).abs() < 1e-4);
    }

    #[test]
    fn test_point_light_attenuates_with_angle() {
        let light = PhongLight::point(Vec3::new(0.0, 10.0, 0.0));
        let eye = Vec3::new(0.0, 0.0, 50.0);
        let base = Vec3::ONE;
        let facing = light.get_color(eye, Vec3::ZERO, base, Vec3::new(0.0, 1.0, 0.0));
        let grazing = light.get_color(eye, Vec3::ZERO, base, Vec3::new(1.0, 0.0, 0.0));
        assert!(facing.y > grazing.y);
    }
}
