use glam::Vec3;

use crate::config::OrbitSpec;

/// Circular orbit around the origin with a fixed height offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitParameters {
    pub radius: f32,
    /// Radians per second; the sign sets the direction.
    pub speed: f32,
    /// Tilt of the orbit, in radians.
    pub inclination: f32,
}

impl OrbitParameters {
    pub fn position_at(&self, t: f32) -> Vec3 {
        let angle = self.speed * t;
        // y does not depend on t: the body circles on a plane lifted by
        // sin(inclination) * radius rather than on a tilted plane.
        Vec3::new(
            angle.cos() * self.radius,
            self.inclination.sin() * self.radius,
            angle.sin() * self.radius,
        )
    }
}

impl From<OrbitSpec> for OrbitParameters {
    fn from(spec: OrbitSpec) -> Self {
        Self {
            radius: spec.radius,
            speed: spec.speed,
            inclination: spec.inclination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const EPS: f32 = 1e-5;

    fn first() -> OrbitParameters {
        OrbitParameters { radius: 1.0, speed: 1.0, inclination: PI / 2.0 }
    }

    fn second() -> OrbitParameters {
        OrbitParameters { radius: 1.0, speed: -1.0, inclination: -PI / 6.0 }
    }

    #[test]
    fn starting_positions() {
        assert!(first().position_at(0.0).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), EPS));
        assert!(second().position_at(0.0).abs_diff_eq(Vec3::new(1.0, -0.5, 0.0), EPS));
    }

    #[test]
    fn half_turn_at_pi() {
        assert!(first().position_at(PI).abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), EPS));
    }

    #[test]
    fn height_is_constant_and_xz_stays_on_circle() {
        let orbit = OrbitParameters { radius: 2.5, speed: 0.7, inclination: 0.3 };
        let y0 = orbit.position_at(0.0).y;
        for i in 0..200 {
            let p = orbit.position_at(i as f32 * 0.173);
            assert!((p.y - y0).abs() < EPS);
            assert!(((p.x * p.x + p.z * p.z).sqrt() - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn angular_velocity_matches_speed() {
        let orbit = second();
        let dt = 0.01;
        let a = orbit.position_at(1.0);
        let b = orbit.position_at(1.0 + dt);
        let da = b.z.atan2(b.x) - a.z.atan2(a.x);
        assert!((da / dt - orbit.speed).abs() < 1e-2);
    }
}
