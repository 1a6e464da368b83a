use crate::controller::orbit_controls::{CameraOrbit, OrbitControls};
use crate::model::{Camera, Scene};

/// Advance every animated value to `elapsed` seconds.
///
/// Order matters only at the end: the orbit control runs after any scripted
/// camera write so its internal state matches the visible camera.
pub fn update_frame(
    scene: &mut Scene,
    camera: &mut Camera,
    controls: &mut OrbitControls,
    camera_orbit: Option<&CameraOrbit>,
    elapsed: f32,
) {
    // Shader time
    for state in scene.graph.shader_states_mut() {
        if state.has_time() {
            state.set_time(elapsed);
        }
    }

    // Large sphere spin, absolute
    let spin = scene.large_spin_speed * elapsed;
    scene.graph.node_mut(scene.large_sphere).transform.rotation.y = spin;

    // Orbiting spheres
    for body in &scene.orbiting {
        scene.graph.node_mut(body.node).transform.position = body.orbit.position_at(elapsed);
    }

    // Scripted camera (bloom variant)
    if let Some(orbit) = camera_orbit {
        orbit.apply(camera, elapsed);
    }

    controls.update(camera);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::model::TIME_UNIFORM;
    use glam::Vec3;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    struct Fixture {
        scene: Scene,
        camera: Camera,
        controls: OrbitControls,
    }

    fn fixture() -> Fixture {
        let config = SceneConfig::default();
        Fixture {
            scene: Scene::build(&config, &mut SmallRng::seed_from_u64(5)),
            camera: Camera::new(&config.camera, 4.0 / 3.0),
            controls: OrbitControls::new(config.camera.damping_factor),
        }
    }

    impl Fixture {
        fn tick(&mut self, t: f32, orbit: Option<&CameraOrbit>) {
            update_frame(&mut self.scene, &mut self.camera, &mut self.controls, orbit, t);
        }

        fn small(&self, i: usize) -> Vec3 {
            self.scene.position_of(self.scene.orbiting[i].node)
        }

        fn spin(&self) -> f32 {
            self.scene.graph.node(self.scene.large_sphere).transform.rotation.y
        }
    }

    #[test]
    fn state_at_time_zero() {
        let mut f = fixture();
        f.tick(0.0, None);
        assert_eq!(f.spin(), 0.0);
        assert!(f.small(0).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
        assert!(f.small(1).abs_diff_eq(Vec3::new(1.0, -0.5, 0.0), 1e-5));
    }

    #[test]
    fn state_at_time_pi() {
        let mut f = fixture();
        f.tick(PI, None);
        assert!(f.small(0).abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), 1e-5));
        assert!((f.spin() - 0.1 * PI).abs() < 1e-6);
    }

    #[test]
    fn time_uniform_is_exact_pass_through() {
        let mut f = fixture();
        for t in [0.0, 0.016, 1.5, 1234.5678] {
            f.tick(t, None);
            let state = f.scene.graph.shader_state(f.scene.glow_state);
            assert_eq!(state.float(TIME_UNIFORM), Some(t));
        }
    }

    #[test]
    fn rotation_is_absolute_not_accumulated() {
        let mut a = fixture();
        for i in 0..100 {
            a.tick(i as f32 * 0.05, None);
        }
        a.tick(4.0, None);

        let mut b = fixture();
        b.tick(4.0, None);
        b.tick(4.0, None);

        assert_eq!(a.spin(), b.spin());
        assert!((a.spin() - 0.4).abs() < 1e-6);
        assert_eq!(a.small(0), b.small(0));
        assert_eq!(a.small(1), b.small(1));
    }

    #[test]
    fn inner_spheres_ride_along() {
        let mut f = fixture();
        f.tick(2.0, None);
        for body in &f.scene.orbiting {
            let inner = f.scene.graph.node(body.node).children()[0];
            let world = f.scene.graph.world_matrix(inner).w_axis.truncate();
            assert!(world.abs_diff_eq(body.orbit.position_at(2.0), 1e-6));
        }
    }

    #[test]
    fn camera_is_untouched_without_scripted_orbit() {
        let mut f = fixture();
        f.tick(3.0, None);
        assert!(f.camera.eye.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-4));
    }

    #[test]
    fn scripted_orbit_moves_camera_around_origin() {
        let mut f = fixture();
        let orbit = CameraOrbit { radius: 5.0, speed: 0.1 };
        f.tick(5.0 * PI, Some(&orbit));
        assert!(f.camera.eye.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-3));
        assert!(f.camera.forward().abs_diff_eq(Vec3::NEG_X, 1e-3));
    }

    #[test]
    fn scripted_orbit_overrides_drag_on_next_tick() {
        let mut f = fixture();
        let orbit = CameraOrbit { radius: 5.0, speed: 0.1 };
        f.controls.rotate_left(1.0);
        f.tick(0.0, Some(&orbit));
        let dragged = f.camera.eye;
        assert!(dragged.x.abs() > 1e-3);

        // Next tick the scripted write wins again, leaving only the newest
        // damped share of the drag.
        f.tick(0.0, Some(&orbit));
        assert!(f.camera.eye.x.abs() < dragged.x.abs());
    }
}
