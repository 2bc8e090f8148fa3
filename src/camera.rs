use bevy::{
    log::{info, warn},
    prelude::*,
    transform::TransformSystem,
};
use bevy_atmosphere::prelude::AtmosphereCamera;
use bevy_fly_camera::{FlyCamera, FlyCameraPlugin};

use crate::{circle_control_points, config::CameraConfig, BezierPath, BoundingRegion, PathError};

const FAR_PLANE: f32 = 10000.;

/// Scene camera state layered on top of free flight: the region it may move
/// in and an optional bezier path it can play back.
#[derive(Component, Debug, Default)]
pub struct SceneCamera {
    pub bounds: BoundingRegion,
    pub path: Option<BezierPath>,
    pub playing: bool,
    pub look_at: Vec3,
    pub path_samples: usize,
    pub orbit_radius: f32,
    pub orbit_height: f32,
    last_valid: Option<Vec3>,
}

impl SceneCamera {
    pub fn new(config: &CameraConfig, bounds: BoundingRegion) -> Self {
        Self {
            bounds,
            path: None,
            playing: false,
            look_at: config.look_at,
            path_samples: config.path_samples,
            orbit_radius: config.orbit_radius,
            orbit_height: config.orbit_height,
            last_valid: None,
        }
    }

    /// Accepts `proposed` if it stays in bounds, otherwise returns the last
    /// accepted position. The first position and anything set by path
    /// playback are taken as-is.
    pub fn constrain(&mut self, proposed: Vec3) -> Vec3 {
        let position = match self.last_valid {
            Some(current) if !self.playing => self.bounds.try_move(current, proposed),
            _ => proposed,
        };
        self.last_valid = Some(position);
        position
    }

    /// Replaces the path with a closed orbit around `center` and looks at it.
    pub fn orbit_around(&mut self, center: Vec3) -> Result<(), PathError> {
        let control_points = circle_control_points(center, self.orbit_radius, self.orbit_height);
        self.path = Some(BezierPath::new(&control_points, self.path_samples)?);
        self.look_at = center;
        Ok(())
    }

    /// The next path position while playing.
    pub fn advance(&mut self) -> Option<Vec3> {
        if !self.playing {
            return None;
        }
        self.path.as_mut()?.next_point()
    }

    pub fn reverse_direction(&mut self) {
        if let Some(path) = self.path.as_mut() {
            path.reverse_direction();
        }
    }
}

/// Fly-camera `(yaw, pitch)` in degrees that faces along `direction`.
pub fn yaw_pitch_towards(direction: Vec3) -> (f32, f32) {
    let d = direction.normalize_or_zero();
    if d == Vec3::ZERO {
        return (0., 0.);
    }
    let yaw = (-d.x).atan2(-d.z).to_degrees();
    let pitch = (-d.y).clamp(-1., 1.).asin().to_degrees();
    (yaw, pitch)
}

pub fn perspective() -> Projection {
    Projection::Perspective(PerspectiveProjection {
        far: FAR_PLANE,
        ..default()
    })
}

pub fn orthographic() -> Projection {
    Projection::Orthographic(OrthographicProjection {
        far: FAR_PLANE,
        ..default()
    })
}

pub fn toggle_projection(projection: &mut Projection) {
    *projection = match projection {
        Projection::Perspective(_) => orthographic(),
        Projection::Orthographic(_) => perspective(),
    };
}

pub fn spawn_camera(commands: &mut Commands, config: &CameraConfig, bounds: BoundingRegion) {
    let (yaw, pitch) = yaw_pitch_towards(config.look_at - config.start);

    commands
        .spawn(Camera3dBundle {
            transform: Transform::from_translation(config.start).looking_at(config.look_at, Vec3::Y),
            projection: perspective(),
            ..default()
        })
        .insert(FlyCamera {
            accel: 10.,
            max_speed: 10.95,
            yaw,
            pitch,
            ..default()
        })
        .insert(AtmosphereCamera::default())
        .insert(SceneCamera::new(config, bounds));
}

pub fn camera_keys(
    keys: Res<Input<KeyCode>>,
    mut cameras: Query<(&mut SceneCamera, &Transform, &mut FlyCamera, &mut Projection)>,
) {
    for (mut camera, transform, mut fly, mut projection) in cameras.iter_mut() {
        if keys.just_pressed(KeyCode::C) || (keys.just_pressed(KeyCode::P) && camera.path.is_none()) {
            if let Err(err) = camera.orbit_around(transform.translation) {
                warn!("Cannot build camera orbit: {err}");
            }
        }

        if keys.just_pressed(KeyCode::P) && camera.path.is_some() {
            camera.playing = !camera.playing;
            fly.enabled = !camera.playing;
            fly.velocity = Vec3::ZERO;

            if !camera.playing {
                let (yaw, pitch) = yaw_pitch_towards(transform.forward());
                fly.yaw = yaw;
                fly.pitch = pitch;
            }
            info!("Camera path playback {}", if camera.playing { "on" } else { "off" });
        }

        if keys.just_pressed(KeyCode::R) {
            camera.reverse_direction();
        }

        if keys.just_pressed(KeyCode::O) {
            toggle_projection(&mut projection);
        }
    }
}

pub fn follow_path(mut cameras: Query<(&mut SceneCamera, &mut Transform)>) {
    for (mut camera, mut transform) in cameras.iter_mut() {
        if let Some(position) = camera.advance() {
            transform.translation = position;
            transform.look_at(camera.look_at, Vec3::Y);
        }
    }
}

pub fn constrain_camera(mut cameras: Query<(&mut SceneCamera, &mut Transform)>) {
    for (mut camera, mut transform) in cameras.iter_mut() {
        let position = camera.constrain(transform.translation);
        if position != transform.translation {
            transform.translation = position;
        }
    }
}

pub struct SceneCameraPlugin;

impl Plugin for SceneCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugin(FlyCameraPlugin)
            .add_system(camera_keys)
            .add_system(follow_path.after(camera_keys))
            .add_system(
                constrain_camera
                    .in_base_set(CoreSet::PostUpdate)
                    .before(TransformSystem::TransformPropagate),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(bounds: BoundingRegion) -> SceneCamera {
        SceneCamera::new(&CameraConfig::default(), bounds)
    }

    #[test]
    fn moves_out_of_bounds_are_rejected() {
        let mut camera = camera(BoundingRegion::default().with_y_bounds(0., 100.));

        assert_eq!(camera.constrain(Vec3::new(0., 50., 0.)), Vec3::new(0., 50., 0.));
        assert_eq!(camera.constrain(Vec3::new(5., 150., 0.)), Vec3::new(0., 50., 0.));
        assert_eq!(camera.constrain(Vec3::new(5., 60., 0.)), Vec3::new(5., 60., 0.));
    }

    #[test]
    fn path_playback_ignores_bounds() {
        let mut camera = camera(BoundingRegion::default().with_y_bounds(0., 100.));
        camera.constrain(Vec3::new(0., 50., 0.));
        camera.playing = true;

        assert_eq!(camera.constrain(Vec3::new(0., 500., 0.)), Vec3::new(0., 500., 0.));
    }

    #[test]
    fn orbit_starts_next_to_center() {
        let mut camera = camera(BoundingRegion::default());
        let center = Vec3::new(100., 20., -300.);
        camera.orbit_around(center).unwrap();

        assert_eq!(camera.look_at, center);
        assert_eq!(camera.advance(), None);

        camera.playing = true;
        let first = camera.advance().unwrap();
        let path = camera.path.as_ref().unwrap();
        assert_eq!(path.samples().len(), CameraConfig::default().path_samples);
        assert_eq!(first, path.samples()[1]);
        assert!(
            (path.samples()[0] - (center + Vec3::new(camera.orbit_radius, camera.orbit_height, 0.))).length()
                < 1e-2
        );
    }

    #[test]
    fn yaw_pitch_matches_fly_camera_rotation() {
        for direction in [
            Vec3::new(0., 0., -1.),
            Vec3::new(1., -1., -1.),
            Vec3::new(-3., 0.5, 2.),
        ] {
            let (yaw, pitch) = yaw_pitch_towards(direction);
            let rotation = Quat::from_axis_angle(Vec3::Y, yaw.to_radians())
                * Quat::from_axis_angle(-Vec3::X, pitch.to_radians());

            assert!((rotation * -Vec3::Z - direction.normalize()).length() < 1e-4);
        }
    }

    #[test]
    fn projection_toggles_both_ways() {
        let mut projection = perspective();

        toggle_projection(&mut projection);
        assert!(matches!(projection, Projection::Orthographic(_)));
        toggle_projection(&mut projection);
        assert!(matches!(projection, Projection::Perspective(_)));
    }

    #[test]
    fn path_key_starts_orbit_playback() {
        let mut app = App::new();
        app.insert_resource(Input::<KeyCode>::default())
            .add_system(camera_keys)
            .add_system(follow_path.after(camera_keys));

        let start = Vec3::new(10., 20., 30.);
        let id = app
            .world
            .spawn((
                camera(BoundingRegion::default()),
                Transform::from_translation(start),
                FlyCamera::default(),
                perspective(),
            ))
            .id();

        app.world.resource_mut::<Input<KeyCode>>().press(KeyCode::P);
        app.update();

        let scene_camera = app.world.get::<SceneCamera>(id).unwrap();
        assert!(scene_camera.playing);
        assert_eq!(scene_camera.look_at, start);
        assert!(!app.world.get::<FlyCamera>(id).unwrap().enabled);

        let moved_to = app.world.get::<Transform>(id).unwrap().translation;
        assert_eq!(moved_to, scene_camera.path.as_ref().unwrap().samples()[1]);
    }

    #[test]
    fn constrain_system_reverts_escaping_moves() {
        let mut app = App::new();
        app.add_system(constrain_camera);

        let id = app
            .world
            .spawn((
                camera(BoundingRegion::default().with_y_bounds(0., 100.)),
                Transform::from_xyz(0., 50., 0.),
            ))
            .id();
        app.update();

        app.world.get_mut::<Transform>(id).unwrap().translation.y = 500.;
        app.update();

        assert_eq!(app.world.get::<Transform>(id).unwrap().translation, Vec3::new(0., 50., 0.));
    }
}
