use terrain_scene::{
    camera::{spawn_camera, SceneCameraPlugin},
    meshing::heightmap_to_grid_mesh,
    AnimatedBumpMap, HeightField, SceneConfig, TerrainTextures,
};

use bevy::{
    app::AppExit,
    pbr::wireframe::{Wireframe, WireframePlugin},
    prelude::*,
    render::{
        settings::{WgpuFeatures, WgpuSettings},
        RenderPlugin,
    },
};
use bevy_atmosphere::prelude::*;

const CONFIG_PATH: &str = "assets/scene.json";

#[derive(Component)]
struct Terrain;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(RenderPlugin {
            wgpu_settings: WgpuSettings {
                features: WgpuFeatures::POLYGON_MODE_LINE,
                ..default()
            },
        }))
        .add_plugin(WireframePlugin)
        .add_plugin(AtmospherePlugin)
        .add_plugin(SceneCameraPlugin)
        .add_startup_system(load_config.in_base_set(StartupSet::PreStartup))
        .add_startup_system(setup_scene.run_if(resource_exists::<SceneConfig>()))
        .add_system(animate_terrain.run_if(resource_exists::<TerrainTextures>()))
        .add_system(toggle_wireframe)
        .add_system(bevy::window::close_on_esc)
        .run();
}

fn load_config(mut commands: Commands, mut exit: EventWriter<AppExit>) {
    match SceneConfig::load_or_default(CONFIG_PATH) {
        Ok(config) => commands.insert_resource(config),
        Err(err) => {
            error!("{err}");
            exit.send(AppExit);
        }
    }
}

fn setup_scene(
    mut commands: Commands,
    config: Res<SceneConfig>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut exit: EventWriter<AppExit>,
) {
    let terrain = match HeightField::load(&config.heightmap) {
        Ok(terrain) => terrain,
        Err(err) => {
            error!("{err}");
            exit.send(AppExit);
            return;
        }
    };

    let textures = TerrainTextures {
        color: config.color_texture.as_deref().map(|path| asset_server.load(path)),
        bump_map: config.bump_map.as_deref().map(|path| asset_server.load(path)),
        animated_bump_map: config.animated_bump_map.as_ref().map(|animated| {
            AnimatedBumpMap::load(
                &asset_server,
                &animated.prefix,
                animated.number_of_frames,
                animated.frame_wait,
            )
        }),
        bump_mapping: config.bump_mapping,
    };

    let mesh = heightmap_to_grid_mesh(&terrain, &config.triangulation)
        .into_render_mesh(textures.has_bump_map());

    let mut material = StandardMaterial {
        base_color: if textures.color.is_some() {
            Color::WHITE
        } else {
            Color::rgb(1.0, 0.847, 0.569)
        },
        perceptual_roughness: 0.9,
        ..default()
    };
    textures.apply(&mut material);

    commands
        .spawn(PbrBundle {
            mesh: meshes.add(mesh),
            material: materials.add(material),
            ..default()
        })
        .insert(Terrain);

    commands.insert_resource(textures);

    spawn_camera(&mut commands, &config.camera, config.bounds);
    add_lights(&mut commands);
}

fn add_lights(commands: &mut Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::ORANGE_RED,
        brightness: 0.02,
    });

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 10000.,
            shadows_enabled: false,
            ..default()
        },
        transform: Transform::from_rotation(Quat::from_rotation_x(-0.25 * std::f32::consts::PI)),
        ..default()
    });
}

fn animate_terrain(
    keys: Res<Input<KeyCode>>,
    mut textures: ResMut<TerrainTextures>,
    terrain: Query<&Handle<StandardMaterial>, With<Terrain>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut changed = textures.step();

    if keys.just_pressed(KeyCode::B) {
        textures.toggle_bump_mapping();
        info!("Bump mapping {}", if textures.bump_mapping { "on" } else { "off" });
        changed = true;
    }

    if !changed {
        return;
    }

    for handle in terrain.iter() {
        if let Some(material) = materials.get_mut(handle) {
            textures.apply(material);
        }
    }
}

fn toggle_wireframe(
    mut commands: Commands,
    keys: Res<Input<KeyCode>>,
    terrain: Query<(Entity, Option<&Wireframe>), With<Terrain>>,
) {
    if !keys.just_pressed(KeyCode::F) {
        return;
    }

    for (entity, wireframe) in terrain.iter() {
        if wireframe.is_some() {
            commands.entity(entity).remove::<Wireframe>();
        } else {
            commands.entity(entity).insert(Wireframe);
        }
    }
}
