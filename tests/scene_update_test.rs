//! Headless scene tests: entity/component dispatch and animation without a
//! GPU. Everything here runs through the public API only.

use std::time::Duration;

use sheep_ngin::{
    Deg, Quaternion, Rotation3, Vector3,
    components::{AnimationClip, animation_clip::easing},
    entity::{Entity, EntityState},
    scene::Scene,
};

fn close(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
}

#[test]
fn scene_update_drives_animation_clips() {
    let mut scene = Scene::new();

    let mut entity = Entity::new();
    let mut clip = AnimationClip::new(2000);
    clip.add_float(
        entity.state(),
        EntityState::x,
        EntityState::set_x,
        10.0,
        easing::linear,
    );
    clip.start();
    entity.add_component(Box::new(clip));
    let id = scene.add_entity(entity);

    // The first update latches the clip's start time.
    scene.update(Duration::from_secs(4));
    close(scene.entity(id).state().x(), 0.0);

    scene.update(Duration::from_secs(5));
    close(scene.entity(id).state().x(), 5.0);

    scene.update(Duration::from_millis(5500));
    close(scene.entity(id).state().x(), 7.5);

    // Past the end the clip disarms and stops mutating.
    scene.update(Duration::from_secs(7));
    let resting = scene.entity(id).state().x();
    scene.update(Duration::from_secs(8));
    close(scene.entity(id).state().x(), resting);
}

#[test]
fn scene_updates_entities_in_insertion_order() {
    let mut scene = Scene::new();

    let mut first = Entity::new();
    let mut clip = AnimationClip::new(1000);
    clip.add_float(
        first.state(),
        EntityState::y,
        EntityState::set_y,
        1.0,
        easing::linear,
    );
    clip.start();
    first.add_component(Box::new(clip));
    let first = scene.add_entity(first);

    let second = scene.add_entity(Entity::new());

    scene.update(Duration::from_secs(1));
    scene.update(Duration::from_millis(1500));

    close(scene.entity(first).state().y(), 0.5);
    close(scene.entity(second).state().y(), 0.0);
}

#[test]
fn quaternion_clip_rotates_an_entity_through_a_scene() {
    let mut scene = Scene::new();

    let mut entity = Entity::new();
    let end = Quaternion::from_angle_z(Deg(180.0));
    let mut clip = AnimationClip::new(4000);
    clip.add_quaternion(
        entity.state(),
        EntityState::rotation,
        EntityState::set_rotation,
        end,
        easing::linear,
    );
    clip.start();
    entity.add_component(Box::new(clip));
    let id = scene.add_entity(entity);

    scene.update(Duration::from_secs(0));
    scene.update(Duration::from_secs(1));

    // A quarter of the way towards 180 degrees about z.
    let rotation = scene.entity(id).state().rotation();
    let rotated = rotation * Vector3::unit_x();
    close(rotated.x, Deg(45.0_f32).0.to_radians().cos());
    close(rotated.y, Deg(45.0_f32).0.to_radians().sin());
}

#[test]
fn transforms_are_clean_after_update() {
    let mut scene = Scene::new();
    let mut entity = Entity::new();
    entity.state_mut().set_position(Vector3::new(2.0, 0.0, 0.0));
    let id = scene.add_entity(entity);

    assert!(scene.entity(id).state().is_dirty());
    scene.update(Duration::from_millis(16));
    assert!(!scene.entity(id).state().is_dirty());
    close(scene.entity(id).state().current_transform().w.x, 2.0);
}
