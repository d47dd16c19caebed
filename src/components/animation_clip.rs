//! Animation clip component: timed float and quaternion tweens.
//!
//! A clip holds a duration and a list of tweens over properties of its
//! owning entity. Float tweens interpolate linearly through an easing
//! function, quaternion tweens use spherical interpolation. The start value
//! of every tween is captured when it is added; `start` arms the clip and
//! the start time latches from the world clock on the next update.

use std::any::Any;

use cgmath::Quaternion;
use instant::Duration;

use crate::entity::{Component, ComponentType, EntityState};

pub type FloatGetter = fn(&EntityState) -> f32;
pub type FloatSetter = fn(&mut EntityState, f32);
pub type QuaternionGetter = fn(&EntityState) -> Quaternion<f32>;
pub type QuaternionSetter = fn(&mut EntityState, Quaternion<f32>);

/// Maps linear progress in [0, 1] to eased progress.
pub type Easing = fn(f32) -> f32;

pub mod easing {
    pub fn linear(progress: f32) -> f32 {
        progress
    }

    pub fn smooth_step(progress: f32) -> f32 {
        progress * progress * (3.0 - 2.0 * progress)
    }
}

struct FloatTween {
    setter: FloatSetter,
    start: f32,
    end: f32,
    easing: Easing,
}

struct QuaternionTween {
    setter: QuaternionSetter,
    start: Quaternion<f32>,
    end: Quaternion<f32>,
    easing: Easing,
}

pub struct AnimationClip {
    duration: Duration,
    start_time: Option<Duration>,
    started: bool,
    floats: Vec<FloatTween>,
    quaternions: Vec<QuaternionTween>,
}

impl AnimationClip {
    pub fn new(duration_millis: u64) -> Self {
        Self {
            duration: Duration::from_millis(duration_millis),
            start_time: None,
            started: false,
            floats: Vec::new(),
            quaternions: Vec::new(),
        }
    }

    /// Adds a float tween from the property's current value to `end`.
    pub fn add_float(
        &mut self,
        state: &EntityState,
        getter: FloatGetter,
        setter: FloatSetter,
        end: f32,
        easing: Easing,
    ) {
        self.floats.push(FloatTween {
            setter,
            start: getter(state),
            end,
            easing,
        });
    }

    /// Adds a quaternion tween from the property's current value to `end`.
    pub fn add_quaternion(
        &mut self,
        state: &EntityState,
        getter: QuaternionGetter,
        setter: QuaternionSetter,
        end: Quaternion<f32>,
        easing: Easing,
    ) {
        self.quaternions.push(QuaternionTween {
            setter,
            start: getter(state),
            end,
            easing,
        });
    }

    /// Arms the clip. The start time latches on the next update.
    pub fn start(&mut self) {
        if self.floats.is_empty() && self.quaternions.is_empty() {
            log::warn!("tried to start an animation clip without anything to animate");
            return;
        }
        if self.started {
            return;
        }
        self.start_time = None;
        self.started = true;
    }

    pub fn stop(&mut self) {
        self.started = false;
        self.start_time = None;
    }

    pub fn started(&self) -> bool {
        self.started
    }
}

impl Component for AnimationClip {
    fn component_type(&self) -> ComponentType {
        ComponentType::AnimationClip
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn update(&mut self, state: &mut EntityState, time: Duration) {
        if !self.started {
            return;
        }
        let start_time = *self.start_time.get_or_insert(time);
        if time >= start_time + self.duration {
            self.started = false;
            self.start_time = None;
            return;
        }

        let progress = (time - start_time).as_secs_f32() / self.duration.as_secs_f32();

        for tween in self.floats.iter() {
            let eased = (tween.easing)(progress);
            let value = tween.start + (tween.end - tween.start) * eased;
            (tween.setter)(state, value);
        }
        for tween in self.quaternions.iter() {
            let eased = (tween.easing)(progress);
            let value = tween.start.slerp(tween.end, eased);
            (tween.setter)(state, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, InnerSpace, Rotation3};

    fn close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }

    #[test]
    fn float_tween_interpolates_linearly() {
        let mut state = EntityState::new();
        state.set_x(1.0);

        let mut clip = AnimationClip::new(2000);
        clip.add_float(&state, EntityState::x, EntityState::set_x, 5.0, easing::linear);
        clip.start();

        // First update latches the start time.
        clip.update(&mut state, Duration::from_secs(10));
        close(state.x(), 1.0);

        clip.update(&mut state, Duration::from_secs(11));
        close(state.x(), 3.0);

        clip.update(&mut state, Duration::from_millis(11_500));
        close(state.x(), 4.0);
    }

    #[test]
    fn quaternion_tween_slerps() {
        let mut state = EntityState::new();
        let end = Quaternion::from_angle_y(Deg(90.0));

        let mut clip = AnimationClip::new(1000);
        clip.add_quaternion(
            &state,
            EntityState::rotation,
            EntityState::set_rotation,
            end,
            easing::linear,
        );
        clip.start();

        clip.update(&mut state, Duration::from_secs(0));
        clip.update(&mut state, Duration::from_millis(500));

        let halfway = Quaternion::from_angle_y(Deg(45.0));
        close(state.rotation().dot(halfway).abs(), 1.0);
    }

    #[test]
    fn clip_clears_started_when_done() {
        let mut state = EntityState::new();
        let mut clip = AnimationClip::new(1000);
        clip.add_float(&state, EntityState::y, EntityState::set_y, 2.0, easing::linear);
        clip.start();
        assert!(clip.started());

        clip.update(&mut state, Duration::from_secs(5));
        clip.update(&mut state, Duration::from_secs(7));
        assert!(!clip.started());

        // Past the end the clip no longer mutates the entity.
        let y = state.y();
        clip.update(&mut state, Duration::from_secs(8));
        close(state.y(), y);
    }

    #[test]
    fn clip_can_be_restarted() {
        let mut state = EntityState::new();
        let mut clip = AnimationClip::new(1000);
        clip.add_float(&state, EntityState::z, EntityState::set_z, 4.0, easing::linear);

        clip.start();
        clip.update(&mut state, Duration::from_secs(1));
        clip.update(&mut state, Duration::from_secs(3));
        assert!(!clip.started());

        // A new start latches a fresh start time on the next update.
        clip.start();
        assert!(clip.started());
        clip.update(&mut state, Duration::from_secs(10));
        clip.update(&mut state, Duration::from_millis(10_500));
        close(state.z(), 2.0);
    }

    #[test]
    fn stop_disarms_the_clip() {
        let mut state = EntityState::new();
        let mut clip = AnimationClip::new(1000);
        clip.add_float(&state, EntityState::x, EntityState::set_x, 1.0, easing::linear);
        clip.start();
        clip.update(&mut state, Duration::from_secs(0));
        clip.stop();
        assert!(!clip.started());

        clip.update(&mut state, Duration::from_millis(500));
        close(state.x(), 0.0);
    }

    #[test]
    fn empty_clip_does_not_arm() {
        let mut clip = AnimationClip::new(1000);
        clip.start();
        assert!(!clip.started());
    }

    #[test]
    fn smooth_step_hits_the_endpoints() {
        close(easing::smooth_step(0.0), 0.0);
        close(easing::smooth_step(0.5), 0.5);
        close(easing::smooth_step(1.0), 1.0);
        assert!(easing::smooth_step(0.25) < 0.25);
        assert!(easing::smooth_step(0.75) > 0.75);
    }
}
