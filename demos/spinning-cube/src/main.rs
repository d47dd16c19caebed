//! Minimal cube demo.
//!
//! One camera, one light, one cube. An animation clip slides and tilts the
//! cube for the first few seconds; once it finishes the cube spins in place.
//! If a `model.obj` is present under `assets/` it replaces the cube
//! template.

use sheep_ngin::{
    Deg, DeviceEvent, Euler, Quaternion, Vector3, WindowEvent,
    components::{
        AnimationClip, Camera, CameraTarget, Light, MeshRenderer, animation_clip::easing,
    },
    context::{Context, InitContext},
    entity::{Component, Entity, EntityState},
    flow::{FlowConstructor, Out, SceneFlow},
    scene::{EntityId, Scene},
};

#[derive(Default)]
struct State;

enum Event {}

struct SpinningCube {
    scene: Scene,
    cube: EntityId,
}

impl SpinningCube {
    async fn new(init: InitContext) -> Self {
        let mut scene = Scene::new();

        let mut camera_entity = Entity::new();
        camera_entity
            .state_mut()
            .set_position(Vector3::new(0.0, 2.0, 10.0));
        let mut camera = Camera::new(CameraTarget::Onscreen);
        camera.set_field_of_view(60.0);
        camera.set_near_plane(1.1);
        camera.set_far_plane(100.0);
        camera_entity.add_component(Box::new(camera));
        scene.add_entity(camera_entity);

        let mut light_entity = Entity::new();
        light_entity
            .state_mut()
            .set_position(Vector3::new(1.0, 8.0, -2.0));
        light_entity.add_component(Box::new(Light::new()));
        scene.add_entity(light_entity);

        let pipeline = init.pipelines.scene.clone();
        let mut renderer =
            match MeshRenderer::from_file(&init.device, pipeline.clone(), "model.obj").await {
                Ok(renderer) => renderer,
                Err(e) => {
                    log::warn!("could not load model.obj ({}), using the cube template", e);
                    MeshRenderer::from_template(&init.device, pipeline, "cube")
                        .expect("the cube template exists")
                }
            };
        renderer.set_color([0.0, 0.1, 1.0, 1.0]);

        let mut cube_entity = Entity::new();
        cube_entity.add_component(Box::new(renderer));

        // Slide along x while tilting towards the end orientation.
        let mut slide = AnimationClip::new(2000);
        slide.add_float(
            cube_entity.state(),
            EntityState::x,
            EntityState::set_x,
            3.0,
            easing::smooth_step,
        );
        slide.start();
        cube_entity.add_component(Box::new(slide));

        let mut tilt = AnimationClip::new(5000);
        tilt.add_quaternion(
            cube_entity.state(),
            EntityState::rotation,
            EntityState::set_rotation,
            Quaternion::from(Euler::new(Deg(90.0), Deg(-90.0), Deg(0.0))),
            easing::linear,
        );
        tilt.start();
        cube_entity.add_component(Box::new(tilt));

        let cube = scene.add_entity(cube_entity);

        Self { scene, cube }
    }

    fn animating(&self) -> bool {
        self.scene
            .entity(self.cube)
            .components()
            .filter_map(|c| c.as_any().downcast_ref::<AnimationClip>())
            .any(|clip| clip.started())
    }
}

impl SceneFlow<State, Event> for SpinningCube {
    fn on_init(&mut self, _: &mut Context, _: &mut State) -> Out<State, Event> {
        Out::Configure(Box::new(|ctx| ctx.tick_duration_millis = 100))
    }

    fn on_update(
        &mut self,
        _: &Context,
        _: &mut State,
        dt: std::time::Duration,
        _: std::time::Duration,
    ) -> Out<State, Event> {
        if !self.animating() {
            self.scene
                .entity_mut(self.cube)
                .state_mut()
                .rotate_y_axis(Deg(45.0 * dt.as_secs_f32()));
        }
        Out::Empty
    }

    fn on_tick(&mut self, _: &Context, _: &mut State) -> Out<State, Event> {
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut State,
        _: &DeviceEvent,
    ) -> Out<State, Event> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut State,
        _: &WindowEvent,
    ) -> Out<State, Event> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut State, event: Event) -> Option<Event> {
        match event {}
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }
}

fn main() -> anyhow::Result<()> {
    let constructor: FlowConstructor<State, Event> = Box::new(|init| {
        Box::pin(async move {
            Box::new(SpinningCube::new(init).await) as Box<dyn SceneFlow<State, Event>>
        })
    });

    sheep_ngin::flow::run(vec![constructor])
}
