//! Shadow mapping demo.
//!
//! Four entities: a perspective camera, a directional light carrying an
//! orthographic camera that renders the shadow map, a floor plane and a
//! spinning cube casting a shadow onto it. Overlay quads show the shadow
//! framebuffer's color and depth sides.
//!
//! Keys: `o`/`l`/`c` select the cube/light/camera, arrow keys move the
//! selected entity on the x/z plane.

use std::sync::Arc;

use sheep_ngin::{
    Deg, DeviceEvent, ElementState, KeyCode, PhysicalKey, Vector3, WindowEvent,
    components::{Camera, CameraTarget, Light, MeshRenderer, Projection},
    context::{Context, InitContext},
    entity::Entity,
    flow::{FlowConstructor, Out, SceneFlow},
    pipelines::{
        debug::DebugQuad,
        shadow::{OffscreenTarget, SHADOW_MAP_SIZE},
    },
    resources,
    scene::{EntityId, Scene},
};

#[derive(Default)]
struct State;

enum Event {}

struct ShadowCube {
    scene: Scene,
    camera: EntityId,
    light: EntityId,
    cube: EntityId,
    selected: EntityId,
}

impl ShadowCube {
    async fn new(init: InitContext) -> Self {
        let mut scene = Scene::new();

        let shadow_target = Arc::new(OffscreenTarget::new(
            &init.device,
            SHADOW_MAP_SIZE,
            SHADOW_MAP_SIZE,
        ));
        scene.set_shadow_map(
            &init.device,
            &init.shadow_bind_group_layout,
            shadow_target.clone(),
        );

        // Main camera.
        let mut camera_entity = Entity::new();
        camera_entity
            .state_mut()
            .set_position(Vector3::new(0.0, 2.0, 10.0));
        let mut camera = Camera::new(CameraTarget::Onscreen);
        camera.set_field_of_view(60.0);
        camera.set_near_plane(1.1);
        camera.set_far_plane(100.0);
        camera_entity.add_component(Box::new(camera));
        let camera = scene.add_entity(camera_entity);

        // Light, with the orthographic camera rendering the shadow map.
        let mut light_entity = Entity::new();
        light_entity
            .state_mut()
            .set_position(Vector3::new(1.0, 8.0, -2.0));
        light_entity.state_mut().rotate_x_axis(Deg(-120.0));
        light_entity.state_mut().rotate_y_axis(Deg(10.0));

        let mut light = Light::new();
        light.set_ambient(sheep_ngin::Color {
            r: 0.2,
            g: 0.2,
            b: 0.2,
            a: 1.0,
        });
        light.set_diffuse(sheep_ngin::Color {
            r: 0.6,
            g: 0.6,
            b: 0.6,
            a: 1.0,
        });
        light.set_specular(sheep_ngin::Color {
            r: 0.4,
            g: 0.4,
            b: 0.4,
            a: 1.0,
        });
        light_entity.add_component(Box::new(light));

        let mut shadow_camera = Camera::new(CameraTarget::Offscreen(shadow_target.clone()));
        shadow_camera.set_background_color(sheep_ngin::Color {
            r: 0.0,
            g: 0.3,
            b: 0.0,
            a: 1.0,
        });
        shadow_camera.set_projection(Projection::Orthographic);
        shadow_camera.set_size_of_view(3.0);
        shadow_camera.set_near_plane(1.1);
        shadow_camera.set_far_plane(20.0);
        light_entity.add_component(Box::new(shadow_camera));
        let light = scene.add_entity(light_entity);

        // Floor plane, lit but not casting.
        let mut plane_entity = Entity::new();
        plane_entity.state_mut().set_cast_shadow(false);
        let mut plane_renderer =
            MeshRenderer::from_template(&init.device, init.pipelines.scene.clone(), "plane")
                .expect("the plane template exists");
        plane_renderer.set_color([1.0, 0.2, 0.2, 1.0]);
        plane_entity.add_component(Box::new(plane_renderer));
        scene.add_entity(plane_entity);

        // The cube, the only shadow caster.
        let mut cube_entity = Entity::new();
        cube_entity.state_mut().set_cast_shadow(true);
        let mut cube_renderer =
            MeshRenderer::from_template(&init.device, init.pipelines.scene.clone(), "cube")
                .expect("the cube template exists");
        cube_renderer.set_color([0.0, 0.1, 1.0, 1.0]);
        cube_entity.add_component(Box::new(cube_renderer));
        let cube = scene.add_entity(cube_entity);

        // Overlay quads showing both sides of the shadow framebuffer.
        scene.add_overlay(DebugQuad::color(
            &init.device,
            &init.pipelines.debug,
            &shadow_target.color.view,
            [-0.95, 0.45, -0.5, 0.95],
        ));
        scene.add_overlay(DebugQuad::depth(
            &init.device,
            &init.pipelines.debug,
            &shadow_target.depth.view,
            [-0.95, -0.05, -0.5, 0.45],
        ));

        // The uv grid helps judging the shadow map orientation.
        match resources::load_texture("uvgrid.jpg", &init.device, &init.queue).await {
            Ok(texture) => scene.add_overlay(DebugQuad::color(
                &init.device,
                &init.pipelines.debug,
                &texture.view,
                [0.55, 0.55, 0.95, 0.95],
            )),
            Err(e) => log::warn!("Could not load uv debug texture: {}", e),
        }

        Self {
            scene,
            camera,
            light,
            cube,
            selected: cube,
        }
    }
}

impl SceneFlow<State, Event> for ShadowCube {
    fn on_init(&mut self, _: &mut Context, _: &mut State) -> Out<State, Event> {
        Out::Empty
    }

    fn on_update(
        &mut self,
        _: &Context,
        _: &mut State,
        dt: std::time::Duration,
        _: std::time::Duration,
    ) -> Out<State, Event> {
        self.scene
            .entity_mut(self.cube)
            .state_mut()
            .rotate_y_axis(Deg(30.0 * dt.as_secs_f32()));
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
        event: &WindowEvent,
    ) -> Out<State, Event> {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return Out::Empty;
        };
        if event.state != ElementState::Pressed {
            return Out::Empty;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::KeyO) => {
                log::info!("Object selected");
                self.selected = self.cube;
            }
            PhysicalKey::Code(KeyCode::KeyL) => {
                log::info!("Light selected");
                self.selected = self.light;
            }
            PhysicalKey::Code(KeyCode::KeyC) => {
                log::info!("Camera selected");
                self.selected = self.camera;
            }
            PhysicalKey::Code(KeyCode::ArrowRight) => {
                let state = self.scene.entity_mut(self.selected).state_mut();
                state.set_x(state.x() + 0.1);
            }
            PhysicalKey::Code(KeyCode::ArrowLeft) => {
                let state = self.scene.entity_mut(self.selected).state_mut();
                state.set_x(state.x() - 0.1);
            }
            PhysicalKey::Code(KeyCode::ArrowUp) => {
                let state = self.scene.entity_mut(self.selected).state_mut();
                state.set_z(state.z() - 0.1);
            }
            PhysicalKey::Code(KeyCode::ArrowDown) => {
                let state = self.scene.entity_mut(self.selected).state_mut();
                state.set_z(state.z() + 0.1);
            }
            _ => (),
        }
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
            Box::new(ShadowCube::new(init).await) as Box<dyn SceneFlow<State, Event>>
        })
    });

    sheep_ngin::flow::run(vec![constructor])
}
