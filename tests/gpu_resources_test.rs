//! GPU resource smoke test, gated behind the `integration-tests` feature
//! because it needs a working adapter. Validates that the shaders compile
//! and that every bind group layout matches its pipeline.

#![cfg(feature = "integration-tests")]

use std::sync::Arc;

use sheep_ngin::{
    data_structures::primitive::Primitive,
    pipelines::{
        Pipelines,
        scene::uniform_bind_group_layout,
        shadow::{OffscreenTarget, SHADOW_MAP_SIZE, ShadowBinding, shadow_bind_group_layout},
    },
};

#[test]
fn gpu_resources_build() {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let (device, _queue) = futures::executor::block_on(async {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .expect("no adapter available");
        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .expect("no device available")
    });

    let camera_layout = uniform_bind_group_layout(&device, "camera_bind_group_layout");
    let light_layout = uniform_bind_group_layout(&device, "light_bind_group_layout");
    let shadow_layout = shadow_bind_group_layout(&device);

    // Shader compilation and layout compatibility happen here.
    let pipelines = Pipelines::new(
        &device,
        wgpu::TextureFormat::Bgra8UnormSrgb,
        &camera_layout,
        &light_layout,
        &shadow_layout,
    );

    let cube = Primitive::cube(&device);
    assert_eq!(cube.num_elements, 36);
    let plane = Primitive::plane(&device);
    assert_eq!(plane.num_elements, 6);

    let target = Arc::new(OffscreenTarget::new(
        &device,
        SHADOW_MAP_SIZE,
        SHADOW_MAP_SIZE,
    ));
    let binding = ShadowBinding::new(&device, &shadow_layout, target.clone());
    assert!(Arc::ptr_eq(&binding.target, &target));

    drop(pipelines);
    device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    })
    .expect("device lost");
}
