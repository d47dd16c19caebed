//! Per-frame pass sequencing.
//!
//! Every frame renders in two phases: first all cameras targeting offscreen
//! framebuffers (the shadow pass — it fills the shadow map the main pass
//! samples), then all cameras targeting the window surface. Each camera
//! writes its view-projection into the shared camera buffer and gets its own
//! command submission, so the uniform is stable for the whole pass.

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    components::{Camera, camera::CameraTarget},
    context::Context,
    entity::Entity,
    pipelines::{
        scene::{CameraUniform, TargetKind},
        shadow::compute_light_matrix,
    },
    scene::Scene,
};

/// Renders all scenes for this frame and presents the surface.
pub fn render_frame(ctx: &Context, scenes: &mut [&mut Scene]) -> Result<(), wgpu::SurfaceError> {
    ctx.window.request_redraw();

    for scene in scenes.iter_mut() {
        scene.upload(ctx);
    }

    for scene in scenes.iter() {
        render_offscreen_cameras(ctx, scene);
    }

    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut first_onscreen = true;
    for scene in scenes.iter() {
        for (entity, camera) in cameras(scene) {
            if !matches!(camera.target(), CameraTarget::Onscreen) {
                continue;
            }
            let Some(uniform) = camera_uniform(entity, camera) else {
                continue;
            };
            ctx.queue
                .write_buffer(&ctx.camera.buffer, 0, bytemuck::cast_slice(&[uniform]));

            let mut encoder = ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Main Pass Encoder"),
                });
            {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Main Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            // The first camera clears the frame; later ones
                            // compose on top.
                            load: if first_onscreen {
                                wgpu::LoadOp::Clear(camera.background())
                            } else {
                                wgpu::LoadOp::Load
                            },
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: if first_onscreen {
                                wgpu::LoadOp::Clear(1.0)
                            } else {
                                wgpu::LoadOp::Load
                            },
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });
                first_onscreen = false;

                render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
                render_pass.set_bind_group(1, &ctx.light.bind_group, &[]);
                let shadow_bind_group = scene
                    .shadow()
                    .map(|binding| &binding.bind_group)
                    .unwrap_or(&ctx.shadow.default_bind_group);
                render_pass.set_bind_group(2, shadow_bind_group, &[]);

                for entity in scene.entities().iter() {
                    entity.draw(&mut render_pass, TargetKind::Onscreen);
                }

                for quad in scene.overlays().iter() {
                    quad.draw(&mut render_pass, &ctx.pipelines.debug);
                }
            }
            ctx.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    output.present();
    Ok(())
}

/// Renders every offscreen-target camera of the scene. A camera rendering
/// into the scene's shadow map is a shadow pass: the light matrix is
/// refreshed and only shadow casters draw.
fn render_offscreen_cameras(ctx: &Context, scene: &Scene) {
    for (entity, camera) in cameras(scene) {
        let CameraTarget::Offscreen(target) = camera.target() else {
            continue;
        };
        let Some(uniform) = camera_uniform(entity, camera) else {
            continue;
        };

        let shadow_pass = scene
            .shadow()
            .map(|binding| camera.targets(&binding.target))
            .unwrap_or(false);
        if shadow_pass {
            let light_transform = entity.state().current_transform();
            match compute_light_matrix(camera.projection_matrix(), light_transform) {
                Some(light_matrix) => {
                    // The main pass samples the map through this matrix.
                    if let Some(binding) = scene.shadow() {
                        binding.write_matrix(&ctx.queue, light_matrix);
                    }
                }
                None => log::warn!("light transform is not invertible, shadow matrix kept"),
            }
        }

        ctx.queue
            .write_buffer(&ctx.camera.buffer, 0, bytemuck::cast_slice(&[uniform]));

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Pass Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Offscreen Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(camera.background()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(1, &ctx.light.bind_group, &[]);
            // The map being rendered must not be sampled in its own pass.
            render_pass.set_bind_group(2, &ctx.shadow.default_bind_group, &[]);

            for entity in scene.entities().iter() {
                if shadow_pass && !entity.state().cast_shadow() {
                    continue;
                }
                entity.draw(&mut render_pass, TargetKind::Offscreen);
            }
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn cameras(scene: &Scene) -> impl Iterator<Item = (&Entity, &Camera)> {
    scene
        .entities()
        .iter()
        .filter_map(|entity| entity.component::<Camera>().map(|camera| (entity, camera)))
}

/// The camera uniform for a camera owned by `entity`, or `None` when the
/// entity transform cannot be inverted into a view matrix.
fn camera_uniform(entity: &Entity, camera: &Camera) -> Option<CameraUniform> {
    let transform = entity.state().current_transform();
    let view: Matrix4<f32> = match transform.invert() {
        Some(view) => view,
        None => {
            log::warn!("camera transform is not invertible, skipping camera");
            return None;
        }
    };
    let view_proj = camera.projection_matrix() * view;
    Some(CameraUniform::from_view_proj(
        view_proj,
        entity.state().position(),
    ))
}
