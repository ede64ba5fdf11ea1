// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for the headless backend.

use std::any::Any;
use std::ops::Range;

use lumen_core::math::{Extent2D, Viewport};
use lumen_core::renderer::*;
use lumen_infra::headless::{Command, HeadlessObject};
use lumen_infra::HeadlessBackend;

fn color_pass() -> RenderPassDescription {
    RenderPassDescription::default()
        .with_color(AttachmentDescription::color(TextureFormat::Rgba8Unorm))
}

fn texture(backend: &HeadlessBackend, label: &str) -> TextureId {
    backend
        .create_texture(&TextureDescription::attachment(
            label,
            Extent2D::new(16, 16),
            TextureFormat::Rgba8Unorm,
        ))
        .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Object lifetime
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_counters_follow_create_and_destroy() {
    let backend = HeadlessBackend::new();
    let a = backend.create_sampler(&SamplerDescription::default(), "a").unwrap();
    let b = backend.create_sampler(&SamplerDescription::default(), "b").unwrap();
    assert_ne!(a, b);
    assert_eq!(backend.live(HeadlessObject::Sampler), 2);

    backend.destroy_sampler(a).unwrap();
    assert_eq!(backend.created(HeadlessObject::Sampler), 2);
    assert_eq!(backend.destroyed(HeadlessObject::Sampler), 1);
    assert_eq!(backend.live(HeadlessObject::Sampler), 1);
}

#[test]
fn test_double_destroy_is_an_error() {
    let backend = HeadlessBackend::new();
    let pass = backend.create_render_pass(&color_pass(), "pass").unwrap();
    backend.destroy_render_pass(pass).unwrap();
    assert!(matches!(
        backend.destroy_render_pass(pass),
        Err(ResourceError::InvalidHandle { .. })
    ));
    assert_eq!(backend.destroyed(HeadlessObject::RenderPass), 1);
}

#[test]
fn test_injected_failures_are_consumed() {
    let backend = HeadlessBackend::new();
    backend.fail_next(HeadlessObject::Pipeline, 1);

    let desc = PipelineDescription::default();
    assert!(matches!(
        backend.create_pipeline(&desc, "first"),
        Err(ResourceError::AllocationFailed { kind: "pipeline", .. })
    ));
    assert!(backend.create_pipeline(&desc, "second").is_ok());
    assert_eq!(backend.created(HeadlessObject::Pipeline), 1);
}

#[test]
fn test_framebuffer_checks_its_attachments() {
    let backend = HeadlessBackend::new();
    let pass = backend.create_render_pass(&color_pass(), "pass").unwrap();
    let color = texture(&backend, "color");

    let too_many = FramebufferDescription {
        render_pass: pass,
        attachments: vec![
            FramebufferAttachment::whole(color),
            FramebufferAttachment::whole(color),
        ],
        size: Extent2D::new(16, 16),
    };
    assert!(backend.create_framebuffer(&too_many, "bad").is_err());

    let stale = FramebufferDescription {
        render_pass: pass,
        attachments: vec![FramebufferAttachment::whole(TextureId(999))],
        size: Extent2D::new(16, 16),
    };
    assert!(matches!(
        backend.create_framebuffer(&stale, "stale"),
        Err(ResourceError::InvalidHandle { kind: "texture", id: 999 })
    ));

    let good = FramebufferDescription {
        render_pass: pass,
        attachments: vec![FramebufferAttachment::whole(color)],
        size: Extent2D::new(16, 16),
    };
    assert!(backend.create_framebuffer(&good, "good").is_ok());
}

// ─────────────────────────────────────────────────────────────────────────────
// Submission
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_submission_is_recorded_in_order() {
    let backend = HeadlessBackend::new();
    let pipeline = backend
        .create_pipeline(&PipelineDescription::default(), "p")
        .unwrap();

    for label in ["first", "second"] {
        let mut list = backend.create_command_list(label);
        list.set_pipeline(pipeline);
        list.draw(0..3, 0..1);
        backend.submit(list.as_mut()).unwrap();
    }

    let submissions = backend.submissions();
    assert_eq!(backend.submitted_labels(), vec!["first", "second"]);
    assert_eq!(
        submissions[0].commands,
        vec![
            Command::SetPipeline(pipeline),
            Command::Draw {
                vertices: 0..3,
                instances: 0..1
            }
        ]
    );
}

#[test]
fn test_submit_rejects_destroyed_objects() {
    let backend = HeadlessBackend::new();
    let pipeline = backend
        .create_pipeline(&PipelineDescription::default(), "p")
        .unwrap();
    backend.destroy_pipeline(pipeline).unwrap();

    let mut list = backend.create_command_list("stale");
    list.set_pipeline(pipeline);
    assert!(matches!(
        backend.submit(list.as_mut()),
        Err(RenderError::SubmissionFailed(_))
    ));
    assert!(backend.submissions().is_empty());
}

#[test]
fn test_submit_rejects_open_render_pass() {
    let backend = HeadlessBackend::new();
    let pass = backend.create_render_pass(&color_pass(), "pass").unwrap();
    let color = texture(&backend, "color");
    let framebuffer = backend
        .create_framebuffer(
            &FramebufferDescription {
                render_pass: pass,
                attachments: vec![FramebufferAttachment::whole(color)],
                size: Extent2D::new(16, 16),
            },
            "fb",
        )
        .unwrap();

    let mut list = backend.create_command_list("open");
    list.begin_render_pass(&RenderPassBinding {
        render_pass: pass,
        framebuffer,
        area: Extent2D::new(16, 16),
        clear_color: [0.0; 4],
        clear_depth: 1.0,
    });
    assert!(backend.submit(list.as_mut()).is_err());

    list.reset();
    assert_eq!(list.command_count(), 0);
    assert!(backend.submit(list.as_mut()).is_ok());
}

#[test]
fn test_lost_device_fails_submission() {
    let backend = HeadlessBackend::new();
    backend.lose_device();
    let mut list = backend.create_command_list("any");
    assert!(matches!(
        backend.submit(list.as_mut()),
        Err(RenderError::DeviceLost)
    ));
}

struct ForeignList;

impl CommandList for ForeignList {
    fn id(&self) -> CommandListId {
        CommandListId(0)
    }
    fn label(&self) -> &str {
        "foreign"
    }
    fn set_label(&mut self, _: &str) {}
    fn begin_render_pass(&mut self, _: &RenderPassBinding) {}
    fn end_render_pass(&mut self) {}
    fn set_viewport(&mut self, _: Viewport) {}
    fn set_pipeline(&mut self, _: PipelineId) {}
    fn bind_texture(&mut self, _: u32, _: TextureId) {}
    fn bind_sampler(&mut self, _: u32, _: SamplerId) {}
    fn draw(&mut self, _: Range<u32>, _: Range<u32>) {}
    fn push_debug_group(&mut self, _: &str) {}
    fn pop_debug_group(&mut self) {}
    fn command_count(&self) -> usize {
        0
    }
    fn reset(&mut self) {}
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_foreign_command_list_is_rejected() {
    let backend = HeadlessBackend::new();
    let mut list = ForeignList;
    assert!(matches!(
        backend.submit(&mut list),
        Err(RenderError::SubmissionFailed(_))
    ));
}
