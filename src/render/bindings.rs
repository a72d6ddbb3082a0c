//! Explicit GPU binding state
//!
//! Draw helpers never rely on whatever framebuffer, program or texture unit a
//! previous pass left bound. Each stage starts from [`CurrentBindings::reset`]
//! and records exactly what its draw needs.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::render::backend::{
    DrawCall, FramebufferId, Primitive, ProgramId, SurfaceId, UniformLocation, UniformValue,
    Viewport,
};

/// Framebuffer, program, texture units and uniform values for the next draw
#[derive(Clone, Debug, Default)]
pub struct CurrentBindings {
    framebuffer: Option<(FramebufferId, Viewport)>,
    program: Option<ProgramId>,
    textures: Vec<SurfaceId>,
    uniforms: Vec<(UniformLocation, UniformValue)>,
}

impl CurrentBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything bound so far
    pub fn reset(&mut self) {
        self.framebuffer = None;
        self.program = None;
        self.textures.clear();
        self.uniforms.clear();
    }

    pub fn bind_framebuffer(&mut self, framebuffer: FramebufferId, viewport: Viewport) {
        self.framebuffer = Some((framebuffer, viewport));
    }

    pub fn framebuffer(&self) -> Option<(FramebufferId, Viewport)> {
        self.framebuffer
    }

    /// Switch program. Uniform values belong to a program and are dropped.
    pub fn use_program(&mut self, program: ProgramId) {
        self.program = Some(program);
        self.uniforms.clear();
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    /// Bind `surface` to the next free texture unit and return the unit
    pub fn bind_texture(&mut self, surface: SurfaceId) -> u32 {
        self.textures.push(surface);
        (self.textures.len() - 1) as u32
    }

    pub fn textures(&self) -> &[SurfaceId] {
        &self.textures
    }

    /// Set a uniform, replacing any earlier value at the same location
    pub fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        match self.uniforms.iter_mut().find(|(loc, _)| *loc == location) {
            Some(slot) => slot.1 = value,
            None => self.uniforms.push((location, value)),
        }
    }

    pub fn uniforms(&self) -> &[(UniformLocation, UniformValue)] {
        &self.uniforms
    }

    /// Assemble a draw from the current state
    pub fn draw_call(
        &self,
        primitive: Primitive,
        vertex_count: u32,
        draw_buffers: u32,
    ) -> Result<DrawCall<'_>> {
        let (framebuffer, viewport) = self
            .framebuffer
            .ok_or_else(|| Error::Gpu("draw issued with no framebuffer bound".into()))?;
        let program = self
            .program
            .ok_or_else(|| Error::Gpu("draw issued with no program bound".into()))?;

        Ok(DrawCall {
            program,
            framebuffer,
            viewport,
            textures: &self.textures,
            uniforms: &self.uniforms,
            draw_buffers,
            primitive,
            vertex_count,
        })
    }
}
