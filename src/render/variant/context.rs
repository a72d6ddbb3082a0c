//! Per-stage draw helper handed to variant stage functions

use crate::core::error::Error;
use crate::core::rng::{RandomState, Seeds};
use crate::core::types::Result;
use crate::render::backend::{GpuBackend, Primitive, SurfaceId, UniformValue};
use crate::render::bindings::CurrentBindings;
use crate::render::inputs::FrameInputs;
use crate::render::program::{Program, ProgramSet};
use crate::render::properties::Properties;
use crate::render::renderer::Targets;
use crate::render::variant::Stage;

/// Borrowed view of the renderer for the duration of one stage
///
/// The driver clears the bindings and binds the stage's destination target
/// before handing the context to the variant.
pub struct StageContext<'a> {
    pub backend: &'a mut dyn GpuBackend,
    pub bindings: &'a mut CurrentBindings,
    pub programs: &'a ProgramSet,
    pub targets: &'a Targets,
    pub props: &'a Properties,
    pub inputs: &'a FrameInputs<'a>,
    pub rng: &'a mut RandomState,
    pub seeds: Seeds,
    pub resolution: u32,
    pub frame: u32,
    pub transfer_function: SurfaceId,
    program: Option<&'a Program>,
}

impl<'a> StageContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        backend: &'a mut dyn GpuBackend,
        bindings: &'a mut CurrentBindings,
        programs: &'a ProgramSet,
        targets: &'a Targets,
        props: &'a Properties,
        inputs: &'a FrameInputs<'a>,
        rng: &'a mut RandomState,
        seeds: Seeds,
        resolution: u32,
        frame: u32,
        transfer_function: SurfaceId,
    ) -> Self {
        Self {
            backend,
            bindings,
            programs,
            targets,
            props,
            inputs,
            rng,
            seeds,
            resolution,
            frame,
            transfer_function,
            program: None,
        }
    }

    /// Select the program for `stage`
    pub fn use_program(&mut self, stage: Stage) -> Result<()> {
        let program = self.programs.get(stage)?;
        self.bindings.use_program(program.id());
        self.program = Some(program);
        Ok(())
    }

    pub fn uniform(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let program = self
            .program
            .ok_or_else(|| Error::Gpu(format!("uniform '{}' set before a program was selected", name)))?;
        self.bindings.set_uniform(program.location(name)?, value);
        Ok(())
    }

    pub fn float(&mut self, name: &str, value: f32) -> Result<()> {
        self.uniform(name, UniformValue::Float(value))
    }

    pub fn uint(&mut self, name: &str, value: u32) -> Result<()> {
        self.uniform(name, UniformValue::Uint(value))
    }

    pub fn int(&mut self, name: &str, value: i32) -> Result<()> {
        self.uniform(name, UniformValue::Int(value))
    }

    /// Bind `surface` to the next texture unit and point sampler `name` at it
    pub fn texture(&mut self, name: &str, surface: SurfaceId) -> Result<()> {
        let unit = self.bindings.bind_texture(surface);
        self.int(name, unit as i32)
    }

    /// Upload `uMvpInverseMatrix` for the current camera and volume
    pub fn mvp_inverse(&mut self) -> Result<()> {
        let matrix = self.inputs.mvp_inverse();
        self.uniform("uMvpInverseMatrix", UniformValue::Mat4(matrix))
    }

    /// `uInverseResolution` for the display resolution
    pub fn inverse_resolution(&mut self) -> Result<()> {
        let inv = 1.0 / self.resolution as f32;
        self.uniform("uInverseResolution", UniformValue::Vec2([inv, inv]))
    }

    pub fn volume(&mut self, name: &str) -> Result<()> {
        let texture = self.inputs.volume.texture;
        self.texture(name, texture)
    }

    pub fn environment(&mut self, name: &str) -> Result<()> {
        let texture = self.inputs.environment.0;
        self.texture(name, texture)
    }

    pub fn transfer_function(&mut self, name: &str) -> Result<()> {
        let texture = self.transfer_function;
        self.texture(name, texture)
    }

    /// Accumulation surface `index` on the READ side
    pub fn accumulated(&self, index: usize) -> Result<SurfaceId> {
        self.targets
            .accumulation
            .attachments()
            .get(index)
            .copied()
            .ok_or_else(|| Error::config(format!("no accumulation attachment {}", index)))
    }

    /// Generate-stage helper surface `index`
    pub fn generated(&self, index: usize) -> Result<SurfaceId> {
        self.targets
            .generate
            .as_ref()
            .and_then(|g| g.attachments().get(index))
            .copied()
            .ok_or_else(|| Error::config(format!("no generate attachment {}", index)))
    }

    /// Submit the draw assembled so far
    pub fn draw(&mut self, primitive: Primitive, vertex_count: u32, draw_buffers: u32) -> Result<()> {
        let call = self.bindings.draw_call(primitive, vertex_count, draw_buffers)?;
        self.backend.draw(&call)
    }
}
