//! Uniform interface shared by every shader program.
//!
//! Programs read one uniform block at group 0 / binding 0 and one texture +
//! sampler pair at group 1 / bindings 0 and 1:
//!
//! ```wgsl
//! struct Material { color: vec4<f32> };
//! @group(0) @binding(0) var<uniform> u_material: Material;
//! @group(1) @binding(0) var u_texture: texture_2d<f32>;
//! @group(1) @binding(1) var u_sampler: sampler;
//! ```
//!
//! `u_Texture` is not stored in the block. It selects which texture unit
//! feeds group 1 at draw time.

use bytemuck::{Pod, Zeroable};

/// Number of texture units a program can select from.
pub const MAX_TEXTURE_UNITS: u32 = 16;

/// Value type of a uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Vec4,
    /// Texture unit index.
    Sampler,
}

/// Resolved uniform slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    pub name: &'static str,
    pub kind: UniformKind,
    /// Byte offset in [`MaterialBlock`]; unused for samplers.
    pub offset: u32,
}

const MATERIAL_UNIFORMS: &[UniformLocation] = &[
    UniformLocation { name: "u_Color", kind: UniformKind::Vec4, offset: 0 },
    UniformLocation { name: "u_Texture", kind: UniformKind::Sampler, offset: 0 },
];

/// Looks a uniform up by name. `None` means the program has no such uniform.
pub fn lookup_uniform(name: &str) -> Option<UniformLocation> {
    MATERIAL_UNIFORMS.iter().copied().find(|u| u.name == name)
}

/// CPU mirror of the material uniform block.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialBlock {
    pub color: [f32; 4],
}

impl Default for MaterialBlock {
    fn default() -> Self {
        Self { color: [1.0; 4] }
    }
}

impl MaterialBlock {
    pub(crate) fn write_vec4(&mut self, location: UniformLocation, value: [f32; 4]) {
        let floats: &mut [f32] = bytemuck::cast_slice_mut(std::slice::from_mut(self));
        let at = location.offset as usize / std::mem::size_of::<f32>();
        floats[at..at + 4].copy_from_slice(&value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        assert_eq!(lookup_uniform("u_Color").map(|u| u.kind), Some(UniformKind::Vec4));
        assert_eq!(lookup_uniform("u_Texture").map(|u| u.kind), Some(UniformKind::Sampler));
    }

    #[test]
    fn unknown_and_miscased_names_do_not() {
        assert!(lookup_uniform("u_MVP").is_none());
        assert!(lookup_uniform("u_color").is_none());
    }

    #[test]
    fn vec4_write_lands_at_offset() {
        let mut block = MaterialBlock::default();
        let loc = lookup_uniform("u_Color").unwrap();
        block.write_vec4(loc, [0.25, 0.3, 0.8, 1.0]);
        assert_eq!(block.color, [0.25, 0.3, 0.8, 1.0]);
    }
}
