//! Material system for surface rendering.
//!
//! Lit materials are drawn with four matcap textures (R/G/B/K) that are
//! weighted by the surface color in `lightSurfaceMat`. Blendable materials
//! tint each channel separately; static materials reuse one texture for all
//! four. Flat materials skip matcap lighting entirely (`LIGHT_PASSTHRU`).

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::builtin_rules::MATCAP_TEXTURES;
use crate::texture::Texture;

/// Edge length of generated matcap images.
pub const MATCAP_SIZE: u32 = 32;

/// A material definition for rendering.
#[derive(Debug, Clone)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Whether this is a flat (unlit) material.
    pub is_flat: bool,
    /// Whether this material has separate R/G/B/K matcap channels (blendable).
    pub is_blendable: bool,
    /// Ambient light factor (0.0 - 1.0).
    pub ambient: f32,
    /// Diffuse reflection factor (0.0 - 1.0).
    pub diffuse: f32,
    /// Specular reflection intensity (0.0 - 1.0).
    pub specular: f32,
    /// Specular exponent (higher = sharper highlights).
    pub shininess: f32,
}

impl Material {
    /// Creates a new blendable material with custom properties.
    pub fn blendable(
        name: impl Into<String>,
        ambient: f32,
        diffuse: f32,
        specular: f32,
        shininess: f32,
    ) -> Self {
        Self {
            name: name.into(),
            is_flat: false,
            is_blendable: true,
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    /// Creates a new static (non-blendable) material with custom properties.
    pub fn static_mat(
        name: impl Into<String>,
        ambient: f32,
        diffuse: f32,
        specular: f32,
        shininess: f32,
    ) -> Self {
        Self {
            is_blendable: false,
            ..Self::blendable(name, ambient, diffuse, specular, shininess)
        }
    }

    /// Creates a flat (unlit) material.
    pub fn flat(name: impl Into<String>) -> Self {
        Self {
            is_flat: true,
            ..Self::blendable(name, 1.0, 0.0, 0.0, 1.0)
        }
    }

    /// Matte, minimal specularity. Blendable.
    #[must_use]
    pub fn clay() -> Self {
        Self::blendable("clay", 0.25, 0.75, 0.1, 8.0)
    }

    /// Slightly glossy, soft highlights. Blendable.
    #[must_use]
    pub fn wax() -> Self {
        Self::blendable("wax", 0.2, 0.7, 0.4, 16.0)
    }

    /// Shiny, bright highlights. Blendable.
    #[must_use]
    pub fn candy() -> Self {
        Self::blendable("candy", 0.15, 0.6, 0.7, 64.0)
    }

    #[must_use]
    pub fn ceramic() -> Self {
        Self::static_mat("ceramic", 0.2, 0.65, 0.5, 32.0)
    }

    #[must_use]
    pub fn jade() -> Self {
        Self::static_mat("jade", 0.3, 0.6, 0.3, 24.0)
    }

    #[must_use]
    pub fn mud() -> Self {
        Self::static_mat("mud", 0.3, 0.7, 0.0, 1.0)
    }

    #[must_use]
    pub fn normal() -> Self {
        Self::static_mat("normal", 0.2, 0.7, 0.3, 32.0)
    }

    /// Renders one matcap channel: a lit sphere seen head-on, tinted by `tint`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn render_matcap(&self, tint: Vec3, size: u32) -> Texture {
        let light = Vec3::new(-0.4, 0.6, 1.0).normalize();
        let half = (light + Vec3::Z).normalize();
        let mut data = Vec::with_capacity(size as usize * size as usize * 4);

        for y in 0..size {
            for x in 0..size {
                let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                let v = 1.0 - (y as f32 + 0.5) / size as f32 * 2.0;
                let r2 = (u * u + v * v).min(1.0);
                let normal = Vec3::new(u, v, (1.0 - r2).sqrt()).normalize_or_zero();

                let diffuse = normal.dot(light).max(0.0) * self.diffuse;
                let specular = normal.dot(half).max(0.0).powf(self.shininess) * self.specular;
                let color = tint * (self.ambient + diffuse) + Vec3::splat(specular);
                let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
                data.extend_from_slice(&[c.x as u8, c.y as u8, c.z as u8, 255]);
            }
        }

        Texture::new_2d(size, size, data).unwrap_or_else(|_| Texture::solid(tint))
    }

    /// Builds the four matcap textures, in `t_mat_r, t_mat_g, t_mat_b, t_mat_k` order.
    pub fn matcap_set(&self) -> MatcapTextureSet {
        if self.is_blendable {
            let channel = |tint| Arc::new(self.render_matcap(tint, MATCAP_SIZE));
            MatcapTextureSet {
                textures: [
                    channel(Vec3::X),
                    channel(Vec3::Y),
                    channel(Vec3::Z),
                    channel(Vec3::ZERO),
                ],
            }
        } else {
            let shared = Arc::new(self.render_matcap(Vec3::splat(0.8), MATCAP_SIZE));
            MatcapTextureSet {
                textures: [
                    Arc::clone(&shared),
                    Arc::clone(&shared),
                    Arc::clone(&shared),
                    shared,
                ],
            }
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::clay()
    }
}

/// The R/G/B/K matcap textures of one material.
#[derive(Debug, Clone)]
pub struct MatcapTextureSet {
    pub textures: [Arc<Texture>; 4],
}

impl MatcapTextureSet {
    /// Pairs each texture with the sampler name it binds to.
    pub fn bindings(&self) -> impl Iterator<Item = (&'static str, &Arc<Texture>)> {
        MATCAP_TEXTURES.into_iter().zip(self.textures.iter())
    }
}

/// Registry for managing materials.
#[derive(Default)]
pub struct MaterialRegistry {
    materials: HashMap<String, Material>,
    matcaps: HashMap<String, MatcapTextureSet>,
}

impl MaterialRegistry {
    /// Creates a new material registry with default materials.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register(Material::clay());
        self.register(Material::wax());
        self.register(Material::candy());
        self.register(Material::ceramic());
        self.register(Material::jade());
        self.register(Material::mud());
        self.register(Material::normal());
        self.register(Material::flat("flat"));
    }

    /// Registers a material, replacing any material of the same name.
    pub fn register(&mut self, material: Material) {
        if material.is_flat {
            self.matcaps.remove(&material.name);
        } else {
            self.matcaps
                .insert(material.name.clone(), material.matcap_set());
        }
        self.materials.insert(material.name.clone(), material);
    }

    /// Gets a material by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Returns true if a material with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    /// Matcap textures of a lit material; `None` for flat or unknown ones.
    #[must_use]
    pub fn matcaps(&self, name: &str) -> Option<&MatcapTextureSet> {
        self.matcaps.get(name)
    }

    /// Returns all material names, with built-in materials first in a stable order,
    /// followed by custom materials sorted alphabetically.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        const BUILTIN_ORDER: &[&str] = &[
            "clay", "wax", "candy", "flat", "mud", "ceramic", "jade", "normal",
        ];
        let mut names: Vec<&str> = BUILTIN_ORDER
            .iter()
            .copied()
            .filter(|n| self.materials.contains_key(*n))
            .collect();
        let mut custom: Vec<&str> = self
            .materials
            .keys()
            .map(String::as_str)
            .filter(|n| !BUILTIN_ORDER.contains(n))
            .collect();
        custom.sort_unstable();
        names.extend(custom);
        names
    }

    /// Returns the number of registered materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Returns true if no materials are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
