use std::num::NonZeroU32;
use std::rc::Rc;

use glam::Mat4;
use log::{debug, info};
use rand::Rng;

use crate::aabb::Aabb3;
use crate::error::TextError;
use crate::font::Font;
use crate::mesh::{Mesh, TorusOptions};
use crate::placement::PlacementSampler;
use crate::text::{text_mesh, TextOptions};

/// What a scene object was created as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Text,
    Donut,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub mesh: Rc<Mesh>,
    pub transform: Mat4,
}

impl SceneObject {
    pub fn world_bounds(&self) -> Aabb3 {
        self.mesh.bounding_box().transformed(&self.transform)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
}

impl Scene {
    pub fn add(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.iter().filter(|o| o.kind == kind).count()
    }
}

/// Everything needed to fill the scene once the font is available.
#[derive(Debug, Clone)]
pub struct SceneSettings {
    pub text: String,
    pub text_options: TextOptions,
    pub torus: TorusOptions,
    pub donuts: usize,
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for SceneSettings {
    fn default() -> Self {
        SceneSettings {
            text: "DONUTS".to_string(),
            text_options: TextOptions::default(),
            torus: TorusOptions::default(),
            donuts: 150,
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Populated {
    pub text_bounds: Aabb3,
    pub donuts: usize,
    pub skipped: usize,
}

/// Adds the text and the donuts scattered around it.
///
/// Nothing is added when the text mesh cannot be built.
pub fn populate<R: Rng + ?Sized>(
    scene: &mut Scene,
    font: &Font,
    settings: &SceneSettings,
    rng: &mut R,
) -> Result<Populated, TextError> {
    let text = text_mesh(font, &settings.text, &settings.text_options)?;
    let text_triangles = text.triangle_count();
    let text = SceneObject {
        kind: ObjectKind::Text,
        mesh: Rc::new(text),
        transform: Mat4::IDENTITY,
    };
    let text_bounds = text.world_bounds();
    scene.add(text);

    let donut = Rc::new(Mesh::torus(&settings.torus));
    let sampler = PlacementSampler::new(text_bounds, donut.bounding_box(), settings.max_attempts);
    let placements = sampler.scatter(rng, settings.donuts);
    for placement in &placements {
        scene.add(SceneObject {
            kind: ObjectKind::Donut,
            mesh: Rc::clone(&donut),
            transform: placement.matrix(),
        });
    }

    let populated = Populated {
        text_bounds,
        donuts: placements.len(),
        skipped: settings.donuts - placements.len(),
    };
    let extent = populated.text_bounds.size();
    info!(
        "scene populated: {} donuts around text {:?} ({} skipped)",
        populated.donuts, settings.text, populated.skipped
    );
    debug!(
        "text mesh: {} triangles, extent {:.2} x {:.2} x {:.2}",
        text_triangles,
        extent.x,
        extent.y,
        extent.z
    );
    Ok(populated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::TEST_FONT;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn populate_adds_text_and_all_donuts() {
        let font = Font::from_json(TEST_FONT).unwrap();
        let settings = SceneSettings {
            text: "OCO".to_string(),
            ..SceneSettings::default()
        };
        let mut scene = Scene::default();
        let populated = populate(&mut scene, &font, &settings, &mut StdRng::seed_from_u64(11)).unwrap();

        assert_eq!(populated.donuts, 150);
        assert_eq!(populated.skipped, 0);
        assert_eq!(scene.count(ObjectKind::Text), 1);
        assert_eq!(scene.count(ObjectKind::Donut), 150);

        for donut in scene.objects.iter().filter(|o| o.kind == ObjectKind::Donut) {
            assert!(!donut.world_bounds().intersects(&populated.text_bounds));
            let position = donut.transform.w_axis.truncate();
            assert!(position.abs().max_element() <= 5.0);
        }
    }

    #[test]
    fn donuts_share_one_geometry() {
        let font = Font::from_json(TEST_FONT).unwrap();
        let mut scene = Scene::default();
        let settings = SceneSettings {
            donuts: 5,
            ..SceneSettings::default()
        };
        populate(&mut scene, &font, &settings, &mut StdRng::seed_from_u64(2)).unwrap();
        let donuts: Vec<_> = scene
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Donut)
            .collect();
        assert_eq!(donuts.len(), 5);
        assert!(donuts.windows(2).all(|w| Rc::ptr_eq(&w[0].mesh, &w[1].mesh)));
    }

    #[test]
    fn text_box_is_centred() {
        let font = Font::from_json(TEST_FONT).unwrap();
        let mut scene = Scene::default();
        let settings = SceneSettings {
            donuts: 0,
            ..SceneSettings::default()
        };
        let populated = populate(&mut scene, &font, &settings, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(populated.text_bounds.center().length() < 1e-5);
        assert_eq!(scene.objects.len(), 1);
    }
}
