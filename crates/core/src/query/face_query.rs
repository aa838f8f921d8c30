use std::sync::{PoisonError, RwLock};

use crate::detection::domain::face_mesh::Keypoint;
use crate::query::arguments::parse_decimal;
use crate::query::view_transform::ViewTransform;
use crate::tracking::face_store::FaceStore;

/// Read side of the face list: coordinate and count queries.
///
/// Every query answers from the latest reconciled list; absent data is
/// `None`, never an error.
pub struct FaceQuery {
    store: FaceStore,
    transform: RwLock<ViewTransform>,
}

impl FaceQuery {
    pub fn new(store: FaceStore, transform: ViewTransform) -> Self {
        Self {
            store,
            transform: RwLock::new(transform),
        }
    }

    /// Stage x of `keypoint` on `person`, both 1-based.
    pub fn x(&self, person: usize, keypoint: usize) -> Option<f64> {
        let point = self.lookup(person, keypoint)?;
        Some(self.transform().map_x(point.x))
    }

    /// Stage y of `keypoint` on `person`, both 1-based.
    pub fn y(&self, person: usize, keypoint: usize) -> Option<f64> {
        let point = self.lookup(person, keypoint)?;
        Some(self.transform().map_y(point.y))
    }

    pub fn people_count(&self) -> usize {
        self.store.len()
    }

    /// Parses `ratio` into the scale. Unparseable input keeps the previous
    /// scale and returns `false`.
    pub fn set_ratio(&self, ratio: &str) -> bool {
        match parse_decimal(ratio) {
            Some(scale) => {
                self.set_scale(scale);
                true
            }
            None => {
                log::warn!("Ignoring ratio {ratio:?}: not a number");
                false
            }
        }
    }

    pub fn set_scale(&self, scale: f64) {
        self.transform_mut(|t| t.scale = scale);
    }

    pub fn set_mirrored(&self, mirrored: bool) {
        self.transform_mut(|t| t.mirrored = mirrored);
    }

    pub fn transform(&self) -> ViewTransform {
        *self.transform.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn transform_mut(&self, update: impl FnOnce(&mut ViewTransform)) {
        update(&mut self.transform.write().unwrap_or_else(PoisonError::into_inner));
    }

    fn lookup(&self, person: usize, keypoint: usize) -> Option<Keypoint> {
        self.store
            .keypoint(person.checked_sub(1)?, keypoint.checked_sub(1)?)
    }
}
