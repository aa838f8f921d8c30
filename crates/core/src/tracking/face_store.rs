//! Authoritative list of currently tracked faces.
//!
//! Single writer (the detection batch handler), many readers (queries).
//! A batch is applied under one write lock, so readers see either the
//! previous list or the fully reconciled one.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::detection::domain::face_mesh::{DetectionBatch, Keypoint, TrackedFace};

/// Cheap to clone; clones share the same list.
#[derive(Clone, Debug, Default)]
pub struct FaceStore {
    faces: Arc<RwLock<Vec<TrackedFace>>>,
}

impl FaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one detection batch.
    ///
    /// Shrinks the list to the batch length, then replaces (or appends) the
    /// face at every batch index. Positions are not matched across batches:
    /// person N is whatever the detector reported N-th.
    pub fn reconcile(&self, batch: DetectionBatch) {
        let mut faces = self.write();
        if batch.len() < faces.len() {
            faces.truncate(batch.len());
        }
        for (index, keypoints) in batch.into_iter().enumerate() {
            let face = TrackedFace::from(keypoints);
            if index < faces.len() {
                faces[index] = face;
            } else {
                faces.push(face);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// 0-based face and keypoint lookup; `None` when either is out of range.
    pub fn keypoint(&self, face: usize, keypoint: usize) -> Option<Keypoint> {
        self.read()
            .get(face)
            .and_then(|f| f.keypoint(keypoint))
            .copied()
    }

    pub fn snapshot(&self) -> Vec<TrackedFace> {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<TrackedFace>> {
        self.faces.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<TrackedFace>> {
        self.faces.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_mesh::RawFace;
    use rstest::rstest;
    use std::thread;

    fn face(x: f64) -> RawFace {
        vec![Keypoint::planar(x, x + 1.0), Keypoint::planar(x + 2.0, x + 3.0)]
    }

    fn batch(xs: &[f64]) -> DetectionBatch {
        xs.iter().map(|&x| face(x)).collect()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = FaceStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.keypoint(0, 0), None);
    }

    #[rstest]
    #[case::shrink(&[1.0, 2.0, 3.0], &[9.0])]
    #[case::grow(&[1.0], &[7.0, 8.0, 9.0])]
    #[case::same(&[1.0, 2.0], &[5.0, 6.0])]
    #[case::to_empty(&[1.0, 2.0], &[])]
    fn test_batch_fully_replaces_list(#[case] before: &[f64], #[case] after: &[f64]) {
        let store = FaceStore::new();
        store.reconcile(batch(before));

        store.reconcile(batch(after));

        let expected: Vec<TrackedFace> = batch(after).into_iter().map(TrackedFace::from).collect();
        assert_eq!(store.len(), after.len());
        assert_eq!(store.snapshot(), expected);
    }

    #[test]
    fn test_count_follows_two_then_one() {
        let store = FaceStore::new();
        assert_eq!(store.len(), 0);
        store.reconcile(batch(&[10.0, 20.0]));
        assert_eq!(store.len(), 2);
        store.reconcile(batch(&[30.0]));
        assert_eq!(store.len(), 1);
        assert_eq!(store.keypoint(1, 0), None);
        assert_eq!(store.keypoint(0, 0), Some(Keypoint::planar(30.0, 31.0)));
    }

    #[test]
    fn test_keypoint_out_of_range() {
        let store = FaceStore::new();
        store.reconcile(batch(&[1.0]));
        assert_eq!(store.keypoint(0, 2), None);
        assert_eq!(store.keypoint(0, 1), Some(Keypoint::planar(3.0, 4.0)));
    }

    #[test]
    fn test_clones_share_state() {
        let store = FaceStore::new();
        let reader = store.clone();
        store.reconcile(batch(&[1.0, 2.0]));
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn test_readers_never_see_partial_batch() {
        let store = FaceStore::new();
        let writer = store.clone();

        let handle = thread::spawn(move || {
            for i in 0..500 {
                let n = if i % 2 == 0 { 3 } else { 1 };
                let x = i as f64;
                writer.reconcile((0..n).map(|_| face(x)).collect());
            }
        });

        for _ in 0..500 {
            let faces = store.snapshot();
            assert!(faces.len() == 0 || faces.len() == 1 || faces.len() == 3);
            // Every face in one snapshot comes from the same batch.
            if let Some(first) = faces.first() {
                assert!(faces.iter().all(|f| f == first));
            }
        }
        handle.join().unwrap();
    }
}
