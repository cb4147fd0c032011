//! Snapshot pipeline: locate, clone, neutralize, attach, rasterize, detach.

use crate::{CardSize, FaceTarget, RenderSurface, Result};
use log::{debug, trace};
use std::ops::{Deref, DerefMut};

/// A rasterized face
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub target: FaceTarget,
    pub png: Vec<u8>,
}

/// Keeps a clone attached for as long as it lives; detaches on drop so the
/// scratch slot is released on every exit path.
struct Attached<'a, S: RenderSurface> {
    surface: &'a mut S,
}

impl<'a, S: RenderSurface> Attached<'a, S> {
    fn new(surface: &'a mut S, node: S::Node) -> Result<Self> {
        surface.attach(node)?;
        Ok(Self { surface })
    }
}

impl<S: RenderSurface> Deref for Attached<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: RenderSurface> DerefMut for Attached<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: RenderSurface> Drop for Attached<'_, S> {
    fn drop(&mut self) {
        self.surface.detach();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SnapshotPipeline {
    pub card_size: CardSize,
    pub scale: u32,
}

impl SnapshotPipeline {
    pub fn new(card_size: CardSize, scale: u32) -> Self {
        Self { card_size, scale }
    }

    /// Capture one face. The face is chosen structurally by `target`; the
    /// live flip state of the card plays no part because the clone's
    /// transform is cleared before capture.
    pub fn capture<S: RenderSurface>(&self, surface: &mut S, target: &FaceTarget) -> Result<Snapshot> {
        trace!("cloning {}", target);
        let mut node = surface.clone_face(target)?;
        surface.neutralize(&mut node, self.card_size)?;

        let mut attached = Attached::new(surface, node)?;
        let png = attached.rasterize_attached(self.scale, self.card_size)?;
        drop(attached);

        debug!("captured {} ({} bytes)", target, png.len());
        Ok(Snapshot {
            target: target.clone(),
            png,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    /// Surface double that records calls and can fail rasterization
    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
        attached: bool,
        fail_raster: bool,
    }

    impl RenderSurface for Recording {
        type Node = String;

        fn count(&self, _selector: &str) -> Result<usize> {
            Ok(1)
        }

        fn clone_face(&mut self, target: &FaceTarget) -> Result<String> {
            self.calls.push("clone".into());
            if target.index > 0 {
                return Err(Error::ElementNotFound(target.to_string()));
            }
            Ok(target.selector.clone())
        }

        fn neutralize(&mut self, node: &mut String, size: CardSize) -> Result<()> {
            self.calls.push(format!("neutralize {}x{}", size.width, size.height));
            node.push_str(" flat");
            Ok(())
        }

        fn attach(&mut self, node: String) -> Result<()> {
            self.calls.push(format!("attach {}", node));
            self.attached = true;
            Ok(())
        }

        fn rasterize_attached(&mut self, scale: u32, _size: CardSize) -> Result<Vec<u8>> {
            self.calls.push(format!("rasterize {}", scale));
            if self.fail_raster {
                return Err(Error::RasterizationFailure("boom".into()));
            }
            Ok(vec![1, 2, 3])
        }

        fn detach(&mut self) {
            self.calls.push("detach".into());
            self.attached = false;
        }
    }

    #[test]
    fn steps_run_in_order() {
        let mut s = Recording::default();
        let p = SnapshotPipeline::new(CardSize::default(), 5);
        let snap = p.capture(&mut s, &FaceTarget::new(".f", 0)).unwrap();
        assert_eq!(snap.png, vec![1, 2, 3]);
        assert_eq!(
            s.calls,
            vec!["clone", "neutralize 219x332", "attach .f flat", "rasterize 5", "detach"]
        );
        assert!(!s.attached);
    }

    #[test]
    fn detaches_when_rasterization_fails() {
        let mut s = Recording { fail_raster: true, ..Default::default() };
        let p = SnapshotPipeline::new(CardSize::default(), 2);
        let err = p.capture(&mut s, &FaceTarget::new(".f", 0)).unwrap_err();
        assert!(err.is_per_face());
        assert!(!s.attached);
        assert_eq!(s.calls.last().map(String::as_str), Some("detach"));
    }

    #[test]
    fn missing_element_never_attaches() {
        let mut s = Recording::default();
        let p = SnapshotPipeline::new(CardSize::default(), 1);
        let err = p.capture(&mut s, &FaceTarget::new(".f", 3)).unwrap_err();
        assert!(matches!(err, Error::ElementNotFound(_)));
        assert_eq!(s.calls, vec!["clone"]);
    }
}
