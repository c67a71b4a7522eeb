//! Compute-device placement.
//!
//! Models sit offloaded between calls and are moved onto the compute device
//! only for the duration of one operation.  [`PlacementGuard`] ties that
//! window to a scope: acquiring it activates the model, and dropping it
//! offloads the model again on every exit path, `?` and panics included.

use std::fmt;

use super::ModelError;

/// Where a model runs while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputeDevice {
    Cpu,
    Cuda(u32),
}

impl ComputeDevice {
    /// `Cuda(index)` when `use_gpu`, otherwise `Cpu`.
    pub fn select(use_gpu: bool, index: u32) -> Self {
        if use_gpu {
            Self::Cuda(index)
        } else {
            Self::Cpu
        }
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda(i) => write!(f, "cuda:{i}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Offloaded,
    Active(ComputeDevice),
}

/// A model that can be moved between the compute device and offload.
pub trait Placeable: Send + Sync {
    fn place(&self, placement: Placement) -> Result<(), ModelError>;
}

/// Keeps a model on the compute device until dropped.
///
/// ```rust
/// use vallex_studio::model::{ComputeDevice, ModelError, Placeable, Placement, PlacementGuard};
///
/// struct Noop;
/// impl Placeable for Noop {
///     fn place(&self, _: Placement) -> Result<(), ModelError> { Ok(()) }
/// }
///
/// let model = Noop;
/// {
///     let _active = PlacementGuard::acquire(&model, ComputeDevice::Cpu)?;
///     // model is active here
/// }
/// // and offloaded again here
/// # Ok::<(), ModelError>(())
/// ```
pub struct PlacementGuard<'a, P: Placeable + ?Sized> {
    model: &'a P,
    device: ComputeDevice,
}

impl<'a, P: Placeable + ?Sized> PlacementGuard<'a, P> {
    /// Activate `model` on `device`.
    ///
    /// If activation fails the model is asked to offload before the error is
    /// returned, so a partial move does not leak device memory.
    pub fn acquire(model: &'a P, device: ComputeDevice) -> Result<Self, ModelError> {
        if let Err(e) = model.place(Placement::Active(device)) {
            if let Err(undo) = model.place(Placement::Offloaded) {
                log::warn!("placement: offload after failed activation also failed: {undo}");
            }
            return Err(e);
        }
        log::debug!("placement: active on {device}");
        Ok(Self { model, device })
    }

    pub fn device(&self) -> ComputeDevice {
        self.device
    }
}

impl<P: Placeable + ?Sized> Drop for PlacementGuard<'_, P> {
    fn drop(&mut self) {
        match self.model.place(Placement::Offloaded) {
            Ok(()) => log::debug!("placement: offloaded from {}", self.device),
            Err(e) => log::warn!("placement: failed to offload from {}: {e}", self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        log: Mutex<Vec<Placement>>,
        fail_activate: bool,
    }

    impl Placeable for Recording {
        fn place(&self, placement: Placement) -> Result<(), ModelError> {
            self.log.lock().unwrap().push(placement);
            if self.fail_activate && matches!(placement, Placement::Active(_)) {
                return Err(ModelError::Placement("no device".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn guard_offloads_on_drop() {
        let m = Recording::default();
        {
            let g = PlacementGuard::acquire(&m, ComputeDevice::Cuda(1)).unwrap();
            assert_eq!(g.device(), ComputeDevice::Cuda(1));
        }
        assert_eq!(
            *m.log.lock().unwrap(),
            vec![
                Placement::Active(ComputeDevice::Cuda(1)),
                Placement::Offloaded
            ]
        );
    }

    #[test]
    fn guard_offloads_on_early_return() {
        fn work(m: &Recording) -> Result<(), ModelError> {
            let _g = PlacementGuard::acquire(m, ComputeDevice::Cpu)?;
            Err(ModelError::EmptyOutput)
        }
        let m = Recording::default();
        assert!(work(&m).is_err());
        assert_eq!(m.log.lock().unwrap().last(), Some(&Placement::Offloaded));
    }

    #[test]
    fn failed_activation_still_offloads() {
        let m = Recording {
            fail_activate: true,
            ..Default::default()
        };
        assert!(PlacementGuard::acquire(&m, ComputeDevice::Cuda(0)).is_err());
        assert_eq!(m.log.lock().unwrap().last(), Some(&Placement::Offloaded));
    }

    #[test]
    fn works_through_trait_objects() {
        let m: Box<dyn Placeable> = Box::new(Recording::default());
        let _g = PlacementGuard::acquire(m.as_ref(), ComputeDevice::Cpu).unwrap();
    }

    #[test]
    fn device_display_and_select() {
        assert_eq!(ComputeDevice::Cpu.to_string(), "cpu");
        assert_eq!(ComputeDevice::Cuda(2).to_string(), "cuda:2");
        assert_eq!(ComputeDevice::select(false, 3), ComputeDevice::Cpu);
        assert_eq!(ComputeDevice::select(true, 3), ComputeDevice::Cuda(3));
    }
}
