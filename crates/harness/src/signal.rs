use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// External fault indicator read once per frame.
///
/// A test driver (a memory tester running alongside, say) raises it when it
/// detects corruption; the harness then switches the clear colour to a
/// pulsing diagnostic.
pub trait FaultSignal {
    fn fault_detected(&self) -> bool;
}

/// Fault injection compiled out: never reports a fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFault;

impl FaultSignal for NoFault {
    fn fault_detected(&self) -> bool {
        false
    }
}

/// A shareable flag another thread can raise.
#[derive(Debug, Clone, Default)]
pub struct FaultFlag(Arc<AtomicBool>);

impl FaultFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FaultSignal for FaultFlag {
    fn fault_detected(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Stop request checked at each frame boundary, after `present`.
///
/// [`CancellationToken::never`] keeps the loop running forever.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    /// Remaining frames before the token trips by itself.
    budget: Option<Arc<AtomicU64>>,
}

impl CancellationToken {
    pub fn never() -> Self {
        Self::default()
    }

    /// A token that trips after `frames` frame boundaries.
    pub fn after_frames(frames: u64) -> Self {
        let token = Self {
            cancelled: Arc::default(),
            budget: Some(Arc::new(AtomicU64::new(frames))),
        };
        if frames == 0 {
            token.cancel();
        }
        token
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Record one completed frame and report whether the run should stop.
    pub fn frame_boundary(&self) -> bool {
        if let Some(budget) = &self.budget {
            let left = budget
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .map(|prev| prev - 1)
                .unwrap_or(0);
            if left == 0 {
                self.cancel();
            }
        }
        self.is_cancelled()
    }
}
