use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Flag telling the display layer not to read transform output.
///
/// Each in-flight invocation holds a [`RedrawGuard`]; redraw is suppressed while
/// at least one guard is alive. Clones share the same counter.
///
/// # Example
///
/// ```
/// use flicker::RedrawGate;
///
/// let gate = RedrawGate::default();
/// {
///     let _guard = gate.suppress();
///     assert!(gate.is_suppressed());
/// }
/// assert!(!gate.is_suppressed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RedrawGate {
    holders: Arc<AtomicUsize>,
}

impl RedrawGate {
    /// The process-wide gate.
    pub fn global() -> &'static RedrawGate {
        static GLOBAL: OnceLock<RedrawGate> = OnceLock::new();
        GLOBAL.get_or_init(RedrawGate::default)
    }

    /// Suppress redraw until the returned guard is dropped.
    pub fn suppress(&self) -> RedrawGuard {
        self.holders.fetch_add(1, Ordering::AcqRel);
        RedrawGuard {
            holders: self.holders.clone(),
        }
    }

    /// Whether the display must not read transform output now.
    pub fn is_suppressed(&self) -> bool {
        self.holders.load(Ordering::Acquire) > 0
    }
}

/// Keeps redraw suppressed while alive.
#[derive(Debug)]
pub struct RedrawGuard {
    holders: Arc<AtomicUsize>,
}

impl Drop for RedrawGuard {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_guards() {
        let gate = RedrawGate::default();
        let a = gate.suppress();
        let b = gate.clone().suppress();
        drop(a);
        assert!(gate.is_suppressed());
        drop(b);
        assert!(!gate.is_suppressed());
    }
}
