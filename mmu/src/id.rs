//!Implementation of [`PidAllocator`]
use crate::config::PID_BASE;
use crate::process::Pid;

/// Hands out process ids in increasing order.
///
/// Unlike frames, ids are never recycled: a terminated pid is gone for good.
pub(crate) struct PidAllocator {
    /// Next id to hand out
    current: Pid,
}

impl PidAllocator {
    ///Create an allocator starting at `PID_BASE`
    pub fn new() -> Self {
        PidAllocator { current: PID_BASE }
    }

    ///Allocate a pid(process identifier)
    pub fn alloc(&mut self) -> Pid {
        self.current += 1;
        self.current - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_above_reserved_range() {
        let mut pids = PidAllocator::new();
        assert_eq!(pids.alloc(), 1024);
        assert_eq!(pids.alloc(), 1025);
        assert_eq!(pids.alloc(), 1026);
    }
}
