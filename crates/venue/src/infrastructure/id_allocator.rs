use sigma_core::ParticipantId;
use sigma_ports::IdAllocator;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Random v4 uuid ids; the default allocator
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidAllocator;

impl UuidAllocator {
    pub fn new() -> Self {
        Self
    }
}

impl IdAllocator for UuidAllocator {
    fn allocate(&self) -> ParticipantId {
        ParticipantId::new(Uuid::new_v4().to_string())
    }
}

/// `<prefix>-1`, `<prefix>-2`, ... for reproducible runs
#[derive(Debug)]
pub struct SequentialAllocator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdAllocator for SequentialAllocator {
    fn allocate(&self) -> ParticipantId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ParticipantId::new(format!("{}-{}", self.prefix, n))
    }
}
