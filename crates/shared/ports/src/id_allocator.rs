use sigma_core::ParticipantId;

/// Port for allocating participant ids to callers that register without one
///
/// The allocator only has to make collisions unlikely; the venue still
/// rejects a colliding id at registration time.
pub trait IdAllocator: Send + Sync {
    fn allocate(&self) -> ParticipantId;
}
