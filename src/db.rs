/// True when the error chain bottoms out in a Postgres unique-constraint
/// violation. Pre-write existence checks are a fast path only; the unique
/// indexes are authoritative, so lost races surface here and map to the
/// same user-facing error as the check.
pub(crate) fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

/// True when the error chain bottoms out in a foreign-key violation.
pub(crate) fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_foreign_key_violation())
}
