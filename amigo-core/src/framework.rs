use sqlx::PgPool;

/// Runs pool-level (non-transactional) queries.
///
/// Each query is a plain struct with a `kanau::processor::Processor` impl
/// next to the entity it reads or writes.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
