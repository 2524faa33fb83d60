use sqlx::PgPool;

/// Runs entity queries against the shared pool.
///
/// Every query is a `kanau::processor::Processor` implementation on this
/// type, one input struct per statement.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
