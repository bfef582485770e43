pub mod assignment;
pub mod participant;

/// Current UTC time without offset, matching the `TIMESTAMP` columns.
pub(crate) fn now_primitive() -> time::PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(now.date(), now.time())
}
