pub mod application;
pub mod exclusions;
pub mod job;
pub mod skipped_job;

#[cfg(test)]
pub async fn test_user(pool: &sqlx::PgPool, email: &str) -> i32 {
    let (id,): (i32,) = sqlx::query_as("INSERT INTO users (email) VALUES ($1) RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap();
    id
}
