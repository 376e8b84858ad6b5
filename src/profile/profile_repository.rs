use crate::{
    error::Result,
    message::message_source::ProfileLookup,
    profile::profile_models::Profile,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileLookup for ProfileRepository {
    async fn fetch_profiles(&self, ids: &HashSet<Uuid>) -> Result<HashMap<Uuid, Profile>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<Uuid> = ids.iter().copied().collect();
        let profiles = sqlx::query_as::<_, Profile>(
            "SELECT id, first_name, last_name, username, avatar_url
             FROM profiles
             WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
    }
}
