use crate::entities::CreatorId;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// The public face of a creator. The widget secret token is never loaded
/// into this struct; it is only ever compared inside the database.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Creator {
    pub id: CreatorId,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
/// Resolve the secret token presented by an overlay widget.
pub struct GetCreatorBySecretToken {
    pub secret_token: String,
}

impl Processor<GetCreatorBySecretToken> for DatabaseProcessor {
    type Output = Option<Creator>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetCreatorBySecretToken")]
    async fn process(&self, query: GetCreatorBySecretToken) -> Result<Option<Creator>, sqlx::Error> {
        let creator = sqlx::query_as::<_, Creator>(
            r#"
            SELECT id, username, display_name
            FROM creators
            WHERE widget_secret_token = $1
            "#,
        )
        .bind(query.secret_token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creator)
    }
}

#[derive(Debug, Clone)]
pub struct GetCreatorByUsername {
    pub username: String,
}

impl Processor<GetCreatorByUsername> for DatabaseProcessor {
    type Output = Option<Creator>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetCreatorByUsername")]
    async fn process(&self, query: GetCreatorByUsername) -> Result<Option<Creator>, sqlx::Error> {
        let creator = sqlx::query_as::<_, Creator>(
            r#"
            SELECT id, username, display_name
            FROM creators
            WHERE username = $1
            "#,
        )
        .bind(query.username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creator)
    }
}
