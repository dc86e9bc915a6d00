use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::store::FavoritesStore;
use crate::{config::FirebaseConfig, error::StoreError, identity::User, models::MovieId};

const FAVORITES_FIELD: &str = "favorites";

#[derive(Debug, Clone, Copy)]
enum ArrayTransform {
    Append,
    Remove,
}

impl ArrayTransform {
    fn key(self) -> &'static str {
        match self {
            Self::Append => "appendMissingElements",
            Self::Remove => "removeAllFromArray",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

/// Favorites kept in one Firestore document per user (`favorites/{uid}`).
#[derive(Debug, Clone)]
pub struct FirestoreFavoritesStore {
    http: Client,
    base_url: String,
    project_id: String,
    collection: String,
}

impl FirestoreFavoritesStore {
    /// Build a store from configuration.
    pub fn new(config: &FirebaseConfig) -> Result<Self, StoreError> {
        let http = Client::builder()
            .build()
            .map_err(|err| StoreError::ReadFailed(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.firestore_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            collection: config.favorites_collection.clone(),
        })
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn document_name(&self, user: &User) -> String {
        format!("{}/{}/{}", self.database_path(), self.collection, user.id)
    }

    fn commit_body(&self, user: &User, movie_id: MovieId, transform: ArrayTransform) -> Value {
        let mut field_transform = serde_json::Map::new();
        field_transform.insert("fieldPath".to_string(), json!(FAVORITES_FIELD));
        field_transform.insert(
            transform.key().to_string(),
            json!({ "values": [{ "integerValue": movie_id.to_string() }] }),
        );

        json!({
            "writes": [{
                "update": { "name": self.document_name(user), "fields": {} },
                "updateMask": { "fieldPaths": [] },
                "updateTransforms": [Value::Object(field_transform)]
            }]
        })
    }

    fn check_target(&self, user: &User) -> Result<(), String> {
        if user.id.is_empty() {
            return Err("no signed-in user".to_string());
        }
        if self.project_id.trim().is_empty() {
            return Err("no Firebase project configured".to_string());
        }
        Ok(())
    }

    async fn commit(
        &self,
        user: &User,
        movie_id: MovieId,
        transform: ArrayTransform,
    ) -> Result<(), StoreError> {
        let write_failed = |reason: String| StoreError::WriteFailed { movie_id, reason };
        self.check_target(user).map_err(write_failed)?;

        let url = format!("{}/{}:commit", self.base_url, self.database_path());
        let response = self
            .http
            .post(&url)
            .bearer_auth(&user.id_token)
            .json(&self.commit_body(user, movie_id, transform))
            .send()
            .await
            .map_err(|err| write_failed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(write_failed(format!("{status}: {}", body.trim())));
        }
        debug!(user_id = %user.id, %movie_id, ?transform, "favorites document updated");
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for FirestoreFavoritesStore {
    async fn merge_add_id(&self, user: &User, movie_id: MovieId) -> Result<(), StoreError> {
        self.commit(user, movie_id, ArrayTransform::Append).await
    }

    async fn merge_remove_id(&self, user: &User, movie_id: MovieId) -> Result<(), StoreError> {
        self.commit(user, movie_id, ArrayTransform::Remove).await
    }

    async fn load_ids(&self, user: &User) -> Result<Vec<MovieId>, StoreError> {
        self.check_target(user).map_err(StoreError::ReadFailed)?;

        let url = format!("{}/{}", self.base_url, self.document_name(user));
        let response = self
            .http
            .get(&url)
            .bearer_auth(&user.id_token)
            .send()
            .await
            .map_err(|err| StoreError::ReadFailed(err.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(Vec::new()),
            status if !status.is_success() => {
                return Err(StoreError::ReadFailed(status.to_string()));
            }
            _ => {}
        }

        let document: Document = response
            .json()
            .await
            .map_err(|err| StoreError::ReadFailed(err.to_string()))?;
        Ok(favorite_ids(&document))
    }
}

fn favorite_ids(document: &Document) -> Vec<MovieId> {
    document
        .fields
        .get(FAVORITES_FIELD)
        .and_then(|field| field.pointer("/arrayValue/values"))
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(value_to_id).collect())
        .unwrap_or_default()
}

fn value_to_id(value: &Value) -> Option<MovieId> {
    if let Some(raw) = value.get("integerValue") {
        return match raw {
            Value::String(text) => text.parse().ok().map(MovieId),
            Value::Number(num) => num.as_u64().map(MovieId),
            _ => None,
        };
    }
    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .filter(|num| *num >= 0.0 && num.fract() == 0.0)
        .map(|num| MovieId(num as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FirestoreFavoritesStore {
        FirestoreFavoritesStore::new(&FirebaseConfig {
            project_id: "movieapp".to_string(),
            firestore_url: "http://127.0.0.1:9/v1/".to_string(),
            ..FirebaseConfig::default()
        })
        .expect("store should build")
    }

    #[test]
    fn document_is_keyed_by_user() {
        let user = User::new("u1", "u1@example.com");
        assert_eq!(
            store().document_name(&user),
            "projects/movieapp/databases/(default)/documents/favorites/u1"
        );
    }

    #[test]
    fn commit_body_uses_array_transforms() {
        let user = User::new("u1", "u1@example.com");
        let body = store().commit_body(&user, MovieId(603), ArrayTransform::Append);
        let transform = &body["writes"][0]["updateTransforms"][0];
        assert_eq!(transform["fieldPath"], "favorites");
        assert_eq!(
            transform["appendMissingElements"]["values"][0]["integerValue"],
            "603"
        );

        let body = store().commit_body(&user, MovieId(603), ArrayTransform::Remove);
        assert!(body["writes"][0]["updateTransforms"][0]["removeAllFromArray"].is_object());
    }

    #[test]
    fn parses_favorite_ids_from_document() {
        let document: Document = serde_json::from_value(json!({
            "name": "projects/movieapp/databases/(default)/documents/favorites/u1",
            "fields": {
                "favorites": { "arrayValue": { "values": [
                    { "integerValue": "603" },
                    { "doubleValue": 862.0 },
                    { "stringValue": "bogus" }
                ] } }
            }
        }))
        .expect("document should parse");
        assert_eq!(favorite_ids(&document), vec![MovieId(603), MovieId(862)]);

        let empty: Document = serde_json::from_value(json!({ "name": "x" }))
            .expect("document should parse");
        assert!(favorite_ids(&empty).is_empty());
    }

    #[tokio::test]
    async fn blank_user_is_rejected_locally() {
        let user = User::new("", "");
        let err = store()
            .merge_add_id(&user, MovieId(1))
            .await
            .expect_err("write must fail");
        assert!(matches!(err, StoreError::WriteFailed { movie_id: MovieId(1), .. }));
    }
}
