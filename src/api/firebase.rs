// Firebase Firestore REST API client
// Using service account JWT authentication

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::api::store::{KeyValueStore, StoreError};

/// Firebase service account credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub private_key: String,
    pub client_email: String,
}

/// JWT claims for Google OAuth2
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    sub: String,
    aud: String,
    iat: i64,
    exp: i64,
    scope: String,
}

/// Cached access token
struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Field holding the stored bytes in every document
const VALUE_FIELD: &str = "value";

/// Firebase REST API client
pub struct FirebaseClient {
    client: Client,
    service_account: ServiceAccount,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl FirebaseClient {
    /// Create a new Firebase client from service account JSON file
    pub fn from_file(client: Client, path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let service_account: ServiceAccount = serde_json::from_str(&content)?;

        Ok(Self {
            client,
            service_account,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Get access token (with caching)
    async fn get_access_token(&self) -> Result<String> {
        // Check cache first
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                // Return cached token if still valid (with 60s buffer)
                if cached.expires_at > chrono::Utc::now().timestamp() + 60 {
                    return Ok(cached.token.clone());
                }
            }
        }

        let token = self.generate_access_token().await?;

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at: chrono::Utc::now().timestamp() + 3600, // 1 hour
            });
        }

        Ok(token)
    }

    /// Generate a new access token using JWT
    async fn generate_access_token(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            iss: self.service_account.client_email.clone(),
            sub: self.service_account.client_email.clone(),
            aud: "https://oauth2.googleapis.com/token".to_string(),
            iat: now,
            exp: now + 3600,
            scope: "https://www.googleapis.com/auth/datastore".to_string(),
        };

        let key = EncodingKey::from_rsa_pem(self.service_account.private_key.as_bytes())?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        // Exchange JWT for access token
        let response = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await?;
            error!("Failed to get access token: {}", body);
            return Err(anyhow!("Failed to get access token"));
        }

        let data: Value = response.json().await?;
        let token = data["access_token"]
            .as_str()
            .ok_or_else(|| anyhow!("No access_token in response"))?;

        Ok(token.to_string())
    }

    /// Base URL for Firestore REST API
    fn base_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.service_account.project_id
        )
    }

    /// Get a raw Firestore document by path
    pub async fn get_document(&self, collection: &str, doc_id: &str) -> Result<Option<Value>> {
        let token = self.get_access_token().await?;
        let url = format!("{}/{}/{}", self.base_url(), collection, doc_id);

        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        if response.status() == 404 {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firebase error: {}", body);
            return Err(anyhow!("Firebase error: {}", status));
        }

        Ok(Some(response.json().await?))
    }

    /// Create or overwrite a document with the given Firestore fields
    pub async fn set_document(&self, collection: &str, doc_id: &str, fields: Value) -> Result<()> {
        let token = self.get_access_token().await?;
        let url = format!("{}/{}/{}", self.base_url(), collection, doc_id);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firebase error: {}", body);
            return Err(anyhow!("Firebase error: {}", status));
        }

        Ok(())
    }
}

/// Split `collection/doc` into its two parts
fn split_key(key: &str) -> Result<(&str, &str), StoreError> {
    match key.split_once('/') {
        Some((collection, doc_id)) if !collection.is_empty() && !doc_id.is_empty() => {
            Ok((collection, doc_id))
        }
        _ => Err(StoreError::Backend(format!("Invalid store key: {}", key))),
    }
}

/// Pull the stored bytes out of a Firestore document
fn decode_value_field(doc: &Value) -> Result<Option<Vec<u8>>, StoreError> {
    let encoded = match doc["fields"][VALUE_FIELD]["bytesValue"].as_str() {
        Some(s) => s,
        None => return Ok(None),
    };

    general_purpose::STANDARD
        .decode(encoded)
        .map(Some)
        .map_err(|e| StoreError::Decode(e.to_string()))
}

/// Firestore fields for a stored value
fn encode_value_fields(value: &[u8]) -> Value {
    json!({
        VALUE_FIELD: { "bytesValue": general_purpose::STANDARD.encode(value) },
        "updatedAt": { "timestampValue": chrono::Utc::now().to_rfc3339() }
    })
}

#[async_trait]
impl KeyValueStore for FirebaseClient {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let (collection, doc_id) = split_key(key)?;
        let doc = self
            .get_document(collection, doc_id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match doc {
            Some(doc) => decode_value_field(&doc),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let (collection, doc_id) = split_key(key)?;
        self.set_document(collection, doc_id, encode_value_fields(&value))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
