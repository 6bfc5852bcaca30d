// Firebase Firestore REST API client
// Using service account JWT authentication

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Tokens are refreshed this many seconds before they expire
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Page size used when listing whole collections
const LIST_PAGE_SIZE: usize = 300;

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

/// Filter for structured queries
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    /// Field path, e.g., "driver_id" or "status"
    pub field: String,
    /// Operator: "EQUAL" or "IN"
    pub op: String,
    /// Value in Firestore format (e.g., { "stringValue": "..." })
    pub value: Value,
}

impl QueryFilter {
    /// Create a new filter with a string value
    pub fn string_eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: "EQUAL".to_string(),
            value: json!({ "stringValue": value.into() }),
        }
    }

    /// Create an IN filter over string values (Firestore allows at most 30)
    pub fn string_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = values
            .into_iter()
            .map(|v| json!({ "stringValue": v.into() }))
            .collect();
        Self {
            field: field.into(),
            op: "IN".to_string(),
            value: json!({ "arrayValue": { "values": values } }),
        }
    }
}

/// Firebase REST API client
pub struct FirebaseClient {
    client: Client,
    service_account: ServiceAccount,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl std::fmt::Debug for FirebaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseClient")
            .field("project_id", &self.service_account.project_id)
            .field("client_email", &self.service_account.client_email)
            .finish()
    }
}

impl FirebaseClient {
    pub fn new(client: Client, service_account: ServiceAccount) -> Self {
        Self {
            client,
            service_account,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a new Firebase client from service account JSON file
    pub fn from_file(client: Client, path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading service account file {}", path))?;
        let service_account: ServiceAccount =
            serde_json::from_str(&content).context("parsing service account JSON")?;

        Ok(Self::new(client, service_account))
    }

    pub fn project_id(&self) -> &str {
        &self.service_account.project_id
    }

    /// Get access token (with caching)
    async fn get_access_token(&self) -> Result<String> {
        // Check cache first
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now().timestamp() + TOKEN_EXPIRY_MARGIN_SECS {
                    return Ok(cached.token.clone());
                }
            }
        }

        let token = self.generate_access_token().await?;

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at: Utc::now().timestamp() + TOKEN_LIFETIME_SECS,
            });
        }

        Ok(token)
    }

    /// Generate a new access token using JWT
    async fn generate_access_token(&self) -> Result<String> {
        let now = Utc::now().timestamp();

        let claims = Claims {
            iss: self.service_account.client_email.clone(),
            sub: self.service_account.client_email.clone(),
            aud: "https://oauth2.googleapis.com/token".to_string(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
            scope: "https://www.googleapis.com/auth/datastore".to_string(),
        };

        // Encode JWT
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

    /// Resource path of the database root
    fn documents_path(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.service_account.project_id
        )
    }

    /// Base URL for Firestore REST API
    fn base_url(&self) -> String {
        format!("https://firestore.googleapis.com/v1/{}", self.documents_path())
    }

    /// Get a document by path
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

        let doc: Value = response.json().await?;
        Ok(Some(from_firestore_document(&doc)))
    }

    /// List every document of a top-level collection - returns (id, data) tuples
    /// Handles pagination to fetch ALL documents
    pub async fn list_collection(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let token = self.get_access_token().await?;
        let base_url = format!("{}/{}", self.base_url(), collection);

        let mut all_docs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!("{}?pageSize={}", base_url, LIST_PAGE_SIZE);
            if let Some(ref t) = page_token {
                url.push_str(&format!("&pageToken={}", t));
            }

            let response = self.client.get(&url).bearer_auth(&token).send().await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await?;
                debug!("Firebase error: {}", body);
                return Err(anyhow!("Firebase error: {}", status));
            }

            let result: Value = response.json().await?;
            all_docs.extend(documents_with_ids(&result["documents"]));

            match result.get("nextPageToken").and_then(|t| t.as_str()) {
                Some(t) => page_token = Some(t.to_string()),
                None => break,
            }
        }

        debug!("Listed {} documents from {}", all_docs.len(), collection);
        Ok(all_docs)
    }

    // ============ Structured Queries ============

    /// Run a structured query on a top-level collection with server-side filtering.
    /// Returns Vec<(doc_id, data)>.
    ///
    /// # Arguments
    /// * `collection` - e.g., "ride_information"
    /// * `filters` - combined with AND
    pub async fn run_query(
        &self,
        collection: &str,
        filters: &[QueryFilter],
    ) -> Result<Vec<(String, Value)>> {
        let token = self.get_access_token().await?;
        let url = format!(
            "https://firestore.googleapis.com/v1/{}:runQuery",
            self.documents_path()
        );

        let body = json!({
            "structuredQuery": build_structured_query(collection, filters)
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firebase query error: {}", body);
            return Err(anyhow!("Firebase query error: {}", status));
        }

        // Response is an array of { document: {...} } or { readTime: ... }
        let results: Vec<Value> = response.json().await?;
        let docs: Vec<(String, Value)> = results
            .iter()
            .filter_map(|item| item.get("document"))
            .filter_map(document_with_id)
            .collect();

        debug!("Query on {} returned {} documents", collection, docs.len());
        Ok(docs)
    }
}

/// Build the `structuredQuery` body for a runQuery request
pub fn build_structured_query(collection: &str, filters: &[QueryFilter]) -> Value {
    let mut query = json!({
        "from": [{ "collectionId": collection }]
    });

    let mut clauses: Vec<Value> = filters
        .iter()
        .map(|f| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": &f.field },
                    "op": &f.op,
                    "value": f.value.clone()
                }
            })
        })
        .collect();

    if clauses.len() == 1 {
        query["where"] = clauses.remove(0);
    } else if !clauses.is_empty() {
        query["where"] = json!({
            "compositeFilter": {
                "op": "AND",
                "filters": clauses
            }
        });
    }

    query
}

/// Decode an array of raw Firestore documents into (id, data) pairs
fn documents_with_ids(docs: &Value) -> Vec<(String, Value)> {
    docs.as_array()
        .map(|arr| arr.iter().filter_map(document_with_id).collect())
        .unwrap_or_default()
}

/// Document id is the last segment of its resource name
fn document_with_id(doc: &Value) -> Option<(String, Value)> {
    let id = doc["name"].as_str()?.rsplit('/').next()?.to_string();
    Some((id, from_firestore_document(doc)))
}

/// Convert Firestore document to regular JSON
pub fn from_firestore_document(doc: &Value) -> Value {
    if let Some(fields) = doc.get("fields") {
        from_firestore_value(&json!({ "mapValue": { "fields": fields } }))
    } else {
        Value::Null
    }
}

/// Convert Firestore value to regular JSON value
fn from_firestore_value(value: &Value) -> Value {
    if let Some(s) = value.get("stringValue") {
        return s.clone();
    }
    if let Some(n) = value.get("integerValue") {
        if let Some(s) = n.as_str() {
            return s.parse::<i64>().map(Value::from).unwrap_or(Value::Null);
        }
        return n.clone();
    }
    if let Some(n) = value.get("doubleValue") {
        return n.clone();
    }
    if let Some(b) = value.get("booleanValue") {
        return b.clone();
    }
    if let Some(ts) = value.get("timestampValue") {
        return ts.clone();
    }
    if let Some(r) = value.get("referenceValue") {
        return r.clone();
    }
    if value.get("nullValue").is_some() {
        return Value::Null;
    }
    if let Some(arr) = value.get("arrayValue") {
        let values = arr
            .get("values")
            .and_then(|v| v.as_array())
            .map(|vals| vals.iter().map(from_firestore_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = value.get("mapValue") {
        let fields: serde_json::Map<String, Value> = map
            .get("fields")
            .and_then(|f| f.as_object())
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), from_firestore_value(v)))
                    .collect()
            })
            .unwrap_or_default();
        return Value::Object(fields);
    }
    Value::Null
}
