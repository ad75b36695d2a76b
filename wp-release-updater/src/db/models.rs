use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CachedTransient {
    pub key: String,
    pub value: String,
    pub expires_at: i64,
}
