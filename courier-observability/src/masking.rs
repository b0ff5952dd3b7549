//! Secret masking for persisted request bodies.
//!
//! Only the copy handed to the log store is masked; the body forwarded to the
//! handler is never touched.

use crate::body::CapturedBody;
use serde_json::Value;

/// Replacement for every masked value.
pub const MASK: &str = "********";

/// Top-level JSON fields whose values are never persisted.
pub const MASKED_FIELDS: &[&str] = &["password", "id_token"];

/// Mask [`MASKED_FIELDS`] in a captured JSON object body.
///
/// Returns `(body, was_masked)`. Non-object bodies pass through unchanged.
pub fn mask_secrets(body: CapturedBody) -> (CapturedBody, bool) {
    match body {
        CapturedBody::Json(Value::Object(mut map)) => {
            let mut masked = false;
            for field in MASKED_FIELDS {
                if let Some(value) = map.get_mut(*field) {
                    *value = Value::String(MASK.to_string());
                    masked = true;
                }
            }
            (CapturedBody::Json(Value::Object(map)), masked)
        }
        other => (other, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn password_is_masked() {
        let (body, masked) = mask_secrets(CapturedBody::Json(json!({"username": "a", "password": "secret"})));
        assert!(masked);
        assert_eq!(body, CapturedBody::Json(json!({"username": "a", "password": "********"})));
    }

    #[test]
    fn id_token_is_masked() {
        let (body, masked) = mask_secrets(CapturedBody::Json(json!({"id_token": "eyJhbGciOi..."})));
        assert!(masked);
        assert_eq!(body, CapturedBody::Json(json!({"id_token": MASK})));
    }

    #[test]
    fn both_fields_masked_together() {
        let (body, _) = mask_secrets(CapturedBody::Json(json!({"password": 1, "id_token": null, "x": 2})));
        assert_eq!(body, CapturedBody::Json(json!({"password": MASK, "id_token": MASK, "x": 2})));
    }

    #[test]
    fn object_without_secrets_is_unchanged() {
        let original = json!({"username": "a", "remember": true});
        let (body, masked) = mask_secrets(CapturedBody::Json(original.clone()));
        assert!(!masked);
        assert_eq!(body, CapturedBody::Json(original));
    }

    #[test]
    fn nested_fields_are_not_masked() {
        let original = json!({"profile": {"password": "inner"}});
        let (body, masked) = mask_secrets(CapturedBody::Json(original.clone()));
        assert!(!masked);
        assert_eq!(body, CapturedBody::Json(original));
    }

    #[test]
    fn text_and_arrays_pass_through() {
        let (body, masked) = mask_secrets(CapturedBody::Text("password=secret".into()));
        assert!(!masked);
        assert_eq!(body, CapturedBody::Text("password=secret".into()));

        let (body, masked) = mask_secrets(CapturedBody::Json(json!([{"password": "x"}])));
        assert!(!masked);
        assert_eq!(body, CapturedBody::Json(json!([{"password": "x"}])));
    }

    #[test]
    fn absent_passes_through() {
        assert_eq!(mask_secrets(CapturedBody::Absent), (CapturedBody::Absent, false));
    }
}
