use crate::model::{generate_id, Id, Query};
use serde::{Deserialize, Serialize};

/// A clinical-trial question/answer record. Owned outside this service;
/// queries only ever reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormData {
    pub id: Id,
    pub question: String,
    pub answer: String,
}

impl FormData {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self::new_with_id(generate_id(), question, answer)
    }

    pub fn new_with_id(id: Id, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id,
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn with_query(self, query: Option<Query>) -> FormDataWithQuery {
        FormDataWithQuery {
            id: self.id,
            question: self.question,
            answer: self.answer,
            query,
        }
    }
}

/// FormData joined with its (at most one) query, as served by `GET /form-data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDataWithQuery {
    pub id: Id,
    pub question: String,
    pub answer: String,
    pub query: Option<Query>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDataListing {
    pub total: usize,
    pub form_data: Vec<FormDataWithQuery>,
}

impl From<Vec<FormDataWithQuery>> for FormDataListing {
    fn from(form_data: Vec<FormDataWithQuery>) -> Self {
        Self {
            total: form_data.len(),
            form_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_serializes_null_query_and_total() {
        let record = FormData::new("Is X present?", "Yes").with_query(None);
        let listing = FormDataListing::from(vec![record.clone()]);

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["total"], json!(1));
        assert_eq!(value["formData"][0]["question"], json!("Is X present?"));
        assert_eq!(value["formData"][0]["id"], json!(record.id.to_string()));
        assert!(value["formData"][0]["query"].is_null());
    }
}
