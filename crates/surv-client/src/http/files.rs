/*
[INPUT]:  File bytes with the owning job, customer or invoice
[OUTPUT]: Upload metadata and attachment listings
[POS]:    HTTP layer - attachment endpoints (multipart upload)
[UPDATE]: When upload fields or storage routes change
*/

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::http::{Result, SurvClient};
use crate::types::{FileEntity, FileUpload, MessageResponse, StoredFile, UploadedFile};

impl SurvClient {
    /// POST /api/v1/files/upload (multipart: file, entity_type, entity_id,
    /// category, description)
    pub async fn upload_file(&self, upload: &FileUpload) -> Result<UploadedFile> {
        upload.validate()?;
        debug!(
            entity = %upload.entity_type,
            entity_id = %upload.entity_id,
            bytes = upload.content.len(),
            "uploading file"
        );
        let builder = self
            .request(Method::POST, "/api/v1/files/upload")?
            .multipart(upload_form(upload)?);
        self.send_json(builder).await
    }

    /// Newest first.
    ///
    /// GET /api/v1/files/{entity_type}/{entity_id}
    pub async fn list_files(&self, entity: FileEntity, entity_id: &str) -> Result<Vec<StoredFile>> {
        let builder = self.request(
            Method::GET,
            &format!("/api/v1/files/{}/{entity_id}", entity.as_str()),
        )?;
        self.send_json(builder).await
    }

    /// DELETE /api/v1/files/{id}
    pub async fn delete_file(&self, id: &str) -> Result<MessageResponse> {
        let builder = self.request(Method::DELETE, &format!("/api/v1/files/{id}"))?;
        self.send_json(builder).await
    }
}

fn upload_form(upload: &FileUpload) -> Result<Form> {
    let mut part = Part::bytes(upload.content.clone()).file_name(upload.file_name.clone());
    if let Some(mime_type) = &upload.mime_type {
        part = part.mime_str(mime_type)?;
    }

    let mut form = Form::new()
        .part("file", part)
        .text("entity_type", upload.entity_type.as_str())
        .text("entity_id", upload.entity_id.clone());
    if let Some(category) = upload.category {
        form = form.text("category", category.as_str());
    }
    if let Some(description) = &upload.description {
        form = form.text("description", description.clone());
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::SurvError;
    use crate::http::test_support::client_for;
    use crate::types::{FileCategory, FileEntity, FileUpload};

    #[tokio::test]
    async fn test_upload_sends_multipart_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/files/upload"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .and(body_string_contains("name=\"entity_type\""))
            .and(body_string_contains("before_photo"))
            .and(body_string_contains("filename=\"sink.jpg\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "f-1",
                "filename": "sink.jpg",
                "file_size": 4,
                "category": "before_photo",
                "uploaded_at": "2024-06-01T10:00:00"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let upload = FileUpload::new(FileEntity::Job, "j-1", "sink.jpg", b"jpeg".to_vec())
            .with_category(FileCategory::BeforePhoto)
            .with_mime_type("image/jpeg");
        let uploaded = client_for(&server).upload_file(&upload).await.unwrap();
        assert_eq!(uploaded.id, "f-1");
        assert_eq!(uploaded.category, Some(FileCategory::BeforePhoto));
    }

    #[tokio::test]
    async fn test_list_and_delete_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/files/customer/c-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "f-2",
                "filename": "contract.pdf",
                "file_size": 20480,
                "file_type": "application/pdf",
                "category": "document",
                "description": null,
                "uploaded_at": "2024-06-02T09:00:00",
                "uploaded_by": "u-1"
            }])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/files/f-2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "File deleted successfully"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let files = client.list_files(FileEntity::Customer, "c-1").await.unwrap();
        assert_eq!(files[0].category, Some(FileCategory::Document));

        let deleted = client.delete_file(&files[0].id).await.unwrap();
        assert_eq!(deleted.message, "File deleted successfully");
    }

    #[tokio::test]
    async fn test_empty_upload_rejected_locally() {
        let server = MockServer::start().await;
        let upload = FileUpload::new(FileEntity::Invoice, "inv-1", "empty.txt", Vec::new());
        let err = client_for(&server).upload_file(&upload).await.unwrap_err();
        assert!(matches!(err, SurvError::Validation(_)));
    }
}
