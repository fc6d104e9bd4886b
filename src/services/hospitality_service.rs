use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::ServiceError;
use crate::images::{object_name, ImageStore};
use crate::models::hospitality::{
    images_field, CreateListingInput, ImageRecord, ImageUpload, Listing, Location, UpdateListingInput, COLLECTION,
};
use crate::store::{DocumentStore, Fields};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone)]
pub struct HospitalityService {
    store: Arc<dyn DocumentStore>,
    images: ImageStore,
}

fn image_prefix(id: &str) -> String {
    format!("{}/{}", COLLECTION, id)
}

impl HospitalityService {
    pub fn new(store: Arc<dyn DocumentStore>, images: ImageStore) -> Self {
        Self { store, images }
    }

    /// Upload images in order. A failure stops the batch; objects already
    /// uploaded are left in place.
    async fn upload_images(&self, id: &str, uploads: Vec<ImageUpload>) -> Result<Vec<ImageRecord>, ServiceError> {
        let prefix = image_prefix(id);
        let mut records = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let name = object_name(upload.filename.as_deref(), upload.content_type.as_deref());
            let content_type = upload.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);

            match self.images.upload(&prefix, &name, upload.data, content_type).await {
                Ok(stored) => records.push(ImageRecord {
                    url: stored.url,
                    path: stored.path,
                    original: upload.filename,
                    content_type: upload.content_type,
                }),
                Err(e) => {
                    error!(
                        "image upload for {} failed after {} succeeded; leaving uploaded objects in place",
                        id,
                        records.len()
                    );
                    return Err(e.into());
                }
            }
        }

        Ok(records)
    }

    async fn find(&self, id: &str) -> Result<Listing, ServiceError> {
        let doc = self
            .store
            .get(COLLECTION, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Not found".to_string()))?;
        Ok(Listing::from_document(&doc)?)
    }

    /// The document id is allocated first so images land under its prefix;
    /// the document itself is written last.
    pub async fn create(&self, input: CreateListingInput) -> Result<Listing, ServiceError> {
        let id = self.store.new_id();
        let images = self.upload_images(&id, input.images).await?;

        let mut fields = Fields::new();
        fields.insert("type".to_string(), input.kind.as_str().into());
        fields.insert("name".to_string(), input.name.into());
        fields.insert("description".to_string(), input.description.into());
        fields.insert("location".to_string(), input.location.to_field_value());
        fields.insert("images".to_string(), images_field(&images));
        fields.insert("createdOn".to_string(), Utc::now().into());

        let doc = self.store.create(COLLECTION, &id, fields).await?;
        info!("listing {} created with {} images", id, images.len());
        Ok(Listing::from_document(&doc)?)
    }

    /// All listings, newest first.
    pub async fn list(&self) -> Result<Vec<Listing>, ServiceError> {
        let mut listings = self
            .store
            .list(COLLECTION)
            .await?
            .iter()
            .map(Listing::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        listings.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        Ok(listings)
    }

    pub async fn get(&self, id: &str) -> Result<Listing, ServiceError> {
        self.find(id).await
    }

    /// Merge provided fields. New images are appended, or replace the list
    /// when `replace_images` is set; replaced objects stay in storage.
    pub async fn update(&self, id: &str, input: UpdateListingInput) -> Result<Listing, ServiceError> {
        let existing = self.find(id).await?;
        let mut fields = Fields::new();

        if let Some(kind) = input.kind {
            fields.insert("type".to_string(), kind.as_str().into());
        }
        if let Some(name) = input.name {
            fields.insert("name".to_string(), name.into());
        }
        if let Some(description) = input.description {
            fields.insert("description".to_string(), description.into());
        }
        if input.latitude.is_some() || input.longitude.is_some() {
            let current = existing.location.unwrap_or(Location { lat: 0.0, lng: 0.0 });
            let location = Location {
                lat: input.latitude.unwrap_or(current.lat),
                lng: input.longitude.unwrap_or(current.lng),
            };
            fields.insert("location".to_string(), location.to_field_value());
        }

        let uploaded = self.upload_images(id, input.images).await?;
        if input.replace_images {
            if !existing.images.is_empty() {
                warn!("replacing {} images on {}; old objects are not deleted", existing.images.len(), id);
            }
            fields.insert("images".to_string(), images_field(&uploaded));
        } else if !uploaded.is_empty() {
            let mut images = existing.images;
            images.extend(uploaded);
            fields.insert("images".to_string(), images_field(&images));
        }

        if fields.is_empty() {
            return self.find(id).await;
        }

        let doc = self.store.update(COLLECTION, id, fields).await?;
        info!("listing {} updated", id);
        Ok(Listing::from_document(&doc)?)
    }

    /// Remove the listing and, best effort, every image under its prefix.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.find(id).await?;

        match self.images.delete_by_prefix(&image_prefix(id)).await {
            Ok(count) => info!("deleted {} images for listing {}", count, id),
            Err(e) => warn!("could not clean up images for listing {}: {}", id, e),
        }

        self.store.delete(COLLECTION, id).await?;
        info!("listing {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HospitalityType;
    use crate::storage::{BlobStore, MemoryBlobStore};
    use crate::store::MemoryStore;
    use bytes::Bytes;

    struct Fixture {
        store: Arc<MemoryStore>,
        blobs: Arc<MemoryBlobStore>,
        service: HospitalityService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let service = HospitalityService::new(store.clone(), ImageStore::new(blobs.clone()));
        Fixture { store, blobs, service }
    }

    fn upload(name: &str) -> ImageUpload {
        ImageUpload {
            filename: Some(name.to_string()),
            content_type: Some("image/png".to_string()),
            data: Bytes::from_static(b"\x89PNG"),
        }
    }

    fn input(images: Vec<ImageUpload>) -> CreateListingInput {
        CreateListingInput {
            kind: HospitalityType::Attraction,
            name: "Hundru Falls".to_string(),
            description: "Waterfall".to_string(),
            location: Location { lat: 23.45, lng: 85.66 },
            images,
        }
    }

    #[tokio::test]
    async fn create_stores_images_under_listing_prefix() {
        let f = fixture();
        let listing = f.service.create(input(vec![upload("a.png"), upload("b.png")])).await.unwrap();

        assert_eq!(listing.images.len(), 2);
        let prefix = format!("hospitality/{}/", listing.id);
        for image in &listing.images {
            assert!(image.path.starts_with(&prefix));
            assert_eq!(image.content_type.as_deref(), Some("image/png"));
        }
        assert_ne!(listing.images[0].path, listing.images[1].path);
        assert_eq!(f.blobs.paths().await.len(), 2);
    }

    #[tokio::test]
    async fn failed_upload_leaves_no_document() {
        let f = fixture();
        f.blobs.fail_uploads_matching("second").await;

        let err = f
            .service
            .create(input(vec![upload("first.png"), upload("second.png")]))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(f.store.count(COLLECTION).await, 0);
        assert_eq!(f.blobs.paths().await.len(), 1);
    }

    #[tokio::test]
    async fn update_appends_or_replaces_images() {
        let f = fixture();
        let listing = f.service.create(input(vec![upload("a.png")])).await.unwrap();

        let appended = f
            .service
            .update(
                &listing.id,
                UpdateListingInput {
                    images: vec![upload("b.png")],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(appended.images.len(), 2);
        assert_eq!(appended.images[0], listing.images[0]);
        assert_eq!(appended.images[1].original.as_deref(), Some("b.png"));
        assert!(appended.images[1].path.starts_with(&format!("hospitality/{}/", listing.id)));

        let replaced = f
            .service
            .update(
                &listing.id,
                UpdateListingInput {
                    replace_images: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(replaced.images.is_empty());
        // superseded objects remain
        assert_eq!(f.blobs.paths().await.len(), 2);
    }

    #[tokio::test]
    async fn update_changes_one_coordinate_at_a_time() {
        let f = fixture();
        let listing = f.service.create(input(vec![])).await.unwrap();

        let updated = f
            .service
            .update(
                &listing.id,
                UpdateListingInput {
                    longitude: Some(-100.0),
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.location, Some(Location { lat: 23.45, lng: -100.0 }));
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.description, "Waterfall");
    }

    #[tokio::test]
    async fn missing_listing_is_not_found() {
        let f = fixture();
        for err in [
            f.service.get("nope").await.unwrap_err(),
            f.service.update("nope", UpdateListingInput::default()).await.unwrap_err(),
            f.service.delete("nope").await.unwrap_err(),
        ] {
            assert!(matches!(err, ServiceError::NotFound(_)));
        }
    }

    #[tokio::test]
    async fn delete_removes_document_and_its_images_only() {
        let f = fixture();
        let doomed = f.service.create(input(vec![upload("a.png"), upload("b.png")])).await.unwrap();
        let kept = f.service.create(input(vec![upload("c.png")])).await.unwrap();
        f.blobs
            .put(&format!("hospitality/{}/stray.png", doomed.id), Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();

        f.service.delete(&doomed.id).await.unwrap();

        assert!(matches!(f.service.get(&doomed.id).await, Err(ServiceError::NotFound(_))));
        for image in &doomed.images {
            assert!(f.blobs.get(&image.path).await.unwrap().is_none());
        }
        assert!(f.blobs.get(&kept.images[0].path).await.unwrap().is_some());
        assert_eq!(f.blobs.paths().await, vec![kept.images[0].path.clone()]);
    }
}
