use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{
    minutes, CacheState, Freshness, CAMERA_IMAGE_VALIDITY_MINUTES, CAMERA_LISTING_VALIDITY_MINUTES,
};
use crate::context::Context;
use crate::error::Result;
use crate::models::{Attributes, CameraImage, DeviceInfo, DOMAIN};
use crate::parsers::{CameraFeature, CameraImages, ImageRecord};

// ---

/// Image descriptors keyed by entity key.
pub type CameraImagesByKey = HashMap<String, CameraImage>;

/// Served when the image list does not name a mime type.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Raw image fetched for one camera angle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Default)]
struct CameraState {
    // ---
    /// Which cameras exist. Valid for 60 min after the fetch.
    listing: CacheState<CameraImagesByKey>,
    /// Image list per camera id. Valid for 5 min after its newest image.
    images: HashMap<u32, CacheState<Vec<ImageRecord>>>,
}

impl CameraState {
    /// Forget `image_last_updated` once its camera's image check has lapsed.
    fn clear_lapsed_images(&mut self, now: DateTime<Utc>) {
        // ---
        let lapse = minutes(CAMERA_IMAGE_VALIDITY_MINUTES);
        if let Some(listing) = self.listing.data_mut() {
            for image in listing.values_mut() {
                if matches!(image.image_last_updated, Some(at) if at + lapse <= now) {
                    debug!("Camera {} image {} went stale", image.camera_id, image.image_id);
                    image.image_last_updated = None;
                }
            }
        }
    }

    fn mark_image_updated(&mut self, camera_id: u32, at: DateTime<Utc>) {
        if let Some(listing) = self.listing.data_mut() {
            listing
                .values_mut()
                .filter(|image| image.camera_id == camera_id)
                .for_each(|image| image.image_last_updated = Some(at));
        }
    }
}

/// Camera client: a 60 min listing cache plus a 5 min image cache per camera.
///
/// A listing hit says nothing about image freshness; the two are checked
/// independently.
pub struct CameraApi {
    ctx: Context,
    state: Mutex<CameraState>,
}

impl CameraApi {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            state: Mutex::new(CameraState::default()),
        }
    }

    pub async fn fetch(&self) -> Result<CameraImagesByKey> {
        // ---
        let mut state = self.state.lock().await;
        let now = self.ctx.clock.now();

        if state.listing.is_fresh(now) {
            debug!("Cameras data is still valid until {:?}", state.listing.deadline());
        } else if let Err(e) = self.refresh_listing(&mut state.listing, now).await {
            state.listing.recover("Camera listing", e)?;
        }

        state.clear_lapsed_images(now);
        Ok(state.listing.data().cloned().unwrap_or_default())
    }

    async fn refresh_listing(
        &self,
        listing: &mut CacheState<CameraImagesByKey>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        // ---
        let text = self
            .ctx
            .fetcher
            .fetch_text(&self.ctx.endpoints.cameras())
            .await?;
        let cameras = CameraFeature::parse_listing(&text)?;
        let deadline = now + minutes(CAMERA_LISTING_VALIDITY_MINUTES);

        let images: Vec<CameraImage> = cameras
            .iter()
            .filter(|camera| camera.is_active())
            .flat_map(camera_images)
            .collect();
        let count = images.len();

        listing.upsert(deadline, |cached| {
            for mut image in images {
                if let Some(previous) = cached.get(&image.key) {
                    image.image_last_updated = previous.image_last_updated;
                }
                cached.insert(image.key.clone(), image);
            }
        });

        info!(
            "Camera listing refreshed: {} images from {} cameras, valid until {}",
            count,
            cameras.len(),
            deadline
        );
        Ok(())
    }

    /// Image `image_id` of `camera_id`, `None` when it has none.
    pub async fn get_camera_image(&self, camera_id: u32, image_id: usize) -> Result<Option<ImageData>> {
        // ---
        let record = {
            let mut state = self.state.lock().await;
            let images = self.camera_images(&mut state, camera_id).await?;
            match images.into_iter().nth(image_id) {
                Some(record) => record,
                None => {
                    warn!("Camera {} has no image with id {}", camera_id, image_id);
                    return Ok(None);
                }
            }
        };

        let url = self.ctx.endpoints.camera_image(camera_id, &record.filename);
        let bytes = self.ctx.fetcher.fetch_bytes(&url).await?;
        Ok(Some(ImageData {
            bytes,
            mime_type: record
                .mime_type
                .unwrap_or_else(|| DEFAULT_IMAGE_MIME_TYPE.to_string()),
        }))
    }

    async fn camera_images(&self, state: &mut CameraState, camera_id: u32) -> Result<Vec<ImageRecord>> {
        // ---
        let now = self.ctx.clock.now();

        // Entries exist only for cameras that returned images at least once.
        if let Some(cache) = state.images.get(&camera_id) {
            if cache.is_fresh(now) {
                debug!("Camera {} data is still valid until {:?}", camera_id, cache.deadline());
                return Ok(cache.data().cloned().unwrap_or_default());
            }
        }

        let fetched = match self.fetch_images(camera_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                return match state.images.get(&camera_id) {
                    Some(cache) => cache.degrade(&format!("Camera {} images", camera_id), e),
                    None => Err(e),
                }
            }
        };

        let newest = match fetched.newest() {
            Some(newest) => newest.add_time,
            None => {
                warn!("Camera {} has no images", camera_id);
                return Ok(Vec::new());
            }
        };

        state
            .images
            .entry(camera_id)
            .or_default()
            .store(fetched.images.clone(), newest + minutes(CAMERA_IMAGE_VALIDITY_MINUTES));
        state.mark_image_updated(camera_id, newest);
        Ok(fetched.images)
    }

    async fn fetch_images(&self, camera_id: u32) -> Result<CameraImages> {
        let url = self.ctx.endpoints.camera_images(camera_id);
        let text = self.ctx.fetcher.fetch_text(&url).await?;
        CameraImages::parse(&text)
    }

    pub async fn deadline(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.listing.deadline()
    }

    pub async fn image_deadline(&self, camera_id: u32) -> Option<DateTime<Utc>> {
        let state = self.state.lock().await;
        state.images.get(&camera_id).and_then(|cache| cache.deadline())
    }

    pub async fn freshness(&self) -> Freshness {
        let now = self.ctx.clock.now();
        self.state.lock().await.listing.freshness(now)
    }

    /// Number of cameras holding a cached image list.
    pub async fn cached_image_lists(&self) -> usize {
        self.state.lock().await.images.len()
    }
}

/// One descriptor per viewing angle of an active camera.
fn camera_images(camera: &CameraFeature) -> Vec<CameraImage> {
    // ---
    let props = &camera.properties;

    let mut attributes = Attributes::new();
    if let Some(position) = camera.geometry.coordinate() {
        attributes.insert("longitude".to_string(), position.longitude.into());
        attributes.insert("latitude".to_string(), position.latitude.into());
    }
    attributes.insert("camera_id".to_string(), i64::from(props.id).into());
    attributes.insert("camera_type".to_string(), props.kind.clone().into());

    let device = DeviceInfo::new(
        props.id.to_string(),
        format!("Camera {} [{}]", props.name, props.description),
    );

    (0..camera.angle_count())
        .map(|image_id| CameraImage {
            key: format!("{}_{}_{}_image", DOMAIN, props.name, image_id),
            camera_id: props.id,
            camera_name: props.name.clone(),
            camera_description: props.description.clone(),
            image_id,
            image_last_updated: None,
            device: device.clone(),
            attributes: attributes.clone(),
        })
        .collect()
}
