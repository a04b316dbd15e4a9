//! Character records, selection and the device's "current image".

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thinq_types::{CacheConfig, Character, Filter, NewCharacter, StoreError};
use uuid::Uuid;

use crate::cache::TtlCache;
use crate::selection::ExclusiveSelectionService;
use crate::store::{DocumentStore, StoreResult};

const IMAGE_KEY: &str = "selected";

pub struct CharacterCatalog {
    store: Arc<dyn DocumentStore>,
    collection: String,
    selection: ExclusiveSelectionService,
    ttl: Duration,
    image: TtlCache<&'static str, String>,
}

impl CharacterCatalog {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        cache: &CacheConfig,
    ) -> Self {
        let collection = collection.into();
        Self {
            selection: ExclusiveSelectionService::new(Arc::clone(&store), collection.clone()),
            store,
            collection,
            ttl: Duration::from_secs(cache.ttl_secs),
            image: TtlCache::new(),
        }
    }

    pub fn selection(&self) -> &ExclusiveSelectionService {
        &self.selection
    }

    /// Store a new, unselected character.
    pub async fn create(&self, new: NewCharacter) -> StoreResult<Character> {
        let character = Character {
            id: Uuid::new_v4().simple().to_string(),
            user_id: new.user_id,
            name: new.name,
            prompt: new.prompt,
            generation_type: new.generation_type,
            image_url: new.image_url,
            style: new.style,
            kind: "ai_generated".to_string(),
            is_selected: false,
            created_at: Some(Utc::now()),
        };
        self.store.set(&self.collection, &character.id, character.to_fields()?).await?;
        tracing::info!("💾 Saved character '{}' ({})", character.name, character.id);
        Ok(character)
    }

    pub async fn list(&self) -> StoreResult<Vec<Character>> {
        self.store
            .query(&self.collection, &Filter::All, None)
            .await?
            .iter()
            .map(Character::from_document)
            .collect()
    }

    pub async fn select(&self, character_id: &str) -> StoreResult<()> {
        self.selection.select(character_id).await?;
        self.image.invalidate(&IMAGE_KEY);
        Ok(())
    }

    pub async fn selected(&self) -> StoreResult<Option<Character>> {
        match self.selection.get_selected_document().await? {
            Some(doc) => Character::from_document(&doc).map(Some),
            None => Ok(None),
        }
    }

    /// Image of the selected character, cached.
    ///
    /// `NotFound` when nothing is selected or the selection has no image;
    /// misses are not cached.
    pub async fn esp_image(&self) -> StoreResult<String> {
        self.image
            .get_or_compute(IMAGE_KEY, self.ttl, || async {
                let selected = self.selected().await?.ok_or_else(|| {
                    StoreError::not_found(&self.collection, "<selected>")
                })?;
                if selected.image_url.is_empty() {
                    return Err(StoreError::not_found(
                        &self.collection,
                        format!("{}/image_url", selected.id),
                    ));
                }
                Ok(selected.image_url)
            })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn upload(name: &str, image_url: &str) -> NewCharacter {
        NewCharacter {
            name: name.to_string(),
            prompt: "uploaded".to_string(),
            image_url: image_url.to_string(),
            generation_type: "upload".to_string(),
            style: "uploaded".to_string(),
            user_id: "test_user".to_string(),
        }
    }

    fn catalog() -> (Arc<MemoryStore>, CharacterCatalog) {
        let store = Arc::new(MemoryStore::new());
        let catalog = CharacterCatalog::new(store.clone(), "characters", &CacheConfig::default());
        (store, catalog)
    }

    #[tokio::test]
    async fn test_create_list_and_select() {
        let (_, catalog) = catalog();
        let dog = catalog.create(upload("Dog", "https://img/dog.png")).await.unwrap();
        let cat = catalog.create(upload("Cat", "https://img/cat.png")).await.unwrap();

        let listed = catalog.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|c| !c.is_selected && c.kind == "ai_generated"));

        catalog.select(&dog.id).await.unwrap();
        assert_eq!(catalog.selected().await.unwrap().unwrap().name, "Dog");
        catalog.select(&cat.id).await.unwrap();
        assert_eq!(catalog.selected().await.unwrap().unwrap().name, "Cat");
    }

    #[tokio::test(start_paused = true)]
    async fn test_esp_image_follows_selection() {
        let (_, catalog) = catalog();
        assert!(catalog.esp_image().await.unwrap_err().is_not_found());

        let dog = catalog.create(upload("Dog", "https://img/dog.png")).await.unwrap();
        let cat = catalog.create(upload("Cat", "https://img/cat.png")).await.unwrap();

        catalog.select(&dog.id).await.unwrap();
        assert_eq!(catalog.esp_image().await.unwrap(), "https://img/dog.png");

        catalog.select(&cat.id).await.unwrap();
        assert_eq!(catalog.esp_image().await.unwrap(), "https://img/cat.png");
    }

    #[tokio::test(start_paused = true)]
    async fn test_esp_image_is_cached_for_ttl() {
        let (store, catalog) = catalog();
        let dog = catalog.create(upload("Dog", "https://img/dog.png")).await.unwrap();
        catalog.select(&dog.id).await.unwrap();
        assert_eq!(catalog.esp_image().await.unwrap(), "https://img/dog.png");

        store
            .update("characters", &dog.id, json!({"image_url": "https://img/new.png"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        assert_eq!(catalog.esp_image().await.unwrap(), "https://img/dog.png");

        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(catalog.esp_image().await.unwrap(), "https://img/new.png");
    }

    #[tokio::test]
    async fn test_selection_without_image_is_not_found() {
        let (_, catalog) = catalog();
        let blank = catalog.create(upload("Blank", "")).await.unwrap();
        catalog.select(&blank.id).await.unwrap();
        assert!(catalog.esp_image().await.unwrap_err().is_not_found());
    }
}
