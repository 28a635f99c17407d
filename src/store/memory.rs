use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::store::{Entity, Repository};

#[derive(Debug)]
struct Table<E> {
    next_id: i64,
    rows: BTreeMap<i64, E>,
}

/// Process-local table; contents vanish on restart.
#[derive(Debug)]
pub struct MemoryRepository<E> {
    name: &'static str,
    table: Arc<RwLock<Table<E>>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for MemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            table: self.table.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            table: Arc::new(RwLock::new(Table {
                next_id: 1,
                rows: BTreeMap::new(),
            })),
            _entity: PhantomData,
        }
    }

    fn poisoned(&self) -> Error {
        Error::Internal(format!("{} table lock poisoned", self.name))
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for MemoryRepository<E> {
    async fn get(&self, id: i64) -> Result<Option<E>> {
        let table = self.table.read().map_err(|_| self.poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<E>> {
        let table = self.table.read().map_err(|_| self.poisoned())?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn create(&self, mut entity: E) -> Result<E> {
        let mut table = self.table.write().map_err(|_| self.poisoned())?;
        let id = table.next_id;
        table.next_id += 1;
        entity.set_id(id);
        table.rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E> {
        let mut table = self.table.write().map_err(|_| self.poisoned())?;
        match table.rows.get_mut(&entity.id()) {
            Some(row) => {
                *row = entity.clone();
                Ok(entity)
            }
            None => Err(Error::NotFound(format!(
                "{} {} not found",
                self.name,
                entity.id()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: i64,
        text: String,
    }

    impl Entity for Note {
        fn id(&self) -> i64 {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
    }

    fn note(text: &str) -> Note {
        Note {
            id: 0,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let repo = MemoryRepository::new("Note");
        let a = repo.create(note("a")).await.unwrap();
        let b = repo.create(note("b")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(repo.get(2).await.unwrap(), Some(b));
        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert_eq!(repo.get(3).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_requires_existing_row() {
        let repo = MemoryRepository::new("Note");
        let mut a = repo.create(note("a")).await.unwrap();
        a.text = "changed".to_string();
        repo.update(a.clone()).await.unwrap();
        assert_eq!(repo.get(a.id).await.unwrap().unwrap().text, "changed");

        let err = repo
            .update(Note {
                id: 99,
                text: "ghost".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn clones_share_the_table() {
        let repo = MemoryRepository::new("Note");
        let other = repo.clone();
        repo.create(note("shared")).await.unwrap();
        assert_eq!(other.list().await.unwrap().len(), 1);
    }
}
