pub mod memory;
pub mod seed;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::application::Application;
use crate::models::message::{ChatMessage, EmployerMessage};
use crate::models::user::User;
use crate::models::vacancy::Vacancy;

pub use memory::MemoryRepository;

/// Anything stored under a numeric id assigned by the repository.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<E>>;
    /// All records in id order.
    async fn list(&self) -> Result<Vec<E>>;
    /// Stores `entity` under a fresh id and returns it.
    async fn create(&self, entity: E) -> Result<E>;
    /// Replaces the record with the same id; `NotFound` when there is none.
    async fn update(&self, entity: E) -> Result<E>;
}

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> i64 {
                    self.id
                }

                fn set_id(&mut self, id: i64) {
                    self.id = id;
                }
            }
        )*
    };
}

impl_entity!(Vacancy, Application, ChatMessage, EmployerMessage);

/// A user together with the password hash the API never exposes.
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub password_hash: String,
}

impl Entity for Account {
    fn id(&self) -> i64 {
        self.user.id
    }

    fn set_id(&mut self, id: i64) {
        self.user.id = id;
    }
}

/// Every table the demo backend serves.
#[derive(Clone)]
pub struct DemoStore {
    pub accounts: Arc<dyn Repository<Account>>,
    pub vacancies: Arc<dyn Repository<Vacancy>>,
    pub applications: Arc<dyn Repository<Application>>,
    pub messages: Arc<dyn Repository<ChatMessage>>,
    pub employer_messages: Arc<dyn Repository<EmployerMessage>>,
}

impl DemoStore {
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(MemoryRepository::<Account>::new("User")),
            vacancies: Arc::new(MemoryRepository::<Vacancy>::new("Vacancy")),
            applications: Arc::new(MemoryRepository::<Application>::new("Application")),
            messages: Arc::new(MemoryRepository::<ChatMessage>::new("Message")),
            employer_messages: Arc::new(MemoryRepository::<EmployerMessage>::new("Employer message")),
        }
    }

    pub async fn account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .accounts
            .list()
            .await?
            .into_iter()
            .find(|a| a.user.email.to_lowercase() == email))
    }
}
