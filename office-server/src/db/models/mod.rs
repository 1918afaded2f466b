//! Database Models
//!
//! Typed records matching the SurrealDB tables. All timestamps are Unix
//! millis (`i64`), all record links are [`surrealdb::RecordId`] serialized
//! as `"table:id"` strings.

pub mod serde_helpers;

pub mod category;
pub mod collector;
pub mod company;
pub mod counter;
pub mod customer;
pub mod invoice;
pub mod role;
pub mod service;
pub mod task;
pub mod user;
pub mod zone;

pub use category::{Category, CategoryCreate, CategoryUpdate};
pub use collector::{CollectorBalance, CollectorTransaction, TransactionType};
pub use company::{CashoutTransaction, Company};
pub use counter::Counter;
pub use customer::{Customer, CustomerCreate, CustomerUpdate};
pub use invoice::{Invoice, InvoiceCreate, InvoiceStatus, InvoiceUpdate};
pub use role::{Role, RoleCreate, RoleId, RoleUpdate};
pub use service::{Service, ServiceCreate, ServiceUpdate};
pub use task::{Task, TaskComment, TaskCreate, TaskPriority, TaskStage, TaskUpdate};
pub use user::{User, UserCreate, UserId, UserUpdate};
pub use zone::{Zone, ZoneCreate, ZoneUpdate};
