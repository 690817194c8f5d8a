//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Single-statement methods accept any `PgExecutor` (a pool or a
//! transaction); methods that run several statements take a
//! `&mut PgConnection` so callers decide the transaction boundary.

pub mod change_log_repo;
pub mod domain_repo;
pub mod id_repo;
pub mod link_repo;
pub mod mark_repo;
pub mod page_info_repo;
pub mod page_repo;
pub mod pair_repo;
pub mod search_repo;
pub mod subscription_repo;
pub mod summary_repo;
pub mod task_repo;
pub mod update_repo;
pub mod user_repo;

pub use change_log_repo::ChangeLogRepo;
pub use domain_repo::DomainRepo;
pub use id_repo::{IdAllocError, IdRepo};
pub use link_repo::LinkRepo;
pub use mark_repo::MarkRepo;
pub use page_info_repo::PageInfoRepo;
pub use page_repo::PageRepo;
pub use pair_repo::PairRepo;
pub use search_repo::SearchRepo;
pub use subscription_repo::SubscriptionRepo;
pub use summary_repo::SummaryRepo;
pub use task_repo::TaskRepo;
pub use update_repo::UpdateRepo;
pub use user_repo::UserRepo;
