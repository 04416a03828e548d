pub mod repository;
pub use repository::{
    DashboardRepository, MovementRepository, RequisitionRepository, SectorRepository,
    StockRepository, UserRepository,
};

pub mod user_repo;
pub use user_repo::PgUserRepository;
pub mod sector_repo;
pub use sector_repo::PgSectorRepository;
pub mod inventory_repo;
pub use inventory_repo::PgInventoryRepository;
pub mod requisition_repo;
pub use requisition_repo::PgRequisitionRepository;
pub mod dashboard_repo;
pub use dashboard_repo::PgDashboardRepository;

pub mod memory;
pub use memory::InMemoryStore;
