pub mod apply_repo;
pub mod area_repo;
pub mod audit_repo;
pub mod layout_repo;
pub mod mall_repo;
pub mod permission_repo;
pub mod proposal_repo;

pub use apply_repo::ApplyRepo;
pub use area_repo::AreaRepo;
pub use audit_repo::AuditLogRepo;
pub use layout_repo::LayoutVersionRepo;
pub use mall_repo::MallRepo;
pub use permission_repo::PermissionRepo;
pub use proposal_repo::ProposalRepo;
