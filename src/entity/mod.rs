pub mod addresses;
pub mod audit_logs;
pub mod order_headers;
pub mod order_lines;
pub mod products;
pub mod skus;
pub mod users;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use order_headers::Entity as OrderHeaders;
pub use order_lines::Entity as OrderLines;
pub use products::Entity as Products;
pub use skus::Entity as Skus;
pub use users::Entity as Users;
