//! Bundled product variants

pub mod packages;
pub mod tickets;
pub mod vouchers;

pub use packages::{PackageProduct, PgPackages};
pub use tickets::{PgTickets, Ticket, TicketRecord};
pub use vouchers::{PgVouchers, Voucher};
