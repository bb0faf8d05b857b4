//! Pure calculations over market data

pub mod draft_order;
pub mod price_action;

pub use draft_order::{draft_order, OrderDraft, OrderRequest, PolicyFlags, Side};
pub use price_action::{summarize, PriceActionReport, PriceActionSummary, Structure};
