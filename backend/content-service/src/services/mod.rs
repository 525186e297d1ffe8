/// Business logic layer for content-service
///
/// - Content service: owner create/edit/delete
/// - Interaction service: likes, comments, view counting
/// - Feed service: listings, search, single-item reads
/// - Purchase service: ledger writes, purchase checks, subscriptions
/// - Dashboard service: creator stats and earnings
pub mod contents;
pub mod dashboard;
pub mod earnings;
pub mod feed;
pub mod interactions;
pub mod purchases;

// Re-export commonly used services
pub use contents::ContentService;
pub use dashboard::{DashboardService, DashboardStats, EarningsReport};
pub use feed::{FeedQuery, FeedService, Visibility};
pub use interactions::{CommentAuthor, InteractionService};
pub use purchases::{PurchaseService, SUBSCRIPTION_PERIOD_DAYS};
