//! Domain services for the coffee tab.
//!
//! Services contain business logic that operates on domain models.

pub mod analytics;
pub mod identity;
pub mod pricing;

pub use analytics::build_analytics;
pub use identity::{IdentityError, IdentityService, MockIdentityService, SessionUser};
pub use pricing::{
    bean_log_message, bean_pricing, coffee_charge, price_per_cup, BeanPricing, CoffeeCharge,
    PricingError,
};
