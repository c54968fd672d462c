use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Buyer,
    Seller,
    Dual,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Active,
    UnderContract,
    Sold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Submitted,
    Accepted,
    Declined,
    Withdrawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    /// Statuses that block a user from starting another subscription.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Trialing | SubscriptionStatus::Active | SubscriptionStatus::PastDue
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Descriptive fields shared by stored properties and creation payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PropertyDetails {
    #[garde(length(min = 1, max = 256))]
    pub address: String,
    #[garde(length(min = 1, max = 120))]
    pub city: String,
    #[garde(length(min = 1, max = 32))]
    pub state: String,
    #[garde(length(min = 1, max = 16))]
    pub postal_code: String,
    #[serde(default)]
    #[garde(skip)]
    pub bedrooms: Option<f64>,
    #[serde(default)]
    #[garde(skip)]
    pub bathrooms: Option<f64>,
    #[serde(default)]
    #[garde(skip)]
    pub living_area_sqft: Option<f64>,
    #[serde(default)]
    #[garde(skip)]
    pub lot_size_sqft: Option<f64>,
    #[serde(default)]
    #[garde(skip)]
    pub year_built: Option<i32>,
    #[serde(default)]
    #[garde(skip)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub owner_id: String,
    #[serde(flatten)]
    pub details: PropertyDetails,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValuation {
    pub id: String,
    pub property_id: String,
    pub estimate: f64,
    pub confidence: f64,
    pub valuation_method: String,
    pub created_at: DateTime<Utc>,
}

/// Property as returned to callers, with every recorded valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: Property,
    pub valuations: Vec<PropertyValuation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub property_id: String,
    pub seller_id: String,
    pub status: ListingStatus,
    pub asking_price: f64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingView {
    pub id: String,
    pub seller_id: String,
    pub status: ListingStatus,
    pub asking_price: f64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub property: PropertyView,
}

impl ListingView {
    pub fn new(listing: Listing, property: PropertyView) -> Self {
        Self {
            id: listing.id,
            seller_id: listing.seller_id,
            status: listing.status,
            asking_price: listing.asking_price,
            published_at: listing.published_at,
            created_at: listing.created_at,
            property,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub listing_id: String,
    pub buyer_id: String,
    pub amount: f64,
    pub status: OfferStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: String,
    pub code: String,
    pub name: String,
    pub monthly_price: f64,
    pub annual_price: f64,
    pub included_valuations: u32,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub auto_renew: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub subscription_id: String,
    pub amount: f64,
    pub currency: String,
    pub provider: String,
    pub provider_ref: Option<String>,
    pub status: PaymentStatus,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 120))]
    pub full_name: String,
    #[garde(skip)]
    pub role: UserRole,
    #[garde(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProperty {
    #[garde(length(min = 1))]
    pub owner_id: String,
    #[serde(flatten)]
    #[garde(dive)]
    pub details: PropertyDetails,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewValuation {
    #[garde(range(min = 0.0))]
    pub estimate: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    #[garde(length(min = 1, max = 64))]
    pub valuation_method: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewListing {
    #[garde(length(min = 1))]
    pub property_id: String,
    #[garde(length(min = 1))]
    pub seller_id: String,
    #[garde(range(min = 0.0))]
    pub asking_price: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewListingWithProperty {
    #[garde(length(min = 1))]
    pub seller_id: String,
    #[garde(range(min = 0.0))]
    pub asking_price: f64,
    #[serde(flatten)]
    #[garde(dive)]
    pub details: PropertyDetails,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewOffer {
    #[garde(length(min = 1))]
    pub listing_id: String,
    #[garde(length(min = 1))]
    pub buyer_id: String,
    #[garde(range(min = 0.0))]
    pub amount: f64,
    #[serde(default)]
    #[garde(skip)]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPlan {
    #[garde(length(min = 1, max = 64))]
    pub code: String,
    #[garde(length(min = 1, max = 64))]
    pub name: String,
    #[garde(range(min = 0.0))]
    pub monthly_price: f64,
    #[garde(range(min = 0.0))]
    pub annual_price: f64,
    #[garde(skip)]
    pub included_valuations: u32,
    #[serde(default)]
    #[garde(skip)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    #[garde(skip)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSubscription {
    #[garde(length(min = 1))]
    pub user_id: String,
    #[garde(length(min = 1))]
    pub plan_id: String,
    #[serde(default = "default_true")]
    #[garde(skip)]
    pub auto_renew: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_provider() -> String {
    "stripe".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPayment {
    #[garde(range(min = 0.0))]
    pub amount: f64,
    #[serde(default = "default_currency")]
    #[garde(length(min = 3, max = 3))]
    pub currency: String,
    #[serde(default = "default_provider")]
    #[garde(length(min = 1, max = 32))]
    pub provider: String,
    #[serde(default)]
    #[garde(skip)]
    pub provider_ref: Option<String>,
}
