use super::domain::{
    Listing, Offer, Payment, Property, PropertyValuation, Subscription, SubscriptionPlan, User,
};

/// Storage abstraction for marketplace entities.
///
/// Listing methods return newest records first. Uniqueness rules (user email, plan code,
/// one open subscription per user) are enforced by the implementation and reported as
/// [`RepositoryError::Conflict`].
pub trait MarketplaceRepository: Send + Sync {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn user(&self, id: &str) -> Result<Option<User>, RepositoryError>;
    fn users(&self) -> Result<Vec<User>, RepositoryError>;

    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError>;
    fn property(&self, id: &str) -> Result<Option<Property>, RepositoryError>;
    fn properties(&self, limit: usize) -> Result<Vec<Property>, RepositoryError>;

    fn insert_valuation(
        &self,
        valuation: PropertyValuation,
    ) -> Result<PropertyValuation, RepositoryError>;
    fn valuations(&self, property_id: &str) -> Result<Vec<PropertyValuation>, RepositoryError>;

    fn insert_listing(&self, listing: Listing) -> Result<Listing, RepositoryError>;
    fn listing(&self, id: &str) -> Result<Option<Listing>, RepositoryError>;
    fn active_listings(&self, limit: usize) -> Result<Vec<Listing>, RepositoryError>;

    fn insert_offer(&self, offer: Offer) -> Result<Offer, RepositoryError>;
    fn offers_for_listing(&self, listing_id: &str) -> Result<Vec<Offer>, RepositoryError>;

    fn insert_plan(&self, plan: SubscriptionPlan) -> Result<SubscriptionPlan, RepositoryError>;
    fn plan(&self, id: &str) -> Result<Option<SubscriptionPlan>, RepositoryError>;
    fn plan_by_code(&self, code: &str) -> Result<Option<SubscriptionPlan>, RepositoryError>;
    fn active_plans(&self) -> Result<Vec<SubscriptionPlan>, RepositoryError>;

    fn insert_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, RepositoryError>;
    fn subscription(&self, id: &str) -> Result<Option<Subscription>, RepositoryError>;
    fn subscriptions_for_user(&self, user_id: &str) -> Result<Vec<Subscription>, RepositoryError>;

    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
}
