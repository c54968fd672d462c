use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use garde::Validate;
use rand::rngs::OsRng;
use tracing::{info, warn};

use super::domain::{
    Listing, ListingStatus, ListingView, NewListing, NewListingWithProperty, NewOffer,
    NewPayment, NewPlan, NewProperty, NewSubscription, NewUser, NewValuation, Offer, OfferStatus,
    Payment, PaymentStatus, Property, PropertyDetails, PropertyValuation, PropertyView,
    Subscription, SubscriptionPlan, SubscriptionStatus, User,
};
use super::repository::{MarketplaceRepository, RepositoryError};

const PAGE_LIMIT: usize = 50;
const TRIAL_PERIOD_DAYS: i64 = 30;

/// Plans every deployment starts with: code, name, monthly, annual, included valuations,
/// description.
const DEFAULT_PLANS: [(&str, &str, f64, f64, u32, &str); 3] = [
    (
        "starter",
        "Starter",
        99.0,
        999.0,
        100,
        "For solo investors validating single properties",
    ),
    (
        "pro",
        "Pro",
        399.0,
        3999.0,
        3000,
        "For lenders and funds needing daily volume",
    ),
    (
        "enterprise",
        "Enterprise",
        0.0,
        0.0,
        0,
        "Custom contracts with dedicated support",
    ),
];

/// Marketplace use cases on top of a [`MarketplaceRepository`].
pub struct MarketplaceService<R> {
    repository: Arc<R>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn validate<T: Validate<Context = ()>>(payload: &T) -> Result<(), MarketplaceError> {
    payload
        .validate()
        .map_err(|report| MarketplaceError::Validation(report.to_string()))
}

fn hash_password(password: &str) -> Result<String, MarketplaceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| MarketplaceError::PasswordHash(err.to_string()))
}

impl<R> MarketplaceService<R>
where
    R: MarketplaceRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Inserts any default plan whose code is not yet present. Returns how many were added.
    pub fn seed_default_plans(&self) -> Result<usize, MarketplaceError> {
        let mut seeded = 0;
        for (code, name, monthly_price, annual_price, included_valuations, description) in
            DEFAULT_PLANS
        {
            if self.repository.plan_by_code(code)?.is_some() {
                continue;
            }
            match self.repository.insert_plan(SubscriptionPlan {
                id: new_id(),
                code: code.to_string(),
                name: name.to_string(),
                monthly_price,
                annual_price,
                included_valuations,
                description: Some(description.to_string()),
                is_active: true,
            }) {
                Ok(_) => seeded += 1,
                Err(RepositoryError::Conflict) => {}
                Err(err) => return Err(err.into()),
            }
        }
        if seeded > 0 {
            info!(seeded, "seeded default subscription plans");
        }
        Ok(seeded)
    }

    pub fn register_user(&self, payload: NewUser) -> Result<User, MarketplaceError> {
        validate(&payload)?;
        let user = User {
            id: new_id(),
            email: payload.email,
            full_name: payload.full_name,
            role: payload.role,
            password_hash: hash_password(&payload.password)?,
            created_at: Utc::now(),
        };

        let user = self.repository.insert_user(user).map_err(|err| match err {
            RepositoryError::Conflict => {
                warn!("user registration rejected: email already registered");
                MarketplaceError::EmailTaken
            }
            other => other.into(),
        })?;
        info!(user_id = %user.id, role = ?user.role, "user registered");
        Ok(user)
    }

    pub fn users(&self) -> Result<Vec<User>, MarketplaceError> {
        Ok(self.repository.users()?)
    }

    pub fn create_property(&self, payload: NewProperty) -> Result<PropertyView, MarketplaceError> {
        validate(&payload)?;
        self.require_user(&payload.owner_id, "Owner")?;
        let property = self.insert_property(payload.owner_id, payload.details)?;
        Ok(PropertyView {
            property,
            valuations: Vec::new(),
        })
    }

    pub fn properties(&self) -> Result<Vec<PropertyView>, MarketplaceError> {
        self.repository
            .properties(PAGE_LIMIT)?
            .into_iter()
            .map(|property| self.property_view(property))
            .collect()
    }

    pub fn property(&self, property_id: &str) -> Result<PropertyView, MarketplaceError> {
        let property = self
            .repository
            .property(property_id)?
            .ok_or(MarketplaceError::NotFound("Property"))?;
        self.property_view(property)
    }

    pub fn add_valuation(
        &self,
        property_id: &str,
        payload: NewValuation,
    ) -> Result<PropertyValuation, MarketplaceError> {
        validate(&payload)?;
        let valuation = PropertyValuation {
            id: new_id(),
            property_id: property_id.to_string(),
            estimate: payload.estimate,
            confidence: payload.confidence,
            valuation_method: payload.valuation_method,
            created_at: Utc::now(),
        };
        self.repository
            .insert_valuation(valuation)
            .map_err(|err| match err {
                RepositoryError::NotFound => MarketplaceError::NotFound("Property"),
                other => other.into(),
            })
    }

    pub fn active_listings(&self) -> Result<Vec<ListingView>, MarketplaceError> {
        self.repository
            .active_listings(PAGE_LIMIT)?
            .into_iter()
            .map(|listing| self.listing_view(listing))
            .collect()
    }

    pub fn create_listing(&self, payload: NewListing) -> Result<ListingView, MarketplaceError> {
        validate(&payload)?;
        let property = self
            .repository
            .property(&payload.property_id)?
            .ok_or(MarketplaceError::NotFound("Property"))?;
        self.require_user(&payload.seller_id, "Seller")?;

        let listing = self.publish_listing(&property, payload.seller_id, payload.asking_price)?;
        Ok(ListingView::new(listing, self.property_view(property)?))
    }

    /// Creates the property owned by the seller and an active listing for it.
    pub fn create_listing_with_property(
        &self,
        payload: NewListingWithProperty,
    ) -> Result<ListingView, MarketplaceError> {
        validate(&payload)?;
        self.require_user(&payload.seller_id, "Seller")?;

        let property = self.insert_property(payload.seller_id.clone(), payload.details)?;
        let listing = self.publish_listing(&property, payload.seller_id, payload.asking_price)?;
        Ok(ListingView::new(
            listing,
            PropertyView {
                property,
                valuations: Vec::new(),
            },
        ))
    }

    pub fn submit_offer(&self, payload: NewOffer) -> Result<Offer, MarketplaceError> {
        validate(&payload)?;
        self.repository
            .listing(&payload.listing_id)?
            .ok_or(MarketplaceError::NotFound("Listing"))?;
        self.require_user(&payload.buyer_id, "Buyer")?;

        let offer = self.repository.insert_offer(Offer {
            id: new_id(),
            listing_id: payload.listing_id,
            buyer_id: payload.buyer_id,
            amount: payload.amount,
            status: OfferStatus::Submitted,
            message: payload.message,
            created_at: Utc::now(),
        })?;
        info!(offer_id = %offer.id, listing_id = %offer.listing_id, "offer submitted");
        Ok(offer)
    }

    pub fn offers_for_listing(&self, listing_id: &str) -> Result<Vec<Offer>, MarketplaceError> {
        Ok(self.repository.offers_for_listing(listing_id)?)
    }

    pub fn active_plans(&self) -> Result<Vec<SubscriptionPlan>, MarketplaceError> {
        Ok(self.repository.active_plans()?)
    }

    pub fn create_plan(&self, payload: NewPlan) -> Result<SubscriptionPlan, MarketplaceError> {
        validate(&payload)?;
        let plan = SubscriptionPlan {
            id: new_id(),
            code: payload.code,
            name: payload.name,
            monthly_price: payload.monthly_price,
            annual_price: payload.annual_price,
            included_valuations: payload.included_valuations,
            description: payload.description,
            is_active: payload.is_active,
        };
        self.repository.insert_plan(plan).map_err(|err| match err {
            RepositoryError::Conflict => {
                warn!("plan creation rejected: duplicate code");
                MarketplaceError::PlanCodeTaken
            }
            other => other.into(),
        })
    }

    /// Starts a trial for the user. At most one trialing, active or past-due
    /// subscription may exist per user.
    pub fn subscribe(&self, payload: NewSubscription) -> Result<Subscription, MarketplaceError> {
        validate(&payload)?;
        self.require_user(&payload.user_id, "User")?;
        self.repository
            .plan(&payload.plan_id)?
            .ok_or(MarketplaceError::NotFound("Plan"))?;

        let now = Utc::now();
        let subscription = Subscription {
            id: new_id(),
            user_id: payload.user_id,
            plan_id: payload.plan_id,
            status: SubscriptionStatus::Trialing,
            start_date: now,
            current_period_end: Some(now + Duration::days(TRIAL_PERIOD_DAYS)),
            auto_renew: payload.auto_renew,
        };
        let subscription = self
            .repository
            .insert_subscription(subscription)
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    warn!("subscription rejected: user already has an open subscription");
                    MarketplaceError::SubscriptionActive
                }
                other => other.into(),
            })?;
        info!(
            subscription_id = %subscription.id,
            user_id = %subscription.user_id,
            "subscription started"
        );
        Ok(subscription)
    }

    pub fn subscriptions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Subscription>, MarketplaceError> {
        Ok(self.repository.subscriptions_for_user(user_id)?)
    }

    pub fn record_payment(
        &self,
        subscription_id: &str,
        payload: NewPayment,
    ) -> Result<Payment, MarketplaceError> {
        validate(&payload)?;
        let payment = Payment {
            id: new_id(),
            subscription_id: subscription_id.to_string(),
            amount: payload.amount,
            currency: payload.currency,
            provider: payload.provider,
            provider_ref: payload.provider_ref,
            status: PaymentStatus::Succeeded,
            processed_at: Some(Utc::now()),
        };
        self.repository
            .insert_payment(payment)
            .map_err(|err| match err {
                RepositoryError::NotFound => MarketplaceError::NotFound("Subscription"),
                other => other.into(),
            })
    }

    fn require_user(&self, user_id: &str, role: &'static str) -> Result<User, MarketplaceError> {
        self.repository
            .user(user_id)?
            .ok_or(MarketplaceError::NotFound(role))
    }

    fn insert_property(
        &self,
        owner_id: String,
        details: PropertyDetails,
    ) -> Result<Property, MarketplaceError> {
        Ok(self.repository.insert_property(Property {
            id: new_id(),
            owner_id,
            details,
            created_at: Utc::now(),
        })?)
    }

    fn publish_listing(
        &self,
        property: &Property,
        seller_id: String,
        asking_price: f64,
    ) -> Result<Listing, MarketplaceError> {
        let now = Utc::now();
        let listing = self.repository.insert_listing(Listing {
            id: new_id(),
            property_id: property.id.clone(),
            seller_id,
            status: ListingStatus::Active,
            asking_price,
            published_at: Some(now),
            created_at: now,
        })?;
        info!(listing_id = %listing.id, property_id = %listing.property_id, "listing published");
        Ok(listing)
    }

    fn property_view(&self, property: Property) -> Result<PropertyView, MarketplaceError> {
        let valuations = self.repository.valuations(&property.id)?;
        Ok(PropertyView {
            property,
            valuations,
        })
    }

    fn listing_view(&self, listing: Listing) -> Result<ListingView, MarketplaceError> {
        let property = self
            .repository
            .property(&listing.property_id)?
            .ok_or(MarketplaceError::NotFound("Property"))?;
        Ok(ListingView::new(listing, self.property_view(property)?))
    }
}

/// Error raised by the marketplace service.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Plan code already exists")]
    PlanCodeTaken,
    #[error("Subscription already active")]
    SubscriptionActive,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("failed to hash password: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
