//! Marketplace of users, properties, listings, offers and subscriptions.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{
    Listing, ListingStatus, ListingView, NewListing, NewListingWithProperty, NewOffer,
    NewPayment, NewPlan, NewProperty, NewSubscription, NewUser, NewValuation, Offer, OfferStatus,
    Payment, PaymentStatus, Property, PropertyDetails, PropertyValuation, PropertyView,
    Subscription, SubscriptionPlan, SubscriptionStatus, User, UserRole,
};
pub use memory::InMemoryMarketplaceRepository;
pub use repository::{MarketplaceRepository, RepositoryError};
pub use router::marketplace_router;
pub use service::{MarketplaceError, MarketplaceService};
