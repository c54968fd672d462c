use std::sync::Mutex;

use super::domain::{
    Listing, ListingStatus, Offer, Payment, Property, PropertyValuation, Subscription,
    SubscriptionPlan, User,
};
use super::repository::{MarketplaceRepository, RepositoryError};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    properties: Vec<Property>,
    valuations: Vec<PropertyValuation>,
    listings: Vec<Listing>,
    offers: Vec<Offer>,
    plans: Vec<SubscriptionPlan>,
    subscriptions: Vec<Subscription>,
    payments: Vec<Payment>,
}

/// Process-local marketplace storage. Tables keep insertion order.
#[derive(Debug, Default)]
pub struct InMemoryMarketplaceRepository {
    tables: Mutex<Tables>,
}

impl InMemoryMarketplaceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut guard = self.tables.lock().expect("marketplace mutex poisoned");
        f(&mut guard)
    }
}

fn newest<T: Clone>(rows: &[T], keep: impl Fn(&T) -> bool, limit: usize) -> Vec<T> {
    rows.iter().rev().filter(|row| keep(*row)).take(limit).cloned().collect()
}

impl MarketplaceRepository for InMemoryMarketplaceRepository {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        self.with_tables(|tables| {
            if tables
                .users
                .iter()
                .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
            {
                return Err(RepositoryError::Conflict);
            }
            tables.users.push(user.clone());
            Ok(user)
        })
    }

    fn user(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.users.iter().find(|user| user.id == id).cloned()))
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.with_tables(|tables| newest(&tables.users, |_| true, usize::MAX)))
    }

    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError> {
        self.with_tables(|tables| {
            tables.properties.push(property.clone());
            Ok(property)
        })
    }

    fn property(&self, id: &str) -> Result<Option<Property>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .properties
                .iter()
                .find(|property| property.id == id)
                .cloned()
        }))
    }

    fn properties(&self, limit: usize) -> Result<Vec<Property>, RepositoryError> {
        Ok(self.with_tables(|tables| newest(&tables.properties, |_| true, limit)))
    }

    fn insert_valuation(
        &self,
        valuation: PropertyValuation,
    ) -> Result<PropertyValuation, RepositoryError> {
        self.with_tables(|tables| {
            if !tables
                .properties
                .iter()
                .any(|property| property.id == valuation.property_id)
            {
                return Err(RepositoryError::NotFound);
            }
            tables.valuations.push(valuation.clone());
            Ok(valuation)
        })
    }

    fn valuations(&self, property_id: &str) -> Result<Vec<PropertyValuation>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .valuations
                .iter()
                .filter(|valuation| valuation.property_id == property_id)
                .cloned()
                .collect()
        }))
    }

    fn insert_listing(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        self.with_tables(|tables| {
            tables.listings.push(listing.clone());
            Ok(listing)
        })
    }

    fn listing(&self, id: &str) -> Result<Option<Listing>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .listings
                .iter()
                .find(|listing| listing.id == id)
                .cloned()
        }))
    }

    fn active_listings(&self, limit: usize) -> Result<Vec<Listing>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            newest(
                &tables.listings,
                |listing| listing.status == ListingStatus::Active,
                limit,
            )
        }))
    }

    fn insert_offer(&self, offer: Offer) -> Result<Offer, RepositoryError> {
        self.with_tables(|tables| {
            tables.offers.push(offer.clone());
            Ok(offer)
        })
    }

    fn offers_for_listing(&self, listing_id: &str) -> Result<Vec<Offer>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            newest(
                &tables.offers,
                |offer| offer.listing_id == listing_id,
                usize::MAX,
            )
        }))
    }

    fn insert_plan(&self, plan: SubscriptionPlan) -> Result<SubscriptionPlan, RepositoryError> {
        self.with_tables(|tables| {
            if tables.plans.iter().any(|existing| existing.code == plan.code) {
                return Err(RepositoryError::Conflict);
            }
            tables.plans.push(plan.clone());
            Ok(plan)
        })
    }

    fn plan(&self, id: &str) -> Result<Option<SubscriptionPlan>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.plans.iter().find(|plan| plan.id == id).cloned()))
    }

    fn plan_by_code(&self, code: &str) -> Result<Option<SubscriptionPlan>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .plans
                .iter()
                .find(|plan| plan.code == code)
                .cloned()
        }))
    }

    fn active_plans(&self) -> Result<Vec<SubscriptionPlan>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .plans
                .iter()
                .filter(|plan| plan.is_active)
                .cloned()
                .collect()
        }))
    }

    fn insert_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, RepositoryError> {
        self.with_tables(|tables| {
            let already_open = tables.subscriptions.iter().any(|existing| {
                existing.user_id == subscription.user_id && existing.status.is_open()
            });
            if already_open && subscription.status.is_open() {
                return Err(RepositoryError::Conflict);
            }
            tables.subscriptions.push(subscription.clone());
            Ok(subscription)
        })
    }

    fn subscription(&self, id: &str) -> Result<Option<Subscription>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .subscriptions
                .iter()
                .find(|subscription| subscription.id == id)
                .cloned()
        }))
    }

    fn subscriptions_for_user(&self, user_id: &str) -> Result<Vec<Subscription>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .subscriptions
                .iter()
                .filter(|subscription| subscription.user_id == user_id)
                .cloned()
                .collect()
        }))
    }

    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        self.with_tables(|tables| {
            if !tables
                .subscriptions
                .iter()
                .any(|subscription| subscription.id == payment.subscription_id)
            {
                return Err(RepositoryError::NotFound);
            }
            tables.payments.push(payment.clone());
            Ok(payment)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::{SubscriptionStatus, UserRole};
    use chrono::Utc;
    use std::sync::Arc;
    use std::thread;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            role: UserRole::Buyer,
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    fn subscription(id: &str, user_id: &str, status: SubscriptionStatus) -> Subscription {
        Subscription {
            id: id.to_string(),
            user_id: user_id.to_string(),
            plan_id: "plan".to_string(),
            status,
            start_date: Utc::now(),
            current_period_end: None,
            auto_renew: true,
        }
    }

    #[test]
    fn emails_are_unique_ignoring_case() {
        let repository = InMemoryMarketplaceRepository::new();
        repository
            .insert_user(user("u1", "ada@example.com"))
            .expect("first insert");
        let err = repository
            .insert_user(user("u2", "ADA@example.com"))
            .expect_err("duplicate email");
        assert!(matches!(err, RepositoryError::Conflict));
    }

    #[test]
    fn users_are_listed_newest_first() {
        let repository = InMemoryMarketplaceRepository::new();
        repository.insert_user(user("u1", "a@example.com")).expect("insert");
        repository.insert_user(user("u2", "b@example.com")).expect("insert");

        let ids: Vec<_> = repository
            .users()
            .expect("list")
            .into_iter()
            .map(|user| user.id)
            .collect();
        assert_eq!(ids, vec!["u2", "u1"]);
    }

    #[test]
    fn canceled_subscriptions_do_not_block_new_ones() {
        let repository = InMemoryMarketplaceRepository::new();
        repository
            .insert_subscription(subscription("s1", "u1", SubscriptionStatus::Canceled))
            .expect("insert");
        repository
            .insert_subscription(subscription("s2", "u1", SubscriptionStatus::Trialing))
            .expect("canceled one does not count");
        let err = repository
            .insert_subscription(subscription("s3", "u1", SubscriptionStatus::Trialing))
            .expect_err("second open subscription");
        assert!(matches!(err, RepositoryError::Conflict));
        assert_eq!(repository.subscriptions_for_user("u1").expect("list").len(), 2);
    }

    #[test]
    fn concurrent_subscriptions_admit_exactly_one() {
        let repository = Arc::new(InMemoryMarketplaceRepository::new());
        let handles: Vec<_> = (0..8)
            .map(|index| {
                let repository = Arc::clone(&repository);
                thread::spawn(move || {
                    repository
                        .insert_subscription(subscription(
                            &format!("s{index}"),
                            "u1",
                            SubscriptionStatus::Trialing,
                        ))
                        .is_ok()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn payments_require_a_subscription() {
        let repository = InMemoryMarketplaceRepository::new();
        let err = repository
            .insert_payment(Payment {
                id: "p1".to_string(),
                subscription_id: "missing".to_string(),
                amount: 99.0,
                currency: "USD".to_string(),
                provider: "stripe".to_string(),
                provider_ref: None,
                status: crate::marketplace::domain::PaymentStatus::Succeeded,
                processed_at: None,
            })
            .expect_err("subscription missing");
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
