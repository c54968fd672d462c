use std::time::Duration;

use super::pipeline::{AutoPipeline, RealEstatePipeline, ValuationPipeline};
use super::schema::{AssetClass, UnsupportedAssetClass, ValuationRequest, ValuationResponse};

/// Dispatches valuation requests to the pipeline registered for their asset class.
pub struct ValuationService {
    real_estate: RealEstatePipeline,
    auto: AutoPipeline,
}

impl ValuationService {
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            real_estate: RealEstatePipeline::new(cache_ttl),
            auto: AutoPipeline,
        }
    }

    pub fn pipeline(&self, class: AssetClass) -> &dyn ValuationPipeline {
        match class {
            AssetClass::RealEstate => &self.real_estate,
            AssetClass::Auto => &self.auto,
        }
    }

    /// Looks a pipeline up by its wire name.
    pub fn resolve(&self, class: &str) -> Result<&dyn ValuationPipeline, UnsupportedAssetClass> {
        let class: AssetClass = class.parse()?;
        Ok(self.pipeline(class))
    }

    pub fn valuate(&self, request: &ValuationRequest) -> ValuationResponse {
        self.pipeline(request.class).valuate(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::schema::ValuationAttributes;

    #[test]
    fn every_class_has_a_pipeline() {
        let service = ValuationService::new(Duration::from_secs(60));
        let methods: Vec<_> = AssetClass::ALL
            .into_iter()
            .map(|class| service.pipeline(class).method())
            .collect();
        assert_eq!(methods, vec!["baseline_gbr_v0", "hedonic_v0"]);
    }

    #[test]
    fn resolve_rejects_unregistered_names() {
        let service = ValuationService::new(Duration::from_secs(60));
        assert!(service.resolve("auto").is_ok());
        let err = service.resolve("yacht").err().expect("yacht is unsupported");
        assert_eq!(err, UnsupportedAssetClass("yacht".to_string()));
    }

    #[test]
    fn valuate_routes_by_class() {
        let service = ValuationService::new(Duration::from_secs(60));
        let response = service.valuate(&ValuationRequest::new(
            AssetClass::Auto,
            ValuationAttributes::default(),
        ));
        assert_eq!(response.method, AutoPipeline::METHOD);
    }
}
