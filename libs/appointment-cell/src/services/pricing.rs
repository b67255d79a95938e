use tracing::debug;

use shared_config::AppConfig;

use crate::models::FeeSplit;

pub struct PricingService {
    platform_fee_percent: f64,
}

impl PricingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_percent(config.platform_fee_percent)
    }

    pub fn with_percent(platform_fee_percent: f64) -> Self {
        Self { platform_fee_percent }
    }

    /// The platform keeps its percentage rounded to cents; the professional gets the rest.
    pub fn split(&self, price: f64) -> FeeSplit {
        let platform_fee = round_to_cents(price * self.platform_fee_percent / 100.0);
        let professional_amount = round_to_cents(price - platform_fee);

        debug!(
            "Fee split for {:.2}: platform {:.2}, professional {:.2}",
            price, platform_fee, professional_amount
        );

        FeeSplit {
            price,
            platform_fee,
            professional_amount,
        }
    }
}

fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
