/// Points each component contributes to the composite score at full marks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub performance: f64,
    pub tenure: f64,
    pub post_promotion: f64,
    pub manager_recommendation: f64,
    pub district_recommendation: f64,
}

/// Fixed promotion policy: 25 performance, 20 tenure, 10 post-promotion tenure,
/// 20 manager recommendation, 15 district recommendation.
pub const PROMOTION_WEIGHTS: Weights = Weights {
    performance: 25.0,
    tenure: 20.0,
    post_promotion: 10.0,
    manager_recommendation: 20.0,
    district_recommendation: 15.0,
};

impl Weights {
    pub fn sum(&self) -> f64 {
        self.performance
            + self.tenure
            + self.post_promotion
            + self.manager_recommendation
            + self.district_recommendation
    }
}

/// Scales a raw 0-100 rating to a component worth `points`.
pub fn scale_rating(raw: f64, points: f64) -> f64 {
    raw * points / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_hundred() {
        assert!((PROMOTION_WEIGHTS.sum() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ratings_scale_by_weight_fraction() {
        assert_eq!(scale_rating(80.0, PROMOTION_WEIGHTS.performance), 20.0);
        assert_eq!(scale_rating(50.0, PROMOTION_WEIGHTS.manager_recommendation), 10.0);
        assert_eq!(scale_rating(60.0, PROMOTION_WEIGHTS.district_recommendation), 9.0);
        assert_eq!(scale_rating(100.0, PROMOTION_WEIGHTS.district_recommendation), 15.0);
    }
}
