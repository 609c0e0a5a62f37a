//! Formula-derived ratings for the two quantitative criteria. Both use the
//! same symmetric 5-tier ladder (20/15/10/5), and both emit a justification
//! string carrying the actual figures — the number alone is not enough for
//! the report.

use chrono::Utc;
use valuation_core::{Confidence, FisherCriterion, RatingSource, StockData};

use crate::template::template_for;

/// Criterion 1: market potential, from the average of EPS and sales growth.
pub fn rate_market_potential(stock: &StockData) -> (u8, String) {
    let avg_growth = (stock.eps_growth + stock.sales_growth) / 2.0;
    let figures = format!(
        "{:.1}% average growth rate. Revenue growth: {:.1}%, EPS growth: {:.1}%",
        avg_growth, stock.sales_growth, stock.eps_growth
    );

    if avg_growth >= 20.0 {
        (5, format!("Exceptional growth potential with {figures}. This indicates strong market demand and expansion capability."))
    } else if avg_growth >= 15.0 {
        (4, format!("Strong growth potential with {figures}. Above-average market expansion."))
    } else if avg_growth >= 10.0 {
        (3, format!("Moderate growth potential with {figures}. Steady but not exceptional."))
    } else if avg_growth >= 5.0 {
        (2, format!("Below-average growth potential with {figures}. Limited expansion potential."))
    } else {
        (1, format!("Poor growth potential with {figures}. Minimal market expansion capability."))
    }
}

/// Criterion 5: profit margin quality, proxied by ROE (0 when unreported).
pub fn rate_profit_margin(stock: &StockData) -> (u8, String) {
    let roe = stock.roe.unwrap_or(0.0);

    if roe >= 20.0 {
        (5, format!("Excellent profit margins with {roe:.1}% ROE. This demonstrates superior capital efficiency and strong pricing power, placing the company well above industry averages."))
    } else if roe >= 15.0 {
        (4, format!("Good profit margins with {roe:.1}% ROE. Above-average returns on equity indicate effective management and competitive advantages."))
    } else if roe >= 10.0 {
        (3, format!("Average profit margins with {roe:.1}% ROE. Acceptable returns but room for improvement in operational efficiency."))
    } else if roe >= 5.0 {
        (2, format!("Below-average profit margins with {roe:.1}% ROE. Returns are subpar, indicating challenges in operational efficiency or competitive positioning."))
    } else {
        (1, format!("Poor profit margins with {roe:.1}% ROE. Very low returns on equity suggest significant operational or competitive challenges."))
    }
}

fn formula_criterion(id: u8, rating: u8, justification: String, source: &str) -> FisherCriterion {
    let template = template_for(id).expect("quantitative id is in the template");
    FisherCriterion {
        id,
        title: template.title.to_string(),
        description: template.description.to_string(),
        category: template.category,
        rating: Some(rating),
        justification,
        data_source: RatingSource::FormulaDerived,
        confidence: Some(Confidence::High),
        sources: vec![source.to_string()],
        last_updated: Some(Utc::now()),
    }
}

/// The formula-derived slice of the scorecard: criteria 1 and 5, always
/// rated, always high confidence.
pub fn formula_derived_criteria(stock: &StockData) -> Vec<FisherCriterion> {
    let (market_rating, market_justification) = rate_market_potential(stock);
    let (margin_rating, margin_justification) = rate_profit_margin(stock);

    vec![
        formula_criterion(
            1,
            market_rating,
            market_justification,
            "Fundamentals feed - revenue and EPS growth",
        ),
        formula_criterion(
            5,
            margin_rating,
            margin_justification,
            "Fundamentals feed - ROE and financial ratios",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stock(eps_growth: f64, sales_growth: f64, roe: Option<f64>) -> StockData {
        StockData {
            symbol: "TEST".to_string(),
            company_name: "Test Co".to_string(),
            current_price: 100.0,
            eps: 5.0,
            eps_growth,
            sales_growth,
            book_value_growth: None,
            roe,
            debt_to_equity: None,
            current_ratio: None,
            pe_ratio: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn market_potential_band_boundaries() {
        assert_eq!(rate_market_potential(&stock(20.0, 20.0, None)).0, 5);
        assert_eq!(rate_market_potential(&stock(15.0, 15.0, None)).0, 4);
        assert_eq!(rate_market_potential(&stock(10.0, 10.0, None)).0, 3);
        assert_eq!(rate_market_potential(&stock(5.0, 5.0, None)).0, 2);
        assert_eq!(rate_market_potential(&stock(4.9, 4.9, None)).0, 1);
        // averaging: 30% EPS growth carries a flat revenue year to tier 4
        assert_eq!(rate_market_potential(&stock(30.0, 0.0, None)).0, 4);
    }

    #[test]
    fn profit_margin_band_boundaries() {
        assert_eq!(rate_profit_margin(&stock(0.0, 0.0, Some(20.0))).0, 5);
        assert_eq!(rate_profit_margin(&stock(0.0, 0.0, Some(15.0))).0, 4);
        assert_eq!(rate_profit_margin(&stock(0.0, 0.0, Some(10.0))).0, 3);
        assert_eq!(rate_profit_margin(&stock(0.0, 0.0, Some(5.0))).0, 2);
        assert_eq!(rate_profit_margin(&stock(0.0, 0.0, Some(4.9))).0, 1);
    }

    #[test]
    fn missing_roe_rates_poorest_tier() {
        let (rating, justification) = rate_profit_margin(&stock(0.0, 0.0, None));
        assert_eq!(rating, 1);
        assert!(justification.contains("0.0% ROE"));
    }

    #[test]
    fn justifications_embed_the_figures() {
        let (_, justification) = rate_market_potential(&stock(17.9, 14.2, None));
        assert!(justification.contains("16.1% average growth rate"));
        assert!(justification.contains("Revenue growth: 14.2%"));
        assert!(justification.contains("EPS growth: 17.9%"));
    }

    #[test]
    fn formula_criteria_are_ids_1_and_5_high_confidence() {
        let criteria = formula_derived_criteria(&stock(12.0, 8.0, Some(18.0)));
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].id, 1);
        assert_eq!(criteria[1].id, 5);
        for c in &criteria {
            assert_eq!(c.data_source, RatingSource::FormulaDerived);
            assert_eq!(c.confidence, Some(Confidence::High));
            assert!(c.rating.is_some());
        }
    }
}
