//! Builds the 15-point Fisher scorecard: formula-derived ratings for the
//! quantitative criteria merged with externally-researched ratings for the
//! rest, ordered by id, with a mean aggregate score.

pub mod quantitative;
pub mod template;

pub use quantitative::{formula_derived_criteria, rate_market_potential, rate_profit_margin};
pub use template::{
    qualitative_ids, research_guidance, template_for, CriterionTemplate, FISHER_CRITERIA,
};

use chrono::Utc;
use valuation_core::{
    CriterionRating, FisherCriterion, FisherScorecard, RatingSource, ResearchResponse, StockData,
};

/// Mean of the present ratings; 0.0 when nothing is rated. An aggregate
/// display value, not a required input, so the empty case is not an error.
pub fn overall_score(criteria: &[FisherCriterion]) -> f64 {
    let ratings: Vec<f64> = criteria
        .iter()
        .filter_map(|c| c.rating.map(f64::from))
        .collect();
    if ratings.is_empty() {
        return 0.0;
    }
    ratings.iter().sum::<f64>() / ratings.len() as f64
}

/// Materialize one researched rating against the fixed template. Ratings
/// for unknown criterion ids are dropped.
fn researched_criterion(rating: &CriterionRating) -> Option<FisherCriterion> {
    let template = template_for(rating.criterion_id)?;
    Some(FisherCriterion {
        id: rating.criterion_id,
        title: template.title.to_string(),
        description: template.description.to_string(),
        category: template.category,
        rating: Some(rating.rating),
        justification: rating.justification.clone(),
        data_source: RatingSource::ExternallyResearched,
        confidence: Some(rating.confidence),
        sources: rating.sources.clone(),
        last_updated: Some(Utc::now()),
    })
}

/// Merge formula-derived and researched criteria into the completed
/// scorecard, sorted ascending by id. A completed scorecard carries exactly
/// one criterion per id: formula-derived entries win, and researched
/// ratings for ids already covered are ignored (the backend researches
/// every criterion regardless of what was asked for).
pub fn build_scorecard(
    stock: &StockData,
    formula_derived: Vec<FisherCriterion>,
    research: &ResearchResponse,
) -> FisherScorecard {
    let covered: Vec<u8> = formula_derived.iter().map(|c| c.id).collect();
    let mut criteria = formula_derived;
    criteria.extend(
        research
            .ratings
            .iter()
            .filter(|r| !covered.contains(&r.criterion_id))
            .filter_map(researched_criterion),
    );
    criteria.sort_by_key(|c| c.id);

    let now = Utc::now();
    FisherScorecard {
        symbol: stock.symbol.clone(),
        company_name: stock.company_name.clone(),
        overall_score: overall_score(&criteria),
        criteria,
        created_at: now,
        last_updated: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use valuation_core::{Confidence, CriterionRating};

    fn stock() -> StockData {
        StockData {
            symbol: "AAPL".to_string(),
            company_name: "Apple Inc.".to_string(),
            current_price: 180.0,
            eps: 6.4,
            eps_growth: 12.0,
            sales_growth: 8.0,
            book_value_growth: None,
            roe: Some(28.0),
            debt_to_equity: None,
            current_ratio: None,
            pe_ratio: None,
            last_updated: Utc::now(),
        }
    }

    fn researched(criterion_id: u8, rating: u8) -> CriterionRating {
        CriterionRating {
            criterion_id,
            rating,
            justification: format!("researched criterion {criterion_id}"),
            key_findings: vec!["finding".to_string()],
            sources: vec!["2024 Annual Report".to_string()],
            confidence: Confidence::Medium,
        }
    }

    fn research_response(ids: &[u8], rating: u8) -> ResearchResponse {
        ResearchResponse {
            symbol: "AAPL".to_string(),
            ratings: ids.iter().map(|id| researched(*id, rating)).collect(),
            research_date: Utc::now(),
            model_used: "test-model".to_string(),
        }
    }

    #[test]
    fn merges_into_15_sorted_unique_ids() {
        let research = research_response(&qualitative_ids(), 4);
        let scorecard = build_scorecard(&stock(), formula_derived_criteria(&stock()), &research);

        let ids: Vec<u8> = scorecard.criteria.iter().map(|c| c.id).collect();
        assert_eq!(ids, (1..=15).collect::<Vec<u8>>());
    }

    #[test]
    fn overall_score_is_mean_of_all_ratings() {
        // formula side: growth avg 10% -> 3, ROE 28% -> 5; research side: 13 x 4
        let research = research_response(&qualitative_ids(), 4);
        let scorecard = build_scorecard(&stock(), formula_derived_criteria(&stock()), &research);

        let expected = (3.0 + 5.0 + 13.0 * 4.0) / 15.0;
        assert!((scorecard.overall_score - expected).abs() < 1e-9);
    }

    #[test]
    fn formula_derived_wins_over_researched_duplicates() {
        // the backend researches every criterion, quantitative ones included
        let mut ids = qualitative_ids();
        ids.extend([1, 5]);
        let research = research_response(&ids, 2);
        let scorecard = build_scorecard(&stock(), formula_derived_criteria(&stock()), &research);

        assert_eq!(scorecard.criteria.len(), 15);
        let first = scorecard.criteria.iter().find(|c| c.id == 1).unwrap();
        assert_eq!(first.data_source, RatingSource::FormulaDerived);
    }

    #[test]
    fn unknown_criterion_ids_are_dropped() {
        let mut research = research_response(&[2, 3], 4);
        research.ratings.push(researched(99, 5));
        let scorecard = build_scorecard(&stock(), formula_derived_criteria(&stock()), &research);

        assert_eq!(scorecard.criteria.len(), 4);
        assert!(scorecard.criteria.iter().all(|c| c.id <= 15));
    }

    #[test]
    fn researched_entries_carry_template_text_and_source_tag() {
        let research = research_response(&[2], 4);
        let scorecard = build_scorecard(&stock(), Vec::new(), &research);

        let criterion = &scorecard.criteria[0];
        assert_eq!(criterion.title, "Management's Determination for Growth");
        assert_eq!(criterion.data_source, RatingSource::ExternallyResearched);
        assert_eq!(criterion.confidence, Some(Confidence::Medium));
        assert_eq!(criterion.sources, vec!["2024 Annual Report".to_string()]);
    }

    #[test]
    fn empty_scorecard_scores_zero() {
        assert_eq!(overall_score(&[]), 0.0);
        let research = research_response(&[], 0);
        let scorecard = build_scorecard(&stock(), Vec::new(), &research);
        assert_eq!(scorecard.overall_score, 0.0);
    }
}
