//! Philip Fisher's 15-point checklist, from "Common Stocks and Uncommon
//! Profits". Ids 1 and 5 are computable from reported figures; the rest
//! need qualitative research.

use valuation_core::CriterionCategory;

pub struct CriterionTemplate {
    pub id: u8,
    pub title: &'static str,
    pub description: &'static str,
    pub category: CriterionCategory,
}

pub const FISHER_CRITERIA: [CriterionTemplate; 15] = [
    CriterionTemplate {
        id: 1,
        title: "Products/Services with Market Potential",
        description: "Does the company have products or services with sufficient market potential to make possible a sizable increase in sales for at least several years?",
        category: CriterionCategory::Quantitative,
    },
    CriterionTemplate {
        id: 2,
        title: "Management's Determination for Growth",
        description: "Does the management have a determination to continue to develop products or processes that will still further increase total sales potentials when the growth potentials of currently attractive product lines have largely been exploited?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 3,
        title: "R&D Effectiveness",
        description: "How effective are the company's research and development efforts in relation to its size?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 4,
        title: "Sales Organization",
        description: "Does the company have an above-average sales organization?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 5,
        title: "Profit Margin",
        description: "Does the company have a worthwhile profit margin?",
        category: CriterionCategory::Quantitative,
    },
    CriterionTemplate {
        id: 6,
        title: "Maintaining/Improving Profit Margins",
        description: "What is the company doing to maintain or improve profit margins?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 7,
        title: "Labor and Personnel Relations",
        description: "Does the company have outstanding labor and personnel relations?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 8,
        title: "Executive Relations",
        description: "Does the company have outstanding executive relations?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 9,
        title: "Management Depth",
        description: "Does the company have depth to its management?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 10,
        title: "Cost Analysis and Accounting Controls",
        description: "How good are the company's cost analysis and accounting controls?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 11,
        title: "Industry-Specific Competitive Advantages",
        description: "Are there other aspects of the business, somewhat peculiar to the industry involved, which will give the investor important clues as to how outstanding the company may be in relation to its competition?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 12,
        title: "Long-Range Profit Outlook",
        description: "Does the company have a short-range or long-range outlook in regard to profits?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 13,
        title: "Future Equity Financing",
        description: "In the foreseeable future will the growth of the company require sufficient equity financing so that the larger number of shares then outstanding will largely cancel the existing stockholders' benefit from this anticipated growth?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 14,
        title: "Management Communication",
        description: "Does the management talk freely to investors about its affairs when things are going well but 'clam up' when troubles and disappointments occur?",
        category: CriterionCategory::Qualitative,
    },
    CriterionTemplate {
        id: 15,
        title: "Management Integrity",
        description: "Does the company have a management of unquestionable integrity?",
        category: CriterionCategory::Qualitative,
    },
];

pub fn template_for(id: u8) -> Option<&'static CriterionTemplate> {
    FISHER_CRITERIA.iter().find(|c| c.id == id)
}

/// Ids that need external research, in template order.
pub fn qualitative_ids() -> Vec<u8> {
    FISHER_CRITERIA
        .iter()
        .filter(|c| c.category == CriterionCategory::Qualitative)
        .map(|c| c.id)
        .collect()
}

/// Per-criterion research directions handed to the LLM prompt.
pub fn research_guidance(id: u8) -> &'static str {
    match id {
        2 => "- Review CEO/executive statements about growth strategy\n   - Check number of new products/markets entered recently\n   - Look for R&D investments and innovation initiatives\n   - Assess strategic acquisitions or partnerships",
        3 => "- Find R&D spending as percentage of revenue\n   - Count patents filed or products launched\n   - Compare R&D efficiency to competitors\n   - Review innovation track record",
        4 => "- Check revenue growth vs industry average\n   - Look for customer satisfaction scores/reviews\n   - Find market share changes\n   - Review sales team size and structure",
        6 => "- Analyze operating margin trends (3-5 years)\n   - Check for cost reduction initiatives\n   - Look for pricing power or premium positioning\n   - Review operational efficiency improvements",
        7 => "- Search Glassdoor ratings and employee reviews\n   - Look for labor disputes or unionization efforts\n   - Check employee retention/turnover data\n   - Review company culture awards or recognition",
        8 => "- Research executive tenure and stability\n   - Check for succession planning mentions\n   - Look for insider trading patterns\n   - Review executive compensation alignment",
        9 => "- Count number of C-suite and VP-level executives\n   - Check backgrounds and experience depth\n   - Look for management bench strength\n   - Review organizational structure",
        10 => "- Review financial reporting quality and transparency\n   - Check for accounting restatements or irregularities\n   - Look for detailed cost breakdowns in reports\n   - Assess auditor opinions and internal controls\n   - Review operating expense management trends",
        11 => "- Identify industry-specific competitive advantages\n   - Look for patents, licenses, or regulatory moats\n   - Check brand strength or market position\n   - Review unique assets or capabilities",
        12 => "- Analyze management statements about long-term goals\n   - Check capital allocation priorities\n   - Review investment in future vs short-term profits\n   - Look for guidance and planning horizons",
        13 => "- Review historical equity dilution patterns\n   - Check debt-to-equity ratio and financing strategy\n   - Look for recent stock issuances or buybacks\n   - Assess cash flow adequacy for growth",
        14 => "- Review transparency in earnings calls and reports\n   - Check how management handled past setbacks\n   - Look for clarity in guidance and communication\n   - Assess investor relations accessibility",
        15 => "- Search for any legal or regulatory issues\n   - Check for accounting restatements or auditor changes\n   - Review executive conduct and ethics\n   - Look for related-party transactions or conflicts",
        _ => "- Research thoroughly using public sources",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_covers_ids_1_through_15_once() {
        let mut ids: Vec<u8> = FISHER_CRITERIA.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=15).collect::<Vec<u8>>());
    }

    #[test]
    fn exactly_two_quantitative_criteria() {
        let quantitative: Vec<u8> = FISHER_CRITERIA
            .iter()
            .filter(|c| c.category == CriterionCategory::Quantitative)
            .map(|c| c.id)
            .collect();
        assert_eq!(quantitative, vec![1, 5]);
        assert_eq!(qualitative_ids().len(), 13);
    }
}
