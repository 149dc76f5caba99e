use serde_json::Value;

use crate::envelope::DecodedRecord;

/// Static rename table from upstream field keys to readable labels.
///
/// Keys missing from the table pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelTable {
    name: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl LabelTable {
    pub const fn new(name: &'static str, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, entries }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn entries(&self) -> &'static [(&'static str, &'static str)] {
        self.entries
    }

    pub fn label_for(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(raw, _)| *raw == key)
            .map(|(_, label)| *label)
    }

    pub fn rename<'k>(&self, key: &'k str) -> &'k str {
        match self.label_for(key) {
            Some(label) => label,
            None => key,
        }
    }

    /// Renames every key of `record`.
    ///
    /// When a pass-through key and a renamed key land on the same label, the
    /// renamed key's value is kept.
    pub fn relabel(&self, record: DecodedRecord) -> DecodedRecord {
        let mut renamed: Vec<(&'static str, Value)> = Vec::new();
        let mut relabelled = DecodedRecord::new();

        for (key, value) in record {
            match self.label_for(&key) {
                Some(label) => renamed.push((label, value)),
                None => {
                    relabelled.insert(key, value);
                }
            }
        }
        for (label, value) in renamed {
            relabelled.insert(label.to_owned(), value);
        }

        relabelled
    }
}

pub const HISTORICAL_LABELS: LabelTable = LabelTable::new(
    "historical",
    &[
        ("t", "date"),
        ("o", "opening_price"),
        ("h", "high_price"),
        ("l", "low_price"),
        ("c", "closing_price"),
        ("v", "volume"),
        ("a", "adjusted_closing_price"),
        ("ch", "price_change"),
    ],
);

const QUOTE_ENTRIES: &[(&str, &str)] = &[
    ("c", "price_change"),
    ("cdr", "change_direction"),
    ("cl", "closing_price"),
    ("cp", "percent_change"),
    ("days", "days_traded"),
    ("e", "is_extended_hours"),
    ("ec", "extended_hours_change"),
    ("ecp", "extended_hours_percent_change"),
    ("ep", "extended_hours_price"),
    ("epd", "extended_hours_previous_day_price"),
    ("es", "extended_hours_status"),
    ("ets", "extended_hours_timestamp"),
    ("eu", "extended_hours_update_time"),
    ("ex", "exchange"),
    ("exp", "extended_hours_price_expiration"),
    ("h", "high_price"),
    ("h52", "fifty_two_week_high"),
    ("l", "low_price"),
    ("l52", "fifty_two_week_low"),
    ("ms", "market_status"),
    ("o", "open_price"),
    ("p", "current_price"),
    ("pd", "previous_close_price"),
    ("symbol", "ticker_symbol"),
    ("td", "trading_date"),
    ("ts", "timestamp"),
    ("u", "last_update_time"),
    ("uid", "unique_id"),
    ("v", "volume"),
];

// Stock and ETF quotes currently share key names.
pub const STOCK_QUOTE_LABELS: LabelTable = LabelTable::new("stock_quote", QUOTE_ENTRIES);
pub const ETF_QUOTE_LABELS: LabelTable = LabelTable::new("etf_quote", QUOTE_ENTRIES);

pub const BALANCE_SHEET_LABELS: LabelTable = LabelTable::new(
    "balance_sheet",
    &[
        ("datekey", "date_of_financial_data"),
        ("fiscalYear", "fiscal_year"),
        ("fiscalQuarter", "fiscal_quarter"),
        ("cashneq", "cash_and_equivalents"),
        ("investmentsCurrent", "short_term_investments"),
        ("totalcash", "total_cash_and_short_term_investments"),
        ("cashGrowth", "cash_growth"),
        ("receivables", "receivables"),
        ("accountsReceivable", "accounts_receivable"),
        ("otherReceivables", "other_receivables"),
        ("inventory", "inventory"),
        ("restrictedCash", "restricted_cash"),
        ("otherCurrentAssets", "other_current_assets"),
        ("assetsc", "total_current_assets"),
        ("ppnenet", "property_plant_and_equipment_net"),
        ("investmentsNonCurrent", "long_term_investments"),
        ("goodwill", "goodwill"),
        ("otherIntangibles", "other_intangible_assets"),
        ("otherLongTermAssets", "other_long_term_assets"),
        ("assetsnc", "total_non_current_assets"),
        ("assets", "total_assets"),
        ("payables", "accounts_payable"),
        ("accruedExpenses", "accrued_expenses"),
        ("debtCurrent", "short_term_debt"),
        ("currentPortLeases", "current_portion_of_leases"),
        ("unearnedRevenueCurrent", "current_unearned_revenue"),
        ("otherCurrentLiabilities", "other_current_liabilities"),
        ("liabilitiesc", "total_current_liabilities"),
        ("debtNonCurrent", "long_term_debt"),
        ("leasesNonCurrent", "long_term_leases"),
        ("otherLongTermLiabilities", "other_long_term_liabilities"),
        ("liabilitiesnc", "total_non_current_liabilities"),
        ("liabilities", "total_liabilities"),
        ("commonStock", "common_stock"),
        ("retearn", "retained_earnings"),
        ("comprehensiveIncome", "accumulated_other_comprehensive_income"),
        ("equity", "shareholders_equity"),
        ("liabilitiesequity", "total_liabilities_and_equity"),
        ("debt", "total_debt"),
        ("netcash", "net_cash"),
        ("netCashGrowth", "net_cash_growth"),
        ("netcashpershare", "net_cash_per_share"),
        ("workingcapital", "working_capital"),
        ("bvps", "book_value_per_share"),
        ("tangibleBookValue", "tangible_book_value"),
        ("tangibleBookValuePerShare", "tangible_book_value_per_share"),
    ],
);

pub const CASH_FLOW_LABELS: LabelTable = LabelTable::new(
    "cash_flow",
    &[
        ("datekey", "date_of_financial_data"),
        ("fiscalYear", "fiscal_year"),
        ("fiscalQuarter", "fiscal_quarter"),
        ("netIncomeCF", "net_income_operating_cash_flow_basis"),
        ("totalDepAmorCF", "total_depreciation_amortization"),
        ("sbcomp", "stock_based_compensation"),
        ("changeAR", "change_in_accounts_receivable"),
        ("changeInventory", "change_in_inventory"),
        ("changeAP", "change_in_accounts_payable"),
        ("changeUnearnedRev", "change_in_unearned_revenue"),
        ("changeOtherNetOperAssets", "change_in_other_net_operating_assets"),
        ("otheroperating", "other_operating_cash_flow_items"),
        ("ncfo", "net_cash_from_operating_activities"),
        ("ocfGrowth", "operating_cash_flow_growth"),
        ("capex", "capital_expenditures"),
        ("cashAcquisition", "cash_used_for_acquisitions"),
        ("salePurchaseIntangibles", "sale_purchase_of_intangibles"),
        ("investInSecurities", "investment_in_securities"),
        ("otherinvesting", "other_investing_cash_flow_items"),
        ("ncfi", "net_cash_from_investing_activities"),
        ("debtIssuedShortTerm", "short_term_debt_issued"),
        ("debtIssuedLongTerm", "long_term_debt_issued"),
        ("debtIssuedTotal", "total_debt_issued"),
        ("debtRepaidShortTerm", "short_term_debt_repaid"),
        ("debtRepaidLongTerm", "long_term_debt_repaid"),
        ("debtRepaidTotal", "total_debt_repaid"),
        ("netDebtIssued", "net_debt_issued"),
        ("commonIssued", "common_stock_issued"),
        ("commonRepurchased", "common_stock_repurchased"),
        ("commonDividendCF", "common_dividend_cash_flow"),
        ("otherfinancing", "other_financing_cash_flow_items"),
        ("ncff", "net_cash_from_financing_activities"),
        ("ncf", "net_cash_flow"),
        ("fcf", "free_cash_flow"),
        ("fcfGrowth", "free_cash_flow_growth"),
        ("fcfMargin", "free_cash_flow_margin"),
        ("fcfps", "free_cash_flow_per_share"),
        ("leveredFCF", "levered_free_cash_flow"),
        ("unleveredFCF", "unlevered_free_cash_flow"),
        ("cashInterestPaid", "cash_interest_paid"),
        ("cashTaxesPaid", "cash_taxes_paid"),
        ("changeNetWorkingCapital", "change_in_net_working_capital"),
    ],
);

pub const INCOME_LABELS: LabelTable = LabelTable::new(
    "income",
    &[
        ("datekey", "date_of_financial_data"),
        ("fiscalYear", "fiscal_year"),
        ("fiscalQuarter", "fiscal_quarter"),
        ("revenue", "total_revenue"),
        ("revenueGrowth", "revenue_growth"),
        ("cor", "cost_of_revenue"),
        ("gp", "gross_profit"),
        ("sgna", "selling_general_and_administrative_expenses"),
        ("rnd", "research_and_development_expenses"),
        ("opex", "total_operating_expenses"),
        ("opinc", "operating_income"),
        ("interestExpense", "interest_expense"),
        ("interestIncome", "interest_income"),
        ("currencyGains", "currency_exchange_gains"),
        ("otherNonOperating", "other_non_operating_income"),
        ("ebtExcl", "earnings_before_tax_excluding_non_recurring_items"),
        ("gainInvestments", "gain_on_investments"),
        ("mergerRestructureCharges", "merger_and_restructuring_charges"),
        ("otherUnusualItems", "other_unusual_items"),
        ("pretax", "pretax_income"),
        ("taxexp", "tax_expense"),
        ("netinc", "net_income"),
        ("netinccmn", "net_income_common_stockholders"),
        ("netIncomeGrowth", "net_income_growth"),
        ("sharesBasic", "basic_shares_outstanding"),
        ("sharesDiluted", "diluted_shares_outstanding"),
        ("sharesYoY", "year_over_year_shares_growth"),
        ("epsBasic", "basic_earnings_per_share"),
        ("epsdil", "diluted_earnings_per_share"),
        ("epsGrowth", "earnings_per_share_growth"),
        ("fcf", "free_cash_flow"),
        ("fcfps", "free_cash_flow_per_share"),
        ("dps", "dividends_per_share"),
        ("dividendGrowth", "dividend_growth"),
        ("grossMargin", "gross_margin"),
        ("operatingMargin", "operating_margin"),
        ("profitMargin", "net_profit_margin"),
        ("fcfMargin", "free_cash_flow_margin"),
        ("taxrate", "effective_tax_rate"),
        ("ebitda", "earnings_before_interest_taxes_depreciation_amortization"),
        ("depAmorEbitda", "depreciation_and_amortization_in_ebitda"),
        ("ebitdaMargin", "ebitda_margin"),
        ("ebit", "earnings_before_interest_and_taxes"),
        ("ebitMargin", "ebit_margin"),
        ("legalSettlements", "legal_settlements"),
        ("payoutratio", "dividend_payout_ratio"),
    ],
);

pub const RATIOS_LABELS: LabelTable = LabelTable::new(
    "ratios",
    &[
        ("datekey", "date_of_financial_data"),
        ("fiscalYear", "fiscal_year"),
        ("fiscalQuarter", "fiscal_quarter"),
        ("marketcap", "market_cap"),
        ("marketCapGrowth", "market_cap_growth"),
        ("ev", "enterprise_value"),
        ("lastCloseRatios", "last_close_ratios"),
        ("pe", "price_to_earnings_ratio"),
        ("ps", "price_to_sales_ratio"),
        ("pb", "price_to_book_ratio"),
        ("pfcf", "price_to_free_cash_flow_ratio"),
        ("pocf", "price_to_operating_cash_flow_ratio"),
        ("evrevenue", "enterprise_value_to_revenue"),
        ("evebitda", "enterprise_value_to_ebitda"),
        ("evebit", "enterprise_value_to_ebit"),
        ("evfcf", "enterprise_value_to_free_cash_flow"),
        ("debtequity", "debt_to_equity_ratio"),
        ("debtebitda", "debt_to_ebitda_ratio"),
        ("debtfcf", "debt_to_free_cash_flow_ratio"),
        ("assetturnover", "asset_turnover_ratio"),
        ("inventoryTurnover", "inventory_turnover_ratio"),
        ("quickRatio", "quick_ratio"),
        ("currentratio", "current_ratio"),
        ("roe", "return_on_equity"),
        ("roa", "return_on_assets"),
        ("roic", "return_on_invested_capital"),
        ("earningsyield", "earnings_yield"),
        ("fcfyield", "free_cash_flow_yield"),
        ("dividendyield", "dividend_yield"),
        ("payoutratio", "payout_ratio"),
        ("buybackyield", "buyback_yield"),
        ("totalreturn", "total_return"),
    ],
);

pub const REVENUE_LABELS: LabelTable = LabelTable::new(
    "revenue",
    &[
        ("annual", "annual_revenue"),
        ("quarterly", "quarterly_revenue"),
        ("ttm", "trailing_twelve_months_revenue"),
    ],
);

pub const ALL_TABLES: [&LabelTable; 8] = [
    &HISTORICAL_LABELS,
    &STOCK_QUOTE_LABELS,
    &ETF_QUOTE_LABELS,
    &BALANCE_SHEET_LABELS,
    &CASH_FLOW_LABELS,
    &INCOME_LABELS,
    &RATIOS_LABELS,
    &REVENUE_LABELS,
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn tables_have_unique_keys_and_labels() {
        for table in ALL_TABLES {
            let keys: HashSet<_> = table.entries().iter().map(|(key, _)| *key).collect();
            let labels: HashSet<_> = table.entries().iter().map(|(_, label)| *label).collect();

            assert_eq!(keys.len(), table.entries().len(), "{}", table.name());
            assert_eq!(labels.len(), table.entries().len(), "{}", table.name());
        }
    }

    #[test]
    fn historical_record_is_relabelled() {
        let record = json!({"t": "2024-01-02", "c": 185.64, "v": 82488700, "x": 1});
        let Value::Object(record) = record else {
            unreachable!()
        };

        let relabelled = HISTORICAL_LABELS.relabel(record);

        assert_eq!(
            Value::Object(relabelled),
            json!({"date": "2024-01-02", "closing_price": 185.64, "volume": 82488700, "x": 1})
        );
    }

    #[test]
    fn mapped_key_wins_on_collision() {
        let Value::Object(record) = json!({"date": "raw", "t": "mapped"}) else {
            unreachable!()
        };

        let relabelled = HISTORICAL_LABELS.relabel(record);

        assert_eq!(relabelled.len(), 1);
        assert_eq!(relabelled.get("date"), Some(&json!("mapped")));
    }

    #[test]
    fn quote_tables_cover_the_same_keys() {
        assert_eq!(STOCK_QUOTE_LABELS.entries(), ETF_QUOTE_LABELS.entries());
        assert_eq!(STOCK_QUOTE_LABELS.rename("h52"), "fifty_two_week_high");
        assert_ne!(STOCK_QUOTE_LABELS.name(), ETF_QUOTE_LABELS.name());
    }

    proptest! {
        #[test]
        fn unknown_keys_pass_through(key in "[A-Z]{12,20}") {
            for table in ALL_TABLES {
                prop_assert_eq!(table.rename(&key), key.as_str());
            }
        }
    }
}
