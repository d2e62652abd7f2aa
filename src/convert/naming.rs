//! Target account naming: fixed type→prefix/tag tables, hierarchy-safe name
//! sanitization, category paths, and payee clearing accounts.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::homebank::{Account, AccountKind, Category};
use crate::journal::TypeTag;

/// Root of all income (revenue) category accounts.
pub const INCOME_ROOT: &str = "Income";
/// Root of all expense category accounts.
pub const EXPENSES_ROOT: &str = "Expenses";
/// Leaf used when a category key is absent or does not resolve.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Root of the per-payee debtor clearing accounts.
pub const DEBTORS_ROOT: &str = "Assets:Debtors";
/// Root of the per-payee creditor clearing accounts.
pub const CREDITORS_ROOT: &str = "Liabilities:Creditors";
/// Equity counter-account of the opening-balance transactions.
pub const OPENING_EQUITY_ACCOUNT: &str = "Equity:Opening Balances";

/// Makes a source name safe for use inside a target account name.
///
/// `:` is the hierarchy separator and runs of two or more spaces terminate
/// the account name in directives, so both are structural and must not
/// survive.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut previous_was_space = false;
    for ch in name.trim().chars() {
        let ch = if ch == ':' { '-' } else { ch };
        if ch == ' ' {
            if previous_was_space {
                continue;
            }
            previous_was_space = true;
        } else {
            previous_was_space = false;
        }
        out.push(ch);
    }
    out
}

/// Target account prefix for an account kind.
pub fn account_prefix(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::None => "Assets",
        AccountKind::Bank => "Assets:Bank",
        AccountKind::Cash => "Assets:Cash",
        AccountKind::Asset => "Assets:Fixed Assets",
        AccountKind::CreditCard => "Liabilities:Credit Card",
        AccountKind::Liability => "Liabilities:Loans",
        AccountKind::Savings => "Assets:Savings",
    }
}

/// Classification tag for an account kind.
pub fn account_type_tag(kind: AccountKind) -> TypeTag {
    match kind {
        AccountKind::None => TypeTag::Asset,
        AccountKind::Bank => TypeTag::Cash,
        AccountKind::Cash => TypeTag::Cash,
        AccountKind::Asset => TypeTag::Asset,
        AccountKind::CreditCard => TypeTag::Liability,
        AccountKind::Liability => TypeTag::Liability,
        AccountKind::Savings => TypeTag::Asset,
    }
}

/// Full target account name for a source account.
pub fn account_name(account: &Account) -> String {
    format!("{}:{}", account_prefix(account.kind), sanitize(&account.name))
}

/// Category path (`Parent:Child` or just the name). An unresolvable key maps
/// to the fixed uncategorized label.
pub fn category_path(key: u32, categories: &BTreeMap<u32, Category>) -> String {
    let Some(category) = categories.get(&key) else {
        return UNCATEGORIZED.to_string();
    };
    let safe_name = sanitize(&category.name);
    if let Some(parent) = category.parent_key.and_then(|k| categories.get(&k)) {
        return format!("{}:{}", sanitize(&parent.name), safe_name);
    }
    safe_name
}

/// Income- or Expense-rooted account for a category key.
///
/// When the key is absent or does not resolve, the *amount's* sign picks the
/// uncategorized root: inflows land under income, outflows under expenses.
pub fn category_account(
    key: Option<u32>,
    amount: Decimal,
    categories: &BTreeMap<u32, Category>,
) -> String {
    let category = key.and_then(|k| categories.get(&k));
    let Some(category) = category else {
        let root = if amount >= Decimal::ZERO {
            INCOME_ROOT
        } else {
            EXPENSES_ROOT
        };
        return format!("{root}:{UNCATEGORIZED}");
    };

    let root = if category.is_income() {
        INCOME_ROOT
    } else {
        EXPENSES_ROOT
    };
    format!("{}:{}", root, category_path(category.key, categories))
}

/// Per-payee clearing account: creditors for outflows, debtors for inflows.
pub fn payee_account(payee_name: &str, amount: Decimal) -> String {
    let safe_name = sanitize(payee_name);
    if amount < Decimal::ZERO {
        format!("{CREDITORS_ROOT}:{safe_name}")
    } else {
        format!("{DEBTORS_ROOT}:{safe_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn category(key: u32, name: &str, flags: u32, parent_key: Option<u32>) -> Category {
        Category {
            key,
            name: name.into(),
            flags,
            parent_key,
        }
    }

    #[test]
    fn sanitize_replaces_separator_and_collapses_spaces() {
        assert_eq!(sanitize("Sparkasse: Giro"), "Sparkasse- Giro");
        assert_eq!(sanitize("Two   spaces    here"), "Two spaces here");
        assert_eq!(sanitize("  padded  "), "padded");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["A : B", "x    y", " edge ", "plain"] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn prefix_table_matches_account_kinds() {
        assert_eq!(account_prefix(AccountKind::None), "Assets");
        assert_eq!(account_prefix(AccountKind::Bank), "Assets:Bank");
        assert_eq!(account_prefix(AccountKind::Cash), "Assets:Cash");
        assert_eq!(account_prefix(AccountKind::Asset), "Assets:Fixed Assets");
        assert_eq!(
            account_prefix(AccountKind::CreditCard),
            "Liabilities:Credit Card"
        );
        assert_eq!(account_prefix(AccountKind::Liability), "Liabilities:Loans");
        assert_eq!(account_prefix(AccountKind::Savings), "Assets:Savings");
    }

    #[test]
    fn bank_and_cash_carry_the_cash_tag() {
        assert_eq!(account_type_tag(AccountKind::Bank).as_str(), "C");
        assert_eq!(account_type_tag(AccountKind::Cash).as_str(), "C");
        assert_eq!(account_type_tag(AccountKind::None).as_str(), "A");
        assert_eq!(account_type_tag(AccountKind::CreditCard).as_str(), "L");
    }

    #[test]
    fn category_path_resolves_parent_child() {
        let mut categories = BTreeMap::new();
        categories.insert(1, category(1, "Food", 0, None));
        categories.insert(2, category(2, "Groceries", 0, Some(1)));
        assert_eq!(category_path(2, &categories), "Food:Groceries");
        assert_eq!(category_path(1, &categories), "Food");
        assert_eq!(category_path(9, &categories), UNCATEGORIZED);
    }

    #[test]
    fn category_account_uses_income_flag() {
        let mut categories = BTreeMap::new();
        categories.insert(1, category(1, "Salary", crate::homebank::GF_INCOME, None));
        categories.insert(2, category(2, "Groceries", 0, None));
        assert_eq!(
            category_account(Some(1), dec!(-10), &categories),
            "Income:Salary"
        );
        assert_eq!(
            category_account(Some(2), dec!(10), &categories),
            "Expenses:Groceries"
        );
    }

    #[test]
    fn uncategorized_fallback_follows_amount_sign_not_flag() {
        let categories = BTreeMap::new();
        assert_eq!(
            category_account(None, dec!(5), &categories),
            "Income:Uncategorized"
        );
        assert_eq!(
            category_account(None, dec!(-5), &categories),
            "Expenses:Uncategorized"
        );
        assert_eq!(
            category_account(Some(42), dec!(-5), &categories),
            "Expenses:Uncategorized"
        );
        assert_eq!(
            category_account(None, dec!(0), &categories),
            "Income:Uncategorized"
        );
    }

    #[test]
    fn payee_account_splits_creditors_and_debtors() {
        assert_eq!(
            payee_account("REWE", dec!(-50)),
            "Liabilities:Creditors:REWE"
        );
        assert_eq!(payee_account("Employer", dec!(3000)), "Assets:Debtors:Employer");
    }
}
