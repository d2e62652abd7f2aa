//! Decoder for HomeBank XHB files (XML, attribute-only elements).
//!
//! Dates in the export are GLib Julian day numbers: day 1 is 0001-01-01 of
//! the proleptic Gregorian calendar, which is exactly chrono's
//! days-from-common-era count. Amounts are decoded from their decimal string
//! representation; they never pass through binary floating point.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rust_decimal::Decimal;

use crate::errors::ParseError;
use crate::homebank::{
    Account, AccountKind, Category, Currency, Group, HomebankFile, Payee, Split, Transaction,
    TxnStatus, OF_SPLIT,
};

/// Attribute bag of one element, with typed accessors that name the element
/// in every error.
struct Attrs {
    element: &'static str,
    values: HashMap<String, String>,
}

impl Attrs {
    fn new(element: &'static str, event: &BytesStart<'_>) -> Result<Self, ParseError> {
        let mut values = HashMap::new();
        for attr in event.attributes() {
            let attr = attr.map_err(|err| ParseError::Xml(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| ParseError::Xml(err.to_string()))?
                .into_owned();
            values.insert(key, value);
        }
        Ok(Self { element, values })
    }

    fn get(&self, attr: &str) -> Option<&str> {
        self.values.get(attr).map(String::as_str)
    }

    fn text(&self, attr: &str) -> String {
        self.get(attr).unwrap_or("").to_string()
    }

    fn text_or(&self, attr: &str, default: &str) -> String {
        self.get(attr).unwrap_or(default).to_string()
    }

    fn require(&self, attr: &'static str) -> Result<&str, ParseError> {
        self.get(attr).ok_or(ParseError::MissingAttribute {
            element: self.element,
            attr,
        })
    }

    fn int(&self, attr: &'static str, default: u32) -> Result<u32, ParseError> {
        match self.get(attr) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| ParseError::InvalidInteger {
                element: self.element,
                attr,
                value: raw.to_string(),
            }),
        }
    }

    fn opt_int(&self, attr: &'static str) -> Result<Option<u32>, ParseError> {
        match self.get(attr) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ParseError::InvalidInteger {
                    element: self.element,
                    attr,
                    value: raw.to_string(),
                }),
        }
    }

    fn decimal(&self, attr: &'static str) -> Result<Decimal, ParseError> {
        match self.get(attr) {
            None => Ok(Decimal::ZERO),
            Some(raw) => {
                Decimal::from_str_exact(raw).map_err(|_| ParseError::InvalidDecimal {
                    element: self.element,
                    attr,
                    value: raw.to_string(),
                })
            }
        }
    }

    fn date(&self, attr: &'static str) -> Result<NaiveDate, ParseError> {
        let raw = self.require(attr)?;
        raw.parse::<i32>()
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .ok_or_else(|| ParseError::InvalidDate {
                element: self.element,
                value: raw.to_string(),
            })
    }
}

fn parse_currency(attrs: &Attrs) -> Result<Currency, ParseError> {
    let key = attrs.int("key", 0)?;
    if key == 0 {
        return Err(ParseError::ZeroKey { element: "cur" });
    }
    Ok(Currency {
        key,
        iso: attrs.text("iso"),
        name: attrs.text("name"),
        symbol: attrs.text("symb"),
        decimal_char: attrs.text_or("dchar", "."),
        group_char: attrs.text_or("gchar", ","),
        fraction: attrs.int("frac", 2)?,
        rate: attrs.decimal("rate")?,
    })
}

fn parse_group(attrs: &Attrs) -> Result<Group, ParseError> {
    Ok(Group {
        key: attrs.int("key", 0)?,
        name: attrs.text("name"),
    })
}

fn parse_account(attrs: &Attrs) -> Result<Account, ParseError> {
    let key = attrs.int("key", 0)?;
    if key == 0 {
        return Err(ParseError::ZeroKey { element: "account" });
    }
    Ok(Account {
        key,
        name: attrs.text("name"),
        kind: AccountKind::from_raw(attrs.int("type", 0)?),
        currency_key: attrs.int("curr", 0)?,
        initial_balance: attrs.decimal("initial")?,
        flags: attrs.int("flags", 0)?,
        number: attrs.text("number"),
        bank_name: attrs.text("bankname"),
        notes: attrs.text("notes"),
        group_key: attrs.opt_int("grp")?,
    })
}

fn parse_payee(attrs: &Attrs) -> Result<Payee, ParseError> {
    Ok(Payee {
        key: attrs.int("key", 0)?,
        name: attrs.text("name"),
        default_category_key: attrs.opt_int("category")?,
        default_paymode: attrs.opt_int("paymode")?,
    })
}

fn parse_category(attrs: &Attrs) -> Result<Category, ParseError> {
    Ok(Category {
        key: attrs.int("key", 0)?,
        name: attrs.text("name"),
        flags: attrs.int("flags", 0)?,
        parent_key: attrs.opt_int("parent")?,
    })
}

/// Parses the `||`-separated parallel split lists of an `<ope>` element.
///
/// `scat` and `samt` must have the same arity; a shorter memo list is padded
/// with empty memos so no split entry is ever dropped.
fn parse_splits(scat: &str, samt: &str, smem: &str) -> Result<Vec<Split>, ParseError> {
    let cats: Vec<&str> = scat.split("||").collect();
    let amts: Vec<&str> = samt.split("||").collect();
    let mut mems: Vec<&str> = if smem.is_empty() {
        Vec::new()
    } else {
        smem.split("||").collect()
    };
    mems.resize(cats.len(), "");

    if cats.len() != amts.len() {
        return Err(ParseError::SplitListMismatch {
            categories: cats.len(),
            amounts: amts.len(),
        });
    }

    let mut splits = Vec::with_capacity(cats.len());
    for ((cat, amt), mem) in cats
        .iter()
        .copied()
        .zip(amts.iter().copied())
        .zip(mems.iter().copied())
    {
        let category_key = if cat.trim().is_empty() {
            None
        } else {
            Some(
                cat.trim()
                    .parse()
                    .map_err(|_| ParseError::InvalidInteger {
                        element: "ope",
                        attr: "scat",
                        value: cat.to_string(),
                    })?,
            )
        };
        let amount = Decimal::from_str_exact(amt).map_err(|_| ParseError::InvalidDecimal {
            element: "ope",
            attr: "samt",
            value: amt.to_string(),
        })?;
        splits.push(Split {
            amount,
            category_key,
            memo: mem.to_string(),
        });
    }
    Ok(splits)
}

fn parse_transaction(attrs: &Attrs) -> Result<Transaction, ParseError> {
    let flags = attrs.int("flags", 0)?;

    let tags_raw = attrs.text("tags");
    let tags = tags_raw
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    // Split attributes only matter when the split flag is set.
    let mut splits = Vec::new();
    if flags & OF_SPLIT != 0 {
        let scat = attrs.text("scat");
        let samt = attrs.text("samt");
        let smem = attrs.text("smem");
        if !scat.is_empty() && !samt.is_empty() {
            splits = parse_splits(&scat, &samt, &smem)?;
        }
    }

    Ok(Transaction {
        date: attrs.date("date")?,
        amount: attrs.decimal("amount")?,
        account_key: attrs.int("account", 0)?,
        flags,
        status: TxnStatus::from_raw(attrs.int("st", 0)?),
        paymode: attrs.int("paymode", 0)?,
        payee_key: attrs.opt_int("payee")?,
        category_key: attrs.opt_int("category")?,
        wording: attrs.text("wording"),
        info: attrs.text("info"),
        tags,
        kxfer: attrs.opt_int("kxfer")?,
        dst_account_key: attrs.opt_int("dst_account")?,
        splits,
    })
}

/// Parses XHB document text.
pub fn parse_xhb_str(xml: &str) -> Result<HomebankFile, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut file = HomebankFile::default();
    let mut saw_root = false;
    let mut base_currency_key = None;

    loop {
        match reader.read_event() {
            Err(err) => return Err(ParseError::Xml(err.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                if !saw_root {
                    if name != "homebank" {
                        return Err(ParseError::UnexpectedRoot(name));
                    }
                    saw_root = true;
                    continue;
                }
                match name.as_str() {
                    "properties" => {
                        let attrs = Attrs::new("properties", &element)?;
                        base_currency_key = Some(attrs.int("curr", 1)?);
                    }
                    "cur" => {
                        let currency = parse_currency(&Attrs::new("cur", &element)?)?;
                        file.currencies.insert(currency.key, currency);
                    }
                    "grp" => {
                        let group = parse_group(&Attrs::new("grp", &element)?)?;
                        file.groups.insert(group.key, group);
                    }
                    "account" => {
                        let account = parse_account(&Attrs::new("account", &element)?)?;
                        file.accounts.insert(account.key, account);
                    }
                    "pay" => {
                        let payee = parse_payee(&Attrs::new("pay", &element)?)?;
                        file.payees.insert(payee.key, payee);
                    }
                    "cat" => {
                        let category = parse_category(&Attrs::new("cat", &element)?)?;
                        file.categories.insert(category.key, category);
                    }
                    "ope" => {
                        file.transactions
                            .push(parse_transaction(&Attrs::new("ope", &element)?)?);
                    }
                    _ => {}
                }
            }
            Ok(_) => {}
        }
    }

    file.base_currency_key = base_currency_key.ok_or(ParseError::MissingProperties)?;

    // Stable sort keeps file order for same-day transactions.
    file.transactions.sort_by_key(|t| t.date);

    tracing::info!(
        "parsed {} accounts, {} categories, {} payees, {} transactions",
        file.accounts.len(),
        file.categories.len(),
        file.payees.len(),
        file.transactions.len()
    );

    Ok(file)
}

/// Reads and parses a HomeBank XHB file.
pub fn parse_xhb(path: &Path) -> Result<HomebankFile, ParseError> {
    tracing::info!("reading XHB file: {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_xhb_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<homebank v="1.4">
<properties title="test" curr="1"/>
<cur key="1" iso="EUR" name="Euro" symb="&#8364;" dchar="," gchar="." frac="2" rate="0"/>
<account key="1" flags="0" type="1" curr="1" name="Checking" initial="1000.00"/>
<account key="2" flags="2" type="2" curr="1" name="Wallet" initial="50.00"/>
<pay key="1" name="REWE"/>
<cat key="1" flags="0" name="Groceries"/>
<cat key="2" flags="1" parent="1" name="Snacks"/>
<ope date="738886" amount="-50.00" account="1" st="1" flags="0" payee="1" category="1" wording="weekly shop"/>
<ope date="738500" amount="12.50" account="2" st="0" flags="0"/>
</homebank>
"#;

    #[test]
    fn parses_entities_and_sorts_transactions() {
        let file = parse_xhb_str(SAMPLE).unwrap();
        assert_eq!(file.base_currency_key, 1);
        assert_eq!(file.currencies.len(), 1);
        assert_eq!(file.accounts.len(), 2);
        assert_eq!(file.payees.len(), 1);
        assert_eq!(file.categories.len(), 2);
        assert_eq!(file.transactions.len(), 2);

        // 738500 (2022-12-11) must come before 738886 (2024-01-01).
        assert!(file.transactions[0].date < file.transactions[1].date);
        assert_eq!(
            file.transactions[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn decodes_amounts_exactly() {
        let file = parse_xhb_str(SAMPLE).unwrap();
        let txn = &file.transactions[1];
        assert_eq!(txn.amount, Decimal::from_str_exact("-50.00").unwrap());
        assert_eq!(
            file.accounts[&1].initial_balance,
            Decimal::from_str_exact("1000.00").unwrap()
        );
    }

    #[test]
    fn currency_carries_display_separators() {
        let file = parse_xhb_str(SAMPLE).unwrap();
        let currency = file.base_currency().unwrap();
        assert_eq!(currency.iso, "EUR");
        assert_eq!(currency.decimal_char, ",");
        assert_eq!(currency.group_char, ".");
        assert_eq!(currency.fraction, 2);
    }

    #[test]
    fn closed_flag_and_kind_survive_parsing() {
        let file = parse_xhb_str(SAMPLE).unwrap();
        assert!(file.accounts[&2].is_closed());
        assert_eq!(file.accounts[&2].kind, AccountKind::Cash);
    }

    #[test]
    fn split_attributes_build_split_entries() {
        let xml = r#"<homebank>
<properties curr="1"/>
<ope date="738886" amount="-30.00" account="1" flags="256" scat="1||2" samt="-20.00||-10.00" smem="one||two"/>
</homebank>"#;
        let file = parse_xhb_str(xml).unwrap();
        let splits = &file.transactions[0].splits;
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].category_key, Some(1));
        assert_eq!(splits[1].amount, Decimal::from_str_exact("-10.00").unwrap());
        assert_eq!(splits[1].memo, "two");
    }

    #[test]
    fn short_memo_list_is_padded_not_truncated() {
        let xml = r#"<homebank>
<properties curr="1"/>
<ope date="738886" amount="-30.00" account="1" flags="256" scat="1||2" samt="-20.00||-10.00" smem="one"/>
</homebank>"#;
        let file = parse_xhb_str(xml).unwrap();
        let splits = &file.transactions[0].splits;
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[1].memo, "");
    }

    #[test]
    fn mismatched_split_lists_are_a_parse_error() {
        let xml = r#"<homebank>
<properties curr="1"/>
<ope date="738886" amount="-30.00" account="1" flags="256" scat="1||2||3" samt="-20.00||-10.00"/>
</homebank>"#;
        assert!(matches!(
            parse_xhb_str(xml),
            Err(ParseError::SplitListMismatch {
                categories: 3,
                amounts: 2
            })
        ));
    }

    #[test]
    fn missing_properties_is_an_error() {
        let xml = "<homebank><cur key=\"1\" iso=\"EUR\"/></homebank>";
        assert!(matches!(
            parse_xhb_str(xml),
            Err(ParseError::MissingProperties)
        ));
    }

    #[test]
    fn wrong_root_element_is_rejected() {
        let xml = "<gnucash><properties curr=\"1\"/></gnucash>";
        assert!(matches!(
            parse_xhb_str(xml),
            Err(ParseError::UnexpectedRoot(name)) if name == "gnucash"
        ));
    }

    #[test]
    fn zero_keys_are_rejected() {
        let xml = "<homebank><properties curr=\"1\"/><cur key=\"0\" iso=\"EUR\"/></homebank>";
        assert!(matches!(
            parse_xhb_str(xml),
            Err(ParseError::ZeroKey { element: "cur" })
        ));
    }

    #[test]
    fn julian_day_one_is_first_of_january_year_one() {
        let xml = r#"<homebank>
<properties curr="1"/>
<ope date="1" amount="0" account="1"/>
</homebank>"#;
        let file = parse_xhb_str(xml).unwrap();
        assert_eq!(
            file.transactions[0].date,
            NaiveDate::from_ymd_opt(1, 1, 1).unwrap()
        );
    }
}
