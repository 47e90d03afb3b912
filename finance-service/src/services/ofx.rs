//! OFX bank-statement parsing.
//!
//! Handles both OFX 1.x SGML (closing tags optional) and OFX 2.x XML by
//! scanning `<STMTTRN>` blocks for their leaf elements.

use chrono::NaiveDate;
use encoding_rs::WINDOWS_1252;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::TransactionType;

static STMTTRN_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<STMTTRN>").expect("valid regex"));
static STMTTRN_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</STMTTRN>|</BANKTRANLIST>").expect("valid regex"));

/// One statement line.
#[derive(Debug, Clone, PartialEq)]
pub struct OfxTransaction {
    pub fitid: Option<String>,
    pub date: NaiveDate,
    /// Absolute value; the sign lives in `transaction_type`.
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct OfxStatement {
    pub transactions: Vec<OfxTransaction>,
    /// Blocks dropped for a missing or unparsable date or amount, or a zero amount.
    pub skipped: usize,
}

impl OfxStatement {
    /// Earliest and latest posted dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.transactions.iter().map(|t| t.date).min()?;
        let max = self.transactions.iter().map(|t| t.date).max()?;
        Some((min, max))
    }
}

/// Decode a statement as UTF-8, falling back to Windows-1252 (common for
/// Brazilian banks that declare `CHARSET:1252`).
pub fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

pub fn parse(content: &str) -> OfxStatement {
    let mut statement = OfxStatement::default();

    let starts: Vec<usize> = STMTTRN_OPEN.find_iter(content).map(|m| m.end()).collect();
    for (i, &start) in starts.iter().enumerate() {
        let next_open = starts
            .get(i + 1)
            .map(|&n| n - "<STMTTRN>".len())
            .unwrap_or(content.len());
        let mut block = &content[start..next_open];
        if let Some(close) = STMTTRN_CLOSE.find(block) {
            block = &block[..close.start()];
        }

        match parse_block(block) {
            Some(tx) => statement.transactions.push(tx),
            None => statement.skipped += 1,
        }
    }

    statement
}

fn parse_block(block: &str) -> Option<OfxTransaction> {
    let signed = parse_amount(&tag_value(block, "TRNAMT")?)?;
    if signed.is_zero() {
        return None;
    }
    let date = parse_date(&tag_value(block, "DTPOSTED")?)?;

    let description = tag_value(block, "MEMO")
        .or_else(|| tag_value(block, "NAME"))
        .unwrap_or_default();

    let transaction_type = if signed.is_sign_negative() {
        TransactionType::Expense
    } else {
        TransactionType::Income
    };

    Some(OfxTransaction {
        fitid: tag_value(block, "FITID"),
        date,
        amount: signed.abs(),
        transaction_type,
        description: unescape(&description),
    })
}

/// Text after `<TAG>` up to the next tag or line break.
fn tag_value(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let upper = block.to_ascii_uppercase();
    let start = upper.find(&open)? + open.len();
    let rest = &block[start..];
    let end = rest.find(['<', '\r', '\n']).unwrap_or(rest.len());
    let value = rest[..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Accepts `1234.56`, `1234,56`, `1.234,56` and `1,234.56`. With both
/// separators present the last one is the decimal point; a separator that
/// repeats is a thousands separator.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim().trim_start_matches('+');
    let decimal_sep = match (raw.rfind('.'), raw.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => Some('.'),
        (None, Some(_)) => Some(','),
        (None, None) => None,
    }
    .filter(|sep| raw.matches(*sep).count() == 1);

    let normalized: String = raw
        .chars()
        .filter_map(|c| match c {
            '.' | ',' if Some(c) == decimal_sep => Some('.'),
            '.' | ',' => None,
            other => Some(other),
        })
        .collect();
    Decimal::from_str(&normalized).ok()
}

/// `YYYYMMDD[HHMMSS[.XXX]][TZ]`; only the date part is used.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let digits = raw.get(..8)?;
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

fn unescape(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SGML: &str = "OFXHEADER:100\r\nDATA:OFXSGML\r\nCHARSET:1252\r\n\r\n\
<OFX><BANKMSGSRSV1><STMTTRNRS><STMTRS><BANKTRANLIST>\r\n\
<DTSTART>20240301\r\n<DTEND>20240331\r\n\
<STMTTRN>\r\n<TRNTYPE>DEBIT\r\n<DTPOSTED>20240305120000[-3:BRT]\r\n<TRNAMT>-45.90\r\n<FITID>A1\r\n<MEMO>IFOOD *RESTAURANTE\r\n\
<STMTTRN>\r\n<TRNTYPE>CREDIT\r\n<DTPOSTED>20240310\r\n<TRNAMT>5000.00\r\n<FITID>A2\r\n<NAME>SALARIO EMPRESA\r\n\
</BANKTRANLIST></STMTRS></STMTTRNRS></BANKMSGSRSV1></OFX>";

    #[test]
    fn parses_sgml_without_closing_tags() {
        let statement = parse(SGML);
        assert_eq!(statement.skipped, 0);
        assert_eq!(statement.transactions.len(), 2);

        let first = &statement.transactions[0];
        assert_eq!(first.fitid.as_deref(), Some("A1"));
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(first.amount, dec!(45.90));
        assert_eq!(first.transaction_type, TransactionType::Expense);
        assert_eq!(first.description, "IFOOD *RESTAURANTE");

        let second = &statement.transactions[1];
        assert_eq!(second.transaction_type, TransactionType::Income);
        assert_eq!(second.description, "SALARIO EMPRESA");
    }

    #[test]
    fn parses_xml_with_closing_tags() {
        let xml = r#"<?xml version="1.0"?><OFX><BANKTRANLIST>
<STMTTRN><TRNTYPE>DEBIT</TRNTYPE><DTPOSTED>20240115</DTPOSTED><TRNAMT>-12.5</TRNAMT><FITID>X9</FITID><NAME>Uber &amp; Co</NAME><MEMO>UBER TRIP</MEMO></STMTTRN>
</BANKTRANLIST></OFX>"#;
        let statement = parse(xml);
        assert_eq!(statement.transactions.len(), 1);
        let tx = &statement.transactions[0];
        assert_eq!(tx.description, "UBER TRIP");
        assert_eq!(tx.amount, dec!(12.5));
    }

    #[test]
    fn memo_falls_back_to_name_and_unescapes() {
        let block = "<STMTTRN><DTPOSTED>20240115<TRNAMT>-1.00<NAME>Pão &amp; Cia</STMTTRN>";
        let statement = parse(block);
        assert_eq!(statement.transactions[0].description, "Pão & Cia");
    }

    #[test]
    fn invalid_and_zero_rows_are_skipped() {
        let content = "<STMTTRN><DTPOSTED>2024<TRNAMT>-1.00\
<STMTTRN><DTPOSTED>20240115<TRNAMT>abc\
<STMTTRN><DTPOSTED>20240115<TRNAMT>0.00\
<STMTTRN><DTPOSTED>20240116<TRNAMT>-3,50<MEMO>PADARIA";
        let statement = parse(content);
        assert_eq!(statement.skipped, 3);
        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.transactions[0].amount, dec!(3.50));
    }

    #[test]
    fn latin1_bytes_are_decoded() {
        let bytes = b"<MEMO>FARM\xc1CIA";
        assert_eq!(decode(bytes), "<MEMO>FARMÁCIA");
    }

    #[test]
    fn windows_1252_punctuation_is_decoded() {
        let bytes = b"<MEMO>PIX \x96 LOJA \x80";
        assert_eq!(decode(bytes), "<MEMO>PIX \u{2013} LOJA \u{20ac}");
    }

    #[test]
    fn amounts_with_both_separators() {
        assert_eq!(parse_amount("-1.234,56"), Some(dec!(-1234.56)));
        assert_eq!(parse_amount("1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_amount("1.234.567,89"), Some(dec!(1234567.89)));
        assert_eq!(parse_amount("-3,50"), Some(dec!(-3.50)));
        assert_eq!(parse_amount("+45.90"), Some(dec!(45.90)));
        assert_eq!(parse_amount("1.234.567"), Some(dec!(1234567)));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn brazilian_thousands_amount_in_statement() {
        let statement = parse("<STMTTRN><DTPOSTED>20240116<TRNAMT>-1.234,56<MEMO>ALUGUEL");
        assert_eq!(statement.skipped, 0);
        let tx = &statement.transactions[0];
        assert_eq!(tx.amount, dec!(1234.56));
        assert_eq!(tx.transaction_type, TransactionType::Expense);
    }

    #[test]
    fn date_range_spans_transactions() {
        let statement = parse(SGML);
        let (start, end) = statement.date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert!(parse("").date_range().is_none());
    }
}
