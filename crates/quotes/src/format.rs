//! Text rendering of quote records.

use serde_json::Value;

use crate::source::QuoteRecord;

const UNKNOWN: &str = "Unknown";

/// Multi-line report for a single symbol.
pub fn stock_report(quote: &QuoteRecord) -> String {
    let symbol = quote
        .get("symbol")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN);

    let volume = quote
        .get("regularMarketVolume")
        .or_else(|| quote.get("volume"));

    [
        format!("Symbol: {symbol}"),
        format!("Current Price: {}", price(quote, "regularMarketPrice")),
        format!("Previous Close: {}", price(quote, "regularMarketPreviousClose")),
        format!("Open: {}", price(quote, "regularMarketOpen")),
        format!(
            "Day's Range: {} - {}",
            price(quote, "regularMarketDayLow"),
            price(quote, "regularMarketDayHigh")
        ),
        format!(
            "52 Week Range: {} - {}",
            price(quote, "fiftyTwoWeekLow"),
            price(quote, "fiftyTwoWeekHigh")
        ),
        format!(
            "Market Cap: {}",
            number(quote, "marketCap")
                .map(|cap| format!("${}", grouped_decimal(cap)))
                .unwrap_or_else(|| UNKNOWN.to_string())
        ),
        format!(
            "Volume: {}",
            volume
                .and_then(grouped_integer)
                .unwrap_or_else(|| UNKNOWN.to_string())
        ),
    ]
    .join("\n")
}

/// One line of a batch lookup. `None` means the fetch failed.
pub fn summary_line(symbol: &str, quote: Option<&QuoteRecord>) -> String {
    let Some((quote, price)) =
        quote.and_then(|q| number(q, "regularMarketPrice").map(|price| (q, price)))
    else {
        return format!("{symbol}: Unable to fetch data");
    };

    let change = number(quote, "regularMarketChange").unwrap_or(0.0);
    let percent = number(quote, "regularMarketChangePercent").unwrap_or(0.0);
    format!("{symbol}: ${price:.2} ({change:+.2} / {percent:+.2}%)")
}

fn number(quote: &QuoteRecord, key: &str) -> Option<f64> {
    quote.get(key).and_then(Value::as_f64)
}

fn price(quote: &QuoteRecord, key: &str) -> String {
    match number(quote, key) {
        Some(value) => format!("${value:.2}"),
        None => UNKNOWN.to_string(),
    }
}

fn grouped_integer(value: &Value) -> Option<String> {
    if let Some(n) = value.as_u64() {
        return Some(group_digits(&n.to_string()));
    }
    value.as_f64().map(|n| group_digits(&format!("{n:.0}")))
}

fn grouped_decimal(value: f64) -> String {
    let fixed = format!("{value:.2}");
    match fixed.split_once('.') {
        Some((whole, fraction)) => format!("{}.{fraction}", group_digits(whole)),
        None => fixed,
    }
}

/// Insert thousands separators into a run of digits with an optional sign.
fn group_digits(whole: &str) -> String {
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", whole),
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
