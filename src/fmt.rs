use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Format an amount with thousands separators: 1,234.56
pub fn amount(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let fixed = format!("{:.2}", val.abs().round_dp(2));
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

/// Plain two-decimal amount for import files: 1234.56
pub fn plain_amount(val: Decimal) -> String {
    format!("{:.2}", val.round_dp(2))
}

/// Day/month/year text, empty when the date is unknown.
pub fn date(val: Option<NaiveDate>) -> String {
    val.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}
