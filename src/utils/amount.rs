/// Format an amount in minor units with the given number of decimals, e.g. `-1050` with two
/// decimals becomes `-10.50`.
pub fn format_amount(amount: i64, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u64.pow(decimals);
    let abs = amount.unsigned_abs();
    format!(
        "{}{}.{:0width$}",
        if amount < 0 { "-" } else { "" },
        abs / scale,
        abs % scale,
        width = decimals as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minor_units() {
        assert_eq!(format_amount(1100, 2), "11.00");
        assert_eq!(format_amount(5, 2), "0.05");
        assert_eq!(format_amount(-1050, 2), "-10.50");
        assert_eq!(format_amount(-7, 2), "-0.07");
        assert_eq!(format_amount(42, 0), "42");
        assert_eq!(format_amount(i64::MIN, 2), "-92233720368547758.08");
    }
}
