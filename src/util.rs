use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::Timelike;
use chrono::Utc;
use once_cell::sync::Lazy;

// The shop runs on Moscow time, which is a fixed UTC+3 (no DST).
static MSK: Lazy<FixedOffset> = Lazy::new(|| FixedOffset::east_opt(3 * 3600).expect("valid offset"));

pub fn moscow_today(now: DateTime<Utc>) -> NaiveDate {
  now.with_timezone(&*MSK).date_naive()
}

pub fn moscow_hour(now: DateTime<Utc>) -> u32 {
  now.with_timezone(&*MSK).hour()
}

pub fn format_price(amount: i64) -> String {
  format!("{amount}₽")
}

#[cfg(test)]
mod tests {
  use super::format_price;
  use super::moscow_hour;
  use super::moscow_today;
  use chrono::DateTime;
  use chrono::NaiveDate;
  use chrono::Utc;

  fn utc(value: &str) -> DateTime<Utc> {
    value.parse().expect("valid timestamp")
  }

  #[test]
  fn moscow_day_rolls_over_at_21_utc() {
    let before = utc("2024-03-01T20:59:00Z");
    let after = utc("2024-03-01T21:00:00Z");
    assert_eq!(moscow_today(before), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(moscow_today(after), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
  }

  #[test]
  fn moscow_hour_is_three_ahead() {
    assert_eq!(moscow_hour(utc("2024-03-01T05:30:00Z")), 8);
    assert_eq!(moscow_hour(utc("2024-03-01T23:00:00Z")), 2);
  }

  #[test]
  fn formats_rubles() {
    assert_eq!(format_price(200), "200₽");
  }
}
