//! Grouping of expenses into ISO weeks.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, expense::Expense, weekly_total::iso_week::IsoWeek};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// The number of days the weekly total is averaged over.
const DAYS_PER_WEEK: i64 = 7;

/// The spending in one ISO week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTotal {
    /// The ISO year of the week.
    pub year: i32,
    /// The ISO week number, 1 to 53.
    pub week_number: u8,
    /// The Monday that starts the week.
    #[serde(with = "iso_date")]
    pub start_date: Date,
    /// The number of expenses in the week.
    pub count: usize,
    /// The sum of the amounts of the expenses in the week.
    pub total: Decimal,
    /// The average spending per day, i.e. `total` divided by seven regardless of how many days
    /// had expenses.
    pub average: Decimal,
}

/// Group `expenses` by the ISO week of their date and summarise each week.
///
/// The date of each expense is taken in the offset it carries, expenses read from the database
/// are in UTC. Weeks without expenses are left out, and the result is ordered from the earliest
/// week to the latest.
///
/// # Errors
/// Returns [Error::InvalidIsoWeek] if the start of a week falls outside the supported date range.
pub fn aggregate_weekly_totals(expenses: &[Expense]) -> Result<Vec<WeeklyTotal>, Error> {
    let mut weeks: BTreeMap<IsoWeek, Vec<&Expense>> = BTreeMap::new();

    for expense in expenses {
        weeks
            .entry(IsoWeek::of(expense.date.date()))
            .or_default()
            .push(expense);
    }

    weeks
        .into_iter()
        .map(|(week, expenses)| {
            let total: Decimal = expenses.iter().map(|expense| expense.amount).sum();

            Ok(WeeklyTotal {
                year: week.year,
                week_number: week.week,
                start_date: week.start_date()?,
                count: expenses.len(),
                total,
                average: total / Decimal::from(DAYS_PER_WEEK),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::{
        OffsetDateTime,
        macros::{date, datetime},
    };

    use crate::{
        expense::Expense,
        user::UserID,
        weekly_total::aggregation::{WeeklyTotal, aggregate_weekly_totals},
    };

    fn expense(id: i64, date: OffsetDateTime, amount: Decimal) -> Expense {
        Expense {
            id,
            owner: UserID::new(1),
            date,
            description: format!("expense {id}"),
            amount,
            comment: String::new(),
        }
    }

    #[track_caller]
    fn assert_average_is_daily(week: &WeeklyTotal) {
        assert_eq!(week.average, week.total / Decimal::from(7));
    }

    #[test]
    fn empty_input_gives_no_weeks() {
        assert_eq!(aggregate_weekly_totals(&[]), Ok(vec![]));
    }

    #[test]
    fn groups_expenses_stored_from_auckland_midnights() {
        // Local midnights in Pacific/Auckland (+12) on 30 June, 2 July and 7 July 2014.
        let expenses = [
            expense(1, datetime!(2014 - 06 - 29 12:00 UTC), Decimal::new(74700, 2)),
            expense(2, datetime!(2014 - 07 - 01 12:00 UTC), Decimal::new(1000, 2)),
            expense(3, datetime!(2014 - 07 - 06 12:00 UTC), Decimal::new(500, 2)),
        ];

        let weeks = aggregate_weekly_totals(&expenses).unwrap();

        assert_eq!(weeks.len(), 2);
        assert_eq!((weeks[0].year, weeks[0].week_number), (2014, 26));
        assert_eq!(weeks[0].start_date, date!(2014 - 06 - 23));
        assert_eq!(weeks[0].count, 1);
        assert_eq!(weeks[0].total.to_string(), "747.00");
        assert_eq!((weeks[1].year, weeks[1].week_number), (2014, 27));
        assert_eq!(weeks[1].start_date, date!(2014 - 06 - 30));
        assert_eq!(weeks[1].count, 2);
        assert_eq!(weeks[1].total.to_string(), "15.00");
        weeks.iter().for_each(assert_average_is_daily);
    }

    #[test]
    fn groups_by_calendar_week_of_utc_dates() {
        let expenses = [
            expense(1, datetime!(2014 - 06 - 30 0:00 UTC), Decimal::new(74700, 2)),
            expense(2, datetime!(2014 - 07 - 02 0:00 UTC), Decimal::new(1000, 2)),
            expense(3, datetime!(2014 - 07 - 07 0:00 UTC), Decimal::new(500, 2)),
        ];

        let weeks = aggregate_weekly_totals(&expenses).unwrap();

        let counts: Vec<usize> = weeks.iter().map(|week| week.count).collect();
        assert_eq!(counts, vec![2, 1]);
        assert_eq!(weeks[0].total.to_string(), "757.00");
        assert_eq!(weeks[1].start_date, date!(2014 - 07 - 07));
    }

    #[test]
    fn week_53_stays_together_across_new_year() {
        let expenses = [
            expense(1, datetime!(2016 - 01 - 04 9:00 UTC), Decimal::new(300, 2)),
            expense(2, datetime!(2016 - 01 - 02 9:00 UTC), Decimal::new(200, 2)),
            expense(3, datetime!(2015 - 12 - 31 9:00 UTC), Decimal::new(100, 2)),
        ];

        let weeks = aggregate_weekly_totals(&expenses).unwrap();

        let keys: Vec<(i32, u8)> = weeks
            .iter()
            .map(|week| (week.year, week.week_number))
            .collect();
        assert_eq!(keys, vec![(2015, 53), (2016, 1)]);
        assert_eq!(weeks[0].count, 2);
        assert_eq!(weeks[0].start_date, date!(2015 - 12 - 28));
        assert_eq!(weeks[0].total.to_string(), "3.00");
        assert_eq!(weeks[1].count, 1);
        assert_eq!(weeks[1].start_date, date!(2016 - 01 - 04));
    }

    #[test]
    fn week_one_starting_in_december_follows_previous_weeks() {
        let expenses = [
            expense(1, datetime!(2008 - 12 - 30 9:00 UTC), Decimal::ONE),
            expense(2, datetime!(2008 - 12 - 21 9:00 UTC), Decimal::ONE),
        ];

        let weeks = aggregate_weekly_totals(&expenses).unwrap();

        let keys: Vec<(i32, u8)> = weeks
            .iter()
            .map(|week| (week.year, week.week_number))
            .collect();
        assert_eq!(keys, vec![(2008, 51), (2009, 1)]);
        assert_eq!(weeks[1].start_date, date!(2008 - 12 - 29));
    }

    #[test]
    fn totals_and_counts_are_preserved() {
        let amounts = [
            Decimal::new(1999, 2),
            Decimal::new(1, 2),
            Decimal::new(250_000, 2),
            Decimal::new(333, 2),
            Decimal::new(0, 2),
            Decimal::new(12_345, 2),
        ];
        let dates = [
            datetime!(2013 - 12 - 30 0:00 UTC),
            datetime!(2014 - 01 - 05 23:59:59 UTC),
            datetime!(2014 - 03 - 15 12:00 UTC),
            datetime!(2014 - 03 - 15 13:00 UTC),
            datetime!(2014 - 12 - 29 0:00 UTC),
            datetime!(2015 - 01 - 04 0:00 UTC),
        ];
        let expenses: Vec<Expense> = dates
            .into_iter()
            .zip(amounts)
            .enumerate()
            .map(|(i, (date, amount))| expense(i as i64, date, amount))
            .collect();

        let weeks = aggregate_weekly_totals(&expenses).unwrap();

        let total_count: usize = weeks.iter().map(|week| week.count).sum();
        let total: Decimal = weeks.iter().map(|week| week.total).sum();
        let want_total: Decimal = amounts.iter().sum();
        assert_eq!(total_count, expenses.len());
        assert_eq!(total, want_total);
        assert_eq!(weeks.len(), 3);
        assert!(
            weeks
                .windows(2)
                .all(|pair| (pair[0].year, pair[0].week_number)
                    < (pair[1].year, pair[1].week_number)),
            "weeks are not strictly increasing"
        );
        weeks.iter().for_each(assert_average_is_daily);
    }

    #[test]
    fn average_divides_by_seven_not_count() {
        let expenses = [
            expense(1, datetime!(2014 - 07 - 01 0:00 UTC), Decimal::new(700, 2)),
            expense(2, datetime!(2014 - 07 - 02 0:00 UTC), Decimal::new(700, 2)),
        ];

        let weeks = aggregate_weekly_totals(&expenses).unwrap();

        assert_eq!(weeks[0].average, Decimal::new(2, 0));
    }

    #[test]
    fn inexact_average_keeps_full_decimal_precision() {
        let expenses = [
            expense(1, datetime!(2014 - 07 - 01 0:00 UTC), Decimal::new(1000, 2)),
            expense(2, datetime!(2014 - 07 - 06 0:00 UTC), Decimal::new(500, 2)),
        ];

        let weeks = aggregate_weekly_totals(&expenses).unwrap();
        let average = weeks[0].average;

        assert_eq!(average.scale(), 28);
        assert!(average.to_string().starts_with("2.142857142857"));
        assert!((average * Decimal::from(7) - Decimal::new(15, 0)).abs() < Decimal::new(1, 26));
    }

    #[test]
    fn serializes_start_date_as_iso_date() {
        let weeks = aggregate_weekly_totals(&[expense(
            1,
            datetime!(2014 - 07 - 02 0:00 UTC),
            Decimal::new(1000, 2),
        )])
        .unwrap();

        let json = serde_json::to_value(&weeks[0]).unwrap();

        assert_eq!(json["start_date"], "2014-06-30");
        assert_eq!(json["week_number"], 27);
        assert_eq!(json["total"], "10.00");
    }
}
