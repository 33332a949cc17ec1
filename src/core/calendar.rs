use crate::domain::model::{ServiceKind, StaffMember};
use crate::utils::error::{PawcareError, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Booking window, opening hours and fees used by the calendar and payment steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRules {
    pub window_days: u32,
    pub opening_hour: u32,
    pub closing_hour: u32,
    pub slot_minutes: u32,
    pub doctor_fee: f64,
    pub caretaker_fee: f64,
    pub currency: String,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            window_days: 60,
            opening_hour: 9,
            closing_hour: 18,
            slot_minutes: 60,
            doctor_fee: 800.0,
            caretaker_fee: 500.0,
            currency: "TWD".to_string(),
        }
    }
}

impl BookingRules {
    pub fn fee(&self, kind: ServiceKind) -> f64 {
        match kind {
            ServiceKind::Doctor => self.doctor_fee,
            ServiceKind::Caretaker => self.caretaker_fee,
        }
    }

    /// Saturates at the last date chrono can represent.
    pub fn last_bookable_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_signed(Duration::days(i64::from(self.window_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Today up to and including `today + window_days`.
    pub fn is_bookable_date(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date >= today && date <= self.last_bookable_date(today)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub selectable: bool,
}

/// Monday-first weeks covering the whole month, padded with neighbouring days.
pub fn month_grid(
    year: i32,
    month: u32,
    today: NaiveDate,
    rules: &BookingRules,
) -> Result<Vec<Vec<CalendarDay>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        PawcareError::InvalidValueError {
            field: "month".to_string(),
            value: format!("{}-{}", year, month),
            reason: "Not a valid calendar month".to_string(),
        }
    })?;
    let last = last_day_of_month(first);

    let mut day = first - Duration::days(i64::from(first.weekday().num_days_from_monday()));
    let mut weeks = Vec::new();
    while day <= last {
        let week = (0..7)
            .map(|offset| {
                let date = day + Duration::days(offset);
                CalendarDay {
                    date,
                    in_month: date.month() == month && date.year() == year,
                    selectable: rules.is_bookable_date(date, today),
                }
            })
            .collect();
        weeks.push(week);
        day += Duration::days(7);
    }

    Ok(weeks)
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|next| next - Duration::days(1))
        .unwrap_or(first)
}

/// Every slot start within opening hours; a slot must end by closing time.
pub fn time_slots(rules: &BookingRules) -> Vec<NaiveTime> {
    let step = rules.slot_minutes.max(1);
    let open = rules.opening_hour * 60;
    let close = rules.closing_hour.min(24) * 60;

    (open..close)
        .step_by(step as usize)
        .filter(|start| start + step <= close)
        .filter_map(|start| NaiveTime::from_hms_opt(start / 60, start % 60, 0))
        .collect()
}

/// Slots still open for booking on `date`.
///
/// Past slots on the current day are dropped, as are slots outside the staff
/// member's stated availability and ones they already have booked.
pub fn open_slots(
    rules: &BookingRules,
    date: NaiveDate,
    now: NaiveDateTime,
    staff: Option<&StaffMember>,
) -> Vec<NaiveTime> {
    if !rules.is_bookable_date(date, now.date()) {
        return Vec::new();
    }

    time_slots(rules)
        .into_iter()
        .filter(|slot| date > now.date() || *slot > now.time())
        .filter(|slot| match staff {
            Some(staff) => {
                (staff.available_times.is_empty() || staff.available_times.contains(slot))
                    && !staff.booked_times.contains(&date.and_time(*slot))
            }
            None => true,
        })
        .collect()
}

/// Plain-text month view: selectable days plain, others in brackets, the
/// selected day marked with `*`.
pub fn render_month(weeks: &[Vec<CalendarDay>], selected: Option<NaiveDate>) -> String {
    let mut out = String::from(" Mo   Tu   We   Th   Fr   Sa   Su\n");
    for week in weeks {
        let cells: Vec<String> = week
            .iter()
            .map(|day| {
                if !day.in_month {
                    "    ".to_string()
                } else if Some(day.date) == selected {
                    format!("*{:>2}*", day.date.day())
                } else if day.selectable {
                    format!(" {:>2} ", day.date.day())
                } else {
                    format!("({:>2})", day.date.day())
                }
            })
            .collect();
        out.push_str(cells.join(" ").trim_end());
        out.push('\n');
    }
    out
}
